use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::ClientSettings;
use crate::lcu::models::{ChampSelectSession, ACTION_BAN, ACTION_PICK};
use crate::lcu::LcuClient;

/// Accepts the ready check. Fire-and-forget: automation is a convenience,
/// so failures are logged and swallowed.
pub(crate) async fn accept_game(client: Arc<LcuClient>) {
    match client.accept_ready_check().await {
        Ok(()) => info!("ready check accepted"),
        Err(err) => warn!(error = %err, "auto-accept failed"),
    }
}

/// Reacts to one champ-select session update: handles the local player's
/// pending pick/ban according to the configured champion ids. Each update is
/// considered once; completed actions are never touched again.
pub(crate) async fn handle_champ_select_update(
    client: Arc<LcuClient>,
    settings: Arc<ClientSettings>,
    session: ChampSelectSession,
) {
    let pick_id = settings.auto_pick_champ_id;
    let ban_id = settings.auto_ban_champ_id;
    if pick_id <= 0 && ban_id <= 0 {
        return;
    }
    let team_intents = session.team_pick_intents();

    for round in &session.actions {
        for action in round {
            if action.actor_cell_id != session.local_player_cell_id || action.completed {
                continue;
            }
            match action.kind.as_str() {
                ACTION_PICK if pick_id > 0 => {
                    if action.is_in_progress {
                        match client.pick_champion(pick_id, action.id).await {
                            Ok(()) => info!(champion_id = pick_id, "champion auto-picked"),
                            Err(err) => warn!(error = %err, "auto-pick failed"),
                        }
                    } else if action.champion_id == 0 {
                        // Declare intent early so teammates see the hover.
                        if let Err(err) = client.pre_pick_champion(pick_id, action.id).await {
                            debug!(error = %err, "pre-pick failed");
                        }
                    }
                }
                ACTION_BAN if ban_id > 0 && action.is_in_progress => {
                    if team_intents.contains(&ban_id) {
                        debug!(
                            champion_id = ban_id,
                            "skipping auto-ban: a teammate wants that champion"
                        );
                    } else {
                        match client.ban_champion(ban_id, action.id).await {
                            Ok(()) => info!(champion_id = ban_id, "champion auto-banned"),
                            Err(err) => warn!(error = %err, "auto-ban failed"),
                        }
                    }
                }
                _ => {}
            }
        }
    }
}

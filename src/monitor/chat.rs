use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::LcuRuntime;
use crate::config::{ClientSettings, SettingsStore};
use crate::lcu::models::{SummonerId, UserScore, CONVERSATION_MSG_SYSTEM, JOINED_ROOM_MSG};
use crate::lcu::{LcuClient, LcuError};
use crate::score::{ConfigStore, ScoreConfig};

const TEAM_SIZE: usize = 5;
const TEAM_DISCOVERY_ATTEMPTS: u32 = 3;
const TEAM_DISCOVERY_DELAY: Duration = Duration::from_secs(1);
/// Spacing between individual chat messages; the chat API throttles
/// faster senders.
const MESSAGE_SPACING: Duration = Duration::from_millis(200);
/// At most this many KDA triples per announced line.
const KDA_DISPLAY_LIMIT: usize = 5;

/// Champ-select workflow: discover teammates from the lobby chat, score
/// them, and announce the result. Detached from the monitor; every failure
/// is terminal for this run only.
pub(crate) async fn run_champ_select_workflow(
    runtime: Arc<LcuRuntime>,
    scores: ConfigStore,
    settings: SettingsStore,
) {
    let (Some(client), Some(aggregator)) = (runtime.client(), runtime.aggregator()) else {
        return;
    };
    let cfg = scores.snapshot();
    if !cfg.enabled {
        debug!("scoring disabled; skipping champ select workflow");
        return;
    }
    let settings = settings.snapshot();
    // The delay countdown starts now, not after scoring finishes.
    let send_at = tokio::time::Instant::now()
        + Duration::from_secs(settings.choose_champ_send_msg_delay_sec);

    let mut conversation_id = String::new();
    let mut team_ids: Vec<SummonerId> = Vec::new();
    for attempt in 1..=TEAM_DISCOVERY_ATTEMPTS {
        tokio::time::sleep(TEAM_DISCOVERY_DELAY).await;
        match team_members(&client).await {
            Ok((id, ids)) => {
                conversation_id = id;
                team_ids = ids;
                if team_ids.len() == TEAM_SIZE {
                    break;
                }
            }
            Err(err) => debug!(attempt, error = %err, "team discovery retry"),
        }
    }
    if team_ids.is_empty() {
        warn!("no teammates discovered; skipping team announcement");
        return;
    }

    let team_scores = aggregator.compute_team_scores(&team_ids, &cfg).await;
    for score in &team_scores {
        info!(
            summoner = %score.summoner_name,
            score = format!("{:.2}", score.score),
            horse = cfg.horse_label(score.score),
            "teammate scored"
        );
    }
    if !settings.auto_send_team_horse {
        return;
    }

    let self_id = runtime.current_summoner().map(|s| s.summoner_id);
    let lines = build_horse_lines(&team_scores, &cfg, &settings, self_id);
    if lines.is_empty() {
        return;
    }
    tokio::time::sleep_until(send_at).await;
    if cfg.merge_msg {
        if let Err(err) = client
            .send_conversation_message(&conversation_id, &lines.join("\n"))
            .await
        {
            warn!(error = %err, "failed to send merged team summary");
        }
    } else {
        for line in &lines {
            if let Err(err) = client.send_conversation_message(&conversation_id, line).await {
                warn!(error = %err, "failed to send team summary line");
            }
            tokio::time::sleep(MESSAGE_SPACING).await;
        }
    }
}

/// In-game workflow: score the enemy team and retain the formatted summary
/// for clipboard export through the HTTP API.
pub(crate) async fn run_in_game_workflow(
    runtime: Arc<LcuRuntime>,
    scores: ConfigStore,
    settings: SettingsStore,
) {
    let (Some(client), Some(aggregator)) = (runtime.client(), runtime.aggregator()) else {
        return;
    };
    let cfg = scores.snapshot();
    let settings = settings.snapshot();
    if !cfg.enabled || !settings.should_in_game_save_msg_to_clipboard {
        return;
    }
    let self_id = match runtime.current_summoner() {
        Some(summoner) => summoner.summoner_id,
        None => match client.current_summoner().await {
            Ok(summoner) => summoner.summoner_id,
            Err(err) => {
                warn!(error = %err, "current summoner unavailable; skipping enemy scoring");
                return;
            }
        },
    };
    let session = match client.gameflow_session().await {
        Ok(session) => session,
        Err(err) => {
            warn!(error = %err, "gameflow session unavailable; skipping enemy scoring");
            return;
        }
    };
    let (_, enemies) = session.split_teams(self_id);
    if enemies.is_empty() {
        warn!("enemy team could not be resolved from the gameflow session");
        return;
    }

    let enemy_scores = aggregator.compute_team_scores(&enemies, &cfg).await;
    let text = enemy_scores
        .iter()
        .map(|score| {
            let idx = cfg.horse_index(score.score);
            format_horse_line(score, settings.horse_name(idx, &cfg.horse[idx].name))
        })
        .collect::<Vec<_>>()
        .join("\n");
    runtime.set_enemy_message(text);
    info!(
        enemies = enemy_scores.len(),
        "enemy team scored; summary ready for export"
    );
}

async fn team_members(client: &LcuClient) -> Result<(String, Vec<SummonerId>), LcuError> {
    let conversation_id = client.champ_select_conversation_id().await?;
    let messages = client.conversation_messages(&conversation_id).await?;
    let ids = messages
        .iter()
        .filter(|msg| msg.kind == CONVERSATION_MSG_SYSTEM && msg.body == JOINED_ROOM_MSG)
        .map(|msg| msg.from_summoner_id)
        .collect();
    Ok((conversation_id, ids))
}

/// One announcement line per player, filtered by the per-tier send flags
/// and the self-announcement toggle. Scores arrive best-first and stay that
/// way.
pub(crate) fn build_horse_lines(
    team_scores: &[UserScore],
    cfg: &ScoreConfig,
    settings: &ClientSettings,
    self_id: Option<SummonerId>,
) -> Vec<String> {
    team_scores
        .iter()
        .filter_map(|score| {
            let idx = cfg.horse_index(score.score);
            if !settings.should_announce_tier(idx) {
                return None;
            }
            if !settings.should_send_self_horse && Some(score.summoner_id) == self_id {
                return None;
            }
            Some(format_horse_line(
                score,
                settings.horse_name(idx, &cfg.horse[idx].name),
            ))
        })
        .collect()
}

fn format_horse_line(score: &UserScore, label: &str) -> String {
    let kda = score
        .curr_kda
        .iter()
        .take(KDA_DISPLAY_LIMIT)
        .map(|[k, d, a]| format!("{k}/{d}/{a}"))
        .collect::<Vec<_>>()
        .join("  ");
    if kda.is_empty() {
        format!("{label}({}): {}", score.score as i64, score.summoner_name)
    } else {
        format!(
            "{label}({}): {} {kda}",
            score.score as i64, score.summoner_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: SummonerId, name: &str, score: f64, kda: Vec<[i32; 3]>) -> UserScore {
        UserScore {
            summoner_id: id,
            summoner_name: name.into(),
            score,
            curr_kda: kda,
        }
    }

    #[test]
    fn lines_carry_label_truncated_score_and_recent_kda() {
        let cfg = ScoreConfig::default();
        let settings = ClientSettings::default();
        let scores = vec![user(1, "midlaner", 151.9, vec![[12, 3, 9], [2, 8, 4]])];

        let lines = build_horse_lines(&scores, &cfg, &settings, None);
        assert_eq!(lines, vec!["smurf(151): midlaner 12/3/9  2/8/4"]);
    }

    #[test]
    fn kda_display_is_capped_at_five_triples() {
        let cfg = ScoreConfig::default();
        let settings = ClientSettings::default();
        let kda = (0..8).map(|i| [i, i, i]).collect();
        let lines = build_horse_lines(&[user(1, "grinder", 100.0, kda)], &cfg, &settings, None);
        assert_eq!(lines[0].matches('/').count(), 10);
    }

    #[test]
    fn muted_tiers_are_not_announced() {
        let cfg = ScoreConfig::default();
        let mut settings = ClientSettings::default();
        // Mute the bottom two tiers.
        settings.choose_send_horse_msg = vec![true, true, true, true, false, false];

        let scores = vec![
            user(1, "carry", 160.0, vec![]),
            user(2, "feeder", 60.0, vec![]),
        ];
        let lines = build_horse_lines(&scores, &cfg, &settings, None);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("smurf("));
    }

    #[test]
    fn self_line_is_skipped_when_disabled() {
        let cfg = ScoreConfig::default();
        let mut settings = ClientSettings::default();
        settings.should_send_self_horse = false;

        let scores = vec![
            user(7, "me", 120.0, vec![]),
            user(8, "ally", 120.0, vec![]),
        ];
        let lines = build_horse_lines(&scores, &cfg, &settings, Some(7));
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("ally"));
    }
}

pub mod actions;
pub mod chat;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use futures::{SinkExt, StreamExt};
use strum_macros::{Display, EnumString};
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async_tls_with_config, Connector};
use tracing::{debug, info, warn};

use crate::config::SettingsStore;
use crate::lcu::discovery::{self, LcuAuth};
use crate::lcu::events::{decode_event, LcuEvent, SUBSCRIBE_ALL_MSG};
use crate::lcu::models::Summoner;
use crate::lcu::{LcuClient, LcuError};
use crate::score::{Aggregator, ConfigStore};

/// How often the supervisor re-probes for a running client.
const DISCOVERY_INTERVAL: Duration = Duration::from_secs(1);
const CURRENT_SUMMONER_ATTEMPTS: u32 = 5;
const CURRENT_SUMMONER_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Client phase as tracked by the monitor. Phases the monitor does not act
/// on collapse into `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
pub enum GameFlowState {
    #[default]
    None,
    Matchmaking,
    ReadyCheck,
    ChampSelect,
    InProgress,
    Other,
}

impl GameFlowState {
    pub fn from_phase(phase: &str) -> Self {
        phase.parse().unwrap_or(Self::Other)
    }
}

/// Live state shared between the monitor and the HTTP façade: the attached
/// client, the aggregator bound to it, the current phase, and small
/// transient snapshots. Everything here is replaced wholesale; readers get
/// copies, never references into guarded data.
#[derive(Default)]
pub struct LcuRuntime {
    client: RwLock<Option<Arc<LcuClient>>>,
    aggregator: RwLock<Option<Arc<Aggregator>>>,
    state: Mutex<GameFlowState>,
    current_summoner: Mutex<Option<Summoner>>,
    enemy_message: Mutex<Option<String>>,
}

impl LcuRuntime {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn attach(&self, client: Arc<LcuClient>, summoner: Summoner) {
        *self.aggregator.write().expect("runtime lock") =
            Some(Arc::new(Aggregator::new(client.clone())));
        *self.client.write().expect("runtime lock") = Some(client);
        *self.current_summoner.lock().expect("runtime lock") = Some(summoner);
    }

    fn detach(&self) {
        *self.client.write().expect("runtime lock") = None;
        *self.aggregator.write().expect("runtime lock") = None;
        self.reset_transient();
        *self.state.lock().expect("runtime lock") = GameFlowState::None;
    }

    fn reset_transient(&self) {
        *self.current_summoner.lock().expect("runtime lock") = None;
        *self.enemy_message.lock().expect("runtime lock") = None;
    }

    pub fn client(&self) -> Option<Arc<LcuClient>> {
        self.client.read().expect("runtime lock").clone()
    }

    pub fn aggregator(&self) -> Option<Arc<Aggregator>> {
        self.aggregator.read().expect("runtime lock").clone()
    }

    pub fn is_active(&self) -> bool {
        self.client.read().expect("runtime lock").is_some()
    }

    pub fn state(&self) -> GameFlowState {
        *self.state.lock().expect("runtime lock")
    }

    fn set_state(&self, state: GameFlowState) {
        *self.state.lock().expect("runtime lock") = state;
    }

    pub fn current_summoner(&self) -> Option<Summoner> {
        self.current_summoner.lock().expect("runtime lock").clone()
    }

    pub fn enemy_message(&self) -> Option<String> {
        self.enemy_message.lock().expect("runtime lock").clone()
    }

    pub(crate) fn set_enemy_message(&self, text: String) {
        *self.enemy_message.lock().expect("runtime lock") = Some(text);
    }
}

/// Consumes the client's push-event stream and reacts to phase changes.
/// Exactly one monitor runs per attached client; workflow side effects are
/// detached tasks so a slow score computation never stalls event reads.
pub struct Monitor {
    runtime: Arc<LcuRuntime>,
    scores: ConfigStore,
    settings: SettingsStore,
}

impl Monitor {
    pub fn new(runtime: Arc<LcuRuntime>, scores: ConfigStore, settings: SettingsStore) -> Self {
        Self {
            runtime,
            scores,
            settings,
        }
    }

    /// Attaches to a discovered client and blocks on the event stream.
    /// Returns on any stream error or close so the supervisor can retry
    /// discovery; the runtime is detached either way.
    pub async fn run(&self, auth: &LcuAuth) -> Result<(), LcuError> {
        let client = Arc::new(LcuClient::new(auth.clone())?);

        let mut request = auth.ws_url().into_client_request()?;
        let credentials = BASE64.encode(format!("riot:{}", auth.token));
        request.headers_mut().insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Basic {credentials}"))
                .map_err(|err| LcuError::Invalid(err.to_string()))?,
        );
        // Same self-signed certificate as the HTTPS side.
        let tls = native_tls::TlsConnector::builder()
            .danger_accept_invalid_certs(true)
            .build()?;
        let (mut socket, _) =
            connect_async_tls_with_config(request, None, false, Some(Connector::NativeTls(tls)))
                .await?;

        let summoner = self.fetch_current_summoner(&client).await?;
        info!(summoner_id = summoner.summoner_id, "attached to game client");
        self.runtime.attach(client, summoner);

        let result = async {
            socket
                .send(Message::Text(SUBSCRIBE_ALL_MSG.to_string()))
                .await?;
            while let Some(frame) = socket.next().await {
                match frame {
                    Ok(Message::Text(text)) => self.dispatch(&text),
                    Ok(Message::Close(_)) => break,
                    Ok(_) => continue,
                    Err(err) => return Err(LcuError::from(err)),
                }
            }
            Ok(())
        }
        .await;
        self.runtime.detach();
        result
    }

    async fn fetch_current_summoner(&self, client: &LcuClient) -> Result<Summoner, LcuError> {
        for attempt in 1..=CURRENT_SUMMONER_ATTEMPTS {
            match client.current_summoner().await {
                Ok(summoner) => return Ok(summoner),
                Err(err) => {
                    debug!(attempt, error = %err, "current summoner fetch retry");
                    tokio::time::sleep(CURRENT_SUMMONER_RETRY_DELAY).await;
                }
            }
        }
        Err(LcuError::Invalid(
            "could not fetch the current summoner".into(),
        ))
    }

    fn dispatch(&self, frame: &str) {
        match decode_event(frame) {
            LcuEvent::GameFlowPhase(phase) => self.on_phase_change(&phase),
            LcuEvent::ChampSelectSession(session) => {
                let Some(client) = self.runtime.client() else {
                    return;
                };
                let settings = self.settings.snapshot();
                tokio::spawn(actions::handle_champ_select_update(
                    client, settings, session,
                ));
            }
            LcuEvent::Ignored => {}
        }
    }

    fn on_phase_change(&self, phase: &str) {
        let next = GameFlowState::from_phase(phase);
        debug!(%phase, state = %next, "gameflow phase changed");
        self.runtime.set_state(next);
        match next {
            GameFlowState::ChampSelect => {
                info!("champion select started; scoring the team");
                tokio::spawn(chat::run_champ_select_workflow(
                    self.runtime.clone(),
                    self.scores.clone(),
                    self.settings.clone(),
                ));
                // The first session-update event may predate this phase
                // change; probe the session once so auto-pick still fires.
                if let Some(client) = self.runtime.client() {
                    let settings = self.settings.snapshot();
                    tokio::spawn(async move {
                        match client.champ_select_session().await {
                            Ok(session) => {
                                actions::handle_champ_select_update(client, settings, session)
                                    .await
                            }
                            Err(err) => debug!(error = %err, "champ select session unavailable"),
                        }
                    });
                }
            }
            GameFlowState::InProgress => {
                tokio::spawn(chat::run_in_game_workflow(
                    self.runtime.clone(),
                    self.scores.clone(),
                    self.settings.clone(),
                ));
            }
            GameFlowState::ReadyCheck => {
                if self.settings.snapshot().auto_accept_game {
                    if let Some(client) = self.runtime.client() {
                        tokio::spawn(actions::accept_game(client));
                    }
                }
            }
            GameFlowState::None => self.runtime.reset_transient(),
            GameFlowState::Matchmaking | GameFlowState::Other => {}
        }
    }
}

/// Supervisory loop: rediscovers the client every second and restarts the
/// monitor whenever its stream ends. Runs until shutdown is signalled.
pub async fn run_monitor(
    runtime: Arc<LcuRuntime>,
    scores: ConfigStore,
    settings: SettingsStore,
    lockfile: PathBuf,
    mut shutdown: watch::Receiver<bool>,
) {
    let monitor = Monitor::new(runtime, scores, settings);
    loop {
        if *shutdown.borrow() {
            return;
        }
        match discovery::discover(&lockfile) {
            Ok(auth) => {
                info!(port = auth.port, "game client discovered");
                tokio::select! {
                    _ = shutdown.changed() => return,
                    result = monitor.run(&auth) => match result {
                        Ok(()) => info!("event stream closed"),
                        Err(err) => warn!(error = %err, "monitor stopped"),
                    },
                }
            }
            Err(LcuError::ClientNotFound) => {}
            Err(err) => warn!(error = %err, "client discovery failed"),
        }
        tokio::select! {
            _ = shutdown.changed() => return,
            _ = tokio::time::sleep(DISCOVERY_INTERVAL) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::ScoreConfig;
    use rstest::rstest;

    fn test_monitor() -> Monitor {
        Monitor::new(
            LcuRuntime::new(),
            ConfigStore::new(ScoreConfig::default()).expect("config"),
            SettingsStore::load(std::path::Path::new("/no/such/settings.json")),
        )
    }

    #[rstest]
    #[case("None", GameFlowState::None)]
    #[case("Matchmaking", GameFlowState::Matchmaking)]
    #[case("ReadyCheck", GameFlowState::ReadyCheck)]
    #[case("ChampSelect", GameFlowState::ChampSelect)]
    #[case("InProgress", GameFlowState::InProgress)]
    #[case("Lobby", GameFlowState::Other)]
    #[case("EndOfGame", GameFlowState::Other)]
    fn phase_strings_map_onto_states(#[case] phase: &str, #[case] expected: GameFlowState) {
        assert_eq!(GameFlowState::from_phase(phase), expected);
    }

    #[tokio::test]
    async fn phase_events_move_the_state_machine() {
        let monitor = test_monitor();
        assert_eq!(monitor.runtime.state(), GameFlowState::None);

        monitor.dispatch(
            r#"[8,"OnJsonApiEvent",{"data":"ChampSelect","event_type":"Update","uri":"/lol-gameflow/v1/gameflow-phase"}]"#,
        );
        assert_eq!(monitor.runtime.state(), GameFlowState::ChampSelect);

        monitor.dispatch(
            r#"[8,"OnJsonApiEvent",{"data":"InProgress","event_type":"Update","uri":"/lol-gameflow/v1/gameflow-phase"}]"#,
        );
        assert_eq!(monitor.runtime.state(), GameFlowState::InProgress);
    }

    #[tokio::test]
    async fn unhandled_frames_leave_the_state_untouched() {
        let monitor = test_monitor();
        monitor.dispatch(
            r#"[8,"OnJsonApiEvent",{"data":"ChampSelect","event_type":"Update","uri":"/lol-gameflow/v1/gameflow-phase"}]"#,
        );

        monitor.dispatch(
            r#"[8,"OnJsonApiEvent",{"data":{},"event_type":"Update","uri":"/lol-lobby/v2/lobby"}]"#,
        );
        monitor.dispatch("not json at all");
        assert_eq!(monitor.runtime.state(), GameFlowState::ChampSelect);
    }

    #[tokio::test]
    async fn returning_to_none_resets_transient_snapshots() {
        let monitor = test_monitor();
        monitor.runtime.set_enemy_message("enemy summary".into());
        *monitor.runtime.current_summoner.lock().unwrap() = Some(Summoner::default());

        monitor.on_phase_change("None");
        assert_eq!(monitor.runtime.state(), GameFlowState::None);
        assert!(monitor.runtime.current_summoner().is_none());
        assert!(monitor.runtime.enemy_message().is_none());
    }
}

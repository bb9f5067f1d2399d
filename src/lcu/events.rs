use serde_json::Value;

use super::models::ChampSelectSession;

/// Subscribes the socket to every client push event.
pub const SUBSCRIBE_ALL_MSG: &str = "[5, \"OnJsonApiEvent\"]";

pub const GAMEFLOW_PHASE_URI: &str = "/lol-gameflow/v1/gameflow-phase";
pub const CHAMP_SELECT_SESSION_URI: &str = "/lol-champ-select/v1/session";

/// A decoded push frame. Only two event URIs carry meaning here; everything
/// else (including malformed frames) collapses into `Ignored`.
#[derive(Debug, Clone)]
pub enum LcuEvent {
    GameFlowPhase(String),
    ChampSelectSession(ChampSelectSession),
    Ignored,
}

/// Push frames are JSON arrays `[opcode, "OnJsonApiEvent", {data, event_type, uri}]`.
pub fn decode_event(frame: &str) -> LcuEvent {
    let Ok(value) = serde_json::from_str::<Value>(frame) else {
        return LcuEvent::Ignored;
    };
    let Some(envelope) = value.as_array().and_then(|arr| arr.get(2)) else {
        return LcuEvent::Ignored;
    };
    let uri = envelope
        .get("uri")
        .and_then(Value::as_str)
        .unwrap_or_default();
    match uri {
        GAMEFLOW_PHASE_URI => match envelope.get("data").and_then(Value::as_str) {
            Some(phase) => LcuEvent::GameFlowPhase(phase.to_string()),
            None => LcuEvent::Ignored,
        },
        CHAMP_SELECT_SESSION_URI => {
            match envelope
                .get("data")
                .cloned()
                .map(serde_json::from_value::<ChampSelectSession>)
            {
                Some(Ok(session)) => LcuEvent::ChampSelectSession(session),
                _ => LcuEvent::Ignored,
            }
        }
        _ => LcuEvent::Ignored,
    }
}

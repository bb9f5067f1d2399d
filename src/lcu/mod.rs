pub mod client;
pub mod discovery;
pub mod events;
pub mod models;

pub use client::LcuClient;
pub use discovery::{discover, LcuAuth};
pub use events::{decode_event, LcuEvent};

use thiserror::Error;

/// Failures talking to the local game client.
#[derive(Debug, Error)]
pub enum LcuError {
    #[error("game client not found")]
    ClientNotFound,

    #[error("lockfile is malformed: {0}")]
    MalformedLockfile(String),

    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("client api error {code}: {message}")]
    Api { code: String, message: String },

    #[error("unexpected payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("tls setup failed: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("event stream error: {0}")]
    Stream(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("{0}")]
    Invalid(String),
}

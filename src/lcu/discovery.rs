use std::fs;
use std::path::Path;

use super::LcuError;

/// Credentials for one running client instance. The port is allocated fresh
/// on every client start, so these are rediscovered on each reconnect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LcuAuth {
    pub port: u16,
    pub token: String,
}

impl LcuAuth {
    pub fn http_base(&self) -> String {
        format!("https://127.0.0.1:{}", self.port)
    }

    pub fn ws_url(&self) -> String {
        format!("wss://127.0.0.1:{}/", self.port)
    }
}

/// Reads the client's `lockfile` (`name:pid:port:token:protocol`). A missing
/// file means the client is not running; the supervisor loop keeps polling.
pub fn discover(lockfile: &Path) -> Result<LcuAuth, LcuError> {
    let raw = fs::read_to_string(lockfile).map_err(|_| LcuError::ClientNotFound)?;
    parse_lockfile(raw.trim())
}

fn parse_lockfile(raw: &str) -> Result<LcuAuth, LcuError> {
    let fields: Vec<&str> = raw.split(':').collect();
    if fields.len() < 5 {
        return Err(LcuError::MalformedLockfile(format!(
            "expected 5 fields, got {}",
            fields.len()
        )));
    }
    let port: u16 = fields[2]
        .parse()
        .map_err(|_| LcuError::MalformedLockfile(format!("bad port `{}`", fields[2])))?;
    let token = fields[3].to_string();
    if token.is_empty() {
        return Err(LcuError::MalformedLockfile("empty token".into()));
    }
    Ok(LcuAuth { port, token })
}

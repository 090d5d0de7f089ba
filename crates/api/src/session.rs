//! Discovery of the signed-in user's session.
//!
//! Logging in is handled elsewhere; this module only finds the credentials a
//! previous login left behind. Resolution order:
//!
//! - `TERMINUS_SESSION` and `TERMINUS_USER_ID` environment variables
//! - the JSON session file `<cache_dir>/session`

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const SESSION_ENV: &str = "TERMINUS_SESSION";
pub const USER_ID_ENV: &str = "TERMINUS_USER_ID";
pub const SESSION_FILE_NAME: &str = "session";

/// Credentials of the signed-in user.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token sent with every request.
    pub session: String,
    /// Id of the signed-in user.
    pub user_uuid: String,
    /// Expiry in epoch seconds, when known.
    #[serde(default)]
    pub session_expire_time: Option<i64>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("session", &"[REDACTED]")
            .field("user_uuid", &self.user_uuid)
            .field("session_expire_time", &self.session_expire_time)
            .finish()
    }
}

impl Session {
    pub fn new(session: impl Into<String>, user_uuid: impl Into<String>) -> Self {
        Self {
            session: session.into(),
            user_uuid: user_uuid.into(),
            session_expire_time: None,
        }
    }

    /// Find a usable session from the environment or the cache directory.
    ///
    /// Expired sessions are ignored with a warning.
    pub fn discover(cache_dir: &Path) -> Option<Session> {
        let session = Self::from_env().or_else(|| Self::load(&session_path(cache_dir)))?;
        if session.is_expired_at(Utc::now().timestamp()) {
            warn!(user = %session.user_uuid, "cached session has expired; log in again");
            return None;
        }
        Some(session)
    }

    pub fn from_env() -> Option<Session> {
        let token = non_empty_env(SESSION_ENV)?;
        let user_uuid = non_empty_env(USER_ID_ENV)?;
        debug!("using session from environment");
        Some(Session::new(token, user_uuid))
    }

    /// Read a session file. Missing or unreadable files yield `None`.
    pub fn load(path: &Path) -> Option<Session> {
        let content = fs::read_to_string(path).ok()?;
        match serde_json::from_str::<Session>(&content) {
            Ok(session) if !session.session.is_empty() => Some(session),
            Ok(_) => None,
            Err(error) => {
                warn!(path = %path.display(), error = %error, "ignoring malformed session file");
                None
            }
        }
    }

    pub fn is_expired_at(&self, now_epoch_secs: i64) -> bool {
        self.session_expire_time.is_some_and(|expires| expires < now_epoch_secs)
    }

    pub fn user_id(&self) -> &str {
        &self.user_uuid
    }
}

pub fn session_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join(SESSION_FILE_NAME)
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_session_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            session_path(dir.path()),
            r#"{"session":"tok","user_uuid":"u-1","session_expire_time":4102444800}"#,
        )
        .unwrap();

        let session = Session::load(&session_path(dir.path())).unwrap();
        assert_eq!(session.user_id(), "u-1");
        assert!(!session.is_expired_at(1_700_000_000));
        assert!(session.is_expired_at(4_102_444_801));
    }

    #[test]
    fn malformed_or_empty_sessions_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = session_path(dir.path());
        fs::write(&path, "not json").unwrap();
        assert!(Session::load(&path).is_none());

        fs::write(&path, r#"{"session":"","user_uuid":"u-1"}"#).unwrap();
        assert!(Session::load(&path).is_none());
        assert!(Session::load(&dir.path().join("missing")).is_none());
    }

    #[test]
    fn debug_output_hides_the_token() {
        let rendered = format!("{:?}", Session::new("very-secret", "u-1"));
        assert!(!rendered.contains("very-secret"));
        assert!(rendered.contains("u-1"));
    }
}

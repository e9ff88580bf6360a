use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use crate::models::User;

/// Locally stored signed-in user. Its id doubles as the bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: i64,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        SessionUser {
            id: user.id,
            email: user.email.clone(),
            username: Some(user.username.clone()),
        }
    }
}

/// Shared session handle. Clones see the same user.
///
/// With a backing file the user survives restarts; an unreadable file reads
/// as signed out.
#[derive(Debug, Clone, Default)]
pub struct Session {
    user: Arc<RwLock<Option<SessionUser>>>,
    path: Option<PathBuf>,
}

impl Session {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let user = fs::read(&path)
            .ok()
            .and_then(|data| serde_json::from_slice::<SessionUser>(&data).ok());
        Session {
            user: Arc::new(RwLock::new(user)),
            path: Some(path),
        }
    }

    pub fn sign_in(&self, user: SessionUser) {
        if let Some(path) = &self.path {
            let written = serde_json::to_vec(&user)
                .map_err(anyhow::Error::from)
                .and_then(|data| fs::write(path, data).map_err(anyhow::Error::from));
            if let Err(e) = written {
                tracing::warn!(error = %e, path = %path.display(), "session write failed");
            }
        }
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = Some(user);
    }

    pub fn sign_out(&self) {
        if let Some(path) = &self.path {
            if path.exists() {
                if let Err(e) = fs::remove_file(path) {
                    tracing::warn!(error = %e, path = %path.display(), "session remove failed");
                }
            }
        }
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn current(&self) -> Option<SessionUser> {
        self.user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn user_id(&self) -> Option<i64> {
        self.current().map(|u| u.id)
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> SessionUser {
        SessionUser {
            id: 1,
            email: "alice@example.com".into(),
            username: Some("alice".into()),
        }
    }

    #[test]
    fn clones_share_sign_in_and_sign_out() {
        let session = Session::in_memory();
        let other = session.clone();
        assert!(!other.is_authenticated());
        session.sign_in(alice());
        assert_eq!(other.user_id(), Some(1));
        other.sign_out();
        assert!(session.current().is_none());
    }

    #[test]
    fn file_session_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        Session::open(&path).sign_in(alice());
        assert_eq!(Session::open(&path).current(), Some(alice()));

        Session::open(&path).sign_out();
        assert!(!path.exists());
        assert!(Session::open(&path).current().is_none());
    }

    #[test]
    fn garbage_session_file_reads_as_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json").unwrap();
        assert!(!Session::open(&path).is_authenticated());
    }
}

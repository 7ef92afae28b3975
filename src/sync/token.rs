//! Identity token issued by the backend's Google sign-in, and the storage
//! port that persists it between sessions.

use crate::logging::redact;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use thiserror::Error;
use tracing::{debug, warn};

/// Opaque `user_id` sent as `X-User-ID` on data requests.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthToken(String);

impl AuthToken {
    /// Returns `None` for blank input.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AuthToken").field(&redact(&self.0)).finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenEvent {
    Saved(AuthToken),
    Cleared,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session file error: {0}")]
    Io(#[from] io::Error),
    #[error("session encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

pub trait TokenStore: Send {
    fn load(&self) -> Option<AuthToken>;
    fn save(&mut self, token: &AuthToken) -> Result<(), StoreError>;
    fn clear(&mut self) -> Result<(), StoreError>;
    /// Every successful `save`/`clear` afterwards is announced on the
    /// returned channel.
    fn subscribe(&mut self) -> Receiver<TokenEvent>;
}

#[derive(Default)]
struct Subscribers(Vec<Sender<TokenEvent>>);

impl Subscribers {
    fn add(&mut self) -> Receiver<TokenEvent> {
        let (tx, rx) = mpsc::channel();
        self.0.push(tx);
        rx
    }

    fn publish(&mut self, event: TokenEvent) {
        self.0.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

#[derive(Serialize, Deserialize)]
struct StoredSession {
    user_id: AuthToken,
}

/// Keeps the token in `session.json` under the data directory.
pub struct FileTokenStore {
    path: PathBuf,
    subscribers: Subscribers,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            subscribers: Subscribers::default(),
        }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<AuthToken> {
        let content = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str::<StoredSession>(&content) {
            Ok(session) => AuthToken::new(session.user_id.0),
            Err(e) => {
                warn!(path = ?self.path, error = %e, "ignoring unreadable session file");
                None
            }
        }
    }

    fn save(&mut self, token: &AuthToken) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&StoredSession {
            user_id: token.clone(),
        })?;
        fs::write(&self.path, content)?;
        debug!(path = ?self.path, token = ?token, "session saved");
        self.subscribers.publish(TokenEvent::Saved(token.clone()));
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        debug!(path = ?self.path, "session cleared");
        self.subscribers.publish(TokenEvent::Cleared);
        Ok(())
    }

    fn subscribe(&mut self) -> Receiver<TokenEvent> {
        self.subscribers.add()
    }
}

/// Process-local store; nothing survives a restart.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Option<AuthToken>,
    subscribers: Subscribers,
}

#[cfg(test)]
impl MemoryTokenStore {
    pub fn with_token(token: AuthToken) -> Self {
        Self {
            token: Some(token),
            subscribers: Subscribers::default(),
        }
    }
}

#[cfg(test)]
impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<AuthToken> {
        self.token.clone()
    }

    fn save(&mut self, token: &AuthToken) -> Result<(), StoreError> {
        self.token = Some(token.clone());
        self.subscribers.publish(TokenEvent::Saved(token.clone()));
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.token = None;
        self.subscribers.publish(TokenEvent::Cleared);
        Ok(())
    }

    fn subscribe(&mut self) -> Receiver<TokenEvent> {
        self.subscribers.add()
    }
}

//! Per-user state kept between requests.
//!
//! A `tower_sessions::Session` cannot list its keys, so everything the CRUD layer
//! stores (namespaced filters, sorting, flash messages) lives in one [`SessionBag`]
//! saved under [`SESSION_KEY`]. Handlers load the bag once, work on it, and save it
//! once before answering.
//!
//! ```rust,ignore
//! async fn handler(session: Session) -> Result<Redirect, CrudError> {
//!     let mut bag = SessionBag::load(&session).await?;
//!     bag.add_flash(FlashKind::Notice, "Saved.");
//!     bag.save(&session).await?;
//!     Ok(Redirect::to("/articles"))
//! }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_sessions::Session;

use crate::errors::CrudError;

/// Session key holding the serialized bag.
pub const SESSION_KEY: &str = "crudkit";

const FLASHES_KEY: &str = "_flashes";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    /// Successful operation
    Notice,
    /// Something the user asked for did not exist
    Warning,
    /// The operation failed
    Error,
}

impl FlashKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Notice => "notice",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// One-shot message shown on the next rendered view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub kind: FlashKind,
    pub message: String,
}

impl FlashMessage {
    #[must_use]
    pub fn new(kind: FlashKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Ordered key/value store persisted in the user's session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionBag {
    values: IndexMap<String, Value>,
}

impl SessionBag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the bag from `session`; a missing entry yields an empty bag.
    ///
    /// # Errors
    ///
    /// `Session` when the store cannot be read or holds a malformed bag.
    pub async fn load(session: &Session) -> Result<Self, CrudError> {
        Ok(session.get::<Self>(SESSION_KEY).await?.unwrap_or_default())
    }

    /// # Errors
    ///
    /// `Session` when the store cannot be written.
    pub async fn save(&self, session: &Session) -> Result<(), CrudError> {
        session.insert(SESSION_KEY, self).await?;
        Ok(())
    }

    #[must_use]
    pub const fn all(&self) -> &IndexMap<String, Value> {
        &self.values
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.shift_remove(key)
    }

    /// Entries whose key starts with `prefix`, with the prefix stripped.
    #[must_use]
    pub fn extract(&self, prefix: &str) -> IndexMap<String, Value> {
        self.values
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(prefix)
                    .map(|name| (name.to_string(), value.clone()))
            })
            .collect()
    }

    /// Remove every key starting with `prefix`; returns how many were removed.
    pub fn remove_prefixed(&mut self, prefix: &str) -> usize {
        let before = self.values.len();
        self.values.retain(|key, _| !key.starts_with(prefix));
        before - self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn add_flash(&mut self, kind: FlashKind, message: impl Into<String>) {
        let mut flashes = self.peek_flashes();
        flashes.push(FlashMessage::new(kind, message));
        match serde_json::to_value(flashes) {
            Ok(value) => self.set(FLASHES_KEY, value),
            Err(err) => tracing::error!(error = %err, "Failed to store flash message"),
        }
    }

    /// Flash messages without consuming them.
    #[must_use]
    pub fn peek_flashes(&self) -> Vec<FlashMessage> {
        self.get(FLASHES_KEY)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
            .unwrap_or_default()
    }

    /// Flash messages, removed from the bag.
    pub fn take_flashes(&mut self) -> Vec<FlashMessage> {
        let flashes = self.peek_flashes();
        self.remove(FLASHES_KEY);
        flashes
    }
}

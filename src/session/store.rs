//! Session records and the store that owns them.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::history::HistoryEntry;
use crate::error::{AppError, Result};
use crate::scenario::{ScenarioKind, ScenarioSource};

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// One player's role-play session.
///
/// Cloning is cheap and yields a handle to the same record. Flags and the
/// player card are fixed at creation; only the history changes, behind its
/// own lock.
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    id: String,
    open_status_bar: bool,
    player_card: String,
    created_at: DateTime<Utc>,
    history: RwLock<Vec<HistoryEntry>>,
}

/// Serializable snapshot of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: String,
    pub open_status_bar: bool,
    pub player_card: String,
    pub history: Vec<HistoryEntry>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    fn new(
        id: String,
        open_status_bar: bool,
        player_card: String,
        history: Vec<HistoryEntry>,
    ) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                id,
                open_status_bar,
                player_card,
                created_at: Utc::now(),
                history: RwLock::new(history),
            }),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    #[must_use]
    pub fn open_status_bar(&self) -> bool {
        self.inner.open_status_bar
    }

    #[must_use]
    pub fn player_card(&self) -> &str {
        &self.inner.player_card
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    /// Append an entry and return the new history length.
    pub fn push(&self, entry: HistoryEntry) -> usize {
        let mut guard = write(&self.inner.history);
        guard.push(entry);
        guard.len()
    }

    /// Replace the whole history and return the length it had before.
    pub fn replace_history(&self, history: Vec<HistoryEntry>) -> usize {
        let mut guard = write(&self.inner.history);
        std::mem::replace(&mut *guard, history).len()
    }

    /// Copy of the history, in insertion order.
    #[must_use]
    pub fn history(&self) -> Vec<HistoryEntry> {
        read(&self.inner.history).clone()
    }

    #[must_use]
    pub fn history_len(&self) -> usize {
        read(&self.inner.history).len()
    }

    #[must_use]
    pub fn view(&self) -> SessionView {
        SessionView {
            session_id: self.inner.id.clone(),
            open_status_bar: self.inner.open_status_bar,
            player_card: self.inner.player_card.clone(),
            history: self.history(),
            created_at: self.inner.created_at,
        }
    }
}

/// Thread-safe store for sessions.
///
/// Sessions live until the store is dropped; there is no removal. Scenario
/// documents are always loaded before any lock is taken, so a failed load
/// never leaves a half-applied change behind.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

#[derive(Debug)]
struct SessionStoreInner {
    sessions: RwLock<HashMap<String, Session>>,
    scenarios: Arc<dyn ScenarioSource>,
}

impl SessionStore {
    /// Create an empty store loading scripted content from `scenarios`.
    #[must_use]
    pub fn new(scenarios: Arc<dyn ScenarioSource>) -> Self {
        Self {
            inner: Arc::new(SessionStoreInner {
                sessions: RwLock::new(HashMap::new()),
                scenarios,
            }),
        }
    }

    #[must_use]
    pub fn scenarios(&self) -> &Arc<dyn ScenarioSource> {
        &self.inner.scenarios
    }

    /// Create a session and return its view.
    ///
    /// With `open_status_bar` set, the status bar document is appended as the
    /// first system entry. If that document cannot be loaded no session is
    /// registered.
    pub async fn create(
        &self,
        open_status_bar: bool,
        player_card: impl Into<String>,
    ) -> Result<SessionView> {
        let mut history = Vec::new();
        if open_status_bar {
            let status_bar = self.inner.scenarios.load(ScenarioKind::StatusBar).await?;
            history.push(HistoryEntry::system(status_bar));
        }

        let session = {
            let mut guard = write(&self.inner.sessions);
            let mut id = Uuid::new_v4().to_string();
            while guard.contains_key(&id) {
                id = Uuid::new_v4().to_string();
            }
            let session = Session::new(id.clone(), open_status_bar, player_card.into(), history);
            guard.insert(id, session.clone());
            session
        };

        info!(
            name: "session.created",
            session_id = %session.id(),
            open_status_bar = open_status_bar,
            history_len = session.history_len(),
            "Session created"
        );
        Ok(session.view())
    }

    /// Get a session by ID.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Session> {
        read(&self.inner.sessions).get(id).cloned()
    }

    /// Get a session by ID or fail with [`AppError::SessionNotFound`].
    pub fn require(&self, id: &str) -> Result<Session> {
        self.get(id)
            .ok_or_else(|| AppError::SessionNotFound(id.to_string()))
    }

    /// Append the opening event to a session's history.
    ///
    /// Every call appends a fresh copy; repeated calls are not deduplicated.
    pub async fn start_storyline(&self, id: &str) -> Result<()> {
        let session = self.require(id)?;
        let opening = self.inner.scenarios.load(ScenarioKind::OpeningEvent).await?;
        let len = session.push(HistoryEntry::system(opening));

        info!(name: "storyline.started", session_id = %id, history_len = len, "Opening event appended");
        Ok(())
    }

    /// Append a player message, verbatim.
    pub fn add_message(&self, id: &str, message: impl Into<String>) -> Result<()> {
        let session = self.require(id)?;
        let message = message.into();
        let message_len = message.len();
        let len = session.push(HistoryEntry::user(message));

        info!(
            name: "message.added",
            session_id = %id,
            message_len = message_len,
            history_len = len,
            "Player message appended"
        );
        Ok(())
    }

    /// Copy of a session's full history.
    pub fn bundle_history(&self, id: &str) -> Result<Vec<HistoryEntry>> {
        let history = self.require(id)?.history();
        info!(name: "history.bundled", session_id = %id, history_len = history.len(), "History bundled");
        Ok(history)
    }

    /// Replace a session's history wholesale.
    pub fn import_history(&self, id: &str, history: Vec<HistoryEntry>) -> Result<()> {
        let session = self.require(id)?;
        let imported = history.len();
        let replaced = session.replace_history(history);

        info!(
            name: "history.imported",
            session_id = %id,
            imported = imported,
            replaced = replaced,
            "History imported"
        );
        Ok(())
    }

    /// Get the number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        read(&self.inner.sessions).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

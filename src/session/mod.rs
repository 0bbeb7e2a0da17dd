//! Session and history management.
//!
//! This module provides in-memory session storage for role-play chats.
//! Sessions are identified by UUID and hold the player's flags together with
//! the ordered history of scripted and player entries.
//!
//! # Architecture
//!
//! - [`Session`]: A single player's session record
//! - [`SessionStore`]: Thread-safe store for all live sessions
//! - [`HistoryEntry`]: One role-tagged history entry
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use roleplay_sessions::scenario::ScenarioLoader;
//! use roleplay_sessions::session::SessionStore;
//!
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! runtime.block_on(async {
//!     let store = SessionStore::new(Arc::new(ScenarioLoader::new("data", true)));
//!     let session = store.create(false, "Alex").await.unwrap();
//!     store.add_message(&session.session_id, "Hello!").unwrap();
//!
//!     let history = store.bundle_history(&session.session_id).unwrap();
//!     assert_eq!(history.len(), 1);
//! });
//! ```

mod history;
mod store;

pub use history::{HistoryEntry, ROLE_SYSTEM, ROLE_USER};
pub use store::{Session, SessionStore, SessionView};

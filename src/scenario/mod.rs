//! Static scenario documents.
//!
//! A role-play is seeded from a closed set of nine YAML documents (player
//! card, place, persona, status bar, ...). Only [`ScenarioKind::StatusBar`]
//! and [`ScenarioKind::OpeningEvent`] are injected into session history by
//! the service itself; the rest are served read-only for whatever assembles
//! the final prompt.
//!
//! # Architecture
//!
//! - [`ScenarioKind`]: The closed set of document names
//! - [`ScenarioSource`]: Trait the session store loads documents through
//! - [`ScenarioLoader`]: Directory-backed source with an optional cache

mod loader;

pub use loader::{ScenarioDocument, ScenarioError, ScenarioKind, ScenarioLoader, ScenarioSource};

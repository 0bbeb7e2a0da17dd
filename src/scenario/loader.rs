//! Directory-backed scenario loading.

use std::collections::HashMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::fs;
use tracing::{debug, warn};

/// A parsed scenario document.
///
/// Every load hands out an owned value, so callers may mutate it freely.
pub type ScenarioDocument = Value;

/// The closed set of scenario documents a role-play is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScenarioKind {
    /// The player's character card.
    PlayerCard,
    /// Where the story takes place.
    Place,
    /// The main character's persona.
    Persona,
    /// Status bar template shown alongside each turn.
    StatusBar,
    /// Script that opens the storyline.
    OpeningEvent,
    /// Rules for how characters interact.
    InteractionRules,
    /// How the relationship is allowed to progress.
    EmotionalProgression,
    /// Supporting cast around the main character.
    RelatedCharacters,
    /// The backstory the player uncovers.
    Mystery,
}

impl ScenarioKind {
    /// Every kind, in canonical order.
    pub const ALL: [ScenarioKind; 9] = [
        ScenarioKind::PlayerCard,
        ScenarioKind::Place,
        ScenarioKind::Persona,
        ScenarioKind::StatusBar,
        ScenarioKind::OpeningEvent,
        ScenarioKind::InteractionRules,
        ScenarioKind::EmotionalProgression,
        ScenarioKind::RelatedCharacters,
        ScenarioKind::Mystery,
    ];

    /// The public name of this document, as used in URLs and errors.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ScenarioKind::PlayerCard => "player-card",
            ScenarioKind::Place => "place",
            ScenarioKind::Persona => "persona",
            ScenarioKind::StatusBar => "status-bar",
            ScenarioKind::OpeningEvent => "opening-event",
            ScenarioKind::InteractionRules => "interaction-rules",
            ScenarioKind::EmotionalProgression => "emotional-progression",
            ScenarioKind::RelatedCharacters => "related-characters",
            ScenarioKind::Mystery => "mystery",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            ScenarioKind::PlayerCard => "Player character card",
            ScenarioKind::Place => "Setting",
            ScenarioKind::Persona => "Main character persona",
            ScenarioKind::StatusBar => "Status bar template",
            ScenarioKind::OpeningEvent => "Opening event script",
            ScenarioKind::InteractionRules => "Character interaction rules",
            ScenarioKind::EmotionalProgression => "Emotional progression",
            ScenarioKind::RelatedCharacters => "Related characters",
            ScenarioKind::Mystery => "Mystery and backstory",
        }
    }

    /// File name of this document inside the scenario directory.
    #[must_use]
    pub fn file_name(self) -> String {
        format!("{}.yaml", self.name())
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScenarioKind {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScenarioKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| ScenarioError::NotFound {
                name: s.to_string(),
            })
    }
}

/// Errors that can occur while loading a scenario document.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// The document does not exist, or the name is not a known scenario.
    #[error("Scenario document not found: {name}")]
    NotFound { name: String },

    /// The document exists but could not be read.
    #[error("Failed to read scenario {name}: {source}")]
    Io {
        name: String,
        source: std::io::Error,
    },

    /// The document is not valid YAML.
    #[error("Failed to parse scenario {name}: {source}")]
    Parse {
        name: String,
        source: serde_yaml::Error,
    },

    /// The YAML parsed but has no JSON representation (e.g. a float map key).
    #[error("Scenario {name} cannot be represented as JSON: {source}")]
    Convert {
        name: String,
        source: serde_json::Error,
    },
}

/// Source of scenario documents.
///
/// The session store only depends on this trait, so tests can swap in a
/// fixed set of documents.
#[async_trait]
pub trait ScenarioSource: Send + Sync + fmt::Debug {
    /// Load a document. Fails with [`ScenarioError::NotFound`] when absent.
    async fn load(&self, kind: ScenarioKind) -> Result<ScenarioDocument, ScenarioError>;

    /// Whether the document is currently present in storage.
    fn is_available(&self, kind: ScenarioKind) -> bool;

    /// Load a document by its public name.
    async fn load_named(&self, name: &str) -> Result<ScenarioDocument, ScenarioError> {
        let kind: ScenarioKind = name.parse()?;
        self.load(kind).await
    }

    /// Kinds whose documents are missing from storage.
    fn missing(&self) -> Vec<ScenarioKind> {
        ScenarioKind::ALL
            .into_iter()
            .filter(|kind| !self.is_available(*kind))
            .collect()
    }
}

/// Loads scenario documents from YAML files in a directory.
#[derive(Debug)]
pub struct ScenarioLoader {
    dir: PathBuf,
    cache: Option<RwLock<HashMap<ScenarioKind, ScenarioDocument>>>,
}

impl ScenarioLoader {
    /// Create a loader reading from `dir`.
    ///
    /// With `cache` enabled each document is parsed once and reused for the
    /// lifetime of the loader.
    pub fn new(dir: impl Into<PathBuf>, cache: bool) -> Self {
        Self {
            dir: dir.into(),
            cache: cache.then(|| RwLock::new(HashMap::new())),
        }
    }

    /// Path of the file backing `kind`.
    #[must_use]
    pub fn path_for(&self, kind: ScenarioKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    fn cached(&self, kind: ScenarioKind) -> Option<ScenarioDocument> {
        let cache = self.cache.as_ref()?;
        let guard = cache.read().unwrap_or_else(PoisonError::into_inner);
        guard.get(&kind).cloned()
    }

    fn remember(&self, kind: ScenarioKind, document: &ScenarioDocument) {
        if let Some(cache) = &self.cache {
            let mut guard = cache.write().unwrap_or_else(PoisonError::into_inner);
            guard.insert(kind, document.clone());
        }
    }

    fn parse(kind: ScenarioKind, raw: &str) -> Result<ScenarioDocument, ScenarioError> {
        // Go through serde_yaml::Value so integer and bool map keys survive as
        // JSON object keys.
        let yaml: serde_yaml::Value =
            serde_yaml::from_str(raw).map_err(|source| ScenarioError::Parse {
                name: kind.name().to_string(),
                source,
            })?;
        serde_json::to_value(yaml).map_err(|source| ScenarioError::Convert {
            name: kind.name().to_string(),
            source,
        })
    }
}

#[async_trait]
impl ScenarioSource for ScenarioLoader {
    async fn load(&self, kind: ScenarioKind) -> Result<ScenarioDocument, ScenarioError> {
        if let Some(document) = self.cached(kind) {
            return Ok(document);
        }

        let path = self.path_for(kind);
        let raw = fs::read_to_string(&path).await.map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                warn!(name: "scenario.missing", scenario = %kind, path = %path.display(), "Scenario document not found");
                ScenarioError::NotFound {
                    name: kind.name().to_string(),
                }
            } else {
                ScenarioError::Io {
                    name: kind.name().to_string(),
                    source,
                }
            }
        })?;

        let document = Self::parse(kind, &raw)?;
        debug!(name: "scenario.loaded", scenario = %kind, bytes = raw.len(), "Scenario document loaded");
        self.remember(kind, &document);
        Ok(document)
    }

    fn is_available(&self, kind: ScenarioKind) -> bool {
        self.path_for(kind).is_file()
    }
}

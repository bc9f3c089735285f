//! Screen catalog loading.
//!
//! A catalog is a TOML file with one `[[screen]]` table per form screen:
//!
//! ```toml
//! [[screen]]
//! name = "antennas"
//! max_entities = 12
//! media_slots = ["antenna_1_photo", "antenna_2_photo"]
//! required_fields = ["vendor", "azimuth"]
//! ```

use serde::Deserialize;
use std::path::Path;

use crate::error::EngineError;

/// How one form screen drives the grid engine.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ScreenConfig {
    pub name: String,

    /// Upper bound offered by the screen's entity-count picker.
    #[serde(default = "default_max_entities")]
    pub max_entities: usize,

    /// Attachment categories shown on the screen.
    #[serde(default)]
    pub media_slots: Vec<String>,

    /// Fields that must be non-blank in every active column before submit.
    #[serde(default)]
    pub required_fields: Vec<String>,
}

fn default_max_entities() -> usize {
    1
}

impl ScreenConfig {
    pub fn new(name: impl Into<String>, max_entities: usize) -> Self {
        Self {
            name: name.into(),
            max_entities,
            media_slots: Vec::new(),
            required_fields: Vec::new(),
        }
    }

    pub fn with_media_slots<I, S>(mut self, slots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.media_slots = slots.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_required_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_fields = fields.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ScreenCatalog {
    #[serde(default, rename = "screen")]
    pub screens: Vec<ScreenConfig>,
}

impl ScreenCatalog {
    pub fn from_toml_str(contents: &str) -> Result<Self, EngineError> {
        let catalog: ScreenCatalog = toml::from_str(contents)?;
        tracing::debug!(screens = catalog.screens.len(), "Screen catalog parsed");
        Ok(catalog)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    pub fn screen(&self, name: &str) -> Result<&ScreenConfig, EngineError> {
        self.screens
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| EngineError::UnknownScreen(name.to_string()))
    }
}

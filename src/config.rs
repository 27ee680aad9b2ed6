//! Subsystem configuration
//!
//! Defaults mirror the shipped tuning: a 1 s fade window, 20 sound-effect
//! voices, full BGM bus, half-level SE bus. Every field is optional in
//! the TOML file, so an empty file is a valid configuration.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Fade window in seconds for BGM transitions
    pub fade_seconds: f64,

    /// Number of sound-effect voices; a hard capacity bound
    pub voice_count: usize,

    /// Initial BGM bus level (linear 0..1)
    pub bgm_level: f32,

    /// Initial SE bus level (linear 0..1)
    pub se_level: f32,

    /// Start a random BGM track when the system starts
    pub play_on_start: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            fade_seconds: 1.0,
            voice_count: 20,
            bgm_level: 1.0,
            se_level: 0.5,
            play_on_start: true,
        }
    }
}

impl AudioConfig {
    /// Load from a TOML file; missing keys fall back to defaults
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: AudioConfig = toml::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engines cannot honor
    pub fn validate(&self) -> Result<()> {
        if self.voice_count == 0 {
            return Err(Error::Config("voice_count must be at least 1".into()));
        }
        if !self.fade_seconds.is_finite() || self.fade_seconds < 0.0 {
            return Err(Error::Config(
                "fade_seconds must be a non-negative number".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.bgm_level) {
            return Err(Error::Config("bgm_level must be within 0.0..=1.0".into()));
        }
        if !(0.0..=1.0).contains(&self.se_level) {
            return Err(Error::Config("se_level must be within 0.0..=1.0".into()));
        }
        Ok(())
    }
}

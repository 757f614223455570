//! Rig description: the set of named controls wired to a board
//!
//! Loaded from YAML by the replay tool. The core never reads files itself.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use super::{ConfigError, ControlConfig};
use crate::control::ControlKind;

/// Root rig document
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RigConfig {
    /// Defaults applied to every control without its own `config`
    #[serde(default)]
    pub defaults: ControlConfig,
    pub controls: Vec<ControlSpec>,
}

/// One physical control on the rig
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ControlSpec {
    pub name: String,
    pub kind: ControlKind,
    /// GPIO pin (signal pin for mux buttons)
    pub pin: u8,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub select_pins: Vec<u8>,
    #[serde(default)]
    pub channel: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banks: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<ControlConfig>,
}

impl ControlSpec {
    /// Effective configuration: own override or rig defaults, with bank count applied
    pub fn effective_config(&self, defaults: &ControlConfig) -> ControlConfig {
        let mut config = self.config.unwrap_or(*defaults);
        if let Some(banks) = self.banks {
            config.banks = banks;
        }
        config
    }
}

impl RigConfig {
    /// Load a rig from a YAML file and validate it
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read rig file: {}", path.display()))?;

        let rig = Self::from_yaml(&contents)
            .with_context(|| format!("Invalid rig file: {}", path.display()))?;

        Ok(rig)
    }

    /// Parse and validate a rig from YAML text
    pub fn from_yaml(contents: &str) -> Result<Self> {
        let rig: RigConfig = serde_yaml::from_str(contents).context("Failed to parse YAML rig")?;
        rig.validate()?;
        Ok(rig)
    }

    /// Validate the defaults and every control
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.defaults.validate()?;

        let mut names = HashSet::new();
        for spec in &self.controls {
            if !names.insert(spec.name.as_str()) {
                return Err(ConfigError::DuplicateControl(spec.name.clone()));
            }

            if spec.kind == ControlKind::MuxButton {
                if spec.select_pins.is_empty() {
                    return Err(ConfigError::MissingSelectPins(spec.name.clone()));
                }
                let pins = spec.select_pins.len();
                if pins < 8 && usize::from(spec.channel) >> pins != 0 {
                    return Err(ConfigError::MuxChannel {
                        name: spec.name.clone(),
                        channel: spec.channel,
                        pins,
                    });
                }
            }

            spec.effective_config(&self.defaults).validate()?;
        }

        Ok(())
    }
}

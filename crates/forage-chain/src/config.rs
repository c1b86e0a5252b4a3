//! Experiment configuration.
//!
//! Loaded from TOML at deploy time; every field has a default matching the
//! reference deployment (two forager slots, unit sliders at 0.5).

use forage_kernel::answer::SliderBounds;
use forage_kernel::seed::SeedDefinition;
use forage_kernel::world::FieldParams;
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to parse experiment config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("num_foragers must be at least 1")]
    EmptyPool,

    #[error("expected {expected} initial positions (one per forager slot), got {actual}")]
    PositionCount { expected: usize, actual: usize },

    #[error("slider bounds are inverted: [{min}, {max}]")]
    InvertedBounds { min: f64, max: f64 },

    #[error("starting slider {name:?} is out of bounds [{min}, {max}]: {value}")]
    SliderOutOfBounds {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// Top-level experiment configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExperimentConfig {
    /// Number of forager slots per generation.
    #[serde(default = "default_num_foragers")]
    pub num_foragers: usize,

    /// Position labels for the first generation, one per slot.
    #[serde(default = "default_initial_positions")]
    pub initial_positions: Vec<String>,

    /// Social-contract parameters and their first-generation values.
    #[serde(default = "default_starting_sliders")]
    pub starting_sliders: BTreeMap<String, f64>,

    /// Widget bounds shared by every slider page.
    #[serde(default)]
    pub slider_bounds: SliderBounds,

    /// Chain length cap enforced by the surrounding framework.
    #[serde(default = "default_max_nodes_per_chain")]
    pub max_nodes_per_chain: usize,

    /// Trials each participant contributes.
    #[serde(default = "default_trials_per_participant")]
    pub trials_per_participant: usize,

    /// Resource field shape.
    #[serde(default)]
    pub field: FieldParams,

    /// RNG seed for field generation; `None` means non-reproducible.
    #[serde(default)]
    pub field_seed: Option<u64>,
}

fn default_num_foragers() -> usize {
    2
}

fn default_initial_positions() -> Vec<String> {
    vec!["A".to_string(), "B".to_string()]
}

fn default_starting_sliders() -> BTreeMap<String, f64> {
    [
        ("overhead".to_string(), 0.5),
        ("prerogative".to_string(), 0.5),
        ("wages".to_string(), 0.5),
    ]
    .into_iter()
    .collect()
}

fn default_max_nodes_per_chain() -> usize {
    10
}

fn default_trials_per_participant() -> usize {
    2
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            num_foragers: default_num_foragers(),
            initial_positions: default_initial_positions(),
            starting_sliders: default_starting_sliders(),
            slider_bounds: SliderBounds::default(),
            max_nodes_per_chain: default_max_nodes_per_chain(),
            trials_per_participant: default_trials_per_participant(),
            field: FieldParams::default(),
            field_seed: None,
        }
    }
}

impl ExperimentConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_foragers == 0 {
            return Err(ConfigError::EmptyPool);
        }
        if self.initial_positions.len() != self.num_foragers {
            return Err(ConfigError::PositionCount {
                expected: self.num_foragers,
                actual: self.initial_positions.len(),
            });
        }
        if self.slider_bounds.min >= self.slider_bounds.max {
            return Err(ConfigError::InvertedBounds {
                min: self.slider_bounds.min,
                max: self.slider_bounds.max,
            });
        }
        for (name, value) in &self.starting_sliders {
            if !self.slider_bounds.contains(*value) {
                return Err(ConfigError::SliderOutOfBounds {
                    name: name.clone(),
                    value: *value,
                    min: self.slider_bounds.min,
                    max: self.slider_bounds.max,
                });
            }
        }
        Ok(())
    }

    /// The social-contract parameters the reducer folds each generation.
    pub fn slider_dimensions(&self) -> Vec<String> {
        self.starting_sliders.keys().cloned().collect()
    }

    /// The first generation's seed: starting sliders plus initial positions.
    pub fn initial_seed(&self) -> SeedDefinition {
        let mut entries: Vec<(String, Value)> = self
            .starting_sliders
            .iter()
            .map(|(name, value)| (name.clone(), json!(value)))
            .collect();
        entries.push(("positions".to_string(), json!(self.initial_positions)));
        SeedDefinition::from_entries(entries)
    }
}

//! Engine configuration loaded from TOML.
//!
//! Only cache sizes are configurable. Every field has a default, so an empty
//! file (or no file at all) yields a working configuration.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::Path;
use thiserror::Error;

/// Accepted range for the `*_bits` fields. 28 bits is a quarter billion
/// slots, far past any sensible table size.
pub const TABLE_BITS_RANGE: RangeInclusive<u32> = 1..=28;

/// Errors that can occur when loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse the configuration file as valid TOML.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    /// A table size outside [`TABLE_BITS_RANGE`].
    #[error("{field} = {value} is out of range (expected 1..=28)")]
    InvalidTableBits { field: &'static str, value: u32 },
}

/// Sizes of the search caches, as powers of two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct EngineConfig {
    /// The transposition table has `1 << tt_bits` slots. Defaults to 18.
    #[serde(default = "default_tt_bits")]
    pub tt_bits: u32,
    /// The pawn structure cache has `1 << pawn_cache_bits` slots. Defaults to 14.
    #[serde(default = "default_pawn_cache_bits")]
    pub pawn_cache_bits: u32,
}

fn default_tt_bits() -> u32 {
    18
}

fn default_pawn_cache_bits() -> u32 {
    14
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            tt_bits: default_tt_bits(),
            pawn_cache_bits: default_pawn_cache_bits(),
        }
    }
}

impl EngineConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the configuration at `path`.
    ///
    /// A missing file is not an error: the defaults are returned.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadError`] if the file exists but cannot be read,
    /// [`ConfigError::ParseError`] if it is not valid TOML, or
    /// [`ConfigError::InvalidTableBits`] if a size is out of range.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!(
            path = %path.display(),
            tt_bits = config.tt_bits,
            pawn_cache_bits = config.pawn_cache_bits,
            "loaded engine config"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [("tt_bits", self.tt_bits), ("pawn_cache_bits", self.pawn_cache_bits)] {
            if !TABLE_BITS_RANGE.contains(&value) {
                return Err(ConfigError::InvalidTableBits { field, value });
            }
        }
        Ok(())
    }
}

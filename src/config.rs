use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pathfind::{SearchConfig, SearchFlags};

// ----------------------------------------------
// ConfigError
// ----------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cell size must be positive, got {0}")]
    InvalidCellSize(f32),

    #[error("max height diff must not be negative, got {0}")]
    NegativeMaxHeightDiff(i32),

    #[error("cache TTL must be a finite, non-negative number of secs, got {0}")]
    InvalidCacheTtl(f32),

    #[error("cache capacity must be at least 1 entry")]
    ZeroCacheCapacity,

    #[error("failed to parse config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

// ----------------------------------------------
// NavConfig
// ----------------------------------------------

// Deployment tunables for the pathfinding engine. Everything the
// algorithms parameterize on lives here, explicitly, so independent
// Navigator instances (one per test, one per map) never share state
// through module-level constants.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    // World units per grid cell side.
    pub cell_size: f32,

    pub allow_diagonal: bool,
    pub avoid_corner_cutting: bool,
    pub respect_height: bool,
    pub max_height_diff: i32,

    pub cache_ttl_secs: f32,
    pub cache_max_entries: usize,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            cell_size: 32.0,
            allow_diagonal: true,
            avoid_corner_cutting: true,
            respect_height: false,
            max_height_diff: 1,
            cache_ttl_secs: 30.0,
            cache_max_entries: 128,
        }
    }
}

impl NavConfig {
    // Malformed configurations are rejected here, at configuration
    // time, never mid-search.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.cell_size > 0.0) {
            return Err(ConfigError::InvalidCellSize(self.cell_size));
        }
        if self.max_height_diff < 0 {
            return Err(ConfigError::NegativeMaxHeightDiff(self.max_height_diff));
        }
        if !self.cache_ttl_secs.is_finite() || self.cache_ttl_secs < 0.0 {
            return Err(ConfigError::InvalidCacheTtl(self.cache_ttl_secs));
        }
        if self.cache_max_entries == 0 {
            return Err(ConfigError::ZeroCacheCapacity);
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: NavConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn search_config(&self) -> SearchConfig {
        let mut flags = SearchFlags::empty();
        if self.allow_diagonal {
            flags |= SearchFlags::ALLOW_DIAGONAL;
        }
        if self.avoid_corner_cutting {
            flags |= SearchFlags::AVOID_CORNER_CUTTING;
        }
        if self.respect_height {
            flags |= SearchFlags::RESPECT_HEIGHT;
        }
        SearchConfig {
            flags,
            max_height_diff: self.max_height_diff,
        }
    }

    #[inline]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs_f32(self.cache_ttl_secs)
    }
}

// ----------------------------------------------
// Tests
// ----------------------------------------------

//! Runtime configuration, loadable from JSON.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{Result, ScrambleError};
use crate::types::SearchBounds;

/// Tunables for playback and the key search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Key grid explored by the brute-force search
    pub search: SearchBounds,
    /// Milliseconds between two acquired frames
    pub cadence_ms: u64,
    /// Worker threads for candidate evaluation
    pub threads: usize,
    /// Candidates evaluated between two progress events
    pub batch_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search: SearchBounds::default(),
            cadence_ms: 33,
            threads: num_cpus::get().max(1),
            batch_size: 512,
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cadence_ms == 0 {
            return Err(ScrambleError::Config("cadence_ms must be positive".into()));
        }
        if self.threads == 0 {
            return Err(ScrambleError::Config("threads must be positive".into()));
        }
        if self.batch_size == 0 {
            return Err(ScrambleError::Config("batch_size must be positive".into()));
        }
        Ok(())
    }

    pub fn cadence(&self) -> Duration {
        Duration::from_millis(self.cadence_ms)
    }

    pub fn with_bounds(mut self, bounds: SearchBounds) -> Self {
        self.search = bounds;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_cadence_ms(mut self, cadence_ms: u64) -> Self {
        self.cadence_ms = cadence_ms;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.search, SearchBounds::new(255, 127));
        assert_eq!(config.cadence(), Duration::from_millis(33));
        assert!(config.threads >= 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = Config::from_json(r#"{ "search": { "r_max": 15, "s_max": 7 } }"#).unwrap();
        assert_eq!(config.search, SearchBounds::new(15, 7));
        assert_eq!(config.cadence_ms, 33);
    }

    #[test]
    fn test_rejects_zero_cadence() {
        assert!(matches!(
            Config::from_json(r#"{ "cadence_ms": 0 }"#),
            Err(ScrambleError::Config(_))
        ));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            Config::from_json("{ not json"),
            Err(ScrambleError::Json(_))
        ));
    }
}

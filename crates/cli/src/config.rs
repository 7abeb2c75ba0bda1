//! Pipeline configuration.

use anyhow::{Context, Result};
use deck_core::restructure::{DEFAULT_BASE_DELAY, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_RETRIES};
use deck_core::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings for a conversion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Fragments per restructuring request.
    pub chunk_size: usize,
    /// Attempts per chunk when rate limited.
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,
    /// Restructuring model name.
    pub model: String,
    /// Where archives are unpacked.
    pub work_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay_ms: DEFAULT_BASE_DELAY.as_millis() as u64,
            model: deck_genai::DEFAULT_MODEL.to_string(),
            work_dir: PathBuf::from("extracted_pptx"),
        }
    }
}

impl PipelineConfig {
    /// Load settings from a JSON file; missing fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Backoff settings for the orchestrator.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.base_delay_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.chunk_size, 50);
        assert_eq!(config.retry_policy(), RetryPolicy::default());
        assert_eq!(config.model, "gemini-1.5-flash");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.json");
        std::fs::write(&path, r#"{"chunk_size": 20, "base_delay_ms": 250}"#).unwrap();

        let config = PipelineConfig::from_file(&path).unwrap();
        assert_eq!(config.chunk_size, 20);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_policy().base_delay, Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.json");
        std::fs::write(&path, "chunk_size = 20").unwrap();
        assert!(PipelineConfig::from_file(&path).is_err());
    }
}

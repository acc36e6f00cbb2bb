use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_SECTIONS: usize = 500;
pub const DEFAULT_COLLABORATOR_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_STRUCTURE_EXCERPT_CHARS: usize = 4000;
pub const DEFAULT_ADVISOR_EXCERPT_CHARS: usize = 1000;
pub const DEFAULT_PROMPT_PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub max_sections: usize,
    pub collaborator_timeout_ms: u64,
    pub structure_excerpt_chars: usize,
    pub advisor_excerpt_chars: usize,
    pub prompt_preview_chars: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_sections: DEFAULT_MAX_SECTIONS,
            collaborator_timeout_ms: DEFAULT_COLLABORATOR_TIMEOUT_MS,
            structure_excerpt_chars: DEFAULT_STRUCTURE_EXCERPT_CHARS,
            advisor_excerpt_chars: DEFAULT_ADVISOR_EXCERPT_CHARS,
            prompt_preview_chars: DEFAULT_PROMPT_PREVIEW_CHARS,
        }
    }
}

impl AnalysisConfig {
    /// Reads a JSON config; absent keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_sections == 0 {
            bail!("max_sections must be greater than 0");
        }
        if self.collaborator_timeout_ms == 0 {
            bail!("collaborator_timeout_ms must be greater than 0");
        }
        Ok(())
    }

    pub fn collaborator_timeout(&self) -> Duration {
        Duration::from_millis(self.collaborator_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config: AnalysisConfig =
            serde_json::from_value(serde_json::json!({ "max_sections": 40 }))
                .expect("config should deserialize");

        assert_eq!(config.max_sections, 40);
        assert_eq!(config.collaborator_timeout(), Duration::from_secs(30));
        assert_eq!(config.structure_excerpt_chars, 4000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_limits_are_rejected() {
        let config = AnalysisConfig {
            collaborator_timeout_ms: 0,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_reads_json_file() {
        let path = std::env::temp_dir().join(format!(
            "thesis-structure-config-{}.json",
            std::process::id()
        ));
        fs::write(&path, r#"{"advisor_excerpt_chars": 250}"#).expect("config should write");

        let config = AnalysisConfig::load(&path).expect("config should load");
        let _ = fs::remove_file(&path);

        assert_eq!(config.advisor_excerpt_chars, 250);
        assert_eq!(config.max_sections, DEFAULT_MAX_SECTIONS);
    }
}

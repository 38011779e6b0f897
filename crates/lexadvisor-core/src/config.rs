//! LexAdvisor configuration system.
//!
//! One `LexConfig` value is loaded at startup and passed explicitly to every
//! component factory. Nothing reads or mutates process configuration after that,
//! apart from API-key fallbacks resolved while a provider is being constructed.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{LexError, Result};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LexConfig {
    /// Shared API key used by both encoder and generator unless a section overrides it.
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
}

impl LexConfig {
    /// Load config from `$LEXADVISOR_CONFIG`, else the default path, else defaults.
    pub fn load() -> Result<Self> {
        let path = std::env::var("LEXADVISOR_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default_path());
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| LexError::Config(format!("Failed to read {}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    /// Parse config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| LexError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the given path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| LexError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values that would silently break retrieval or generation.
    pub fn validate(&self) -> Result<()> {
        let t = self.retrieval.threshold;
        if !t.is_finite() || !(-1.0..=1.0).contains(&t) {
            return Err(LexError::Config(format!(
                "retrieval.threshold must be within [-1, 1], got {t}"
            )));
        }
        if !self.llm.temperature.is_finite() || self.llm.temperature < 0.0 {
            return Err(LexError::Config(format!(
                "llm.temperature must be a non-negative number, got {}",
                self.llm.temperature
            )));
        }
        if let Some(template) = &self.prompt.template {
            for placeholder in ["{law_content}", "{risks}", "{question}"] {
                if !template.contains(placeholder) {
                    return Err(LexError::Config(format!(
                        "prompt.template is missing the {placeholder} placeholder"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Get the default config path (~/.lexadvisor/config.toml).
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the LexAdvisor home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".lexadvisor")
    }
}

/// Vector encoder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    /// Overrides the registry base URL when non-empty.
    #[serde(default)]
    pub endpoint: String,
    /// Overrides the top-level `api_key` when non-empty.
    #[serde(default)]
    pub api_key: String,
}

fn default_provider() -> String { "gemini".into() }
fn default_embedding_model() -> String { "gemini-embedding-001".into() }

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_embedding_model(),
            endpoint: String::new(),
            api_key: String::new(),
        }
    }
}

/// Generation model configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_llm_model() -> String { "gemini-flash-latest".into() }
fn default_temperature() -> f32 { 0.3 }

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_llm_model(),
            endpoint: String::new(),
            api_key: String::new(),
            temperature: default_temperature(),
        }
    }
}

/// Similarity search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Admission threshold: a match needs a cosine score strictly above this.
    /// Calibrated for gemini-embedding-001, not a universal cutoff.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

pub const DEFAULT_ADMISSION_THRESHOLD: f64 = 0.5;

fn default_threshold() -> f64 { DEFAULT_ADMISSION_THRESHOLD }

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { threshold: default_threshold() }
    }
}

/// Prompt template override.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PromptConfig {
    /// Must contain `{law_content}`, `{risks}` and `{question}`.
    #[serde(default)]
    pub template: Option<String>,
}

/// SQLite storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

fn default_db_path() -> String { "~/.lexadvisor/legal.db".into() }

impl Default for StorageConfig {
    fn default() -> Self {
        Self { db_path: default_db_path() }
    }
}

impl StorageConfig {
    /// Database path with `~` expanded. `:memory:` is passed through.
    pub fn resolved_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.db_path).to_string())
    }
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origins. Empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 8000 }

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LexConfig::default();
        assert_eq!(config.embedding.provider, "gemini");
        assert_eq!(config.embedding.model, "gemini-embedding-001");
        assert_eq!(config.llm.model, "gemini-flash-latest");
        assert!((config.llm.temperature - 0.3).abs() < 1e-6);
        assert!((config.retrieval.threshold - 0.5).abs() < 1e-6);
        assert_eq!(config.gateway.port, 8000);
        assert!(config.prompt.template.is_none());
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
            api_key = "shared-key"

            [llm]
            provider = "ollama"
            model = "llama3.2"
            temperature = 0.1

            [retrieval]
            threshold = 0.62

            [gateway]
            port = 9090
            cors_origins = ["http://localhost:5173"]
        "#;

        let config = LexConfig::from_toml(toml_str).unwrap();
        assert_eq!(config.api_key, "shared-key");
        assert_eq!(config.llm.provider, "ollama");
        assert_eq!(config.llm.model, "llama3.2");
        assert!((config.retrieval.threshold - 0.62).abs() < 1e-6);
        assert_eq!(config.gateway.cors_origins.len(), 1);
        // Untouched sections keep their defaults
        assert_eq!(config.embedding.provider, "gemini");
    }

    #[test]
    fn test_config_missing_fields_use_defaults() {
        let config = LexConfig::from_toml("").unwrap();
        assert_eq!(config.llm.provider, "gemini");
        assert_eq!(config.storage.db_path, "~/.lexadvisor/legal.db");
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let err = LexConfig::from_toml("[retrieval]\nthreshold = 1.5").unwrap_err();
        assert!(matches!(err, LexError::Config(_)));
    }

    #[test]
    fn test_template_without_placeholder_rejected() {
        let err = LexConfig::from_toml("[prompt]\ntemplate = \"{law_content} {risks}\"").unwrap_err();
        assert!(err.to_string().contains("{question}"));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = LexConfig::default();
        config.gateway.port = 7070;
        config.save_to(&path).unwrap();

        let loaded = LexConfig::load_from(&path).unwrap();
        assert_eq!(loaded.gateway.port, 7070);
    }

    #[test]
    fn test_storage_path_expands_tilde() {
        let storage = StorageConfig::default();
        assert!(!storage.resolved_path().to_string_lossy().starts_with('~'));
        let mem = StorageConfig { db_path: ":memory:".into() };
        assert_eq!(mem.resolved_path(), PathBuf::from(":memory:"));
    }

    #[test]
    fn test_home_dir() {
        assert!(LexConfig::home_dir().to_string_lossy().contains("lexadvisor"));
    }
}

use crate::services::schema::{SceneLimits, VideoFormat, VideoStyle, DEFAULT_MAX_SCENES};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CONFIG_FILE: &str = "config.yml";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub llm: LlmConfig,

    #[serde(default)]
    pub generation: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LlmConfig {
    pub provider: String, // "gemini", "ollama" or "openai"
    #[serde(default = "default_retry_count")]
    pub retry_count: usize,
    #[serde(default = "default_retry_delay")]
    pub retry_delay_seconds: u64,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    pub gemini: Option<GeminiConfig>,
    pub ollama: Option<OllamaConfig>,
    pub openai: Option<OpenAIConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    #[serde(default = "default_gemini_model")]
    pub model: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_max_scenes")]
    pub max_scenes: usize,
    #[serde(default)]
    pub default_format: VideoFormat,
    #[serde(default)]
    pub default_style: VideoStyle,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_scenes: default_max_scenes(),
            default_format: VideoFormat::default(),
            default_style: VideoStyle::default(),
        }
    }
}

impl GenerationConfig {
    pub fn scene_limits(&self) -> SceneLimits {
        SceneLimits {
            max_scenes: self.max_scenes,
        }
    }
}

fn default_retry_count() -> usize {
    3
}
fn default_retry_delay() -> u64 {
    10
}
fn default_timeout() -> u64 {
    120
}
fn default_gemini_model() -> String {
    "gemini-2.0-flash".to_string()
}
fn default_max_scenes() -> usize {
    DEFAULT_MAX_SCENES
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("{} not found. Please create one.", path.display());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Config = serde_yaml_ng::from_str(content)?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<()> {
        match self.llm.provider.as_str() {
            "gemini" | "ollama" | "openai" => {}
            other => anyhow::bail!("Unknown LLM provider: {}", other),
        }
        if self.generation.max_scenes == 0 {
            anyhow::bail!("generation.max_scenes must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() -> Result<()> {
        let config = Config::from_yaml_str(
            "llm:\n  provider: gemini\n  gemini:\n    api_key: abc\n",
        )?;
        assert_eq!(config.llm.retry_count, 3);
        assert_eq!(config.llm.retry_delay_seconds, 10);
        assert_eq!(config.llm.timeout_seconds, 120);
        assert_eq!(config.llm.gemini.as_ref().unwrap().model, "gemini-2.0-flash");
        assert_eq!(config.generation.max_scenes, DEFAULT_MAX_SCENES);
        assert_eq!(config.generation.default_format, VideoFormat::TikTok);
        assert_eq!(config.generation.default_style, VideoStyle::Listicle);
        Ok(())
    }

    #[test]
    fn test_generation_section() -> Result<()> {
        let config = Config::from_yaml_str(
            "llm:\n  provider: ollama\n  ollama:\n    base_url: http://localhost:11434\n    model: llama3\ngeneration:\n  max_scenes: 5\n  default_format: YouTube Short\n  default_style: How-To\n",
        )?;
        assert_eq!(config.generation.scene_limits().max_scenes, 5);
        assert_eq!(config.generation.default_format, VideoFormat::YouTubeShort);
        assert_eq!(config.generation.default_style, VideoStyle::HowTo);
        Ok(())
    }

    #[test]
    fn test_rejects_unknown_provider_and_zero_scenes() {
        assert!(Config::from_yaml_str("llm:\n  provider: claude\n").is_err());
        assert!(Config::from_yaml_str(
            "llm:\n  provider: gemini\ngeneration:\n  max_scenes: 0\n"
        )
        .is_err());
    }

    #[test]
    fn test_example_config_parses() -> Result<()> {
        let config = Config::from_yaml_str(include_str!("../../config.example.yml"))?;
        assert_eq!(config.llm.provider, "gemini");
        assert!(config.llm.ollama.is_none());
        assert_eq!(config.generation.max_scenes, 8);
        Ok(())
    }

    #[test]
    fn test_load_reports_parse_failure_with_path() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let path = temp_dir.path().join("config.yml");
        fs::write(&path, "llm:\n  provider: claude\n")?;

        let err = Config::load_from(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Unknown LLM provider: claude"));
        assert!(err.to_string().contains("Failed to parse"));
        Ok(())
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = Config::load_from(&temp_dir.path().join("config.yml")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_load_from_file() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let path = temp_dir.path().join("config.yml");
        fs::write(
            &path,
            "llm:\n  provider: openai\n  retry_count: 1\n  openai:\n    api_key: sk-test\n    model: gpt-4o-mini\n",
        )?;

        let loaded = Config::load_from(&path)?;
        assert_eq!(loaded.llm.provider, "openai");
        assert_eq!(loaded.llm.retry_count, 1);
        assert_eq!(loaded.llm.openai.unwrap().model, "gpt-4o-mini");
        Ok(())
    }
}

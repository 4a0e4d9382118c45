use std::env;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_f64(key: &str, default: f64) -> f64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub detection: DetectionConfig,
    pub llm: LlmConfig,
    pub ollama: OllamaConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            detection: DetectionConfig::from_env(),
            llm: LlmConfig::from_env(),
            ollama: OllamaConfig::from_env(),
        }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!(
            "  detection:  threshold={}, sample_size={}, cache_ttl={}s",
            self.detection.threshold,
            self.detection.baseline_sample_size,
            self.detection.baseline_cache_ttl_secs
        );
        tracing::info!(
            "  llm:        provider={}, timeout={}s",
            self.llm.provider,
            self.llm.timeout_secs
        );
        tracing::info!("  ollama:     url={}", self.ollama.url);
    }
}

// ── Detection ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Z-score above which a metric counts as anomalous.
    pub threshold: f64,
    /// Readings used by a baseline recompute.
    pub baseline_sample_size: usize,
    /// TTL for cached baselines.
    pub baseline_cache_ttl_secs: u64,
}

impl DetectionConfig {
    fn from_env() -> Self {
        Self {
            threshold: env_f64("ANOMALY_THRESHOLD", 3.0),
            baseline_sample_size: env_u64("BASELINE_SAMPLE_SIZE", 1000) as usize,
            baseline_cache_ttl_secs: env_u64("BASELINE_CACHE_TTL", 3600),
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            threshold: 3.0,
            baseline_sample_size: 1000,
            baseline_cache_ttl_secs: 3600,
        }
    }
}

// ── LLM (reasoning fallback) ──────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "openai" or "ollama".
    pub provider: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Deadline for one reasoning call; on expiry the resolver degrades
    /// to its default result.
    pub timeout_secs: u64,
}

impl LlmConfig {
    fn from_env() -> Self {
        Self {
            provider: env_or("LLM_PROVIDER", "openai"),
            openai_api_key: env_opt("OPENAI_API_KEY"),
            openai_model: env_or("OPENAI_MODEL", "gpt-3.5-turbo"),
            openai_base_url: env_opt("OPENAI_BASE_URL"),
            temperature: env_f64("LLM_TEMPERATURE", 0.3) as f32,
            max_tokens: env_u32("LLM_MAX_TOKENS", 1024),
            timeout_secs: env_u64("LLM_TIMEOUT_SECS", 30),
        }
    }

    pub fn is_configured(&self) -> bool {
        match self.provider.as_str() {
            "openai" => self.openai_api_key.is_some(),
            "ollama" => true,
            _ => false,
        }
    }
}

// ── Ollama (local models) ─────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub url: String,
    pub model: String,
}

impl OllamaConfig {
    fn from_env() -> Self {
        Self {
            url: env_or("OLLAMA_URL", "http://localhost:11434"),
            model: env_or("OLLAMA_MODEL", "llama3.2"),
        }
    }
}

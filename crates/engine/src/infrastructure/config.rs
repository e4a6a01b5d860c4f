//! Engine configuration read from the environment.
//!
//! Every value has a default, so an empty environment yields a runnable local
//! setup: SQLite under `./data`, the echo model and port 3000.

use taleweaver_domain::HistoryLimits;

/// Token caps for card update requests never go below this.
pub const MIN_UPDATE_MAX_TOKENS: u32 = 200;

/// Limits and token caps of the narrative loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NarrativeSettings {
    pub limits: HistoryLimits,
    pub update_max_tokens: u32,
    pub strict_update_max_tokens: u32,
    pub generation_max_tokens: u32,
}

impl Default for NarrativeSettings {
    fn default() -> Self {
        Self {
            limits: HistoryLimits::default(),
            update_max_tokens: 1200,
            strict_update_max_tokens: 800,
            generation_max_tokens: 120,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    /// Deterministic echo model, no network.
    Local,
    OpenAi,
    Ollama,
}

impl std::str::FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "echo" => Ok(Self::Local),
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(format!(
                "Unknown LLM_PROVIDER '{other}'. Valid providers: local, openai, ollama"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    /// Full OpenAI-compatible base URL, including any `/v1` suffix.
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub database_path: String,
    pub server_host: String,
    pub server_port: u16,
    pub narrative: NarrativeSettings,
    pub llm: LlmConfig,
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let parsed = |key: &str, default: i64| parse_or(key, var(key), default);
        let tokens = |key: &str, default: u32| parse_or(key, var(key), default);

        let defaults = NarrativeSettings::default();
        let narrative = NarrativeSettings {
            limits: HistoryLimits::new(
                parsed("HISTORY_MAX_PROMPT_POSTS", defaults.limits.max_posts() as i64),
                parsed("HISTORY_TAIL_UPDATE_POSTS", defaults.limits.tail_posts() as i64),
            ),
            update_max_tokens: tokens("HISTORY_UPDATE_MAX_TOKENS", defaults.update_max_tokens)
                .max(MIN_UPDATE_MAX_TOKENS),
            strict_update_max_tokens: tokens(
                "HISTORY_UPDATE_STRICT_MAX_TOKENS",
                defaults.strict_update_max_tokens,
            )
            .max(MIN_UPDATE_MAX_TOKENS),
            generation_max_tokens: tokens(
                "GENERATION_MAX_TOKENS",
                defaults.generation_max_tokens,
            ),
        };

        let provider: LlmProvider = var("LLM_PROVIDER")
            .map(|p| p.parse())
            .transpose()?
            .unwrap_or(LlmProvider::Local);
        let (base_url, model) = match provider {
            LlmProvider::Ollama => {
                let url = var("OLLAMA_URL").unwrap_or_else(|| "http://localhost:11434".into());
                (
                    format!("{}/v1", url.trim_end_matches('/')),
                    var("OLLAMA_MODEL")
                        .or_else(|| var("LLM_MODEL"))
                        .unwrap_or_else(|| "llama3.2".into()),
                )
            }
            _ => (
                var("LLM_BASE_URL").unwrap_or_else(|| "https://api.openai.com/v1".into()),
                var("LLM_MODEL").unwrap_or_else(|| "gpt-4o-mini".into()),
            ),
        };
        let llm = LlmConfig {
            provider,
            base_url,
            model,
            api_key: var("LLM_API_KEY"),
            temperature: parse_or("LLM_TEMPERATURE", var("LLM_TEMPERATURE"), 0.7),
            timeout_seconds: parse_or("LLM_TIMEOUT_SECONDS", var("LLM_TIMEOUT_SECONDS"), 30),
        };

        Ok(Self {
            database_path: var("DATABASE_PATH").unwrap_or_else(|| "./data/taleweaver.db".into()),
            server_host: var("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            server_port: parse_or("SERVER_PORT", var("SERVER_PORT").or_else(|| var("PORT")), 3000),
            narrative,
            llm,
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Unparseable config value, using default");
            default
        }),
    }
}

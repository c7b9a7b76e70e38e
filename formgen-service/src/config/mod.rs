use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::time::Duration;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_DECODE_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Deserialize)]
pub struct FormgenConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub llm: LlmConfig,
    pub gigachat: GigaChatConfig,
    pub swagger_enabled: bool,
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// Model identifier sent with every chat completion (e.g., GigaChat, GigaChat-Pro)
    pub model: String,
    /// Upper bound on a single upstream chat call
    pub request_timeout_secs: u64,
    /// Total upstream-call-plus-decode attempts for structured operations
    pub max_decode_attempts: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GigaChatConfig {
    /// Base64 `client_id:client_secret` authorization key
    pub credentials: Option<String>,
    pub scope: String,
    pub auth_url: String,
    pub api_base_url: String,
    pub verify_tls: bool,
}

impl LlmConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "GigaChat".to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_decode_attempts: DEFAULT_MAX_DECODE_ATTEMPTS,
        }
    }
}

impl Default for GigaChatConfig {
    fn default() -> Self {
        Self {
            credentials: None,
            scope: "GIGACHAT_API_PERS".to_string(),
            auth_url: "https://ngw.devices.sberbank.ru:9443/api/v2/oauth".to_string(),
            api_base_url: "https://gigachat.devices.sberbank.ru/api/v1".to_string(),
            verify_tls: false,
        }
    }
}

impl FormgenConfig {
    pub fn load() -> Result<Self, AppError> {
        let mut common_config = core_config::Config::load()?;
        if let Ok(level) = env::var("LOG_LEVEL") {
            common_config.log_level = level;
        }
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let llm_defaults = LlmConfig::default();
        let gigachat_defaults = GigaChatConfig::default();

        Ok(FormgenConfig {
            common: common_config,
            llm: LlmConfig {
                model: get_env("LLM_MODEL", Some(&llm_defaults.model), is_prod)?,
                request_timeout_secs: parse_timeout_secs(&get_env(
                    "LLM_REQUEST_TIMEOUT_SECS",
                    Some(&DEFAULT_REQUEST_TIMEOUT_SECS.to_string()),
                    is_prod,
                )?),
                max_decode_attempts: get_env(
                    "LLM_MAX_DECODE_ATTEMPTS",
                    Some(&DEFAULT_MAX_DECODE_ATTEMPTS.to_string()),
                    is_prod,
                )?
                .parse::<u32>()
                .map(|attempts| attempts.max(1))
                .unwrap_or(DEFAULT_MAX_DECODE_ATTEMPTS),
            },
            gigachat: GigaChatConfig {
                credentials: if is_prod {
                    Some(get_env("GIGACHAT_CREDENTIALS", None, is_prod)?)
                } else {
                    env::var("GIGACHAT_CREDENTIALS").ok()
                },
                scope: get_env("GIGACHAT_SCOPE", Some(&gigachat_defaults.scope), is_prod)?,
                auth_url: get_env(
                    "GIGACHAT_AUTH_URL",
                    Some(&gigachat_defaults.auth_url),
                    is_prod,
                )?,
                api_base_url: get_env(
                    "GIGACHAT_API_URL",
                    Some(&gigachat_defaults.api_base_url),
                    is_prod,
                )?,
                verify_tls: parse_bool(&get_env("GIGACHAT_VERIFY_TLS", Some("false"), is_prod)?),
            },
            swagger_enabled: env::var("SWAGGER_ENABLED")
                .map(|v| parse_bool(&v))
                .unwrap_or(!is_prod),
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|v| !v.is_empty()),
        })
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Whole seconds, at least one. Unparsable values fall back to the default.
fn parse_timeout_secs(value: &str) -> u64 {
    value
        .trim()
        .parse::<u64>()
        .map(|secs| secs.max(1))
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

/// Default cap on the request body and on the sum of accepted uploads (20 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Default Gemini REST endpoint.
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub common: core_config::Config,
    pub chat: ChatSettings,
    /// Present only when `GEMINI_API_KEY` is set.
    pub gemini: Option<GeminiSettings>,
}

#[derive(Debug, Clone)]
pub struct ChatSettings {
    /// Model used when the request leaves `model` empty.
    pub default_model: String,
    pub max_upload_bytes: usize,
    /// Created at start-up; the chat flow never writes to it.
    pub upload_dir: String,
    /// HTML page served on `GET /`.
    pub index_path: String,
}

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: Secret<String>,
    pub api_base: String,
    pub timeout_secs: u64,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            default_model: DEFAULT_MODEL.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            upload_dir: "uploads".to_string(),
            index_path: "static/index.html".to_string(),
        }
    }
}

impl ChatConfig {
    pub fn load() -> Result<Self, AppError> {
        let mut common_config = core_config::Config::load()?;
        if common_config.otlp_endpoint.is_none() {
            common_config.otlp_endpoint = env::var("OTLP_ENDPOINT").ok().filter(|v| !v.is_empty());
        }
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";
        let defaults = ChatSettings::default();

        let api_key = env::var("GEMINI_API_KEY").ok();
        let gemini = gemini_settings(api_key, is_prod)?;

        Ok(ChatConfig {
            common: common_config,
            chat: ChatSettings {
                default_model: get_env("CHAT_DEFAULT_MODEL", &defaults.default_model),
                max_upload_bytes: parse_env("CHAT_MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
                upload_dir: get_env("CHAT_UPLOAD_DIR", &defaults.upload_dir),
                index_path: get_env("CHAT_INDEX_PATH", &defaults.index_path),
            },
            gemini,
        })
    }
}

/// Gemini settings for a credential, if any. A missing or empty key disables
/// Gemini, except in production where it is a start-up error.
fn gemini_settings(
    api_key: Option<String>,
    is_prod: bool,
) -> Result<Option<GeminiSettings>, AppError> {
    match api_key.filter(|key| !key.is_empty()) {
        Some(api_key) => Ok(Some(GeminiSettings {
            api_key: Secret::new(api_key),
            api_base: get_env("GEMINI_API_BASE", DEFAULT_GEMINI_API_BASE),
            timeout_secs: parse_env("GEMINI_TIMEOUT_SECS", DEFAULT_PROVIDER_TIMEOUT_SECS)?,
        })),
        None if is_prod => Err(AppError::ConfigError(anyhow::anyhow!(
            "GEMINI_API_KEY is required in production but not set"
        ))),
        None => Ok(None),
    }
}

/// Value of `key`, or `default` when unset.
fn get_env(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val.parse().map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("{} has an invalid value '{}': {}", key, val, e))
        }),
        Err(_) => Ok(default),
    }
}

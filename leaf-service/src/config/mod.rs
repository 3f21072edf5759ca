use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone, Deserialize)]
pub struct LeafConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub gemini: GeminiSettings,
    pub storage: StorageConfig,
    pub limits: LimitsConfig,
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiSettings {
    pub api_key: String,
    pub api_base: String,
    /// Model behind the farming chat (`/ask`).
    pub chat_model: String,
    /// Multimodal model used for leaf analysis.
    pub vision_model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub upload_dir: String,
    pub report_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    pub body_limit_bytes: usize,
}

impl LeafConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let body_limit_mb: usize = get_env("BODY_LIMIT_MB", Some("16"), is_prod)?
            .parse()
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!("BODY_LIMIT_MB: {}", e)))?;

        Ok(LeafConfig {
            common: common_config,
            gemini: GeminiSettings {
                // No default even in dev: the service is useless without it.
                api_key: get_env("GEMINI_API_KEY", None, is_prod)?,
                api_base: get_env("GEMINI_API_BASE", Some(DEFAULT_GEMINI_API_BASE), is_prod)?,
                chat_model: get_env("GEMINI_CHAT_MODEL", Some("gemini-2.0-flash-001"), is_prod)?,
                vision_model: get_env("GEMINI_VISION_MODEL", Some("gemini-2.0-flash"), is_prod)?,
                timeout_secs: get_env("GEMINI_TIMEOUT_SECS", Some("120"), is_prod)?
                    .parse()
                    .map_err(|e| {
                        AppError::ConfigError(anyhow::anyhow!("GEMINI_TIMEOUT_SECS: {}", e))
                    })?,
            },
            storage: StorageConfig {
                upload_dir: get_env("UPLOAD_DIR", Some("uploads"), is_prod)?,
                report_dir: get_env("REPORT_DIR", Some("reports"), is_prod)?,
            },
            limits: LimitsConfig {
                body_limit_bytes: body_limit_mb * 1024 * 1024,
            },
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
        })
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) if !val.trim().is_empty() => Ok(val),
        _ => {
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

use crate::{
    error::{BridgeError, Result},
    logger::LogLevel,
    models::{ImageDefaults, ImageQuality, ImageSize, ImageStyle},
};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "dall-e-3";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_SLACK_API_BASE: &str = "https://slack.com";

#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        OpenAiConfig {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Clone)]
pub struct SlackConfig {
    pub bot_token: String,
    pub app_token: String,
    pub api_base: String,
}

impl SlackConfig {
    pub fn new(bot_token: impl Into<String>, app_token: impl Into<String>) -> Self {
        SlackConfig {
            bot_token: bot_token.into(),
            app_token: app_token.into(),
            api_base: DEFAULT_SLACK_API_BASE.to_string(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}

impl fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlackConfig")
            .field("bot_token", &"<redacted>")
            .field("app_token", &"<redacted>")
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Retry budget for one generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            delay: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogSettings {
    pub level: LogLevel,
    pub directory: PathBuf,
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        LogSettings {
            level: LogLevel::Info,
            directory: PathBuf::from("."),
            json: false,
        }
    }
}

/// Process-wide settings, read once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub openai: OpenAiConfig,
    pub slack: SlackConfig,
    pub retry: RetryPolicy,
    pub image_count: u32,
    pub defaults: ImageDefaults,
    pub logging: LogSettings,
}

impl BridgeConfig {
    pub fn new(openai: OpenAiConfig, slack: SlackConfig) -> Self {
        BridgeConfig {
            openai,
            slack,
            retry: RetryPolicy::default(),
            image_count: 1,
            defaults: ImageDefaults::default(),
            logging: LogSettings::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_defaults(mut self, defaults: ImageDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key/value source. Missing credentials,
    /// malformed numbers and unknown image options are reported by key name.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = get("OPENAI_API_KEY")
            .ok_or_else(|| BridgeError::ConfigError("OPENAI_API_KEY is not set".into()))?;
        let bot_token = get("SLACK_BOT_TOKEN")
            .ok_or_else(|| BridgeError::ConfigError("SLACK_BOT_TOKEN is not set".into()))?;
        let app_token = get("SLACK_APP_TOKEN")
            .ok_or_else(|| BridgeError::ConfigError("SLACK_APP_TOKEN is not set".into()))?;

        let mut openai = OpenAiConfig::new(api_key);
        if let Some(model) = get("OPENAI_DALLE_MODEL") {
            openai = openai.with_model(model);
        }
        if let Some(base_url) = get("OPENAI_BASE_URL") {
            openai = openai.with_base_url(base_url.trim_end_matches('/'));
        }

        let mut slack = SlackConfig::new(bot_token, app_token);
        if let Some(api_base) = get("SLACK_API_BASE") {
            slack = slack.with_api_base(api_base.trim_end_matches('/'));
        }

        let max_attempts: u32 = parse_or("OPENAI_RETRY_COUNT", get("OPENAI_RETRY_COUNT"), 3)?;
        if max_attempts < 1 {
            return Err(BridgeError::ConfigError(
                "OPENAI_RETRY_COUNT must be at least 1".into(),
            ));
        }
        let delay_secs: u64 = parse_or("OPENAI_RETRY_DELAY", get("OPENAI_RETRY_DELAY"), 5)?;

        let image_count: u32 = parse_or("OPENAI_IMAGE_COUNT", get("OPENAI_IMAGE_COUNT"), 1)?;
        if image_count < 1 {
            return Err(BridgeError::ConfigError(
                "OPENAI_IMAGE_COUNT must be at least 1".into(),
            ));
        }

        let defaults = ImageDefaults {
            size: parse_or::<ImageSize>(
                "DEFAULT_IMAGE_SIZE",
                get("DEFAULT_IMAGE_SIZE"),
                ImageSize::Square,
            )?,
            style: parse_or::<ImageStyle>(
                "DEFAULT_IMAGE_STYLE",
                get("DEFAULT_IMAGE_STYLE"),
                ImageStyle::Vivid,
            )?,
            quality: parse_or::<ImageQuality>(
                "DEFAULT_IMAGE_QUALITY",
                get("DEFAULT_IMAGE_QUALITY"),
                ImageQuality::Hd,
            )?,
        };

        let logging = LogSettings {
            level: parse_or("LOG_LEVEL", get("LOG_LEVEL"), LogLevel::Info)?,
            directory: get("LOG_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from(".")),
            json: get("LOG_JSON").map_or(false, |val| val == "true" || val == "1"),
        };

        Ok(BridgeConfig {
            openai,
            slack,
            retry: RetryPolicy {
                max_attempts,
                delay: Duration::from_secs(delay_secs),
            },
            image_count,
            defaults,
            logging,
        })
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value
            .parse::<T>()
            .map_err(|e| {
                BridgeError::ConfigError(format!(
                    "{} has an invalid value '{}': {}",
                    key, value, e
                ))
            }),
    }
}

use std::env;
use std::env::current_dir;
use std::fmt::Debug;
use std::fmt::Display;
use std::path::Path;
use std::time::Duration;

use config::Config;
use config::ConfigError;
use secrecy::ExposeSecret;
use secrecy::Secret;
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

use crate::domain::SenderEmail;
use crate::domain::SenderName;
use crate::domain::SenderProfile;
use crate::sendgrid_client::SendGridClient;
use crate::token_resolver::TokenResolver;
use crate::utils::error_chain_fmt;

pub const DEFAULT_API_BASE_URL: &str = "https://api.sendgrid.com/v3";
pub const DEFAULT_APP_BASE_URL: &str = "https://app.sendgrid.com";

/// Read only when no key is found in the configuration files or `APP_`
/// variables.
pub const API_KEY_FALLBACK_VAR: &str = "SENDGRID_API_KEY";

/// Global configuration, resolved once at startup and passed by value. See
/// `get_configuration`.
#[derive(Debug)]
pub struct Settings {
    pub sendgrid: SendGridSettings,
    pub sender: SenderProfile,
}

/// Everything needed to talk to SendGrid: the API itself, and the web app
/// whose links are resolved into verification tokens.
#[derive(Debug)]
pub struct SendGridSettings {
    pub api_key: Secret<String>,

    /// `https://api.sendgrid.com/v3` unless overridden (e.g. by tests)
    pub base_url: String,

    /// Origin of the verification and login links sent by email
    pub app_base_url: String,

    pub timeout_milliseconds: u64,

    /// Maximum number of hops (HTTP redirects or login indirections) followed
    /// while resolving a verification link
    pub max_redirects: usize,
}

impl SendGridSettings {
    pub fn timeout(&self) -> Duration { Duration::from_millis(self.timeout_milliseconds) }

    pub fn client(&self) -> Result<SendGridClient, reqwest::Error> {
        SendGridClient::new(
            self.base_url.clone(),
            self.api_key.clone(),
            self.timeout(),
        )
    }

    pub fn resolver(&self) -> Result<TokenResolver, reqwest::Error> {
        TokenResolver::new(
            self.app_base_url.clone(),
            self.max_redirects,
            self.timeout(),
        )
    }
}

/// Raw sender profile, as found in the `sender` section of the configuration.
/// Any field left out falls back to the example profile.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SenderSettings {
    pub nickname: String,
    pub from_email: String,
    pub from_name: String,
    pub reply_to: String,
    pub reply_to_name: String,
    pub address: String,
    pub address2: String,
    pub state: String,
    pub city: String,
    pub country: String,
    pub zip: String,
}

impl Default for SenderSettings {
    fn default() -> Self {
        Self {
            nickname: "Orders".to_string(),
            from_email: "orders@example.com".to_string(),
            from_name: "Example Orders".to_string(),
            reply_to: "orders@example.com".to_string(),
            reply_to_name: "Example Orders".to_string(),
            address: "1234 Fake St".to_string(),
            address2: "PO Box 1234".to_string(),
            state: "CA".to_string(),
            city: "San Francisco".to_string(),
            country: "USA".to_string(),
            zip: "94105".to_string(),
        }
    }
}

impl TryFrom<SenderSettings> for SenderProfile {
    type Error = String;
    fn try_from(value: SenderSettings) -> Result<Self, Self::Error> {
        Ok(SenderProfile {
            nickname: SenderName::parse(value.nickname)?,
            from_email: SenderEmail::parse(value.from_email)?,
            from_name: SenderName::parse(value.from_name)?,
            reply_to: SenderEmail::parse(value.reply_to)?,
            reply_to_name: SenderName::parse(value.reply_to_name)?,
            address: value.address,
            address2: value.address2,
            state: value.state,
            city: value.city,
            country: value.country,
            zip: value.zip,
        })
    }
}

/// What the configuration sources deserialize into, before the api key is
/// checked and the sender profile parsed
#[derive(Deserialize)]
struct RawSettings {
    sendgrid: RawSendGridSettings,
    #[serde(default)]
    sender: SenderSettings,
}

#[derive(Deserialize)]
struct RawSendGridSettings {
    api_key: Option<Secret<String>>,
    base_url: String,
    app_base_url: String,
    // env vars are always parsed as String
    #[serde(deserialize_with = "deserialize_number_from_string")]
    timeout_milliseconds: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    max_redirects: usize,
}

impl TryFrom<RawSettings> for Settings {
    type Error = ConfigurationError;
    fn try_from(value: RawSettings) -> Result<Self, Self::Error> {
        let api_key = value
            .sendgrid
            .api_key
            .filter(|k| !k.expose_secret().trim().is_empty())
            .ok_or(ConfigurationError::MissingCredential)?;

        Ok(Settings {
            sendgrid: SendGridSettings {
                api_key,
                base_url: value.sendgrid.base_url,
                app_base_url: value.sendgrid.app_base_url,
                timeout_milliseconds: value.sendgrid.timeout_milliseconds,
                max_redirects: value.sendgrid.max_redirects,
            },
            sender: value
                .sender
                .try_into()
                .map_err(ConfigurationError::InvalidSender)?,
        })
    }
}

#[derive(thiserror::Error)]
pub enum ConfigurationError {
    #[error("SendGrid API Key not configured.")]
    MissingCredential,
    #[error("Invalid sender profile: {0}")]
    InvalidSender(String),
    #[error("Invalid environment: {0}")]
    InvalidEnvironment(String),
    #[error("Could not load configuration")]
    Invalid(#[from] ConfigError),
    #[error("Could not locate configuration directory")]
    Io(#[from] std::io::Error),
}

impl Debug for ConfigurationError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[derive(Debug, PartialEq)]
pub enum Environment {
    Local,
    Production,
}

impl Display for Environment {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Environment::Local => "local",
                Environment::Production => "production",
            }
        )
    }
}

impl TryFrom<String> for Environment {
    type Error = String;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            e => Err(format!("Invalid: {e}")),
        }
    }
}

/// Load configuration from `<cwd>/configuration`, `APP_` env vars and, for the
/// api key only, `SENDGRID_API_KEY`.
///
/// This is the only place where the process environment is read; everything
/// downstream receives `Settings`.
pub fn get_configuration() -> Result<Settings, ConfigurationError> {
    let cfg_dir = current_dir()?.join("configuration");

    let env: Environment = env::var("APP_ENVIRONMENT")
        .unwrap_or("local".to_string())
        .try_into()
        .map_err(ConfigurationError::InvalidEnvironment)?;

    tracing::debug!("loading config for {env} env");

    load_settings(&cfg_dir, &env, env::var(API_KEY_FALLBACK_VAR).ok())
}

/// Layered sources, lowest precedence first:
///
/// 1. built-in defaults (and `fallback_api_key`, if any)
/// 2. `base.yaml` (optional)
/// 3. `{env}.yaml` (optional)
/// 4. `APP_` env vars, e.g. `APP_SENDGRID__API_KEY=...` ->
///    `Settings.sendgrid.api_key`
///
/// Fails with `MissingCredential` if no source provides a (non-blank) api key.
pub fn load_settings(
    cfg_dir: &Path,
    env: &Environment,
    fallback_api_key: Option<String>,
) -> Result<Settings, ConfigurationError> {
    let mut builder = Config::builder()
        .set_default("sendgrid.base_url", DEFAULT_API_BASE_URL)?
        .set_default("sendgrid.app_base_url", DEFAULT_APP_BASE_URL)?
        .set_default("sendgrid.timeout_milliseconds", 30_000_i64)?
        .set_default("sendgrid.max_redirects", 10_i64)?;

    if let Some(key) = fallback_api_key {
        builder = builder.set_default("sendgrid.api_key", key)?;
    }

    let settings = builder
        .add_source(config::File::from(cfg_dir.join("base.yaml")).required(false))
        .add_source(config::File::from(cfg_dir.join(format!("{env}.yaml"))).required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<RawSettings>()?.try_into()
}

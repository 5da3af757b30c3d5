//! Client configuration loading and management.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::CoreError;
use crate::params::MissingFields;

/// Longest nonce the provider accepts.
pub const MAX_NONCE_LENGTH: usize = 32;

/// Full configuration of a merchant client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayConfig {
    /// Length of generated nonces, at most 32.
    #[serde(default = "default_nonce_length")]
    pub nonce_length: usize,

    /// Merchant identity and signing key.
    #[serde(default)]
    pub merchant: MerchantConfig,

    /// API endpoints and sandbox switch.
    #[serde(default)]
    pub endpoint: EndpointConfig,

    /// HTTP transport settings.
    #[serde(default)]
    pub transport: TransportConfig,

    /// Call timing reports sent back to the provider.
    #[serde(default)]
    pub report: ReportConfig,

    /// In-page (JSAPI) payment settings.
    #[serde(default)]
    pub jsapi: JsapiConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Clone, Serialize, Deserialize, Default)]
pub struct MerchantConfig {
    /// Application id (`appid`).
    #[serde(default)]
    pub app_id: String,
    /// Merchant id (`mch_id`).
    #[serde(default)]
    pub mch_id: String,
    /// Shared signing key. Never transmitted.
    #[serde(default)]
    pub api_key: String,
    /// Default callback URL for unified orders.
    #[serde(default)]
    pub notify_url: String,
}

impl fmt::Debug for MerchantConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MerchantConfig")
            .field("app_id", &self.app_id)
            .field("mch_id", &self.mch_id)
            .field("api_key", &"<redacted>")
            .field("notify_url", &self.notify_url)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Merchant API base URL.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Talk to the sandbox namespace with a sandbox signing key.
    #[serde(default)]
    pub sandbox: bool,
    /// Base URL of the token/ticket API used for JSAPI tickets.
    #[serde(default = "default_token_base")]
    pub token_base: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Proxy host; `0.0.0.0` disables the proxy.
    #[serde(default = "default_proxy_host")]
    pub proxy_host: String,
    /// Proxy port; `0` disables the proxy.
    #[serde(default)]
    pub proxy_port: u16,
    /// PEM client certificate for refund and reverse calls.
    #[serde(default)]
    pub ssl_cert_path: Option<PathBuf>,
    /// PEM private key matching `ssl_cert_path`.
    #[serde(default)]
    pub ssl_key_path: Option<PathBuf>,
}

/// Which calls get a timing report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportLevel {
    Off,
    Failures,
    All,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_report_level")]
    pub level: ReportLevel,
    /// Address reported as `user_ip`.
    #[serde(default = "default_client_ip")]
    pub client_ip: String,
}

#[derive(Clone, Serialize, Deserialize, Default)]
pub struct JsapiConfig {
    /// Secret used to obtain the access token behind JSAPI tickets.
    #[serde(default)]
    pub ticket_secret: Option<String>,
}

impl fmt::Debug for JsapiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsapiConfig")
            .field("ticket_secret", &self.ticket_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_api_base() -> String {
    "https://api.mch.weixin.qq.com".into()
}
fn default_token_base() -> String {
    "https://qyapi.weixin.qq.com".into()
}
fn default_proxy_host() -> String {
    "0.0.0.0".into()
}
fn default_report_level() -> ReportLevel {
    ReportLevel::Failures
}
fn default_client_ip() -> String {
    "127.0.0.1".into()
}
fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "text".into()
}
fn default_nonce_length() -> usize {
    MAX_NONCE_LENGTH
}

impl Default for PayConfig {
    fn default() -> Self {
        Self {
            nonce_length: default_nonce_length(),
            merchant: MerchantConfig::default(),
            endpoint: EndpointConfig::default(),
            transport: TransportConfig::default(),
            report: ReportConfig::default(),
            jsapi: JsapiConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            sandbox: false,
            token_base: default_token_base(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            proxy_host: default_proxy_host(),
            proxy_port: 0,
            ssl_cert_path: None,
            ssl_key_path: None,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            level: default_report_level(),
            client_ip: default_client_ip(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl TransportConfig {
    /// Proxy URL, if one is configured.
    pub fn proxy_url(&self) -> Option<String> {
        if self.proxy_host == "0.0.0.0" || self.proxy_host.is_empty() || self.proxy_port == 0 {
            return None;
        }
        Some(format!("http://{}:{}", self.proxy_host, self.proxy_port))
    }

    /// Certificate and key paths, when both are set.
    pub fn client_cert(&self) -> Option<(&Path, &Path)> {
        match (&self.ssl_cert_path, &self.ssl_key_path) {
            (Some(cert), Some(key)) => Some((cert.as_path(), key.as_path())),
            _ => None,
        }
    }
}

impl PayConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str(&contents).map_err(|e| CoreError::Config(e.to_string()))
        } else {
            Ok(Self::default())
        }
    }

    /// Save the current config to a TOML file.
    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| CoreError::Config(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Check that the merchant identity is usable for signed calls.
    pub fn validate(&self) -> Result<(), CoreError> {
        let missing: Vec<String> = [
            ("merchant.app_id", &self.merchant.app_id),
            ("merchant.mch_id", &self.merchant.mch_id),
            ("merchant.api_key", &self.merchant.api_key),
        ]
        .iter()
        .filter(|(_, v)| v.is_empty())
        .map(|(k, _)| k.to_string())
        .collect();
        if !missing.is_empty() {
            return Err(MissingFields(missing).into());
        }
        if self.nonce_length == 0 || self.nonce_length > MAX_NONCE_LENGTH {
            return Err(CoreError::Config(format!(
                "nonce_length must be between 1 and {}, got {}",
                MAX_NONCE_LENGTH, self.nonce_length
            )));
        }
        Ok(())
    }
}

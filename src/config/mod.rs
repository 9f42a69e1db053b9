//! Configuration management for the WhatsApp client.
//!
//! Supports configuration via:
//! - Explicit values
//! - Environment variables
//! - Builder pattern
//!
//! Credentials (phone id and token) are not configuration; they are supplied
//! to [`crate::client::WhatsappClient::start`].

use crate::errors::{ConfigurationError, WhatsappResult};
use crate::routes::api_base;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use url::Url;

/// Outbound proxy settings, applied to the session at construction time.
#[derive(Clone)]
pub struct ProxyConfig {
    /// Proxy address, e.g. `http://proxy.internal:3128`.
    pub url: String,
    /// Basic-auth username, if the proxy requires authentication.
    pub username: Option<String>,
    /// Basic-auth password.
    pub(crate) password: Option<SecretString>,
}

impl ProxyConfig {
    /// Creates an unauthenticated proxy configuration.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: None,
            password: None,
        }
    }

    /// Adds basic-auth credentials.
    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(SecretString::new(password.into()));
        self
    }

    pub(crate) fn password(&self) -> Option<&str> {
        self.password.as_ref().map(|secret| secret.expose_secret().as_str())
    }
}

impl std::fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.is_some())
            .finish()
    }
}

/// Configuration for the WhatsApp client
#[derive(Debug, Clone)]
pub struct WhatsappConfig {
    /// Base URL for API requests; defaults to the fixed Graph API base.
    pub base_url: Url,
    /// Request timeout applied to the session.
    pub timeout: Duration,
    /// Outbound proxy, if any.
    pub proxy: Option<ProxyConfig>,
}

impl Default for WhatsappConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(&api_base()).unwrap(),
            timeout: Duration::from_secs(crate::DEFAULT_TIMEOUT_SECS),
            proxy: None,
        }
    }
}

impl WhatsappConfig {
    /// Creates a new configuration builder
    pub fn builder() -> WhatsappConfigBuilder {
        WhatsappConfigBuilder::new()
    }

    /// Creates configuration from environment variables
    ///
    /// Reads:
    /// - `WHATSAPP_BASE_URL` - API base override
    /// - `WHATSAPP_TIMEOUT` - request timeout in seconds
    /// - `WHATSAPP_PROXY_URL` - outbound proxy address
    /// - `WHATSAPP_PROXY_USERNAME` / `WHATSAPP_PROXY_PASSWORD` - proxy auth
    pub fn from_env() -> WhatsappResult<Self> {
        let mut builder = WhatsappConfigBuilder::new();

        if let Ok(url) = std::env::var("WHATSAPP_BASE_URL") {
            builder = builder.base_url(&url)?;
        }

        if let Ok(timeout) = std::env::var("WHATSAPP_TIMEOUT") {
            if let Ok(secs) = timeout.parse::<u64>() {
                builder = builder.timeout(Duration::from_secs(secs));
            }
        }

        if let Ok(proxy_url) = std::env::var("WHATSAPP_PROXY_URL") {
            let mut proxy = ProxyConfig::new(proxy_url);
            if let (Ok(username), Ok(password)) = (
                std::env::var("WHATSAPP_PROXY_USERNAME"),
                std::env::var("WHATSAPP_PROXY_PASSWORD"),
            ) {
                proxy = proxy.with_basic_auth(username, password);
            }
            builder = builder.proxy(proxy);
        }

        Ok(builder.build()?)
    }
}

/// Builder for WhatsappConfig
#[derive(Debug, Default)]
pub struct WhatsappConfigBuilder {
    config: WhatsappConfig,
}

impl WhatsappConfigBuilder {
    /// Creates a new builder
    pub fn new() -> Self {
        Self {
            config: WhatsappConfig::default(),
        }
    }

    /// Overrides the API base URL
    pub fn base_url(mut self, url: &str) -> Result<Self, ConfigurationError> {
        self.config.base_url =
            Url::parse(url).map_err(|e| ConfigurationError::InvalidBaseUrl(e.to_string()))?;
        Ok(self)
    }

    /// Sets the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Sets the outbound proxy
    pub fn proxy(mut self, proxy: ProxyConfig) -> Self {
        self.config.proxy = Some(proxy);
        self
    }

    /// Builds the configuration
    pub fn build(self) -> Result<WhatsappConfig, ConfigurationError> {
        if let Some(proxy) = &self.config.proxy {
            Url::parse(&proxy.url)
                .map_err(|e| ConfigurationError::InvalidProxy(e.to_string()))?;
        }
        Ok(self.config)
    }
}

use crate::error::{DispatchError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthType {
    #[default]
    None,
    Bearer,
    ApiKey,
}

impl std::str::FromStr for AuthType {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Ok(AuthType::None),
            "bearer" => Ok(AuthType::Bearer),
            "api-key" | "apikey" | "api_key" => Ok(AuthType::ApiKey),
            other => Err(DispatchError::Config(format!("unknown auth type '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransportConfig {
    pub base_url: String,
    pub auth_type: AuthType,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl TransportConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            auth_type: AuthType::None,
            token: None,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    /// Read from environment variables. `Ok(None)` when no base URL is set,
    /// in which case the router runs without a transport.
    ///
    /// Required: DISPATCH_ACTION_BASE_URL
    /// Optional: DISPATCH_ACTION_AUTH (none | bearer | api-key)
    /// Optional: DISPATCH_ACTION_TOKEN
    /// Optional: DISPATCH_ACTION_TIMEOUT_MS
    pub fn from_env() -> Result<Option<Self>> {
        let base_url = match std::env::var("DISPATCH_ACTION_BASE_URL") {
            Ok(url) if !url.trim().is_empty() => url,
            _ => return Ok(None),
        };
        let mut config = Self::new(base_url.trim());
        if let Ok(auth) = std::env::var("DISPATCH_ACTION_AUTH") {
            config.auth_type = auth.parse()?;
        }
        config.token = std::env::var("DISPATCH_ACTION_TOKEN").ok();
        if let Ok(raw) = std::env::var("DISPATCH_ACTION_TIMEOUT_MS") {
            let ms: u64 = raw.trim().parse().map_err(|_| {
                DispatchError::Config(format!("DISPATCH_ACTION_TIMEOUT_MS must be an integer, got '{}'", raw))
            })?;
            config.timeout = Duration::from_millis(ms);
        }
        Ok(Some(config))
    }

    /// Merge: fields left as `None` keep their current value.
    pub fn apply(&mut self, update: TransportConfigUpdate) {
        if let Some(base_url) = update.base_url {
            self.base_url = base_url;
        }
        if let Some(auth_type) = update.auth_type {
            self.auth_type = auth_type;
        }
        if let Some(token) = update.token {
            self.token = token;
        }
        if let Some(timeout) = update.timeout {
            self.timeout = timeout;
        }
    }
}

/// Partial update for `ActionTransport::update_config`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransportConfigUpdate {
    pub base_url: Option<String>,
    pub auth_type: Option<AuthType>,
    /// `Some(None)` clears the token.
    pub token: Option<Option<String>>,
    pub timeout: Option<Duration>,
}

impl TransportConfigUpdate {
    pub fn timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..Self::default()
        }
    }

    pub fn auth(auth_type: AuthType, token: Option<&str>) -> Self {
        Self {
            auth_type: Some(auth_type),
            token: Some(token.map(str::to_string)),
            ..Self::default()
        }
    }
}

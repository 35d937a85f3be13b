//! Page-level configuration and the immutable session context built from it.

use ic_protocol::SessionId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fees::{DEFAULT_CAPACITY_FEE_RATE, DEFAULT_EXPECTED_BYTES};

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("config is not valid JSON: {0}")]
    Parse(String),
    #[error("price_per_sat must be a finite, non-negative number (got {0})")]
    InvalidPrice(f64),
    #[error("expected_bytes must be greater than zero")]
    ZeroExpectedBytes,
    #[error("default_capacity_fee_rate must be within (0, 1] (got {0})")]
    InvalidDefaultRate(f64),
    #[error("session_id cannot be blank")]
    BlankSessionId,
}

/// Settings rendered into the page by the hosting site. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WizardConfig {
    /// Socket endpoint; derived from the page location when absent.
    pub socket_url: Option<String>,
    /// Session identifier issued by the site; a fresh one is generated when absent.
    pub session_id: Option<String>,
    /// Display currency per satoshi.
    pub price_per_sat: f64,
    /// Expected size of the channel funding transaction.
    pub expected_bytes: u64,
    pub default_capacity_fee_rate: f64,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            socket_url: None,
            session_id: None,
            price_per_sat: 0.0,
            expected_bytes: DEFAULT_EXPECTED_BYTES,
            default_capacity_fee_rate: DEFAULT_CAPACITY_FEE_RATE,
        }
    }
}

impl WizardConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_json::from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.price_per_sat.is_finite() || self.price_per_sat < 0.0 {
            return Err(ConfigError::InvalidPrice(self.price_per_sat));
        }
        if self.expected_bytes == 0 {
            return Err(ConfigError::ZeroExpectedBytes);
        }
        let rate = self.default_capacity_fee_rate;
        if !rate.is_finite() || rate <= 0.0 || rate > 1.0 {
            return Err(ConfigError::InvalidDefaultRate(rate));
        }
        if matches!(&self.session_id, Some(id) if id.trim().is_empty()) {
            return Err(ConfigError::BlankSessionId);
        }
        Ok(())
    }
}

/// Fixed for the lifetime of the page and handed to the controller at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionContext {
    session_id: SessionId,
    price_per_sat: f64,
    expected_bytes: u64,
    default_capacity_fee_rate: f64,
}

impl SessionContext {
    pub fn from_config(config: &WizardConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let session_id = config
            .session_id
            .as_deref()
            .map(|id| SessionId(id.trim().to_owned()))
            .unwrap_or_else(SessionId::new_v4);

        Ok(Self {
            session_id,
            price_per_sat: config.price_per_sat,
            expected_bytes: config.expected_bytes,
            default_capacity_fee_rate: config.default_capacity_fee_rate,
        })
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn price_per_sat(&self) -> f64 {
        self.price_per_sat
    }

    pub fn expected_bytes(&self) -> u64 {
        self.expected_bytes
    }

    pub fn default_capacity_fee_rate(&self) -> f64 {
        self.default_capacity_fee_rate
    }
}

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_ADDR: &str = "127.0.0.1:8765";
pub const DEFAULT_STEP_DELAY_MS: u64 = 3000;

/// Startup settings for the scripted backend.
///
/// Reads `MOCK_WIZARD_ADDR`, `MOCK_WIZARD_STATIC_DIR`,
/// `MOCK_WIZARD_STEP_DELAY_MS` and `MOCK_WIZARD_FAIL_CONNECT` from the
/// environment. Unset variables fall back to defaults.
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub addr: SocketAddr,
    pub static_dir: Option<PathBuf>,
    pub step_delay: Duration,
    pub fail_connect: bool,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8765)),
            static_dir: None,
            step_delay: Duration::from_millis(DEFAULT_STEP_DELAY_MS),
            fail_connect: false,
        }
    }
}

impl MockConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let addr = var("MOCK_WIZARD_ADDR")
            .unwrap_or_else(|| DEFAULT_ADDR.to_owned())
            .trim()
            .parse::<SocketAddr>()
            .context("MOCK_WIZARD_ADDR must be host:port")?;

        let step_delay_ms = match var("MOCK_WIZARD_STEP_DELAY_MS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .context("MOCK_WIZARD_STEP_DELAY_MS must be a whole number of milliseconds")?,
            None => DEFAULT_STEP_DELAY_MS,
        };

        let fail_connect = var("MOCK_WIZARD_FAIL_CONNECT")
            .map(|raw| matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            addr,
            static_dir: var("MOCK_WIZARD_STATIC_DIR").map(PathBuf::from),
            step_delay: Duration::from_millis(step_delay_ms),
            fail_connect,
        })
    }
}

use std::sync::Arc;
use std::time::Duration;

use drizzle_web3_core::{FallbackConfig, PortError, WalletHandle, Web3Options, FALLBACK_WS};

use crate::{AlloyClientFactory, Eip1193Adapter};

pub const ENV_WALLET_PROXY_URL: &str = "DRIZZLE_WALLET_PROXY_URL";
pub const ENV_DETERMINISTIC_WALLET: &str = "DRIZZLE_DETERMINISTIC_WALLET";
pub const ENV_FALLBACK_TYPE: &str = "DRIZZLE_FALLBACK_TYPE";
pub const ENV_FALLBACK_URL: &str = "DRIZZLE_FALLBACK_URL";
pub const ENV_CUSTOM_RPC_URL: &str = "DRIZZLE_CUSTOM_RPC_URL";
pub const ENV_RETRY_PERMISSION_DIALOG: &str = "DRIZZLE_RETRY_PERMISSION_DIALOG";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "DRIZZLE_REQUEST_TIMEOUT_MS";
pub const ENV_ACCOUNTS_POLL_MS: &str = "DRIZZLE_ACCOUNTS_POLL_MS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterConfig {
    pub wallet_proxy_url: Option<String>,
    pub deterministic_wallet: bool,
    pub fallback: Option<FallbackConfig>,
    pub custom_rpc_url: Option<String>,
    pub retry_permission_dialog: bool,
    pub request_timeout_ms: u64,
    pub accounts_poll_ms: u64,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            wallet_proxy_url: None,
            deterministic_wallet: false,
            fallback: None,
            custom_rpc_url: None,
            retry_permission_dialog: false,
            request_timeout_ms: 15_000,
            accounts_poll_ms: 1_000,
        }
    }
}

impl AdapterConfig {
    pub fn from_env() -> Result<Self, PortError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Blank values count as
    /// unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, PortError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };
        let mut config = Self::default();

        config.wallet_proxy_url = get(ENV_WALLET_PROXY_URL);
        if let Some(raw) = get(ENV_DETERMINISTIC_WALLET) {
            config.deterministic_wallet = parse_bool(ENV_DETERMINISTIC_WALLET, &raw)?;
        }
        if let Some(url) = get(ENV_FALLBACK_URL) {
            config.fallback = Some(FallbackConfig {
                kind: get(ENV_FALLBACK_TYPE).unwrap_or_else(|| FALLBACK_WS.to_owned()),
                url,
            });
        }
        config.custom_rpc_url = get(ENV_CUSTOM_RPC_URL);
        if let Some(raw) = get(ENV_RETRY_PERMISSION_DIALOG) {
            config.retry_permission_dialog = parse_bool(ENV_RETRY_PERMISSION_DIALOG, &raw)?;
        }
        if let Some(raw) = get(ENV_REQUEST_TIMEOUT_MS) {
            config.request_timeout_ms = parse_millis(ENV_REQUEST_TIMEOUT_MS, &raw)?;
        }
        if let Some(raw) = get(ENV_ACCOUNTS_POLL_MS) {
            config.accounts_poll_ms = parse_millis(ENV_ACCOUNTS_POLL_MS, &raw)?;
        }
        Ok(config)
    }

    pub fn web3_options(&self, factory: &AlloyClientFactory) -> Result<Web3Options, PortError> {
        let custom_provider = self
            .custom_rpc_url
            .as_deref()
            .map(|url| factory.http(url))
            .transpose()?;
        Ok(Web3Options {
            custom_provider,
            fallback: self.fallback.clone(),
            retry_permission_dialog: self.retry_permission_dialog,
        })
    }

    /// The wallet to hand the runtime, if any. A proxy URL takes precedence
    /// over the deterministic wallet.
    pub fn wallet(&self) -> Result<Option<WalletHandle>, PortError> {
        if let Some(url) = &self.wallet_proxy_url {
            let adapter = Eip1193Adapter::proxy(
                url.clone(),
                Duration::from_millis(self.request_timeout_ms),
                Duration::from_millis(self.accounts_poll_ms),
            )?;
            return Ok(Some(Arc::new(adapter)));
        }
        if self.deterministic_wallet {
            return Ok(Some(Arc::new(Eip1193Adapter::deterministic())));
        }
        Ok(None)
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, PortError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(PortError::Config(format!(
            "{key}: expected a boolean, got {raw:?}"
        ))),
    }
}

fn parse_millis(key: &str, raw: &str) -> Result<u64, PortError> {
    match raw.parse::<u64>() {
        Ok(0) => Err(PortError::Config(format!("{key}: must be greater than zero"))),
        Ok(ms) => Ok(ms),
        Err(e) => Err(PortError::Config(format!("{key}: {e}"))),
    }
}

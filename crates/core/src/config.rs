//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services as
//! an `Arc<CoreConfig>`. Actions never read process-wide environment variables while they run.

use crate::constants::{
    DEFAULT_CONTRACT_ADDRESS, DEFAULT_RECEIPT_POLL_MS, DEFAULT_SUBJECT_NAME,
    ENV_CONFIRMATION_TIMEOUT_MS, ENV_CONTRACT_ADDRESS, ENV_RECEIPT_POLL_MS, ENV_RPC_URL,
    ENV_SUBJECT_NAME,
};
use crate::error::{ConfigError, ConfigResult};
use hcr_types::{Address, NonEmptyText};
use std::time::Duration;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    rpc_url: Option<String>,
    contract_address: Address,
    subject_name: NonEmptyText,
    receipt_poll_interval: Duration,
    confirmation_timeout: Option<Duration>,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// `rpc_url` of `None` means no wallet agent is reachable; connecting will then fail
    /// with [`ConnectionError::AgentUnavailable`](crate::ConnectionError::AgentUnavailable).
    pub fn new(
        rpc_url: Option<String>,
        contract_address: Address,
        subject_name: NonEmptyText,
        receipt_poll_interval: Duration,
        confirmation_timeout: Option<Duration>,
    ) -> ConfigResult<Self> {
        if receipt_poll_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: ENV_RECEIPT_POLL_MS,
                reason: "poll interval must be greater than zero".into(),
            });
        }
        if confirmation_timeout.is_some_and(|timeout| timeout.is_zero()) {
            return Err(ConfigError::InvalidValue {
                name: ENV_CONFIRMATION_TIMEOUT_MS,
                reason: "confirmation timeout must be greater than zero".into(),
            });
        }

        Ok(Self {
            rpc_url,
            contract_address,
            subject_name,
            receipt_poll_interval,
            confirmation_timeout,
        })
    }

    pub fn rpc_url(&self) -> Option<&str> {
        self.rpc_url.as_deref()
    }

    pub fn contract_address(&self) -> Address {
        self.contract_address
    }

    pub fn subject_name(&self) -> &NonEmptyText {
        &self.subject_name
    }

    pub fn receipt_poll_interval(&self) -> Duration {
        self.receipt_poll_interval
    }

    pub fn confirmation_timeout(&self) -> Option<Duration> {
        self.confirmation_timeout
    }
}

/// Read every `HCR_*` variable and build the configuration.
///
/// Intended to be called exactly once from a binary's `main`, after `.env` loading.
pub fn load_from_env() -> ConfigResult<CoreConfig> {
    let read = |name: &str| std::env::var(name).ok();

    let poll_ms = duration_ms_from_env_value(ENV_RECEIPT_POLL_MS, read(ENV_RECEIPT_POLL_MS))?
        .unwrap_or(Duration::from_millis(DEFAULT_RECEIPT_POLL_MS));

    CoreConfig::new(
        rpc_url_from_env_value(read(ENV_RPC_URL))?,
        contract_address_from_env_value(read(ENV_CONTRACT_ADDRESS))?,
        subject_name_from_env_value(read(ENV_SUBJECT_NAME))?,
        poll_ms,
        duration_ms_from_env_value(
            ENV_CONFIRMATION_TIMEOUT_MS,
            read(ENV_CONFIRMATION_TIMEOUT_MS),
        )?,
    )
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse the wallet agent endpoint. Blank means "no agent".
pub fn rpc_url_from_env_value(value: Option<String>) -> ConfigResult<Option<String>> {
    let Some(url) = non_blank(value) else {
        return Ok(None);
    };

    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::InvalidValue {
            name: ENV_RPC_URL,
            reason: format!("expected an http(s) URL, got {url:?}"),
        });
    }

    Ok(Some(url))
}

/// Parse the service address, falling back to the deployed default.
pub fn contract_address_from_env_value(value: Option<String>) -> ConfigResult<Address> {
    let raw = non_blank(value).unwrap_or_else(|| DEFAULT_CONTRACT_ADDRESS.to_string());
    raw.parse().map_err(|e: hcr_types::AddressError| ConfigError::InvalidValue {
        name: ENV_CONTRACT_ADDRESS,
        reason: e.to_string(),
    })
}

/// Parse the subject name sent with new records, falling back to the default.
pub fn subject_name_from_env_value(value: Option<String>) -> ConfigResult<NonEmptyText> {
    let raw = non_blank(value).unwrap_or_else(|| DEFAULT_SUBJECT_NAME.to_string());
    NonEmptyText::new(raw).map_err(|e| ConfigError::InvalidValue {
        name: ENV_SUBJECT_NAME,
        reason: e.to_string(),
    })
}

/// Parse a millisecond duration. Blank means unset.
pub fn duration_ms_from_env_value(
    name: &'static str,
    value: Option<String>,
) -> ConfigResult<Option<Duration>> {
    non_blank(value)
        .map(|v| {
            v.parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|e| ConfigError::InvalidValue {
                    name,
                    reason: e.to_string(),
                })
        })
        .transpose()
}

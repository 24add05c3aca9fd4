//! Terminal configuration from environment variables

use rose_chain::Address;
use rose_core::SupportedNetworks;
use std::env;
use std::time::Duration;

pub const RPC_URL_ENV: &str = "ROSE_RPC_URL";
pub const TOKEN_ADDRESS_ENV: &str = "ROSE_TOKEN_ADDRESS";
pub const PRICE_FEED_URL_ENV: &str = "ROSE_PRICE_FEED_URL";
pub const PRIMARY_CHAIN_ID_ENV: &str = "ROSE_PRIMARY_CHAIN_ID";
pub const TEST_CHAIN_ID_ENV: &str = "ROSE_TEST_CHAIN_ID";
pub const QUOTE_REFRESH_ENV: &str = "ROSE_QUOTE_REFRESH_SECS";
pub const BALANCE_REFRESH_ENV: &str = "ROSE_BALANCE_REFRESH_SECS";
pub const CONFIRMATION_TIMEOUT_ENV: &str = "ROSE_CONFIRMATION_TIMEOUT_SECS";

/// Where to reach the Rose contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainConfig {
    pub rpc_url: String,
    pub token_address: Address,
}

/// Runtime configuration for the terminal
#[derive(Debug, Clone)]
pub struct TerminalConfig {
    /// `None` when either the RPC url or the token address is missing
    pub chain: Option<ChainConfig>,
    pub price_feed_url: Option<String>,
    pub networks: SupportedNetworks,
    pub quote_refresh: Duration,
    pub balance_refresh: Duration,
    pub confirmation_timeout: Duration,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            chain: None,
            price_feed_url: None,
            networks: SupportedNetworks::default(),
            quote_refresh: Duration::from_secs(default_quote_refresh_secs()),
            balance_refresh: Duration::from_secs(default_balance_refresh_secs()),
            confirmation_timeout: Duration::from_secs(default_confirmation_timeout_secs()),
        }
    }
}

impl TerminalConfig {
    /// Load configuration from the process environment
    ///
    /// The signing key is read separately by the wallet so it never sits in
    /// this struct.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let rpc_url = var(RPC_URL_ENV);
        let token_address = var(TOKEN_ADDRESS_ENV)
            .map(|raw| {
                raw.parse::<Address>().map_err(|e| ConfigError::Invalid {
                    field: TOKEN_ADDRESS_ENV,
                    value: raw.clone(),
                    error: e.to_string(),
                })
            })
            .transpose()?;

        let chain = match (rpc_url, token_address) {
            (Some(rpc_url), Some(token_address)) => Some(ChainConfig {
                rpc_url,
                token_address,
            }),
            _ => None,
        };

        let defaults = SupportedNetworks::default();
        let networks = SupportedNetworks::new(
            parse_u64(PRIMARY_CHAIN_ID_ENV, var(PRIMARY_CHAIN_ID_ENV), defaults.primary)?,
            parse_u64(TEST_CHAIN_ID_ENV, var(TEST_CHAIN_ID_ENV), defaults.test_secondary)?,
        );

        Ok(Self {
            chain,
            price_feed_url: var(PRICE_FEED_URL_ENV),
            networks,
            quote_refresh: parse_secs(
                QUOTE_REFRESH_ENV,
                var(QUOTE_REFRESH_ENV),
                default_quote_refresh_secs(),
            )?,
            balance_refresh: parse_secs(
                BALANCE_REFRESH_ENV,
                var(BALANCE_REFRESH_ENV),
                default_balance_refresh_secs(),
            )?,
            confirmation_timeout: parse_secs(
                CONFIRMATION_TIMEOUT_ENV,
                var(CONFIRMATION_TIMEOUT_ENV),
                default_confirmation_timeout_secs(),
            )?,
        })
    }
}

fn parse_u64(field: &'static str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    match raw {
        None => Ok(default),
        Some(raw) => raw.parse::<u64>().map_err(|e| ConfigError::Invalid {
            field,
            value: raw.clone(),
            error: e.to_string(),
        }),
    }
}

fn parse_secs(
    field: &'static str,
    raw: Option<String>,
    default: u64,
) -> Result<Duration, ConfigError> {
    let secs = parse_u64(field, raw, default)?;
    if secs == 0 {
        return Err(ConfigError::Zero { field });
    }
    Ok(Duration::from_secs(secs))
}

fn default_quote_refresh_secs() -> u64 {
    5
}

fn default_balance_refresh_secs() -> u64 {
    5
}

fn default_confirmation_timeout_secs() -> u64 {
    180 // 3 minutes
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {field} ({value}): {error}")]
    Invalid {
        field: &'static str,
        value: String,
        error: String,
    },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
}

//! Deployment configuration
//!
//! All knobs are read once at startup and injected into the lifecycle
//! manager; nothing reads the environment after that.

use anyhow::Context;
use anyhow::Result;

use crate::utils::env_var_or_else;

/// Default primary mailbox
const DEFAULT_PRIMARY_EMAIL: &str = "usuario@outlook.com";

/// Default domain for generated addresses
const DEFAULT_ALIAS_DOMAIN: &str = "outlook.com";

/// Default number of alias creations per user per day
const DEFAULT_DAILY_LIMIT: &str = "5";

/// Default validity window in days, `0` disables expiry
const DEFAULT_VALIDITY_DAYS: &str = "3";

/// Default number of numbered candidates tried before the timestamp fallback
const DEFAULT_PROBE_LIMIT: &str = "100";

/// Default separator between the base token and the timestamp fallback
const DEFAULT_FALLBACK_SEPARATOR: &str = ".";

/// Deployment configuration, immutable after startup
#[derive(Clone, Debug)]
pub struct Config {
    /// The real mailbox all aliases forward to
    pub primary_email: String,

    /// Domain of generated addresses
    pub alias_domain: String,

    /// Maximum alias creations per user per calendar day
    pub daily_limit: u32,

    /// Validity window applied when a creation does not request one
    ///
    /// `0` means newly created aliases never expire
    pub default_validity_days: u32,

    /// How many numbered candidates generation tries before giving up on
    /// collision checking
    pub probe_limit: u32,

    /// Separator between the base token and the timestamp suffix of the
    /// fallback address
    pub fallback_separator: String,
}

impl Config {
    /// Read the configuration from the environment
    ///
    /// # Errors
    ///
    /// Will return `Err` when one of the numeric variables does not parse
    pub fn from_env() -> Result<Self> {
        let daily_limit = env_var_or_else("DAILY_LIMIT", || DEFAULT_DAILY_LIMIT.into())
            .parse::<u32>()
            .context("Invalid DAILY_LIMIT")?;

        let default_validity_days =
            env_var_or_else("DEFAULT_VALIDITY_DAYS", || DEFAULT_VALIDITY_DAYS.into())
                .parse::<u32>()
                .context("Invalid DEFAULT_VALIDITY_DAYS")?;

        let probe_limit = env_var_or_else("PROBE_LIMIT", || DEFAULT_PROBE_LIMIT.into())
            .parse::<u32>()
            .context("Invalid PROBE_LIMIT")?;

        Ok(Self {
            primary_email: env_var_or_else("PRIMARY_EMAIL", || DEFAULT_PRIMARY_EMAIL.into()),
            alias_domain: env_var_or_else("ALIAS_DOMAIN", || DEFAULT_ALIAS_DOMAIN.into()),
            daily_limit,
            default_validity_days,
            probe_limit,
            fallback_separator: env_var_or_else("FALLBACK_SEPARATOR", || {
                DEFAULT_FALLBACK_SEPARATOR.into()
            }),
        })
    }
}

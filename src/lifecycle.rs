//! Alias lifecycle
//!
//! The core of the system: address generation with bounded collision
//! probing, quota checked creation, the one-way use transition, mutation
//! and the bulk resets. Everything here is transport agnostic; the API
//! layer only validates field presence and maps errors to status codes.

use std::collections::HashSet;

use chrono::Duration;
use chrono::Utc;
use chrono::naive::NaiveDateTime;
use thiserror::Error;
use uuid::Uuid;

use crate::aliases::Alias;
use crate::config::Config;
use crate::storage;
use crate::storage::CreateAliasValues;
use crate::storage::Storage;
use crate::storage::UsageStats;

/// Lifecycle errors
///
/// All recoverable at the call boundary, none are fatal to the process
#[derive(Debug, Error)]
pub enum Error {
    /// A required input is missing or empty
    #[error("{0}")]
    Validation(&'static str),

    /// Creation blocked by the daily limit
    #[error("Daily limit reached: {used} of {limit}")]
    QuotaExceeded {
        /// Creations already counted for today
        used: i64,

        /// The configured limit
        limit: u32,
    },

    /// The targeted alias does not exist
    #[error("Alias not found")]
    NotFound,

    /// The use transition was already taken
    #[error("Alias already used")]
    AlreadyUsed,

    /// The store rejected a generated address as taken
    #[error("Address already taken: {0}")]
    AddressTaken(String),

    /// Everything else the store can fail with
    #[error("Storage error: {0}")]
    Storage(storage::Error),
}

/// Upper bound on a validity window in days
///
/// Generous for any real deployment and far inside the range chrono can
/// still represent as an instant
const MAX_VALIDITY_DAYS: u32 = 36_500;

impl From<storage::Error> for Error {
    fn from(err: storage::Error) -> Self {
        match err {
            storage::Error::AddressTaken(address) => Self::AddressTaken(address),
            err => Self::Storage(err),
        }
    }
}

/// Values to create an alias with
pub struct CreateAliasRequest<'a> {
    /// Project the alias is for, source of the address base token
    pub project: &'a str,

    /// Free form description
    pub description: Option<&'a str>,

    /// Intended usage location
    pub usage_location: Option<&'a str>,

    /// Requested validity window, falls back to the configured default
    pub validity_days: Option<u32>,

    /// Identity of the requesting user
    pub created_by: &'a str,
}

/// Daily quota summary for one user
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DailyUsage {
    /// Creations counted for today
    pub used: i64,

    /// The configured limit
    pub limit: u32,

    /// Creations left today
    pub remaining: i64,

    /// Rounded percentage of the limit spent
    pub percentage: u32,
}

/// The alias lifecycle manager
///
/// Holds the injected deployment configuration next to the storage; no
/// operation reads ambient global state.
#[derive(Clone)]
pub struct Manager<S> {
    /// Durable state
    storage: S,

    /// Deployment configuration, immutable per call
    config: Config,
}

impl<S: Storage> Manager<S> {
    /// Create a new manager
    pub fn new(storage: S, config: Config) -> Self {
        Self { storage, config }
    }

    /// The injected deployment configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Create an alias for a project
    ///
    /// Checks the requester's daily quota, generates a fresh address,
    /// computes the validity window and performs the insert and counter
    /// increment as one atomic storage operation.
    ///
    /// # Errors
    ///
    /// `Validation` on an empty project or an out-of-range validity
    /// window, `QuotaExceeded` at the daily limit, `AddressTaken` when
    /// the store rejects the generated address.
    pub async fn create_alias(&self, request: &CreateAliasRequest<'_>) -> Result<Alias, Error> {
        let project = request.project.trim();

        if project.is_empty() {
            return Err(Error::Validation("Project is required"));
        }

        let now = Utc::now().naive_utc();
        let today = now.date();

        let used = self
            .storage
            .daily_usage_count(request.created_by, today)
            .await?;

        if used >= i64::from(self.config.daily_limit) {
            return Err(Error::QuotaExceeded {
                used,
                limit: self.config.daily_limit,
            });
        }

        // requested days win when non-zero, zero effective days means the
        // alias never expires
        let effective_days = request
            .validity_days
            .filter(|days| *days > 0)
            .unwrap_or(self.config.default_validity_days);

        // date arithmetic past this bound would leave the representable
        // range of an instant
        if effective_days > MAX_VALIDITY_DAYS {
            return Err(Error::Validation("Validity days out of range"));
        }

        let validity_datetime = (effective_days > 0)
            .then(|| now + Duration::days(i64::from(effective_days)));

        let used_addresses = self
            .storage
            .find_used_addresses()
            .await?
            .into_iter()
            .collect::<HashSet<String>>();

        let address = generate_address(project, &self.config, &used_addresses);

        let values = CreateAliasValues {
            address: &address,
            primary_email: &self.config.primary_email,
            description: request.description.filter(|text| !text.is_empty()),
            usage_location: request.usage_location.filter(|text| !text.is_empty()),
            validity_datetime,
            validity_days: i32::try_from(effective_days).ok().filter(|days| *days > 0),
            created_by: request.created_by,
        };

        let alias = self.storage.create_alias(&values, today).await?;

        tracing::debug!("Created alias {} for {}", alias.address, alias.created_by);

        Ok(alias)
    }

    /// Take the one-way use transition of an alias
    ///
    /// Stamps `used_at`, records the usage location and appends the
    /// address to the used-address registry.
    ///
    /// # Errors
    ///
    /// `Validation` on an empty location, `NotFound` for an unknown ID,
    /// `AlreadyUsed` when the transition was already taken.
    pub async fn use_alias(&self, id: &Uuid, usage_location: &str) -> Result<Alias, Error> {
        let usage_location = usage_location.trim();

        if usage_location.is_empty() {
            return Err(Error::Validation("Usage location is required"));
        }

        let alias = self.fetch_alias(id).await?;

        if alias.used {
            return Err(Error::AlreadyUsed);
        }

        let now = Utc::now().naive_utc();
        let alias = self.storage.mark_used(&alias, usage_location, now).await?;

        tracing::debug!("Alias {} used at {usage_location}", alias.address);

        Ok(alias)
    }

    /// Replace the description of an alias
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown ID
    pub async fn update_description(&self, id: &Uuid, description: &str) -> Result<Alias, Error> {
        let alias = self.fetch_alias(id).await?;

        Ok(self.storage.update_description(&alias, description).await?)
    }

    /// Replace the color tag of an alias
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown ID
    pub async fn update_color(&self, id: &Uuid, color: &str) -> Result<Alias, Error> {
        let alias = self.fetch_alias(id).await?;

        Ok(self.storage.update_color(&alias, color).await?)
    }

    /// Delete an alias
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown ID
    pub async fn delete_alias(&self, id: &Uuid) -> Result<(), Error> {
        let alias = self.fetch_alias(id).await?;

        self.storage.delete_alias(&alias.id).await?;

        Ok(())
    }

    /// All aliases, newest creation first
    pub async fn all_aliases(&self) -> Result<Vec<Alias>, Error> {
        Ok(self.storage.find_all_aliases().await?)
    }

    /// The aliases a user created today, newest first
    pub async fn today_aliases(&self, created_by: &str) -> Result<Vec<Alias>, Error> {
        let today = Utc::now().naive_utc().date();

        Ok(self
            .storage
            .find_aliases_created_by(created_by, today)
            .await?)
    }

    /// Unused aliases whose validity window has passed
    pub async fn expired_aliases(&self) -> Result<Vec<Alias>, Error> {
        Ok(self.storage.find_expired_aliases(now()).await?)
    }

    /// The used-address registry
    pub async fn used_addresses(&self) -> Result<Vec<String>, Error> {
        Ok(self.storage.find_used_addresses().await?)
    }

    /// Aggregate numbers over all aliases
    pub async fn usage_stats(&self) -> Result<UsageStats, Error> {
        Ok(self.storage.usage_stats().await?)
    }

    /// Daily quota summary for one user
    pub async fn daily_usage(&self, created_by: &str) -> Result<DailyUsage, Error> {
        let today = Utc::now().naive_utc().date();
        let used = self.storage.daily_usage_count(created_by, today).await?;
        let limit = self.config.daily_limit;

        let percentage = if limit == 0 {
            0
        } else {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let percentage = (used as f64 / f64::from(limit) * 100.0).round() as u32;
            percentage
        };

        Ok(DailyUsage {
            used,
            limit,
            remaining: i64::from(limit) - used,
            percentage,
        })
    }

    /// Empty the used-address registry, irreversible
    pub async fn clear_used_addresses(&self) -> Result<(), Error> {
        Ok(self.storage.clear_used_addresses().await?)
    }

    /// Drop all daily counters, irreversible
    pub async fn reset_daily_usage(&self) -> Result<(), Error> {
        Ok(self.storage.reset_daily_usage().await?)
    }

    /// Fetch an alias or fail with `NotFound`
    async fn fetch_alias(&self, id: &Uuid) -> Result<Alias, Error> {
        self.storage
            .find_single_alias_by_id(id)
            .await?
            .ok_or(Error::NotFound)
    }
}

/// Current instant, to second-or-better precision
fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Generate a fresh address for a project
///
/// The project name is lowercased and stripped to `[a-z0-9]` for the base
/// token. The bare `base@domain` candidate is tried first, then numbered
/// candidates up to the configured probe limit, each checked against the
/// used-address registry. When every candidate collides the last four
/// digits of the current epoch milliseconds are appended without a further
/// registry check.
pub fn generate_address(
    project: &str,
    config: &Config,
    used_addresses: &HashSet<String>,
) -> String {
    let base = project
        .to_lowercase()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>();

    let domain = &config.alias_domain;

    let candidate = format!("{base}@{domain}");

    if !used_addresses.contains(&candidate) {
        return candidate;
    }

    for counter in 1..=config.probe_limit {
        let candidate = format!("{base}{counter}@{domain}");

        if !used_addresses.contains(&candidate) {
            return candidate;
        }
    }

    // escape valve, effectively unique and deliberately unchecked
    let millis = Utc::now().timestamp_millis().to_string();
    let suffix = &millis[millis.len().saturating_sub(4)..];
    let separator = &config.fallback_separator;

    format!("{base}{separator}{suffix}@{domain}")
}

//! All things related to the storage of aliases, daily counters and the
//! used-address registry

use async_trait::async_trait;
use chrono::naive::NaiveDate;
use chrono::naive::NaiveDateTime;
use thiserror::Error;
use uuid::Uuid;

use crate::aliases::Alias;

#[cfg(not(feature = "postgres"))]
use memory::Memory;
#[cfg(feature = "postgres")]
use postgres::Postgres;

#[cfg(not(feature = "postgres"))]
mod memory;
#[cfg(feature = "postgres")]
mod postgres;

/// Setup the storage
#[cfg(not(feature = "postgres"))]
#[allow(clippy::unused_async)]
pub async fn setup() -> Memory {
    Memory::new()
}

/// Setup the storage
#[cfg(feature = "postgres")]
pub async fn setup() -> Postgres {
    Postgres::new().await
}

/// Storage errors
#[derive(Debug, Error)]
#[allow(dead_code)]
pub enum Error {
    /// A connection error with the storage
    #[error("Connection error: {0}")]
    Connection(String),

    /// The unique constraint on alias addresses rejected an insert
    ///
    /// Generation should prevent this, the store is the final authority
    #[error("Address already taken: {0}")]
    AddressTaken(String),
}

/// Result type for all storage interactions
pub type Result<T> = core::result::Result<T, Error>;

/// Values to create an Alias
///
/// The store assigns the ID and the creation timestamp
pub struct CreateAliasValues<'a> {
    /// The generated address
    pub address: &'a str,

    /// The mailbox the alias forwards to
    pub primary_email: &'a str,

    /// Free form description
    pub description: Option<&'a str>,

    /// Intended usage location, informational at creation time
    pub usage_location: Option<&'a str>,

    /// Absolute expiry instant, absent when the alias never expires
    pub validity_datetime: Option<NaiveDateTime>,

    /// Effective validity duration the expiry was derived from
    pub validity_days: Option<i32>,

    /// Identity of the creating user
    pub created_by: &'a str,
}

/// Aggregate numbers over all aliases ever created
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UsageStats {
    /// Total number of alias records
    pub total_aliases: i64,

    /// Distinct calendar days with at least one creation
    pub days_used: i64,

    /// Distinct creating users
    pub distinct_users: i64,

    /// Number of aliases that completed the use transition
    pub used_count: i64,
}

/// Storage with all supported operations
#[async_trait]
pub trait Storage: Clone + Send + Sync + 'static {
    /// Insert an alias and bump the creator's counter for `date`
    ///
    /// The insert and the counter upsert happen in one transaction; a
    /// failure of either leaves no trace of the other.
    async fn create_alias(&self, values: &CreateAliasValues, date: NaiveDate) -> Result<Alias>;

    /// Find a single alias by its ID
    async fn find_single_alias_by_id(&self, id: &Uuid) -> Result<Option<Alias>>;

    /// Find all aliases, newest creation first
    async fn find_all_aliases(&self) -> Result<Vec<Alias>>;

    /// Find the aliases a user created on one calendar day, newest first
    async fn find_aliases_created_by(
        &self,
        created_by: &str,
        date: NaiveDate,
    ) -> Result<Vec<Alias>>;

    /// Find unused aliases whose validity instant lies strictly before `now`
    async fn find_expired_aliases(&self, now: NaiveDateTime) -> Result<Vec<Alias>>;

    /// Replace the description of an alias
    async fn update_description(&self, alias: &Alias, description: &str) -> Result<Alias>;

    /// Replace the color tag of an alias
    async fn update_color(&self, alias: &Alias, color: &str) -> Result<Alias>;

    /// Flip an alias to used and record its address in the registry
    ///
    /// A duplicate registry entry is swallowed, the registry only exists
    /// for deduplication during generation.
    async fn mark_used(
        &self,
        alias: &Alias,
        usage_location: &str,
        now: NaiveDateTime,
    ) -> Result<Alias>;

    /// Delete an alias, returns whether it existed
    async fn delete_alias(&self, id: &Uuid) -> Result<bool>;

    /// Number of aliases a user created on one calendar day, `0` without a
    /// counter row
    async fn daily_usage_count(&self, created_by: &str, date: NaiveDate) -> Result<i64>;

    /// All addresses in the used-address registry
    async fn find_used_addresses(&self) -> Result<Vec<String>>;

    /// Empty the used-address registry
    async fn clear_used_addresses(&self) -> Result<()>;

    /// Drop all daily counters, for every user and date
    async fn reset_daily_usage(&self) -> Result<()>;

    /// Aggregate numbers over all aliases
    async fn usage_stats(&self) -> Result<UsageStats>;
}

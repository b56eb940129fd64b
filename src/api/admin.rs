//! Bulk reset endpoints
//!
//! Both operations are unconditional and irreversible

use axum::Extension;

use crate::lifecycle::Manager;
use crate::storage::Storage;

use super::Error;
use super::Success;

/// Empty the used-address registry
///
/// Freed addresses become candidates for generation again.
///
/// Request:
/// ```sh
/// curl -v -XDELETE http://localhost:3000/api/used-addresses
/// ```
pub async fn clear_used_addresses<S: Storage>(
    Extension(manager): Extension<Manager<S>>,
) -> Result<Success<&'static str>, Error> {
    manager.clear_used_addresses().await?;

    tracing::info!("Used-address registry cleared");

    Ok(Success::<&'static str>::no_content())
}

/// Drop all daily counters, for every user and date
///
/// Request:
/// ```sh
/// curl -v -XDELETE http://localhost:3000/api/daily-usage
/// ```
pub async fn reset_daily_usage<S: Storage>(
    Extension(manager): Extension<Manager<S>>,
) -> Result<Success<&'static str>, Error> {
    manager.reset_daily_usage().await?;

    tracing::info!("Daily usage counters reset");

    Ok(Success::<&'static str>::no_content())
}

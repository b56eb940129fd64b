//! Alias API endpoints
//!
//! Everything related to alias management; the handlers only check field
//! presence, call into the lifecycle manager and map its errors.

use axum::Extension;
use chrono::Utc;
use chrono::naive::NaiveDate;
use chrono::naive::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::aliases::Alias;
use crate::aliases::AliasStatus;
use crate::lifecycle::CreateAliasRequest;
use crate::lifecycle::DailyUsage;
use crate::lifecycle::Manager;
use crate::storage::Storage;
use crate::storage::UsageStats;

use super::Error;
use super::Form;
use super::PathParameters;
use super::Success;

/// Alias response going to the user
///
/// Adds the derived display status next to the stored fields
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AliasResponse {
    /// Alias ID
    pub id: Uuid,

    /// The generated address
    pub address: String,

    /// The mailbox the alias forwards to
    pub primary_email: String,

    /// Free form description
    pub description: Option<String>,

    /// Where the alias was used
    pub usage_location: Option<String>,

    /// Expiry instant, absent when the alias never expires
    pub validity_datetime: Option<NaiveDateTime>,

    /// Validity duration the expiry was derived from
    pub validity_days: Option<i32>,

    /// Whether the use transition happened
    pub used: bool,

    /// Identity of the creating user
    pub created_by: String,

    /// Creation date
    pub created_at: NaiveDateTime,

    /// Date of the use transition
    pub used_at: Option<NaiveDateTime>,

    /// UI tag
    pub color: Option<String>,

    /// Derived display status: `used`, `expired` or `active`
    pub status: &'static str,

    /// Whole days until expiry, for active aliases with a validity window
    pub days_left: Option<i64>,
}

impl AliasResponse {
    /// Create a response from an [`Alias`](Alias), badged against `today`
    fn from_alias(alias: Alias, today: NaiveDate) -> Self {
        let (status, days_left) = match alias.status(today) {
            AliasStatus::Used => ("used", None),
            AliasStatus::Expired => ("expired", None),
            AliasStatus::Active { days_left } => ("active", days_left),
        };

        Self {
            id: alias.id,
            address: alias.address,
            primary_email: alias.primary_email,
            description: alias.description,
            usage_location: alias.usage_location,
            validity_datetime: alias.validity_datetime,
            validity_days: alias.validity_days,
            used: alias.used,
            created_by: alias.created_by,
            created_at: alias.created_at,
            used_at: alias.used_at,
            color: alias.color,
            status,
            days_left,
        }
    }

    /// Create a response from multiple [`Alias`](Alias)es
    fn from_alias_multiple(mut aliases: Vec<Alias>, today: NaiveDate) -> Vec<Self> {
        aliases
            .drain(..)
            .map(|alias| Self::from_alias(alias, today))
            .collect::<Vec<Self>>()
    }
}

/// Daily quota summary going to the user
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyUsageResponse {
    /// Creations counted for today
    pub used: i64,

    /// The configured limit
    pub limit: u32,

    /// Creations left today
    pub remaining: i64,

    /// Rounded percentage of the limit spent
    pub percentage: u32,
}

impl DailyUsageResponse {
    /// Create a response from a [`DailyUsage`](DailyUsage)
    fn from_daily_usage(daily_usage: DailyUsage) -> Self {
        Self {
            used: daily_usage.used,
            limit: daily_usage.limit,
            remaining: daily_usage.remaining,
            percentage: daily_usage.percentage,
        }
    }
}

/// Aggregate stats going to the user
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    /// Total number of alias records
    pub total_aliases: i64,

    /// Distinct calendar days with at least one creation
    pub days_used: i64,

    /// Distinct creating users
    pub distinct_users: i64,

    /// Number of used aliases
    pub used_count: i64,
}

impl StatsResponse {
    /// Create a response from a [`UsageStats`](UsageStats)
    fn from_usage_stats(stats: UsageStats) -> Self {
        Self {
            total_aliases: stats.total_aliases,
            days_used: stats.days_used,
            distinct_users: stats.distinct_users,
            used_count: stats.used_count,
        }
    }
}

/// Full dashboard status
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// The primary mailbox
    pub primary: String,

    /// Daily quota summary for the primary mailbox user
    pub daily_usage: DailyUsageResponse,

    /// Aliases created today, newest first
    pub today_aliases: Vec<AliasResponse>,

    /// The used-address registry
    pub used_addresses: Vec<String>,

    /// Unused aliases past their validity window
    pub expired_aliases: Vec<AliasResponse>,

    /// Aggregate numbers over all aliases
    pub stats: StatsResponse,
}

/// All aliases plus the quota summary
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    /// The primary mailbox
    pub primary: String,

    /// All aliases, newest creation first
    pub aliases: Vec<AliasResponse>,

    /// Daily quota summary for the primary mailbox user
    pub daily_usage: DailyUsageResponse,
}

/// Get the full dashboard status
///
/// Request:
/// ```sh
/// curl -v http://localhost:3000/api/status
/// ```
///
/// Response:
/// ```json
/// { "data": { "primary": "…", "dailyUsage": { … }, "todayAliases": [ … ] … } }
/// ```
pub async fn status<S: Storage>(
    Extension(manager): Extension<Manager<S>>,
) -> Result<Success<StatusResponse>, Error> {
    let primary = manager.config().primary_email.clone();
    let today = Utc::now().naive_utc().date();

    let daily_usage = manager.daily_usage(&primary).await?;
    let today_aliases = manager.today_aliases(&primary).await?;
    let used_addresses = manager.used_addresses().await?;
    let expired_aliases = manager.expired_aliases().await?;
    let stats = manager.usage_stats().await?;

    Ok(Success::ok(StatusResponse {
        primary,
        daily_usage: DailyUsageResponse::from_daily_usage(daily_usage),
        today_aliases: AliasResponse::from_alias_multiple(today_aliases, today),
        used_addresses,
        expired_aliases: AliasResponse::from_alias_multiple(expired_aliases, today),
        stats: StatsResponse::from_usage_stats(stats),
    }))
}

/// List all aliases, newest creation first
///
/// Request:
/// ```sh
/// curl -v http://localhost:3000/api/aliases
/// ```
///
/// Response:
/// ```json
/// { "data": { "primary": "…", "aliases": [ { "id": "<uuid>", … } ], "dailyUsage": { … } } }
/// ```
pub async fn list<S: Storage>(
    Extension(manager): Extension<Manager<S>>,
) -> Result<Success<ListResponse>, Error> {
    let primary = manager.config().primary_email.clone();
    let today = Utc::now().naive_utc().date();

    let aliases = manager.all_aliases().await?;
    let daily_usage = manager.daily_usage(&primary).await?;

    Ok(Success::ok(ListResponse {
        primary,
        aliases: AliasResponse::from_alias_multiple(aliases, today),
        daily_usage: DailyUsageResponse::from_daily_usage(daily_usage),
    }))
}

/// Create alias form
///
/// Fields to create an alias with
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAliasForm {
    /// Project the alias is for, required
    project: Option<String>,

    /// Free form description
    description: Option<String>,

    /// Intended usage location
    usage_location: Option<String>,

    /// Requested validity window in days
    validity_days: Option<u32>,
}

/// Create an alias based on the [`CreateAliasForm`](CreateAliasForm) form
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -d '{ "project": "My Project", "validityDays": 7 }' \
///     http://localhost:3000/api/aliases
/// ```
///
/// Response
/// ```json
/// { "data": { "id": "<uuid>", "address": "myproject@outlook.com", … } }
/// ```
pub async fn create<S: Storage>(
    Extension(manager): Extension<Manager<S>>,
    Form(form): Form<CreateAliasForm>,
) -> Result<Success<AliasResponse>, Error> {
    let today = Utc::now().naive_utc().date();

    let request = CreateAliasRequest {
        project: form.project.as_deref().unwrap_or_default(),
        description: form.description.as_deref(),
        usage_location: form.usage_location.as_deref(),
        validity_days: form.validity_days,
        created_by: &manager.config().primary_email,
    };

    let alias = manager.create_alias(&request).await?;

    Ok(Success::created(AliasResponse::from_alias(alias, today)))
}

/// Use alias form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UseAliasForm {
    /// Where the alias is being used, required
    usage_location: Option<String>,
}

/// Take the one-way use transition of an alias
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -d '{ "usageLocation": "webshop signup" }' \
///     http://localhost:3000/api/aliases/<uuid>/use
/// ```
///
/// Response
/// ```json
/// { "data": { "id": "<uuid>", "used": true, "usedAt": "…", … } }
/// ```
pub async fn mark_used<S: Storage>(
    Extension(manager): Extension<Manager<S>>,
    PathParameters(alias_id): PathParameters<Uuid>,
    Form(form): Form<UseAliasForm>,
) -> Result<Success<AliasResponse>, Error> {
    let today = Utc::now().naive_utc().date();

    let alias = manager
        .use_alias(&alias_id, form.usage_location.as_deref().unwrap_or_default())
        .await?;

    Ok(Success::ok(AliasResponse::from_alias(alias, today)))
}

/// Update alias form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAliasForm {
    /// New description
    description: String,
}

/// Update the description of an alias
///
/// Request:
/// ```sh
/// curl -v -XPUT -H 'Content-Type: application/json' \
///     -d '{ "description": "newsletter signups" }' \
///     http://localhost:3000/api/aliases/<uuid>
/// ```
pub async fn update<S: Storage>(
    Extension(manager): Extension<Manager<S>>,
    PathParameters(alias_id): PathParameters<Uuid>,
    Form(form): Form<UpdateAliasForm>,
) -> Result<Success<AliasResponse>, Error> {
    let today = Utc::now().naive_utc().date();

    let alias = manager
        .update_description(&alias_id, &form.description)
        .await?;

    Ok(Success::ok(AliasResponse::from_alias(alias, today)))
}

/// Update color form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateColorForm {
    /// New color tag
    color: String,
}

/// Update the color tag of an alias
///
/// Request:
/// ```sh
/// curl -v -XPATCH -H 'Content-Type: application/json' \
///     -d '{ "color": "#ff8800" }' \
///     http://localhost:3000/api/aliases/<uuid>/color
/// ```
pub async fn update_color<S: Storage>(
    Extension(manager): Extension<Manager<S>>,
    PathParameters(alias_id): PathParameters<Uuid>,
    Form(form): Form<UpdateColorForm>,
) -> Result<Success<AliasResponse>, Error> {
    let today = Utc::now().naive_utc().date();

    let alias = manager.update_color(&alias_id, &form.color).await?;

    Ok(Success::ok(AliasResponse::from_alias(alias, today)))
}

/// Delete an alias
///
/// Request:
/// ```sh
/// curl -v -XDELETE http://localhost:3000/api/aliases/<uuid>
/// ```
pub async fn delete<S: Storage>(
    Extension(manager): Extension<Manager<S>>,
    PathParameters(alias_id): PathParameters<Uuid>,
) -> Result<Success<&'static str>, Error> {
    manager.delete_alias(&alias_id).await?;

    Ok(Success::<&'static str>::no_content())
}

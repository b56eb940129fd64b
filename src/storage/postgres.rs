//! Postgres storage

use std::time::Duration;

use async_trait::async_trait;
use chrono::naive::NaiveDate;
use chrono::naive::NaiveDateTime;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use crate::aliases::Alias;

use super::CreateAliasValues;
use super::Error;
use super::Result;
use super::Storage;
use super::UsageStats;

/// Migrator to run migrations on startup
static MIGRATOR: Migrator = sqlx::migrate!();

/// Postgres storage
#[derive(Clone)]
pub struct Postgres {
    /// Pool of connections
    connection_pool: PgPool,
}

impl Postgres {
    /// Create Postgres storage
    ///
    /// Use the `DATABASE_URL` environment variable
    ///
    /// Migrations will be run
    pub async fn new() -> Self {
        let database_connection_string = std::env::var("DATABASE_URL").expect("Valid DATABASE_URL");

        let connection_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_connection_string)
            .await
            .expect("Valid connection");

        Self::new_with_pool(connection_pool).await
    }

    /// Create Postgres storage with existing pool
    ///
    /// Migrations will be run
    pub async fn new_with_pool(connection_pool: PgPool) -> Self {
        let migration_result = MIGRATOR.run(&connection_pool).await;

        if let Err(err) = migration_result {
            panic!("Migrations could not run: {err}");
        }

        Self { connection_pool }
    }
}

/// All columns of the aliases table, in `SELECT` order
const ALIAS_COLUMNS: &str = "id, address, primary_email, description, usage_location, \
     validity_datetime, validity_days, used, created_by, created_at, used_at, color";

#[async_trait]
impl Storage for Postgres {
    async fn create_alias(&self, values: &CreateAliasValues, date: NaiveDate) -> Result<Alias> {
        let mut transaction = self
            .connection_pool
            .begin()
            .await
            .map_err(connection_error)?;

        let alias = sqlx::query_as::<_, Alias>(&format!(
            "
            INSERT INTO aliases
                (id, address, primary_email, description, usage_location,
                 validity_datetime, validity_days, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {ALIAS_COLUMNS}
            "
        ))
        .bind(Uuid::new_v4())
        .bind(values.address)
        .bind(values.primary_email)
        .bind(values.description)
        .bind(values.usage_location)
        .bind(values.validity_datetime)
        .bind(values.validity_days)
        .bind(values.created_by)
        .fetch_one(&mut *transaction)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db_error) if db_error.is_unique_violation() => {
                Error::AddressTaken(values.address.to_string())
            }
            _ => connection_error(err),
        })?;

        sqlx::query(
            "
            INSERT INTO daily_usage (created_by, date, count)
            VALUES ($1, $2, 1)
            ON CONFLICT (created_by, date) DO UPDATE SET count = daily_usage.count + 1
            ",
        )
        .bind(values.created_by)
        .bind(date)
        .execute(&mut *transaction)
        .await
        .map_err(connection_error)?;

        transaction.commit().await.map_err(connection_error)?;

        Ok(alias)
    }

    async fn find_single_alias_by_id(&self, id: &Uuid) -> Result<Option<Alias>> {
        let alias = sqlx::query_as::<_, Alias>(&format!(
            "
            SELECT {ALIAS_COLUMNS}
            FROM aliases
            WHERE id = $1
            LIMIT 1
            "
        ))
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(alias)
    }

    async fn find_all_aliases(&self) -> Result<Vec<Alias>> {
        let aliases = sqlx::query_as::<_, Alias>(&format!(
            "
            SELECT {ALIAS_COLUMNS}
            FROM aliases
            ORDER BY created_at DESC
            "
        ))
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(aliases)
    }

    async fn find_aliases_created_by(
        &self,
        created_by: &str,
        date: NaiveDate,
    ) -> Result<Vec<Alias>> {
        let aliases = sqlx::query_as::<_, Alias>(&format!(
            "
            SELECT {ALIAS_COLUMNS}
            FROM aliases
            WHERE created_by = $1 AND created_at::date = $2
            ORDER BY created_at DESC
            "
        ))
        .bind(created_by)
        .bind(date)
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(aliases)
    }

    async fn find_expired_aliases(&self, now: NaiveDateTime) -> Result<Vec<Alias>> {
        let aliases = sqlx::query_as::<_, Alias>(&format!(
            "
            SELECT {ALIAS_COLUMNS}
            FROM aliases
            WHERE NOT used
                AND validity_datetime IS NOT NULL
                AND validity_datetime < $1
            ORDER BY created_at DESC
            "
        ))
        .bind(now)
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(aliases)
    }

    async fn update_description(&self, alias: &Alias, description: &str) -> Result<Alias> {
        let updated_alias = sqlx::query_as::<_, Alias>(&format!(
            "
            UPDATE aliases
            SET description = $1
            WHERE id = $2
            RETURNING {ALIAS_COLUMNS}
            "
        ))
        .bind(description)
        .bind(alias.id)
        .fetch_one(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(updated_alias)
    }

    async fn update_color(&self, alias: &Alias, color: &str) -> Result<Alias> {
        let updated_alias = sqlx::query_as::<_, Alias>(&format!(
            "
            UPDATE aliases
            SET color = $1
            WHERE id = $2
            RETURNING {ALIAS_COLUMNS}
            "
        ))
        .bind(color)
        .bind(alias.id)
        .fetch_one(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(updated_alias)
    }

    async fn mark_used(
        &self,
        alias: &Alias,
        usage_location: &str,
        now: NaiveDateTime,
    ) -> Result<Alias> {
        let mut transaction = self
            .connection_pool
            .begin()
            .await
            .map_err(connection_error)?;

        let updated_alias = sqlx::query_as::<_, Alias>(&format!(
            "
            UPDATE aliases
            SET used = TRUE, used_at = $1, usage_location = $2
            WHERE id = $3
            RETURNING {ALIAS_COLUMNS}
            "
        ))
        .bind(now)
        .bind(usage_location)
        .bind(alias.id)
        .fetch_one(&mut *transaction)
        .await
        .map_err(connection_error)?;

        // duplicates are swallowed, the registry is dedup only
        sqlx::query(
            "
            INSERT INTO used_addresses (address)
            VALUES ($1)
            ON CONFLICT (address) DO NOTHING
            ",
        )
        .bind(&updated_alias.address)
        .execute(&mut *transaction)
        .await
        .map_err(connection_error)?;

        transaction.commit().await.map_err(connection_error)?;

        Ok(updated_alias)
    }

    async fn delete_alias(&self, id: &Uuid) -> Result<bool> {
        let result = sqlx::query(
            "
            DELETE FROM aliases
            WHERE id = $1
            ",
        )
        .bind(id)
        .execute(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn daily_usage_count(&self, created_by: &str, date: NaiveDate) -> Result<i64> {
        let count = sqlx::query_as::<_, (i64,)>(
            "
            SELECT count
            FROM daily_usage
            WHERE created_by = $1 AND date = $2
            LIMIT 1
            ",
        )
        .bind(created_by)
        .bind(date)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(count.map_or(0, |(count,)| count))
    }

    async fn find_used_addresses(&self) -> Result<Vec<String>> {
        let addresses = sqlx::query_as::<_, (String,)>(
            "
            SELECT address
            FROM used_addresses
            ORDER BY recorded_at
            ",
        )
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(addresses.into_iter().map(|(address,)| address).collect())
    }

    async fn clear_used_addresses(&self) -> Result<()> {
        sqlx::query("DELETE FROM used_addresses")
            .execute(&self.connection_pool)
            .await
            .map_err(connection_error)?;

        Ok(())
    }

    async fn reset_daily_usage(&self) -> Result<()> {
        sqlx::query("DELETE FROM daily_usage")
            .execute(&self.connection_pool)
            .await
            .map_err(connection_error)?;

        Ok(())
    }

    async fn usage_stats(&self) -> Result<UsageStats> {
        let (total_aliases, days_used, distinct_users, used_count) =
            sqlx::query_as::<_, (i64, i64, i64, i64)>(
                "
                SELECT
                    COUNT(*),
                    COUNT(DISTINCT created_at::date),
                    COUNT(DISTINCT created_by),
                    COUNT(*) FILTER (WHERE used)
                FROM aliases
                ",
            )
            .fetch_one(&self.connection_pool)
            .await
            .map_err(connection_error)?;

        Ok(UsageStats {
            total_aliases,
            days_used,
            distinct_users,
            used_count,
        })
    }
}

/// Convert `SQLx` to storage connection error
fn connection_error<E>(err: E) -> Error
where
    E: std::error::Error,
{
    Error::Connection(err.to_string())
}

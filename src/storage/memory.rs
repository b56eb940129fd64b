//! Memory storage
//!
//! Will be destroyed on system shutdown

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use chrono::naive::NaiveDate;
use chrono::naive::NaiveDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::aliases::Alias;

use super::CreateAliasValues;
use super::Error;
use super::Result;
use super::Storage;
use super::UsageStats;

/// An in-memory storage
///
/// Will be destroyed on system shutdown
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// All aliases in storage
    aliases: Arc<Mutex<HashMap<Uuid, Alias>>>,

    /// Creation counters per user and calendar day
    daily_usage: Arc<Mutex<HashMap<(String, NaiveDate), i64>>>,

    /// Addresses that completed the use transition, insertion order
    used_addresses: Arc<Mutex<Vec<String>>>,
}

impl Memory {
    /// Create a new empty Memory storage
    pub fn new() -> Self {
        Self::default()
    }
}

/// Sort aliases newest creation first
fn newest_first(aliases: &mut [Alias]) {
    aliases.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[async_trait]
impl Storage for Memory {
    async fn create_alias(&self, values: &CreateAliasValues, date: NaiveDate) -> Result<Alias> {
        // aliases before daily_usage, the only place both locks are held
        let mut aliases = self.aliases.lock().await;

        if aliases
            .values()
            .any(|alias| alias.address == values.address)
        {
            return Err(Error::AddressTaken(values.address.to_string()));
        }

        let alias = Alias {
            id: Uuid::new_v4(),
            address: values.address.to_string(),
            primary_email: values.primary_email.to_string(),
            description: values.description.map(ToString::to_string),
            usage_location: values.usage_location.map(ToString::to_string),
            validity_datetime: values.validity_datetime,
            validity_days: values.validity_days,
            used: false,
            created_by: values.created_by.to_string(),
            created_at: Utc::now().naive_utc(),
            used_at: None,
            color: None,
        };

        aliases.insert(alias.id, alias.clone());

        *self
            .daily_usage
            .lock()
            .await
            .entry((values.created_by.to_string(), date))
            .or_insert(0) += 1;

        Ok(alias)
    }

    async fn find_single_alias_by_id(&self, id: &Uuid) -> Result<Option<Alias>> {
        Ok(self.aliases.lock().await.get(id).cloned())
    }

    async fn find_all_aliases(&self) -> Result<Vec<Alias>> {
        let mut aliases = self
            .aliases
            .lock()
            .await
            .values()
            .cloned()
            .collect::<Vec<Alias>>();

        newest_first(&mut aliases);

        Ok(aliases)
    }

    async fn find_aliases_created_by(
        &self,
        created_by: &str,
        date: NaiveDate,
    ) -> Result<Vec<Alias>> {
        let mut aliases = self
            .aliases
            .lock()
            .await
            .values()
            .filter(|alias| alias.created_by == created_by && alias.created_at.date() == date)
            .cloned()
            .collect::<Vec<Alias>>();

        newest_first(&mut aliases);

        Ok(aliases)
    }

    async fn find_expired_aliases(&self, now: NaiveDateTime) -> Result<Vec<Alias>> {
        let mut aliases = self
            .aliases
            .lock()
            .await
            .values()
            .filter(|alias| {
                !alias.used
                    && alias
                        .validity_datetime
                        .is_some_and(|validity| validity < now)
            })
            .cloned()
            .collect::<Vec<Alias>>();

        newest_first(&mut aliases);

        Ok(aliases)
    }

    async fn update_description(&self, alias: &Alias, description: &str) -> Result<Alias> {
        Ok(self
            .aliases
            .lock()
            .await
            .get_mut(&alias.id)
            .map(|alias| {
                alias.description = Some(description.to_string());

                alias.clone()
            })
            .expect("HashMap is the source of the alias"))
    }

    async fn update_color(&self, alias: &Alias, color: &str) -> Result<Alias> {
        Ok(self
            .aliases
            .lock()
            .await
            .get_mut(&alias.id)
            .map(|alias| {
                alias.color = Some(color.to_string());

                alias.clone()
            })
            .expect("HashMap is the source of the alias"))
    }

    async fn mark_used(
        &self,
        alias: &Alias,
        usage_location: &str,
        now: NaiveDateTime,
    ) -> Result<Alias> {
        let updated = self
            .aliases
            .lock()
            .await
            .get_mut(&alias.id)
            .map(|alias| {
                alias.used = true;
                alias.used_at = Some(now);
                alias.usage_location = Some(usage_location.to_string());

                alias.clone()
            })
            .expect("HashMap is the source of the alias");

        let mut used_addresses = self.used_addresses.lock().await;

        if !used_addresses.contains(&updated.address) {
            used_addresses.push(updated.address.clone());
        }

        Ok(updated)
    }

    async fn delete_alias(&self, id: &Uuid) -> Result<bool> {
        Ok(self.aliases.lock().await.remove(id).is_some())
    }

    async fn daily_usage_count(&self, created_by: &str, date: NaiveDate) -> Result<i64> {
        Ok(self
            .daily_usage
            .lock()
            .await
            .get(&(created_by.to_string(), date))
            .copied()
            .unwrap_or(0))
    }

    async fn find_used_addresses(&self) -> Result<Vec<String>> {
        Ok(self.used_addresses.lock().await.clone())
    }

    async fn clear_used_addresses(&self) -> Result<()> {
        self.used_addresses.lock().await.clear();

        Ok(())
    }

    async fn reset_daily_usage(&self) -> Result<()> {
        self.daily_usage.lock().await.clear();

        Ok(())
    }

    async fn usage_stats(&self) -> Result<UsageStats> {
        let aliases = self.aliases.lock().await;

        let days = aliases
            .values()
            .map(|alias| alias.created_at.date())
            .collect::<std::collections::HashSet<NaiveDate>>();

        let users = aliases
            .values()
            .map(|alias| alias.created_by.as_str())
            .collect::<std::collections::HashSet<&str>>();

        Ok(UsageStats {
            total_aliases: aliases.len() as i64,
            days_used: days.len() as i64,
            distinct_users: users.len() as i64,
            used_count: aliases.values().filter(|alias| alias.used).count() as i64,
        })
    }
}

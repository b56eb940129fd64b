//! Aliases

use chrono::naive::NaiveDate;
use chrono::naive::NaiveDateTime;
use uuid::Uuid;

/// Disposable alias for the primary mailbox
#[derive(Clone, Debug)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Alias {
    /// Alias ID
    pub id: Uuid,

    /// The generated address, globally unique
    pub address: String,

    /// The real mailbox this alias forwards to
    pub primary_email: String,

    /// Free form description
    pub description: Option<String>,

    /// Where the alias was used, set on the use transition
    pub usage_location: Option<String>,

    /// Instant after which an unused alias counts as expired
    ///
    /// Absent means the alias never expires
    pub validity_datetime: Option<NaiveDateTime>,

    /// Validity duration requested at creation, kept for reference
    pub validity_days: Option<i32>,

    /// Whether the alias completed the use transition
    ///
    /// Never reverts to `false`
    pub used: bool,

    /// Identity of the creating user
    pub created_by: String,

    /// Creation date
    pub created_at: NaiveDateTime,

    /// Date of the use transition
    pub used_at: Option<NaiveDateTime>,

    /// UI tag, no effect on the lifecycle
    pub color: Option<String>,
}

/// Derived display state of an alias
///
/// Not stored; `used` is the only persisted state. Expiry is recomputed
/// against "today" every time it is asked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AliasStatus {
    /// The use transition happened, overrides expiry
    Used,

    /// Unused and past its validity window
    Expired,

    /// Unused and still valid, with the remaining whole days when a
    /// validity window is set
    Active {
        /// Days until expiry, `None` when the alias never expires
        days_left: Option<i64>,
    },
}

impl Alias {
    /// Classify the alias against the given calendar day
    pub fn status(&self, today: NaiveDate) -> AliasStatus {
        if self.used {
            return AliasStatus::Used;
        }

        match self.validity_datetime {
            None => AliasStatus::Active { days_left: None },
            Some(validity) => {
                let days_left = days_left(validity, today);

                if days_left <= 0 {
                    AliasStatus::Expired
                } else {
                    AliasStatus::Active {
                        days_left: Some(days_left),
                    }
                }
            }
        }
    }
}

/// Whole days until the validity instant, measured midnight to midnight
///
/// Both instants are truncated to their calendar date first, so a validity
/// of today at 23:59 still reports zero days left.
pub fn days_left(validity: NaiveDateTime, today: NaiveDate) -> i64 {
    validity.date().signed_duration_since(today).num_days()
}

#[cfg(test)]
mod tests {
    use chrono::Days;
    use chrono::Duration;
    use chrono::Utc;

    use super::*;

    fn pending_alias(validity_datetime: Option<NaiveDateTime>) -> Alias {
        Alias {
            id: Uuid::new_v4(),
            address: String::from("project@outlook.com"),
            primary_email: String::from("inbox@outlook.com"),
            description: None,
            usage_location: None,
            validity_datetime,
            validity_days: validity_datetime.map(|_| 3),
            used: false,
            created_by: String::from("inbox@outlook.com"),
            created_at: Utc::now().naive_utc(),
            used_at: None,
            color: None,
        }
    }

    #[test]
    fn test_used_overrides_expiry() {
        let today = Utc::now().naive_utc().date();
        let expired = today.and_hms_opt(0, 0, 0).unwrap() - Duration::seconds(1);

        let mut alias = pending_alias(Some(expired));
        alias.used = true;

        assert_eq!(AliasStatus::Used, alias.status(today));
    }

    #[test]
    fn test_validity_just_before_midnight_is_expired() {
        let today = Utc::now().naive_utc().date();

        // one second before today's midnight, lands on yesterday
        let validity = today.and_hms_opt(0, 0, 0).unwrap() - Duration::seconds(1);

        assert_eq!(
            AliasStatus::Expired,
            pending_alias(Some(validity)).status(today)
        );
    }

    #[test]
    fn test_validity_tomorrow_is_one_day_left() {
        let today = Utc::now().naive_utc().date();
        let validity = today
            .checked_add_days(Days::new(1))
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();

        assert_eq!(
            AliasStatus::Active { days_left: Some(1) },
            pending_alias(Some(validity)).status(today)
        );
    }

    #[test]
    fn test_no_validity_never_expires() {
        let today = Utc::now().naive_utc().date();

        assert_eq!(
            AliasStatus::Active { days_left: None },
            pending_alias(None).status(today)
        );
    }
}

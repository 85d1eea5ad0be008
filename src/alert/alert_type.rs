//! Alert types and the time windows used to deduplicate them.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use time_tz::{OffsetDateTimeExt, Tz};

use crate::{Error, config::AlertConfig, timezone::start_of_day};

/// The kinds of alert that can be sent to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    /// Spending in a category has reached the budget's alert threshold.
    BudgetWarning,
    /// Spending in a category has gone over the budget's limit.
    BudgetExceeded,
    /// A subscription will be charged soon.
    SubscriptionRenewal,
    /// The wallet balance is low compared to the wallet's monthly budget.
    LowBalance,
    /// A savings goal reached its target.
    GoalAchieved,
}

impl AlertType {
    /// Every alert type.
    pub const ALL: [AlertType; 5] = [
        AlertType::BudgetWarning,
        AlertType::BudgetExceeded,
        AlertType::SubscriptionRenewal,
        AlertType::LowBalance,
        AlertType::GoalAchieved,
    ];

    /// The name used for the type in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            AlertType::BudgetWarning => "BUDGET_WARNING",
            AlertType::BudgetExceeded => "BUDGET_EXCEEDED",
            AlertType::SubscriptionRenewal => "SUBSCRIPTION_RENEWAL",
            AlertType::LowBalance => "LOW_BALANCE",
            AlertType::GoalAchieved => "GOAL_ACHIEVED",
        }
    }

    /// How repeat alerts of this type for the same subject are suppressed.
    pub fn dedup_policy(self, config: &AlertConfig) -> DedupPolicy {
        match self {
            AlertType::BudgetWarning | AlertType::BudgetExceeded => DedupPolicy::CalendarMonth,
            AlertType::SubscriptionRenewal => DedupPolicy::CalendarDay,
            AlertType::LowBalance => DedupPolicy::Trailing(config.low_balance_window),
            AlertType::GoalAchieved => DedupPolicy::CompletionFlag,
        }
    }
}

impl Display for AlertType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AlertType::ALL
            .into_iter()
            .find(|alert_type| alert_type.as_str() == s)
            .ok_or_else(|| Error::InvalidAlertType(s.to_owned()))
    }
}

/// The window within which an alert type may fire at most once per subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupPolicy {
    /// Once per calendar month in the local timezone.
    CalendarMonth,
    /// Once per calendar day in the local timezone.
    CalendarDay,
    /// Once per the given duration, counting back from now.
    Trailing(Duration),
    /// Not deduplicated by notification history. The alert is only proposed by
    /// the caller that flipped the subject's completion flag.
    CompletionFlag,
}

/// The concrete window an alert is checked against at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupWindow {
    /// The start of the window. Notifications created at or after this instant count.
    pub since: OffsetDateTime,
    /// The label of the calendar window, e.g. "2026-10" or "2026-10-16".
    ///
    /// Trailing windows move with every evaluation and have no label.
    pub bucket: Option<String>,
}

impl DedupPolicy {
    /// The window that contains `now`, `None` for [DedupPolicy::CompletionFlag].
    ///
    /// Calendar windows follow the calendar of `tz` and start at the instant
    /// the local day begins there, whatever the offset of `now`.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidPeriod] if the start of the window cannot be represented.
    pub fn window(self, now: OffsetDateTime, tz: &Tz) -> Result<Option<DedupWindow>, Error> {
        let today = now.to_timezone(tz).date();

        let window = match self {
            DedupPolicy::CalendarMonth => {
                let first_of_month = today
                    .replace_day(1)
                    .map_err(|error| Error::InvalidPeriod(error.to_string()))?;

                DedupWindow {
                    since: start_of_day(first_of_month, tz)?,
                    bucket: Some(format!(
                        "{:04}-{:02}",
                        today.year(),
                        u8::from(today.month())
                    )),
                }
            }
            DedupPolicy::CalendarDay => DedupWindow {
                since: start_of_day(today, tz)?,
                bucket: Some(today.to_string()),
            },
            DedupPolicy::Trailing(duration) => DedupWindow {
                since: now
                    .checked_sub(duration)
                    .ok_or_else(|| Error::InvalidPeriod(format!("{now} - {duration}")))?,
                bucket: None,
            },
            DedupPolicy::CompletionFlag => return Ok(None),
        };

        Ok(Some(window))
    }
}

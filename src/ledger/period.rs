//! The calendar month that budgets are set for.

use std::{fmt::Display, ops::RangeInclusive};

use serde::{Deserialize, Serialize};
use time::{Date, Month};

use crate::Error;

/// A calendar month in a specific year, e.g. October 2026.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BudgetPeriod {
    pub month: Month,
    pub year: i32,
}

impl BudgetPeriod {
    pub fn new(month: Month, year: i32) -> Self {
        Self { month, year }
    }

    /// The period that `date` falls in.
    pub fn containing(date: Date) -> Self {
        Self {
            month: date.month(),
            year: date.year(),
        }
    }

    /// The first and last day of the period, inclusive.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidPeriod] if the year is outside of the range of
    /// dates supported by [time].
    pub fn date_range(&self) -> Result<RangeInclusive<Date>, Error> {
        let last_day = self.month.length(self.year);

        let start = Date::from_calendar_date(self.year, self.month, 1)
            .map_err(|error| Error::InvalidPeriod(format!("{self}: {error}")))?;
        let end = Date::from_calendar_date(self.year, self.month, last_day)
            .map_err(|error| Error::InvalidPeriod(format!("{self}: {error}")))?;

        Ok(start..=end)
    }
}

impl Display for BudgetPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.month, self.year)
    }
}

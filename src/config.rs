//! Tunables for the alert pipeline.

use std::time::Duration as StdDuration;

use time::Duration;

/// The config that controls when alerts fire and how the pipeline is run.
#[derive(Debug, Clone)]
pub struct AlertConfig {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// Calendar month and calendar day windows are measured in this timezone.
    pub local_timezone: String,
    /// How many days ahead of a billing date a renewal reminder is sent.
    pub renewal_lookahead_days: i64,
    /// The fraction of the wallet's monthly budget below which the balance is considered low.
    pub low_balance_ratio: f64,
    /// How long to wait before repeating a low balance alert.
    pub low_balance_window: Duration,
    /// How long a single evaluator may run before its candidates are discarded.
    pub evaluator_time_budget: StdDuration,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            local_timezone: "Etc/UTC".to_owned(),
            renewal_lookahead_days: 3,
            low_balance_ratio: 0.1,
            low_balance_window: Duration::hours(24),
            evaluator_time_budget: StdDuration::from_millis(250),
        }
    }
}

impl AlertConfig {
    /// The default config with calendar windows measured in `local_timezone`.
    pub fn with_timezone(local_timezone: &str) -> Self {
        Self {
            local_timezone: local_timezone.to_owned(),
            ..Default::default()
        }
    }
}

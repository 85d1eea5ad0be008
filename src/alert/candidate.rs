//! Alerts proposed by the evaluators and the text shown for them.

use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    alert::AlertType,
    currency::{format_currency, format_percentage},
    database_id::DatabaseID,
};

/// The spending figures for a budget at the time an alert was raised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetAmounts {
    pub category: String,
    pub spent: f64,
    pub monthly_limit: f64,
    pub percentage_used: f64,
}

/// The amounts needed to describe an alert to the user.
///
/// Each variant corresponds to exactly one [AlertType].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlertPayload {
    BudgetWarning(BudgetAmounts),
    BudgetExceeded(BudgetAmounts),
    SubscriptionRenewal {
        name: String,
        price: f64,
        next_billing_date: Date,
        days_until_renewal: i64,
    },
    LowBalance {
        balance: f64,
        monthly_budget: f64,
        /// The balance below which the alert fires.
        threshold: f64,
    },
    GoalAchieved {
        name: String,
        current_amount: f64,
        target_amount: f64,
    },
}

impl AlertPayload {
    pub fn alert_type(&self) -> AlertType {
        match self {
            AlertPayload::BudgetWarning(_) => AlertType::BudgetWarning,
            AlertPayload::BudgetExceeded(_) => AlertType::BudgetExceeded,
            AlertPayload::SubscriptionRenewal { .. } => AlertType::SubscriptionRenewal,
            AlertPayload::LowBalance { .. } => AlertType::LowBalance,
            AlertPayload::GoalAchieved { .. } => AlertType::GoalAchieved,
        }
    }

    /// A short heading for the notification.
    pub fn title(&self) -> String {
        match self {
            AlertPayload::BudgetWarning(amounts) => format!("Budget warning: {}", amounts.category),
            AlertPayload::BudgetExceeded(amounts) => {
                format!("Budget exceeded: {}", amounts.category)
            }
            AlertPayload::SubscriptionRenewal { name, .. } => format!("Upcoming renewal: {name}"),
            AlertPayload::LowBalance { .. } => "Low wallet balance".to_owned(),
            AlertPayload::GoalAchieved { name, .. } => format!("Savings goal reached: {name}"),
        }
    }

    /// The body of the notification.
    pub fn message(&self) -> String {
        match self {
            AlertPayload::BudgetWarning(amounts) => format!(
                "You have used {} of your {} budget ({} of {}).",
                format_percentage(amounts.percentage_used),
                amounts.category,
                format_currency(amounts.spent),
                format_currency(amounts.monthly_limit),
            ),
            AlertPayload::BudgetExceeded(amounts) => format!(
                "You have spent {} on {}, which is {} over your budget of {} ({}).",
                format_currency(amounts.spent),
                amounts.category,
                format_currency(amounts.spent - amounts.monthly_limit),
                format_currency(amounts.monthly_limit),
                format_percentage(amounts.percentage_used),
            ),
            AlertPayload::SubscriptionRenewal {
                name,
                price,
                next_billing_date,
                days_until_renewal,
            } => {
                let when = match days_until_renewal {
                    0 => "today".to_owned(),
                    1 => "tomorrow".to_owned(),
                    days => format!("in {days} days"),
                };

                format!(
                    "{name} renews {when} ({next_billing_date}) for {}.",
                    format_currency(*price)
                )
            }
            AlertPayload::LowBalance {
                balance,
                monthly_budget,
                threshold,
            } => format!(
                "Your wallet balance is {}, which is below {} for your monthly budget of {}.",
                format_currency(*balance),
                format_currency(*threshold),
                format_currency(*monthly_budget),
            ),
            AlertPayload::GoalAchieved {
                name,
                current_amount,
                target_amount,
            } => format!(
                "Congratulations! You have saved {} and reached your goal \"{name}\" of {}.",
                format_currency(*current_amount),
                format_currency(*target_amount),
            ),
        }
    }
}

/// An alert proposed by an evaluator that has not been approved for sending yet.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateAlert {
    /// The ID of the budget, subscription, wallet or goal the alert is about.
    pub subject_key: DatabaseID,
    pub payload: AlertPayload,
}

impl CandidateAlert {
    pub fn new(subject_key: DatabaseID, payload: AlertPayload) -> Self {
        Self {
            subject_key,
            payload,
        }
    }

    pub fn alert_type(&self) -> AlertType {
        self.payload.alert_type()
    }
}

#[cfg(test)]
mod alert_payload_tests {
    use time::macros::date;

    use crate::{alert::AlertType, currency::format_currency};

    use super::{AlertPayload, BudgetAmounts};

    fn food_amounts(spent: f64) -> BudgetAmounts {
        BudgetAmounts {
            category: "Food".to_owned(),
            spent,
            monthly_limit: 200.0,
            percentage_used: spent * 100.0 / 200.0,
        }
    }

    #[test]
    fn budget_warning_mentions_percentage_and_amounts() {
        let payload = AlertPayload::BudgetWarning(food_amounts(170.0));

        let message = payload.message();

        assert_eq!(payload.alert_type(), AlertType::BudgetWarning);
        assert_eq!(payload.title(), "Budget warning: Food");
        assert!(message.contains("85.0%"), "got {message}");
        assert!(message.contains(&format_currency(170.0)), "got {message}");
        assert!(message.contains(&format_currency(200.0)), "got {message}");
    }

    #[test]
    fn budget_exceeded_mentions_overspend() {
        let payload = AlertPayload::BudgetExceeded(food_amounts(210.0));

        let message = payload.message();

        assert_eq!(payload.alert_type(), AlertType::BudgetExceeded);
        assert!(message.contains("105.0%"), "got {message}");
        assert!(message.contains(&format_currency(10.0)), "got {message}");
    }

    #[test]
    fn subscription_renewal_describes_days_until_renewal() {
        let renewal = |days_until_renewal| AlertPayload::SubscriptionRenewal {
            name: "Streaming".to_owned(),
            price: 15.99,
            next_billing_date: date!(2026 - 10 - 18),
            days_until_renewal,
        };

        assert!(renewal(0).message().contains("renews today"));
        assert!(renewal(1).message().contains("renews tomorrow"));
        assert!(renewal(2).message().contains("renews in 2 days (2026-10-18)"));
    }

    #[test]
    fn payload_serializes_with_kind_tag() {
        let payload = AlertPayload::LowBalance {
            balance: 5.0,
            monthly_budget: 100.0,
            threshold: 10.0,
        };

        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["kind"], "low_balance");
        assert_eq!(
            serde_json::from_value::<AlertPayload>(json).unwrap(),
            payload
        );
    }
}

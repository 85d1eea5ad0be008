//! The condition evaluators that turn a snapshot into candidate alerts.
//!
//! Evaluators are listed in [ALERT_RULES] and run one after the other by the
//! pipeline. Each one is isolated: an error from one evaluator only discards
//! that evaluator's candidates.

use std::sync::Arc;

use time::OffsetDateTime;

use crate::{
    Error,
    alert::{
        BudgetReport,
        candidate::{AlertPayload, BudgetAmounts, CandidateAlert},
    },
    config::AlertConfig,
    ledger::Snapshot,
    notification::NotificationStore,
};

/// Everything an evaluator may look at besides the snapshot itself.
///
/// Evaluators without side effects run on their own thread, each with a clone
/// of the context.
#[derive(Clone)]
pub struct EvaluationContext {
    /// The local time the cycle is evaluated at.
    pub now: OffsetDateTime,
    pub config: Arc<AlertConfig>,
    /// The month's budget statuses, computed once per cycle.
    pub budget_report: Arc<BudgetReport>,
    /// Used by the goal evaluator to claim the completion of a goal.
    pub store: Arc<dyn NotificationStore>,
}

/// The signature shared by all evaluators.
pub type Evaluator = fn(&Snapshot, &EvaluationContext) -> Result<Vec<CandidateAlert>, Error>;

/// An entry in the table of evaluators run by the pipeline.
#[derive(Clone, Copy)]
pub struct AlertRule {
    /// A name for logs and cycle reports.
    pub name: &'static str,
    pub evaluate: Evaluator,
    /// Whether the evaluator changes stored data.
    ///
    /// Such an evaluator runs to completion on the cycle's thread and its
    /// candidates are never discarded for running over the time budget. The
    /// change it made cannot be repeated.
    pub has_side_effects: bool,
}

impl std::fmt::Debug for AlertRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertRule")
            .field("name", &self.name)
            .field("has_side_effects", &self.has_side_effects)
            .finish()
    }
}

/// The evaluators run on every cycle.
pub const ALERT_RULES: [AlertRule; 4] = [
    AlertRule {
        name: "budget_threshold",
        evaluate: evaluate_budget_thresholds,
        has_side_effects: false,
    },
    AlertRule {
        name: "subscription_renewal",
        evaluate: evaluate_subscription_renewals,
        has_side_effects: false,
    },
    AlertRule {
        name: "low_balance",
        evaluate: evaluate_low_balance,
        has_side_effects: false,
    },
    AlertRule {
        name: "goal_achievement",
        evaluate: evaluate_goal_achievements,
        has_side_effects: true,
    },
];

/// Propose a [BudgetExceeded](crate::alert::AlertType::BudgetExceeded) alert
/// for each overspent budget, otherwise a
/// [BudgetWarning](crate::alert::AlertType::BudgetWarning) for each budget
/// past its alert threshold.
///
/// Budgets with alerts disabled are skipped.
pub fn evaluate_budget_thresholds(
    _snapshot: &Snapshot,
    context: &EvaluationContext,
) -> Result<Vec<CandidateAlert>, Error> {
    let candidates = context
        .budget_report
        .statuses
        .iter()
        .filter(|status| status.enable_alerts)
        .filter_map(|status| {
            let amounts = || BudgetAmounts {
                category: status.category.clone(),
                spent: status.spent,
                monthly_limit: status.monthly_limit,
                percentage_used: status.percentage_used,
            };

            let payload = if status.is_over_budget {
                AlertPayload::BudgetExceeded(amounts())
            } else if status.is_near_limit {
                AlertPayload::BudgetWarning(amounts())
            } else {
                return None;
            };

            Some(CandidateAlert::new(status.budget_id, payload))
        })
        .collect();

    Ok(candidates)
}

/// Propose a renewal reminder for each subscription billed between today and
/// [AlertConfig::renewal_lookahead_days] from today, inclusive.
///
/// Days until renewal is the ceiling of the time until the billing date in
/// days, so a subscription billed tomorrow is one day away no matter the time
/// of day.
pub fn evaluate_subscription_renewals(
    snapshot: &Snapshot,
    context: &EvaluationContext,
) -> Result<Vec<CandidateAlert>, Error> {
    let today = context.now.date();

    let mut candidates = Vec::new();

    for subscription in &snapshot.subscriptions {
        let days_until_renewal = (subscription.next_billing_date - today).whole_days();

        if (0..=context.config.renewal_lookahead_days).contains(&days_until_renewal) {
            candidates.push(CandidateAlert::new(
                subscription.id,
                AlertPayload::SubscriptionRenewal {
                    name: subscription.name.clone(),
                    price: subscription.price,
                    next_billing_date: subscription.next_billing_date,
                    days_until_renewal,
                },
            ));
        }
    }

    Ok(candidates)
}

/// Propose a low balance alert if the wallet balance is below
/// [AlertConfig::low_balance_ratio] of the wallet's monthly budget.
///
/// Wallets without a positive monthly budget never trigger the alert.
pub fn evaluate_low_balance(
    snapshot: &Snapshot,
    context: &EvaluationContext,
) -> Result<Vec<CandidateAlert>, Error> {
    let Some(wallet) = &snapshot.wallet else {
        return Ok(vec![]);
    };

    let Some(monthly_budget) = wallet.monthly_budget.filter(|budget| *budget > 0.0) else {
        return Ok(vec![]);
    };

    let threshold = context.config.low_balance_ratio * monthly_budget;

    if wallet.balance < threshold {
        Ok(vec![CandidateAlert::new(
            wallet.id,
            AlertPayload::LowBalance {
                balance: wallet.balance,
                monthly_budget,
                threshold,
            },
        )])
    } else {
        Ok(vec![])
    }
}

/// Mark each newly achieved goal as completed and propose a congratulation
/// for the goals this call completed.
///
/// Goals already completed by a concurrent cycle are skipped, so each goal is
/// congratulated at most once. A goal whose flag could not be updated is
/// logged and left for the next cycle.
pub fn evaluate_goal_achievements(
    snapshot: &Snapshot,
    context: &EvaluationContext,
) -> Result<Vec<CandidateAlert>, Error> {
    let mut candidates = Vec::new();

    for goal in snapshot.goals.iter().filter(|goal| goal.is_newly_achieved()) {
        let Some(target_amount) = goal.target_amount else {
            continue;
        };

        match context.store.mark_goal_completed(goal.id) {
            Ok(true) => candidates.push(CandidateAlert::new(
                goal.id,
                AlertPayload::GoalAchieved {
                    name: goal.name.clone(),
                    current_amount: goal.current_amount,
                    target_amount,
                },
            )),
            Ok(false) => {
                tracing::debug!("goal {} was already completed by another cycle", goal.id);
            }
            Err(error) => {
                tracing::error!("could not mark goal {} as completed: {error}", goal.id);
            }
        }
    }

    Ok(candidates)
}

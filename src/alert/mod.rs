//! Decides which alerts a user should be sent and records them as notifications.
//!
//! A cycle loads a [Snapshot](crate::ledger::Snapshot) of the user's records,
//! aggregates their spending, runs each evaluator in [ALERT_RULES], checks
//! every candidate against the notification history and saves the ones that
//! have not been sent within their window.

mod aggregation;
mod alert_type;
mod candidate;
mod delivery;
mod emitter;
mod evaluators;
mod gate;
mod pipeline;

pub use aggregation::{BudgetReport, BudgetStatus, UnbudgetedCategory, aggregate_budget_status};
pub use alert_type::{AlertType, DedupPolicy, DedupWindow};
pub use candidate::{AlertPayload, BudgetAmounts, CandidateAlert};
pub use delivery::{UnreadCountChanged, UnreadCountNotifier};
pub use emitter::emit_notification;
pub use evaluators::{
    ALERT_RULES, AlertRule, EvaluationContext, Evaluator, evaluate_budget_thresholds,
    evaluate_goal_achievements, evaluate_low_balance, evaluate_subscription_renewals,
};
pub use gate::{GateDecision, SuppressReason, check_candidate};
pub use pipeline::{
    AlertPipeline, CycleReport, SkipReason, SkippedEvaluator, SuppressedAlert, Trigger,
    record_expense_and_evaluate,
};

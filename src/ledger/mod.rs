//! The user's financial records that alerts are evaluated against.
//!
//! Record entry and editing belong to the rest of the app, this module only
//! provides the tables, the write helpers needed to seed them and the
//! read-only [LedgerReader] interface consumed by the alert pipeline.

mod budget;
mod expense;
mod goal;
mod period;
mod reader;
mod subscription;
mod wallet;

pub use budget::{
    Budget, DEFAULT_ALERT_THRESHOLD, NewBudget, create_budget, create_budget_table, get_budgets,
};
pub use expense::{
    ExpenseRecord, NewExpense, UNCATEGORIZED_LABEL, create_expense, create_expense_table,
    get_expenses,
};
pub use goal::{
    SavingsGoal, archive_savings_goal, create_savings_goal, create_savings_goal_table,
    get_savings_goals, mark_goal_completed, update_goal_progress,
};
pub use period::BudgetPeriod;
pub use reader::{LedgerReader, SQLiteLedger, Snapshot};
pub use subscription::{
    Subscription, create_subscription, create_subscription_table, get_subscriptions,
};
pub use wallet::{WalletSnapshot, create_wallet_table, get_wallet, upsert_wallet};

//! Reduces a month of expenses and budgets into per-category spending status.

use std::collections::HashMap;

use crate::{
    database_id::DatabaseID,
    ledger::{Budget, ExpenseRecord, UNCATEGORIZED_LABEL},
};

/// How much of a budget has been used.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetStatus {
    pub budget_id: DatabaseID,
    pub category: String,
    pub monthly_limit: f64,
    pub alert_threshold: f64,
    pub enable_alerts: bool,
    /// Total expenses in the category for the month.
    pub spent: f64,
    /// What is left of the limit, never negative.
    pub remaining: f64,
    /// `spent` as a percentage of the limit. May exceed 100.
    pub percentage_used: f64,
    pub is_over_budget: bool,
    /// Whether `percentage_used` has reached the alert threshold.
    pub is_near_limit: bool,
}

/// Spending in a category that has no budget for the month.
#[derive(Debug, Clone, PartialEq)]
pub struct UnbudgetedCategory {
    pub category: String,
    pub spent: f64,
}

/// The result of aggregating a month of spending.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BudgetReport {
    /// One entry per budget, in the order the budgets were given.
    pub statuses: Vec<BudgetStatus>,
    /// Categories with spending but no budget, sorted by name with
    /// [UNCATEGORIZED_LABEL] last.
    pub unbudgeted: Vec<UnbudgetedCategory>,
}

/// Sums `expenses` per category and compares the totals against `budgets`.
///
/// Expenses without a category count towards [UNCATEGORIZED_LABEL].
///
/// Every budget must have a limit greater than zero, callers are expected to
/// drop invalid budgets before calling this function.
pub fn aggregate_budget_status(expenses: &[ExpenseRecord], budgets: &[Budget]) -> BudgetReport {
    let mut totals: HashMap<&str, f64> = HashMap::new();

    for expense in expenses {
        *totals.entry(expense.category_or_default()).or_insert(0.0) += expense.amount;
    }

    let statuses = budgets
        .iter()
        .map(|budget| {
            let spent = totals.get(budget.category.as_str()).copied().unwrap_or(0.0);
            budget_status(budget, spent)
        })
        .collect();

    let mut unbudgeted: Vec<UnbudgetedCategory> = totals
        .into_iter()
        .filter(|(category, _)| !budgets.iter().any(|budget| budget.category == *category))
        .map(|(category, spent)| UnbudgetedCategory {
            category: category.to_owned(),
            spent,
        })
        .collect();
    unbudgeted.sort_by(|a, b| {
        (a.category == UNCATEGORIZED_LABEL, &a.category)
            .cmp(&(b.category == UNCATEGORIZED_LABEL, &b.category))
    });

    BudgetReport {
        statuses,
        unbudgeted,
    }
}

fn budget_status(budget: &Budget, spent: f64) -> BudgetStatus {
    debug_assert!(
        budget.monthly_limit > 0.0,
        "budget {} has a non-positive limit",
        budget.id
    );

    // Multiplying first keeps whole-number percentages exact, e.g. 160 of 200 is exactly 80%.
    let percentage_used = spent * 100.0 / budget.monthly_limit;

    BudgetStatus {
        budget_id: budget.id,
        category: budget.category.clone(),
        monthly_limit: budget.monthly_limit,
        alert_threshold: budget.alert_threshold,
        enable_alerts: budget.enable_alerts,
        spent,
        remaining: (budget.monthly_limit - spent).max(0.0),
        percentage_used,
        is_over_budget: spent > budget.monthly_limit,
        is_near_limit: percentage_used >= budget.alert_threshold,
    }
}

use std::ops::RangeInclusive;

use time::Date;

use crate::{
    Error,
    ledger::{
        Budget, BudgetPeriod, ExpenseRecord, LedgerReader, SavingsGoal, Subscription,
        WalletSnapshot,
    },
    user::UserID,
};

/// An in-memory [LedgerReader] for tests that do not need a database.
#[derive(Debug, Default)]
pub(crate) struct FakeLedger {
    pub expenses: Vec<ExpenseRecord>,
    pub budgets: Vec<Budget>,
    pub subscriptions: Vec<Subscription>,
    pub wallet: Option<WalletSnapshot>,
    pub goals: Vec<SavingsGoal>,
    pub fail_reads: bool,
}

impl FakeLedger {
    /// Make every read return an error.
    pub(crate) fn fail_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    fn check_available(&self) -> Result<(), Error> {
        if self.fail_reads {
            Err(Error::DatabaseLockError)
        } else {
            Ok(())
        }
    }
}

impl LedgerReader for FakeLedger {
    fn get_expenses(
        &self,
        user_id: UserID,
        date_range: RangeInclusive<Date>,
    ) -> Result<Vec<ExpenseRecord>, Error> {
        self.check_available()?;

        Ok(self
            .expenses
            .iter()
            .filter(|expense| expense.user_id == user_id && date_range.contains(&expense.date))
            .cloned()
            .collect())
    }

    fn get_budgets(&self, user_id: UserID, period: BudgetPeriod) -> Result<Vec<Budget>, Error> {
        self.check_available()?;

        Ok(self
            .budgets
            .iter()
            .filter(|budget| budget.user_id == user_id && budget.period == period)
            .cloned()
            .collect())
    }

    fn get_subscriptions(&self, user_id: UserID) -> Result<Vec<Subscription>, Error> {
        self.check_available()?;

        Ok(self
            .subscriptions
            .iter()
            .filter(|subscription| subscription.user_id == user_id)
            .cloned()
            .collect())
    }

    fn get_wallet(&self, user_id: UserID) -> Result<Option<WalletSnapshot>, Error> {
        self.check_available()?;

        Ok(self
            .wallet
            .clone()
            .filter(|wallet| wallet.user_id == user_id))
    }

    fn get_savings_goals(&self, user_id: UserID) -> Result<Vec<SavingsGoal>, Error> {
        self.check_available()?;

        Ok(self
            .goals
            .iter()
            .filter(|goal| goal.user_id == user_id)
            .cloned()
            .collect())
    }
}

//! Read-only access to one user's records for an evaluation cycle.

use std::{
    ops::RangeInclusive,
    sync::{Arc, Mutex},
};

use rusqlite::Connection;
use time::Date;

use crate::{
    Error,
    db::lock_connection,
    ledger::{
        Budget, BudgetPeriod, ExpenseRecord, SavingsGoal, Subscription, WalletSnapshot,
        get_budgets, get_expenses, get_savings_goals, get_subscriptions, get_wallet,
    },
    user::UserID,
};

/// Supplies read-only views of a user's financial records.
pub trait LedgerReader {
    /// Get the user's expenses dated within `date_range` (inclusive).
    fn get_expenses(
        &self,
        user_id: UserID,
        date_range: RangeInclusive<Date>,
    ) -> Result<Vec<ExpenseRecord>, Error>;

    /// Get the user's budgets for the calendar month `period`.
    fn get_budgets(&self, user_id: UserID, period: BudgetPeriod) -> Result<Vec<Budget>, Error>;

    /// Get all of the user's subscriptions.
    fn get_subscriptions(&self, user_id: UserID) -> Result<Vec<Subscription>, Error>;

    /// Get the user's wallet, `None` if they do not have one.
    fn get_wallet(&self, user_id: UserID) -> Result<Option<WalletSnapshot>, Error>;

    /// Get all of the user's savings goals.
    fn get_savings_goals(&self, user_id: UserID) -> Result<Vec<SavingsGoal>, Error>;
}

/// A [LedgerReader] backed by the application's SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteLedger {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteLedger {
    /// Create a new ledger reader from the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl LedgerReader for SQLiteLedger {
    fn get_expenses(
        &self,
        user_id: UserID,
        date_range: RangeInclusive<Date>,
    ) -> Result<Vec<ExpenseRecord>, Error> {
        let connection = lock_connection(&self.connection)?;
        get_expenses(user_id, date_range, &connection)
    }

    fn get_budgets(&self, user_id: UserID, period: BudgetPeriod) -> Result<Vec<Budget>, Error> {
        let connection = lock_connection(&self.connection)?;
        get_budgets(user_id, period, &connection)
    }

    fn get_subscriptions(&self, user_id: UserID) -> Result<Vec<Subscription>, Error> {
        let connection = lock_connection(&self.connection)?;
        get_subscriptions(user_id, &connection)
    }

    fn get_wallet(&self, user_id: UserID) -> Result<Option<WalletSnapshot>, Error> {
        let connection = lock_connection(&self.connection)?;
        get_wallet(user_id, &connection)
    }

    fn get_savings_goals(&self, user_id: UserID) -> Result<Vec<SavingsGoal>, Error> {
        let connection = lock_connection(&self.connection)?;
        get_savings_goals(user_id, &connection)
    }
}

/// The bounded, read-only view of one user's records used for one evaluation cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub user_id: UserID,
    /// The month whose budgets and expenses were loaded.
    pub period: BudgetPeriod,
    pub expenses: Vec<ExpenseRecord>,
    pub budgets: Vec<Budget>,
    pub subscriptions: Vec<Subscription>,
    pub wallet: Option<WalletSnapshot>,
    pub goals: Vec<SavingsGoal>,
}

impl Snapshot {
    /// Read everything the evaluators need for `user_id` in `period`.
    ///
    /// # Errors
    ///
    /// Returns [Error::DataUnavailable] if any read fails. A partial snapshot is
    /// never returned, since evaluating half of the user's data could send
    /// alerts that contradict the rest of it.
    pub fn load(
        ledger: &impl LedgerReader,
        user_id: UserID,
        period: BudgetPeriod,
    ) -> Result<Self, Error> {
        let unavailable = |error: Error| Error::DataUnavailable(error.to_string());

        let date_range = period.date_range().map_err(unavailable)?;

        Ok(Self {
            user_id,
            period,
            expenses: ledger.get_expenses(user_id, date_range).map_err(unavailable)?,
            budgets: ledger.get_budgets(user_id, period).map_err(unavailable)?,
            subscriptions: ledger.get_subscriptions(user_id).map_err(unavailable)?,
            wallet: ledger.get_wallet(user_id).map_err(unavailable)?,
            goals: ledger.get_savings_goals(user_id).map_err(unavailable)?,
        })
    }
}

#[cfg(test)]
mod snapshot_tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;
    use time::{Month, macros::date};

    use crate::{
        Error,
        db::initialize,
        ledger::{
            BudgetPeriod, NewBudget, NewExpense, create_budget, create_expense,
            create_savings_goal, create_subscription, upsert_wallet,
        },
        test_utils::FakeLedger,
        user::create_user,
    };

    use super::{SQLiteLedger, Snapshot};

    #[test]
    fn load_reads_every_record_set() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user_id = create_user("test", &connection).unwrap();
        let period = BudgetPeriod::new(Month::October, 2026);
        let budget =
            create_budget(NewBudget::new(user_id, "Food", 200.0, period), &connection).unwrap();
        let expense = create_expense(
            NewExpense {
                user_id,
                category: Some("Food".to_owned()),
                amount: 20.0,
                date: date!(2026 - 10 - 03),
            },
            &connection,
        )
        .unwrap();
        create_expense(
            NewExpense {
                user_id,
                category: Some("Food".to_owned()),
                amount: 20.0,
                date: date!(2026 - 09 - 03),
            },
            &connection,
        )
        .unwrap();
        let subscription =
            create_subscription(user_id, "Music", 9.99, date!(2026 - 10 - 20), &connection)
                .unwrap();
        let wallet = upsert_wallet(user_id, 50.0, Some(400.0), &connection).unwrap();
        let goal = create_savings_goal(user_id, "Bike", 10.0, Some(900.0), &connection).unwrap();
        let ledger = SQLiteLedger::new(Arc::new(Mutex::new(connection)));

        let snapshot = Snapshot::load(&ledger, user_id, period).expect("Could not load snapshot");

        assert_eq!(
            snapshot,
            Snapshot {
                user_id,
                period,
                expenses: vec![expense],
                budgets: vec![budget],
                subscriptions: vec![subscription],
                wallet: Some(wallet),
                goals: vec![goal],
            }
        );
    }

    #[test]
    fn load_fails_with_data_unavailable_when_any_read_fails() {
        let ledger = FakeLedger::default().fail_reads();
        let period = BudgetPeriod::new(Month::October, 2026);

        let result = Snapshot::load(&ledger, crate::user::UserID::new(1), period);

        assert!(matches!(result, Err(Error::DataUnavailable(_))));
    }
}

//! Runs the evaluate, gate and emit cycle for a user.

use std::{
    fmt::Display,
    sync::{
        Arc, Mutex,
        mpsc::{self, RecvTimeoutError},
    },
    thread,
    time::{Duration as StdDuration, Instant},
};

use rusqlite::Connection;
use time::OffsetDateTime;
use time_tz::Tz;

use crate::{
    Error,
    alert::{
        ALERT_RULES, AlertRule, AlertType, CandidateAlert, EvaluationContext, GateDecision,
        SuppressReason, UnbudgetedCategory, UnreadCountChanged, UnreadCountNotifier,
        aggregate_budget_status, check_candidate, emit_notification,
    },
    config::AlertConfig,
    database_id::DatabaseID,
    db::lock_connection,
    ledger::{BudgetPeriod, ExpenseRecord, LedgerReader, NewExpense, Snapshot, create_expense},
    notification::{NotificationRecord, NotificationStore},
    timezone::{get_timezone, local_now},
    user::UserID,
};

/// What caused an evaluation cycle to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// An expense was recorded in the given month.
    ExpenseRecorded(BudgetPeriod),
    /// The scheduled sweep over every user.
    PeriodicSweep,
    /// The user asked for their alerts to be refreshed.
    ManualRefresh,
}

impl Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trigger::ExpenseRecorded(period) => write!(f, "expense recorded in {period}"),
            Trigger::PeriodicSweep => f.write_str("periodic sweep"),
            Trigger::ManualRefresh => f.write_str("manual refresh"),
        }
    }
}

/// A candidate the gate did not let through.
#[derive(Debug, Clone, PartialEq)]
pub struct SuppressedAlert {
    pub alert_type: AlertType,
    pub subject_key: DatabaseID,
    pub reason: SuppressReason,
}

/// Why the candidates of an evaluator were discarded.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The evaluator returned an error.
    Failed(String),
    /// The evaluator did not finish within [AlertConfig::evaluator_time_budget].
    ///
    /// The cycle carries on without it and whatever it returns later is dropped.
    ExceededTimeBudget(StdDuration),
}

/// An evaluator whose candidates were discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedEvaluator {
    pub name: &'static str,
    pub reason: SkipReason,
}

/// A summary of one evaluation cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub user_id: UserID,
    pub trigger: Trigger,
    /// The month whose budgets were evaluated.
    pub period: BudgetPeriod,
    /// The notifications created by this cycle.
    pub emitted: Vec<NotificationRecord>,
    pub suppressed: Vec<SuppressedAlert>,
    pub skipped_evaluators: Vec<SkippedEvaluator>,
    /// How many approved alerts could not be saved.
    pub persistence_failures: usize,
    /// Categories with spending this month but no budget.
    pub unbudgeted_categories: Vec<UnbudgetedCategory>,
    /// Set when the store cannot reject racing inserts, so overlapping cycles
    /// for the same user may have recorded an alert twice.
    pub duplicate_risk: bool,
}

/// Evaluates a user's records against the alert rules and records the alerts
/// that have not been sent yet.
///
/// Cycles may run concurrently for the same user. Duplicate alerts are
/// prevented by the store's window uniqueness and the goal completion
/// compare-and-set, not by serializing cycles.
#[derive(Debug)]
pub struct AlertPipeline<L, S> {
    ledger: L,
    store: Arc<S>,
    config: Arc<AlertConfig>,
    timezone: &'static Tz,
    rules: Vec<AlertRule>,
    notifier: UnreadCountNotifier,
}

impl<L, S> AlertPipeline<L, S>
where
    L: LedgerReader,
    S: NotificationStore + 'static,
{
    /// Create a pipeline running the default [ALERT_RULES].
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidTimezone] if the configured timezone is not a known timezone.
    pub fn new(ledger: L, store: S, config: AlertConfig) -> Result<Self, Error> {
        let timezone = get_timezone(&config.local_timezone)?;

        if !store.enforces_window_uniqueness() {
            tracing::warn!(
                "the notification store does not reject duplicate inserts, overlapping cycles may send an alert twice"
            );
        }

        Ok(Self {
            ledger,
            store: Arc::new(store),
            config: Arc::new(config),
            timezone,
            rules: ALERT_RULES.to_vec(),
            notifier: UnreadCountNotifier::default(),
        })
    }

    /// Replace the evaluators run on each cycle.
    pub fn with_rules(mut self, rules: Vec<AlertRule>) -> Self {
        self.rules = rules;
        self
    }

    pub fn config(&self) -> &AlertConfig {
        &self.config
    }

    /// Receive the unread counts of users who were sent new notifications.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<UnreadCountChanged> {
        self.notifier.subscribe()
    }

    /// Evaluate the user's alerts after an expense was recorded in `period`.
    pub fn on_expense_recorded(
        &self,
        user_id: UserID,
        period: BudgetPeriod,
    ) -> Result<CycleReport, Error> {
        let now = local_now(&self.config.local_timezone)?;
        self.run_cycle(user_id, Trigger::ExpenseRecorded(period), now)
    }

    /// Evaluate the user's alerts for the current month.
    pub fn periodic_sweep(&self, user_id: UserID) -> Result<CycleReport, Error> {
        let now = local_now(&self.config.local_timezone)?;
        self.run_cycle(user_id, Trigger::PeriodicSweep, now)
    }

    /// Evaluate the user's alerts for the current month on request.
    pub fn manual_refresh(&self, user_id: UserID) -> Result<CycleReport, Error> {
        let now = local_now(&self.config.local_timezone)?;
        self.run_cycle(user_id, Trigger::ManualRefresh, now)
    }

    /// Run the periodic sweep for each user, one after the other.
    ///
    /// A user whose cycle fails is logged and skipped, the returned reports
    /// only cover the users whose cycle completed.
    pub fn sweep_users(&self, user_ids: &[UserID]) -> Vec<CycleReport> {
        user_ids
            .iter()
            .filter_map(|&user_id| {
                self.periodic_sweep(user_id)
                    .inspect_err(|error| {
                        tracing::error!("alert sweep failed for user {user_id}: {error}")
                    })
                    .ok()
            })
            .collect()
    }

    /// Run one evaluation cycle for `user_id` as of the local time `now`.
    ///
    /// # Errors
    ///
    /// Returns [Error::DataUnavailable] if the user's records could not be
    /// read, in which case nothing is emitted. Failures after that point are
    /// logged and summarised in the returned [CycleReport].
    pub fn run_cycle(
        &self,
        user_id: UserID,
        trigger: Trigger,
        now: OffsetDateTime,
    ) -> Result<CycleReport, Error> {
        let started = Instant::now();
        let period = match trigger {
            Trigger::ExpenseRecorded(period) => period,
            Trigger::PeriodicSweep | Trigger::ManualRefresh => BudgetPeriod::containing(now.date()),
        };

        let mut snapshot = Snapshot::load(&self.ledger, user_id, period).inspect_err(|error| {
            tracing::error!("abandoning alert cycle for user {user_id} ({trigger}): {error}")
        })?;

        snapshot.budgets.retain(|budget| {
            let is_valid = budget.monthly_limit.is_finite() && budget.monthly_limit > 0.0;
            if !is_valid {
                tracing::warn!(
                    "ignoring budget {} for \"{}\" with invalid limit {}",
                    budget.id,
                    budget.category,
                    budget.monthly_limit
                );
            }
            is_valid
        });

        let budget_report = aggregate_budget_status(&snapshot.expenses, &snapshot.budgets);
        let unbudgeted_categories = budget_report.unbudgeted.clone();
        let snapshot = Arc::new(snapshot);
        let context = EvaluationContext {
            now,
            config: self.config.clone(),
            budget_report: Arc::new(budget_report),
            store: self.store.clone(),
        };

        let mut report = CycleReport {
            user_id,
            trigger,
            period,
            emitted: Vec::new(),
            suppressed: Vec::new(),
            skipped_evaluators: Vec::new(),
            persistence_failures: 0,
            unbudgeted_categories,
            duplicate_risk: !self.store.enforces_window_uniqueness(),
        };

        let mut candidates = Vec::new();

        for rule in &self.rules {
            match self.evaluate_rule(rule, &snapshot, &context) {
                Ok(rule_candidates) => candidates.extend(rule_candidates),
                Err(SkipReason::Failed(reason)) => {
                    let error = Error::EvaluatorFailure {
                        evaluator: rule.name,
                        reason,
                    };
                    tracing::error!("{error}");
                    report.skipped_evaluators.push(SkippedEvaluator {
                        name: rule.name,
                        reason: SkipReason::Failed(error.to_string()),
                    });
                }
                Err(SkipReason::ExceededTimeBudget(budget)) => {
                    tracing::warn!(
                        "evaluator \"{}\" did not finish within {} ms, discarding its candidates",
                        rule.name,
                        budget.as_millis()
                    );
                    report.skipped_evaluators.push(SkippedEvaluator {
                        name: rule.name,
                        reason: SkipReason::ExceededTimeBudget(budget),
                    });
                }
            }
        }

        for candidate in candidates {
            let alert_type = candidate.alert_type();
            let subject_key = candidate.subject_key;
            let policy = alert_type.dedup_policy(&self.config);

            let window = match check_candidate(
                &candidate,
                policy,
                now,
                self.timezone,
                self.store.as_ref(),
            ) {
                GateDecision::Approve(window) => window,
                GateDecision::Suppress(reason) => {
                    report.suppressed.push(SuppressedAlert {
                        alert_type,
                        subject_key,
                        reason,
                    });
                    continue;
                }
            };

            match emit_notification(user_id, candidate, window, now, self.store.as_ref()) {
                Ok(record) => report.emitted.push(record),
                Err(Error::DuplicateNotification) => {
                    tracing::debug!(
                        "{alert_type} for subject {subject_key} was recorded by a concurrent cycle"
                    );
                    report.suppressed.push(SuppressedAlert {
                        alert_type,
                        subject_key,
                        reason: SuppressReason::AlreadyNotified,
                    });
                }
                Err(error) => {
                    tracing::error!(
                        "could not save {alert_type} for subject {subject_key}: {error}"
                    );
                    report.persistence_failures += 1;
                }
            }
        }

        if !report.emitted.is_empty() {
            match self.store.count_unread(user_id) {
                Ok(unread_count) => self.notifier.publish(UnreadCountChanged {
                    user_id,
                    unread_count,
                }),
                Err(error) => {
                    tracing::warn!("could not count unread notifications for user {user_id}: {error}")
                }
            }
        }

        tracing::info!(
            "alert cycle for user {user_id} ({trigger}) emitted {}, suppressed {}, skipped {} evaluator(s), {} persistence failure(s) in {} ms",
            report.emitted.len(),
            report.suppressed.len(),
            report.skipped_evaluators.len(),
            report.persistence_failures,
            started.elapsed().as_millis()
        );

        Ok(report)
    }

    /// Run one evaluator, giving up on it once it runs over the time budget.
    ///
    /// Evaluators with side effects run to completion on the calling thread.
    /// The others run on a worker thread that is abandoned if it does not
    /// answer in time.
    fn evaluate_rule(
        &self,
        rule: &AlertRule,
        snapshot: &Arc<Snapshot>,
        context: &EvaluationContext,
    ) -> Result<Vec<CandidateAlert>, SkipReason> {
        if rule.has_side_effects {
            return (rule.evaluate)(snapshot, context)
                .map_err(|error| SkipReason::Failed(error.to_string()));
        }

        let (sender, receiver) = mpsc::channel();
        let evaluate = rule.evaluate;
        let snapshot = snapshot.clone();
        let context = context.clone();

        thread::Builder::new()
            .name(format!("evaluator-{}", rule.name))
            .spawn(move || {
                // The receiver is gone once the time budget has run out.
                let _ = sender.send(evaluate(&snapshot, &context));
            })
            .map_err(|error| {
                SkipReason::Failed(format!("could not start evaluator thread: {error}"))
            })?;

        let time_budget = self.config.evaluator_time_budget;

        match receiver.recv_timeout(time_budget) {
            Ok(result) => result.map_err(|error| SkipReason::Failed(error.to_string())),
            Err(RecvTimeoutError::Timeout) => Err(SkipReason::ExceededTimeBudget(time_budget)),
            Err(RecvTimeoutError::Disconnected) => {
                Err(SkipReason::Failed("evaluator panicked".to_owned()))
            }
        }
    }
}

/// Record an expense and then evaluate the user's alerts for its month.
///
/// The database lock is released before the cycle runs, the pipeline takes
/// it again for each read and write.
///
/// # Errors
///
/// Returns an error if the expense could not be saved. A failed cycle does
/// not undo the expense, it is logged and reported as `None`.
pub fn record_expense_and_evaluate<L, S>(
    expense: NewExpense,
    connection: &Mutex<Connection>,
    pipeline: &AlertPipeline<L, S>,
) -> Result<(ExpenseRecord, Option<CycleReport>), Error>
where
    L: LedgerReader,
    S: NotificationStore + 'static,
{
    let expense = {
        let connection = lock_connection(connection)?;
        create_expense(expense, &connection)?
    };
    let period = BudgetPeriod::containing(expense.date);

    let report = pipeline
        .on_expense_recorded(expense.user_id, period)
        .inspect_err(|error| {
            tracing::error!(
                "could not evaluate alerts after recording expense {}: {error}",
                expense.id
            )
        })
        .ok();

    Ok((expense, report))
}

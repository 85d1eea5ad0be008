//! [![github]](https://github.com/AnthonyDickson/budgeteur-rs)&ensp;
//!
//! [github]: https://img.shields.io/badge/github-8da0cb?style=for-the-badge&labelColor=555555&logo=github
//!
//! <br>
//!
//! Budgeteur alerts watches a user's budgets, subscriptions, wallet and
//! savings goals and records a notification whenever one of them needs the
//! user's attention, without ever sending the same alert twice within its
//! window.
//!
//! This library provides the alert pipeline, the SQLite tables it reads and
//! writes, and the trigger entrypoints called after an expense is recorded,
//! on a periodic sweep or on request.

use tokio::signal;

pub mod alert;
mod config;
mod currency;
mod database_id;
mod db;
mod error;
pub mod ledger;
pub mod notification;
mod timezone;
mod user;

#[cfg(test)]
mod test_utils;

pub use alert::{AlertPipeline, CycleReport, Trigger, record_expense_and_evaluate};
pub use config::AlertConfig;
pub use currency::{format_currency, format_percentage};
pub use database_id::DatabaseID;
pub use db::{initialize as initialize_db, lock_connection};
pub use error::Error;
pub use timezone::{get_local_offset, get_timezone, local_now, start_of_day};
pub use user::{UserID, create_user, get_all_user_ids};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first.
///
/// Long running tasks should stop once this future completes.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
        },
    }
}

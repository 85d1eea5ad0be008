use std::{
    fs::OpenOptions,
    sync::{Arc, Mutex},
    time::Duration,
};

use clap::Parser;
use rusqlite::Connection;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use budgeteur_alerts::{
    AlertConfig, AlertPipeline, Error, get_all_user_ids, initialize_db,
    ledger::SQLiteLedger,
    lock_connection,
    notification::SQLiteNotificationStore,
    shutdown_signal,
};

type Pipeline = AlertPipeline<SQLiteLedger, SQLiteNotificationStore>;

/// Periodically evaluates the alerts of every user in a budgeteur database.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The canonical timezone that calendar months and days are measured in.
    #[arg(long, default_value = "Etc/UTC")]
    timezone: String,

    /// How many seconds to wait between sweeps.
    #[arg(short, long, default_value_t = 3600)]
    interval_secs: u64,

    /// Run a single sweep and exit.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() {
    setup_logging();

    let args = Args::parse();

    let conn = Connection::open(&args.db_path).expect("Could not open the database.");
    initialize_db(&conn).expect("Could not initialize the database.");
    let conn = Arc::new(Mutex::new(conn));

    let pipeline = AlertPipeline::new(
        SQLiteLedger::new(conn.clone()),
        SQLiteNotificationStore::new(conn.clone()),
        AlertConfig::with_timezone(&args.timezone),
    )
    .unwrap_or_else(|error| panic!("Could not create the alert pipeline: {error}"));
    let pipeline = Arc::new(pipeline);

    tokio::spawn(log_unread_counts(pipeline.subscribe()));

    if args.once {
        sweep(pipeline, conn).await;
        return;
    }

    let mut interval = tokio::time::interval(Duration::from_secs(args.interval_secs));
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    tracing::info!(
        "Sweeping alerts every {} seconds in {}",
        args.interval_secs,
        args.timezone
    );

    loop {
        tokio::select! {
            _ = interval.tick() => sweep(pipeline.clone(), conn.clone()).await,
            _ = &mut shutdown => {
                tracing::info!("Shutting down alert sweeper.");
                break;
            }
        }
    }
}

/// Run the periodic sweep for every user on a blocking thread.
async fn sweep(pipeline: Arc<Pipeline>, conn: Arc<Mutex<Connection>>) {
    let result = tokio::task::spawn_blocking(move || -> Result<usize, Error> {
        let user_ids = {
            let connection = lock_connection(&conn)?;
            get_all_user_ids(&connection)?
        };
        let reports = pipeline.sweep_users(&user_ids);

        Ok(reports.iter().map(|report| report.emitted.len()).sum())
    })
    .await;

    match result {
        Ok(Ok(emitted)) => tracing::info!("Sweep finished, {emitted} notification(s) sent."),
        Ok(Err(error)) => tracing::error!("Sweep failed: {error}"),
        Err(error) => tracing::error!("Sweep task panicked: {error}"),
    }
}

async fn log_unread_counts(
    mut receiver: tokio::sync::broadcast::Receiver<budgeteur_alerts::alert::UnreadCountChanged>,
) {
    loop {
        match receiver.recv().await {
            Ok(event) => tracing::info!(
                "User {} has {} unread notification(s).",
                event.user_id,
                event.unread_count
            ),
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!("Missed {skipped} unread count update(s).")
            }
            Err(RecvError::Closed) => break,
        }
    }
}

fn setup_logging() {
    let stdout_log = tracing_subscriber::fmt::layer().pretty();

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
        .expect("Could not create log file");

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(
            stdout_log
                .with_filter(filter::LevelFilter::INFO)
                .and_then(debug_log)
                .with_filter(filter::LevelFilter::DEBUG),
        )
        .init();
}

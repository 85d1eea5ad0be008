use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use budgeteur_alerts::{
    create_user, initialize_db,
    ledger::{
        BudgetPeriod, NewBudget, NewExpense, create_budget, create_expense, create_savings_goal,
        create_subscription, upsert_wallet,
    },
};

/// A utility for creating a test database for the budgeteur alert sweeper.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database where every alert type fires on the first sweep.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user...");
    let user_id = create_user("test", &conn)?;

    let today = OffsetDateTime::now_utc().date();
    let period = BudgetPeriod::containing(today);

    println!("Creating budgets and expenses for {period}...");
    create_budget(NewBudget::new(user_id, "Food", 200.0, period), &conn)?;
    create_budget(NewBudget::new(user_id, "Fuel", 150.0, period), &conn)?;
    create_budget(
        NewBudget::new(user_id, "Fun", 100.0, period).enable_alerts(false),
        &conn,
    )?;

    for (category, amount) in [
        (Some("Food"), 100.0),
        (Some("Food"), 70.0),
        (Some("Fuel"), 160.0),
        (Some("Fun"), 120.0),
        (None, 12.5),
    ] {
        create_expense(
            NewExpense {
                user_id,
                category: category.map(str::to_owned),
                amount,
                date: today,
            },
            &conn,
        )?;
    }

    println!("Creating subscriptions, wallet and savings goals...");
    create_subscription(user_id, "Streaming", 15.99, today + Duration::days(2), &conn)?;
    create_subscription(user_id, "Gym", 30.0, today + Duration::days(10), &conn)?;
    upsert_wallet(user_id, 5.0, Some(100.0), &conn)?;
    create_savings_goal(user_id, "Holiday", 500.0, Some(500.0), &conn)?;
    create_savings_goal(user_id, "House", 12_000.0, Some(80_000.0), &conn)?;

    println!("Success!");

    Ok(())
}

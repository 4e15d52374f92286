use std::{error::Error, path::Path, process::exit, str::FromStr};

use clap::Parser;
use email_address::EmailAddress;
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::{Date, Duration, OffsetDateTime};

use budget_api::{
    CurrencyCode, NewTransaction, NewUser, PasswordHash, Role, ValidatedPassword,
    create_transaction, create_user, initialize_db, seed_default_categories,
};

/// A utility for creating a test database for the budget_api server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

const TEST_USERNAME: &str = "test";
const TEST_EMAIL: &str = "test@example.com";
const TEST_PASSWORD: &str = "test";

/// Description, amount in cents, category ID and days before today.
const SAMPLE_TRANSACTIONS: [(&str, i64, i64, i64); 8] = [
    ("Monthly salary", 450_000, 10, 20),
    ("Weekly groceries", 18_550, 1, 14),
    ("Rent", 160_000, 2, 13),
    ("Bus card top up", 2_000, 3, 10),
    ("Power bill", 12_499, 4, 8),
    ("Weekly groceries", 21_075, 1, 7),
    ("Cinema tickets", 3_600, 6, 3),
    ("Logo design", 80_000, 11, 1),
];

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        Some(extension) if !extension.is_empty() => {}
        _ => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;
    let category_count = seed_default_categories(&conn)?;
    println!("Added {category_count} categories.");

    println!("Creating test user...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked(TEST_PASSWORD),
        PasswordHash::DEFAULT_COST,
    )?;

    let user = create_user(
        NewUser {
            username: TEST_USERNAME.to_owned(),
            email: EmailAddress::from_str(TEST_EMAIL)?,
            password_hash,
            role: Role::User,
        },
        &conn,
    )?;

    println!("Creating sample transactions...");

    let today = OffsetDateTime::now_utc().date();
    let currency = CurrencyCode::new("NZD")?;

    for (description, cents, category_id, days_ago) in SAMPLE_TRANSACTIONS {
        create_transaction(
            user.id,
            NewTransaction {
                description: description.to_owned(),
                amount: Decimal::new(cents, 2),
                currency: currency.clone(),
                date: days_before(today, days_ago),
                category_id,
            },
            &conn,
        )?;
    }

    println!(
        "Success! Log in with the email '{TEST_EMAIL}' and the password '{TEST_PASSWORD}'."
    );

    Ok(())
}

fn days_before(date: Date, days: i64) -> Date {
    date.saturating_sub(Duration::days(days))
}

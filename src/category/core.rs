//! The category model and its database operations.

use std::{fmt::Display, str::FromStr};

use rusqlite::{Connection, Row, types::Type};
use serde::{Deserialize, Serialize};

use crate::{Error, database_id::CategoryId};

/// Whether money in a category is earned or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CategoryType {
    /// Money earned, e.g. a salary.
    Income,
    /// Money spent, e.g. rent.
    Expense,
}

impl CategoryType {
    /// The name of the type as stored in the database and sent to clients.
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryType::Income => "INCOME",
            CategoryType::Expense => "EXPENSE",
        }
    }
}

impl Display for CategoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses "INCOME" or "EXPENSE", ignoring case.
impl FromStr for CategoryType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("INCOME") {
            Ok(CategoryType::Income)
        } else if s.eq_ignore_ascii_case("EXPENSE") {
            Ok(CategoryType::Expense)
        } else {
            Err(Error::Validation(format!(
                "Unknown category type \"{s}\", expected INCOME or EXPENSE"
            )))
        }
    }
}

/// A label for transactions, e.g. "Food" or "Salary".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The unique name of the category.
    pub name: String,
    /// Whether transactions in this category are income or expenses.
    #[serde(rename = "type")]
    pub category_type: CategoryType,
}

/// The expense categories created by [seed_default_categories].
pub const DEFAULT_EXPENSE_CATEGORIES: [&str; 9] = [
    "Food",
    "Rent",
    "Transport",
    "Utilities",
    "Shopping",
    "Entertainment",
    "Healthcare",
    "Education",
    "Other Expenses",
];

/// The income categories created by [seed_default_categories].
pub const DEFAULT_INCOME_CATEGORIES: [&str; 5] =
    ["Salary", "Freelance", "Investment", "Gift", "Other Income"];

/// Create the category table.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                type TEXT NOT NULL CHECK (type IN ('INCOME', 'EXPENSE'))
                )",
        (),
    )?;

    Ok(())
}

/// Insert the default categories if there are no categories yet.
///
/// Returns the number of categories inserted, which is zero when the table
/// already had categories.
///
/// # Errors
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn seed_default_categories(connection: &Connection) -> Result<usize, Error> {
    if count_categories(connection)? > 0 {
        tracing::debug!("Categories already exist, skipping seed");
        return Ok(0);
    }

    let defaults = DEFAULT_EXPENSE_CATEGORIES
        .iter()
        .map(|name| (*name, CategoryType::Expense))
        .chain(
            DEFAULT_INCOME_CATEGORIES
                .iter()
                .map(|name| (*name, CategoryType::Income)),
        );

    let mut statement =
        connection.prepare("INSERT OR IGNORE INTO category (name, type) VALUES (?1, ?2)")?;
    let mut inserted = 0;

    for (name, category_type) in defaults {
        inserted += statement.execute((name, category_type.as_str()))?;
    }

    tracing::info!("Seeded {inserted} default categories");

    Ok(inserted)
}

/// Get the number of categories in the database.
pub fn count_categories(connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM category;", [], |row| row.get::<_, u32>(0))
        .map(|count| count as usize)
        .map_err(|error| error.into())
}

/// Retrieve a single category by ID.
///
/// # Errors
/// Returns [Error::CategoryNotFound] if there is no category with `category_id`.
pub fn get_category(category_id: CategoryId, connection: &Connection) -> Result<Category, Error> {
    connection
        .prepare("SELECT id, name, type FROM category WHERE id = :id;")?
        .query_row(&[(":id", &category_id)], map_category_row)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::CategoryNotFound,
            error => error.into(),
        })
}

/// Retrieve all categories ordered by ID.
pub fn get_all_categories(connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare("SELECT id, name, type FROM category ORDER BY id ASC;")?
        .query_map([], map_category_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Retrieve the categories of one type ordered by ID.
pub fn get_categories_by_type(
    category_type: CategoryType,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    connection
        .prepare("SELECT id, name, type FROM category WHERE type = :type ORDER BY id ASC;")?
        .query_map(&[(":type", category_type.as_str())], map_category_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

fn map_category_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let raw_type: String = row.get(2)?;
    let category_type = CategoryType::from_str(&raw_type).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(error))
    })?;

    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        category_type,
    })
}

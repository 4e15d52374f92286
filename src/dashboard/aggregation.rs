//! Sums a user's transactions by category type and by expense category.
//!
//! All sums are computed by SQLite over integer cents and converted to
//! decimals afterwards, so they are exact.

use std::ops::RangeInclusive;

use rusqlite::{Connection, named_params};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    category::CategoryType,
    database_id::CategoryId,
    transaction::from_cents,
    user::UserID,
};

/// The total spent in one expense category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    /// The ID of the category.
    pub category_id: CategoryId,
    /// The name of the category.
    pub category_name: String,
    /// The sum of the amounts of the category's transactions.
    pub total_amount: Decimal,
}

/// Sum the amounts of the transactions owned by `user_id` in `date_range`
/// whose category has the type `category_type`.
///
/// Returns zero if there are no matching transactions. A range whose start is
/// after its end matches nothing.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn sum_by_category_type(
    user_id: UserID,
    category_type: CategoryType,
    date_range: &RangeInclusive<Date>,
    connection: &Connection,
) -> Result<Decimal, Error> {
    let cents: i64 = connection
        .prepare(
            "SELECT COALESCE(SUM(t.amount), 0) FROM \"transaction\" t \
             INNER JOIN category c ON c.id = t.category_id \
             WHERE t.user_id = :user_id AND c.type = :category_type \
             AND t.date BETWEEN :start AND :end",
        )?
        .query_row(
            named_params! {
                ":user_id": user_id.as_i64(),
                ":category_type": category_type.as_str(),
                ":start": date_range.start(),
                ":end": date_range.end(),
            },
            |row| row.get(0),
        )?;

    Ok(from_cents(cents))
}

/// Sum the expenses owned by `user_id` in `date_range` per category.
///
/// Only categories with at least one matching transaction are included. The
/// totals are ordered by category ID.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn expenses_by_category(
    user_id: UserID,
    date_range: &RangeInclusive<Date>,
    connection: &Connection,
) -> Result<Vec<CategoryTotal>, Error> {
    connection
        .prepare(
            "SELECT c.id, c.name, SUM(t.amount) FROM \"transaction\" t \
             INNER JOIN category c ON c.id = t.category_id \
             WHERE t.user_id = :user_id AND c.type = :category_type \
             AND t.date BETWEEN :start AND :end \
             GROUP BY c.id, c.name \
             ORDER BY c.id",
        )?
        .query_map(
            named_params! {
                ":user_id": user_id.as_i64(),
                ":category_type": CategoryType::Expense.as_str(),
                ":start": date_range.start(),
                ":end": date_range.end(),
            },
            |row| {
                Ok(CategoryTotal {
                    category_id: row.get(0)?,
                    category_name: row.get(1)?,
                    total_amount: from_cents(row.get(2)?),
                })
            },
        )?
        .map(|maybe_total| maybe_total.map_err(Error::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use rusqlite::Connection;
    use time::{Date, macros::date};

    use crate::{
        category::CategoryType,
        currency::CurrencyCode,
        dashboard::aggregation::{CategoryTotal, expenses_by_category, sum_by_category_type},
        test_utils::{get_test_connection, insert_test_user},
        transaction::{MAX_AMOUNT, NewTransaction, create_transaction},
        user::UserID,
    };

    const FOOD: i64 = 1;
    const RENT: i64 = 2;
    const TRANSPORT: i64 = 3;
    const SALARY: i64 = 10;

    fn insert(
        user_id: UserID,
        amount: Decimal,
        date: Date,
        category_id: i64,
        connection: &Connection,
    ) {
        create_transaction(
            user_id,
            NewTransaction {
                description: "Test".to_owned(),
                amount,
                currency: CurrencyCode::new("NZD").unwrap(),
                date,
                category_id,
            },
            connection,
        )
        .unwrap();
    }

    #[test]
    fn sums_are_zero_without_transactions() {
        let connection = get_test_connection();
        let user_id = insert_test_user(&connection, "alice");
        let range = date!(2025 - 01 - 01)..=date!(2025 - 01 - 31);

        let income = sum_by_category_type(user_id, CategoryType::Income, &range, &connection);
        let expense = sum_by_category_type(user_id, CategoryType::Expense, &range, &connection);
        let breakdown = expenses_by_category(user_id, &range, &connection);

        assert_eq!(income, Ok(Decimal::ZERO));
        assert_eq!(expense, Ok(Decimal::ZERO));
        assert_eq!(breakdown, Ok(vec![]));
    }

    #[test]
    fn sums_by_type_within_inclusive_range() {
        let connection = get_test_connection();
        let user_id = insert_test_user(&connection, "alice");
        insert(user_id, dec!(3000), date!(2025 - 01 - 01), SALARY, &connection);
        insert(user_id, dec!(12.34), date!(2025 - 01 - 31), FOOD, &connection);
        insert(user_id, dec!(0.66), date!(2025 - 01 - 15), FOOD, &connection);
        // Outside the range.
        insert(user_id, dec!(99), date!(2024 - 12 - 31), FOOD, &connection);
        insert(user_id, dec!(99), date!(2025 - 02 - 01), SALARY, &connection);
        let range = date!(2025 - 01 - 01)..=date!(2025 - 01 - 31);

        let income = sum_by_category_type(user_id, CategoryType::Income, &range, &connection);
        let expense = sum_by_category_type(user_id, CategoryType::Expense, &range, &connection);

        assert_eq!(income, Ok(dec!(3000)));
        assert_eq!(expense, Ok(dec!(13.00)));
    }

    #[test]
    fn sums_only_include_the_users_transactions() {
        let connection = get_test_connection();
        let alice = insert_test_user(&connection, "alice");
        let bob = insert_test_user(&connection, "bobby");
        insert(alice, dec!(10), date!(2025 - 01 - 10), FOOD, &connection);
        insert(bob, dec!(500), date!(2025 - 01 - 10), FOOD, &connection);
        let range = date!(2025 - 01 - 01)..=date!(2025 - 01 - 31);

        let expense = sum_by_category_type(alice, CategoryType::Expense, &range, &connection);
        let breakdown = expenses_by_category(alice, &range, &connection).unwrap();

        assert_eq!(expense, Ok(dec!(10)));
        assert_eq!(breakdown.len(), 1);
        assert_eq!(breakdown[0].total_amount, dec!(10));
    }

    #[test]
    fn sums_many_maximum_amounts_exactly() {
        let connection = get_test_connection();
        let user_id = insert_test_user(&connection, "alice");
        for _ in 0..100 {
            insert(user_id, MAX_AMOUNT, date!(2025 - 01 - 10), FOOD, &connection);
        }
        let range = date!(2025 - 01 - 01)..=date!(2025 - 01 - 31);

        let expense = sum_by_category_type(user_id, CategoryType::Expense, &range, &connection);
        let breakdown = expenses_by_category(user_id, &range, &connection).unwrap();

        assert_eq!(expense, Ok(dec!(999999999999.00)));
        assert_eq!(breakdown[0].total_amount, dec!(999999999999.00));
    }

    #[test]
    fn reversed_range_matches_nothing() {
        let connection = get_test_connection();
        let user_id = insert_test_user(&connection, "alice");
        insert(user_id, dec!(10), date!(2025 - 01 - 10), FOOD, &connection);
        let range = date!(2025 - 01 - 31)..=date!(2025 - 01 - 01);

        let expense = sum_by_category_type(user_id, CategoryType::Expense, &range, &connection);

        assert_eq!(expense, Ok(Decimal::ZERO));
    }

    #[test]
    fn breakdown_groups_expenses_by_category_in_id_order() {
        let connection = get_test_connection();
        let user_id = insert_test_user(&connection, "alice");
        insert(user_id, dec!(5.25), date!(2025 - 01 - 03), TRANSPORT, &connection);
        insert(user_id, dec!(1200), date!(2025 - 01 - 01), RENT, &connection);
        insert(user_id, dec!(20.10), date!(2025 - 01 - 02), FOOD, &connection);
        insert(user_id, dec!(4.90), date!(2025 - 01 - 05), FOOD, &connection);
        insert(user_id, dec!(3000), date!(2025 - 01 - 01), SALARY, &connection);
        let range = date!(2025 - 01 - 01)..=date!(2025 - 01 - 31);

        let breakdown = expenses_by_category(user_id, &range, &connection).unwrap();

        assert_eq!(
            breakdown,
            vec![
                CategoryTotal {
                    category_id: FOOD,
                    category_name: "Food".to_owned(),
                    total_amount: dec!(25.00),
                },
                CategoryTotal {
                    category_id: RENT,
                    category_name: "Rent".to_owned(),
                    total_amount: dec!(1200),
                },
                CategoryTotal {
                    category_id: TRANSPORT,
                    category_name: "Transport".to_owned(),
                    total_amount: dec!(5.25),
                },
            ]
        );
    }
}

//! Categories that transactions are filed under.

mod core;
mod endpoint;

pub use core::{
    Category, CategoryType, DEFAULT_EXPENSE_CATEGORIES, DEFAULT_INCOME_CATEGORIES,
    count_categories, create_category_table, get_all_categories, get_categories_by_type,
    get_category, seed_default_categories,
};
pub use endpoint::{CategoryQuery, CategoryState, get_categories_endpoint};

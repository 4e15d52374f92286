//! Dashboard module
//!
//! Provides a summary of a user's income, expenses and balance over a date
//! range, with expenses broken down by category.

mod aggregation;
mod statistics;

pub use aggregation::{CategoryTotal, expenses_by_category, sum_by_category_type};
pub use statistics::{
    DashboardState, DashboardStatistics, StatisticsQuery, get_statistics, get_statistics_endpoint,
    month_range, resolve_date_range,
};

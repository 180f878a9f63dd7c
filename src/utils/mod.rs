// Utility functions
// Schedule arithmetic and countdown formatting

pub mod schedule;
pub mod time;

pub use schedule::{next_distribution, next_distribution_with, parse_timestamp, FrequencyUnit, MonthOverflow};
pub use time::{format_remaining, READY};

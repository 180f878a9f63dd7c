//! Recurring-distribution schedule arithmetic.
//!
//! Pure functions deriving the next distribution instant from a ticket
//! type's last-distributed timestamp and its frequency (value + unit).
//! Bad input never propagates: an absent or unparseable timestamp and an
//! unrecognized unit all degrade to "no computed schedule", logged as a
//! data-quality warning where something was actually wrong.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// The recurrence units a ticket type's frequency may use.
///
/// The wire literals are exactly `minutes | hours | days | weeks | months`;
/// anything else is rejected by [`FrequencyUnit::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrequencyUnit {
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
}

impl FrequencyUnit {
    /// Every unit, in the order configuration UIs list them.
    pub const ALL: [FrequencyUnit; 5] = [
        FrequencyUnit::Minutes,
        FrequencyUnit::Hours,
        FrequencyUnit::Days,
        FrequencyUnit::Weeks,
        FrequencyUnit::Months,
    ];

    /// The exact wire literal for this unit.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minutes => "minutes",
            Self::Hours => "hours",
            Self::Days => "days",
            Self::Weeks => "weeks",
            Self::Months => "months",
        }
    }

    /// Parse a wire literal. Returns `None` for anything outside the exact
    /// literal set; the caller decides whether that is worth a warning.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "minutes" => Some(Self::Minutes),
            "hours" => Some(Self::Hours),
            "days" => Some(Self::Days),
            "weeks" => Some(Self::Weeks),
            "months" => Some(Self::Months),
            _ => None,
        }
    }
}

impl fmt::Display for FrequencyUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FrequencyUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown frequency unit: {:?}", s))
    }
}

/// What happens when month addition lands on a day the target month does
/// not have (e.g. Jan 31 + 1 month).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonthOverflow {
    /// Let the excess days roll into the following month, the way
    /// JavaScript's `setMonth` does: Jan 31 + 1 month → Mar 2/3.
    #[default]
    Normalize,
    /// Clamp to the last day of the target month: Jan 31 + 1 month →
    /// Feb 28/29.
    Clamp,
}

/// Parse a wire timestamp: RFC 3339, or the naive
/// `YYYY-MM-DDTHH:MM:SS[.ffffff]` form the ticket API emits, read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Compute when a schedule is next due, under the default month-overflow
/// policy. See [`next_distribution_with`].
pub fn next_distribution(
    last_distributed: Option<&str>,
    value: u32,
    unit: &str,
) -> Option<DateTime<Utc>> {
    next_distribution_with(MonthOverflow::default(), last_distributed, value, unit)
}

/// Compute when a schedule is next due: `last_distributed + value` in
/// `unit`.
///
/// Returns `None` (no computed schedule, displayed as ready) when the type
/// has never been distributed, when the stored timestamp does not parse,
/// or when the unit is not one of the known literals. The latter two are
/// data-quality problems and are logged; a never-distributed type is the
/// normal initial state and is not.
pub fn next_distribution_with(
    policy: MonthOverflow,
    last_distributed: Option<&str>,
    value: u32,
    unit: &str,
) -> Option<DateTime<Utc>> {
    let raw = last_distributed?;
    let Some(start) = parse_timestamp(raw) else {
        log::warn!("Ignoring unparseable last_distributed timestamp: {:?}", raw);
        return None;
    };
    let Some(unit) = FrequencyUnit::parse(unit) else {
        log::warn!("Ignoring unknown frequency unit: {:?}", unit);
        return None;
    };
    let next = advance(start, value, unit, policy);
    if next.is_none() {
        log::warn!(
            "Schedule arithmetic overflowed for {} + {} {}",
            start,
            value,
            unit
        );
    }
    next
}

fn advance(
    start: DateTime<Utc>,
    value: u32,
    unit: FrequencyUnit,
    policy: MonthOverflow,
) -> Option<DateTime<Utc>> {
    match unit {
        FrequencyUnit::Minutes => start.checked_add_signed(Duration::minutes(i64::from(value))),
        FrequencyUnit::Hours => start.checked_add_signed(Duration::hours(i64::from(value))),
        FrequencyUnit::Days => start.checked_add_signed(Duration::days(i64::from(value))),
        FrequencyUnit::Weeks => start.checked_add_signed(Duration::days(7 * i64::from(value))),
        FrequencyUnit::Months => add_months(start, value, policy),
    }
}

fn add_months(start: DateTime<Utc>, months: u32, policy: MonthOverflow) -> Option<DateTime<Utc>> {
    match policy {
        MonthOverflow::Clamp => start.checked_add_months(Months::new(months)),
        MonthOverflow::Normalize => {
            let total = i64::from(start.year()) * 12 + i64::from(start.month0()) + i64::from(months);
            let year = i32::try_from(total.div_euclid(12)).ok()?;
            let month = total.rem_euclid(12) as u32 + 1;
            // First of the target month plus (day - 1) days lands on the
            // same day-of-month when it exists and rolls forward when it
            // does not, matching the source's field-wise normalization.
            let date = NaiveDate::from_ymd_opt(year, month, 1)?
                .checked_add_signed(Duration::days(i64::from(start.day()) - 1))?;
            Some(date.and_time(start.time()).and_utc())
        }
    }
}

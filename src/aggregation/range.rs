//! Time-range selectors
//!
//! Windows are whole calendar days, inclusive on both ends.

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;

use crate::domain::DomainError;

/// Named or explicit reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    ThisMonth,
    LastMonth,
    ThisYear,
    Custom { start: NaiveDate, end: NaiveDate },
}

impl TimeRange {
    /// Map a selector name to a range. Unrecognized names mean `ThisMonth`.
    pub fn from_selector(selector: Option<&str>) -> Self {
        match selector.map(str::trim) {
            Some("lastMonth") => TimeRange::LastMonth,
            Some("thisYear") => TimeRange::ThisYear,
            _ => TimeRange::ThisMonth,
        }
    }

    /// Build an explicit window, rejecting `start > end`.
    pub fn custom(start: NaiveDate, end: NaiveDate) -> Result<Self, DomainError> {
        if start > end {
            return Err(DomainError::InvalidRange { start, end });
        }
        Ok(TimeRange::Custom { start, end })
    }

    /// Resolve to concrete dates relative to `today`.
    pub fn window(&self, today: NaiveDate) -> DateWindow {
        match *self {
            TimeRange::ThisMonth => month_window(today),
            TimeRange::LastMonth => {
                let first = first_of_month(today);
                let in_previous = first
                    .checked_sub_months(Months::new(1))
                    .unwrap_or(first);
                month_window(in_previous)
            }
            TimeRange::ThisYear => DateWindow {
                start: NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today),
                end: NaiveDate::from_ymd_opt(today.year(), 12, 31).unwrap_or(today),
            },
            TimeRange::Custom { start, end } => DateWindow { start, end },
        }
    }
}

/// Inclusive date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn month_window(date: NaiveDate) -> DateWindow {
    let start = first_of_month(date);
    let end = start
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(start);
    DateWindow { start, end }
}

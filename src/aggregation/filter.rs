//! Ledger listing filters.

use chrono::Datelike;
use serde::Deserialize;

use crate::domain::{DomainError, Expense};

/// Optional criteria for listing entries. Absent criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ExpenseFilter {
    /// Exact category label
    pub category: Option<String>,
    /// Calendar month 1-12; requires `year`
    pub month: Option<u32>,
    pub year: Option<i32>,
    /// Case-insensitive substring of description or category
    pub search: Option<String>,
}

impl ExpenseFilter {
    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(month) = self.month {
            if !(1..=12).contains(&month) {
                return Err(DomainError::invalid_field("month", "must be between 1 and 12"));
            }
            if self.year.is_none() {
                return Err(DomainError::MissingField("year"));
            }
        }
        Ok(())
    }

    pub fn matches(&self, expense: &Expense) -> bool {
        if let Some(category) = non_blank(&self.category) {
            if expense.category != category {
                return false;
            }
        }

        if let Some(year) = self.year {
            if expense.date.year() != year {
                return false;
            }
        }

        if let Some(month) = self.month {
            if expense.date.month() != month {
                return false;
            }
        }

        if let Some(term) = non_blank(&self.search) {
            let term = term.to_lowercase();
            if !expense.description.to_lowercase().contains(&term)
                && !expense.category.to_lowercase().contains(&term)
            {
                return false;
            }
        }

        true
    }

    /// Keep matching entries, newest first.
    pub fn apply(&self, entries: Vec<Expense>) -> Vec<Expense> {
        let mut kept: Vec<Expense> = entries.into_iter().filter(|e| self.matches(e)).collect();
        sort_newest_first(&mut kept);
        kept
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Order by date descending, then by creation time descending.
pub fn sort_newest_first(entries: &mut [Expense]) {
    entries.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

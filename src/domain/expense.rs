//! Ledger entries
//!
//! An entry is either an expense or an income. The amount is always a
//! non-negative magnitude; the entry type decides its effect on a balance.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Amount, DomainError};

/// Category given to income entries recorded without one
pub const DEFAULT_INCOME_CATEGORY: &str = "Income";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    #[default]
    Expense,
    Income,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Expense => "expense",
            EntryType::Income => "income",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "expense" => Ok(EntryType::Expense),
            "income" => Ok(EntryType::Income),
            other => Err(DomainError::InvalidEntryType(other.to_string())),
        }
    }
}

/// Parse a calendar date in `YYYY-MM-DD` form.
pub fn parse_date(value: &str) -> Result<NaiveDate, DomainError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| DomainError::InvalidDate(value.to_string()))
}

/// Stored ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub amount: Amount,
    pub category: String,
    #[serde(default, alias = "desc")]
    pub description: String,
    #[serde(rename = "type", default)]
    pub kind: EntryType,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Expense {
    pub fn new(user_id: Uuid, entry: NewExpense) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            date: entry.date,
            amount: entry.amount,
            category: entry.category,
            description: entry.description,
            kind: entry.kind,
            created_at: Utc::now(),
        }
    }

    pub fn is_expense(&self) -> bool {
        self.kind == EntryType::Expense
    }

    pub fn is_income(&self) -> bool {
        self.kind == EntryType::Income
    }
}

/// Validated fields of an entry about to be recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub date: NaiveDate,
    pub amount: Amount,
    pub category: String,
    pub description: String,
    pub kind: EntryType,
}

/// Partial update of an entry. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpensePatch {
    pub date: Option<NaiveDate>,
    pub amount: Option<Amount>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub kind: Option<EntryType>,
}

impl ExpensePatch {
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.amount.is_none()
            && self.category.is_none()
            && self.description.is_none()
            && self.kind.is_none()
    }

    pub fn apply_to(&self, expense: &mut Expense) {
        if let Some(date) = self.date {
            expense.date = date;
        }
        if let Some(amount) = self.amount {
            expense.amount = amount;
        }
        if let Some(ref category) = self.category {
            expense.category = category.clone();
        }
        if let Some(ref description) = self.description {
            expense.description = description.clone();
        }
        if let Some(kind) = self.kind {
            expense.kind = kind;
        }
    }
}

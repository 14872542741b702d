//! Summary computation over a user's ledger.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::filter::sort_newest_first;
use super::range::DateWindow;
use crate::domain::{EntryType, Expense};

/// Totals for one window. Sums are exact decimal arithmetic.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub total_expenses: Decimal,
    pub total_income: Decimal,
    /// `total_income - total_expenses`; negative when overspent
    pub balance: Decimal,
    /// Expense totals per category; income is never included
    pub category_totals: BTreeMap<String, Decimal>,
    /// Entries inside the window, newest first
    pub transactions: Vec<Expense>,
}

/// Summarize the entries of `ledger` dated inside `window`.
pub fn summarize(ledger: &[Expense], window: DateWindow) -> Summary {
    let mut transactions: Vec<Expense> = ledger
        .iter()
        .filter(|e| window.contains(e.date))
        .cloned()
        .collect();
    sort_newest_first(&mut transactions);

    let mut total_expenses = Decimal::ZERO;
    let mut total_income = Decimal::ZERO;
    let mut category_totals: BTreeMap<String, Decimal> = BTreeMap::new();

    for entry in &transactions {
        let amount = entry.amount.value();
        match entry.kind {
            EntryType::Expense => {
                total_expenses += amount;
                *category_totals
                    .entry(entry.category.clone())
                    .or_insert(Decimal::ZERO) += amount;
            }
            EntryType::Income => total_income += amount,
        }
    }

    Summary {
        start: window.start,
        end: window.end,
        total_expenses,
        total_income,
        balance: total_income - total_expenses,
        category_totals,
        transactions,
    }
}

//! Report Handler
//!
//! Windowed summaries and CSV export of the authenticated user's ledger.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::aggregation::{summarize, Summary, TimeRange};
use crate::domain::expense::parse_date;
use crate::domain::DomainError;
use crate::error::AppError;
use crate::export::expenses_to_csv;
use crate::store::{LedgerStore, Storage};

use super::SummaryQuery;

impl SummaryQuery {
    /// Resolve to a range. An explicit start/end pair wins over `range`.
    pub fn time_range(&self) -> Result<TimeRange, DomainError> {
        let start = self.start.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let end = self.end.as_deref().map(str::trim).filter(|s| !s.is_empty());

        match (start, end) {
            (Some(start), Some(end)) => TimeRange::custom(parse_date(start)?, parse_date(end)?),
            (Some(_), None) => Err(DomainError::MissingField("end")),
            (None, Some(_)) => Err(DomainError::MissingField("start")),
            (None, None) => Ok(TimeRange::from_selector(self.range.as_deref())),
        }
    }
}

/// Handler for reports
pub struct ReportHandler {
    store: Arc<dyn Storage>,
}

impl ReportHandler {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self { store }
    }

    /// Summary for the window selected by `query`, relative to today (UTC).
    pub async fn summary(&self, user_id: Uuid, query: &SummaryQuery) -> Result<Summary, AppError> {
        self.summary_on(user_id, query, Utc::now().date_naive()).await
    }

    pub async fn summary_on(
        &self,
        user_id: Uuid,
        query: &SummaryQuery,
        today: NaiveDate,
    ) -> Result<Summary, AppError> {
        let window = query.time_range()?.window(today);
        let ledger = self.store.list_expenses_for_user(user_id).await?;

        tracing::debug!(
            user_id = %user_id,
            start = %window.start,
            end = %window.end,
            entries = ledger.len(),
            "Computing summary"
        );

        Ok(summarize(&ledger, window))
    }

    /// All owned entries as CSV text.
    pub async fn export_csv(&self, user_id: Uuid) -> Result<String, AppError> {
        let ledger = self.store.list_expenses_for_user(user_id).await?;
        tracing::debug!(user_id = %user_id, rows = ledger.len(), "Exporting ledger");
        Ok(expenses_to_csv(&ledger))
    }
}

//! Expense Handler
//!
//! Ledger CRUD for the authenticated user. Every store call carries the
//! caller's user id, so a foreign entry id behaves exactly like an unknown
//! one.

use std::sync::Arc;

use uuid::Uuid;

use crate::aggregation::ExpenseFilter;
use crate::domain::amount::amount_from_json;
use crate::domain::expense::{parse_date, DEFAULT_INCOME_CATEGORY};
use crate::domain::{
    DomainError, EntryType, Expense, ExpensePatch, NewExpense, OperationContext,
};
use crate::error::AppError;
use crate::store::{LedgerStore, Storage};

use super::{AddExpenseCommand, DeleteResult, EditExpenseCommand};

/// Parse an entry id taken from the path. Garbage ids cannot name an entry.
pub fn parse_entry_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::NotFound("Expense"))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn present_json(value: Option<serde_json::Value>) -> Option<serde_json::Value> {
    value.filter(|v| !matches!(v, serde_json::Value::String(s) if s.trim().is_empty()))
}

impl AddExpenseCommand {
    /// Validate into a new entry.
    pub fn validate(self) -> Result<NewExpense, DomainError> {
        let date = non_blank(self.date).ok_or(DomainError::MissingField("date"))?;
        let date = parse_date(&date)?;

        let amount = present_json(self.amount).ok_or(DomainError::MissingField("amount"))?;
        let amount = amount_from_json(&amount)?;

        let kind = match non_blank(self.kind) {
            Some(kind) => kind.parse::<EntryType>()?,
            None => EntryType::default(),
        };

        let category = match (non_blank(self.category), kind) {
            (Some(category), _) => category.trim().to_string(),
            (None, EntryType::Income) => DEFAULT_INCOME_CATEGORY.to_string(),
            (None, EntryType::Expense) => return Err(DomainError::MissingField("category")),
        };

        Ok(NewExpense {
            date,
            amount,
            category,
            description: self.description.unwrap_or_default(),
            kind,
        })
    }
}

impl EditExpenseCommand {
    /// Validate into a patch holding only the supplied fields.
    pub fn validate(self) -> Result<ExpensePatch, DomainError> {
        let date = non_blank(self.date).map(|d| parse_date(&d)).transpose()?;
        let amount = present_json(self.amount)
            .map(|a| amount_from_json(&a))
            .transpose()?;
        let kind = non_blank(self.kind)
            .map(|k| k.parse::<EntryType>())
            .transpose()?;

        Ok(ExpensePatch {
            date,
            amount,
            category: non_blank(self.category).map(|c| c.trim().to_string()),
            description: non_blank(self.description),
            kind,
        })
    }
}

/// Handler for ledger entries
pub struct ExpenseHandler {
    store: Arc<dyn Storage>,
}

impl ExpenseHandler {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self { store }
    }

    /// Owned entries matching `filter`, newest first.
    pub async fn list(&self, user_id: Uuid, filter: &ExpenseFilter) -> Result<Vec<Expense>, AppError> {
        filter.validate()?;
        let entries = self.store.list_expenses_for_user(user_id).await?;
        Ok(filter.apply(entries))
    }

    pub async fn add(
        &self,
        user_id: Uuid,
        command: AddExpenseCommand,
        context: &OperationContext,
    ) -> Result<Expense, AppError> {
        let entry = command.validate()?;
        let expense = Expense::new(user_id, entry);

        self.store.insert_expense(&expense).await?;

        tracing::info!(
            user_id = %user_id,
            expense_id = %expense.id,
            kind = %expense.kind,
            correlation_id = ?context.correlation_id,
            "Entry recorded"
        );

        Ok(expense)
    }

    pub async fn edit(
        &self,
        user_id: Uuid,
        expense_id: &str,
        command: EditExpenseCommand,
        context: &OperationContext,
    ) -> Result<Expense, AppError> {
        let id = parse_entry_id(expense_id)?;
        // Validate before touching the store so a bad field changes nothing.
        let patch = command.validate()?;

        let updated = self
            .store
            .update_expense(user_id, id, &patch)
            .await?
            .ok_or(AppError::NotFound("Expense"))?;

        tracing::info!(
            user_id = %user_id,
            expense_id = %id,
            correlation_id = ?context.correlation_id,
            "Entry updated"
        );

        Ok(updated)
    }

    pub async fn delete(
        &self,
        user_id: Uuid,
        expense_id: &str,
        context: &OperationContext,
    ) -> Result<DeleteResult, AppError> {
        let id = parse_entry_id(expense_id)?;

        if !self.store.delete_expense(user_id, id).await? {
            return Err(AppError::NotFound("Expense"));
        }

        tracing::info!(
            user_id = %user_id,
            expense_id = %id,
            correlation_id = ?context.correlation_id,
            "Entry deleted"
        );

        Ok(DeleteResult { ok: true, id })
    }
}

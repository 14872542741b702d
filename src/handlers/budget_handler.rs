//! Budget Handler
//!
//! Budgets are advisory. Nothing here compares them with spending.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{Budgets, BudgetsUpdate, OperationContext};
use crate::error::AppError;
use crate::store::{CredentialStore, Storage};

use super::{ProfileHandler, UpdateBudgetsCommand};

/// Handler for budget reads and updates
pub struct BudgetHandler {
    store: Arc<dyn Storage>,
}

impl BudgetHandler {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self { store }
    }

    pub async fn get(&self, user_id: Uuid) -> Result<Budgets, AppError> {
        let user = ProfileHandler::load_user(self.store.as_ref(), user_id).await?;
        Ok(user.budgets)
    }

    /// Apply the supplied fields; absent fields keep their stored value.
    pub async fn update(
        &self,
        user_id: Uuid,
        command: UpdateBudgetsCommand,
        context: &OperationContext,
    ) -> Result<Budgets, AppError> {
        let update = BudgetsUpdate::from_json(
            command.monthly_budget.as_ref(),
            command.category_budgets.as_ref(),
        );

        let budgets = self.store.update_budgets(user_id, &update).await?;

        tracing::info!(
            user_id = %user_id,
            categories = budgets.category_budgets.len(),
            correlation_id = ?context.correlation_id,
            "Budgets updated"
        );

        Ok(budgets)
    }
}

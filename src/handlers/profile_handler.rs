//! Profile Handler
//!
//! Reads and updates the authenticated user's own record.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{error::require, OperationContext, PublicUser, User};
use crate::error::AppError;
use crate::store::{CredentialStore, Storage};

use super::UpdateProfileCommand;

/// Handler for profile reads and updates
pub struct ProfileHandler {
    store: Arc<dyn Storage>,
}

impl ProfileHandler {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self { store }
    }

    /// Load a user record; a verified token for a vanished user is `NotFound`.
    pub(crate) async fn load_user(store: &dyn Storage, user_id: Uuid) -> Result<User, AppError> {
        store
            .find_user_by_id(user_id)
            .await?
            .ok_or(AppError::NotFound("User"))
    }

    pub async fn get(&self, user_id: Uuid) -> Result<PublicUser, AppError> {
        let user = Self::load_user(self.store.as_ref(), user_id).await?;
        Ok(user.public())
    }

    /// Replace name and email. Fails with `DuplicateEmail` if another user
    /// already has the new email.
    pub async fn update(
        &self,
        user_id: Uuid,
        command: UpdateProfileCommand,
        context: &OperationContext,
    ) -> Result<PublicUser, AppError> {
        let name = require("name", command.name.as_deref())?;
        let email = require("email", command.email.as_deref())?;

        let user = self.store.update_profile(user_id, &name, &email).await?;

        tracing::info!(
            user_id = %user.id,
            correlation_id = ?context.correlation_id,
            "Profile updated"
        );

        Ok(user.public())
    }
}

//! Authentication Handlers
//!
//! Signup and login. Both end by issuing a session token for the user.

use std::sync::Arc;

use crate::auth::{Identity, PasswordHasher, TokenAuthority};
use crate::domain::{error::require, DomainError, OperationContext, User};
use crate::error::AppError;
use crate::store::{CredentialStore, Storage};

use super::{AuthResult, LoginCommand, SignupCommand};

fn issue_for(tokens: &TokenAuthority, user: &User) -> Result<AuthResult, AppError> {
    let token = tokens.issue(&Identity {
        user_id: user.id,
        email: user.email.clone(),
        name: user.name.clone(),
    })?;

    Ok(AuthResult {
        user: user.public(),
        token,
    })
}

/// Passwords are taken as given; surrounding whitespace is significant.
fn require_password(password: Option<String>) -> Result<String, DomainError> {
    match password {
        Some(p) if !p.is_empty() => Ok(p),
        _ => Err(DomainError::MissingField("password")),
    }
}

// =========================================================================
// SignupHandler
// =========================================================================

/// Handler for user registration
pub struct SignupHandler {
    store: Arc<dyn Storage>,
    passwords: PasswordHasher,
    tokens: TokenAuthority,
}

impl SignupHandler {
    pub fn new(store: Arc<dyn Storage>, passwords: PasswordHasher, tokens: TokenAuthority) -> Self {
        Self {
            store,
            passwords,
            tokens,
        }
    }

    /// Execute the signup command
    pub async fn execute(
        &self,
        command: SignupCommand,
        context: &OperationContext,
    ) -> Result<AuthResult, AppError> {
        let name = require("name", command.name.as_deref())?;
        let email = require("email", command.email.as_deref())?;
        let password = require_password(command.password)?;

        // Early exit before paying for a hash; the store re-checks on insert.
        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::DuplicateEmail);
        }

        let password_hash = self.passwords.hash(&password).await?;
        let user = User::new(name, email, password_hash);
        self.store.insert_user(&user).await?;

        tracing::info!(
            user_id = %user.id,
            correlation_id = ?context.correlation_id,
            "User registered"
        );

        issue_for(&self.tokens, &user)
    }
}

// =========================================================================
// LoginHandler
// =========================================================================

/// Handler for credential login
pub struct LoginHandler {
    store: Arc<dyn Storage>,
    passwords: PasswordHasher,
    tokens: TokenAuthority,
}

impl LoginHandler {
    pub fn new(store: Arc<dyn Storage>, passwords: PasswordHasher, tokens: TokenAuthority) -> Self {
        Self {
            store,
            passwords,
            tokens,
        }
    }

    /// Execute the login command.
    ///
    /// Unknown email and wrong password both end in `InvalidCredentials`.
    pub async fn execute(
        &self,
        command: LoginCommand,
        context: &OperationContext,
    ) -> Result<AuthResult, AppError> {
        let email = require("email", command.email.as_deref())?;
        let password = require_password(command.password)?;

        let user = match self.store.find_user_by_email(&email).await? {
            Some(user) => user,
            None => {
                self.passwords.verify_dummy(&password).await?;
                tracing::debug!(correlation_id = ?context.correlation_id, "Login for unknown email");
                return Err(AppError::InvalidCredentials);
            }
        };

        if !self.passwords.verify(&password, &user.password_hash).await? {
            tracing::debug!(
                user_id = %user.id,
                correlation_id = ?context.correlation_id,
                "Login with wrong password"
            );
            return Err(AppError::InvalidCredentials);
        }

        tracing::info!(
            user_id = %user.id,
            correlation_id = ?context.correlation_id,
            "User logged in"
        );

        issue_for(&self.tokens, &user)
    }
}

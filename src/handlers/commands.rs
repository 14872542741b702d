//! Command definitions
//!
//! Commands carry client input, still unvalidated, into the handlers.
//! Results are what the handlers hand back to the API layer.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::PublicUser;

// =========================================================================
// Authentication
// =========================================================================

/// Command to register a new user
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignupCommand {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl SignupCommand {
    pub fn new(name: &str, email: &str, password: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        }
    }
}

/// Command to exchange credentials for a session token
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginCommand {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl LoginCommand {
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        }
    }
}

/// Result of a successful signup or login
#[derive(Debug, Clone, Serialize)]
pub struct AuthResult {
    pub user: PublicUser,
    pub token: String,
}

// =========================================================================
// Profile
// =========================================================================

/// Command to replace a user's name and email
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileCommand {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl UpdateProfileCommand {
    pub fn new(name: &str, email: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
        }
    }
}

// =========================================================================
// Ledger
// =========================================================================

/// Command to record a ledger entry.
///
/// `amount` is kept as raw JSON so both `50` and `"50.00"` are accepted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddExpenseCommand {
    pub date: Option<String>,
    pub amount: Option<serde_json::Value>,
    pub category: Option<String>,
    #[serde(alias = "desc")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Command to change some fields of an owned entry.
///
/// Absent or blank fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditExpenseCommand {
    pub date: Option<String>,
    pub amount: Option<serde_json::Value>,
    pub category: Option<String>,
    #[serde(alias = "desc")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Result of a successful delete
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResult {
    pub ok: bool,
    pub id: Uuid,
}

// =========================================================================
// Budgets
// =========================================================================

/// Command to change budgets. Values stay raw JSON; non-numeric entries are
/// normalized by the handler rather than rejected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBudgetsCommand {
    pub monthly_budget: Option<serde_json::Value>,
    pub category_budgets: Option<serde_json::Value>,
}

// =========================================================================
// Reports
// =========================================================================

/// Window selection for a summary: a named range, or an explicit start/end.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummaryQuery {
    pub range: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

//! User and budget types
//!
//! A user owns credentials, profile fields and the advisory budgets that are
//! compared against ledger summaries by clients.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::amount::decimal_from_json;

/// Stored user record.
///
/// `password_hash` is persisted but never leaves the server: responses use
/// [`PublicUser`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default)]
    pub budgets: Budgets,
}

impl User {
    pub fn new(name: String, email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            created_at: Utc::now(),
            avatar: None,
            budgets: Budgets::default(),
        }
    }

    /// Case-insensitive email comparison
    pub fn has_email(&self, email: &str) -> bool {
        normalize_email(&self.email) == normalize_email(email)
    }

    pub fn public(&self) -> PublicUser {
        PublicUser::from(self)
    }
}

/// Canonical form used for email uniqueness checks.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// User as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            avatar: user.avatar.clone(),
            created_at: user.created_at,
        }
    }
}

// =========================================================================
// Budgets
// =========================================================================

/// Advisory spending limits.
///
/// Always serialized in the normalized shape: `monthlyBudget` is present
/// (0 when never set) and `categoryBudgets` is an object (empty when never
/// set). Values are emitted as JSON numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budgets {
    #[serde(default, with = "rust_decimal::serde::float")]
    pub monthly_budget: Decimal,
    #[serde(default, with = "float_map")]
    pub category_budgets: BTreeMap<String, Decimal>,
}

/// Partial budget update built from loosely typed client input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BudgetsUpdate {
    pub monthly_budget: Option<Decimal>,
    pub category_budgets: Option<BTreeMap<String, Decimal>>,
}

impl BudgetsUpdate {
    /// Normalize raw JSON values.
    ///
    /// A non-numeric `monthly` becomes 0. Non-numeric category values are
    /// dropped; a `categories` value that is not an object clears the map.
    pub fn from_json(
        monthly: Option<&serde_json::Value>,
        categories: Option<&serde_json::Value>,
    ) -> Self {
        let monthly_budget = monthly.map(|v| decimal_from_json(v).unwrap_or(Decimal::ZERO));

        let category_budgets = categories.map(|v| match v {
            serde_json::Value::Object(map) => map
                .iter()
                .filter_map(|(k, v)| decimal_from_json(v).map(|d| (k.clone(), d)))
                .collect(),
            _ => BTreeMap::new(),
        });

        Self {
            monthly_budget,
            category_budgets,
        }
    }

    pub fn apply_to(&self, budgets: &mut Budgets) {
        if let Some(monthly) = self.monthly_budget {
            budgets.monthly_budget = monthly;
        }
        if let Some(ref categories) = self.category_budgets {
            budgets.category_budgets = categories.clone();
        }
    }
}

mod float_map {
    use std::collections::BTreeMap;

    use rust_decimal::prelude::ToPrimitive;
    use rust_decimal::Decimal;
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(map: &BTreeMap<String, Decimal>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut out = serializer.serialize_map(Some(map.len()))?;
        for (category, limit) in map {
            out.serialize_entry(category, &limit.to_f64().unwrap_or_default())?;
        }
        out.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<String, Decimal>, D::Error>
    where
        D: Deserializer<'de>,
    {
        BTreeMap::<String, Decimal>::deserialize(deserializer)
    }
}

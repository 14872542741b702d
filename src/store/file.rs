//! File-backed store
//!
//! One JSON document holds both collections:
//! `{"users": [...], "expenses": [...]}`.
//!
//! Writers are serialized through a single async mutex: each mutation reads
//! the current document, applies its change and writes the whole document
//! to a temporary file that is then renamed over the original. Readers never
//! observe a half-written document.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{CredentialStore, LedgerStore, Storage, StoreError, StoreResult};
use crate::domain::{normalize_email, Budgets, BudgetsUpdate, Expense, ExpensePatch, User};

/// On-disk shape. Expenses stay raw until [`Document::from_raw`] sorts out
/// the ones that no longer decode.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RawDocument {
    #[serde(default)]
    users: Vec<User>,
    #[serde(default)]
    expenses: Vec<serde_json::Value>,
}

/// An expense record that does not decode, e.g. a `null` amount or a
/// free-form date written by an older version. It is kept verbatim and
/// written back on every save, but never served.
#[derive(Debug, Clone)]
struct UnreadableExpense {
    raw: serde_json::Value,
    reason: String,
}

#[derive(Debug, Default)]
struct Document {
    users: Vec<User>,
    expenses: Vec<Expense>,
    unreadable: Vec<UnreadableExpense>,
}

impl Document {
    fn from_raw(raw: RawDocument) -> Self {
        let mut expenses = Vec::with_capacity(raw.expenses.len());
        let mut unreadable = Vec::new();

        for value in raw.expenses {
            match Expense::deserialize(&value) {
                Ok(expense) => expenses.push(expense),
                Err(e) => unreadable.push(UnreadableExpense {
                    raw: value,
                    reason: e.to_string(),
                }),
            }
        }

        Self {
            users: raw.users,
            expenses,
            unreadable,
        }
    }

    fn to_raw(&self) -> StoreResult<RawDocument> {
        let mut expenses = self
            .expenses
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        expenses.extend(self.unreadable.iter().map(|u| u.raw.clone()));

        Ok(RawDocument {
            users: self.users.clone(),
            expenses,
        })
    }

    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        let wanted = normalize_email(email);
        self.users
            .iter()
            .any(|u| Some(u.id) != except && normalize_email(&u.email) == wanted)
    }

    fn user_mut(&mut self, id: Uuid) -> StoreResult<&mut User> {
        self.users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(StoreError::UserNotFound(id))
    }
}

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open the store, creating an empty document if the file is missing.
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        };

        if tokio::fs::try_exists(&store.path).await? {
            // Fail at startup rather than on the first request
            let document = store.load().await?;
            for entry in &document.unreadable {
                tracing::warn!(
                    path = %store.path.display(),
                    id = %entry.raw.get("id").unwrap_or(&serde_json::Value::Null),
                    reason = %entry.reason,
                    "Skipping unreadable expense record"
                );
            }
        } else {
            if let Some(parent) = store.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            store.save(&Document::default()).await?;
            tracing::info!(path = %store.path.display(), "Created empty data file");
        }

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> StoreResult<Document> {
        let bytes = tokio::fs::read(&self.path).await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Document::default());
        }
        let raw: RawDocument = serde_json::from_slice(&bytes)?;
        Ok(Document::from_raw(raw))
    }

    async fn save(&self, document: &Document) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(&document.to_raw()?)?;
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Run `change` against the current document under the writer lock.
    ///
    /// `change` returns its output and whether the document was modified;
    /// unmodified documents are not rewritten.
    async fn mutate<T, F>(&self, change: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Document) -> StoreResult<(T, bool)> + Send,
        T: Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut document = self.load().await?;
        let (output, modified) = change(&mut document)?;
        if modified {
            self.save(&document).await?;
        }
        Ok(output)
    }
}

#[async_trait]
impl CredentialStore for JsonFileStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let document = self.load().await?;
        Ok(document.users.into_iter().find(|u| u.has_email(email)))
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let document = self.load().await?;
        Ok(document.users.into_iter().find(|u| u.id == id))
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        self.mutate(|document| {
            if document.email_taken(&user.email, None) {
                return Err(StoreError::DuplicateEmail);
            }
            document.users.push(user.clone());
            Ok(((), true))
        })
        .await
    }

    async fn update_user(&self, user: &User) -> StoreResult<()> {
        self.mutate(|document| {
            if document.email_taken(&user.email, Some(user.id)) {
                return Err(StoreError::DuplicateEmail);
            }
            *document.user_mut(user.id)? = user.clone();
            Ok(((), true))
        })
        .await
    }

    async fn update_profile(&self, user_id: Uuid, name: &str, email: &str) -> StoreResult<User> {
        self.mutate(|document| {
            if document.email_taken(email, Some(user_id)) {
                return Err(StoreError::DuplicateEmail);
            }
            let user = document.user_mut(user_id)?;
            user.name = name.to_string();
            user.email = email.to_string();
            Ok((user.clone(), true))
        })
        .await
    }

    async fn update_budgets(
        &self,
        user_id: Uuid,
        update: &BudgetsUpdate,
    ) -> StoreResult<Budgets> {
        self.mutate(|document| {
            let user = document.user_mut(user_id)?;
            update.apply_to(&mut user.budgets);
            Ok((user.budgets.clone(), true))
        })
        .await
    }
}

#[async_trait]
impl LedgerStore for JsonFileStore {
    async fn list_expenses_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Expense>> {
        let document = self.load().await?;
        Ok(document
            .expenses
            .into_iter()
            .filter(|e| e.user_id == user_id)
            .collect())
    }

    async fn find_expense(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<Expense>> {
        let document = self.load().await?;
        Ok(document
            .expenses
            .into_iter()
            .find(|e| e.id == id && e.user_id == user_id))
    }

    async fn insert_expense(&self, expense: &Expense) -> StoreResult<()> {
        self.mutate(|document| {
            document.expenses.push(expense.clone());
            Ok(((), true))
        })
        .await
    }

    async fn update_expense(
        &self,
        user_id: Uuid,
        id: Uuid,
        patch: &ExpensePatch,
    ) -> StoreResult<Option<Expense>> {
        self.mutate(|document| {
            let Some(expense) = document
                .expenses
                .iter_mut()
                .find(|e| e.id == id && e.user_id == user_id)
            else {
                return Ok((None, false));
            };
            patch.apply_to(expense);
            Ok((Some(expense.clone()), !patch.is_empty()))
        })
        .await
    }

    async fn delete_expense(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool> {
        self.mutate(|document| {
            let before = document.expenses.len();
            document
                .expenses
                .retain(|e| !(e.id == id && e.user_id == user_id));
            let removed = document.expenses.len() != before;
            Ok((removed, removed))
        })
        .await
    }
}

impl Storage for JsonFileStore {
    fn backend(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EntryType, NewExpense};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    async fn temp_store() -> (tempfile::TempDir, JsonFileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("data.json")).await.unwrap();
        (dir, store)
    }

    fn user(email: &str) -> User {
        User::new("Test".to_string(), email.to_string(), "hash".to_string())
    }

    fn entry(user_id: Uuid, amount: &str) -> Expense {
        Expense::new(
            user_id,
            NewExpense {
                date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                amount: amount.parse().unwrap(),
                category: "food".to_string(),
                description: String::new(),
                kind: EntryType::Expense,
            },
        )
    }

    #[tokio::test]
    async fn test_open_creates_empty_document() {
        let (_dir, store) = temp_store().await;
        let raw = tokio::fs::read_to_string(store.path()).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();

        assert_eq!(value["users"], serde_json::json!([]));
        assert_eq!(value["expenses"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_open_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        tokio::fs::write(&path, "{not json").await.unwrap();

        let result = JsonFileStore::open(&path).await;
        assert!(matches!(result, Err(StoreError::Decode(_))));
    }

    #[tokio::test]
    async fn test_insert_user_rejects_duplicate_email() {
        let (_dir, store) = temp_store().await;
        store.insert_user(&user("ada@example.com")).await.unwrap();

        let result = store.insert_user(&user("ADA@example.com")).await;
        assert!(matches!(result, Err(StoreError::DuplicateEmail)));

        let found = store.find_user_by_email("Ada@Example.Com").await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_update_profile_email_collision() {
        let (_dir, store) = temp_store().await;
        let ada = user("ada@example.com");
        let bob = user("bob@example.com");
        store.insert_user(&ada).await.unwrap();
        store.insert_user(&bob).await.unwrap();

        assert!(matches!(
            store.update_profile(bob.id, "Bob", "Ada@example.com").await,
            Err(StoreError::DuplicateEmail)
        ));

        // Changing only the case of your own email is fine
        let updated = store
            .update_profile(ada.id, "Ada", "ADA@example.com")
            .await
            .unwrap();
        assert_eq!(updated.email, "ADA@example.com");
        let stored = store.find_user_by_id(ada.id).await.unwrap().unwrap();
        assert_eq!(stored.email, "ADA@example.com");
        assert_eq!(stored.password_hash, ada.password_hash);
    }

    #[tokio::test]
    async fn test_update_user_replaces_record() {
        let (_dir, store) = temp_store().await;
        let mut ada = user("ada@example.com");
        let bob = user("bob@example.com");
        store.insert_user(&ada).await.unwrap();
        store.insert_user(&bob).await.unwrap();

        ada.avatar = Some("ada.png".to_string());
        ada.budgets.monthly_budget = Decimal::from(300);
        store.update_user(&ada).await.unwrap();
        assert_eq!(store.find_user_by_id(ada.id).await.unwrap(), Some(ada.clone()));

        ada.email = "BOB@example.com".to_string();
        assert!(matches!(
            store.update_user(&ada).await,
            Err(StoreError::DuplicateEmail)
        ));

        let ghost = user("ghost@example.com");
        assert!(matches!(
            store.update_user(&ghost).await,
            Err(StoreError::UserNotFound(id)) if id == ghost.id
        ));
    }

    #[tokio::test]
    async fn test_update_unknown_user() {
        let (_dir, store) = temp_store().await;
        let ghost = Uuid::new_v4();
        assert!(matches!(
            store.update_profile(ghost, "Ghost", "ghost@example.com").await,
            Err(StoreError::UserNotFound(id)) if id == ghost
        ));
        assert!(matches!(
            store.update_budgets(ghost, &BudgetsUpdate::default()).await,
            Err(StoreError::UserNotFound(id)) if id == ghost
        ));
    }

    #[tokio::test]
    async fn test_concurrent_budget_and_profile_updates_all_land() {
        let (_dir, store) = temp_store().await;
        let store = Arc::new(store);
        let ada = user("ada@example.com");
        store.insert_user(&ada).await.unwrap();
        let id = ada.id;

        for round in 0..50u32 {
            let monthly = BudgetsUpdate {
                monthly_budget: Some(Decimal::from(round)),
                category_budgets: None,
            };
            let categories = BudgetsUpdate {
                monthly_budget: None,
                category_budgets: Some(BTreeMap::from([(
                    "Food".to_string(),
                    Decimal::from(round),
                )])),
            };
            let name = format!("Ada {round}");

            let (a, b, c) = tokio::join!(
                tokio::spawn({
                    let store = Arc::clone(&store);
                    async move { store.update_budgets(id, &monthly).await }
                }),
                tokio::spawn({
                    let store = Arc::clone(&store);
                    async move { store.update_budgets(id, &categories).await }
                }),
                tokio::spawn({
                    let store = Arc::clone(&store);
                    async move { store.update_profile(id, &name, "ada@example.com").await }
                }),
            );
            a.unwrap().unwrap();
            b.unwrap().unwrap();
            c.unwrap().unwrap();

            let stored = store.find_user_by_id(id).await.unwrap().unwrap();
            assert_eq!(stored.budgets.monthly_budget, Decimal::from(round));
            assert_eq!(stored.budgets.category_budgets["Food"], Decimal::from(round));
            assert_eq!(stored.name, format!("Ada {round}"));
        }
    }

    #[tokio::test]
    async fn test_ledger_is_scoped_to_owner() {
        let (_dir, store) = temp_store().await;
        let owner = Uuid::new_v4();
        let intruder = Uuid::new_v4();
        let expense = entry(owner, "12.00");
        store.insert_expense(&expense).await.unwrap();

        assert!(store.list_expenses_for_user(intruder).await.unwrap().is_empty());
        assert!(store.find_expense(intruder, expense.id).await.unwrap().is_none());

        let patch = ExpensePatch {
            category: Some("stolen".to_string()),
            ..Default::default()
        };
        assert!(store
            .update_expense(intruder, expense.id, &patch)
            .await
            .unwrap()
            .is_none());
        assert!(!store.delete_expense(intruder, expense.id).await.unwrap());

        let untouched = store.find_expense(owner, expense.id).await.unwrap().unwrap();
        assert_eq!(untouched, expense);
    }

    #[tokio::test]
    async fn test_update_and_delete_expense() {
        let (_dir, store) = temp_store().await;
        let owner = Uuid::new_v4();
        let expense = entry(owner, "12.00");
        store.insert_expense(&expense).await.unwrap();

        let patch = ExpensePatch {
            amount: Some("20.5".parse().unwrap()),
            ..Default::default()
        };
        let updated = store
            .update_expense(owner, expense.id, &patch)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.amount.to_string(), "20.5");
        assert_eq!(updated.category, "food");

        assert!(store.delete_expense(owner, expense.id).await.unwrap());
        assert!(store.list_expenses_for_user(owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        let ada = user("ada@example.com");
        {
            let store = JsonFileStore::open(&path).await.unwrap();
            store.insert_user(&ada).await.unwrap();
            store.insert_expense(&entry(ada.id, "1.10")).await.unwrap();
        }

        let store = JsonFileStore::open(&path).await.unwrap();
        assert_eq!(store.find_user_by_id(ada.id).await.unwrap(), Some(ada.clone()));
        assert_eq!(store.list_expenses_for_user(ada.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_writers_do_not_lose_updates() {
        let (_dir, store) = temp_store().await;
        let store = Arc::new(store);
        let owner = Uuid::new_v4();

        let mut tasks = Vec::new();
        for _ in 0..20 {
            let store = Arc::clone(&store);
            tasks.push(tokio::spawn(async move {
                store.insert_expense(&entry(owner, "1")).await.unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(store.list_expenses_for_user(owner).await.unwrap().len(), 20);
    }

    #[tokio::test]
    async fn test_loads_legacy_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        let legacy = serde_json::json!({
            "users": [{
                "id": "5b0a1b0e-6f3c-4b64-9d3c-2f9f0d7b8a11",
                "name": "Old",
                "email": "old@example.com",
                "passwordHash": "$2a$10$abcdefghijklmnopqrstuu",
                "createdAt": "2024-01-01T00:00:00.000Z"
            }],
            "expenses": [{
                "id": "0b8f1a4e-3c5e-4a55-9b8e-0e1f2a3b4c5d",
                "userId": "5b0a1b0e-6f3c-4b64-9d3c-2f9f0d7b8a11",
                "date": "2024-01-01",
                "amount": 10.5,
                "category": "food",
                "desc": "lunch",
                "createdAt": "2024-01-01T12:00:00.000Z"
            }]
        });
        tokio::fs::write(&path, serde_json::to_vec(&legacy).unwrap())
            .await
            .unwrap();

        let store = JsonFileStore::open(&path).await.unwrap();
        let owner: Uuid = "5b0a1b0e-6f3c-4b64-9d3c-2f9f0d7b8a11".parse().unwrap();
        let expenses = store.list_expenses_for_user(owner).await.unwrap();

        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].description, "lunch");
        assert_eq!(expenses[0].kind, EntryType::Expense);
    }

    #[tokio::test]
    async fn test_unreadable_legacy_expenses_are_kept_but_not_served() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        let owner = "5b0a1b0e-6f3c-4b64-9d3c-2f9f0d7b8a11";
        let legacy = serde_json::json!({
            "users": [],
            "expenses": [
                {
                    "id": "0b8f1a4e-3c5e-4a55-9b8e-0e1f2a3b4c5d",
                    "userId": owner,
                    "date": "2024-01-01",
                    "amount": 10.5,
                    "category": "food",
                    "desc": "lunch"
                },
                { "id": "11111111-1111-4111-8111-111111111111", "userId": owner, "date": "2024-01-02", "amount": null, "category": "food" },
                { "id": "22222222-2222-4222-8222-222222222222", "userId": owner, "date": "2024-01-03", "amount": -5, "category": "food" },
                { "id": "33333333-3333-4333-8333-333333333333", "userId": owner, "date": "last tuesday", "amount": 3, "category": "food" }
            ]
        });
        tokio::fs::write(&path, serde_json::to_vec(&legacy).unwrap())
            .await
            .unwrap();

        let store = JsonFileStore::open(&path).await.unwrap();
        let owner: Uuid = owner.parse().unwrap();
        assert_eq!(store.list_expenses_for_user(owner).await.unwrap().len(), 1);

        // A write keeps the unreadable records on disk
        store.insert_expense(&entry(owner, "2")).await.unwrap();
        let raw: serde_json::Value =
            serde_json::from_slice(&tokio::fs::read(&path).await.unwrap()).unwrap();
        let ids: Vec<&str> = raw["expenses"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|e| e["id"].as_str())
            .collect();
        assert_eq!(ids.len(), 5);
        assert!(ids.contains(&"11111111-1111-4111-8111-111111111111"));
        assert!(ids.contains(&"33333333-3333-4333-8333-333333333333"));
        assert_eq!(store.list_expenses_for_user(owner).await.unwrap().len(), 2);
    }
}

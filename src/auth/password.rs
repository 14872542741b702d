//! Password hashing.
//!
//! bcrypt is CPU bound, so hashing and verification run on the blocking
//! thread pool.

use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Password task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Hashes and verifies passwords with a fixed bcrypt cost.
#[derive(Clone)]
pub struct PasswordHasher {
    cost: u32,
    /// Hash compared against when the account does not exist, so an unknown
    /// email costs as much as a wrong password.
    dummy_hash: Arc<str>,
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("cost", &self.cost)
            .finish_non_exhaustive()
    }
}

impl PasswordHasher {
    /// Build a hasher. Fails if `cost` is outside bcrypt's 4..=31.
    pub fn new(cost: u32) -> Result<Self, PasswordError> {
        let dummy_hash = bcrypt::hash("finance-tracker-dummy-password", cost)?;
        Ok(Self {
            cost,
            dummy_hash: dummy_hash.into(),
        })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub async fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let password = password.to_owned();
        let cost = self.cost;
        let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
        Ok(hash)
    }

    /// Returns `Ok(false)` on mismatch, and also when the stored hash is not
    /// a bcrypt hash at all.
    pub async fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let password = password.to_owned();
        let hash = hash.to_owned();
        let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await?;

        match outcome {
            Ok(matches) => Ok(matches),
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash is unreadable");
                Ok(false)
            }
        }
    }

    /// Burn one verification for a login against an unknown account.
    pub async fn verify_dummy(&self, password: &str) -> Result<(), PasswordError> {
        let dummy = self.dummy_hash.to_string();
        self.verify(password, &dummy).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hasher = PasswordHasher::new(4).unwrap();
        let hash = hasher.hash("TestPass123!").await.unwrap();

        assert_ne!(hash, "TestPass123!");
        assert!(hash.starts_with("$2"));
        assert!(hasher.verify("TestPass123!", &hash).await.unwrap());
        assert!(!hasher.verify("wrong", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_unreadable_hash_is_a_mismatch() {
        let hasher = PasswordHasher::new(4).unwrap();
        assert!(!hasher.verify("anything", "plaintext").await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_dummy_succeeds() {
        let hasher = PasswordHasher::new(4).unwrap();
        assert!(hasher.verify_dummy("whatever").await.is_ok());
    }

    #[test]
    fn test_invalid_cost_rejected() {
        assert!(PasswordHasher::new(2).is_err());
        assert!(PasswordHasher::new(40).is_err());
    }
}

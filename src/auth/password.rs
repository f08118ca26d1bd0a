use crate::core::errors::ExpenseError;
use tokio::task;

/// bcrypt hashing with a configurable work factor. Hashing runs on the
/// blocking pool so it never stalls the async workers.
#[derive(Clone, Copy, Debug)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        PasswordHasher { cost }
    }

    pub async fn hash(&self, password: &str) -> Result<String, ExpenseError> {
        let password = password.to_string();
        let cost = self.cost;
        task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| ExpenseError::InternalServerError(format!("Password hashing task failed: {}", e)))?
            .map_err(|e| ExpenseError::InternalServerError(format!("Password hashing error: {}", e)))
    }

    pub async fn verify(&self, password: &str, hash: &str) -> Result<bool, ExpenseError> {
        let password = password.to_string();
        let hash = hash.to_string();
        task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| ExpenseError::InternalServerError(format!("Password verification task failed: {}", e)))?
            .map_err(|e| ExpenseError::InternalServerError(format!("Password verification error: {}", e)))
    }
}

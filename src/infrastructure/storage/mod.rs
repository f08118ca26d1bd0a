use crate::core::errors::ExpenseError;
use crate::core::models::{Expense, ExpenseChanges, ExpenseFilter, NewExpense, User};
use async_trait::async_trait;
use std::sync::Arc;

/// Persistence for users and their expenses.
///
/// Every expense operation takes the owning user's id and must only ever
/// touch rows belonging to that user. An expense owned by someone else is
/// reported exactly like a missing one.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Fails with `EmailAlreadyRegistered` when the email is taken.
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, ExpenseError>;
    async fn get_user(&self, user_id: i64) -> Result<Option<User>, ExpenseError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, ExpenseError>;

    async fn create_expense(&self, user_id: i64, expense: NewExpense) -> Result<Expense, ExpenseError>;
    /// Newest first, ties broken by descending id.
    async fn list_expenses(&self, user_id: i64, filter: &ExpenseFilter) -> Result<Vec<Expense>, ExpenseError>;
    async fn get_expense(&self, user_id: i64, expense_id: i64) -> Result<Option<Expense>, ExpenseError>;
    async fn update_expense(
        &self,
        user_id: i64,
        expense_id: i64,
        changes: ExpenseChanges,
    ) -> Result<Option<Expense>, ExpenseError>;
    /// Returns whether a row was removed.
    async fn delete_expense(&self, user_id: i64, expense_id: i64) -> Result<bool, ExpenseError>;

    async fn ping(&self) -> Result<(), ExpenseError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    InMemory,
    Sqlite(String),
    Postgres(String),
}

impl StorageBackend {
    pub fn from_url(url: &str) -> Result<Self, ExpenseError> {
        let url = url.trim();
        if url == "memory" || url.starts_with("memory://") {
            Ok(StorageBackend::InMemory)
        } else if url.starts_with("sqlite:") {
            Ok(StorageBackend::Sqlite(url.to_string()))
        } else if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Ok(StorageBackend::Postgres(url.to_string()))
        } else {
            Err(ExpenseError::UnsupportedDatabase(url.to_string()))
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StorageBackend::InMemory => "memory",
            StorageBackend::Sqlite(_) => "sqlite",
            StorageBackend::Postgres(_) => "postgres",
        }
    }
}

/// Opens the backend named by `url` and makes sure its tables exist.
pub async fn connect(url: &str) -> Result<Arc<dyn Storage>, ExpenseError> {
    let storage: Arc<dyn Storage> = match StorageBackend::from_url(url)? {
        StorageBackend::InMemory => Arc::new(in_memory::InMemoryStorage::new()),
        StorageBackend::Sqlite(url) => Arc::new(sqlite::SqliteStorage::connect(&url).await?),
        StorageBackend::Postgres(url) => Arc::new(postgres::PostgresStorage::connect(&url).await?),
    };
    Ok(storage)
}

pub mod in_memory;
pub mod postgres;
pub mod sqlite;

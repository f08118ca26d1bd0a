//! Embedded file-backed store. `sqlite::memory:` gives a throwaway database
//! held by a single pooled connection.

use crate::core::errors::ExpenseError;
use crate::core::models::{Expense, ExpenseChanges, ExpenseFilter, NewExpense, User};
use crate::infrastructure::storage::Storage;
use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite};
use std::str::FromStr;
use tracing::{debug, info};

const EXPENSE_COLUMNS: &str = "id, title, amount, category, user_id, created_at";

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS expenses (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        amount REAL NOT NULL,
        category TEXT NOT NULL DEFAULT 'General',
        user_id INTEGER NOT NULL,
        created_at TEXT NOT NULL,
        FOREIGN KEY(user_id) REFERENCES users(id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_expenses_user_created ON expenses (user_id, created_at)",
];

#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    pub async fn connect(url: &str) -> Result<Self, ExpenseError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = if is_in_memory(url) {
            // the database lives only as long as its connection
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new().max_connections(5).connect_with(options).await?
        };

        let storage = SqliteStorage { pool };
        storage.ensure_tables().await?;
        info!(backend = "sqlite", "storage ready");
        Ok(storage)
    }

    pub async fn ensure_tables(&self) -> Result<(), ExpenseError> {
        for ddl in SCHEMA {
            sqlx::query(ddl).execute(&self.pool).await?;
        }
        debug!("sqlite tables ensured");
        Ok(())
    }
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, ExpenseError> {
        let result = sqlx::query_as::<_, User>(
            "INSERT INTO users (email, password_hash, created_at) VALUES (?, ?, ?) \
             RETURNING id, email, password_hash, created_at",
        )
        .bind(email)
        .bind(password_hash)
        .bind(Utc::now().trunc_subsecs(6))
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(ExpenseError::EmailAlreadyRegistered(email.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_user(&self, user_id: i64) -> Result<Option<User>, ExpenseError> {
        let user = sqlx::query_as::<_, User>("SELECT id, email, password_hash, created_at FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, ExpenseError> {
        let user = sqlx::query_as::<_, User>("SELECT id, email, password_hash, created_at FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create_expense(&self, user_id: i64, expense: NewExpense) -> Result<Expense, ExpenseError> {
        let result = sqlx::query_as::<_, Expense>(&format!(
            "INSERT INTO expenses (title, amount, category, user_id, created_at) VALUES (?, ?, ?, ?, ?) \
             RETURNING {EXPENSE_COLUMNS}"
        ))
        .bind(expense.title)
        .bind(expense.amount)
        .bind(expense.category)
        .bind(user_id)
        .bind(expense.created_at)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(expense) => Ok(expense),
            Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => Err(ExpenseError::UserNotFound(user_id)),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_expenses(&self, user_id: i64, filter: &ExpenseFilter) -> Result<Vec<Expense>, ExpenseError> {
        let mut query = QueryBuilder::<Sqlite>::new(format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE user_id = "));
        query.push_bind(user_id);
        if let Some(category) = &filter.category {
            query.push(" AND category = ").push_bind(category.clone());
        }
        query
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(i64::from(filter.limit))
            .push(" OFFSET ")
            .push_bind(i64::from(filter.offset));

        let expenses = query.build_query_as::<Expense>().fetch_all(&self.pool).await?;
        Ok(expenses)
    }

    async fn get_expense(&self, user_id: i64, expense_id: i64) -> Result<Option<Expense>, ExpenseError> {
        let expense = sqlx::query_as::<_, Expense>(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = ? AND user_id = ?"
        ))
        .bind(expense_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(expense)
    }

    async fn update_expense(
        &self,
        user_id: i64,
        expense_id: i64,
        changes: ExpenseChanges,
    ) -> Result<Option<Expense>, ExpenseError> {
        let expense = sqlx::query_as::<_, Expense>(&format!(
            "UPDATE expenses SET title = COALESCE(?, title), amount = COALESCE(?, amount), \
             category = COALESCE(?, category) WHERE id = ? AND user_id = ? RETURNING {EXPENSE_COLUMNS}"
        ))
        .bind(changes.title)
        .bind(changes.amount)
        .bind(changes.category)
        .bind(expense_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(expense)
    }

    async fn delete_expense(&self, user_id: i64, expense_id: i64) -> Result<bool, ExpenseError> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = ? AND user_id = ?")
            .bind(expense_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), ExpenseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

//! Networked relational store.

use crate::core::errors::ExpenseError;
use crate::core::models::{Expense, ExpenseChanges, ExpenseFilter, NewExpense, User};
use crate::infrastructure::storage::Storage;
use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder};
use tracing::{debug, info};

const EXPENSE_COLUMNS: &str = "id, title, amount, category, user_id, created_at";

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS expenses (
        id BIGSERIAL PRIMARY KEY,
        title TEXT NOT NULL,
        amount DOUBLE PRECISION NOT NULL,
        category TEXT NOT NULL DEFAULT 'General',
        user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_expenses_user_created ON expenses (user_id, created_at)",
];

#[derive(Clone)]
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    pub async fn connect(url: &str) -> Result<Self, ExpenseError> {
        let pool = PgPoolOptions::new().max_connections(5).connect(url).await?;
        let storage = PostgresStorage { pool };
        storage.ensure_tables().await?;
        info!(backend = "postgres", "storage ready");
        Ok(storage)
    }

    pub async fn ensure_tables(&self) -> Result<(), ExpenseError> {
        for ddl in SCHEMA {
            sqlx::query(ddl).execute(&self.pool).await?;
        }
        debug!("postgres tables ensured");
        Ok(())
    }
}

#[async_trait]
impl Storage for PostgresStorage {
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, ExpenseError> {
        let result = sqlx::query_as::<_, User>(
            "INSERT INTO users (email, password_hash, created_at) VALUES ($1, $2, $3) \
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
        let user = sqlx::query_as::<_, User>("SELECT id, email, password_hash, created_at FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, ExpenseError> {
        let user = sqlx::query_as::<_, User>("SELECT id, email, password_hash, created_at FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create_expense(&self, user_id: i64, expense: NewExpense) -> Result<Expense, ExpenseError> {
        let result = sqlx::query_as::<_, Expense>(&format!(
            "INSERT INTO expenses (title, amount, category, user_id, created_at) VALUES ($1, $2, $3, $4, $5) \
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
        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE user_id = "));
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
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = $1 AND user_id = $2"
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
            "UPDATE expenses SET title = COALESCE($1, title), amount = COALESCE($2, amount), \
             category = COALESCE($3, category) WHERE id = $4 AND user_id = $5 RETURNING {EXPENSE_COLUMNS}"
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
        let result = sqlx::query("DELETE FROM expenses WHERE id = $1 AND user_id = $2")
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

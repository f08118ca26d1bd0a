use crate::core::errors::ExpenseError;
use crate::core::models::{Expense, ExpenseChanges, ExpenseFilter, NewExpense, User};
use crate::infrastructure::storage::Storage;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct InMemoryStorage {
    users: Arc<RwLock<HashMap<i64, User>>>,
    users_by_email: Arc<RwLock<HashMap<String, i64>>>,
    expenses: Arc<RwLock<HashMap<i64, Expense>>>,
    next_user_id: Arc<AtomicI64>,
    next_expense_id: Arc<AtomicI64>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        InMemoryStorage {
            users: Arc::new(RwLock::new(HashMap::new())),
            users_by_email: Arc::new(RwLock::new(HashMap::new())),
            expenses: Arc::new(RwLock::new(HashMap::new())),
            next_user_id: Arc::new(AtomicI64::new(1)),
            next_expense_id: Arc::new(AtomicI64::new(1)),
        }
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, ExpenseError> {
        // email index lock is held across the insert so two registrations can't race
        let mut users_by_email = self.users_by_email.write().await;
        if users_by_email.contains_key(email) {
            return Err(ExpenseError::EmailAlreadyRegistered(email.to_string()));
        }
        let user = User {
            id: self.next_user_id.fetch_add(1, Ordering::SeqCst),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        users_by_email.insert(user.email.clone(), user.id);
        let mut users = self.users.write().await;
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, user_id: i64) -> Result<Option<User>, ExpenseError> {
        let users = self.users.read().await;
        Ok(users.get(&user_id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, ExpenseError> {
        let users_by_email = self.users_by_email.read().await;
        let Some(user_id) = users_by_email.get(email) else {
            return Ok(None);
        };
        let users = self.users.read().await;
        Ok(users.get(user_id).cloned())
    }

    async fn create_expense(&self, user_id: i64, expense: NewExpense) -> Result<Expense, ExpenseError> {
        if !self.users.read().await.contains_key(&user_id) {
            return Err(ExpenseError::UserNotFound(user_id));
        }
        let expense = Expense {
            id: self.next_expense_id.fetch_add(1, Ordering::SeqCst),
            title: expense.title,
            amount: expense.amount,
            category: expense.category,
            user_id,
            created_at: expense.created_at,
        };
        let mut expenses = self.expenses.write().await;
        expenses.insert(expense.id, expense.clone());
        Ok(expense)
    }

    async fn list_expenses(&self, user_id: i64, filter: &ExpenseFilter) -> Result<Vec<Expense>, ExpenseError> {
        let expenses = self.expenses.read().await;
        let mut owned: Vec<Expense> = expenses
            .values()
            .filter(|e| e.user_id == user_id)
            .filter(|e| filter.category.as_ref().is_none_or(|c| &e.category == c))
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(owned
            .into_iter()
            .skip(filter.offset as usize)
            .take(filter.limit as usize)
            .collect())
    }

    async fn get_expense(&self, user_id: i64, expense_id: i64) -> Result<Option<Expense>, ExpenseError> {
        let expenses = self.expenses.read().await;
        Ok(expenses.get(&expense_id).filter(|e| e.user_id == user_id).cloned())
    }

    async fn update_expense(
        &self,
        user_id: i64,
        expense_id: i64,
        changes: ExpenseChanges,
    ) -> Result<Option<Expense>, ExpenseError> {
        let mut expenses = self.expenses.write().await;
        match expenses.get_mut(&expense_id) {
            Some(expense) if expense.user_id == user_id => {
                changes.apply(expense);
                Ok(Some(expense.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_expense(&self, user_id: i64, expense_id: i64) -> Result<bool, ExpenseError> {
        let mut expenses = self.expenses.write().await;
        if expenses.get(&expense_id).is_some_and(|e| e.user_id == user_id) {
            expenses.remove(&expense_id);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn ping(&self) -> Result<(), ExpenseError> {
        Ok(())
    }
}

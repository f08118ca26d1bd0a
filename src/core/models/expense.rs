use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, sqlx::FromRow)]
pub struct Expense {
    pub id: i64,
    pub title: String,
    pub amount: f64,
    pub category: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Validated input for a new expense. The owner is passed separately so
/// storage can never take it from the request body.
#[derive(Clone, Debug)]
pub struct NewExpense {
    pub title: String,
    pub amount: f64,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

/// Validated partial update. `None` leaves the column untouched.
#[derive(Clone, Debug, Default)]
pub struct ExpenseChanges {
    pub title: Option<String>,
    pub amount: Option<f64>,
    pub category: Option<String>,
}

impl ExpenseChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.amount.is_none() && self.category.is_none()
    }

    pub fn apply(self, expense: &mut Expense) {
        if let Some(title) = self.title {
            expense.title = title;
        }
        if let Some(amount) = self.amount {
            expense.amount = amount;
        }
        if let Some(category) = self.category {
            expense.category = category;
        }
    }
}

#[derive(Clone, Debug)]
pub struct ExpenseFilter {
    pub category: Option<String>,
    pub limit: u32,
    pub offset: u32,
}

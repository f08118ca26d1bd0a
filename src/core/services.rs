use crate::auth::jwt::{Claims, JwtService};
use crate::auth::password::PasswordHasher;
use crate::core::constants::{
    DEFAULT_CATEGORY, DEFAULT_PAGE_LIMIT, MAX_AMOUNT, MAX_CATEGORY_LEN, MAX_EMAIL_LEN, MAX_PAGE_LIMIT,
    MAX_PASSWORD_LEN, MAX_TITLE_LEN, MIN_EMAIL_LEN, MIN_PASSWORD_LEN,
};
use crate::core::errors::ExpenseError;
use crate::core::models::{Expense, ExpenseChanges, ExpenseFilter, NewExpense, User};
use crate::infrastructure::storage::Storage;
use chrono::{SubsecRound, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct ExpenseService {
    storage: Arc<dyn Storage>,
    jwt_service: JwtService,
    password_hasher: PasswordHasher,
}

impl ExpenseService {
    pub fn new(storage: Arc<dyn Storage>, jwt_service: JwtService, password_hasher: PasswordHasher) -> Self {
        ExpenseService {
            storage,
            jwt_service,
            password_hasher,
        }
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, ExpenseError> {
        self.jwt_service.validate_token(token)
    }

    pub fn token_ttl_secs(&self) -> u64 {
        self.jwt_service.ttl_secs()
    }

    pub async fn health_check(&self) -> Result<(), ExpenseError> {
        self.storage.ping().await
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<User, ExpenseError> {
        let email = normalize_email(email);
        validate_email(&email)?;
        validate_password(password)?;

        let password_hash = self.password_hasher.hash(password).await?;
        let user = self.storage.create_user(&email, &password_hash).await?;

        info!(user_id = user.id, "user registered");
        Ok(user)
    }

    /// Checks credentials and returns a signed bearer token. Unknown email
    /// and wrong password produce the same error.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<String, ExpenseError> {
        let email = normalize_email(email);
        let user = self
            .storage
            .get_user_by_email(&email)
            .await?
            .ok_or(ExpenseError::InvalidCredentials)?;

        if !self.password_hasher.verify(password, &user.password_hash).await? {
            warn!(user_id = user.id, "failed login attempt");
            return Err(ExpenseError::InvalidCredentials);
        }

        let token = self.jwt_service.generate_token(user.id, &user.email)?;
        info!(user_id = user.id, "user logged in");
        Ok(token)
    }

    pub async fn get_user(&self, user_id: i64) -> Result<User, ExpenseError> {
        self.storage
            .get_user(user_id)
            .await?
            .ok_or(ExpenseError::UserNotFound(user_id))
    }

    pub async fn create_expense(
        &self,
        user_id: i64,
        title: &str,
        amount: f64,
        category: Option<&str>,
    ) -> Result<Expense, ExpenseError> {
        let title = validate_string_input("title", title, MAX_TITLE_LEN)?;
        validate_amount_input("amount", amount)?;
        let category = match category {
            Some(category) => validate_string_input("category", category, MAX_CATEGORY_LEN)?,
            None => DEFAULT_CATEGORY.to_string(),
        };

        let expense = self
            .storage
            .create_expense(
                user_id,
                NewExpense {
                    title,
                    amount,
                    category,
                    created_at: Utc::now().trunc_subsecs(6),
                },
            )
            .await?;

        info!(user_id, expense_id = expense.id, "expense created");
        Ok(expense)
    }

    pub async fn list_expenses(
        &self,
        user_id: i64,
        category: Option<&str>,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<Vec<Expense>, ExpenseError> {
        let filter = ExpenseFilter {
            category: category.map(str::trim).filter(|c| !c.is_empty()).map(String::from),
            limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT).min(MAX_PAGE_LIMIT),
            offset: offset.unwrap_or(0),
        };
        let expenses = self.storage.list_expenses(user_id, &filter).await?;
        debug!(user_id, count = expenses.len(), "expenses listed");
        Ok(expenses)
    }

    pub async fn get_expense(&self, user_id: i64, expense_id: i64) -> Result<Expense, ExpenseError> {
        self.storage
            .get_expense(user_id, expense_id)
            .await?
            .ok_or(ExpenseError::ExpenseNotFound(expense_id))
    }

    pub async fn update_expense(
        &self,
        user_id: i64,
        expense_id: i64,
        title: Option<&str>,
        amount: Option<f64>,
        category: Option<&str>,
    ) -> Result<Expense, ExpenseError> {
        let mut changes = ExpenseChanges::default();
        if let Some(title) = title {
            changes.title = Some(validate_string_input("title", title, MAX_TITLE_LEN)?);
        }
        if let Some(amount) = amount {
            validate_amount_input("amount", amount)?;
            changes.amount = Some(amount);
        }
        if let Some(category) = category {
            changes.category = Some(validate_string_input("category", category, MAX_CATEGORY_LEN)?);
        }
        if changes.is_empty() {
            return Err(ExpenseError::invalid_input(
                "body",
                "Nothing to update",
                "Provide at least one of title, amount or category",
            ));
        }

        let expense = self
            .storage
            .update_expense(user_id, expense_id, changes)
            .await?
            .ok_or(ExpenseError::ExpenseNotFound(expense_id))?;

        info!(user_id, expense_id, "expense updated");
        Ok(expense)
    }

    pub async fn delete_expense(&self, user_id: i64, expense_id: i64) -> Result<(), ExpenseError> {
        if !self.storage.delete_expense(user_id, expense_id).await? {
            return Err(ExpenseError::ExpenseNotFound(expense_id));
        }
        info!(user_id, expense_id, "expense deleted");
        Ok(())
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_email(email: &str) -> Result<(), ExpenseError> {
    if email.is_empty() {
        return Err(ExpenseError::MissingEmail);
    }
    let well_formed = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };
    if !well_formed
        || email.len() < MIN_EMAIL_LEN
        || email.len() > MAX_EMAIL_LEN
        || email.chars().any(char::is_whitespace)
    {
        return Err(ExpenseError::InvalidEmail(email.to_string()));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ExpenseError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(ExpenseError::invalid_input(
            "password",
            "Password Too Short",
            format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
        ));
    }
    if password.len() > MAX_PASSWORD_LEN {
        return Err(ExpenseError::invalid_input(
            "password",
            "Password Too Long",
            format!("Password cannot exceed {} bytes", MAX_PASSWORD_LEN),
        ));
    }
    Ok(())
}

/// Returns the trimmed value.
fn validate_string_input(field: &str, value: &str, max_length: usize) -> Result<String, ExpenseError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ExpenseError::invalid_input(
            field,
            format!("Invalid {}", field),
            format!("{} cannot be empty", field),
        ));
    }
    if value.chars().count() > max_length {
        return Err(ExpenseError::invalid_input(
            field,
            format!("{} Too Long", field),
            format!("{} cannot exceed {} characters", field, max_length),
        ));
    }
    if value.chars().any(char::is_control) {
        return Err(ExpenseError::invalid_input(
            field,
            format!("Invalid {}", field),
            format!("{} contains invalid characters", field),
        ));
    }
    Ok(value.to_string())
}

fn validate_amount_input(field: &str, amount: f64) -> Result<(), ExpenseError> {
    if !amount.is_finite() {
        return Err(ExpenseError::invalid_input(
            field,
            "Invalid Amount",
            "Amount must be a finite number",
        ));
    }
    if amount <= 0.0 {
        return Err(ExpenseError::invalid_input(
            field,
            "Invalid Amount",
            "Amount must be greater than 0",
        ));
    }
    if amount > MAX_AMOUNT {
        return Err(ExpenseError::invalid_input(
            field,
            "Amount Too Large",
            format!("Amount cannot exceed {}", MAX_AMOUNT),
        ));
    }
    if (amount * 100.0).round() / 100.0 != amount {
        return Err(ExpenseError::invalid_input(
            field,
            "Invalid Amount",
            "Amount cannot have more than 2 decimal places",
        ));
    }
    Ok(())
}

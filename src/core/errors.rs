use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub title: String,
    pub description: String,
}

impl FieldError {
    pub fn new(field: &str, title: impl Into<String>, description: impl Into<String>) -> Self {
        FieldError {
            field: field.to_string(),
            title: title.into(),
            description: description.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ExpenseError {
    #[error("Email is required")]
    MissingEmail,
    #[error("Invalid email format: {0}")]
    InvalidEmail(String),
    #[error("Email {0} already registered")]
    EmailAlreadyRegistered(String),
    #[error("Invalid input for field `{0}`: {1:?}")]
    InvalidInput(String, FieldError),
    #[error("Malformed request: {0}")]
    MalformedRequest(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("No token provided")]
    MissingToken,
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error("User {0} not found")]
    UserNotFound(i64),
    #[error("Expense {0} not found")]
    ExpenseNotFound(i64),
    #[error("Unsupported database url: {0}")]
    UnsupportedDatabase(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl ExpenseError {
    pub fn invalid_input(field: &str, title: impl Into<String>, description: impl Into<String>) -> Self {
        ExpenseError::InvalidInput(field.to_string(), FieldError::new(field, title, description))
    }
}

impl From<sqlx::Error> for ExpenseError {
    fn from(err: sqlx::Error) -> Self {
        ExpenseError::DatabaseError(err.to_string())
    }
}

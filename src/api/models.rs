use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use crate::core::errors::{ExpenseError, FieldError};
use crate::core::models::User;

// missing fields fall through to the email and password validators
#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    /// Seconds until the token expires.
    pub expires_in: u64,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

// title and amount are optional here so a missing field is reported as a
// 400 with field details instead of a bare deserialization rejection
#[derive(Deserialize, ToSchema)]
pub struct CreateExpenseRequest {
    pub title: Option<String>,
    pub amount: Option<f64>,
    /// Defaults to "General".
    pub category: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateExpenseRequest {
    pub title: Option<String>,
    pub amount: Option<f64>,
    pub category: Option<String>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListExpensesQuery {
    /// Exact category match.
    pub category: Option<String>,
    /// Page size, default 100, at most 1000.
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub storage: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<FieldError>,
}

// Newtype wrapper for ExpenseError to implement IntoResponse
pub struct ApiError(pub ExpenseError);

impl From<ExpenseError> for ApiError {
    fn from(err: ExpenseError) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(ExpenseError::MalformedRequest(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError(ExpenseError::MalformedRequest(rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError(ExpenseError::MalformedRequest(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let mut details: Option<FieldError> = None;
        let (status, error_message) = match self.0 {
            ExpenseError::MissingEmail => (StatusCode::BAD_REQUEST, "Email is required".to_string()),
            ExpenseError::InvalidEmail(email) => (StatusCode::BAD_REQUEST, format!("Invalid email: {}", email)),
            ExpenseError::EmailAlreadyRegistered(email) => {
                (StatusCode::CONFLICT, format!("Email {} already registered", email))
            }
            ExpenseError::InvalidInput(field, field_error) => {
                let message = format!("Invalid input for {}: {}", field, field_error.description);
                details = Some(field_error);
                (StatusCode::BAD_REQUEST, message)
            }
            ExpenseError::MalformedRequest(reason) => (StatusCode::BAD_REQUEST, reason),
            ExpenseError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid email or password".to_string()),
            ExpenseError::MissingToken => (StatusCode::UNAUTHORIZED, "No token provided".to_string()),
            ExpenseError::InvalidToken(_) => (StatusCode::UNAUTHORIZED, "Invalid token".to_string()),
            ExpenseError::UserNotFound(id) => (StatusCode::NOT_FOUND, format!("User {} not found", id)),
            ExpenseError::ExpenseNotFound(id) => (StatusCode::NOT_FOUND, format!("Expense {} not found", id)),
            err @ (ExpenseError::UnsupportedDatabase(_)
            | ExpenseError::DatabaseError(_)
            | ExpenseError::InternalServerError(_)) => {
                error!(error = %err, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };
        (
            status,
            Json(ErrorResponse {
                error: error_message,
                details,
            }),
        )
            .into_response()
    }
}

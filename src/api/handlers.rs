use crate::{
    api::extractors::{JsonBody, PathParam, QueryParams},
    api::models::*,
    auth::jwt::Claims,
    core::{errors::ExpenseError, models::Expense, services::ExpenseService},
};
use axum::{
    Extension, Json, Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::IntoResponse,
    routing::{get, post},
};
use http::header;

use std::sync::Arc;

/// Middleware to validate the bearer token and stash its claims for handlers.
async fn auth_middleware(
    State(service): State<Arc<ExpenseService>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(ExpenseError::MissingToken)?
        .to_str()
        .map_err(|_| ExpenseError::InvalidToken("non-ascii Authorization header".to_string()))?;

    let token = bearer_token(auth_header)
        .ok_or_else(|| ExpenseError::InvalidToken("Invalid Authorization header".to_string()))?;

    let claims = service.validate_token(token)?;
    claims.user_id()?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

fn bearer_token(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

fn missing_field(field: &str) -> ExpenseError {
    ExpenseError::invalid_input(field, "Missing Field", "Title and amount required")
}

pub fn api_routes(service: Arc<ExpenseService>) -> Router {
    let protected_routes = Router::new()
        .route("/me", get(current_user))
        .route("/expenses", get(list_expenses).post(create_expense))
        .route(
            "/expenses/{expense_id}",
            get(get_expense).put(update_expense).delete(delete_expense),
        )
        .route_layer(middleware::from_fn_with_state(service.clone(), auth_middleware));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .merge(protected_routes)
        .with_state(service)
}

pub async fn root() -> &'static str {
    "Expense Tracker API running"
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service and storage are up", body = HealthResponse),
        (status = 503, description = "Storage unavailable", body = HealthResponse)
    )
)]
pub async fn health(State(service): State<Arc<ExpenseService>>) -> (StatusCode, Json<HealthResponse>) {
    match service.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok".to_string(),
                storage: "ok".to_string(),
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "storage health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "degraded".to_string(),
                    storage: "unavailable".to_string(),
                }),
            )
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = UserResponse),
        (status = 400, description = "Invalid email or password", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
async fn register(
    State(service): State<Arc<ExpenseService>>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user = service.register(&req.email, &req.password).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
async fn login(
    State(service): State<Arc<ExpenseService>>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let token = service.authenticate(&req.email, &req.password).await?;
    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: service.token_ttl_secs(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Authenticated user", body = UserResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn current_user(
    State(service): State<Arc<ExpenseService>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = service.get_user(claims.user_id()?).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    post,
    path = "/api/expenses",
    request_body = CreateExpenseRequest,
    responses(
        (status = 201, description = "Expense created", body = Expense),
        (status = 400, description = "Title and amount required, or invalid", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn create_expense(
    State(service): State<Arc<ExpenseService>>,
    Extension(claims): Extension<Claims>,
    JsonBody(req): JsonBody<CreateExpenseRequest>,
) -> Result<(StatusCode, Json<Expense>), ApiError> {
    let (title, amount) = match (req.title, req.amount) {
        (Some(title), Some(amount)) => (title, amount),
        (None, _) => return Err(missing_field("title").into()),
        (_, None) => return Err(missing_field("amount").into()),
    };
    let expense = service
        .create_expense(claims.user_id()?, &title, amount, req.category.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

#[utoipa::path(
    get,
    path = "/api/expenses",
    params(ListExpensesQuery),
    responses(
        (status = 200, description = "The caller's expenses, newest first", body = Vec<Expense>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn list_expenses(
    State(service): State<Arc<ExpenseService>>,
    Extension(claims): Extension<Claims>,
    QueryParams(query): QueryParams<ListExpensesQuery>,
) -> Result<Json<Vec<Expense>>, ApiError> {
    let expenses = service
        .list_expenses(claims.user_id()?, query.category.as_deref(), query.limit, query.offset)
        .await?;
    Ok(Json(expenses))
}

#[utoipa::path(
    get,
    path = "/api/expenses/{expense_id}",
    params(
        ("expense_id" = i64, Path, description = "ID of the expense")
    ),
    responses(
        (status = 200, description = "Expense retrieved", body = Expense),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Expense not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn get_expense(
    State(service): State<Arc<ExpenseService>>,
    Extension(claims): Extension<Claims>,
    PathParam(expense_id): PathParam<i64>,
) -> Result<Json<Expense>, ApiError> {
    let expense = service.get_expense(claims.user_id()?, expense_id).await?;
    Ok(Json(expense))
}

#[utoipa::path(
    put,
    path = "/api/expenses/{expense_id}",
    request_body = UpdateExpenseRequest,
    params(
        ("expense_id" = i64, Path, description = "ID of the expense")
    ),
    responses(
        (status = 200, description = "Expense updated", body = Expense),
        (status = 400, description = "Invalid or empty update", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Expense not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn update_expense(
    State(service): State<Arc<ExpenseService>>,
    Extension(claims): Extension<Claims>,
    PathParam(expense_id): PathParam<i64>,
    JsonBody(req): JsonBody<UpdateExpenseRequest>,
) -> Result<Json<Expense>, ApiError> {
    let expense = service
        .update_expense(
            claims.user_id()?,
            expense_id,
            req.title.as_deref(),
            req.amount,
            req.category.as_deref(),
        )
        .await?;
    Ok(Json(expense))
}

#[utoipa::path(
    delete,
    path = "/api/expenses/{expense_id}",
    params(
        ("expense_id" = i64, Path, description = "ID of the expense")
    ),
    responses(
        (status = 204, description = "Expense deleted"),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Expense not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn delete_expense(
    State(service): State<Arc<ExpenseService>>,
    Extension(claims): Extension<Claims>,
    PathParam(expense_id): PathParam<i64>,
) -> Result<StatusCode, ApiError> {
    service.delete_expense(claims.user_id()?, expense_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::bearer_token;

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("abc.def"), None);
    }
}

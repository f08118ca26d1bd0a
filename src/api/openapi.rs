use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::{
    api::models::{
        CreateExpenseRequest, ErrorResponse, HealthResponse, LoginRequest, LoginResponse, RegisterRequest,
        UpdateExpenseRequest, UserResponse,
    },
    core::{errors::FieldError, models::Expense},
};

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "Bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        super::handlers::health,
        super::handlers::register,
        super::handlers::login,
        super::handlers::current_user,
        super::handlers::create_expense,
        super::handlers::list_expenses,
        super::handlers::get_expense,
        super::handlers::update_expense,
        super::handlers::delete_expense
    ),
    components(schemas(
        RegisterRequest,
        LoginRequest,
        LoginResponse,
        UserResponse,
        CreateExpenseRequest,
        UpdateExpenseRequest,
        HealthResponse,
        ErrorResponse,
        FieldError,
        Expense
    )),
    modifiers(&BearerSecurity),
    info(
        title = "Expense Tracker API",
        description = "Per-user expense tracking with bearer token authentication",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;

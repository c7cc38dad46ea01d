use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use pvz_auth::Role;

use crate::app::{dto, errors};
use crate::app::services::AppServices;

fn parse_role(raw: &str) -> Result<Role, axum::response::Response> {
    raw.parse()
        .map_err(|e: pvz_core::DomainError| errors::json_error(StatusCode::BAD_REQUEST, "invalid_role", e.to_string()))
}

pub async fn dummy_login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::DummyLoginRequest>,
) -> axum::response::Response {
    let role = match parse_role(&body.role) {
        Ok(r) => r,
        Err(res) => return res,
    };

    match services.users.dummy_login(role) {
        Ok(token) => (StatusCode::OK, Json(token)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RegisterRequest>,
) -> axum::response::Response {
    let role = match parse_role(&body.role) {
        Ok(r) => r,
        Err(res) => return res,
    };

    match services.users.register(&body.email, &body.password, role).await {
        Ok(user) => (StatusCode::CREATED, Json(dto::UserResponse::from(user))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::LoginRequest>,
) -> axum::response::Response {
    match services.users.login(&body.email, &body.password).await {
        Ok(token) => (StatusCode::OK, Json(token)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};

use pvz_auth::Permission;
use pvz_core::PickupPointId;

use crate::app::{dto, errors};
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/receptions", post(open_reception))
        .route("/pvz/:pvz_id/close_last_reception", post(close_last_reception))
}

pub async fn open_reception(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::OpenReceptionRequest>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::authorize_request(&principal, &Permission::RECEPTIONS_OPEN) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let pvz_id: PickupPointId = match errors::parse_id(&body.pvz_id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.receptions.open(pvz_id, principal.user_id()).await {
        Ok(reception) => (StatusCode::CREATED, Json(dto::ReceptionResponse::from(&reception))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn close_last_reception(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(pvz_id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::authorize_request(&principal, &Permission::RECEPTIONS_CLOSE) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let pvz_id: PickupPointId = match errors::parse_id(&pvz_id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.receptions.close(pvz_id).await {
        Ok(reception) => (StatusCode::OK, Json(dto::ReceptionResponse::from(&reception))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

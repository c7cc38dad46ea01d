use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};

use pvz_auth::Permission;
use pvz_infra::query::ListQuery;

use crate::app::{dto, errors};
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new().route("/pvz", post(create_pickup_point).get(list_pickup_points))
}

pub async fn create_pickup_point(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::CreatePickupPointRequest>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::authorize_request(&principal, &Permission::PICKUP_POINTS_CREATE) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    match services
        .pickup_points
        .create(principal.user_id(), &body.city, body.registration_date)
        .await
    {
        Ok(point) => (StatusCode::CREATED, Json(dto::PickupPointResponse::from(&point))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Pickup-points registered within the date range, one page at a time, each
/// with its receptions and their products.
pub async fn list_pickup_points(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<ListQuery>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::authorize_request(&principal, &Permission::PICKUP_POINTS_READ) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    match services.pickup_points.list(&query).await {
        Ok(tree) => (StatusCode::OK, Json(tree)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

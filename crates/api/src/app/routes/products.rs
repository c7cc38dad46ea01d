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
        .route("/products", post(add_product))
        .route("/pvz/:pvz_id/delete_last_product", post(delete_last_product))
}

pub async fn add_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::AddProductRequest>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::authorize_request(&principal, &Permission::PRODUCTS_ADD) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let pvz_id: PickupPointId = match errors::parse_id(&body.pvz_id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services
        .products
        .append(pvz_id, principal.user_id(), &body.product_type)
        .await
    {
        Ok(product) => (StatusCode::CREATED, Json(dto::ProductResponse::from(&product))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_last_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(pvz_id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::authorize_request(&principal, &Permission::PRODUCTS_REMOVE) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let pvz_id: PickupPointId = match errors::parse_id(&pvz_id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.products.remove_last(pvz_id).await {
        Ok(product) => (StatusCode::OK, Json(dto::ProductResponse::from(&product))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

use axum::{routing::post, Router};

pub mod auth;
pub mod pickup_points;
pub mod products;
pub mod receptions;
pub mod system;

/// Endpoints reachable without a token.
pub fn public_router() -> Router {
    Router::new()
        .route("/dummyLogin", post(auth::dummy_login))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
}

/// Endpoints that require a bearer token.
pub fn router() -> Router {
    Router::new()
        .merge(pickup_points::router())
        .merge(receptions::router())
        .merge(products::router())
}

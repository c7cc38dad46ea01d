//! Service wiring for the HTTP layer.
//!
//! Everything is built once at startup and shared through an `Arc`.

use std::sync::Arc;

use pvz_auth::Hs256Jwt;
use pvz_infra::services::{
    PickupPointService, ProductService, ReceptionService, Services, UserService,
};
use pvz_infra::store::{PickupPointRepository, TransactionManager, UserRepository};
use pvz_observability::Metrics;

pub struct AppServices {
    pub pickup_points: PickupPointService,
    pub receptions: ReceptionService,
    pub products: ProductService,
    pub users: UserService,
    pub metrics: Metrics,
}

impl AppServices {
    /// Wire the services over `store`, issuing tokens with `jwt` and counting
    /// into `metrics`.
    pub fn new<S>(store: S, jwt: Hs256Jwt, metrics: Metrics) -> Self
    where
        S: TransactionManager + PickupPointRepository + UserRepository + 'static,
    {
        let Services {
            pickup_points,
            receptions,
            products,
            users,
        } = Services::new(store, Arc::new(metrics.clone()), Arc::new(jwt));

        Self {
            pickup_points,
            receptions,
            products,
            users,
            metrics,
        }
    }
}

//! Application services: validate input, run domain decisions inside a
//! transaction, count what was created.

use std::sync::Arc;

use pvz_auth::TokenIssuer;
use pvz_observability::EntitySink;

use crate::store::{PickupPointRepository, TransactionManager, UserRepository};

mod error;
mod pickup_points;
mod products;
mod receptions;
mod users;

pub use error::{AuthError, ServiceError};
pub use pickup_points::PickupPointService;
pub use products::ProductService;
pub use receptions::ReceptionService;
pub use users::UserService;

/// Runs of a read-then-write unit of work before a write conflict is
/// reported to the caller.
const WRITE_ATTEMPTS: u32 = 3;

/// All services, wired once at startup.
pub struct Services {
    pub pickup_points: PickupPointService,
    pub receptions: ReceptionService,
    pub products: ProductService,
    pub users: UserService,
}

impl Services {
    /// Wire every service against one backend that provides all capabilities.
    pub fn new<S>(store: S, metrics: Arc<dyn EntitySink>, tokens: Arc<dyn TokenIssuer>) -> Self
    where
        S: TransactionManager + PickupPointRepository + UserRepository + 'static,
    {
        let store = Arc::new(store);
        Self {
            pickup_points: PickupPointService::new(store.clone(), metrics.clone()),
            receptions: ReceptionService::new(store.clone(), metrics.clone()),
            products: ProductService::new(store.clone(), metrics),
            users: UserService::new(store, tokens),
        }
    }
}

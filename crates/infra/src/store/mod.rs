//! Storage capabilities.
//!
//! One capability trait per responsibility:
//!
//! - [`ReceptionRepository`] / [`ProductRepository`]: transactional reads and
//!   writes used by the reception lifecycle and the product ledger. Only
//!   reachable through a [`Transaction`].
//! - [`TransactionManager`]: opens transactions at an isolation level.
//! - [`PickupPointRepository`]: pickup-point registration and the flat rows
//!   behind the aggregated listing.
//! - [`UserRepository`]: credential storage.
//!
//! Backends: [`InMemoryStore`] (tests/dev) and [`PostgresStore`].

use core::future::Future;
use core::pin::Pin;

use async_trait::async_trait;
use thiserror::Error;

use pvz_auth::User;
use pvz_core::{PickupPointId, ProductId, ReceptionId};
use pvz_pickup_points::PickupPoint;
use pvz_products::Product;
use pvz_receptions::Reception;

use crate::query::ListWindow;
use crate::read_model::FlatRow;

pub mod connect;
pub mod executor;
pub mod in_memory;
pub mod postgres;

pub use connect::{connect_with_retry, ConnectOptions};
pub use executor::{run_with_isolation, run_with_retry, Retryable};
pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("foreign key violated: {0}")]
    ForeignKeyViolation(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// A row this transaction read changed before it committed. Safe to
    /// retry from a fresh read.
    #[error("write conflict: {0}")]
    Conflict(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Transaction isolation level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IsolationLevel {
    #[default]
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    pub fn as_sql(&self) -> &'static str {
        match self {
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }
}

#[async_trait]
pub trait ReceptionRepository: Send {
    async fn pickup_point_exists(&mut self, pickup_point_id: PickupPointId) -> Result<bool, StoreError>;

    /// Most recent reception of a pickup-point (creation time desc, ties
    /// broken deterministically).
    async fn latest_reception(&mut self, pickup_point_id: PickupPointId) -> Result<Option<Reception>, StoreError>;

    async fn insert_reception(&mut self, reception: &Reception) -> Result<(), StoreError>;

    /// Persist the status and close stamp of an existing reception.
    async fn update_reception(&mut self, reception: &Reception) -> Result<(), StoreError>;
}

#[async_trait]
pub trait ProductRepository: Send {
    async fn insert_product(&mut self, product: &Product) -> Result<(), StoreError>;

    /// Newest product of a reception (creation time desc, ties broken
    /// deterministically).
    async fn latest_product(&mut self, reception_id: ReceptionId) -> Result<Option<Product>, StoreError>;

    async fn delete_product(&mut self, product_id: ProductId) -> Result<(), StoreError>;
}

/// An open unit of work.
///
/// Dropping a transaction without committing discards its writes.
pub trait Transaction: ReceptionRepository + ProductRepository {
    fn commit(self: Box<Self>) -> BoxFuture<'static, Result<(), StoreError>>;

    fn rollback(self: Box<Self>) -> BoxFuture<'static, Result<(), StoreError>>;
}

#[async_trait]
pub trait TransactionManager: Send + Sync {
    async fn begin(&self, level: IsolationLevel) -> Result<Box<dyn Transaction>, StoreError>;
}

#[async_trait]
pub trait PickupPointRepository: Send + Sync {
    async fn insert_pickup_point(&self, pickup_point: &PickupPoint) -> Result<(), StoreError>;

    /// Left-joined pickup-point/reception/product rows for one page of
    /// pickup-points, ordered by pickup-point then reception then product
    /// creation time.
    async fn list_rows(&self, window: &ListWindow) -> Result<Vec<FlatRow>, StoreError>;
}

/// A user together with its password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUser {
    pub user: User,
    pub password_hash: String,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with [`StoreError::UniqueViolation`] when the email is taken.
    async fn insert_user(&self, user: &StoredUser) -> Result<(), StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<StoredUser>, StoreError>;
}

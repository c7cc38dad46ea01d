//! In-memory storage backend.
//!
//! Intended for tests/dev. Every transaction works on a private snapshot of the
//! tables taken at `begin`; its writes are recorded and replayed against the
//! live tables on commit, all-or-nothing. Replay enforces the schema
//! constraints (one `in_progress` reception per pickup-point, referential
//! integrity, unique emails) and re-checks what each write assumed about the
//! rows it touches:
//!
//! - a reception is only updated while it is still `in_progress`;
//! - a product is only inserted into an `in_progress` reception;
//! - a product is only deleted while its reception is `in_progress` and it is
//!   still the newest product there.
//!
//! A failed re-check aborts the commit with [`StoreError::Conflict`], which
//! plays the part of the row locks the Postgres backend takes.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::debug;

use pvz_core::{Entity, PickupPointId, ProductId, ReceptionId};
use pvz_pickup_points::PickupPoint;
use pvz_products::Product;
use pvz_receptions::Reception;

use super::{
    BoxFuture, IsolationLevel, PickupPointRepository, ProductRepository, ReceptionRepository,
    StoreError, StoredUser, Transaction, TransactionManager, UserRepository,
};
use crate::query::ListWindow;
use crate::read_model::{FlatRow, ProductColumns, ReceptionColumns};

/// Rows carry an insertion sequence used as the tie-break between equal
/// creation timestamps.
#[derive(Debug, Clone)]
struct Sequenced<T> {
    seq: u64,
    row: T,
}

fn position<E: Entity>(rows: &[Sequenced<E>], id: &E::Id) -> Option<usize> {
    rows.iter().position(|r| r.row.id() == id)
}

#[derive(Debug, Clone, Default)]
struct Tables {
    next_seq: u64,
    pickup_points: Vec<Sequenced<PickupPoint>>,
    receptions: Vec<Sequenced<Reception>>,
    products: Vec<Sequenced<Product>>,
    users: HashMap<String, StoredUser>,
}

#[derive(Debug, Clone)]
enum Write {
    InsertReception(Reception),
    UpdateReception(Reception),
    InsertProduct(Product),
    DeleteProduct(ProductId),
}

impl Tables {
    fn seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn has_pickup_point(&self, id: PickupPointId) -> bool {
        position(&self.pickup_points, &id).is_some()
    }

    fn latest_reception(&self, pickup_point_id: PickupPointId) -> Option<&Reception> {
        self.receptions
            .iter()
            .filter(|r| r.row.pickup_point_id() == pickup_point_id)
            .max_by_key(|r| (r.row.created_at(), r.seq))
            .map(|r| &r.row)
    }

    fn latest_product(&self, reception_id: ReceptionId) -> Option<&Product> {
        self.products
            .iter()
            .filter(|p| p.row.reception_id() == reception_id)
            .max_by_key(|p| (p.row.created_at(), p.seq))
            .map(|p| &p.row)
    }

    fn ensure_open(&self, reception_id: ReceptionId) -> Result<(), StoreError> {
        match position(&self.receptions, &reception_id) {
            Some(idx) if self.receptions[idx].row.is_open() => Ok(()),
            _ => Err(StoreError::Conflict(format!("reception {reception_id} is no longer in progress"))),
        }
    }

    fn apply(&mut self, write: Write) -> Result<(), StoreError> {
        match write {
            Write::InsertReception(reception) => {
                if !self.has_pickup_point(reception.pickup_point_id()) {
                    return Err(StoreError::ForeignKeyViolation(format!(
                        "receptions.pvz_id {} does not exist",
                        reception.pickup_point_id()
                    )));
                }
                let open_exists = self
                    .receptions
                    .iter()
                    .any(|r| r.row.pickup_point_id() == reception.pickup_point_id() && r.row.is_open());
                if reception.is_open() && open_exists {
                    return Err(StoreError::UniqueViolation(format!(
                        "receptions_one_in_progress_per_pvz ({})",
                        reception.pickup_point_id()
                    )));
                }
                let seq = self.seq();
                self.receptions.push(Sequenced { seq, row: reception });
            }
            Write::UpdateReception(reception) => {
                let idx = position(&self.receptions, reception.id())
                    .ok_or_else(|| StoreError::NotFound(format!("reception {}", reception.id_typed())))?;
                if !self.receptions[idx].row.is_open() {
                    return Err(StoreError::Conflict(format!(
                        "reception {} is no longer in progress",
                        reception.id_typed()
                    )));
                }
                self.receptions[idx].row = reception;
            }
            Write::InsertProduct(product) => {
                if position(&self.receptions, &product.reception_id()).is_none() {
                    return Err(StoreError::ForeignKeyViolation(format!(
                        "products.reception_id {} does not exist",
                        product.reception_id()
                    )));
                }
                self.ensure_open(product.reception_id())?;
                let seq = self.seq();
                self.products.push(Sequenced { seq, row: product });
            }
            Write::DeleteProduct(product_id) => {
                let idx = position(&self.products, &product_id)
                    .ok_or_else(|| StoreError::Conflict(format!("product {product_id} no longer exists")))?;
                let reception_id = self.products[idx].row.reception_id();
                self.ensure_open(reception_id)?;
                if self.latest_product(reception_id).map(|p| p.id_typed()) != Some(product_id) {
                    return Err(StoreError::Conflict(format!(
                        "product {product_id} is no longer the newest in reception {reception_id}"
                    )));
                }
                self.products.remove(idx);
            }
        }
        Ok(())
    }
}

/// In-memory implementation of every storage capability.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot(&self) -> Result<Tables, StoreError> {
        self.tables
            .read()
            .map(|t| t.clone())
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    /// Number of receptions currently `in_progress` for a pickup-point.
    pub fn open_reception_count(&self, pickup_point_id: PickupPointId) -> Result<usize, StoreError> {
        let tables = self.snapshot()?;
        Ok(tables
            .receptions
            .iter()
            .filter(|r| r.row.pickup_point_id() == pickup_point_id && r.row.is_open())
            .count())
    }

    /// Products of a reception in insertion order.
    pub fn products_of(&self, reception_id: ReceptionId) -> Result<Vec<Product>, StoreError> {
        let tables = self.snapshot()?;
        Ok(tables
            .products
            .iter()
            .filter(|p| p.row.reception_id() == reception_id)
            .map(|p| p.row.clone())
            .collect())
    }
}

/// A transaction against [`InMemoryStore`].
#[derive(Debug)]
pub struct InMemoryTransaction {
    live: Arc<RwLock<Tables>>,
    view: Tables,
    writes: Vec<Write>,
}

impl InMemoryTransaction {
    fn stage(&mut self, write: Write) -> Result<(), StoreError> {
        self.view.apply(write.clone())?;
        self.writes.push(write);
        Ok(())
    }
}

#[async_trait]
impl TransactionManager for InMemoryStore {
    async fn begin(&self, level: IsolationLevel) -> Result<Box<dyn Transaction>, StoreError> {
        debug!(isolation = level.as_sql(), "begin in-memory transaction");
        Ok(Box::new(InMemoryTransaction {
            live: Arc::clone(&self.tables),
            view: self.snapshot()?,
            writes: Vec::new(),
        }))
    }
}

#[async_trait]
impl ReceptionRepository for InMemoryTransaction {
    async fn pickup_point_exists(&mut self, pickup_point_id: PickupPointId) -> Result<bool, StoreError> {
        Ok(self.view.has_pickup_point(pickup_point_id))
    }

    async fn latest_reception(&mut self, pickup_point_id: PickupPointId) -> Result<Option<Reception>, StoreError> {
        Ok(self.view.latest_reception(pickup_point_id).cloned())
    }

    async fn insert_reception(&mut self, reception: &Reception) -> Result<(), StoreError> {
        self.stage(Write::InsertReception(reception.clone()))
    }

    async fn update_reception(&mut self, reception: &Reception) -> Result<(), StoreError> {
        self.stage(Write::UpdateReception(reception.clone()))
    }
}

#[async_trait]
impl ProductRepository for InMemoryTransaction {
    async fn insert_product(&mut self, product: &Product) -> Result<(), StoreError> {
        self.stage(Write::InsertProduct(product.clone()))
    }

    async fn latest_product(&mut self, reception_id: ReceptionId) -> Result<Option<Product>, StoreError> {
        Ok(self.view.latest_product(reception_id).cloned())
    }

    async fn delete_product(&mut self, product_id: ProductId) -> Result<(), StoreError> {
        self.stage(Write::DeleteProduct(product_id))
    }
}

impl Transaction for InMemoryTransaction {
    fn commit(self: Box<Self>) -> BoxFuture<'static, Result<(), StoreError>> {
        let InMemoryTransaction { live, writes, .. } = *self;
        let result = live
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
            .and_then(|mut tables| {
                // Replay on a copy so a failing write leaves the live tables untouched.
                let mut next = tables.clone();
                for write in writes {
                    next.apply(write)?;
                }
                *tables = next;
                Ok(())
            });
        Box::pin(async move { result })
    }

    fn rollback(self: Box<Self>) -> BoxFuture<'static, Result<(), StoreError>> {
        Box::pin(async { Ok(()) })
    }
}

#[async_trait]
impl PickupPointRepository for InMemoryStore {
    async fn insert_pickup_point(&self, pickup_point: &PickupPoint) -> Result<(), StoreError> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;

        if tables.has_pickup_point(pickup_point.id_typed()) {
            return Err(StoreError::UniqueViolation(format!("pvz {}", pickup_point.id_typed())));
        }
        let seq = tables.seq();
        tables.pickup_points.push(Sequenced {
            seq,
            row: pickup_point.clone(),
        });
        Ok(())
    }

    async fn list_rows(&self, window: &ListWindow) -> Result<Vec<FlatRow>, StoreError> {
        let tables = self.snapshot()?;

        let mut points: Vec<&PickupPoint> = tables
            .pickup_points
            .iter()
            .map(|p| &p.row)
            .filter(|p| window.range.contains(p.registered_at()))
            .collect();
        points.sort_by_key(|p| (p.registered_at(), p.id_typed()));

        let page = points
            .into_iter()
            .skip(usize::try_from(window.offset).unwrap_or(usize::MAX))
            .take(window.limit as usize);

        let mut rows = Vec::new();
        for point in page {
            let base = |reception: Option<ReceptionColumns>, product: Option<ProductColumns>| FlatRow {
                pickup_point_id: point.id_typed(),
                city: point.city(),
                registered_at: point.registered_at(),
                reception,
                product,
            };

            let mut receptions: Vec<&Sequenced<Reception>> = tables
                .receptions
                .iter()
                .filter(|r| r.row.pickup_point_id() == point.id_typed())
                .collect();
            receptions.sort_by_key(|r| (r.row.created_at(), r.seq));

            if receptions.is_empty() {
                rows.push(base(None, None));
            }

            for reception in receptions {
                let reception = &reception.row;
                let columns = ReceptionColumns {
                    id: reception.id_typed(),
                    status: reception.status(),
                    created_at: reception.created_at(),
                };

                let mut products: Vec<&Sequenced<Product>> = tables
                    .products
                    .iter()
                    .filter(|p| p.row.reception_id() == reception.id_typed())
                    .collect();
                products.sort_by_key(|p| (p.row.created_at(), p.seq));

                if products.is_empty() {
                    rows.push(base(Some(columns.clone()), None));
                }
                for product in products {
                    rows.push(base(
                        Some(columns.clone()),
                        Some(ProductColumns {
                            id: product.row.id_typed(),
                            product_type: product.row.product_type(),
                            created_at: product.row.created_at(),
                        }),
                    ));
                }
            }
        }

        Ok(rows)
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn insert_user(&self, user: &StoredUser) -> Result<(), StoreError> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;

        if tables.users.contains_key(&user.user.email) {
            return Err(StoreError::UniqueViolation(format!("users.email {}", user.user.email)));
        }
        tables.users.insert(user.user.email.clone(), user.clone());
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<StoredUser>, StoreError> {
        let tables = self
            .tables
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;
        Ok(tables.users.get(email).cloned())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use pvz_core::UserId;
    use pvz_pickup_points::City;
    use pvz_products::ProductType;
    use pvz_receptions::ReceptionStatus;

    use super::*;
    use crate::query::ListQuery;

    fn at(minute: i64) -> chrono::DateTime<chrono::Utc> {
        chrono::Utc.with_ymd_and_hms(2025, 4, 1, 12, 0, 0).unwrap() + Duration::minutes(minute)
    }

    async fn point(store: &InMemoryStore, registered_minute: i64) -> PickupPointId {
        let point = PickupPoint::restore(PickupPointId::new(), City::Moscow, at(registered_minute), UserId::new());
        store.insert_pickup_point(&point).await.unwrap();
        point.id_typed()
    }

    fn reception(pvz: PickupPointId, minute: i64, status: ReceptionStatus) -> Reception {
        let closed_at = (status == ReceptionStatus::Closed).then(|| at(minute + 1));
        Reception::restore(ReceptionId::new(), pvz, status, at(minute), closed_at, UserId::new())
    }

    fn product(r: &Reception, minute: i64) -> Product {
        Product::restore(ProductId::new(), r.id_typed(), r.pickup_point_id(), ProductType::Shoes, at(minute), UserId::new())
    }

    async fn commit_all(store: &InMemoryStore, f: impl FnOnce(&mut InMemoryTransaction)) -> Result<(), StoreError> {
        let mut tx = InMemoryTransaction {
            live: Arc::clone(&store.tables),
            view: store.snapshot()?,
            writes: Vec::new(),
        };
        f(&mut tx);
        Box::new(tx).commit().await
    }

    #[tokio::test]
    async fn reception_requires_existing_pickup_point() {
        let store = InMemoryStore::new();
        let mut tx = store.begin(IsolationLevel::ReadCommitted).await.unwrap();
        let err = tx
            .insert_reception(&reception(PickupPointId::new(), 0, ReceptionStatus::InProgress))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ForeignKeyViolation(_)));
    }

    #[tokio::test]
    async fn second_open_reception_is_rejected_inside_one_transaction() {
        let store = InMemoryStore::new();
        let pvz = point(&store, 0).await;
        let mut tx = store.begin(IsolationLevel::ReadCommitted).await.unwrap();
        tx.insert_reception(&reception(pvz, 1, ReceptionStatus::InProgress)).await.unwrap();
        let err = tx
            .insert_reception(&reception(pvz, 2, ReceptionStatus::InProgress))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)));
    }

    #[tokio::test]
    async fn racing_opens_conflict_at_commit() {
        let store = InMemoryStore::new();
        let pvz = point(&store, 0).await;

        let mut first = store.begin(IsolationLevel::ReadCommitted).await.unwrap();
        let mut second = store.begin(IsolationLevel::ReadCommitted).await.unwrap();
        first.insert_reception(&reception(pvz, 1, ReceptionStatus::InProgress)).await.unwrap();
        second.insert_reception(&reception(pvz, 1, ReceptionStatus::InProgress)).await.unwrap();

        first.commit().await.unwrap();
        let err = second.commit().await.unwrap_err();

        assert!(matches!(err, StoreError::UniqueViolation(_)));
        assert_eq!(store.open_reception_count(pvz).unwrap(), 1);
    }

    #[tokio::test]
    async fn failed_commit_applies_nothing() {
        let store = InMemoryStore::new();
        let pvz = point(&store, 0).await;
        let open = reception(pvz, 1, ReceptionStatus::InProgress);
        commit_all(&store, |tx| tx.writes.push(Write::InsertReception(open.clone())))
            .await
            .unwrap();

        let result = commit_all(&store, |tx| {
            tx.writes.push(Write::InsertProduct(product(&open, 2)));
            tx.writes.push(Write::DeleteProduct(ProductId::new()));
        })
        .await;

        assert!(matches!(result, Err(StoreError::Conflict(_))));
        assert!(store.products_of(open.id_typed()).unwrap().is_empty());
    }

    fn closed(r: &Reception, minute: i64) -> Reception {
        Reception::restore(
            r.id_typed(),
            r.pickup_point_id(),
            ReceptionStatus::Closed,
            r.created_at(),
            Some(at(minute)),
            r.opened_by(),
        )
    }

    async fn seeded_open_reception(store: &InMemoryStore) -> Reception {
        let pvz = point(store, 0).await;
        let open = reception(pvz, 1, ReceptionStatus::InProgress);
        let mut tx = store.begin(IsolationLevel::ReadCommitted).await.unwrap();
        tx.insert_reception(&open).await.unwrap();
        tx.commit().await.unwrap();
        open
    }

    #[tokio::test]
    async fn append_loses_to_a_close_committed_after_its_read() {
        let store = InMemoryStore::new();
        let open = seeded_open_reception(&store).await;

        let mut append = store.begin(IsolationLevel::ReadCommitted).await.unwrap();
        let seen = append.latest_reception(open.pickup_point_id()).await.unwrap();
        assert!(seen.is_some_and(|r| r.is_open()));
        append.insert_product(&product(&open, 2)).await.unwrap();

        let mut close = store.begin(IsolationLevel::ReadCommitted).await.unwrap();
        close.update_reception(&closed(&open, 3)).await.unwrap();
        close.commit().await.unwrap();

        let err = append.commit().await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert!(store.products_of(open.id_typed()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn remove_loses_to_an_append_committed_after_its_read() {
        let store = InMemoryStore::new();
        let open = seeded_open_reception(&store).await;
        let older = product(&open, 2);
        let mut tx = store.begin(IsolationLevel::ReadCommitted).await.unwrap();
        tx.insert_product(&older).await.unwrap();
        tx.commit().await.unwrap();

        let mut remove = store.begin(IsolationLevel::ReadCommitted).await.unwrap();
        assert_eq!(remove.latest_product(open.id_typed()).await.unwrap(), Some(older.clone()));
        remove.delete_product(older.id_typed()).await.unwrap();

        let newer = product(&open, 3);
        let mut append = store.begin(IsolationLevel::ReadCommitted).await.unwrap();
        append.insert_product(&newer).await.unwrap();
        append.commit().await.unwrap();

        let err = remove.commit().await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.products_of(open.id_typed()).unwrap(), vec![older, newer]);
    }

    #[tokio::test]
    async fn only_one_of_two_racing_closes_commits() {
        let store = InMemoryStore::new();
        let open = seeded_open_reception(&store).await;

        let mut first = store.begin(IsolationLevel::ReadCommitted).await.unwrap();
        let mut second = store.begin(IsolationLevel::ReadCommitted).await.unwrap();
        first.update_reception(&closed(&open, 2)).await.unwrap();
        second.update_reception(&closed(&open, 3)).await.unwrap();

        first.commit().await.unwrap();
        let err = second.commit().await.unwrap_err();

        assert!(matches!(err, StoreError::Conflict(_)));
        let mut tx = store.begin(IsolationLevel::ReadCommitted).await.unwrap();
        let latest = tx.latest_reception(open.pickup_point_id()).await.unwrap().unwrap();
        assert_eq!(latest.closed_at(), Some(at(2)));
    }

    #[tokio::test]
    async fn equal_timestamps_resolve_to_last_inserted() {
        let store = InMemoryStore::new();
        let pvz = point(&store, 0).await;
        let open = reception(pvz, 1, ReceptionStatus::InProgress);
        let first = product(&open, 5);
        let second = product(&open, 5);

        let mut tx = store.begin(IsolationLevel::ReadCommitted).await.unwrap();
        tx.insert_reception(&open).await.unwrap();
        tx.insert_product(&first).await.unwrap();
        tx.insert_product(&second).await.unwrap();
        assert_eq!(tx.latest_product(open.id_typed()).await.unwrap(), Some(second.clone()));
        tx.commit().await.unwrap();

        let mut tx = store.begin(IsolationLevel::ReadCommitted).await.unwrap();
        assert_eq!(tx.latest_product(open.id_typed()).await.unwrap(), Some(second));
    }

    #[tokio::test]
    async fn list_rows_emit_nulls_for_empty_branches() {
        let store = InMemoryStore::new();
        let bare = point(&store, 0).await;
        let busy = point(&store, 1).await;
        let closed = reception(busy, 2, ReceptionStatus::Closed);
        let open = reception(busy, 5, ReceptionStatus::InProgress);

        let mut tx = store.begin(IsolationLevel::ReadCommitted).await.unwrap();
        tx.insert_reception(&closed).await.unwrap();
        tx.insert_reception(&open).await.unwrap();
        tx.insert_product(&product(&open, 6)).await.unwrap();
        tx.insert_product(&product(&open, 7)).await.unwrap();
        tx.commit().await.unwrap();

        let window = ListQuery {
            start_date: Some(at(-10)),
            end_date: Some(at(10)),
            ..ListQuery::default()
        }
        .normalize(at(100))
        .unwrap();
        let rows = store.list_rows(&window).await.unwrap();

        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].pickup_point_id, bare);
        assert!(rows[0].reception.is_none() && rows[0].product.is_none());
        assert_eq!(rows[1].reception.as_ref().map(|r| r.id), Some(closed.id_typed()));
        assert!(rows[1].product.is_none());
        assert!(rows[2..].iter().all(|r| r.reception.as_ref().map(|c| c.id) == Some(open.id_typed())));
        assert!(rows[2].product.as_ref().unwrap().created_at < rows[3].product.as_ref().unwrap().created_at);
    }

    #[tokio::test]
    async fn list_rows_paginate_pickup_points_and_filter_by_registration() {
        let store = InMemoryStore::new();
        let mut ids = Vec::new();
        for minute in 0..5 {
            ids.push(point(&store, minute).await);
        }

        let window = ListQuery {
            start_date: Some(at(1)),
            end_date: Some(at(4)),
            page: Some(2),
            limit: Some(2),
        }
        .normalize(at(100))
        .unwrap();
        let rows = store.list_rows(&window).await.unwrap();

        let seen: Vec<_> = rows.iter().map(|r| r.pickup_point_id).collect();
        assert_eq!(seen, vec![ids[3], ids[4]]);
    }

    #[tokio::test]
    async fn duplicate_email_is_a_unique_violation() {
        let store = InMemoryStore::new();
        let user = StoredUser {
            user: pvz_auth::User {
                id: UserId::new(),
                email: "a@b.c".into(),
                role: pvz_auth::Role::Employee,
            },
            password_hash: "x".into(),
        };
        store.insert_user(&user).await.unwrap();
        assert!(matches!(store.insert_user(&user).await, Err(StoreError::UniqueViolation(_))));
        assert_eq!(store.find_by_email("a@b.c").await.unwrap(), Some(user));
    }
}

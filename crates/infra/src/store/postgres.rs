//! Postgres storage backend.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `UniqueViolation` |
//! | Database (foreign key violation) | `23503` | `ForeignKeyViolation` |
//! | Database (other) | any other | `Backend` |
//! | RowNotFound | N/A | `NotFound` |
//! | Other | N/A | `Backend` |
//!
//! ## Locking
//!
//! The latest-reception lookup takes `FOR UPDATE` on the row it returns, so an
//! append/remove and a concurrent close of the same reception serialize. Two
//! concurrent opens are stopped by the partial unique index
//! `receptions_one_in_progress_per_pvz`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{FromRow, Postgres, Row};
use tracing::{instrument, Span};
use uuid::Uuid;

use pvz_auth::User;
use pvz_core::{PickupPointId, ProductId, ReceptionId, UserId};
use pvz_pickup_points::{City, PickupPoint};
use pvz_products::{Product, ProductType};
use pvz_receptions::{Reception, ReceptionStatus};

use super::{
    BoxFuture, IsolationLevel, PickupPointRepository, ProductRepository, ReceptionRepository,
    StoreError, StoredUser, Transaction, TransactionManager, UserRepository,
};
use crate::query::ListWindow;
use crate::read_model::{FlatRow, ProductColumns, ReceptionColumns};

/// Postgres-backed implementation of every storage capability.
///
/// `Send + Sync`; all operations go through the SQLx connection pool.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Apply the bundled schema migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&*self.pool)
            .await
            .map_err(|e| StoreError::Backend(format!("migration failed: {e}")))
    }
}

/// An open Postgres transaction.
pub struct PostgresTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl TransactionManager for PostgresStore {
    async fn begin(&self, level: IsolationLevel) -> Result<Box<dyn Transaction>, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin", e))?;

        sqlx::query(&format!("SET TRANSACTION ISOLATION LEVEL {}", level.as_sql()))
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("set_isolation", e))?;

        Ok(Box::new(PostgresTransaction { tx }))
    }
}

#[async_trait]
impl ReceptionRepository for PostgresTransaction {
    #[instrument(skip(self), fields(pickup_point_id = %pickup_point_id), err)]
    async fn pickup_point_exists(&mut self, pickup_point_id: PickupPointId) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT EXISTS (SELECT 1 FROM pvz WHERE id = $1) AS found")
            .bind(pickup_point_id.as_uuid())
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("pickup_point_exists", e))?;

        row.try_get("found")
            .map_err(|e| map_sqlx_error("pickup_point_exists", e))
    }

    #[instrument(skip(self), fields(pickup_point_id = %pickup_point_id), err)]
    async fn latest_reception(&mut self, pickup_point_id: PickupPointId) -> Result<Option<Reception>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, pvz_id, status, created_at, closed_at, user_id
            FROM receptions
            WHERE pvz_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(pickup_point_id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("latest_reception", e))?;

        row.map(|r| ReceptionRow::from_row(&r).map(Reception::from))
            .transpose()
            .map_err(|e| map_sqlx_error("latest_reception", e))
    }

    #[instrument(skip(self, reception), fields(reception_id = %reception.id_typed()), err)]
    async fn insert_reception(&mut self, reception: &Reception) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO receptions (id, user_id, pvz_id, status, created_at, closed_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(reception.id_typed().as_uuid())
        .bind(reception.opened_by().as_uuid())
        .bind(reception.pickup_point_id().as_uuid())
        .bind(reception.status().as_str())
        .bind(reception.created_at())
        .bind(reception.closed_at())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_reception", e))?;

        Ok(())
    }

    #[instrument(skip(self, reception), fields(reception_id = %reception.id_typed()), err)]
    async fn update_reception(&mut self, reception: &Reception) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE receptions SET status = $2, closed_at = $3 WHERE id = $1")
            .bind(reception.id_typed().as_uuid())
            .bind(reception.status().as_str())
            .bind(reception.closed_at())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("update_reception", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("reception {}", reception.id_typed())));
        }
        Ok(())
    }
}

#[async_trait]
impl ProductRepository for PostgresTransaction {
    #[instrument(skip(self, product), fields(product_id = %product.id_typed()), err)]
    async fn insert_product(&mut self, product: &Product) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO products (id, user_id, pvz_id, reception_id, product_type, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(product.id_typed().as_uuid())
        .bind(product.added_by().as_uuid())
        .bind(product.pickup_point_id().as_uuid())
        .bind(product.reception_id().as_uuid())
        .bind(product.product_type().as_str())
        .bind(product.created_at())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_product", e))?;

        Ok(())
    }

    #[instrument(skip(self), fields(reception_id = %reception_id), err)]
    async fn latest_product(&mut self, reception_id: ReceptionId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, reception_id, pvz_id, product_type, created_at, user_id
            FROM products
            WHERE reception_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(reception_id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("latest_product", e))?;

        row.map(|r| ProductRow::from_row(&r).map(Product::from))
            .transpose()
            .map_err(|e| map_sqlx_error("latest_product", e))
    }

    #[instrument(skip(self), fields(product_id = %product_id), err)]
    async fn delete_product(&mut self, product_id: ProductId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(product_id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("product {product_id}")));
        }
        Ok(())
    }
}

impl Transaction for PostgresTransaction {
    fn commit(self: Box<Self>) -> BoxFuture<'static, Result<(), StoreError>> {
        Box::pin(async move {
            self.tx
                .commit()
                .await
                .map_err(|e| map_sqlx_error("commit", e))
        })
    }

    fn rollback(self: Box<Self>) -> BoxFuture<'static, Result<(), StoreError>> {
        Box::pin(async move {
            self.tx
                .rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))
        })
    }
}

#[async_trait]
impl PickupPointRepository for PostgresStore {
    #[instrument(skip(self, pickup_point), fields(pickup_point_id = %pickup_point.id_typed()), err)]
    async fn insert_pickup_point(&self, pickup_point: &PickupPoint) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO pvz (id, user_id, city, created_at) VALUES ($1, $2, $3, $4)")
            .bind(pickup_point.id_typed().as_uuid())
            .bind(pickup_point.registered_by().as_uuid())
            .bind(pickup_point.city().as_str())
            .bind(pickup_point.registered_at())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_pickup_point", e))?;

        Ok(())
    }

    #[instrument(
        skip(self),
        fields(limit = window.limit, offset = window.offset, row_count = tracing::field::Empty),
        err
    )]
    async fn list_rows(&self, window: &ListWindow) -> Result<Vec<FlatRow>, StoreError> {
        // Page over pickup-points first so LIMIT/OFFSET count pickup-points,
        // not joined rows.
        let rows = sqlx::query(
            r#"
            WITH page AS (
                SELECT id, city, created_at
                FROM pvz
                WHERE created_at BETWEEN $1 AND $2
                ORDER BY created_at, id
                LIMIT $3 OFFSET $4
            )
            SELECT
                page.id          AS pvz_id,
                page.city        AS pvz_city,
                page.created_at  AS pvz_created_at,
                r.id             AS reception_id,
                r.status         AS reception_status,
                r.created_at     AS reception_created_at,
                p.id             AS product_id,
                p.product_type   AS product_type,
                p.created_at     AS product_created_at
            FROM page
            LEFT JOIN receptions r ON r.pvz_id = page.id
            LEFT JOIN products p ON p.reception_id = r.id
            ORDER BY page.created_at, page.id, r.created_at, r.id, p.created_at, p.id
            "#,
        )
        .bind(window.range.start)
        .bind(window.range.end)
        .bind(i64::from(window.limit))
        .bind(i64::try_from(window.offset).unwrap_or(i64::MAX))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_rows", e))?;

        let mut flat = Vec::with_capacity(rows.len());
        for row in rows {
            let joined = JoinedRow::from_row(&row).map_err(|e| map_sqlx_error("list_rows", e))?;
            flat.push(joined.into_flat()?);
        }

        Span::current().record("row_count", flat.len());
        Ok(flat)
    }
}

#[async_trait]
impl UserRepository for PostgresStore {
    #[instrument(skip(self, user), fields(user_id = %user.user.id), err)]
    async fn insert_user(&self, user: &StoredUser) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO users (id, email, password_hash, role) VALUES ($1, $2, $3, $4)")
            .bind(user.user.id.as_uuid())
            .bind(&user.user.email)
            .bind(&user.password_hash)
            .bind(user.user.role.as_str())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_user", e))?;

        Ok(())
    }

    #[instrument(skip(self, email), err)]
    async fn find_by_email(&self, email: &str) -> Result<Option<StoredUser>, StoreError> {
        let row = sqlx::query("SELECT id, email, password_hash, role FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_by_email", e))?;

        row.map(|r| UserRow::from_row(&r).map(StoredUser::from))
            .transpose()
            .map_err(|e| map_sqlx_error("find_by_email", e))
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::UniqueViolation(msg),
                Some("23503") => StoreError::ForeignKeyViolation(msg),
                Some("40001") | Some("40P01") => StoreError::Conflict(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::RowNotFound => StoreError::NotFound(format!("row not found in {operation}")),
        sqlx::Error::PoolClosed => StoreError::Backend(format!("connection pool closed in {operation}")),
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}

/// Text column parsed into a domain enum; parse failures surface as decode errors.
fn parse_column<T>(row: &PgRow, column: &str) -> Result<T, sqlx::Error>
where
    T: core::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.try_get(column)?;
    raw.parse::<T>().map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

fn parse_optional_column<T>(row: &PgRow, column: &str) -> Result<Option<T>, sqlx::Error>
where
    T: core::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|s| {
        s.parse::<T>().map_err(|e| sqlx::Error::ColumnDecode {
            index: column.to_string(),
            source: Box::new(e),
        })
    })
    .transpose()
}

#[derive(Debug)]
struct ReceptionRow {
    id: Uuid,
    pvz_id: Uuid,
    status: ReceptionStatus,
    created_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
    user_id: Uuid,
}

impl<'r> FromRow<'r, PgRow> for ReceptionRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ReceptionRow {
            id: row.try_get("id")?,
            pvz_id: row.try_get("pvz_id")?,
            status: parse_column(row, "status")?,
            created_at: row.try_get("created_at")?,
            closed_at: row.try_get("closed_at")?,
            user_id: row.try_get("user_id")?,
        })
    }
}

impl From<ReceptionRow> for Reception {
    fn from(row: ReceptionRow) -> Self {
        Reception::restore(
            ReceptionId::from_uuid(row.id),
            PickupPointId::from_uuid(row.pvz_id),
            row.status,
            row.created_at,
            row.closed_at,
            UserId::from_uuid(row.user_id),
        )
    }
}

#[derive(Debug)]
struct ProductRow {
    id: Uuid,
    reception_id: Uuid,
    pvz_id: Uuid,
    product_type: ProductType,
    created_at: DateTime<Utc>,
    user_id: Uuid,
}

impl<'r> FromRow<'r, PgRow> for ProductRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ProductRow {
            id: row.try_get("id")?,
            reception_id: row.try_get("reception_id")?,
            pvz_id: row.try_get("pvz_id")?,
            product_type: parse_column(row, "product_type")?,
            created_at: row.try_get("created_at")?,
            user_id: row.try_get("user_id")?,
        })
    }
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product::restore(
            ProductId::from_uuid(row.id),
            ReceptionId::from_uuid(row.reception_id),
            PickupPointId::from_uuid(row.pvz_id),
            row.product_type,
            row.created_at,
            UserId::from_uuid(row.user_id),
        )
    }
}

#[derive(Debug)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    role: pvz_auth::Role,
}

impl<'r> FromRow<'r, PgRow> for UserRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(UserRow {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            role: parse_column(row, "role")?,
        })
    }
}

impl From<UserRow> for StoredUser {
    fn from(row: UserRow) -> Self {
        StoredUser {
            user: User {
                id: UserId::from_uuid(row.id),
                email: row.email,
                role: row.role,
            },
            password_hash: row.password_hash,
        }
    }
}

/// One row of the listing join; reception and product columns are nullable.
#[derive(Debug)]
struct JoinedRow {
    pvz_id: Uuid,
    pvz_city: City,
    pvz_created_at: DateTime<Utc>,
    reception_id: Option<Uuid>,
    reception_status: Option<ReceptionStatus>,
    reception_created_at: Option<DateTime<Utc>>,
    product_id: Option<Uuid>,
    product_type: Option<ProductType>,
    product_created_at: Option<DateTime<Utc>>,
}

impl<'r> FromRow<'r, PgRow> for JoinedRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(JoinedRow {
            pvz_id: row.try_get("pvz_id")?,
            pvz_city: parse_column(row, "pvz_city")?,
            pvz_created_at: row.try_get("pvz_created_at")?,
            reception_id: row.try_get("reception_id")?,
            reception_status: parse_optional_column(row, "reception_status")?,
            reception_created_at: row.try_get("reception_created_at")?,
            product_id: row.try_get("product_id")?,
            product_type: parse_optional_column(row, "product_type")?,
            product_created_at: row.try_get("product_created_at")?,
        })
    }
}

impl JoinedRow {
    fn into_flat(self) -> Result<FlatRow, StoreError> {
        let reception = match (self.reception_id, self.reception_status, self.reception_created_at) {
            (Some(id), Some(status), Some(created_at)) => Some(ReceptionColumns {
                id: ReceptionId::from_uuid(id),
                status,
                created_at,
            }),
            (None, _, _) => None,
            (Some(id), _, _) => {
                return Err(StoreError::Backend(format!(
                    "reception {id} has null status or created_at"
                )));
            }
        };

        let product = match (self.product_id, self.product_type, self.product_created_at) {
            (Some(id), Some(product_type), Some(created_at)) => Some(ProductColumns {
                id: ProductId::from_uuid(id),
                product_type,
                created_at,
            }),
            (None, _, _) => None,
            (Some(id), _, _) => {
                return Err(StoreError::Backend(format!(
                    "product {id} has null type or created_at"
                )));
            }
        };

        Ok(FlatRow {
            pickup_point_id: PickupPointId::from_uuid(self.pvz_id),
            city: self.pvz_city,
            registered_at: self.pvz_created_at,
            reception,
            product,
        })
    }
}

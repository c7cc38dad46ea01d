//! Read side of the pickup-point listing.
//!
//! The backing query yields one [`FlatRow`] per (pickup-point, reception,
//! product) combination of a left join; [`reconstruct`] folds those rows back
//! into the nested [`PickupPointView`] tree.

use chrono::{DateTime, Utc};
use serde::Serialize;

use pvz_core::{PickupPointId, ProductId, ReceptionId};
use pvz_pickup_points::City;
use pvz_products::ProductType;
use pvz_receptions::ReceptionStatus;

mod tree;

pub use tree::reconstruct;

/// Reception columns of a joined row (absent when the pickup-point has no
/// receptions).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceptionColumns {
    pub id: ReceptionId,
    pub status: ReceptionStatus,
    pub created_at: DateTime<Utc>,
}

/// Product columns of a joined row (absent when the reception has no
/// products).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductColumns {
    pub id: ProductId,
    pub product_type: ProductType,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatRow {
    pub pickup_point_id: PickupPointId,
    pub city: City,
    pub registered_at: DateTime<Utc>,
    pub reception: Option<ReceptionColumns>,
    pub product: Option<ProductColumns>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PickupPointView {
    pub id: PickupPointId,
    pub city: City,
    pub registration_date: DateTime<Utc>,
    pub receptions: Vec<ReceptionView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceptionView {
    pub id: ReceptionId,
    pub status: ReceptionStatus,
    pub created_at: DateTime<Utc>,
    pub products: Vec<ProductView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductView {
    pub id: ProductId,
    pub product_type: ProductType,
    pub created_at: DateTime<Utc>,
}

impl From<ReceptionColumns> for ReceptionView {
    fn from(cols: ReceptionColumns) -> Self {
        Self {
            id: cols.id,
            status: cols.status,
            created_at: cols.created_at,
            products: Vec::new(),
        }
    }
}

impl From<ProductColumns> for ProductView {
    fn from(cols: ProductColumns) -> Self {
        Self {
            id: cols.id,
            product_type: cols.product_type,
            created_at: cols.created_at,
        }
    }
}

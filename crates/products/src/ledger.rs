//! Product ledger decisions.
//!
//! Both operations first resolve the active reception from the latest
//! reception of the pickup-point; callers must run that lookup and the
//! following write in one transaction.

use chrono::{DateTime, Utc};
use thiserror::Error;

use pvz_core::{PickupPointId, ProductId, ReceptionId, UserId};
use pvz_receptions::Reception;

use crate::{Product, ProductType};

/// Why a pickup-point has no active reception.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inactive {
    NoReception,
    ReceptionClosed,
}

impl core::fmt::Display for Inactive {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Inactive::NoReception => f.write_str("no reception"),
            Inactive::ReceptionClosed => f.write_str("latest reception is closed"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("pickup-point {pickup_point_id} has no active reception: {reason}")]
    NoActiveReception {
        pickup_point_id: PickupPointId,
        reason: Inactive,
    },

    #[error("unsupported product type: {0}")]
    UnsupportedProductType(String),

    #[error("reception {0} has no products to remove")]
    NothingToRemove(ReceptionId),
}

/// Resolve the reception products may be appended to / removed from.
pub fn active_reception(
    pickup_point_id: PickupPointId,
    latest: Option<Reception>,
) -> Result<Reception, LedgerError> {
    match latest {
        None => Err(LedgerError::NoActiveReception {
            pickup_point_id,
            reason: Inactive::NoReception,
        }),
        Some(r) if !r.is_open() => Err(LedgerError::NoActiveReception {
            pickup_point_id,
            reason: Inactive::ReceptionClosed,
        }),
        Some(r) => Ok(r),
    }
}

/// Command: append a product to the open reception of a pickup-point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendProduct {
    pub pickup_point_id: PickupPointId,
    pub product_id: ProductId,
    pub product_type: ProductType,
    pub added_by: UserId,
    pub added_at: DateTime<Utc>,
}

pub fn decide_append(latest: Option<Reception>, cmd: AppendProduct) -> Result<Product, LedgerError> {
    let reception = active_reception(cmd.pickup_point_id, latest)?;

    Ok(Product::restore(
        cmd.product_id,
        reception.id_typed(),
        cmd.pickup_point_id,
        cmd.product_type,
        cmd.added_at,
        cmd.added_by,
    ))
}

/// Pick the product to remove: only the most recently appended one.
///
/// `last` must be the newest product of `reception` (by creation time, ties
/// broken by id).
pub fn decide_remove(reception: &Reception, last: Option<Product>) -> Result<Product, LedgerError> {
    match last {
        Some(p) if p.reception_id() == reception.id_typed() => Ok(p),
        _ => Err(LedgerError::NothingToRemove(reception.id_typed())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pvz_receptions::{decide_close, decide_open, OpenReception};

    fn open_reception(pvz: PickupPointId) -> Reception {
        decide_open(
            None,
            OpenReception {
                pickup_point_id: pvz,
                reception_id: ReceptionId::new(),
                opened_by: UserId::new(),
                opened_at: Utc::now(),
            },
        )
        .unwrap()
    }

    fn append_cmd(pvz: PickupPointId, product_type: ProductType) -> AppendProduct {
        AppendProduct {
            pickup_point_id: pvz,
            product_id: ProductId::new(),
            product_type,
            added_by: UserId::new(),
            added_at: Utc::now(),
        }
    }

    #[test]
    fn append_to_open_reception_records_owner() {
        let pvz = PickupPointId::new();
        let reception = open_reception(pvz);

        let product = decide_append(Some(reception.clone()), append_cmd(pvz, ProductType::Clothes)).unwrap();
        assert_eq!(product.reception_id(), reception.id_typed());
        assert_eq!(product.pickup_point_id(), pvz);
        assert_eq!(product.product_type(), ProductType::Clothes);
    }

    #[test]
    fn append_without_reception_fails() {
        let pvz = PickupPointId::new();
        let err = decide_append(None, append_cmd(pvz, ProductType::Shoes)).unwrap_err();
        assert_eq!(
            err,
            LedgerError::NoActiveReception {
                pickup_point_id: pvz,
                reason: Inactive::NoReception,
            }
        );
    }

    #[test]
    fn append_to_closed_reception_fails() {
        let pvz = PickupPointId::new();
        let closed = decide_close(pvz, Some(open_reception(pvz)), Utc::now()).unwrap();

        let err = decide_append(Some(closed), append_cmd(pvz, ProductType::Shoes)).unwrap_err();
        match err {
            LedgerError::NoActiveReception { reason, .. } => assert_eq!(reason, Inactive::ReceptionClosed),
            _ => panic!("Expected NoActiveReception"),
        }
    }

    #[test]
    fn remove_picks_the_given_last_product() {
        let pvz = PickupPointId::new();
        let reception = open_reception(pvz);
        let last = decide_append(Some(reception.clone()), append_cmd(pvz, ProductType::Electronics)).unwrap();

        let removed = decide_remove(&reception, Some(last.clone())).unwrap();
        assert_eq!(removed, last);
    }

    #[test]
    fn remove_from_empty_reception_fails() {
        let pvz = PickupPointId::new();
        let reception = open_reception(pvz);

        let err = decide_remove(&reception, None).unwrap_err();
        assert_eq!(err, LedgerError::NothingToRemove(reception.id_typed()));
    }

    #[test]
    fn remove_ignores_products_of_other_receptions() {
        let pvz = PickupPointId::new();
        let old = open_reception(pvz);
        let stale = decide_append(Some(old), append_cmd(pvz, ProductType::Clothes)).unwrap();
        let current = open_reception(pvz);

        let err = decide_remove(&current, Some(stale)).unwrap_err();
        assert_eq!(err, LedgerError::NothingToRemove(current.id_typed()));
    }
}

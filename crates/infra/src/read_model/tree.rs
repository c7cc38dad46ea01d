use std::collections::HashMap;

use tracing::warn;

use pvz_core::{PickupPointId, ReceptionId};

use super::{FlatRow, PickupPointView, ReceptionView};

/// Fold left-joined rows into the nested pickup-point tree.
///
/// Output order is first-seen order at every level, so the caller's `ORDER BY`
/// fully determines it. Nodes live in `Vec`s and the maps only hold indexes,
/// which keeps iteration independent of hashing.
pub fn reconstruct(rows: impl IntoIterator<Item = FlatRow>) -> Vec<PickupPointView> {
    let mut points: Vec<PickupPointView> = Vec::new();
    let mut point_index: HashMap<PickupPointId, usize> = HashMap::new();
    let mut reception_index: HashMap<ReceptionId, (usize, usize)> = HashMap::new();

    for row in rows {
        let p = *point_index.entry(row.pickup_point_id).or_insert_with(|| {
            points.push(PickupPointView {
                id: row.pickup_point_id,
                city: row.city,
                registration_date: row.registered_at,
                receptions: Vec::new(),
            });
            points.len() - 1
        });

        let Some(reception) = row.reception else {
            if let Some(product) = row.product {
                warn!(
                    pickup_point_id = %row.pickup_point_id,
                    product_id = %product.id,
                    "product row without reception skipped"
                );
            }
            continue;
        };

        let (p, r) = *reception_index.entry(reception.id).or_insert_with(|| {
            let receptions = &mut points[p].receptions;
            receptions.push(ReceptionView::from(reception));
            (p, receptions.len() - 1)
        });

        if let Some(product) = row.product {
            points[p].receptions[r].products.push(product.into());
        }
    }

    points
}

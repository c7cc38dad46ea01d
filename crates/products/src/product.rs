use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pvz_core::{Entity, PickupPointId, ProductId, ReceptionId, UserId};

use crate::ProductType;

/// A single item recorded against a reception.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    reception_id: ReceptionId,
    /// Denormalized owner for lookups by pickup-point.
    pickup_point_id: PickupPointId,
    product_type: ProductType,
    created_at: DateTime<Utc>,
    added_by: UserId,
}

impl Product {
    pub fn restore(
        id: ProductId,
        reception_id: ReceptionId,
        pickup_point_id: PickupPointId,
        product_type: ProductType,
        created_at: DateTime<Utc>,
        added_by: UserId,
    ) -> Self {
        Self {
            id,
            reception_id,
            pickup_point_id,
            product_type,
            created_at,
            added_by,
        }
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn reception_id(&self) -> ReceptionId {
        self.reception_id
    }

    pub fn pickup_point_id(&self) -> PickupPointId {
        self.pickup_point_id
    }

    pub fn product_type(&self) -> ProductType {
        self.product_type
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn added_by(&self) -> UserId {
        self.added_by
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use pvz_core::{PickupPointId, UserId};
use pvz_observability::{EntityKind, EntitySink};
use pvz_pickup_points::{City, PickupPoint, RegisterPickupPoint};

use super::ServiceError;
use crate::query::ListQuery;
use crate::read_model::{reconstruct, PickupPointView};
use crate::store::PickupPointRepository;

pub struct PickupPointService {
    points: Arc<dyn PickupPointRepository>,
    metrics: Arc<dyn EntitySink>,
}

impl PickupPointService {
    pub fn new(points: Arc<dyn PickupPointRepository>, metrics: Arc<dyn EntitySink>) -> Self {
        Self { points, metrics }
    }

    #[instrument(skip(self), fields(actor = %actor_id), err)]
    pub async fn create(
        &self,
        actor_id: UserId,
        city: &str,
        registered_at: Option<DateTime<Utc>>,
    ) -> Result<PickupPoint, ServiceError> {
        let city: City = city.parse()?;

        let point = PickupPoint::register(
            RegisterPickupPoint {
                pickup_point_id: PickupPointId::new(),
                city,
                registered_at,
                registered_by: actor_id,
            },
            Utc::now(),
        );
        self.points.insert_pickup_point(&point).await?;

        self.metrics.entity_created(EntityKind::PickupPoint);
        info!(pickup_point_id = %point.id_typed(), city = %point.city(), "pickup-point created");
        Ok(point)
    }

    /// One page of pickup-points with their receptions and products.
    #[instrument(skip(self), err)]
    pub async fn list(&self, query: &ListQuery) -> Result<Vec<PickupPointView>, ServiceError> {
        let window = query.normalize(Utc::now())?;
        let rows = self.points.list_rows(&window).await?;
        Ok(reconstruct(rows))
    }
}

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};

use pvz_core::{PickupPointId, ReceptionId, UserId};
use pvz_observability::{EntityKind, EntitySink};
use pvz_receptions::{decide_close, decide_open, OpenReception, Reception, ReceptionError};

use super::{ServiceError, WRITE_ATTEMPTS};
use crate::store::{run_with_isolation, run_with_retry, IsolationLevel, StoreError, TransactionManager};

/// Reception lifecycle: open and close intake at a pickup-point.
pub struct ReceptionService {
    transactions: Arc<dyn TransactionManager>,
    metrics: Arc<dyn EntitySink>,
}

impl ReceptionService {
    pub fn new(transactions: Arc<dyn TransactionManager>, metrics: Arc<dyn EntitySink>) -> Self {
        Self { transactions, metrics }
    }

    #[instrument(skip(self), fields(pickup_point_id = %pickup_point_id, actor = %actor_id), err)]
    pub async fn open(&self, pickup_point_id: PickupPointId, actor_id: UserId) -> Result<Reception, ServiceError> {
        let cmd = OpenReception {
            pickup_point_id,
            reception_id: ReceptionId::new(),
            opened_by: actor_id,
            opened_at: Utc::now(),
        };

        let reception = run_with_isolation::<_, _, ServiceError, _>(
            self.transactions.as_ref(),
            IsolationLevel::ReadCommitted,
            move |tx| {
                Box::pin(async move {
                    if !tx.pickup_point_exists(pickup_point_id).await? {
                        return Err(ReceptionError::InvalidPickupPoint(pickup_point_id).into());
                    }
                    let latest = tx.latest_reception(pickup_point_id).await?;
                    let reception = decide_open(latest.as_ref(), cmd)?;
                    tx.insert_reception(&reception).await?;
                    Ok(reception)
                })
            },
        )
        .await
        .map_err(|e| match e {
            // A concurrent open won the race on the one-open-reception constraint.
            ServiceError::Store(StoreError::UniqueViolation(_)) => {
                ReceptionError::ConflictOpenReceptionExists {
                    pickup_point_id,
                    reception_id: None,
                }
                .into()
            }
            other => other,
        })?;

        self.metrics.entity_created(EntityKind::Reception);
        info!(reception_id = %reception.id_typed(), "reception opened");
        Ok(reception)
    }

    #[instrument(skip(self), fields(pickup_point_id = %pickup_point_id), err)]
    pub async fn close(&self, pickup_point_id: PickupPointId) -> Result<Reception, ServiceError> {
        let closed_at = Utc::now();

        // A lost race against another close is rerun and then reports AlreadyClosed.
        let reception = run_with_retry::<_, _, ServiceError, _>(
            self.transactions.as_ref(),
            IsolationLevel::ReadCommitted,
            WRITE_ATTEMPTS,
            move |tx| {
                Box::pin(async move {
                    let latest = tx.latest_reception(pickup_point_id).await?;
                    let closed = decide_close(pickup_point_id, latest, closed_at)?;
                    tx.update_reception(&closed).await?;
                    Ok(closed)
                })
            },
        )
        .await?;

        info!(reception_id = %reception.id_typed(), "reception closed");
        Ok(reception)
    }
}

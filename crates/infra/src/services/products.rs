use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};

use pvz_core::{PickupPointId, ProductId, UserId};
use pvz_observability::{EntityKind, EntitySink};
use pvz_products::{active_reception, decide_append, decide_remove, AppendProduct, Product, ProductType};

use super::{ServiceError, WRITE_ATTEMPTS};
use crate::store::{run_with_retry, IsolationLevel, TransactionManager};

/// Product ledger: append to / remove from the open reception of a
/// pickup-point.
pub struct ProductService {
    transactions: Arc<dyn TransactionManager>,
    metrics: Arc<dyn EntitySink>,
}

impl ProductService {
    pub fn new(transactions: Arc<dyn TransactionManager>, metrics: Arc<dyn EntitySink>) -> Self {
        Self { transactions, metrics }
    }

    #[instrument(skip(self), fields(pickup_point_id = %pickup_point_id, actor = %actor_id), err)]
    pub async fn append(
        &self,
        pickup_point_id: PickupPointId,
        actor_id: UserId,
        product_type: &str,
    ) -> Result<Product, ServiceError> {
        let product_type: ProductType = product_type.parse()?;

        let cmd = AppendProduct {
            pickup_point_id,
            product_id: ProductId::new(),
            product_type,
            added_by: actor_id,
            added_at: Utc::now(),
        };

        let product = run_with_retry::<_, _, ServiceError, _>(
            self.transactions.as_ref(),
            IsolationLevel::ReadCommitted,
            WRITE_ATTEMPTS,
            move |tx| {
                let cmd = cmd.clone();
                Box::pin(async move {
                    let latest = tx.latest_reception(pickup_point_id).await?;
                    let product = decide_append(latest, cmd)?;
                    tx.insert_product(&product).await?;
                    Ok(product)
                })
            },
        )
        .await?;

        self.metrics.entity_created(EntityKind::Product);
        info!(product_id = %product.id_typed(), reception_id = %product.reception_id(), "product added");
        Ok(product)
    }

    /// Remove the most recently added product of the open reception and
    /// return it. An append that commits between the lookup and the delete
    /// makes this rerun against the new newest product.
    #[instrument(skip(self), fields(pickup_point_id = %pickup_point_id), err)]
    pub async fn remove_last(&self, pickup_point_id: PickupPointId) -> Result<Product, ServiceError> {
        let removed = run_with_retry::<_, _, ServiceError, _>(
            self.transactions.as_ref(),
            IsolationLevel::ReadCommitted,
            WRITE_ATTEMPTS,
            move |tx| {
                Box::pin(async move {
                    let reception = active_reception(pickup_point_id, tx.latest_reception(pickup_point_id).await?)?;
                    let last = tx.latest_product(reception.id_typed()).await?;
                    let victim = decide_remove(&reception, last)?;
                    tx.delete_product(victim.id_typed()).await?;
                    Ok(victim)
                })
            },
        )
        .await?;

        info!(product_id = %removed.id_typed(), "product removed");
        Ok(removed)
    }
}

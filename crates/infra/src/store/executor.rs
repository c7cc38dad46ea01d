//! Transaction executor.

use tracing::{debug, error, warn};

use super::{BoxFuture, IsolationLevel, StoreError, Transaction, TransactionManager};

/// Run `work` inside one transaction at `level`.
///
/// Commits when `work` returns `Ok` and rolls back when it returns `Err`. If
/// the returned future is dropped midway (request cancelled) the transaction
/// is dropped uncommitted, which discards its writes in every backend.
pub async fn run_with_isolation<M, T, E, F>(manager: &M, level: IsolationLevel, work: F) -> Result<T, E>
where
    M: TransactionManager + ?Sized,
    F: for<'t> FnOnce(&'t mut (dyn Transaction + 'static)) -> BoxFuture<'t, Result<T, E>> + Send,
    T: Send,
    E: From<StoreError> + core::fmt::Display + Send,
{
    let mut tx = manager.begin(level).await?;

    let outcome = work(tx.as_mut()).await;
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            debug!(error = %err, isolation = level.as_sql(), "unit of work failed, rolling back");
            if let Err(rollback_err) = tx.rollback().await {
                error!(error = %rollback_err, "rollback failed");
            }
            Err(err)
        }
    }
}

/// Errors after which a unit of work may be rerun from scratch.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for StoreError {
    fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

/// [`run_with_isolation`], rerunning `work` in a fresh transaction while it
/// fails with a retryable error. At most `attempts` runs in total.
pub async fn run_with_retry<M, T, E, F>(manager: &M, level: IsolationLevel, attempts: u32, work: F) -> Result<T, E>
where
    M: TransactionManager + ?Sized,
    F: for<'t> Fn(&'t mut (dyn Transaction + 'static)) -> BoxFuture<'t, Result<T, E>> + Send + Sync,
    T: Send,
    E: From<StoreError> + Retryable + core::fmt::Display + Send,
{
    let mut attempt = 1;
    loop {
        match run_with_isolation(manager, level, &work).await {
            Err(err) if err.is_retryable() && attempt < attempts => {
                warn!(error = %err, attempt, "write conflict, rerunning unit of work");
                attempt += 1;
            }
            outcome => return outcome,
        }
    }
}

//! Reception lifecycle decisions.
//!
//! States per pickup-point, derived from its most recent reception:
//!
//! | Latest reception | State | Open | Close |
//! |---|---|---|---|
//! | none | `NoOpenReception` | new `in_progress` reception | `InvalidPickupPoint` |
//! | `in_progress` | `Open` | `ConflictOpenReceptionExists` | reception becomes `closed` |
//! | `closed` | `Closed` | new `in_progress` reception | `AlreadyClosed` |

use chrono::{DateTime, Utc};
use thiserror::Error;

use pvz_core::{PickupPointId, ReceptionId, UserId};

use crate::{Reception, ReceptionStatus};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReceptionError {
    #[error("pickup-point {pickup_point_id} already has an open reception")]
    ConflictOpenReceptionExists {
        pickup_point_id: PickupPointId,
        reception_id: Option<ReceptionId>,
    },

    #[error("pickup-point {0} is unknown or has no receptions")]
    InvalidPickupPoint(PickupPointId),

    #[error("reception {0} is already closed")]
    AlreadyClosed(ReceptionId),
}

/// Lifecycle state of a pickup-point as seen through its latest reception.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceptionState {
    NoOpenReception,
    Open(ReceptionId),
    Closed(ReceptionId),
}

impl ReceptionState {
    pub fn of_latest(latest: Option<&Reception>) -> Self {
        match latest {
            None => ReceptionState::NoOpenReception,
            Some(r) if r.status() == ReceptionStatus::InProgress => ReceptionState::Open(r.id_typed()),
            Some(r) => ReceptionState::Closed(r.id_typed()),
        }
    }
}

/// Command: open intake at a pickup-point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenReception {
    pub pickup_point_id: PickupPointId,
    pub reception_id: ReceptionId,
    pub opened_by: UserId,
    pub opened_at: DateTime<Utc>,
}

/// Decide whether a new reception may be opened given the latest one.
pub fn decide_open(latest: Option<&Reception>, cmd: OpenReception) -> Result<Reception, ReceptionError> {
    match ReceptionState::of_latest(latest) {
        ReceptionState::Open(reception_id) => Err(ReceptionError::ConflictOpenReceptionExists {
            pickup_point_id: cmd.pickup_point_id,
            reception_id: Some(reception_id),
        }),
        ReceptionState::NoOpenReception | ReceptionState::Closed(_) => Ok(Reception::opened(
            cmd.reception_id,
            cmd.pickup_point_id,
            cmd.opened_by,
            cmd.opened_at,
        )),
    }
}

/// Decide the outcome of closing the latest reception of `pickup_point_id`.
///
/// Returns the reception in its closed form, stamped with `closed_at`.
pub fn decide_close(
    pickup_point_id: PickupPointId,
    latest: Option<Reception>,
    closed_at: DateTime<Utc>,
) -> Result<Reception, ReceptionError> {
    let Some(mut reception) = latest else {
        return Err(ReceptionError::InvalidPickupPoint(pickup_point_id));
    };

    if !reception.is_open() {
        return Err(ReceptionError::AlreadyClosed(reception.id_typed()));
    }

    reception.mark_closed(closed_at);
    Ok(reception)
}

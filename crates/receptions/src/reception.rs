use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pvz_core::{DomainError, Entity, PickupPointId, ReceptionId, UserId};

/// Reception status lifecycle: `in_progress` -> `closed`, once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceptionStatus {
    InProgress,
    Closed,
}

impl ReceptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReceptionStatus::InProgress => "in_progress",
            ReceptionStatus::Closed => "closed",
        }
    }
}

impl core::fmt::Display for ReceptionStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReceptionStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(ReceptionStatus::InProgress),
            "closed" => Ok(ReceptionStatus::Closed),
            other => Err(DomainError::validation(format!("unknown reception status: {other}"))),
        }
    }
}

/// An intake session at a pickup-point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reception {
    id: ReceptionId,
    pickup_point_id: PickupPointId,
    status: ReceptionStatus,
    created_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
    opened_by: UserId,
}

impl Reception {
    /// Rebuild from persisted columns.
    pub fn restore(
        id: ReceptionId,
        pickup_point_id: PickupPointId,
        status: ReceptionStatus,
        created_at: DateTime<Utc>,
        closed_at: Option<DateTime<Utc>>,
        opened_by: UserId,
    ) -> Self {
        Self {
            id,
            pickup_point_id,
            status,
            created_at,
            closed_at,
            opened_by,
        }
    }

    pub(crate) fn opened(
        id: ReceptionId,
        pickup_point_id: PickupPointId,
        opened_by: UserId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            pickup_point_id,
            status: ReceptionStatus::InProgress,
            created_at,
            closed_at: None,
            opened_by,
        }
    }

    pub(crate) fn mark_closed(&mut self, closed_at: DateTime<Utc>) {
        self.status = ReceptionStatus::Closed;
        self.closed_at = Some(closed_at);
    }

    pub fn id_typed(&self) -> ReceptionId {
        self.id
    }

    pub fn pickup_point_id(&self) -> PickupPointId {
        self.pickup_point_id
    }

    pub fn status(&self) -> ReceptionStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn closed_at(&self) -> Option<DateTime<Utc>> {
        self.closed_at
    }

    pub fn opened_by(&self) -> UserId {
        self.opened_by
    }

    pub fn is_open(&self) -> bool {
        self.status == ReceptionStatus::InProgress
    }
}

impl Entity for Reception {
    type Id = ReceptionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

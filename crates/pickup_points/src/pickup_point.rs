use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pvz_core::{Entity, PickupPointId, UserId};

use crate::City;

/// A registered pickup-point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickupPoint {
    id: PickupPointId,
    city: City,
    registered_at: DateTime<Utc>,
    registered_by: UserId,
}

/// Command: register a new pickup-point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterPickupPoint {
    pub pickup_point_id: PickupPointId,
    pub city: City,
    /// Explicit registration date; `None` means "now".
    pub registered_at: Option<DateTime<Utc>>,
    pub registered_by: UserId,
}

impl PickupPoint {
    pub fn register(cmd: RegisterPickupPoint, now: DateTime<Utc>) -> Self {
        Self {
            id: cmd.pickup_point_id,
            city: cmd.city,
            registered_at: cmd.registered_at.unwrap_or(now),
            registered_by: cmd.registered_by,
        }
    }

    /// Rebuild from persisted columns.
    pub fn restore(
        id: PickupPointId,
        city: City,
        registered_at: DateTime<Utc>,
        registered_by: UserId,
    ) -> Self {
        Self {
            id,
            city,
            registered_at,
            registered_by,
        }
    }

    pub fn id_typed(&self) -> PickupPointId {
        self.id
    }

    pub fn city(&self) -> City {
        self.city
    }

    pub fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }

    pub fn registered_by(&self) -> UserId {
        self.registered_by
    }
}

impl Entity for PickupPoint {
    type Id = PickupPointId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn command(registered_at: Option<DateTime<Utc>>) -> RegisterPickupPoint {
        RegisterPickupPoint {
            pickup_point_id: PickupPointId::new(),
            city: City::Moscow,
            registered_at,
            registered_by: UserId::new(),
        }
    }

    #[test]
    fn registration_date_defaults_to_now() {
        let now = Utc.with_ymd_and_hms(2025, 4, 1, 12, 0, 0).unwrap();
        let point = PickupPoint::register(command(None), now);
        assert_eq!(point.registered_at(), now);
        assert_eq!(point.city(), City::Moscow);
    }

    #[test]
    fn explicit_registration_date_is_kept() {
        let now = Utc.with_ymd_and_hms(2025, 4, 1, 12, 0, 0).unwrap();
        let earlier = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let cmd = command(Some(earlier));
        let id = cmd.pickup_point_id;

        let point = PickupPoint::register(cmd, now);
        assert_eq!(point.registered_at(), earlier);
        assert_eq!(*point.id(), id);
    }
}

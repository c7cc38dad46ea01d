//! Pickup-point (PVZ) domain module.
//!
//! Pickup-points are registered once by a moderator and are immutable
//! afterwards; receptions and products hang off them by id.

pub mod city;
pub mod pickup_point;

pub use city::City;
pub use pickup_point::{PickupPoint, RegisterPickupPoint};

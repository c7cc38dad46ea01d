//! Reception domain module.
//!
//! A reception is an intake session at a pickup-point. This crate holds the
//! lifecycle rules as pure decisions over "the most recent reception" of a
//! pickup-point; reading that reception and persisting the outcome inside one
//! transaction is the caller's job (see `pvz-infra`).

pub mod lifecycle;
pub mod reception;

pub use lifecycle::{decide_close, decide_open, OpenReception, ReceptionError, ReceptionState};
pub use reception::{Reception, ReceptionStatus};

//! Products domain module (the product ledger of a reception).
//!
//! Products are appended to the open reception of a pickup-point and removed
//! strictly last-in-first-out while that reception stays open. Everything here
//! is deterministic domain logic (no IO, no HTTP, no storage).

pub mod ledger;
pub mod product;
pub mod product_type;

pub use ledger::{active_reception, decide_append, decide_remove, AppendProduct, Inactive, LedgerError};
pub use product::Product;
pub use product_type::ProductType;

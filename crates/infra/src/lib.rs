//! Infrastructure layer: transactional storage, the read model and the
//! application services that tie domain decisions to storage.

pub mod query;
pub mod read_model;
pub mod services;
pub mod store;

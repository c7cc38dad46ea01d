//! HTTP API: configuration, routing, auth middleware and request/response
//! mapping over the pickup-point services.

pub mod app;
pub mod authz;
pub mod config;
pub mod context;
pub mod middleware;

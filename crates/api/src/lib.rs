//! HTTP API: configuration, routing, guard middleware and request/response
//! mapping.

pub mod app;
pub mod config;
pub mod middleware;

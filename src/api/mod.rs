//! HTTP API - Handlers, routes, and response models

pub mod handlers;
pub mod models;
pub mod routes;

//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request data structures
//!
//! # API Structure
//!
//! - `GET /`: liveness message
//! - `GET /healthz`: health probe
//! - `POST /upload`: relay a multipart file into the configured bucket
//!
//! The OpenAPI document for these routes is served at `/api-docs/openapi.json`.

pub mod handlers;
pub mod models;

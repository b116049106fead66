//! HTTP request handlers.
//!
//! Handlers answer in plain text. Failures are returned as [`crate::errors::Error`], which
//! renders its own status code and message.
//!
//! - [`status`]: liveness and health probes
//! - [`upload`]: the multipart upload relay

pub mod status;
pub mod upload;

//! API request and response data models.
//!
//! - [`uploads`]: the multipart upload form and the buffered file it yields

pub mod uploads;

//! Liveness and health probes.

/// Body returned by `GET /`
pub const READY_MESSAGE: &str = "Upload Service Ready!";

#[utoipa::path(
    get,
    path = "/",
    tag = "status",
    summary = "Liveness check",
    description = "Always answers with a fixed message while the process is serving.",
    responses(
        (status = 200, description = "Service is ready", body = String, content_type = "text/plain"),
    )
)]
pub async fn home() -> &'static str {
    READY_MESSAGE
}

#[utoipa::path(
    get,
    path = "/healthz",
    tag = "status",
    summary = "Health check",
    responses(
        (status = 200, description = "Service is healthy", body = String, content_type = "text/plain"),
    )
)]
pub async fn healthz() -> &'static str {
    "OK"
}

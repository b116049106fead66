//! OpenAPI documentation for the relay's HTTP surface, served at `/api-docs/openapi.json`.

use utoipa::OpenApi;

use crate::api;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "uprelay",
        description = "Relays multipart file uploads into an object-storage bucket."
    ),
    paths(
        api::handlers::status::home,
        api::handlers::status::healthz,
        api::handlers::upload::upload_file,
    ),
    components(schemas(api::models::uploads::UploadForm)),
    tags(
        (name = "status", description = "Liveness and health probes"),
        (name = "upload", description = "File upload relay")
    )
)]
pub struct ApiDoc;

use crate::AppState;
use crate::api::models::uploads::{FileUpload, UploadForm};
use crate::errors::{Error, Result};
use axum::extract::{Multipart, State, multipart::MultipartRejection};
use bytes::BytesMut;

/// Name of the multipart field carrying the file
pub const FILE_FIELD: &str = "file";

#[utoipa::path(
    post,
    path = "/upload",
    tag = "upload",
    summary = "Upload file",
    description = "Store the `file` part in the configured bucket under its client-supplied filename. \
                   An existing object with the same name is overwritten.",
    request_body(
        content = UploadForm,
        content_type = "multipart/form-data",
        description = "Multipart form with a `file` part"
    ),
    responses(
        (status = 200, description = "File stored", body = String, content_type = "text/plain"),
        (status = 400, description = "No file provided or malformed multipart body", body = String, content_type = "text/plain"),
        (status = 413, description = "Payload too large", body = String, content_type = "text/plain"),
        (status = 502, description = "Object storage failed to store the file", body = String, content_type = "text/plain")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn upload_file(State(state): State<AppState>, multipart: std::result::Result<Multipart, MultipartRejection>) -> Result<String> {
    let result = relay_upload(&state, multipart).await;

    let outcome = match &result {
        Ok(_) => "stored",
        Err(Error::Storage { .. }) => "failed",
        Err(_) => "rejected",
    };
    metrics::counter!("uprelay_uploads_total", "outcome" => outcome).increment(1);

    result
}

async fn relay_upload(state: &AppState, multipart: std::result::Result<Multipart, MultipartRejection>) -> Result<String> {
    // A body that isn't a multipart form has no file in it either
    let mut multipart = multipart.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Upload request is not a multipart form");
        Error::NoFileProvided
    })?;

    let FileUpload {
        file_name,
        content_type,
        content,
    } = read_file_part(&mut multipart).await?.ok_or(Error::NoFileProvided)?;

    let size = content.len();
    let store = &state.store;

    store
        .put(&file_name, content, content_type.as_deref())
        .await
        .map_err(|source| Error::Storage {
            key: file_name.clone(),
            bucket: store.bucket().to_string(),
            source,
        })?;

    metrics::counter!("uprelay_uploaded_bytes_total").increment(size as u64);
    tracing::info!(
        key = %file_name,
        bucket = %store.bucket(),
        bytes = size,
        content_type = ?content_type,
        "File uploaded"
    );

    Ok(format!("File {file_name} uploaded successfully!"))
}

/// Read the first `file` part that carries a filename into memory.
///
/// A `file` part without a `filename` parameter is a plain form value, not a file, and is
/// skipped. Returns `None` when no file part is found, or when the first one has an empty
/// filename. Other fields are skipped, as are any further `file` parts.
async fn read_file_part(multipart: &mut Multipart) -> Result<Option<FileUpload>> {
    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            tracing::trace!(field = ?field.name(), "Skipping multipart field");
            continue;
        }

        let Some(file_name) = field.file_name().map(str::to_string) else {
            tracing::trace!("Skipping `file` form value without a filename");
            continue;
        };
        if file_name.is_empty() {
            tracing::debug!("`file` part has an empty filename");
            return Ok(None);
        }
        let content_type = field.content_type().map(str::to_string);

        tracing::debug!(key = %file_name, content_type = ?content_type, "Receiving file");

        let mut content = BytesMut::new();
        let mut chunk_number = 0u64;
        while let Some(chunk) = field.chunk().await? {
            chunk_number += 1;
            content.extend_from_slice(&chunk);

            tracing::trace!(
                key = %file_name,
                chunk_number = chunk_number,
                chunk_size = chunk.len(),
                total_size = content.len(),
                "Received chunk"
            );
        }

        return Ok(Some(FileUpload {
            file_name,
            content_type,
            content: content.freeze(),
        }));
    }

    Ok(None)
}

use crate::storage::StorageError;
use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// The request carried no usable `file` part
    #[error("No file provided.")]
    NoFileProvided,

    /// The multipart body could not be read (truncated stream, body limit exceeded, ...)
    #[error("Failed to read multipart body: {0}")]
    Multipart(#[from] MultipartError),

    /// The storage backend refused or failed to store the object
    #[error("Failed to store {key} in bucket {bucket}: {source}")]
    Storage {
        key: String,
        bucket: String,
        #[source]
        source: StorageError,
    },
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::NoFileProvided => StatusCode::BAD_REQUEST,
            Error::Multipart(err) => err.status(),
            Error::Storage { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::NoFileProvided => "No file provided.".to_string(),
            Error::Multipart(err) => err.body_text(),
            Error::Storage { .. } => "Failed to upload file.".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Storage { key, bucket, source } => {
                tracing::error!(key = %key, bucket = %bucket, error = %source, "Upload to object storage failed");
            }
            Error::NoFileProvided | Error::Multipart(_) => {
                tracing::debug!("Client error: {}", self);
            }
        }

        (self.status_code(), self.user_message()).into_response()
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body should be readable");
        String::from_utf8(bytes.to_vec()).expect("body should be utf-8")
    }

    #[tokio::test]
    async fn test_no_file_is_plain_400() {
        let response = Error::NoFileProvided.into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "No file provided.");
    }

    #[tokio::test]
    async fn test_storage_error_hides_backend_details() {
        let err = Error::Storage {
            key: "photo.png".to_string(),
            bucket: "private-bucket".to_string(),
            source: StorageError::Service {
                code: "AccessDenied".to_string(),
                message: "Access Denied".to_string(),
            },
        };

        // Full context stays available for logs
        assert!(err.to_string().contains("AccessDenied"));
        assert!(err.to_string().contains("private-bucket"));

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let body = body_text(response).await;
        assert_eq!(body, "Failed to upload file.");
    }
}

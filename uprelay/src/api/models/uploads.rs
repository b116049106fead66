use bytes::Bytes;
use utoipa::ToSchema;

/// Multipart form accepted by `POST /upload`.
///
/// Only used for API docs; the handler reads the body part by part.
#[derive(Debug, ToSchema)]
pub struct UploadForm {
    /// File content. The part's filename is used verbatim as the object key.
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

/// A file received on `/upload`, fully buffered and ready to hand to storage
#[derive(Debug, Clone)]
pub struct FileUpload {
    /// Client-supplied filename. Untrusted: not sanitized or normalized.
    pub file_name: String,
    /// Content type declared on the part, if any
    pub content_type: Option<String>,
    pub content: Bytes,
}

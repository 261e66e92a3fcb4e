//! File upload endpoint (spec §6): `POST /files`.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use core::FlowError;
use serde::Serialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::{content_path, AppState};

const MAX_SIZE_BYTES: usize = 10 * 1024 * 1024;
const PDF_HEADER: &[u8] = b"%PDF-";

#[derive(Serialize)]
pub struct UploadResponse {
    pub file_id: Uuid,
    pub filename: String,
    pub message: String,
}

/// Validates MIME type, size, `%PDF-` header, and rejects encrypted PDFs
/// (spec §6 "File constraints") before anything touches disk or the
/// repository. `file_id` is generated here so the on-disk content path and
/// the repository row are created with the same id (see `content_path`).
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| FlowError::Validation(format!("malformed multipart body: {e}")))?
        .ok_or_else(|| FlowError::Validation("missing 'file' field".into()))?;

    let filename = field.file_name().unwrap_or("upload.pdf").to_string();
    let content_type = field.content_type().unwrap_or("application/octet-stream").to_string();

    if content_type != "application/pdf" {
        return Err(FlowError::Validation(format!("unsupported mime type '{content_type}'")).into());
    }

    let bytes = field.bytes().await.map_err(|e| FlowError::Validation(format!("failed to read upload: {e}")))?;

    if bytes.len() > MAX_SIZE_BYTES {
        return Err(FlowError::Validation(format!("file exceeds {MAX_SIZE_BYTES} byte limit")).into());
    }
    if !bytes.starts_with(PDF_HEADER) {
        return Err(FlowError::Validation("file does not start with a PDF header".into()).into());
    }
    if is_encrypted_pdf(&bytes) {
        return Err(FlowError::Validation("encrypted PDFs are not supported".into()).into());
    }

    let file_id = Uuid::new_v4();
    let path = content_path(&state.upload_dir, file_id);
    tokio::fs::create_dir_all(&state.upload_dir)
        .await
        .map_err(|e| FlowError::Internal(format!("failed to prepare upload directory: {e}")))?;
    tokio::fs::write(&path, &bytes).await.map_err(|e| FlowError::Internal(format!("failed to store upload: {e}")))?;

    state
        .repository
        .create_uploaded_file(
            file_id,
            &filename,
            &content_type,
            bytes.len() as i64,
            &path.to_string_lossy(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(UploadResponse { file_id, filename, message: "file uploaded".into() })))
}

/// Crude structural check: the `/Encrypt` dictionary key only appears in
/// the trailer of an encrypted PDF. Cheap enough to run on every upload
/// without a full parse.
fn is_encrypted_pdf(bytes: &[u8]) -> bool {
    bytes.windows(b"/Encrypt".len()).any(|w| w == b"/Encrypt")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_encrypt_dictionary_key() {
        let clean = b"%PDF-1.4\n%rest of file\n%%EOF";
        let encrypted = b"%PDF-1.4\n1 0 obj<</Encrypt 2 0 R>>endobj\n%%EOF";
        assert!(!is_encrypted_pdf(clean));
        assert!(is_encrypted_pdf(encrypted));
    }
}

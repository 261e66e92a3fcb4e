//! The `extract_text` node type (spec §4.2). Reads the file referenced by
//! `config.file_id`; ignores `input_text` entirely.

use async_trait::async_trait;
use core::FlowError;
use serde_json::Value;

use crate::config::parse_extract_text;
use crate::traits::ExecutableNode;
use services::Services;

/// Maximum accepted PDF size (spec §4.2/§6).
pub const MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;

pub struct ExtractTextNode;

#[async_trait]
impl ExecutableNode for ExtractTextNode {
    async fn execute(&self, config_snapshot: &Value, _input_text: &str, services: &Services) -> Result<String, FlowError> {
        let config = parse_extract_text(config_snapshot)?;

        let file = services
            .files
            .load(config.file_id)
            .await
            .map_err(FlowError::from)?;

        if file.mime_type != "application/pdf" {
            return Err(FlowError::Validation(format!(
                "file {} is not a PDF (mime type '{}')",
                config.file_id, file.mime_type
            )));
        }

        if file.size_bytes > MAX_FILE_SIZE_BYTES {
            return Err(FlowError::Validation(format!(
                "file {} is {} bytes, exceeds the {} byte limit",
                config.file_id, file.size_bytes, MAX_FILE_SIZE_BYTES
            )));
        }

        if !file.bytes.starts_with(b"%PDF-") {
            return Err(FlowError::Validation(format!(
                "file {} does not start with a %PDF- header",
                config.file_id
            )));
        }

        let text = services::extract_pdf_text(&file.bytes).map_err(FlowError::from)?;

        if text.trim().is_empty() {
            return Err(FlowError::Validation(format!(
                "file {} produced no extractable text",
                config.file_id
            )));
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use services::{Clock, FileStore, LlmClient, LlmRequest, LlmResponse, LoadedFile, ServiceError, SystemClock};
    use std::sync::Arc;
    use uuid::Uuid;

    struct FixedFileStore {
        file: LoadedFile,
    }

    #[async_trait]
    impl FileStore for FixedFileStore {
        async fn load(&self, _file_id: Uuid) -> Result<LoadedFile, ServiceError> {
            Ok(self.file.clone())
        }
    }

    struct UnreachableLlm;
    #[async_trait]
    impl LlmClient for UnreachableLlm {
        async fn complete(&self, _request: LlmRequest) -> Result<LlmResponse, ServiceError> {
            panic!("extract_text must never call the LLM")
        }
    }

    fn services_with(file: LoadedFile) -> Services {
        Services::new(Arc::new(UnreachableLlm), Arc::new(FixedFileStore { file }), Arc::new(SystemClock))
    }

    #[tokio::test]
    async fn rejects_non_pdf_mime_type() {
        let services = services_with(LoadedFile {
            mime_type: "text/plain".into(),
            size_bytes: 3,
            bytes: b"abc".to_vec(),
        });
        let config = serde_json::json!({ "file_id": Uuid::new_v4() });
        let err = ExtractTextNode.execute(&config, "", &services).await.unwrap_err();
        assert!(matches!(err, FlowError::Validation(_)));
    }

    #[tokio::test]
    async fn rejects_oversized_file() {
        let services = services_with(LoadedFile {
            mime_type: "application/pdf".into(),
            size_bytes: MAX_FILE_SIZE_BYTES + 1,
            bytes: b"%PDF-1.4".to_vec(),
        });
        let config = serde_json::json!({ "file_id": Uuid::new_v4() });
        let err = ExtractTextNode.execute(&config, "", &services).await.unwrap_err();
        assert!(matches!(err, FlowError::Validation(_)));
    }

    #[tokio::test]
    async fn rejects_missing_pdf_header() {
        let services = services_with(LoadedFile {
            mime_type: "application/pdf".into(),
            size_bytes: 3,
            bytes: b"abc".to_vec(),
        });
        let config = serde_json::json!({ "file_id": Uuid::new_v4() });
        let err = ExtractTextNode.execute(&config, "", &services).await.unwrap_err();
        assert!(matches!(err, FlowError::Validation(_)));
    }
}

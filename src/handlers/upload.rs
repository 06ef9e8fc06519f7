use axum::{
    extract::{Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
};
use serde::Serialize;
use std::path::Path;
use tracing::info;
use uuid::Uuid;

use crate::error::KomikError;
use crate::extract::Json;
use crate::middleware::auth::Privileged;
use crate::router::KomikState;

const FILE_FIELD: &str = "file";
const MAX_EXTENSION_LEN: usize = 8;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub url: String,
    pub filename: String,
    pub original_name: String,
    pub mime_type: String,
}

/// Lower-cased alphanumeric extension of `original`, if it has a usable one.
fn sanitized_extension(original: &str) -> Option<String> {
    let ext = Path::new(original).extension()?.to_str()?;
    (!ext.is_empty()
        && ext.len() <= MAX_EXTENSION_LEN
        && ext.chars().all(|c| c.is_ascii_alphanumeric()))
    .then(|| ext.to_ascii_lowercase())
}

fn stored_name(original: &str) -> String {
    let stem = Uuid::new_v4().simple().to_string();
    match sanitized_extension(original) {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem,
    }
}

/// POST /chapters/upload, multipart field `file`.
pub async fn upload(
    State(state): State<KomikState>,
    Privileged(caller): Privileged,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<UploadedFile>), KomikError> {
    let mut multipart = multipart?;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| KomikError::validation(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let original_name = field.file_name().unwrap_or_default().to_string();
        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| KomikError::validation(e.body_text()))?;
        if bytes.is_empty() {
            return Err(KomikError::validation("file is empty"));
        }

        let dir = &state.config.basic.upload_dir;
        tokio::fs::create_dir_all(dir).await?;
        let filename = stored_name(&original_name);
        tokio::fs::write(dir.join(&filename), &bytes).await?;
        info!(
            by = %caller.id,
            filename = %filename,
            size = bytes.len(),
            mime_type = %mime_type,
            "file uploaded"
        );

        return Ok((
            StatusCode::CREATED,
            Json(UploadedFile {
                url: format!("/uploads/{filename}"),
                filename,
                original_name,
                mime_type,
            }),
        ));
    }
    Err(KomikError::validation("file is required"))
}

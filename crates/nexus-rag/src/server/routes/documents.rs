//! Document management endpoints: upload, list, delete, (re)process

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::processing::IngestJob;
use crate::server::auth::OwnerId;
use crate::server::state::AppState;
use crate::types::Document;

/// Declared media types accepted for upload
const ALLOWED_MEDIA_TYPES: &[&str] = &[
    "application/pdf",
    "text/plain",
    "text/csv",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
];

/// Extensions accepted when the declared type is missing or generic
const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "txt", "csv", "xlsx", "xls"];

/// Response for upload and process triggers
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    pub success: bool,
    pub message: String,
    pub document_id: Uuid,
}

/// Upload response carries the fresh document row for the client's list
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub document: Document,
}

/// POST /api/documents - upload a file and queue its ingestion
pub async fn upload_document(
    State(state): State<AppState>,
    Extension(OwnerId(owner_id)): Extension<OwnerId>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>)> {
    let mut upload: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Validation(format!("Failed to read multipart field: {}", e)))?
    {
        if field.file_name().is_none() {
            continue;
        }
        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("file_{}.bin", Uuid::new_v4()));
        let declared_type = field.content_type().map(|s| s.to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| Error::Validation(format!("Failed to read file: {}", e)))?;

        let media_type = resolve_media_type(&filename, declared_type.as_deref());
        upload = Some((filename, media_type, data.to_vec()));
        break;
    }

    let (filename, media_type, data) =
        upload.ok_or_else(|| Error::Validation("No file provided".to_string()))?;

    if data.len() > state.config().server.max_upload_size {
        return Err(Error::Validation(format!(
            "{} is too large (max {} bytes)",
            filename,
            state.config().server.max_upload_size
        )));
    }
    if !is_allowed_upload(&filename, &media_type) {
        return Err(Error::Validation(format!(
            "{} is not a supported file type",
            filename
        )));
    }

    let extension = filename.rsplit('.').next().unwrap_or("bin").to_lowercase();
    let storage_path = format!("{}/{}.{}", owner_id, Uuid::new_v4(), extension);

    state.object_store().put(&storage_path, &data).await?;

    let document = Document::new(
        owner_id,
        filename,
        media_type,
        data.len() as u64,
        storage_path.clone(),
    );
    if let Err(e) = state.db().insert_document(&document) {
        // The row is the source of truth; don't leave an orphaned object
        if let Err(cleanup) = state.object_store().delete(&storage_path).await {
            tracing::warn!("failed to clean up object {}: {}", storage_path, cleanup);
        }
        return Err(e);
    }

    state
        .job_queue()
        .submit(IngestJob {
            document_id: document.id,
            owner_id,
        })
        .await;

    tracing::info!(
        "accepted upload {} ({} bytes) as document {}",
        document.name,
        document.size_bytes,
        document.id
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(UploadResponse {
            success: true,
            message: "Document accepted for processing".to_string(),
            document,
        }),
    ))
}

/// Request body for the process trigger
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    pub document_id: Uuid,
}

/// POST /api/process - (re)ingest an existing document
pub async fn process_document(
    State(state): State<AppState>,
    Extension(OwnerId(owner_id)): Extension<OwnerId>,
    Json(request): Json<ProcessRequest>,
) -> Result<(StatusCode, Json<ProcessResponse>)> {
    let document = state
        .db()
        .get_document(request.document_id, owner_id)?
        .ok_or_else(|| Error::NotFound("Document not found".to_string()))?;

    state.db().mark_processing(document.id)?;
    state
        .job_queue()
        .submit(IngestJob {
            document_id: document.id,
            owner_id,
        })
        .await;

    Ok((
        StatusCode::ACCEPTED,
        Json(ProcessResponse {
            success: true,
            message: "Processing started".to_string(),
            document_id: document.id,
        }),
    ))
}

/// GET /api/documents - the owner's documents, newest first
pub async fn list_documents(
    State(state): State<AppState>,
    Extension(OwnerId(owner_id)): Extension<OwnerId>,
) -> Result<Json<Vec<Document>>> {
    Ok(Json(state.db().list_documents(owner_id)?))
}

/// DELETE /api/documents/:id - remove object, chunks, and row
pub async fn delete_document(
    State(state): State<AppState>,
    Extension(OwnerId(owner_id)): Extension<OwnerId>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let document = state
        .db()
        .get_document(id, owner_id)?
        .ok_or_else(|| Error::NotFound("Document not found".to_string()))?;

    if let Err(e) = state.object_store().delete(&document.storage_path).await {
        // The row and chunks still go away; the orphaned object is logged
        tracing::warn!("failed to delete object {}: {}", document.storage_path, e);
    }
    state.db().delete_document(id, owner_id)?;

    Ok(Json(serde_json::json!({ "success": true })))
}

fn resolve_media_type(filename: &str, declared: Option<&str>) -> String {
    match declared {
        Some(t) if !t.is_empty() && t != "application/octet-stream" => t.to_string(),
        _ => mime_guess::from_path(filename)
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string(),
    }
}

fn is_allowed_upload(filename: &str, media_type: &str) -> bool {
    if ALLOWED_MEDIA_TYPES.contains(&media_type) {
        return true;
    }
    filename
        .rsplit('.')
        .next()
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_uploads() {
        assert!(is_allowed_upload("report.pdf", "application/pdf"));
        assert!(is_allowed_upload("notes.txt", "text/plain"));
        // Unknown declared type but a known extension still passes
        assert!(is_allowed_upload("data.csv", "application/octet-stream"));
        assert!(!is_allowed_upload("malware.exe", "application/x-msdownload"));
        assert!(!is_allowed_upload("noextension", "application/octet-stream"));
    }

    #[test]
    fn test_resolve_media_type() {
        assert_eq!(
            resolve_media_type("a.txt", Some("text/plain")),
            "text/plain"
        );
        // Generic declared type defers to the extension
        assert_eq!(
            resolve_media_type("a.pdf", Some("application/octet-stream")),
            "application/pdf"
        );
        assert_eq!(resolve_media_type("a.txt", None), "text/plain");
    }
}

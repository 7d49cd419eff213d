use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::error;
use uuid::Uuid;

use estate_db::models::ReportImageRow;
use estate_types::api::ReportImageResponse;

use crate::reports::parse_timestamp;
use crate::state::AppState;

/// 25 MB upload limit for report photos
const MAX_IMAGE_SIZE: usize = 25 * 1024 * 1024;

/// POST /reports/{report_id}/images — accepts raw image bytes, stores them,
/// compresses in place, inserts a gallery row. A compression failure is
/// logged inside the ingest step and the upload still succeeds with the
/// original bytes.
pub async fn upload_image(
    State(state): State<AppState>,
    Path(report_id): Path<Uuid>,
    bytes: Bytes,
) -> Result<impl IntoResponse, StatusCode> {
    let rid = report_id.to_string();
    ensure_report_exists(&state, rid.clone()).await?;
    let image_id = store_upload(&state, bytes).await?;

    let db = state.clone();
    let iid = image_id.clone();
    // Read the row back so the response carries the stored timestamp.
    let row = tokio::task::spawn_blocking(move || {
        db.db.insert_report_image(&iid, &rid, &iid).map_err(|e| {
            error!("DB insert_report_image error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
        db.db
            .get_report_image(&iid)
            .map_err(|e| {
                error!("DB get_report_image error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?
            .ok_or(StatusCode::INTERNAL_SERVER_ERROR)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })??;

    Ok((StatusCode::CREATED, Json(image_response(row))))
}

/// PUT /reports/{report_id}/image — the report's own single cover-image
/// slot, compressed independently of the gallery.
pub async fn set_cover_image(
    State(state): State<AppState>,
    Path(report_id): Path<Uuid>,
    bytes: Bytes,
) -> Result<impl IntoResponse, StatusCode> {
    let rid = report_id.to_string();
    ensure_report_exists(&state, rid.clone()).await?;
    let image_id = store_upload(&state, bytes).await?;

    let db = state.clone();
    let iid = image_id.clone();
    tokio::task::spawn_blocking(move || db.db.set_report_image(&rid, &iid))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(|e| {
            error!("DB set_report_image error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(serde_json::json!({ "image": image_id })))
}

/// GET /media/{image_id} — serve stored bytes.
pub async fn download_image(
    State(state): State<AppState>,
    Path(image_id): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    // Ids are UUIDs; anything else is a traversal attempt.
    image_id.parse::<Uuid>().map_err(|_| StatusCode::BAD_REQUEST)?;

    let bytes = state.storage.read(&image_id).await.map_err(|e| {
        error!("Failed to read image {}: {}", image_id, e);
        StatusCode::NOT_FOUND
    })?;

    Ok((
        [(axum::http::header::CONTENT_TYPE, "image/jpeg")],
        bytes,
    ))
}

async fn ensure_report_exists(state: &AppState, report_id: String) -> Result<(), StatusCode> {
    let db = state.clone();
    let found = tokio::task::spawn_blocking(move || db.db.get_report(&report_id))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(|e| {
            error!("DB get_report error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    if found.is_none() {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(())
}

async fn store_upload(state: &AppState, bytes: Bytes) -> Result<String, StatusCode> {
    if bytes.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    if bytes.len() > MAX_IMAGE_SIZE {
        return Err(StatusCode::PAYLOAD_TOO_LARGE);
    }

    let image_id = Uuid::new_v4().to_string();
    state
        .storage
        .ingest(&image_id, bytes.to_vec())
        .await
        .map_err(|e| {
            error!("Failed to store image {}: {}", image_id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    Ok(image_id)
}

pub(crate) fn image_response(row: ReportImageRow) -> ReportImageResponse {
    ReportImageResponse {
        uploaded_at: parse_timestamp(&row.uploaded_at, &row.id),
        image_id: row.id.parse().unwrap_or_else(|e| {
            tracing::warn!("Corrupt image id '{}': {}", row.id, e);
            Uuid::default()
        }),
        path: row.path,
    }
}

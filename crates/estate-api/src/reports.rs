use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::{error, warn};
use uuid::Uuid;

use estate_db::models::ReportRow;
use estate_db::rules::ReportDraft;
use estate_types::api::{
    CreateReportRequest, ReportDetailResponse, ReportResponse, UpdateStatusRequest,
    ViolationTypeResponse,
};
use estate_types::status::ReportStatus;

use crate::comments::comment_response;
use crate::images::image_response;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    50
}

/// GET /reports — newest first.
pub async fn list_reports(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.clone();
    let limit = query.limit.min(200);

    let rows = tokio::task::spawn_blocking(move || db.db.list_reports(limit))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(|e| {
            error!("DB list_reports error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let reports: Vec<ReportResponse> = rows.into_iter().map(report_response).collect();
    Ok(Json(reports))
}

/// POST /reports — submit a report. Fine derivation and report-date
/// defaulting run as part of the save.
pub async fn create_report(
    State(state): State<AppState>,
    Json(req): Json<CreateReportRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    if req.house_number.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let db = state.clone();
    let row = tokio::task::spawn_blocking(move || {
        // An unknown violation type is a caller mistake, not a silent null.
        if let Some(vid) = req.violation_type_id {
            if db.db.get_violation_type(vid).map_err(|e| {
                error!("DB get_violation_type error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?.is_none()
            {
                return Err(StatusCode::BAD_REQUEST);
            }
        }

        let mut draft = ReportDraft::new(req.house_number);
        draft.reported_by = req.reported_by;
        draft.latitude = req.latitude;
        draft.longitude = req.longitude;
        draft.violation_id = req.violation_type_id;
        draft.description = req.description;
        draft.fine_amount = req.fine_amount;
        draft.report_date = req.report_date;

        db.db.create_report(draft).map_err(|e| {
            error!("DB create_report error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })??;

    Ok((StatusCode::CREATED, Json(report_response(row))))
}

/// GET /reports/{report_id} — detail with images (newest first) and
/// comments (oldest first).
pub async fn get_report(
    State(state): State<AppState>,
    Path(report_id): Path<Uuid>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.clone();
    let id = report_id.to_string();

    let (row, images, comments) = tokio::task::spawn_blocking(move || {
        let row = db.db.get_report(&id).map_err(|e| {
            error!("DB get_report error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
        let Some(row) = row else {
            return Err(StatusCode::NOT_FOUND);
        };
        let images = db.db.get_report_images(&id).map_err(|e| {
            error!("DB get_report_images error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
        let comments = db.db.get_comments(&id).map_err(|e| {
            error!("DB get_comments error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
        Ok((row, images, comments))
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })??;

    Ok(Json(ReportDetailResponse {
        report: report_response(row),
        images: images.into_iter().map(image_response).collect(),
        comments: comments.into_iter().map(comment_response).collect(),
    }))
}

/// PATCH /reports/{report_id}/status — set status and optionally toggle
/// fine_paid. Unknown status values never reach here: they are rejected at
/// deserialization.
pub async fn update_status(
    State(state): State<AppState>,
    Path(report_id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.clone();
    let id = report_id.to_string();

    let row = tokio::task::spawn_blocking(move || {
        let found = db
            .db
            .update_report_status(&id, req.status, req.fine_paid)
            .map_err(|e| {
                error!("DB update_report_status error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?;
        if !found {
            return Err(StatusCode::NOT_FOUND);
        }
        db.db
            .get_report(&id)
            .map_err(|e| {
                error!("DB get_report error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?
            .ok_or(StatusCode::NOT_FOUND)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })??;

    Ok(Json(report_response(row)))
}

/// GET /violation-types — the active catalog for the submission form.
pub async fn list_violation_types(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.list_active_violation_types())
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(|e| {
            error!("DB list_active_violation_types error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let types: Vec<ViolationTypeResponse> = rows
        .into_iter()
        .map(|row| ViolationTypeResponse {
            id: row.id,
            name: row.name,
            category: row.category,
            description: row.description,
            fine_amount: row.fine_amount.parse().unwrap_or_else(|e| {
                warn!("Corrupt catalog fine '{}': {}", row.fine_amount, e);
                rust_decimal::Decimal::ZERO
            }),
        })
        .collect();

    Ok(Json(types))
}

pub(crate) fn report_response(row: ReportRow) -> ReportResponse {
    ReportResponse {
        report_id: row.id.parse().unwrap_or_else(|e| {
            warn!("Corrupt report id '{}': {}", row.id, e);
            Uuid::default()
        }),
        reported_by: row.reported_by.as_deref().and_then(|raw| {
            raw.parse()
                .map_err(|e| warn!("Corrupt reporter id '{}' on report '{}': {}", raw, row.id, e))
                .ok()
        }),
        house_number: row.house_number,
        latitude: row.latitude,
        longitude: row.longitude,
        violation_type_id: row.violation_id,
        violation_name: row.violation_name,
        description: row.description,
        fine_amount: row.fine_amount.as_deref().and_then(|raw| {
            raw.parse()
                .map_err(|e| warn!("Corrupt fine '{}' on report '{}': {}", raw, row.id, e))
                .ok()
        }),
        fine_paid: row.fine_paid,
        status: row.status.parse().unwrap_or_else(|e| {
            warn!("Corrupt status on report '{}': {}", row.id, e);
            ReportStatus::Open
        }),
        created_at: parse_timestamp(&row.created_at, &row.id),
        report_date: row.report_date.parse().unwrap_or_else(|e| {
            warn!("Corrupt report_date '{}' on report '{}': {}", row.report_date, row.id, e);
            chrono::NaiveDate::default()
        }),
        image: row.image,
    }
}

/// SQLite defaults store timestamps as "YYYY-MM-DD HH:MM:SS" without a
/// timezone; rows written by this service use RFC 3339. Accept both.
pub(crate) fn parse_timestamp(raw: &str, context: &str) -> chrono::DateTime<chrono::Utc> {
    raw.parse::<chrono::DateTime<chrono::Utc>>()
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}' on '{}': {}", raw, context, e);
            chrono::DateTime::default()
        })
}

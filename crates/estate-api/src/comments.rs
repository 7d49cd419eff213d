use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{error, warn};
use uuid::Uuid;

use estate_db::models::CommentRow;
use estate_types::api::{AddCommentRequest, CommentResponse};

use crate::reports::parse_timestamp;
use crate::state::AppState;

/// POST /reports/{report_id}/comments
pub async fn add_comment(
    State(state): State<AppState>,
    Path(report_id): Path<Uuid>,
    Json(req): Json<AddCommentRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    if req.comment.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let db = state.clone();
    let rid = report_id.to_string();
    let comment_id = Uuid::new_v4();
    let cid = comment_id.to_string();
    let uid = req.user_id.to_string();
    let text = req.comment;

    // Read the row back so the response carries the stored timestamp.
    let row = tokio::task::spawn_blocking(move || {
        if db.db.get_report(&rid).map_err(|e| {
            error!("DB get_report error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?.is_none()
        {
            return Err(StatusCode::NOT_FOUND);
        }
        if db.db.get_user_by_id(&uid).map_err(|e| {
            error!("DB get_user_by_id error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?.is_none()
        {
            return Err(StatusCode::BAD_REQUEST);
        }
        db.db.insert_comment(&cid, &rid, &uid, &text).map_err(|e| {
            error!("DB insert_comment error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
        db.db
            .get_comment(&cid)
            .map_err(|e| {
                error!("DB get_comment error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?
            .ok_or(StatusCode::INTERNAL_SERVER_ERROR)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })??;

    Ok((StatusCode::CREATED, Json(comment_response(row))))
}

pub(crate) fn comment_response(row: CommentRow) -> CommentResponse {
    CommentResponse {
        created_at: parse_timestamp(&row.created_at, &row.id),
        comment_id: row.id.parse().unwrap_or_else(|e| {
            warn!("Corrupt comment id '{}': {}", row.id, e);
            Uuid::default()
        }),
        user_id: row.user_id.parse().unwrap_or_else(|e| {
            warn!("Corrupt user id on comment '{}': {}", row.id, e);
            Uuid::default()
        }),
        comment: row.comment,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppStateInner;
    use axum::response::IntoResponse;
    use estate_db::Database;
    use estate_db::rules::ReportDraft;
    use std::sync::Arc;

    #[tokio::test]
    async fn comment_response_echoes_the_stored_row() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_in_memory().unwrap();
        let storage = estate_media::Storage::new(dir.path().to_path_buf())
            .await
            .unwrap();
        let state: AppState = Arc::new(AppStateInner { db, storage });

        let report = state
            .db
            .create_report(ReportDraft::new("Stand 44"))
            .unwrap();
        let report_id: Uuid = report.id.parse().unwrap();
        let user_id = Uuid::new_v4();
        state
            .db
            .create_user(&user_id.to_string(), "sipho", "s@example.com", "Sipho", "N")
            .unwrap();

        let resp = add_comment(
            State(state.clone()),
            Path(report_id),
            Json(AddCommentRequest {
                user_id,
                comment: "grass has been cut".into(),
            }),
        )
        .await
        .unwrap()
        .into_response();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        let comments = state.db.get_comments(&report.id).unwrap();
        assert_eq!(comments.len(), 1);
        let stored = comment_response(comments.into_iter().next().unwrap());

        // The creation response must agree with what a later read returns.
        assert_eq!(
            body["created_at"],
            serde_json::to_value(stored.created_at).unwrap()
        );
        assert_eq!(body["comment_id"], serde_json::json!(stored.comment_id));
        assert_eq!(body["comment"], serde_json::json!("grass has been cut"));
    }
}

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::error;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub year: i32,
    /// 1-12; out-of-range values yield an empty summary rather than an error.
    pub month: Option<u32>,
}

/// GET /dashboard/summary?year=&month=
pub async fn get_summary(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.clone();
    let summary =
        tokio::task::spawn_blocking(move || db.db.report_summary(query.year, query.month))
            .await
            .map_err(|e| {
                error!("spawn_blocking join error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?
            .map_err(|e| {
                error!("DB report_summary error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?;

    Ok(Json(summary))
}

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::status::ReportStatus;

// -- Reports --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateReportRequest {
    pub house_number: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub violation_type_id: Option<i64>,
    #[serde(default)]
    pub description: String,
    /// Explicit fine override. When absent the fine is derived from the
    /// violation type at save time.
    pub fine_amount: Option<Decimal>,
    /// Date the violation is attributed to; defaults to the creation date.
    pub report_date: Option<NaiveDate>,
    pub reported_by: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportResponse {
    pub report_id: Uuid,
    pub reported_by: Option<Uuid>,
    pub house_number: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub violation_type_id: Option<i64>,
    pub violation_name: Option<String>,
    pub description: String,
    pub fine_amount: Option<Decimal>,
    pub fine_paid: bool,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
    pub report_date: NaiveDate,
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReportDetailResponse {
    #[serde(flatten)]
    pub report: ReportResponse,
    /// Newest first.
    pub images: Vec<ReportImageResponse>,
    /// Oldest first.
    pub comments: Vec<CommentResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateStatusRequest {
    pub status: ReportStatus,
    pub fine_paid: Option<bool>,
}

// -- Images --

#[derive(Debug, Clone, Serialize)]
pub struct ReportImageResponse {
    pub image_id: Uuid,
    pub path: String,
    pub uploaded_at: DateTime<Utc>,
}

// -- Comments --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddCommentRequest {
    pub user_id: Uuid,
    pub comment: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentResponse {
    pub comment_id: Uuid,
    pub user_id: Uuid,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

// -- Violation types --

#[derive(Debug, Clone, Serialize)]
pub struct ViolationTypeResponse {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub description: String,
    pub fine_amount: Decimal,
}

/// Database row types — these map directly to SQLite rows.
/// Distinct from the estate-types API models to keep the DB layer independent;
/// timestamps and decimals stay in their stored text form here.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: String,
}

pub struct StandRow {
    pub id: i64,
    pub stand_number: String,
    pub street: Option<String>,
    pub cluster: Option<bool>,
    pub cluster_name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub location: Option<String>,
    pub dev_status: bool,
}

pub struct ResidentRow {
    pub id: String,
    pub user_id: String,
    pub stand_id: i64,
    pub phone: String,
    pub alternative_phone: Option<String>,
    pub email: Option<String>,
    pub profile_photo: Option<String>,
}

pub struct ViolationTypeRow {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub description: String,
    pub fine_amount: String,
    pub is_active: bool,
}

pub struct ReportRow {
    pub id: String,
    pub reported_by: Option<String>,
    pub house_number: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub violation_id: Option<i64>,
    pub violation_name: Option<String>,
    pub description: String,
    pub fine_amount: Option<String>,
    pub fine_paid: bool,
    pub status: String,
    pub created_at: String,
    pub report_date: String,
    pub image: Option<String>,
}

pub struct ReportImageRow {
    pub id: String,
    pub report_id: String,
    pub path: String,
    pub uploaded_at: String,
}

pub struct CommentRow {
    pub id: String,
    pub report_id: String,
    pub user_id: String,
    pub comment: String,
    pub created_at: String,
}

use crate::Database;
use crate::models::{
    CommentRow, ReportImageRow, ReportRow, ResidentRow, StandRow, UserRow, ViolationTypeRow,
};
use crate::rules::{self, ReportDraft};
use anyhow::Result;
use estate_types::status::ReportStatus;
use rusqlite::Connection;
use rust_decimal::Decimal;
use tracing::warn;

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        email: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, email, first_name, last_name)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, username, email, first_name, last_name),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, email, first_name, last_name, created_at
                 FROM users WHERE id = ?1",
            )?;
            let row = stmt
                .query_row([id], |row| {
                    Ok(UserRow {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        email: row.get(2)?,
                        first_name: row.get(3)?,
                        last_name: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                })
                .optional()?;
            Ok(row)
        })
    }

    // -- Stands --

    /// Idempotent upsert keyed on the stand number. Re-importing the same
    /// stand updates its fields in place; the derived location is always
    /// recomputed from the coordinates.
    pub fn upsert_stand(
        &self,
        stand_number: &str,
        street: Option<&str>,
        cluster: Option<bool>,
        cluster_name: Option<&str>,
        latitude: f64,
        longitude: f64,
        dev_status: bool,
    ) -> Result<()> {
        let location = rules::stand_location(latitude, longitude);
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO stands
                     (stand_number, street, cluster, cluster_name, latitude, longitude, location, dev_status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(stand_number) DO UPDATE SET
                     street = excluded.street,
                     cluster = excluded.cluster,
                     cluster_name = excluded.cluster_name,
                     latitude = excluded.latitude,
                     longitude = excluded.longitude,
                     location = excluded.location,
                     dev_status = excluded.dev_status",
                rusqlite::params![
                    stand_number,
                    street,
                    cluster,
                    cluster_name,
                    latitude,
                    longitude,
                    location,
                    dev_status
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_stand_by_number(&self, stand_number: &str) -> Result<Option<StandRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, stand_number, street, cluster, cluster_name,
                        latitude, longitude, location, dev_status
                 FROM stands WHERE stand_number = ?1",
            )?;
            let row = stmt
                .query_row([stand_number], |row| {
                    Ok(StandRow {
                        id: row.get(0)?,
                        stand_number: row.get(1)?,
                        street: row.get(2)?,
                        cluster: row.get(3)?,
                        cluster_name: row.get(4)?,
                        latitude: row.get(5)?,
                        longitude: row.get(6)?,
                        location: row.get(7)?,
                        dev_status: row.get(8)?,
                    })
                })
                .optional()?;
            Ok(row)
        })
    }

    pub fn count_stands(&self) -> Result<i64> {
        self.with_conn(|conn| {
            let n = conn.query_row("SELECT COUNT(*) FROM stands", [], |row| row.get(0))?;
            Ok(n)
        })
    }

    // -- Residents --

    pub fn resident_exists_for_stand(&self, stand_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM residents WHERE stand_id = ?1",
                [stand_id],
                |row| row.get(0),
            )?;
            Ok(n > 0)
        })
    }

    pub fn create_resident(&self, resident: &ResidentRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO residents
                     (id, user_id, stand_id, phone, alternative_phone, email, profile_photo)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    resident.id,
                    resident.user_id,
                    resident.stand_id,
                    resident.phone,
                    resident.alternative_phone,
                    resident.email,
                    resident.profile_photo
                ],
            )?;
            Ok(())
        })
    }

    // -- Violation types --

    pub fn get_violation_type(&self, id: i64) -> Result<Option<ViolationTypeRow>> {
        self.with_conn(|conn| query_violation_type(conn, id))
    }

    pub fn get_violation_type_by_name(&self, name: &str) -> Result<Option<ViolationTypeRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, category, description, fine_amount, is_active
                 FROM violation_types WHERE name = ?1",
            )?;
            let row = stmt
                .query_row([name], map_violation_type)
                .optional()?;
            Ok(row)
        })
    }

    pub fn list_active_violation_types(&self) -> Result<Vec<ViolationTypeRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, category, description, fine_amount, is_active
                 FROM violation_types WHERE is_active = 1
                 ORDER BY category, name",
            )?;
            let rows = stmt
                .query_map([], map_violation_type)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Reports --

    /// Apply the save rules, then persist. The two phases stay separate:
    /// `rules::prepare_for_save` is pure, and only the write below touches
    /// the store. New reports always start in OPEN.
    pub fn create_report(&self, mut draft: ReportDraft) -> Result<ReportRow> {
        let violation_fine = match draft.violation_id {
            Some(vid) => self
                .get_violation_type(vid)?
                .and_then(|v| parse_fine(&v.fine_amount, &v.name)),
            None => None,
        };

        rules::prepare_for_save(&mut draft, violation_fine);

        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO reports
                     (id, reported_by, house_number, latitude, longitude, violation_id,
                      description, fine_amount, fine_paid, status, created_at, report_date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, 'OPEN', ?9, ?10)",
                rusqlite::params![
                    draft.id.to_string(),
                    draft.reported_by.map(|u| u.to_string()),
                    draft.house_number,
                    draft.latitude,
                    draft.longitude,
                    draft.violation_id,
                    draft.description,
                    draft.fine_amount.map(|f| f.to_string()),
                    draft.created_at.to_rfc3339(),
                    draft.report_date.map(|d| d.to_string()),
                ],
            )?;
            Ok(())
        })?;

        self.get_report(&draft.id.to_string())?
            .ok_or_else(|| anyhow::anyhow!("report vanished after insert: {}", draft.id))
    }

    pub fn get_report(&self, id: &str) -> Result<Option<ReportRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{REPORT_SELECT} WHERE r.id = ?1"))?;
            let row = stmt.query_row([id], map_report).optional()?;
            Ok(row)
        })
    }

    /// Newest first.
    pub fn list_reports(&self, limit: u32) -> Result<Vec<ReportRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("{REPORT_SELECT} ORDER BY r.created_at DESC LIMIT ?1"))?;
            let rows = stmt
                .query_map([limit], map_report)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Returns false when no report has that id. Any status may be set from
    /// any other status; only membership in the known set is enforced, and
    /// that already happened when the value was parsed.
    pub fn update_report_status(
        &self,
        id: &str,
        status: ReportStatus,
        fine_paid: Option<bool>,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = match fine_paid {
                Some(paid) => conn.execute(
                    "UPDATE reports SET status = ?1, fine_paid = ?2 WHERE id = ?3",
                    rusqlite::params![status.as_str(), paid, id],
                )?,
                None => conn.execute(
                    "UPDATE reports SET status = ?1 WHERE id = ?2",
                    rusqlite::params![status.as_str(), id],
                )?,
            };
            Ok(changed > 0)
        })
    }

    /// The report's own single optional image slot.
    pub fn set_report_image(&self, id: &str, path: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE reports SET image = ?1 WHERE id = ?2",
                rusqlite::params![path, id],
            )?;
            Ok(changed > 0)
        })
    }

    // -- Report images --

    pub fn insert_report_image(&self, id: &str, report_id: &str, path: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO report_images (id, report_id, path, uploaded_at)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, report_id, path, chrono::Utc::now().to_rfc3339()],
            )?;
            Ok(())
        })
    }

    pub fn get_report_image(&self, id: &str) -> Result<Option<ReportImageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, report_id, path, uploaded_at FROM report_images WHERE id = ?1",
            )?;
            let row = stmt
                .query_row([id], |row| {
                    Ok(ReportImageRow {
                        id: row.get(0)?,
                        report_id: row.get(1)?,
                        path: row.get(2)?,
                        uploaded_at: row.get(3)?,
                    })
                })
                .optional()?;
            Ok(row)
        })
    }

    /// Newest first, for display.
    pub fn get_report_images(&self, report_id: &str) -> Result<Vec<ReportImageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, report_id, path, uploaded_at FROM report_images
                 WHERE report_id = ?1 ORDER BY uploaded_at DESC",
            )?;
            let rows = stmt
                .query_map([report_id], |row| {
                    Ok(ReportImageRow {
                        id: row.get(0)?,
                        report_id: row.get(1)?,
                        path: row.get(2)?,
                        uploaded_at: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Comments --

    pub fn insert_comment(&self, id: &str, report_id: &str, user_id: &str, comment: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO report_comments (id, report_id, user_id, comment, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, report_id, user_id, comment, chrono::Utc::now().to_rfc3339()],
            )?;
            Ok(())
        })
    }

    pub fn get_comment(&self, id: &str) -> Result<Option<CommentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, report_id, user_id, comment, created_at FROM report_comments
                 WHERE id = ?1",
            )?;
            let row = stmt
                .query_row([id], |row| {
                    Ok(CommentRow {
                        id: row.get(0)?,
                        report_id: row.get(1)?,
                        user_id: row.get(2)?,
                        comment: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                })
                .optional()?;
            Ok(row)
        })
    }

    /// Oldest first, conversation order.
    pub fn get_comments(&self, report_id: &str) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, report_id, user_id, comment, created_at FROM report_comments
                 WHERE report_id = ?1 ORDER BY created_at ASC",
            )?;
            let rows = stmt
                .query_map([report_id], |row| {
                    Ok(CommentRow {
                        id: row.get(0)?,
                        report_id: row.get(1)?,
                        user_id: row.get(2)?,
                        comment: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

// JOIN violation_types to fetch the violation name in a single query
const REPORT_SELECT: &str = "SELECT r.id, r.reported_by, r.house_number, r.latitude, r.longitude,
        r.violation_id, v.name, r.description, r.fine_amount, r.fine_paid,
        r.status, r.created_at, r.report_date, r.image
 FROM reports r
 LEFT JOIN violation_types v ON r.violation_id = v.id";

fn map_report(row: &rusqlite::Row<'_>) -> std::result::Result<ReportRow, rusqlite::Error> {
    Ok(ReportRow {
        id: row.get(0)?,
        reported_by: row.get(1)?,
        house_number: row.get(2)?,
        latitude: row.get(3)?,
        longitude: row.get(4)?,
        violation_id: row.get(5)?,
        violation_name: row.get(6)?,
        description: row.get(7)?,
        fine_amount: row.get(8)?,
        fine_paid: row.get(9)?,
        status: row.get(10)?,
        created_at: row.get(11)?,
        report_date: row.get(12)?,
        image: row.get(13)?,
    })
}

fn map_violation_type(
    row: &rusqlite::Row<'_>,
) -> std::result::Result<ViolationTypeRow, rusqlite::Error> {
    Ok(ViolationTypeRow {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        description: row.get(3)?,
        fine_amount: row.get(4)?,
        is_active: row.get(5)?,
    })
}

fn query_violation_type(conn: &Connection, id: i64) -> Result<Option<ViolationTypeRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, category, description, fine_amount, is_active
         FROM violation_types WHERE id = ?1",
    )?;
    let row = stmt.query_row([id], map_violation_type).optional()?;
    Ok(row)
}

/// Stored fines are decimal text. A row that fails to parse is logged and
/// treated as unpriced rather than failing the whole query.
pub(crate) fn parse_fine(raw: &str, context: &str) -> Option<Decimal> {
    match raw.parse::<Decimal>() {
        Ok(d) => Some(d),
        Err(e) => {
            warn!("Corrupt fine amount '{}' on {}: {}", raw, context, e);
            None
        }
    }
}

/// Extension trait for optional query results
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn tall_grass_report_gets_catalog_fine_and_opens() {
        let db = Database::open_in_memory().unwrap();
        let tall_grass = db
            .get_violation_type_by_name("Tall Grass")
            .unwrap()
            .expect("seeded catalog entry");
        assert_eq!(tall_grass.fine_amount, "50.00");

        let mut draft = ReportDraft::new("Stand 114");
        draft.violation_id = Some(tall_grass.id);
        let report = db.create_report(draft).unwrap();

        assert_eq!(report.fine_amount.as_deref(), Some("50.00"));
        assert_eq!(report.status, "OPEN");
        assert!(!report.fine_paid);
        assert_eq!(report.violation_name.as_deref(), Some("Tall Grass"));
    }

    #[test]
    fn explicit_fine_survives_violation_link() {
        let db = Database::open_in_memory().unwrap();
        let vt = db
            .get_violation_type_by_name("Unauthorized Structure")
            .unwrap()
            .unwrap();

        let mut draft = ReportDraft::new("Stand 9");
        draft.violation_id = Some(vt.id);
        draft.fine_amount = Some(dec("999.99"));
        let report = db.create_report(draft).unwrap();

        assert_eq!(report.fine_amount.as_deref(), Some("999.99"));
    }

    #[test]
    fn report_date_defaults_and_sticks() {
        let db = Database::open_in_memory().unwrap();
        let draft = ReportDraft::new("Stand 3");
        let created = draft.created_at.date_naive().to_string();
        let report = db.create_report(draft).unwrap();
        assert_eq!(report.report_date, created);

        let mut dated = ReportDraft::new("Stand 4");
        dated.report_date = NaiveDate::from_ymd_opt(2023, 5, 20);
        let report = db.create_report(dated).unwrap();
        assert_eq!(report.report_date, "2023-05-20");
    }

    #[test]
    fn stand_upsert_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_stand("114", Some("Acacia Dr"), None, None, -17.90, 31.07, true)
            .unwrap();
        db.upsert_stand("114", Some("Acacia Drive"), None, None, -17.91, 31.08, false)
            .unwrap();

        assert_eq!(db.count_stands().unwrap(), 1);
        let stand = db.get_stand_by_number("114").unwrap().unwrap();
        assert_eq!(stand.street.as_deref(), Some("Acacia Drive"));
        assert_eq!(stand.latitude, -17.91);
        assert!(!stand.dev_status);
        // derived location follows the latest coordinates
        assert_eq!(stand.location.as_deref(), Some("POINT(31.08 -17.91)"));
    }

    #[test]
    fn status_update_validates_membership_not_transitions() {
        let db = Database::open_in_memory().unwrap();
        let report = db.create_report(ReportDraft::new("Stand 5")).unwrap();

        // Any state to any state is allowed.
        assert!(db
            .update_report_status(&report.id, ReportStatus::Approved, Some(true))
            .unwrap());
        let updated = db.get_report(&report.id).unwrap().unwrap();
        assert_eq!(updated.status, "APPROVED");
        assert!(updated.fine_paid);

        assert!(db
            .update_report_status(&report.id, ReportStatus::Open, None)
            .unwrap());
        assert_eq!(db.get_report(&report.id).unwrap().unwrap().status, "OPEN");

        // Missing report is reported as such, not as an error.
        assert!(!db
            .update_report_status("no-such-id", ReportStatus::Resolved, None)
            .unwrap());
    }

    #[test]
    fn images_newest_first_comments_oldest_first() {
        let db = Database::open_in_memory().unwrap();
        let report = db.create_report(ReportDraft::new("Stand 6")).unwrap();
        db.create_user("u1", "thandi", "t@example.com", "Thandi", "M")
            .unwrap();

        db.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO report_images (id, report_id, path, uploaded_at)
                 VALUES ('i1', ?1, 'a.jpg', '2024-01-01T10:00:00Z'),
                        ('i2', ?1, 'b.jpg', '2024-01-02T10:00:00Z')",
                [&report.id],
            )?;
            conn.execute(
                "INSERT INTO report_comments (id, report_id, user_id, comment, created_at)
                 VALUES ('c1', ?1, 'u1', 'first', '2024-01-01T10:00:00Z'),
                        ('c2', ?1, 'u1', 'second', '2024-01-02T10:00:00Z')",
                [&report.id],
            )?;
            Ok(())
        })
        .unwrap();

        let images = db.get_report_images(&report.id).unwrap();
        assert_eq!(images[0].path, "b.jpg");
        assert_eq!(images[1].path, "a.jpg");

        let comments = db.get_comments(&report.id).unwrap();
        assert_eq!(comments[0].comment, "first");
        assert_eq!(comments[1].comment, "second");
    }

    #[test]
    fn list_reports_newest_first() {
        let db = Database::open_in_memory().unwrap();
        for n in 0..3 {
            let mut d = ReportDraft::new(format!("Stand {}", n));
            d.created_at = chrono::Utc::now() + chrono::Duration::seconds(n);
            db.create_report(d).unwrap();
        }
        let reports = db.list_reports(50).unwrap();
        assert_eq!(reports.len(), 3);
        assert_eq!(reports[0].house_number, "Stand 2");
        assert_eq!(reports[2].house_number, "Stand 0");
    }
}

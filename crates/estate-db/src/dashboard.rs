//! Summary aggregation feeding the dashboard charts.

use crate::Database;
use crate::queries::parse_fine;
use anyhow::Result;
use estate_types::summary::{DashboardSummary, ViolationCount};
use rust_decimal::Decimal;

impl Database {
    /// Build the dashboard summary for a year, optionally narrowed to one
    /// month (1-12). An out-of-range month is a valid filter that matches
    /// nothing, not an error.
    ///
    /// The headline numbers (counts, fine sum, violation breakdown) respect
    /// the month filter. The 12-bucket monthly series always spans the full
    /// year and is only produced when no month filter was given; this
    /// follows the latest revision of the original dashboard.
    pub fn report_summary(&self, year: i32, month: Option<u32>) -> Result<DashboardSummary> {
        self.with_conn(|conn| {
            let (filter, params) = period_filter(year, month);

            // One pass over the filtered set covers every headline number;
            // fines are summed as decimals, unpriced reports count as 0.
            let mut stmt = conn.prepare(&format!(
                "SELECT r.status, r.fine_amount FROM reports r WHERE {filter}"
            ))?;
            let rows = stmt
                .query_map(rusqlite::params_from_iter(params.iter()), |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                    ))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let total_reports = rows.len() as i64;
            let mut pending_reports = 0;
            let mut resolved_reports = 0;
            let mut total_fines = Decimal::ZERO;
            for (status, fine) in &rows {
                match status.as_str() {
                    "OPEN" => pending_reports += 1,
                    "RESOLVED" => resolved_reports += 1,
                    _ => {}
                }
                if let Some(raw) = fine {
                    if let Some(amount) = parse_fine(raw, "report in summary") {
                        total_fines += amount;
                    }
                }
            }

            let monthly_counts = if month.is_none() {
                Some(monthly_series(conn, year)?)
            } else {
                None
            };

            // Descending by count, ties broken by name for a stable chart.
            let mut stmt = conn.prepare(&format!(
                "SELECT v.name, COUNT(*) AS n
                 FROM reports r
                 JOIN violation_types v ON r.violation_id = v.id
                 WHERE {filter}
                 GROUP BY v.name
                 ORDER BY n DESC, v.name ASC"
            ))?;
            let violation_breakdown = stmt
                .query_map(rusqlite::params_from_iter(params.iter()), |row| {
                    Ok(ViolationCount {
                        name: row.get(0)?,
                        count: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(DashboardSummary {
                year,
                month,
                total_reports,
                pending_reports,
                resolved_reports,
                total_fines,
                monthly_counts,
                violation_breakdown,
            })
        })
    }
}

fn period_filter(year: i32, month: Option<u32>) -> (&'static str, Vec<String>) {
    match month {
        Some(m) => (
            "strftime('%Y', r.report_date) = ?1 AND strftime('%m', r.report_date) = ?2",
            vec![format!("{:04}", year), format!("{:02}", m)],
        ),
        None => (
            "strftime('%Y', r.report_date) = ?1",
            vec![format!("{:04}", year)],
        ),
    }
}

/// Jan..Dec report counts for the year, zero-filled.
fn monthly_series(conn: &rusqlite::Connection, year: i32) -> Result<[i64; 12]> {
    let mut stmt = conn.prepare(
        "SELECT CAST(strftime('%m', report_date) AS INTEGER) AS m, COUNT(*)
         FROM reports
         WHERE strftime('%Y', report_date) = ?1
         GROUP BY m",
    )?;
    let mut buckets = [0i64; 12];
    let rows = stmt.query_map([format!("{:04}", year)], |row| {
        Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
    })?;
    for row in rows {
        let (m, count) = row?;
        if (1..=12).contains(&m) {
            buckets[(m - 1) as usize] = count;
        }
    }
    Ok(buckets)
}

//! Save-time derivation rules, kept pure so they can be tested without a
//! database. Persisting is a separate, explicit step in `queries`.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// A report as it exists between validation and the durable write.
#[derive(Debug, Clone)]
pub struct ReportDraft {
    pub id: Uuid,
    pub reported_by: Option<Uuid>,
    pub house_number: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub violation_id: Option<i64>,
    pub description: String,
    pub fine_amount: Option<Decimal>,
    pub report_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl ReportDraft {
    pub fn new(house_number: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            reported_by: None,
            house_number: house_number.into(),
            latitude: None,
            longitude: None,
            violation_id: None,
            description: String::new(),
            fine_amount: None,
            report_date: None,
            created_at: Utc::now(),
        }
    }
}

/// Derive the fine amount and report date before persisting.
///
/// The fine is taken from the linked violation type only when no amount was
/// explicitly supplied, and only once: an already-priced report keeps its
/// amount even if the violation type changes later. The report date defaults
/// to the date portion of the creation timestamp and is never recomputed.
pub fn prepare_for_save(draft: &mut ReportDraft, violation_fine: Option<Decimal>) {
    if draft.fine_amount.is_none() {
        draft.fine_amount = violation_fine;
    }
    if draft.report_date.is_none() {
        draft.report_date = Some(draft.created_at.date_naive());
    }
}

/// Cached WKT projection of a stand's coordinates, recomputed on every save.
pub fn stand_location(latitude: f64, longitude: f64) -> String {
    format!("POINT({} {})", longitude, latitude)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn draft_with_violation() -> ReportDraft {
        let mut d = ReportDraft::new("Stand 114");
        d.violation_id = Some(2);
        d.created_at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 30, 0).unwrap();
        d
    }

    #[test]
    fn fine_derived_from_violation_when_unset() {
        let mut d = draft_with_violation();
        prepare_for_save(&mut d, Some(dec("50.00")));
        assert_eq!(d.fine_amount, Some(dec("50.00")));
    }

    #[test]
    fn explicit_fine_is_never_overwritten() {
        let mut d = draft_with_violation();
        d.fine_amount = Some(dec("120.00"));
        prepare_for_save(&mut d, Some(dec("50.00")));
        assert_eq!(d.fine_amount, Some(dec("120.00")));
    }

    #[test]
    fn no_violation_and_no_fine_stays_unfined() {
        let mut d = ReportDraft::new("Stand 7");
        prepare_for_save(&mut d, None);
        assert_eq!(d.fine_amount, None);
    }

    #[test]
    fn report_date_defaults_to_creation_date() {
        let mut d = draft_with_violation();
        prepare_for_save(&mut d, Some(dec("50.00")));
        assert_eq!(
            d.report_date,
            Some(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap())
        );
    }

    #[test]
    fn explicit_report_date_is_kept() {
        let mut d = draft_with_violation();
        d.report_date = NaiveDate::from_ymd_opt(2024, 2, 1);
        prepare_for_save(&mut d, Some(dec("50.00")));
        assert_eq!(d.report_date, NaiveDate::from_ymd_opt(2024, 2, 1));
    }

    #[test]
    fn repricing_on_resave_does_not_touch_settled_fields() {
        let mut d = draft_with_violation();
        prepare_for_save(&mut d, Some(dec("50.00")));
        let priced = d.fine_amount;
        let dated = d.report_date;

        // Violation type swapped later; rules run again on the next save.
        d.violation_id = Some(5);
        prepare_for_save(&mut d, Some(dec("150.00")));
        assert_eq!(d.fine_amount, priced);
        assert_eq!(d.report_date, dated);
    }

    #[test]
    fn stand_location_is_lon_lat_ordered() {
        assert_eq!(
            stand_location(-17.9009, 31.0728),
            "POINT(31.0728 -17.9009)"
        );
    }
}

//! Dummy-report generator for demo dashboards: random reports with points
//! inside the community boundary polygon, spread over the past year.

use anyhow::{Context, Result, bail};
use chrono::{Duration, Utc};
use estate_db::Database;
use estate_db::rules::ReportDraft;
use estate_types::status::ReportStatus;
use rand::Rng;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
struct BoundaryCollection {
    features: Vec<BoundaryFeature>,
}

#[derive(Debug, Deserialize)]
struct BoundaryFeature {
    geometry: BoundaryGeometry,
}

#[derive(Debug, Deserialize)]
struct BoundaryGeometry {
    #[serde(rename = "type")]
    kind: String,
    coordinates: serde_json::Value,
}

const STATUS_POOL: [ReportStatus; 5] = [
    ReportStatus::Open,
    ReportStatus::Open,
    ReportStatus::InProgress,
    ReportStatus::Resolved,
    ReportStatus::Approved,
];

const DESCRIPTION_POOL: [&str; 4] = [
    "Reported during the weekly drive-around",
    "Resident complaint received by the office",
    "Spotted by the security patrol",
    "Follow-up on a previous notice",
];

pub fn seed_reports(db: &Database, boundary_geojson: &str, count: usize, dry_run: bool) -> Result<usize> {
    let ring = boundary_ring(boundary_geojson)?;
    let (min_lon, max_lon, min_lat, max_lat) = bounding_box(&ring)?;

    let violation_types = db.list_active_violation_types()?;
    if violation_types.is_empty() {
        bail!("violation-type catalog is empty");
    }

    if dry_run {
        info!("Seed (dry run): boundary OK, would create {} reports", count);
        return Ok(count);
    }

    let mut rng = rand::rng();
    let today = Utc::now().date_naive();

    for _ in 0..count {
        // Rejection-sample a point inside the boundary.
        let (lon, lat) = loop {
            let lon = rng.random_range(min_lon..max_lon);
            let lat = rng.random_range(min_lat..max_lat);
            if point_in_polygon(&ring, lon, lat) {
                break (lon, lat);
            }
        };

        let violation = &violation_types[rng.random_range(0..violation_types.len())];
        let status = STATUS_POOL[rng.random_range(0..STATUS_POOL.len())];

        let mut draft = ReportDraft::new(format!("Stand {}", rng.random_range(1..400)));
        draft.latitude = Some(lat);
        draft.longitude = Some(lon);
        draft.violation_id = Some(violation.id);
        draft.description = DESCRIPTION_POOL[rng.random_range(0..DESCRIPTION_POOL.len())].to_string();
        draft.report_date = Some(today - Duration::days(rng.random_range(0..365)));

        let report = db.create_report(draft)?;
        if status != ReportStatus::Open {
            db.update_report_status(&report.id, status, None)?;
        }
    }

    info!("Seeded {} dummy reports", count);
    Ok(count)
}

/// Outer ring of the first boundary feature, as (lon, lat) pairs.
fn boundary_ring(raw: &str) -> Result<Vec<(f64, f64)>> {
    let collection: BoundaryCollection =
        serde_json::from_str(raw).context("invalid boundary GeoJSON")?;
    let feature = collection
        .features
        .first()
        .context("boundary GeoJSON has no features")?;

    let ring_value = match feature.geometry.kind.as_str() {
        "Polygon" => feature.geometry.coordinates.get(0),
        "MultiPolygon" => feature
            .geometry
            .coordinates
            .get(0)
            .and_then(|poly| poly.get(0)),
        other => bail!("unsupported boundary geometry: {}", other),
    }
    .context("boundary geometry has no rings")?;

    let ring: Vec<(f64, f64)> = serde_json::from_value::<Vec<[f64; 2]>>(ring_value.clone())
        .context("boundary ring is not a list of [lon, lat] pairs")?
        .into_iter()
        .map(|[lon, lat]| (lon, lat))
        .collect();

    if ring.len() < 4 {
        bail!("boundary ring has fewer than 4 points");
    }
    Ok(ring)
}

fn bounding_box(ring: &[(f64, f64)]) -> Result<(f64, f64, f64, f64)> {
    let mut min_lon = f64::INFINITY;
    let mut max_lon = f64::NEG_INFINITY;
    let mut min_lat = f64::INFINITY;
    let mut max_lat = f64::NEG_INFINITY;
    for &(lon, lat) in ring {
        min_lon = min_lon.min(lon);
        max_lon = max_lon.max(lon);
        min_lat = min_lat.min(lat);
        max_lat = max_lat.max(lat);
    }
    if min_lon >= max_lon || min_lat >= max_lat {
        bail!("degenerate boundary ring");
    }
    Ok((min_lon, max_lon, min_lat, max_lat))
}

/// Ray-casting point-in-polygon test over the boundary ring.
fn point_in_polygon(ring: &[(f64, f64)], lon: f64, lat: f64) -> bool {
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (xi, yi) = ring[i];
        let (xj, yj) = ring[j];
        if ((yi > lat) != (yj > lat))
            && (lon < (xj - xi) * (lat - yi) / (yj - yi) + xi)
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = r#"{
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[31.0, -18.0], [31.1, -18.0], [31.1, -17.9], [31.0, -17.9], [31.0, -18.0]]]
            }
        }]
    }"#;

    #[test]
    fn point_in_polygon_square() {
        let ring = boundary_ring(SQUARE).unwrap();
        assert!(point_in_polygon(&ring, 31.05, -17.95));
        assert!(!point_in_polygon(&ring, 30.9, -17.95));
        assert!(!point_in_polygon(&ring, 31.05, -18.5));
    }

    #[test]
    fn multipolygon_outer_ring_is_accepted() {
        let raw = r#"{
            "features": [{
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [[[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]]]
                }
            }]
        }"#;
        let ring = boundary_ring(raw).unwrap();
        assert_eq!(ring.len(), 5);
        assert!(point_in_polygon(&ring, 0.5, 0.5));
    }

    #[test]
    fn seeded_reports_land_inside_the_boundary() {
        let db = Database::open_in_memory().unwrap();
        let created = seed_reports(&db, SQUARE, 25, false).unwrap();
        assert_eq!(created, 25);

        let reports = db.list_reports(100).unwrap();
        assert_eq!(reports.len(), 25);
        let ring = boundary_ring(SQUARE).unwrap();
        for report in &reports {
            let lon = report.longitude.unwrap();
            let lat = report.latitude.unwrap();
            assert!(point_in_polygon(&ring, lon, lat));
            assert!(report.violation_id.is_some());
            assert!(report.fine_amount.is_some(), "seeded fines derive from the catalog");
        }
    }

    #[test]
    fn dry_run_creates_nothing() {
        let db = Database::open_in_memory().unwrap();
        seed_reports(&db, SQUARE, 10, true).unwrap();
        assert!(db.list_reports(10).unwrap().is_empty());
    }

    #[test]
    fn unsupported_geometry_is_rejected() {
        let raw = r#"{"features": [{"geometry": {"type": "Point", "coordinates": [0.0, 0.0]}}]}"#;
        assert!(boundary_ring(raw).is_err());
    }
}

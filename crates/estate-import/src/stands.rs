//! Stand import from a GeoJSON feature collection. Upsert keyed on the
//! stand number: re-running the same file updates fields in place and never
//! duplicates a stand.

use anyhow::{Context, Result};
use estate_db::Database;
use serde::Deserialize;
use tracing::{info, warn};

use crate::ImportStats;

#[derive(Debug, Deserialize)]
pub struct StandCollection {
    pub features: Vec<StandFeature>,
}

#[derive(Debug, Deserialize)]
pub struct StandFeature {
    pub properties: StandProperties,
    pub geometry: PointGeometry,
}

#[derive(Debug, Deserialize)]
pub struct StandProperties {
    pub stand_numb: Option<String>,
    pub street: Option<String>,
    pub cluster: Option<bool>,
    pub cluster_na: Option<String>,
    #[serde(default = "default_dev_status")]
    pub dev_status: bool,
}

fn default_dev_status() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct PointGeometry {
    /// GeoJSON order: [longitude, latitude]
    pub coordinates: Vec<f64>,
}

pub fn parse(raw: &str) -> Result<StandCollection> {
    serde_json::from_str(raw).context("invalid stand GeoJSON")
}

pub fn import(db: &Database, collection: &StandCollection, dry_run: bool) -> Result<ImportStats> {
    let mut stats = ImportStats::default();

    for feature in &collection.features {
        let Some(stand_number) = feature.properties.stand_numb.as_deref() else {
            warn!("Feature without stand_numb property");
            stats.errors += 1;
            continue;
        };
        let [longitude, latitude] = feature.geometry.coordinates[..] else {
            warn!("Stand {}: expected point coordinates", stand_number);
            stats.errors += 1;
            continue;
        };

        let exists = db.get_stand_by_number(stand_number)?.is_some();

        if !dry_run {
            if let Err(e) = db.upsert_stand(
                stand_number,
                feature.properties.street.as_deref(),
                feature.properties.cluster,
                feature.properties.cluster_na.as_deref(),
                latitude,
                longitude,
                feature.properties.dev_status,
            ) {
                warn!("Stand {}: {}", stand_number, e);
                stats.errors += 1;
                continue;
            }
        }

        if exists {
            stats.updated += 1;
        } else {
            stats.created += 1;
        }
    }

    info!("Stand import {}: {}", if dry_run { "(dry run)" } else { "done" }, stats);
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"stand_numb": "114", "street": "Acacia Drive", "dev_status": true},
                "geometry": {"type": "Point", "coordinates": [31.0728, -17.9009]}
            },
            {
                "type": "Feature",
                "properties": {"stand_numb": "115"},
                "geometry": {"type": "Point", "coordinates": [31.0731, -17.9012]}
            },
            {
                "type": "Feature",
                "properties": {"street": "No Number Rd"},
                "geometry": {"type": "Point", "coordinates": [31.0, -17.9]}
            }
        ]
    }"#;

    #[test]
    fn imports_valid_features_and_counts_bad_ones() {
        let db = Database::open_in_memory().unwrap();
        let collection = parse(FIXTURE).unwrap();

        let stats = import(&db, &collection, false).unwrap();
        assert_eq!(stats.created, 2);
        assert_eq!(stats.errors, 1);
        assert_eq!(db.count_stands().unwrap(), 2);

        let stand = db.get_stand_by_number("114").unwrap().unwrap();
        assert_eq!(stand.street.as_deref(), Some("Acacia Drive"));
        assert_eq!(stand.latitude, -17.9009);
        assert_eq!(stand.longitude, 31.0728);
        // missing dev_status defaults to developed
        assert!(db.get_stand_by_number("115").unwrap().unwrap().dev_status);
    }

    #[test]
    fn reimport_updates_instead_of_duplicating() {
        let db = Database::open_in_memory().unwrap();
        let collection = parse(FIXTURE).unwrap();

        import(&db, &collection, false).unwrap();
        let stats = import(&db, &collection, false).unwrap();

        assert_eq!(stats.created, 0);
        assert_eq!(stats.updated, 2);
        assert_eq!(db.count_stands().unwrap(), 2);
    }

    #[test]
    fn dry_run_writes_nothing() {
        let db = Database::open_in_memory().unwrap();
        let collection = parse(FIXTURE).unwrap();

        let stats = import(&db, &collection, true).unwrap();
        assert_eq!(stats.created, 2);
        assert_eq!(db.count_stands().unwrap(), 0);
    }
}

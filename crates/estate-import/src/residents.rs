//! Resident import from cleaned JSON. Insert-if-absent keyed on the stand:
//! a stand that already has a resident is skipped, a record referencing an
//! unknown stand is a per-record error and the run continues.

use anyhow::{Context, Result};
use estate_db::Database;
use estate_db::models::ResidentRow;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::ImportStats;

#[derive(Debug, Deserialize)]
pub struct ResidentFile {
    pub residents: Vec<ResidentRecord>,
}

#[derive(Debug, Deserialize)]
pub struct ResidentRecord {
    pub stand_numb: String,
    pub phone: String,
    pub alternative_phone: Option<String>,
    pub email: Option<String>,
    pub user: UserRecord,
}

#[derive(Debug, Deserialize)]
pub struct UserRecord {
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

pub fn parse(raw: &str) -> Result<ResidentFile> {
    serde_json::from_str(raw).context("invalid resident JSON")
}

pub fn import(db: &Database, file: &ResidentFile, dry_run: bool) -> Result<ImportStats> {
    let mut stats = ImportStats::default();

    for record in &file.residents {
        let stand = match db.get_stand_by_number(&record.stand_numb)? {
            Some(stand) => stand,
            None => {
                warn!("Stand {} not found", record.stand_numb);
                stats.errors += 1;
                continue;
            }
        };

        if db.resident_exists_for_stand(stand.id)? {
            stats.skipped += 1;
            continue;
        }

        if !dry_run {
            if let Err(e) = create_resident(db, stand.id, record) {
                warn!("Resident for stand {}: {}", record.stand_numb, e);
                stats.errors += 1;
                continue;
            }
        }

        stats.created += 1;
    }

    info!(
        "Resident import {}: {}",
        if dry_run { "(dry run)" } else { "done" },
        stats
    );
    Ok(stats)
}

fn create_resident(db: &Database, stand_id: i64, record: &ResidentRecord) -> Result<()> {
    let user_id = Uuid::new_v4().to_string();
    db.create_user(
        &user_id,
        &record.user.username,
        &record.user.email,
        &record.user.first_name,
        &record.user.last_name,
    )?;
    db.create_resident(&ResidentRow {
        id: Uuid::new_v4().to_string(),
        user_id,
        stand_id,
        phone: record.phone.clone(),
        alternative_phone: record.alternative_phone.clone(),
        email: record.email.clone(),
        profile_photo: None,
    })?;
    Ok(())
}

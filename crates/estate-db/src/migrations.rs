use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            email       TEXT NOT NULL DEFAULT '',
            first_name  TEXT NOT NULL DEFAULT '',
            last_name   TEXT NOT NULL DEFAULT '',
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS stands (
            id            INTEGER PRIMARY KEY,
            stand_number  TEXT NOT NULL UNIQUE,
            street        TEXT,
            cluster       INTEGER,
            cluster_name  TEXT,
            latitude      REAL NOT NULL,
            longitude     REAL NOT NULL,
            location      TEXT,
            dev_status    INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS residents (
            id                TEXT PRIMARY KEY,
            user_id           TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            stand_id          INTEGER NOT NULL UNIQUE REFERENCES stands(id) ON DELETE CASCADE,
            phone             TEXT NOT NULL,
            alternative_phone TEXT,
            email             TEXT,
            profile_photo     TEXT
        );

        CREATE TABLE IF NOT EXISTS violation_types (
            id           INTEGER PRIMARY KEY,
            name         TEXT NOT NULL UNIQUE,
            category     TEXT NOT NULL,
            description  TEXT NOT NULL DEFAULT '',
            fine_amount  TEXT NOT NULL,
            is_active    INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS reports (
            id            TEXT PRIMARY KEY,
            reported_by   TEXT REFERENCES users(id) ON DELETE SET NULL,
            house_number  TEXT NOT NULL,
            latitude      REAL,
            longitude     REAL,
            violation_id  INTEGER REFERENCES violation_types(id) ON DELETE SET NULL,
            description   TEXT NOT NULL DEFAULT '',
            fine_amount   TEXT,
            fine_paid     INTEGER NOT NULL DEFAULT 0,
            status        TEXT NOT NULL DEFAULT 'OPEN',
            created_at    TEXT NOT NULL DEFAULT (datetime('now')),
            report_date   TEXT NOT NULL,
            image         TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_reports_report_date
            ON reports(report_date);
        CREATE INDEX IF NOT EXISTS idx_reports_status
            ON reports(status);

        CREATE TABLE IF NOT EXISTS report_images (
            id           TEXT PRIMARY KEY,
            report_id    TEXT NOT NULL REFERENCES reports(id) ON DELETE CASCADE,
            path         TEXT NOT NULL,
            uploaded_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_report_images_report
            ON report_images(report_id, uploaded_at);

        CREATE TABLE IF NOT EXISTS report_comments (
            id          TEXT PRIMARY KEY,
            report_id   TEXT NOT NULL REFERENCES reports(id) ON DELETE CASCADE,
            user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            comment     TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_report_comments_report
            ON report_comments(report_id, created_at);

        -- Seed the violation-type catalog
        INSERT OR IGNORE INTO violation_types (name, category, description, fine_amount) VALUES
            ('Peeling Paint',             'EXTERIOR',  'Exterior walls or trim need repainting',        '75.00'),
            ('Tall Grass',                'LANDSCAPE', 'Lawn or verge grass above the permitted height', '50.00'),
            ('Pavement Parking',          'PARKING',   'Vehicle parked on a sidewalk or verge',          '40.00'),
            ('Loud Music After Hours',    'NOISE',     'Amplified sound after 22:00',                    '60.00'),
            ('Improper Waste Disposal',   'TRASH',     'Refuse placed out before collection day',        '35.00'),
            ('Unauthorized Structure',    'STRUCTURE', 'Construction without committee approval',        '150.00'),
            ('Tampered Perimeter Fence',  'SECURITY',  'Damage or modification to the boundary fence',   '200.00');
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}

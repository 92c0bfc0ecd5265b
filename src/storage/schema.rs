//! SQLite schema for the bus listing store.
//!
//! A single `bus_listings` table holds every scraped offering. The UNIQUE
//! constraint on (operator, route_name, bus_name, departing_time) is the
//! natural key; the pipeline writes with INSERT OR REPLACE so re-scraping a
//! known listing refreshes it instead of duplicating it.

use rusqlite::{Connection, Result};

/// Create all tables and indexes if they do not exist.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS bus_listings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            operator TEXT NOT NULL,
            route_name TEXT NOT NULL,
            route_url TEXT NOT NULL,
            bus_name TEXT NOT NULL,
            bus_type TEXT NOT NULL,
            departing_time TEXT NOT NULL,
            duration TEXT NOT NULL,
            reaching_time TEXT NOT NULL,
            star_rating REAL NOT NULL DEFAULT 0,
            price REAL NOT NULL DEFAULT 0,
            seats_available INTEGER NOT NULL DEFAULT 0,
            scraped_at TEXT NOT NULL,
            UNIQUE(operator, route_name, bus_name, departing_time)
        )
        "#,
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_listings_route ON bus_listings(route_name)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_listings_operator ON bus_listings(operator)",
        [],
    )?;

    Ok(())
}

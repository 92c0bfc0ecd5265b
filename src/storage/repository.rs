//! SQLite repository for scraped bus listings.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::path::Path;

use super::schema::create_tables;
use crate::types::{BusListing, ListingFilter};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Columns the distinct-values helper may be asked about. Keeps the
/// interpolated column name out of caller control.
const FILTERABLE_COLUMNS: [&str; 4] = ["operator", "route_name", "bus_type", "departing_time"];

/// Repository over the bus listing store. One connection, one writer.
pub struct ListingRepository {
    conn: Connection,
}

impl ListingRepository {
    /// Open (or create) the store at `db_path`.
    pub fn new(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).context("failed to create database directory")?;
            }
        }

        let conn = Connection::open(db_path).context("failed to open database")?;
        create_tables(&conn)?;

        Ok(Self { conn })
    }

    /// In-memory store, used by tests and the end-to-end harness.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        create_tables(&conn)?;
        Ok(Self { conn })
    }

    /// Insert-or-replace one listing on its natural key. Autocommit: the row
    /// is durable as soon as this returns.
    pub fn upsert(&self, listing: &BusListing) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            r#"
            INSERT OR REPLACE INTO bus_listings
            (operator, route_name, route_url, bus_name, bus_type, departing_time,
             duration, reaching_time, star_rating, price, seats_available, scraped_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                listing.operator,
                listing.route_name,
                listing.route_url,
                listing.bus_name,
                listing.bus_type,
                listing.departing_time,
                listing.duration,
                listing.reaching_time,
                listing.star_rating,
                listing.price,
                listing.seats_available,
                listing.scraped_at.format(TIMESTAMP_FORMAT).to_string(),
            ],
        )?;
        Ok(())
    }

    /// Read back listings matching `filter`, in route/departure order.
    pub fn query(&self, filter: &ListingFilter) -> Result<Vec<BusListing>> {
        let mut sql = String::from(
            r#"
            SELECT operator, route_name, route_url, bus_name, bus_type, departing_time,
                   duration, reaching_time, star_rating, price, seats_available, scraped_at
            FROM bus_listings
            WHERE 1=1
            "#,
        );
        let mut values: Vec<Value> = Vec::new();

        let mut push = |sql: &mut String, clause: &str, value: Value| {
            values.push(value);
            sql.push_str(&format!(" AND {} ?{}", clause, values.len()));
        };

        if let Some(ref operator) = filter.operator {
            push(&mut sql, "operator =", Value::from(operator.clone()));
        }
        if let Some(ref route) = filter.route_name {
            push(&mut sql, "route_name =", Value::from(route.clone()));
        }
        if let Some(ref bus_type) = filter.bus_type {
            push(&mut sql, "bus_type =", Value::from(bus_type.clone()));
        }
        if let Some(ref departing) = filter.departing_time {
            push(&mut sql, "departing_time =", Value::from(departing.clone()));
        }
        if let Some(min_rating) = filter.min_rating {
            push(&mut sql, "star_rating >=", Value::from(min_rating));
        }
        if let Some(min_price) = filter.min_price {
            push(&mut sql, "price >=", Value::from(min_price));
        }
        if let Some(max_price) = filter.max_price {
            push(&mut sql, "price <=", Value::from(max_price));
        }

        sql.push_str(" ORDER BY route_name, departing_time, bus_name");

        let mut stmt = self.conn.prepare(&sql)?;
        let listings = stmt
            .query_map(params_from_iter(values), row_to_listing)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(listings)
    }

    /// Current accumulated table for one route. This is the read hook the
    /// runner calls after finishing a route.
    pub fn listings_for_route(&self, route_name: &str) -> Result<Vec<BusListing>> {
        self.query(&ListingFilter::for_route(route_name))
    }

    /// Distinct values of one filterable column, for populating filter
    /// controls. Rejects columns outside the filterable set.
    pub fn distinct_values(&self, column: &str) -> Result<Vec<String>> {
        if !FILTERABLE_COLUMNS.contains(&column) {
            anyhow::bail!("column `{}` is not filterable", column);
        }
        let sql = format!(
            "SELECT DISTINCT {} FROM bus_listings ORDER BY 1",
            column
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let values = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(values)
    }

    /// Drop the listings table so tests can exercise write-failure paths
    /// against an otherwise healthy connection.
    #[cfg(test)]
    pub(crate) fn drop_listings_table(&self) -> Result<()> {
        self.conn.execute("DROP TABLE bus_listings", [])?;
        Ok(())
    }

    pub fn count(&self) -> Result<i64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM bus_listings", [], |row| row.get(0))?;
        Ok(count)
    }
}

fn row_to_listing(row: &Row<'_>) -> rusqlite::Result<BusListing> {
    let scraped_raw: String = row.get(11)?;
    let scraped_at = NaiveDateTime::parse_from_str(&scraped_raw, TIMESTAMP_FORMAT)
        .unwrap_or_default();

    Ok(BusListing {
        operator: row.get(0)?,
        route_name: row.get(1)?,
        route_url: row.get(2)?,
        bus_name: row.get(3)?,
        bus_type: row.get(4)?,
        departing_time: row.get(5)?,
        duration: row.get(6)?,
        reaching_time: row.get(7)?,
        star_rating: row.get(8)?,
        price: row.get(9)?,
        seats_available: row.get(10)?,
        scraped_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn listing(operator: &str, route: &str, bus: &str, departing: &str) -> BusListing {
        BusListing {
            operator: operator.to_string(),
            route_name: route.to_string(),
            route_url: format!("http://example/{}", route),
            bus_name: bus.to_string(),
            bus_type: "AC Sleeper".to_string(),
            departing_time: departing.to_string(),
            duration: "8h 30m".to_string(),
            reaching_time: "06:00".to_string(),
            star_rating: 4.2,
            price: 850.0,
            seats_available: 21,
            scraped_at: NaiveDate::from_ymd_opt(2024, 6, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn test_upsert_and_query() {
        let repo = ListingRepository::in_memory().unwrap();
        repo.upsert(&listing("SomeRTC", "A to B", "Night Rider", "21:30"))
            .unwrap();

        let all = repo.query(&ListingFilter::default()).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].bus_name, "Night Rider");
        assert_eq!(all[0].scraped_at.format("%Y-%m-%d").to_string(), "2024-06-01");
    }

    #[test]
    fn test_upsert_idempotent_on_natural_key() {
        let repo = ListingRepository::in_memory().unwrap();
        let mut row = listing("SomeRTC", "A to B", "Night Rider", "21:30");
        repo.upsert(&row).unwrap();

        row.price = 999.0;
        row.seats_available = 3;
        repo.upsert(&row).unwrap();

        let all = repo.listings_for_route("A to B").unwrap();
        assert_eq!(all.len(), 1);
        // Second upsert's non-key fields win.
        assert_eq!(all[0].price, 999.0);
        assert_eq!(all[0].seats_available, 3);
    }

    #[test]
    fn test_distinct_key_fields_are_separate_rows() {
        let repo = ListingRepository::in_memory().unwrap();
        repo.upsert(&listing("SomeRTC", "A to B", "Night Rider", "21:30"))
            .unwrap();
        repo.upsert(&listing("SomeRTC", "A to B", "Night Rider", "23:00"))
            .unwrap();
        repo.upsert(&listing("SomeRTC", "A to B", "Day Liner", "21:30"))
            .unwrap();

        assert_eq!(repo.count().unwrap(), 3);
    }

    #[test]
    fn test_filters() {
        let repo = ListingRepository::in_memory().unwrap();
        let mut cheap = listing("SomeRTC", "A to B", "Budget Bus", "06:00");
        cheap.price = 300.0;
        cheap.star_rating = 2.5;
        let mut plush = listing("OtherRTC", "A to B", "Plush Bus", "22:00");
        plush.price = 1500.0;
        plush.star_rating = 4.8;
        repo.upsert(&cheap).unwrap();
        repo.upsert(&plush).unwrap();

        let rated = repo
            .query(&ListingFilter {
                min_rating: Some(4.0),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(rated.len(), 1);
        assert_eq!(rated[0].bus_name, "Plush Bus");

        let priced = repo
            .query(&ListingFilter {
                min_price: Some(100.0),
                max_price: Some(500.0),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(priced.len(), 1);
        assert_eq!(priced[0].bus_name, "Budget Bus");

        let by_operator = repo
            .query(&ListingFilter {
                operator: Some("OtherRTC".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(by_operator.len(), 1);

        let by_departure = repo
            .query(&ListingFilter {
                departing_time: Some("06:00".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(by_departure.len(), 1);
        assert_eq!(by_departure[0].bus_name, "Budget Bus");
    }

    #[test]
    fn test_upsert_fails_without_table() {
        let repo = ListingRepository::in_memory().unwrap();
        repo.drop_listings_table().unwrap();

        let result = repo.upsert(&listing("SomeRTC", "A to B", "Night Rider", "21:30"));
        assert!(result.is_err());
    }

    #[test]
    fn test_distinct_values() {
        let repo = ListingRepository::in_memory().unwrap();
        repo.upsert(&listing("SomeRTC", "A to B", "Bus 1", "21:30"))
            .unwrap();
        repo.upsert(&listing("SomeRTC", "C to D", "Bus 2", "22:30"))
            .unwrap();

        let routes = repo.distinct_values("route_name").unwrap();
        assert_eq!(routes, vec!["A to B".to_string(), "C to D".to_string()]);

        assert!(repo.distinct_values("price; DROP TABLE bus_listings").is_err());
    }
}

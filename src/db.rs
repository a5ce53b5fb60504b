//! Database module for the clinic concierge
//!
//! Provides persistence for finalized bookings.

mod schema;

pub use schema::*;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Database lock poisoned")]
    Poisoned,
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::Poisoned)
    }

    fn run_migrations(&self) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // ==================== Booking Operations ====================

    /// Store a finalized booking
    pub fn insert_booking(&self, booking: &NewBooking) -> DbResult<Booking> {
        let conn = self.lock()?;
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO bookings (id, name, phone, service, appointment, image, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                id,
                booking.name,
                booking.phone,
                booking.service,
                booking.appointment,
                booking.image,
                now.to_rfc3339()
            ],
        )?;

        Ok(Booking {
            id,
            name: booking.name.clone(),
            phone: booking.phone.clone(),
            service: booking.service.clone(),
            appointment: booking.appointment.clone(),
            image: booking.image.clone(),
            created_at: now,
        })
    }

    /// Delete every booking made under `phone`; returns how many were removed.
    ///
    /// Numbers are compared on their trailing significant digits so a local
    /// number matches the international form the sender id uses.
    pub fn delete_bookings_by_phone(&self, phone: &str) -> DbResult<usize> {
        let conn = self.lock()?;
        let digits = normalize_phone(phone);
        let suffix = phone_suffix(phone);

        let deleted = conn.execute(
            "DELETE FROM bookings
             WHERE phone = ?1 OR (?2 IS NOT NULL AND substr(phone, -?3) = ?2)",
            params![digits, suffix, PHONE_SUFFIX_DIGITS],
        )?;
        Ok(deleted)
    }

    /// All bookings, newest first
    pub fn list_bookings(&self) -> DbResult<Vec<Booking>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, phone, service, appointment, image, created_at
             FROM bookings
             ORDER BY created_at DESC",
        )?;

        let rows = stmt.query_map([], booking_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }
}

fn booking_from_row(row: &Row<'_>) -> rusqlite::Result<Booking> {
    Ok(Booking {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        service: row.get(3)?,
        appointment: row.get(4)?,
        image: row.get(5)?,
        created_at: parse_datetime(&row.get::<_, String>(6)?),
    })
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}

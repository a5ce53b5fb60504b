//! Database schema and types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// SQL schema for initialization
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS bookings (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    phone TEXT NOT NULL,
    service TEXT NOT NULL,
    appointment TEXT NOT NULL,
    image TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_bookings_phone ON bookings(phone);
CREATE INDEX IF NOT EXISTS idx_bookings_created ON bookings(created_at DESC);
";

/// A completed booking draft, ready to be stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBooking {
    pub name: String,
    pub phone: String,
    pub service: String,
    pub appointment: String,
    pub image: Option<String>,
}

/// Stored booking record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub service: String,
    pub appointment: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Number of trailing digits that identify a mobile number regardless of
/// country code or trunk prefix (`0554412398` vs `966554412398`).
pub const PHONE_SUFFIX_DIGITS: usize = 9;

/// Digits-only form of a phone number
pub fn normalize_phone(phone: &str) -> String {
    phone.chars().filter(char::is_ascii_digit).collect()
}

/// Trailing significant digits of a phone number, if it is long enough
pub fn phone_suffix(phone: &str) -> Option<String> {
    let digits = normalize_phone(phone);
    let skip = digits.len().checked_sub(PHONE_SUFFIX_DIGITS)?;
    Some(digits.chars().skip(skip).collect())
}

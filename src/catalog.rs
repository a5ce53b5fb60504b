//! Clinic catalog: services, opening schedule and media links
//!
//! A built-in default is used unless `CLINIC_CATALOG_PATH` points at a JSON
//! file with the same shape.

use crate::intent::Language;
use chrono::{Datelike, Days, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// WhatsApp interactive lists hold at most ten rows.
pub const MAX_LIST_ROWS: usize = 10;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid catalog {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub title_en: String,
    pub title_ar: String,
    /// Picture attached to the booking confirmation for this service
    #[serde(default)]
    pub image: Option<String>,
}

impl Service {
    pub fn title(&self, lang: Language) -> &str {
        match lang {
            Language::English => &self.title_en,
            Language::Arabic => &self.title_ar,
        }
    }
}

/// A bookable appointment time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationInfo {
    pub address_en: String,
    pub address_ar: String,
    pub map_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OffersInfo {
    pub validity_en: String,
    pub validity_ar: String,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    /// How many days ahead (including today) appointments are offered
    pub days_ahead: u32,
    /// Daily start times, `HH:MM`
    pub times: Vec<String>,
    #[serde(default)]
    pub closed_on: Option<Weekday>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub clinic_name: String,
    pub services: Vec<Service>,
    pub location: LocationInfo,
    pub offers: OffersInfo,
    #[serde(default)]
    pub doctors: Vec<String>,
    pub schedule: Schedule,
}

impl Catalog {
    /// Load from a JSON file, or fall back to the built-in catalog
    pub fn load(path: Option<&Path>) -> Result<Self, CatalogError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| CatalogError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Free slots after `now`, in chronological order, capped to one list
    pub fn upcoming_slots(&self, now: NaiveDateTime) -> Vec<Slot> {
        let mut times: Vec<NaiveTime> = self
            .schedule
            .times
            .iter()
            .filter_map(|t| NaiveTime::parse_from_str(t, "%H:%M").ok())
            .collect();
        times.sort();

        (0..u64::from(self.schedule.days_ahead))
            .filter_map(|offset| now.date().checked_add_days(Days::new(offset)))
            .filter(|date| Some(date.weekday()) != self.schedule.closed_on)
            .flat_map(|date| times.iter().map(move |time| date.and_time(*time)))
            .filter(|start| *start > now)
            .take(MAX_LIST_ROWS)
            .map(|start| Slot {
                id: start.format("%Y%m%d%H%M").to_string(),
                label: start.format("%a %d %b %H:%M").to_string(),
            })
            .collect()
    }

    pub fn location_text(&self, lang: Language) -> String {
        let address = match lang {
            Language::English => &self.location.address_en,
            Language::Arabic => &self.location.address_ar,
        };
        format!("📍 {address}\n{}", self.location.map_url)
    }

    pub fn offers_validity(&self, lang: Language) -> &str {
        match lang {
            Language::English => &self.offers.validity_en,
            Language::Arabic => &self.offers.validity_ar,
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        let service = |id: &str, en: &str, ar: &str| Service {
            id: id.to_string(),
            title_en: en.to_string(),
            title_ar: ar.to_string(),
            image: None,
        };
        Self {
            clinic_name: "Smile Clinic".to_string(),
            services: vec![
                service("checkup", "Checkup", "كشف"),
                service("cleaning", "Cleaning", "تنظيف"),
                service("whitening", "Whitening", "تبييض"),
                service("fillings", "Fillings", "حشوات"),
                service("orthodontics", "Orthodontics", "تقويم"),
                service("implants", "Implants", "زراعة"),
            ],
            location: LocationInfo {
                address_en: "Smile Clinic, Prince Sultan Road, Jeddah".to_string(),
                address_ar: "عيادة سمايل، طريق الأمير سلطان، جدة".to_string(),
                map_url: "https://maps.google.com/?q=Smile+Clinic+Jeddah".to_string(),
            },
            offers: OffersInfo {
                validity_en: "🎁 Our offers are valid until the end of this month. Would you like to see them?".to_string(),
                validity_ar: "🎁 عروضنا سارية حتى نهاية الشهر. تحب نرسلها لك؟".to_string(),
                images: Vec::new(),
            },
            doctors: Vec::new(),
            schedule: Schedule {
                days_ahead: 7,
                times: vec![
                    "10:00".to_string(),
                    "12:00".to_string(),
                    "16:00".to_string(),
                    "19:00".to_string(),
                ],
                closed_on: Some(Weekday::Fri),
            },
        }
    }
}

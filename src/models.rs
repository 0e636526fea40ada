// Data model shared by the catalog and booking components

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// Display strings are carried in both storefront languages
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct LocalizedText {
    pub en: String,
    pub ar: String,
}

impl LocalizedText {
    pub fn new(en: impl Into<String>, ar: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            ar: ar.into(),
        }
    }

    /// Case-insensitive match against either language. `needle` must already be lowercase.
    pub fn contains_lowercase(&self, needle: &str) -> bool {
        self.en.to_lowercase().contains(needle) || self.ar.to_lowercase().contains(needle)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Royal,
    Luxury,
    Premium,
    Standard,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Royal => "royal",
            Category::Luxury => "luxury",
            Category::Premium => "premium",
            Category::Standard => "standard",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// A rentable tent
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Unit {
    pub id: String,
    pub slug: String,
    pub name: LocalizedText,
    pub description: LocalizedText,
    pub category: Category,
    pub capacity: u32,
    pub price_per_night: f64,
    pub min_nights: u32,
    pub max_nights: u32,
    pub is_available: bool,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
}

impl Unit {
    /// Checks the invariants a stored unit row must satisfy.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() || self.slug.trim().is_empty() {
            return Err(format!("unit '{}' has an empty id or slug", self.id));
        }
        if self.capacity == 0 {
            return Err(format!("unit '{}' has zero capacity", self.id));
        }
        if !(self.price_per_night > 0.0) {
            return Err(format!(
                "unit '{}' has non-positive price {}",
                self.id, self.price_per_night
            ));
        }
        if self.min_nights == 0 || self.min_nights > self.max_nights {
            return Err(format!(
                "unit '{}' has invalid stay bounds {}..={}",
                self.id, self.min_nights, self.max_nights
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    // Cancelled bookings release their dates
    pub fn counts_toward_occupancy(&self) -> bool {
        !matches!(self, BookingStatus::Cancelled)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    /// Transitions are driven by back-office processes; this only encodes which are legal.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Confirmed)
                | (BookingStatus::Pending, BookingStatus::Cancelled)
                | (BookingStatus::Confirmed, BookingStatus::Completed)
                | (BookingStatus::Confirmed, BookingStatus::Cancelled)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Booking {
    pub id: String,
    pub unit_id: String,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub nights: u32,
    pub guests: u32,
    pub total_price: f64,
    pub special_requests: Option<String>,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

// Per-date block for a unit; absence means available
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AvailabilityOverride {
    pub unit_id: String,
    pub date: NaiveDate,
    pub is_available: bool,
}

// Raw reservation request as submitted by a client
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BookingRequest {
    pub unit_id: String,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: String,
    pub check_in: String,
    pub check_out: String,
    pub guests: u32,
    pub special_requests: Option<String>,
}

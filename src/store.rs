// Persistence collaborator: the trait the core talks to, plus an in-memory implementation
// used by tests, benchmarks and the demo binary

use crate::dates::StayRange;
use crate::models::{AvailabilityOverride, Booking, Unit};
use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::RwLock;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataAccessError {
    #[error("Store unreachable: {0}")]
    Unreachable(String),

    #[error("Store request timed out after {0}ms")]
    Timeout(u64),

    #[error("Malformed data: {0}")]
    Malformed(String),

    #[error("Duplicate key: {0}")]
    Duplicate(String),

    // Raised by stores that enforce range exclusion on insert
    #[error("Booking range conflicts with an existing booking: {0}")]
    Conflict(String),
}

/// Runs a store call under a deadline, mapping expiry to `DataAccessError::Timeout`.
pub async fn bounded<T, F>(timeout: Duration, call: F) -> Result<T, DataAccessError>
where
    F: std::future::Future<Output = Result<T, DataAccessError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(DataAccessError::Timeout(timeout.as_millis() as u64)),
    }
}

// Storage contract required by the catalog and booking components
#[async_trait]
pub trait TentStore: Send + Sync + 'static {
    async fn fetch_units(&self) -> Result<Vec<Unit>, DataAccessError>;

    async fn fetch_unit_by_id(&self, id: &str) -> Result<Option<Unit>, DataAccessError>;

    async fn fetch_unit_by_slug(&self, slug: &str) -> Result<Option<Unit>, DataAccessError>;

    // Bookings for the unit whose range overlaps `range`, in any status
    async fn fetch_bookings_for_unit(
        &self,
        unit_id: &str,
        range: StayRange,
    ) -> Result<Vec<Booking>, DataAccessError>;

    // Overrides inside `range` with `is_available = false`
    async fn fetch_blocked_dates(
        &self,
        unit_id: &str,
        range: StayRange,
    ) -> Result<Vec<AvailabilityOverride>, DataAccessError>;

    /// Inserts the row or fails without writing anything.
    async fn insert_booking(&self, booking: Booking) -> Result<(), DataAccessError>;

    async fn fetch_booking(&self, id: &str) -> Result<Option<Booking>, DataAccessError>;
}

#[derive(Debug, Default)]
pub struct StoreStats {
    pub queries: AtomicUsize,
    pub inserts: AtomicUsize,
    pub failures: AtomicUsize,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct StoreStatsReport {
    pub queries: usize,
    pub inserts: usize,
    pub failures: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StoreSeed {
    pub units: Vec<Unit>,
    pub bookings: Vec<Booking>,
    pub overrides: Vec<AvailabilityOverride>,
}

pub struct InMemoryStore {
    units: RwLock<HashMap<String, Unit>>,
    bookings: RwLock<Vec<Booking>>,
    overrides: RwLock<HashMap<(String, NaiveDate), AvailabilityOverride>>,
    delay_ms: AtomicU64,
    fail_next_requests: AtomicUsize,
    stats: StoreStats,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            units: RwLock::new(HashMap::new()),
            bookings: RwLock::new(Vec::new()),
            overrides: RwLock::new(HashMap::new()),
            delay_ms: AtomicU64::new(0),
            fail_next_requests: AtomicUsize::new(0),
            stats: StoreStats::default(),
        }
    }

    /// Builds a store from a JSON document with `units`, `bookings` and `overrides` arrays.
    pub fn from_json(json: &str) -> Result<Self, DataAccessError> {
        let seed: StoreSeed =
            serde_json::from_str(json).map_err(|e| DataAccessError::Malformed(e.to_string()))?;

        let store = Self::new();
        for unit in seed.units {
            store.put_unit(unit)?;
        }
        for booking in seed.bookings {
            store.put_booking(booking)?;
        }
        for block in seed.overrides {
            store.put_override(block);
        }
        Ok(store)
    }

    pub fn put_unit(&self, unit: Unit) -> Result<(), DataAccessError> {
        unit.validate().map_err(DataAccessError::Malformed)?;

        let mut units = self.units.write();
        if units
            .values()
            .any(|existing| existing.slug == unit.slug && existing.id != unit.id)
        {
            return Err(DataAccessError::Duplicate(format!("slug '{}'", unit.slug)));
        }
        units.insert(unit.id.clone(), unit);
        Ok(())
    }

    // Seeds a booking without the exclusion check (back-office imports)
    pub fn put_booking(&self, booking: Booking) -> Result<(), DataAccessError> {
        if booking.check_in >= booking.check_out {
            return Err(DataAccessError::Malformed(format!(
                "booking '{}' has an empty range",
                booking.id
            )));
        }
        let mut bookings = self.bookings.write();
        if bookings.iter().any(|existing| existing.id == booking.id) {
            return Err(DataAccessError::Duplicate(format!("booking '{}'", booking.id)));
        }
        bookings.push(booking);
        Ok(())
    }

    // (unit, date) is unique; a second override replaces the first
    pub fn put_override(&self, block: AvailabilityOverride) {
        self.overrides
            .write()
            .insert((block.unit_id.clone(), block.date), block);
    }

    pub fn bookings(&self) -> Vec<Booking> {
        self.bookings.read().clone()
    }

    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn fail_next_requests(&self, count: usize) {
        self.fail_next_requests.store(count, Ordering::SeqCst);
    }

    pub fn stats(&self) -> StoreStatsReport {
        StoreStatsReport {
            queries: self.stats.queries.load(Ordering::SeqCst),
            inserts: self.stats.inserts.load(Ordering::SeqCst),
            failures: self.stats.failures.load(Ordering::SeqCst),
        }
    }

    // Simulated round trip; no lock is held across the sleep
    async fn round_trip(&self) -> Result<(), DataAccessError> {
        self.stats.queries.fetch_add(1, Ordering::SeqCst);

        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let failed = self
            .fail_next_requests
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            self.stats.failures.fetch_add(1, Ordering::SeqCst);
            return Err(DataAccessError::Unreachable(
                "simulated connection failure".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl TentStore for InMemoryStore {
    async fn fetch_units(&self) -> Result<Vec<Unit>, DataAccessError> {
        self.round_trip().await?;
        Ok(self.units.read().values().cloned().collect())
    }

    async fn fetch_unit_by_id(&self, id: &str) -> Result<Option<Unit>, DataAccessError> {
        self.round_trip().await?;
        Ok(self.units.read().get(id).cloned())
    }

    async fn fetch_unit_by_slug(&self, slug: &str) -> Result<Option<Unit>, DataAccessError> {
        self.round_trip().await?;
        Ok(self
            .units
            .read()
            .values()
            .find(|unit| unit.slug == slug)
            .cloned())
    }

    async fn fetch_bookings_for_unit(
        &self,
        unit_id: &str,
        range: StayRange,
    ) -> Result<Vec<Booking>, DataAccessError> {
        self.round_trip().await?;
        let bookings = self.bookings.read();
        let mut found = Vec::new();
        for booking in bookings.iter().filter(|b| b.unit_id == unit_id) {
            let stay = StayRange::new(booking.check_in, booking.check_out).map_err(|_| {
                DataAccessError::Malformed(format!("booking '{}' has an empty range", booking.id))
            })?;
            if stay.overlaps(&range) {
                found.push(booking.clone());
            }
        }
        Ok(found)
    }

    async fn fetch_blocked_dates(
        &self,
        unit_id: &str,
        range: StayRange,
    ) -> Result<Vec<AvailabilityOverride>, DataAccessError> {
        self.round_trip().await?;
        let overrides = self.overrides.read();
        let mut blocked: Vec<AvailabilityOverride> = overrides
            .values()
            .filter(|o| o.unit_id == unit_id && !o.is_available && range.contains(o.date))
            .cloned()
            .collect();
        blocked.sort_by_key(|o| o.date);
        Ok(blocked)
    }

    async fn insert_booking(&self, booking: Booking) -> Result<(), DataAccessError> {
        self.round_trip().await?;

        let stay = StayRange::new(booking.check_in, booking.check_out).map_err(|_| {
            DataAccessError::Malformed(format!("booking '{}' has an empty range", booking.id))
        })?;

        // Check and write under one write guard
        let mut bookings = self.bookings.write();
        if bookings.iter().any(|existing| existing.id == booking.id) {
            return Err(DataAccessError::Duplicate(format!("booking '{}'", booking.id)));
        }
        let clash = bookings.iter().find(|existing| {
            existing.unit_id == booking.unit_id
                && existing.status.counts_toward_occupancy()
                && StayRange::new(existing.check_in, existing.check_out)
                    .map(|other| other.overlaps(&stay))
                    .unwrap_or(false)
        });
        if let Some(existing) = clash {
            return Err(DataAccessError::Conflict(format!(
                "unit '{}' already booked by '{}'",
                booking.unit_id, existing.id
            )));
        }

        bookings.push(booking);
        self.stats.inserts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn fetch_booking(&self, id: &str) -> Result<Option<Booking>, DataAccessError> {
        self.round_trip().await?;
        Ok(self.bookings.read().iter().find(|b| b.id == id).cloned())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::models::*;
    use chrono::{TimeZone, Utc};

    pub fn unit(id: &str, category: Category, price: f64, capacity: u32) -> Unit {
        Unit {
            id: id.to_string(),
            slug: format!("{}-tent", id),
            name: LocalizedText::new(format!("{} Tent", id), format!("خيمة {}", id)),
            description: LocalizedText::new("Canvas tent with a view", "خيمة مع إطلالة"),
            category,
            capacity,
            price_per_night: price,
            min_nights: 1,
            max_nights: 30,
            is_available: true,
            is_featured: false,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    pub fn booking(
        id: &str,
        unit_id: &str,
        check_in: &str,
        check_out: &str,
        status: BookingStatus,
    ) -> Booking {
        let check_in = chrono::NaiveDate::parse_from_str(check_in, "%Y-%m-%d").unwrap();
        let check_out = chrono::NaiveDate::parse_from_str(check_out, "%Y-%m-%d").unwrap();
        Booking {
            id: id.to_string(),
            unit_id: unit_id.to_string(),
            guest_name: "Layla Hassan".to_string(),
            guest_email: "layla@example.com".to_string(),
            guest_phone: "+971500000000".to_string(),
            check_in,
            check_out,
            nights: (check_out - check_in).num_days() as u32,
            guests: 2,
            total_price: 0.0,
            special_requests: None,
            status,
            payment_status: PaymentStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

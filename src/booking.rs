// Availability checks and the booking commit path
//
// Commits for one unit are serialized through a per-unit async mutex, and
// availability is re-read while holding it, so two overlapping requests can
// never both be admitted. Stores that also enforce exclusion on insert report
// it as `DataAccessError::Conflict`, which is treated as unavailability.

use crate::catalog::{CatalogError, CatalogService};
use crate::config::EngineConfig;
use crate::dates::{DateRangeError, StayRange};
use crate::models::{Booking, BookingRequest, BookingStatus, PaymentStatus, Unit};
use crate::notify::{dispatch_detached, BookingNotification, BookingNotifier};
use crate::store::{bounded, DataAccessError, TentStore};
use chrono::{NaiveDate, Utc};
use dashmap::DashMap;
use regex::Regex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Identifier must not be empty")]
    EmptyIdentifier,

    #[error("Guest name is required")]
    MissingGuestName,

    #[error("Guest email is required")]
    MissingGuestEmail,

    #[error("Guest email '{0}' is not a valid address")]
    InvalidEmail(String),

    #[error("Guest phone is required")]
    MissingGuestPhone,

    #[error("At least one guest is required")]
    TooFewGuests,

    #[error("{guests} guests exceed the tent capacity of {capacity}")]
    GuestsExceedCapacity { guests: u32, capacity: u32 },

    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Check-out must be after check-in")]
    CheckOutNotAfterCheckIn,

    #[error("Stay of {nights} nights is shorter than the minimum of {min_nights}")]
    StayTooShort { nights: u32, min_nights: u32 },

    #[error("Stay of {nights} nights is longer than the maximum of {max_nights}")]
    StayTooLong { nights: u32, max_nights: u32 },

    #[error("Unknown tent '{0}'")]
    UnknownUnit(String),
}

impl From<DateRangeError> for ValidationError {
    fn from(err: DateRangeError) -> Self {
        match err {
            DateRangeError::Malformed(value) => ValidationError::InvalidDate(value),
            DateRangeError::NotIncreasing => ValidationError::CheckOutNotAfterCheckIn,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnavailableReason {
    Overlap,
    BlockedDate(NaiveDate),
    UnitDisabled,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BookingError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Tent '{unit_id}' is not available for {range} ({reason:?})")]
    Unavailable {
        unit_id: String,
        range: String,
        reason: UnavailableReason,
    },

    #[error("Data access failed: {0}")]
    DataAccess(#[from] DataAccessError),
}

impl From<CatalogError> for BookingError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::EmptyIdentifier => ValidationError::EmptyIdentifier.into(),
            CatalogError::DataAccess(e) => BookingError::DataAccess(e),
        }
    }
}

#[derive(Debug, Default)]
pub struct BookingStats {
    pub bookings_created: AtomicUsize,
    pub rejected_invalid: AtomicUsize,
    pub rejected_unavailable: AtomicUsize,
    pub failed_data_access: AtomicUsize,
    pub notifications_sent: AtomicUsize,
    pub notifications_failed: AtomicUsize,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct BookingStatsReport {
    pub bookings_created: usize,
    pub rejected_invalid: usize,
    pub rejected_unavailable: usize,
    pub failed_data_access: usize,
    pub notifications_sent: usize,
    pub notifications_failed: usize,
}

pub struct BookingService<S: TentStore> {
    catalog: CatalogService<S>,
    store: Arc<S>,
    notifier: Arc<dyn BookingNotifier>,
    unit_locks: DashMap<String, Arc<Mutex<()>>>,
    store_timeout: Duration,
    notify_timeout: Duration,
    stats: Arc<BookingStats>,
}

impl<S: TentStore> BookingService<S> {
    pub fn new(store: Arc<S>, notifier: Arc<dyn BookingNotifier>, config: &EngineConfig) -> Self {
        Self {
            catalog: CatalogService::new(Arc::clone(&store), config.store_timeout()),
            store,
            notifier,
            unit_locks: DashMap::new(),
            store_timeout: config.store_timeout(),
            notify_timeout: config.notifier.timeout(),
            stats: Arc::new(BookingStats::default()),
        }
    }

    pub fn catalog(&self) -> &CatalogService<S> {
        &self.catalog
    }

    /// True when `[check_in, check_out)` is free of live bookings and blocked dates.
    /// Read-only; `create_booking` repeats the check under the unit's commit lock.
    pub async fn check_availability(
        &self,
        unit_id: &str,
        check_in: &str,
        check_out: &str,
    ) -> Result<bool, BookingError> {
        let unit_id = unit_id.trim();
        if unit_id.is_empty() {
            return Err(ValidationError::EmptyIdentifier.into());
        }
        let range = StayRange::parse(check_in, check_out).map_err(ValidationError::from)?;

        if self.catalog.get_unit_by_id(unit_id).await?.is_none() {
            return Err(ValidationError::UnknownUnit(unit_id.to_string()).into());
        }
        Ok(self.find_conflict(unit_id, range).await?.is_none())
    }

    pub async fn create_booking(&self, request: BookingRequest) -> Result<Booking, BookingError> {
        let result = self.try_create_booking(request).await;
        match &result {
            Ok(_) => &self.stats.bookings_created,
            Err(BookingError::Validation(_)) => &self.stats.rejected_invalid,
            Err(BookingError::Unavailable { .. }) => &self.stats.rejected_unavailable,
            Err(BookingError::DataAccess(_)) => &self.stats.failed_data_access,
        }
        .fetch_add(1, Ordering::SeqCst);
        result
    }

    /// Current status of a booking, or `None` when no such booking exists.
    pub async fn booking_status(
        &self,
        booking_id: &str,
    ) -> Result<Option<BookingStatus>, BookingError> {
        let booking_id = booking_id.trim();
        if booking_id.is_empty() {
            return Err(ValidationError::EmptyIdentifier.into());
        }
        let booking = bounded(self.store_timeout, self.store.fetch_booking(booking_id)).await?;
        Ok(booking.map(|b| b.status))
    }

    pub fn stats(&self) -> BookingStatsReport {
        BookingStatsReport {
            bookings_created: self.stats.bookings_created.load(Ordering::SeqCst),
            rejected_invalid: self.stats.rejected_invalid.load(Ordering::SeqCst),
            rejected_unavailable: self.stats.rejected_unavailable.load(Ordering::SeqCst),
            failed_data_access: self.stats.failed_data_access.load(Ordering::SeqCst),
            notifications_sent: self.stats.notifications_sent.load(Ordering::SeqCst),
            notifications_failed: self.stats.notifications_failed.load(Ordering::SeqCst),
        }
    }

    async fn try_create_booking(&self, request: BookingRequest) -> Result<Booking, BookingError> {
        let unit_id = request.unit_id.trim().to_string();
        if unit_id.is_empty() {
            return Err(ValidationError::EmptyIdentifier.into());
        }
        validate_contact(&request)?;

        let unit = self
            .catalog
            .get_unit_by_id(&unit_id)
            .await?
            .ok_or_else(|| ValidationError::UnknownUnit(unit_id.clone()))?;

        validate_guests(request.guests, &unit)?;
        let range = StayRange::parse(&request.check_in, &request.check_out)
            .map_err(ValidationError::from)?;
        let nights = validate_nights(range, &unit)?;

        if !unit.is_available {
            debug!(unit_id = %unit.id, "booking rejected, tent disabled");
            return Err(unavailable(&unit.id, range, UnavailableReason::UnitDisabled));
        }

        let booking = Booking {
            id: uuid::Uuid::new_v4().to_string(),
            unit_id: unit.id.clone(),
            guest_name: request.guest_name.trim().to_string(),
            guest_email: request.guest_email.trim().to_string(),
            guest_phone: request.guest_phone.trim().to_string(),
            check_in: range.check_in(),
            check_out: range.check_out(),
            nights,
            guests: request.guests,
            total_price: nights as f64 * unit.price_per_night,
            special_requests: request
                .special_requests
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Pending,
            created_at: Utc::now(),
        };

        self.commit(&unit, range, booking.clone()).await?;

        info!(
            booking_id = %booking.id,
            unit_id = %unit.id,
            range = %range,
            nights,
            total_price = booking.total_price,
            "booking committed"
        );

        self.notify(&booking, &unit);
        Ok(booking)
    }

    // Check-and-insert under the unit's lock; the lock is released on every exit path
    async fn commit(
        &self,
        unit: &Unit,
        range: StayRange,
        booking: Booking,
    ) -> Result<(), BookingError> {
        let lock = self.unit_lock(&unit.id);
        let _guard = lock.lock().await;

        if let Some(reason) = self.find_conflict(&unit.id, range).await? {
            debug!(unit_id = %unit.id, range = %range, ?reason, "booking rejected, dates taken");
            return Err(unavailable(&unit.id, range, reason));
        }

        match bounded(self.store_timeout, self.store.insert_booking(booking)).await {
            Ok(()) => Ok(()),
            Err(DataAccessError::Conflict(detail)) => {
                debug!(unit_id = %unit.id, %detail, "store rejected overlapping insert");
                Err(unavailable(&unit.id, range, UnavailableReason::Overlap))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_conflict(
        &self,
        unit_id: &str,
        range: StayRange,
    ) -> Result<Option<UnavailableReason>, BookingError> {
        let bookings = bounded(
            self.store_timeout,
            self.store.fetch_bookings_for_unit(unit_id, range),
        )
        .await?;
        if has_live_overlap(&bookings, range) {
            return Ok(Some(UnavailableReason::Overlap));
        }

        let blocked = bounded(
            self.store_timeout,
            self.store.fetch_blocked_dates(unit_id, range),
        )
        .await?;
        Ok(blocked
            .iter()
            .filter(|o| !o.is_available && range.contains(o.date))
            .map(|o| o.date)
            .min()
            .map(UnavailableReason::BlockedDate))
    }

    fn unit_lock(&self, unit_id: &str) -> Arc<Mutex<()>> {
        self.unit_locks
            .entry(unit_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn notify(&self, booking: &Booking, unit: &Unit) {
        let stats = Arc::clone(&self.stats);
        dispatch_detached(
            Arc::clone(&self.notifier),
            BookingNotification::new(booking, unit),
            self.notify_timeout,
            move |outcome| {
                let counter = if outcome.is_ok() {
                    &stats.notifications_sent
                } else {
                    &stats.notifications_failed
                };
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );
    }
}

/// Overlap rule: any non-cancelled booking whose `[in, out)` intersects `range`.
pub fn has_live_overlap(bookings: &[Booking], range: StayRange) -> bool {
    bookings.iter().any(|b| {
        b.status.counts_toward_occupancy()
            && StayRange::new(b.check_in, b.check_out)
                .map(|stay| stay.overlaps(&range))
                .unwrap_or(false)
    })
}

fn unavailable(unit_id: &str, range: StayRange, reason: UnavailableReason) -> BookingError {
    BookingError::Unavailable {
        unit_id: unit_id.to_string(),
        range: range.to_string(),
        reason,
    }
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"))
}

fn validate_contact(request: &BookingRequest) -> Result<(), ValidationError> {
    if request.guest_name.trim().is_empty() {
        return Err(ValidationError::MissingGuestName);
    }
    let email = request.guest_email.trim();
    if email.is_empty() {
        return Err(ValidationError::MissingGuestEmail);
    }
    if !email_pattern().is_match(email) {
        return Err(ValidationError::InvalidEmail(email.to_string()));
    }
    if request.guest_phone.trim().is_empty() {
        return Err(ValidationError::MissingGuestPhone);
    }
    Ok(())
}

fn validate_guests(guests: u32, unit: &Unit) -> Result<(), ValidationError> {
    if guests < 1 {
        return Err(ValidationError::TooFewGuests);
    }
    if guests > unit.capacity {
        return Err(ValidationError::GuestsExceedCapacity {
            guests,
            capacity: unit.capacity,
        });
    }
    Ok(())
}

fn validate_nights(range: StayRange, unit: &Unit) -> Result<u32, ValidationError> {
    let nights = range.nights();
    if nights < unit.min_nights {
        return Err(ValidationError::StayTooShort {
            nights,
            min_nights: unit.min_nights,
        });
    }
    if nights > unit.max_nights {
        return Err(ValidationError::StayTooLong {
            nights,
            max_nights: unit.max_nights,
        });
    }
    Ok(nights)
}

// Availability and booking engine for the tent storefront

pub mod booking;
pub mod catalog;
pub mod compare;
pub mod config;
pub mod dates;
pub mod models;
pub mod notify;
pub mod store;

// Re-export key types for convenience
pub use booking::{
    BookingError, BookingService, BookingStatsReport, UnavailableReason, ValidationError,
};
pub use catalog::{CatalogError, CatalogService, UnitFilter, FEATURED_UNITS_LIMIT};
pub use compare::{CompareError, CompareSessions};
pub use config::{CompareConfig, EngineConfig, NotifierConfig};
pub use dates::StayRange;
pub use models::{
    AvailabilityOverride, Booking, BookingRequest, BookingStatus, Category, LocalizedText,
    PaymentStatus, Unit,
};
pub use notify::{
    BookingNotification, BookingNotifier, NoopNotifier, NotificationError, WebhookNotifier,
};
pub use store::{DataAccessError, InMemoryStore, TentStore};

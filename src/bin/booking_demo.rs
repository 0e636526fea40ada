// Seeds an in-memory catalog, shows the featured tents and races two overlapping bookings

use anyhow::{Context, Result};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tent_booking::{
    BookingError, BookingRequest, BookingService, EngineConfig, InMemoryStore, UnitFilter,
    WebhookNotifier,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const SEED: &str = r#"{
    "units": [
        {"id": "t-royal", "slug": "sultans-pavilion",
         "name": {"en": "Sultan's Pavilion", "ar": "جناح السلطان"},
         "description": {"en": "Royal tent with private majlis", "ar": "خيمة ملكية مع مجلس خاص"},
         "category": "royal", "capacity": 6, "price_per_night": 1500.0,
         "min_nights": 2, "max_nights": 14, "is_available": true, "is_featured": true,
         "created_at": "2024-01-03T00:00:00Z"},
        {"id": "t-dune", "slug": "dune-retreat",
         "name": {"en": "Dune Retreat", "ar": "استراحة الكثبان"},
         "description": {"en": "Luxury tent facing the dunes", "ar": "خيمة فاخرة تطل على الكثبان"},
         "category": "luxury", "capacity": 4, "price_per_night": 600.0,
         "min_nights": 1, "max_nights": 30, "is_available": true, "is_featured": true,
         "created_at": "2024-01-02T00:00:00Z"},
        {"id": "t-oasis", "slug": "oasis-camp",
         "name": {"en": "Oasis Camp", "ar": "مخيم الواحة"},
         "description": {"en": "Standard tent by the palms", "ar": "خيمة قياسية بجانب النخيل"},
         "category": "standard", "capacity": 2, "price_per_night": 250.0,
         "min_nights": 1, "max_nights": 7, "is_available": true, "is_featured": false,
         "created_at": "2024-01-01T00:00:00Z"}
    ],
    "overrides": [{"unit_id": "t-dune", "date": "2024-03-20", "is_available": false}]
}"#;

fn request(guest: &str, check_in: &str, check_out: &str) -> BookingRequest {
    BookingRequest {
        unit_id: "t-dune".to_string(),
        guest_name: guest.to_string(),
        guest_email: format!("{}@example.com", guest.to_lowercase()),
        guest_phone: "+971500000000".to_string(),
        check_in: check_in.to_string(),
        check_out: check_out.to_string(),
        guests: 2,
        special_requests: None,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = EngineConfig::from_env();
    let store = Arc::new(InMemoryStore::from_json(SEED).context("seeding catalog")?);
    // simulated storage latency makes the race visible
    store.set_delay(Duration::from_millis(25));

    let notifier = WebhookNotifier::from_config(&config.notifier).context("building notifier")?;
    let service = Arc::new(BookingService::new(Arc::clone(&store), notifier, &config));

    for unit in service.catalog().list_featured_units().await? {
        info!(slug = %unit.slug, price = unit.price_per_night, "featured");
    }
    let luxury = service
        .catalog()
        .list_units(&UnitFilter {
            search: Some("dunes".to_string()),
            available_only: true,
            ..Default::default()
        })
        .await?;
    info!(matches = luxury.len(), "search for 'dunes'");

    let attempts = [
        request("Amira", "2024-03-01", "2024-03-04"),
        request("Yusuf", "2024-03-03", "2024-03-05"),
        request("Noor", "2024-03-19", "2024-03-21"),
    ];
    let results = join_all(attempts.into_iter().map(|req| {
        let service = Arc::clone(&service);
        async move { service.create_booking(req).await }
    }))
    .await;

    for result in results {
        match result {
            Ok(booking) => info!(
                booking_id = %booking.id,
                guest = %booking.guest_name,
                total_price = booking.total_price,
                "booked"
            ),
            Err(BookingError::Unavailable { reason, range, .. }) => {
                info!(%range, ?reason, "dates unavailable, pick different dates")
            }
            Err(e) => return Err(e).context("booking failed"),
        }
    }

    // give detached notifications a moment before exit
    tokio::time::sleep(config.notifier.timeout()).await;
    info!(stats = ?service.stats(), "done");
    Ok(())
}

//! Availability fan-out tests over the in-memory booking provider.

use std::sync::Arc;

use common::{InventoryTypeId, RateId};
use providers::{
    AvailabilityQuery, BookingApi, InMemoryBookingApi, PropertyAvailability, RateOffer,
};
use saga::AvailabilitySearch;

fn query() -> AvailabilityQuery {
    AvailabilityQuery {
        start_date: "2026-09-01".parse().unwrap(),
        end_date: "2026-09-05".parse().unwrap(),
        guests: 2,
    }
}

fn offer(rate_id: i64, code: &str, total: f64) -> RateOffer {
    RateOffer {
        rate_id: RateId::new(rate_id),
        rate_code: code.to_string(),
        rate_name: format!("{code} rate"),
        currency: "SEK".to_string(),
        total_price: total,
        avg_nightly_rate: total / 4.0,
        nights: 4,
        description: None,
    }
}

fn property(building: i64, inventory: i64, rates: Vec<RateOffer>) -> PropertyAvailability {
    PropertyAvailability {
        building_id: Some(building),
        building_name: Some(format!("Building {building}")),
        inventory_type_id: InventoryTypeId::new(inventory),
        inventory_type_name: Some("Studio".to_string()),
        rates,
    }
}

fn search_over(api: &Arc<InMemoryBookingApi>, codes: &[&str]) -> AvailabilitySearch {
    AvailabilitySearch::new(
        Arc::clone(api) as Arc<dyn BookingApi>,
        codes.iter().map(|c| c.to_string()).collect(),
    )
}

#[tokio::test]
async fn merges_rates_across_codes_per_property() {
    let api = Arc::new(InMemoryBookingApi::new());
    api.seed_availability("BAR", vec![property(1, 10, vec![offer(100, "BAR", 2000.0)])]);
    api.seed_availability(
        "WKLY",
        vec![property(1, 10, vec![offer(200, "WKLY", 1800.0)])],
    );

    let merged = search_over(&api, &["BAR", "WKLY"]).search(&query()).await;

    assert_eq!(merged.properties.len(), 1);
    assert_eq!(merged.properties[0].rates.len(), 2);
    assert!(merged.failed_rate_codes.is_empty());
}

#[tokio::test]
async fn one_failing_code_does_not_sink_the_search() {
    let api = Arc::new(InMemoryBookingApi::new());
    api.seed_availability("BAR", vec![property(1, 10, vec![offer(100, "BAR", 2000.0)])]);
    api.set_rate_code_failing("WKLY", true);

    let merged = search_over(&api, &["BAR", "WKLY"]).search(&query()).await;

    assert_eq!(merged.properties.len(), 1);
    assert_eq!(merged.failed_rate_codes, vec!["WKLY".to_string()]);
}

#[tokio::test]
async fn unknown_codes_yield_an_empty_result() {
    let api = Arc::new(InMemoryBookingApi::new());

    let merged = search_over(&api, &["BAR"]).search(&query()).await;

    assert!(merged.properties.is_empty());
    assert!(merged.failed_rate_codes.is_empty());
}

//! Availability search across the published rate codes.
//!
//! The booking provider answers availability per rate code, so one
//! frontend search fans out into one provider query per configured
//! code. Rate-code failures are isolated: a partial result with the
//! failing codes listed beats an empty error page.

use std::sync::Arc;

use futures_util::future::join_all;
use providers::{AvailabilityQuery, BookingApi, PropertyAvailability, RateOffer};
use serde::Serialize;

/// Merged fan-out result: one entry per property, plus the rate codes
/// whose queries failed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedAvailability {
    pub properties: Vec<PropertyAvailability>,
    pub failed_rate_codes: Vec<String>,
}

/// Fans availability queries out over the published rate codes and
/// merges the answers per property.
pub struct AvailabilitySearch {
    booking_api: Arc<dyn BookingApi>,
    rate_codes: Vec<String>,
}

impl AvailabilitySearch {
    pub fn new(booking_api: Arc<dyn BookingApi>, rate_codes: Vec<String>) -> Self {
        Self {
            booking_api,
            rate_codes,
        }
    }

    #[tracing::instrument(skip(self), fields(codes = self.rate_codes.len()))]
    pub async fn search(&self, query: &AvailabilityQuery) -> MergedAvailability {
        let lookups = self.rate_codes.iter().map(|code| async move {
            let result = self.booking_api.search_availability(code, query).await;
            (code.clone(), result)
        });

        let mut properties: Vec<PropertyAvailability> = Vec::new();
        let mut failed_rate_codes = Vec::new();
        for (code, result) in join_all(lookups).await {
            match result {
                Ok(batch) => {
                    for property in batch {
                        merge_property(&mut properties, property);
                    }
                }
                Err(error) => {
                    tracing::warn!(rate_code = %code, %error, "availability lookup failed");
                    metrics::counter!("availability_rate_code_failures_total").increment(1);
                    failed_rate_codes.push(code);
                }
            }
        }

        properties.sort_by(|a, b| {
            (a.building_id, a.inventory_type_id.value())
                .cmp(&(b.building_id, b.inventory_type_id.value()))
        });
        MergedAvailability {
            properties,
            failed_rate_codes,
        }
    }
}

/// Folds one property result into the merged list, keyed on building
/// and inventory type. Offers already present (same rate id) are kept
/// over later duplicates.
fn merge_property(merged: &mut Vec<PropertyAvailability>, incoming: PropertyAvailability) {
    let existing = merged.iter_mut().find(|p| {
        p.building_id == incoming.building_id && p.inventory_type_id == incoming.inventory_type_id
    });
    match existing {
        Some(entry) => {
            for rate in incoming.rates {
                if !entry.rates.iter().any(|known| known.rate_id == rate.rate_id) {
                    entry.rates.push(rate);
                }
            }
            if entry.building_name.is_none() {
                entry.building_name = incoming.building_name;
            }
            if entry.inventory_type_name.is_none() {
                entry.inventory_type_name = incoming.inventory_type_name;
            }
        }
        None => merged.push(incoming),
    }
}

/// Cheapest offer across a property's rates, by total price.
pub fn cheapest_offer(property: &PropertyAvailability) -> Option<&RateOffer> {
    property
        .rates
        .iter()
        .min_by(|a, b| a.total_price.total_cmp(&b.total_price))
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{InventoryTypeId, RateId};

    fn offer(rate_id: i64, code: &str, total: f64) -> RateOffer {
        RateOffer {
            rate_id: RateId::new(rate_id),
            rate_code: code.to_string(),
            rate_name: code.to_string(),
            currency: "SEK".to_string(),
            total_price: total,
            avg_nightly_rate: total / 2.0,
            nights: 2,
            description: None,
        }
    }

    fn property(building: i64, inventory: i64, rates: Vec<RateOffer>) -> PropertyAvailability {
        PropertyAvailability {
            building_id: Some(building),
            building_name: None,
            inventory_type_id: InventoryTypeId::new(inventory),
            inventory_type_name: None,
            rates,
        }
    }

    #[test]
    fn merge_combines_rates_for_the_same_property() {
        let mut merged = Vec::new();
        merge_property(&mut merged, property(1, 10, vec![offer(100, "BAR", 2000.0)]));
        merge_property(&mut merged, property(1, 10, vec![offer(200, "WKLY", 1800.0)]));
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].rates.len(), 2);
    }

    #[test]
    fn merge_drops_duplicate_rate_ids() {
        let mut merged = Vec::new();
        merge_property(&mut merged, property(1, 10, vec![offer(100, "BAR", 2000.0)]));
        merge_property(&mut merged, property(1, 10, vec![offer(100, "BAR", 2000.0)]));
        assert_eq!(merged[0].rates.len(), 1);
    }

    #[test]
    fn merge_keeps_distinct_properties_apart() {
        let mut merged = Vec::new();
        merge_property(&mut merged, property(1, 10, vec![offer(100, "BAR", 2000.0)]));
        merge_property(&mut merged, property(2, 10, vec![offer(100, "BAR", 2100.0)]));
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn cheapest_offer_picks_lowest_total() {
        let prop = property(
            1,
            10,
            vec![offer(100, "BAR", 2000.0), offer(200, "WKLY", 1800.0)],
        );
        assert_eq!(
            cheapest_offer(&prop).map(|o| o.rate_id),
            Some(RateId::new(200))
        );
    }
}

use common::{InventoryTypeId, RateId};
use serde::{Deserialize, Serialize};

/// The unit being booked, identified by a rate/unit-type pair produced
/// by availability search. Display names are only used to enrich the
/// notification payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitSelection {
    pub rate_id: RateId,
    pub inventory_type_id: InventoryTypeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_name: Option<String>,
}

impl UnitSelection {
    /// Human-readable property description for notifications.
    pub fn description(&self) -> String {
        match (&self.building_name, &self.unit_name) {
            (Some(building), Some(unit)) => format!("{building}, {unit}"),
            (Some(building), None) => building.clone(),
            (None, Some(unit)) => unit.clone(),
            (None, None) => format!("Unit type {}", self.inventory_type_id),
        }
    }
}

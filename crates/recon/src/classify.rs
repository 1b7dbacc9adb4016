use serde::{Deserialize, Serialize};

use crate::lookup::{InventoryStatus, LookupResponse};
use crate::model::{Classification, Side};

/// Recall text that marks a vehicle as held back.
const RECALL_MARKER: &str = "temporarily unavailable";

/// Inventory status codes with dedicated labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCodes {
    pub in_transit: String,
    pub courtesy: String,
}

impl Default for StatusCodes {
    fn default() -> Self {
        Self {
            in_transit: "InTransit".into(),
            courtesy: "EligRtlStkCT".into(),
        }
    }
}

/// Map a lookup response to a label. Precedence: recall, named inventory
/// status, unnamed inventory status, unknown.
pub fn classify_response(response: &LookupResponse, side: Side, codes: &StatusCodes) -> Classification {
    if let Some(ref recall) = response.recall_info {
        if recall.to_lowercase().contains(RECALL_MARKER) {
            return Classification::VehicleWithRecall;
        }
    }

    match response.inventory_status {
        Some(InventoryStatus { name: Some(ref name) }) if !name.is_empty() => {
            if *name == codes.in_transit && side == Side::Right {
                Classification::InTransit
            } else if *name == codes.courtesy {
                Classification::CourtesyVehicle
            } else {
                Classification::OtherInventoryStatus(name.clone())
            }
        }
        Some(_) => classify_side_only(side),
        None => Classification::StatusUnknown,
    }
}

/// Label for an unmatched VIN when no lookup context is available.
pub fn classify_side_only(side: Side) -> Classification {
    match side {
        Side::Right => Classification::ExclusiveToDealer,
        Side::Left => Classification::ExclusiveToManufacturer,
    }
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Which upstream feed a table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedKind {
    /// Website-syndication feed (Dealer.com): `dealer_id`, `vin`, `type`.
    Dealer,
    /// Dealer-management export (VinSolutions): `VIN`, `Type`.
    Manufacturer,
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dealer => write!(f, "dealer"),
            Self::Manufacturer => write!(f, "manufacturer"),
        }
    }
}

/// A row from the dealer feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DealerRecord {
    pub dealer_id: String,
    pub vin: String,
    pub vehicle_type: String,
}

/// A row from the manufacturer feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManufacturerRecord {
    pub vin: String,
    pub vehicle_type: String,
}

/// Vehicle type filter. `New`/`Used` compare verbatim (case-sensitive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TypeFilter {
    #[default]
    #[serde(alias = "all")]
    All,
    #[serde(alias = "new")]
    New,
    #[serde(alias = "used")]
    Used,
}

impl TypeFilter {
    pub fn matches(&self, vehicle_type: &str) -> bool {
        match self {
            Self::All => true,
            Self::New => vehicle_type == "New",
            Self::Used => vehicle_type == "Used",
        }
    }
}

impl fmt::Display for TypeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "All"),
            Self::New => write!(f, "New"),
            Self::Used => write!(f, "Used"),
        }
    }
}

impl FromStr for TypeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "All" | "all" => Ok(Self::All),
            "New" | "new" => Ok(Self::New),
            "Used" | "used" => Ok(Self::Used),
            other => Err(format!("unknown vehicle type '{other}' (expected All, New or Used)")),
        }
    }
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

/// The feed an unmatched VIN was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Only in the manufacturer feed.
    Left,
    /// Only in the dealer feed.
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" | "manufacturer" => Ok(Self::Left),
            "right" | "dealer" => Ok(Self::Right),
            other => Err(format!("unknown side '{other}' (expected left or right)")),
        }
    }
}

/// Where a VIN was found across the two feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Both,
    LeftOnly,
    RightOnly,
}

impl From<Side> for Presence {
    fn from(side: Side) -> Self {
        match side {
            Side::Left => Self::LeftOnly,
            Side::Right => Self::RightOnly,
        }
    }
}

/// Closed label vocabulary. `Display` yields the exact label downstream
/// reporting consumes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Classification {
    Common,
    VehicleWithRecall,
    InTransit,
    CourtesyVehicle,
    OtherInventoryStatus(String),
    ExclusiveToDealer,
    ExclusiveToManufacturer,
    StatusUnknown,
    ApiRequestFailed,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Common => write!(f, "Common"),
            Self::VehicleWithRecall => write!(f, "Vehicle with Recall"),
            Self::InTransit => write!(f, "In Transit - Not expected in HomeNet"),
            Self::CourtesyVehicle => write!(f, "Courtesy Vehicle"),
            Self::OtherInventoryStatus(name) => write!(f, "Other Inventory Status: {name}"),
            Self::ExclusiveToDealer => write!(f, "Exclusive to Dealer.com Website"),
            Self::ExclusiveToManufacturer => write!(f, "Exclusive to HomeNet"),
            Self::StatusUnknown => write!(f, "Status Unknown"),
            Self::ApiRequestFailed => write!(f, "API request failed"),
        }
    }
}

impl Serialize for Classification {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub vin: String,
    pub presence: Presence,
    pub classification: Classification,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueCount {
    #[serde(rename = "Issue")]
    pub issue: String,
    #[serde(rename = "Count")]
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconSummary {
    pub total: usize,
    pub common: usize,
    pub left_only: usize,
    pub right_only: usize,
    /// Ordered by count descending, ties by first appearance.
    pub issues: Vec<IssueCount>,
}

impl ReconSummary {
    pub fn discrepancies(&self) -> usize {
        self.left_only + self.right_only
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub engine_version: String,
    pub run_at: String,
    pub lookup_enabled: bool,
    pub workers: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub outcomes: Vec<Outcome>,
}

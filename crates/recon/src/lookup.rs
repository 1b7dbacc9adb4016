//! The per-VIN lookup capability and its response shape.
//!
//! The engine only sees [`VinLookup`]; concrete HTTP bindings live in the CLI.

use std::fmt;

use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// Non-success HTTP status.
    Status(u16),
    /// Connection, timeout, or other transport failure.
    Transport(String),
    /// Empty or non-JSON response body.
    Body(String),
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => write!(f, "lookup returned HTTP {code}"),
            Self::Transport(msg) => write!(f, "lookup transport error: {msg}"),
            Self::Body(msg) => write!(f, "lookup response unreadable: {msg}"),
        }
    }
}

impl std::error::Error for LookupError {}

/// Inventory status block. `name` is `None` when absent or not a string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryStatus {
    pub name: Option<String>,
}

/// The fields of a lookup response the classifier reads:
/// `mathBox.recallInfo` and `inventoryStatus.name`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupResponse {
    pub recall_info: Option<String>,
    pub inventory_status: Option<InventoryStatus>,
}

impl LookupResponse {
    /// Parse a raw response body. An empty or non-JSON body is an error;
    /// valid JSON without the known fields is not.
    pub fn from_json(body: &str) -> Result<Self, LookupError> {
        let trimmed = body.trim_start_matches('\u{feff}').trim();
        if trimmed.is_empty() {
            return Err(LookupError::Body("empty body".into()));
        }
        let value: Value = serde_json::from_str(trimmed)
            .map_err(|e| LookupError::Body(e.to_string()))?;
        Ok(Self::from_value(&value))
    }

    pub fn from_value(value: &Value) -> Self {
        let recall_info = value
            .get("mathBox")
            .and_then(|m| m.get("recallInfo"))
            .and_then(|r| r.as_str())
            .map(str::to_string);

        let inventory_status = value
            .get("inventoryStatus")
            .filter(|s| s.is_object())
            .map(|s| InventoryStatus {
                name: s.get("name").and_then(|n| n.as_str()).map(str::to_string),
            });

        Self { recall_info, inventory_status }
    }
}

/// One lookup call per VIN. Implementations must be shareable across the
/// reconciler's worker threads.
pub trait VinLookup: Sync {
    fn lookup(&self, vin: &str) -> Result<LookupResponse, LookupError>;
}

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;
use validator::Validate;

/// The two kinds of stock this warehouse tracks. Serialized snake_case so the
/// discriminators match the ledger's `medicine` / `medical_device` values.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ItemCategory {
    Medicine,
    MedicalDevice,
}

/// Identifies one stock record: an item of a category held at one location.
///
/// `branch_id = None` is the main warehouse. A main-warehouse lookup matches
/// only records with no branch association, never a branch record that
/// happens to share the `item_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StockKey {
    pub category: ItemCategory,
    pub branch_id: Option<String>,
    pub item_id: String,
}

impl StockKey {
    pub fn new(
        category: ItemCategory,
        branch_id: Option<String>,
        item_id: impl Into<String>,
    ) -> Self {
        Self {
            category,
            branch_id,
            item_id: item_id.into(),
        }
    }

    /// Key for stock held at the main warehouse.
    pub fn main(category: ItemCategory, item_id: impl Into<String>) -> Self {
        Self::new(category, None, item_id)
    }

    /// Key for stock held at a branch.
    pub fn branch(
        category: ItemCategory,
        branch_id: impl Into<String>,
        item_id: impl Into<String>,
    ) -> Self {
        Self::new(category, Some(branch_id.into()), item_id)
    }
}

impl fmt::Display for StockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.branch_id {
            Some(branch) => write!(f, "{}:{}@{}", self.category, self.item_id, branch),
            None => write!(f, "{}:{}@main", self.category, self.item_id),
        }
    }
}

/// One line of a shipment: a request to move `quantity` units of one item.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ShipmentLine {
    pub category: ItemCategory,
    pub item_id: String,
    #[validate(range(min = 1))]
    pub quantity: i64,
}

/// Request to fulfill one shipment: decrement every line from the source
/// location as a single all-or-nothing unit of work.
///
/// `from_branch_id = None` ships from the main warehouse, the normal case.
/// Lines are processed in the order given; duplicate items are decremented
/// cumulatively, one line at a time.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FulfillShipmentCommand {
    pub shipment_id: Uuid,
    pub from_branch_id: Option<String>,
    pub to_branch_id: String,
    #[validate]
    pub lines: Vec<ShipmentLine>,
}

impl FulfillShipmentCommand {
    pub fn line_key(&self, line: &ShipmentLine) -> StockKey {
        StockKey::new(
            line.category,
            self.from_branch_id.clone(),
            line.item_id.clone(),
        )
    }
}

/// Reported when a line cannot be covered by the stock on hand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineShortage {
    pub category: ItemCategory,
    pub item_id: String,
    pub item_name: Option<String>,
    pub requested_quantity: i64,
    pub available_quantity: i64,
    pub shortage: i64,
}

/// Result of one fulfillment attempt. `Rejected` means no decrement was left
/// applied: every line that had already been taken was compensated back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FulfillmentOutcome {
    Committed {
        shipment_id: Uuid,
        total_quantity: i64,
    },
    Rejected {
        shipment_id: Uuid,
        shortage: LineShortage,
    },
}

/// Advisory availability snapshot for a shipment. The authoritative check is
/// the conditional decrement at fulfillment time; this exists for
/// availability UIs and pre-flight reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FulfillmentValidation {
    pub can_fulfill: bool,
    pub total_lines: usize,
    pub available_lines: usize,
    pub shortages: Vec<LineShortage>,
}

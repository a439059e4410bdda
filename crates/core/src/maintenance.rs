//! Maintenance catalog and due-item calculation.
//!
//! Every serviceable part has a usage threshold measured in completed
//! treatments. An item is due once the machine has completed at least
//! `threshold` treatments since the item was last serviced (or since the
//! machine was first seen, if it never was).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Inlet water filter.
pub const ITEM_FILTER_INLET: &str = "filter_inlet";
/// Pump seal ring.
pub const ITEM_SEAL_RING: &str = "seal_ring";

/// Default service interval for the inlet filter, in completed treatments.
pub const FILTER_INLET_THRESHOLD: u64 = 5;
/// Default service interval for the seal ring, in completed treatments.
pub const SEAL_RING_THRESHOLD: u64 = 10;

/// Description used for items outside the catalog.
const GENERIC_DESCRIPTION: &str = "Routine maintenance required.";

/// A serviceable part.
///
/// Items outside the catalog are kept verbatim in [`MaintenanceItem::Other`]
/// so technicians can record free-form service work.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MaintenanceItem {
    FilterInlet,
    SealRing,
    Other(String),
}

impl MaintenanceItem {
    /// Parse an item identifier. Surrounding whitespace is ignored; blank
    /// identifiers are rejected.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        match raw.trim() {
            "" => Err(CoreError::InvalidArgument(
                "maintenance_item must not be empty".to_string(),
            )),
            ITEM_FILTER_INLET => Ok(Self::FilterInlet),
            ITEM_SEAL_RING => Ok(Self::SealRing),
            other => Ok(Self::Other(other.to_string())),
        }
    }

    /// Return the wire identifier.
    pub fn as_str(&self) -> &str {
        match self {
            Self::FilterInlet => ITEM_FILTER_INLET,
            Self::SealRing => ITEM_SEAL_RING,
            Self::Other(raw) => raw,
        }
    }

    /// Human-readable name; unknown items fall back to their identifier.
    pub fn display_name(&self) -> &str {
        match self {
            Self::FilterInlet => "Filter Inlet",
            Self::SealRing => "Seal Ring",
            Self::Other(raw) => raw,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Self::FilterInlet => {
                "Replace the inlet filter to keep the water supply within quality limits."
            }
            Self::SealRing => "Inspect and replace the seal ring to prevent leaks.",
            Self::Other(_) => GENERIC_DESCRIPTION,
        }
    }
}

impl TryFrom<String> for MaintenanceItem {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<MaintenanceItem> for String {
    fn from(item: MaintenanceItem) -> Self {
        match item {
            MaintenanceItem::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for MaintenanceItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A completed service action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaintenanceRecord {
    pub item: MaintenanceItem,
    /// The machine's completed-treatment count when the service was done.
    pub treatment_count_at_service: u64,
    pub performed_at: Timestamp,
}

/// A maintenance item that is currently due.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaintenanceRequirement {
    pub item: MaintenanceItem,
    pub name: String,
    pub description: String,
    pub threshold: u64,
    pub treatments_since_last: u64,
    pub last_serviced_at_treatment_count: u64,
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

/// Ordered set of `(item, threshold)` pairs the calculator checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaintenanceSchedule {
    entries: Vec<(MaintenanceItem, u64)>,
}

impl MaintenanceSchedule {
    /// Build a schedule, rejecting zero thresholds and duplicate items.
    pub fn new(entries: Vec<(MaintenanceItem, u64)>) -> Result<Self, CoreError> {
        for (i, (item, threshold)) in entries.iter().enumerate() {
            if *threshold == 0 {
                return Err(CoreError::InvalidArgument(format!(
                    "Maintenance threshold for '{item}' must be at least 1"
                )));
            }
            if entries[..i].iter().any(|(seen, _)| seen == item) {
                return Err(CoreError::InvalidArgument(format!(
                    "Duplicate maintenance item: '{item}'"
                )));
            }
        }
        Ok(Self { entries })
    }

    /// Parse a `item=threshold,item=threshold` list, e.g.
    /// `filter_inlet=5,seal_ring=10`.
    pub fn parse(list: &str) -> Result<Self, CoreError> {
        let mut entries = Vec::new();
        for pair in list.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (item, threshold) = pair.split_once('=').ok_or_else(|| {
                CoreError::InvalidArgument(format!(
                    "Invalid maintenance threshold '{pair}', expected item=count"
                ))
            })?;
            let threshold: u64 = threshold.trim().parse().map_err(|_| {
                CoreError::InvalidArgument(format!(
                    "Invalid maintenance threshold count in '{pair}'"
                ))
            })?;
            entries.push((MaintenanceItem::parse(item)?, threshold));
        }
        Self::new(entries)
    }

    pub fn entries(&self) -> &[(MaintenanceItem, u64)] {
        &self.entries
    }

    pub fn threshold_for(&self, item: &MaintenanceItem) -> Option<u64> {
        self.entries
            .iter()
            .find(|(candidate, _)| candidate == item)
            .map(|(_, threshold)| *threshold)
    }
}

impl Default for MaintenanceSchedule {
    fn default() -> Self {
        Self {
            entries: vec![
                (MaintenanceItem::FilterInlet, FILTER_INLET_THRESHOLD),
                (MaintenanceItem::SealRing, SEAL_RING_THRESHOLD),
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Treatment count at which `item` was last serviced (0 if never).
pub fn last_serviced_at(item: &MaintenanceItem, history: &[MaintenanceRecord]) -> u64 {
    history
        .iter()
        .rev()
        .find(|record| &record.item == item)
        .map_or(0, |record| record.treatment_count_at_service)
}

/// List every scheduled item that is due, in schedule order.
pub fn required_maintenance(
    completed_treatments: u64,
    history: &[MaintenanceRecord],
    schedule: &MaintenanceSchedule,
) -> Vec<MaintenanceRequirement> {
    schedule
        .entries()
        .iter()
        .filter_map(|(item, threshold)| {
            let last = last_serviced_at(item, history);
            let since = completed_treatments.saturating_sub(last);
            (since >= *threshold).then(|| MaintenanceRequirement {
                item: item.clone(),
                name: item.display_name().to_string(),
                description: item.description().to_string(),
                threshold: *threshold,
                treatments_since_last: since,
                last_serviced_at_treatment_count: last,
            })
        })
        .collect()
}

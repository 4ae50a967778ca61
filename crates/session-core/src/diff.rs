//! Decides whether a re-enumeration is a real topology change.
//!
//! The OS posts "new device available" far more often than devices actually
//! appear (some Bluetooth headsets do it on every profile switch), so the
//! available-input set is compared against the previous snapshot before any
//! change is broadcast.

use serde::{Deserialize, Serialize};

use crate::catalog::DeviceMap;

/// How two available-input snapshots are compared.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiffStrategy {
    /// Changed when the counts differ or the stable-id key sets differ.
    #[default]
    StableMembership,
    /// Legacy comparison: counts, then a probe of each new record's instance
    /// id against the old stable-id keys. The probe cannot hit, so equal
    /// counts always compare as unchanged.
    InstanceProbe,
}

/// Compare the previous available inputs with the freshly enumerated ones.
pub fn has_changed(old: &DeviceMap, new: &DeviceMap, strategy: DiffStrategy) -> bool {
    if old.len() != new.len() {
        return true;
    }

    match strategy {
        DiffStrategy::StableMembership => new.keys().any(|key| !old.contains_key(key)),
        DiffStrategy::InstanceProbe => new
            .values()
            .any(|record| old.contains_key(&record.instance_id.to_string())),
    }
}

//! Device catalog snapshots and the device query.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::device::{CaptureDevice, DeviceKind, DeviceRecord, PortDescription};

/// Devices keyed by stable id.
pub type DeviceMap = BTreeMap<String, DeviceRecord>;

/// The native stack's active route.
#[derive(Debug, Clone, Default)]
pub struct Route {
    pub inputs: Vec<Arc<PortDescription>>,
    pub outputs: Vec<Arc<PortDescription>>,
}

/// Known devices for one session.
///
/// A catalog is never patched in place: each resync builds a fresh one with
/// [`DeviceCatalog::rebuild`] and the previous snapshot is only kept for
/// diffing.
#[derive(Debug, Clone, Default)]
pub struct DeviceCatalog {
    available_inputs: DeviceMap,
    current_inputs: DeviceMap,
    current_outputs: DeviceMap,
    revision: u64,
}

impl DeviceCatalog {
    /// Build a catalog from the native route and available-input list.
    ///
    /// Current inputs and outputs are always marked current. An available
    /// input is current iff its uid is one of the route's inputs.
    pub fn rebuild(route: &Route, available: &[Arc<PortDescription>], revision: u64) -> Self {
        let current_inputs: DeviceMap = route
            .inputs
            .iter()
            .map(|port| (port.uid.clone(), DeviceRecord::from_port(DeviceKind::Microphone, port, true)))
            .collect();

        let current_outputs: DeviceMap = route
            .outputs
            .iter()
            .map(|port| (port.uid.clone(), DeviceRecord::from_port(DeviceKind::Speaker, port, true)))
            .collect();

        let available_inputs: DeviceMap = available
            .iter()
            .map(|port| {
                let is_current = current_inputs.contains_key(&port.uid);
                (
                    port.uid.clone(),
                    DeviceRecord::from_port(DeviceKind::Microphone, port, is_current),
                )
            })
            .collect();

        Self {
            available_inputs,
            current_inputs,
            current_outputs,
            revision,
        }
    }

    pub fn available_inputs(&self) -> &DeviceMap {
        &self.available_inputs
    }

    pub fn current_inputs(&self) -> &DeviceMap {
        &self.current_inputs
    }

    pub fn current_outputs(&self) -> &DeviceMap {
        &self.current_outputs
    }

    /// Number of real topology changes observed so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn bump_revision(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }

    /// Devices of `kind` (or every device for [`DeviceKind::All`]), sorted
    /// by case-insensitive name with the stable id as tie breaker.
    ///
    /// Cameras come from `capture_devices`; everything else from the
    /// available inputs.
    pub fn query(&self, kind: DeviceKind, capture_devices: &[CaptureDevice]) -> Vec<DeviceRecord> {
        let mut devices: Vec<DeviceRecord> = self
            .available_inputs
            .values()
            .filter(|device| kind.matches(device.kind))
            .cloned()
            .collect();

        if kind.matches(DeviceKind::Camera) {
            devices.extend(capture_devices.iter().map(DeviceRecord::camera));
        }

        devices.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.stable_id.cmp(&b.stable_id))
        });
        devices
    }
}

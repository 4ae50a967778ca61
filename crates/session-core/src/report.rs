use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::catalog::DeviceCatalog;
use crate::device::{CaptureDevice, DeviceRecord};
use crate::traits::Accessory;

/// Diagnostic snapshot of a session.
#[derive(Debug, Clone, Serialize)]
pub struct DumpReport {
    pub variant: &'static str,
    pub captured_at: DateTime<Utc>,
    pub revision: u64,
    pub current_inputs: Vec<DeviceRecord>,
    pub current_outputs: Vec<DeviceRecord>,
    pub available_inputs: Vec<DeviceRecord>,
    pub capture_devices: Vec<CaptureDevice>,
    pub accessories: Vec<Accessory>,
}

impl DumpReport {
    pub fn new(
        variant: &'static str,
        catalog: &DeviceCatalog,
        capture_devices: Vec<CaptureDevice>,
        accessories: Vec<Accessory>,
    ) -> Self {
        Self {
            variant,
            captured_at: Utc::now(),
            revision: catalog.revision(),
            current_inputs: catalog.current_inputs().values().cloned().collect(),
            current_outputs: catalog.current_outputs().values().cloned().collect(),
            available_inputs: catalog.available_inputs().values().cloned().collect(),
            capture_devices,
            accessories,
        }
    }

    /// The report as individual log lines.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            "------------------- SUMMARY -------------------".to_string(),
            format!("CURRENT INPUTS #{}", self.current_inputs.len()),
            format!("CURRENT OUTPUTS #{}", self.current_outputs.len()),
            format!("AVAILABLE INPUTS #{}", self.available_inputs.len()),
            format!("CAPTURE DEVICES #{}", self.capture_devices.len()),
            format!("ACCESSORIES #{}", self.accessories.len()),
        ];

        lines.push("------------------- INPUTS --------------------".to_string());
        for (index, device) in self.current_inputs.iter().enumerate() {
            lines.push(format!("INPUT {}: {}", index, device));
        }

        lines.push("------------------- OUTPUTS -------------------".to_string());
        for (index, device) in self.current_outputs.iter().enumerate() {
            lines.push(format!("OUTPUT {}: {}", index, device));
        }

        lines.push("------------------ AVAILABLE ------------------".to_string());
        for (index, device) in self.available_inputs.iter().enumerate() {
            lines.push(format!("AVAILABLE {}: {}", index, device));
        }

        lines.push("------------------- DEVICES -------------------".to_string());
        for (index, device) in self.capture_devices.iter().enumerate() {
            lines.push(format!("DEVICE {}: {} ({}), id: {}", index, device.name, device.position, device.unique_id));
        }

        lines.push("----------------- ACCESSORIES -----------------".to_string());
        for (index, accessory) in self.accessories.iter().enumerate() {
            lines.push(format!("ACCESSORY {}: {}", index, accessory));
        }

        lines.push("-----------------------------------------------".to_string());
        lines
    }
}

impl fmt::Display for DumpReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} session, revision {}, at {}",
            self.variant,
            self.revision,
            self.captured_at.format("%Y-%m-%d %H:%M:%S%.3f")
        )?;
        for line in self.lines() {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

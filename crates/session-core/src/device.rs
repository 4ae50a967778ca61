use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Classification of an audio endpoint.
///
/// `All` and `None` are query wildcards and never appear on a real record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    None,
    All,
    Microphone,
    Speaker,
    Camera,
}

impl DeviceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::All => "all",
            Self::Microphone => "microphone",
            Self::Speaker => "speaker",
            Self::Camera => "camera",
        }
    }

    /// Whether a record of kind `other` satisfies a query for `self`.
    pub fn matches(&self, other: DeviceKind) -> bool {
        *self == DeviceKind::All || *self == other
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A port as reported by the native audio stack.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PortDescription {
    /// Stack-provided identifier, stable across re-enumeration of the same port.
    pub uid: String,
    pub name: String,
    /// Transport classification (built-in mic, Bluetooth HFP, USB...). Opaque.
    pub port_type: String,
}

impl PortDescription {
    pub fn new(uid: impl Into<String>, name: impl Into<String>, port_type: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            name: name.into(),
            port_type: port_type.into(),
        }
    }
}

/// A video capture device, used to synthesize camera records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaptureDevice {
    pub unique_id: String,
    pub name: String,
    pub position: String,
}

/// One physical endpoint at the moment it was enumerated.
///
/// `stable_id` identifies the physical port and is the diffing key.
/// `instance_id` is regenerated on every construction and must never be
/// compared across snapshots.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceRecord {
    pub kind: DeviceKind,
    pub name: String,
    pub stable_id: String,
    pub instance_id: Uuid,
    pub port_type: String,
    pub is_current_device: bool,
    #[serde(skip)]
    port: Option<Arc<PortDescription>>,
}

impl DeviceRecord {
    pub fn from_port(kind: DeviceKind, port: &Arc<PortDescription>, is_current_device: bool) -> Self {
        Self {
            kind,
            name: port.name.clone(),
            stable_id: port.uid.clone(),
            instance_id: Uuid::new_v4(),
            port_type: port.port_type.clone(),
            is_current_device,
            port: Some(Arc::clone(port)),
        }
    }

    pub fn camera(device: &CaptureDevice) -> Self {
        Self {
            kind: DeviceKind::Camera,
            name: device.name.clone(),
            stable_id: device.unique_id.clone(),
            instance_id: Uuid::new_v4(),
            port_type: device.position.clone(),
            is_current_device: false,
            port: None,
        }
    }

    /// The native port this record was built from. Cameras have none.
    pub fn port(&self) -> Option<&Arc<PortDescription>> {
        self.port.as_ref()
    }
}

impl fmt::Display for DeviceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} ({}), uid: {}, uuid: {}, current: {}",
            self.kind.as_str().to_uppercase(),
            self.name,
            self.port_type,
            self.stable_id,
            self.instance_id,
            if self.is_current_device { "YES" } else { "NO" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_id_differs_per_construction() {
        let port = Arc::new(PortDescription::new("mic-1", "Built-In Microphone", "MicrophoneBuiltIn"));
        let first = DeviceRecord::from_port(DeviceKind::Microphone, &port, true);
        let second = DeviceRecord::from_port(DeviceKind::Microphone, &port, true);

        assert_eq!(first.stable_id, second.stable_id);
        assert_ne!(first.instance_id, second.instance_id);
    }

    #[test]
    fn test_wildcard_matching() {
        assert!(DeviceKind::All.matches(DeviceKind::Camera));
        assert!(DeviceKind::Microphone.matches(DeviceKind::Microphone));
        assert!(!DeviceKind::Microphone.matches(DeviceKind::Speaker));
        assert!(!DeviceKind::None.matches(DeviceKind::Microphone));
    }

    #[test]
    fn test_display_format() {
        let port = Arc::new(PortDescription::new("bt-7", "AirPods Pro", "BluetoothHFP"));
        let record = DeviceRecord::from_port(DeviceKind::Microphone, &port, false);
        let text = record.to_string();

        assert!(text.starts_with("MICROPHONE: AirPods Pro (BluetoothHFP), uid: bt-7, uuid: "));
        assert!(text.ends_with("current: NO"));
    }

    #[test]
    fn test_kind_serializes_lowercase() {
        let json = serde_json::to_string(&DeviceKind::Speaker).unwrap();
        assert_eq!(json, "\"speaker\"");
    }
}

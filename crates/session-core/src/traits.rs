use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::Route;
use crate::config::{Category, CategoryOption, Mode, PortOverride};
use crate::device::{CaptureDevice, PortDescription};
use crate::error::NativeError;
use crate::events::ObjectId;

/// The native audio-session object a backend drives.
///
/// Calls are assumed synchronous and fast. Implementations use interior
/// mutability: a native session is often a process-wide singleton.
pub trait NativeSession: Send + Sync {
    /// Sender identity used to filter this session's notifications.
    fn object_id(&self) -> ObjectId;

    fn current_route(&self) -> Route;

    fn available_inputs(&self) -> Vec<Arc<PortDescription>>;

    fn set_category(&self, category: Category, options: &[CategoryOption]) -> Result<(), NativeError>;

    fn set_mode(&self, mode: Mode) -> Result<(), NativeError>;

    fn set_active(&self, active: bool) -> Result<(), NativeError>;

    fn override_output_port(&self, port: PortOverride) -> Result<(), NativeError>;

    /// Prefer `port` for input, or clear the preference with `None`.
    fn set_preferred_input(&self, port: Option<&PortDescription>) -> Result<(), NativeError>;

    /// Video capture devices, used for camera queries.
    fn capture_devices(&self) -> Vec<CaptureDevice> {
        Vec::new()
    }
}

/// An external accessory known to the accessory manager.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Accessory {
    pub connection_id: u64,
    pub name: String,
    pub manufacturer: String,
    pub model_number: String,
}

impl fmt::Display for Accessory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} by {} ({}), connection: {}",
            self.name, self.manufacturer, self.model_number, self.connection_id
        )
    }
}

/// The OS accessory manager. Registration is reference-counted by the OS,
/// so repeated calls must be harmless.
pub trait AccessoryManager: Send + Sync {
    fn register_for_local_notifications(&self);

    fn unregister_for_local_notifications(&self);

    fn connected_accessories(&self) -> Vec<Accessory>;
}

/// Accessory manager for hosts without external accessories.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAccessories;

impl AccessoryManager for NoAccessories {
    fn register_for_local_notifications(&self) {}

    fn unregister_for_local_notifications(&self) {}

    fn connected_accessories(&self) -> Vec<Accessory> {
        Vec::new()
    }
}

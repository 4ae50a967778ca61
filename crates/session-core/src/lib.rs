//! Core types and the shared session contract for routewatch.
//!
//! A backend variant wraps one native audio stack, keeps a [`DeviceCatalog`]
//! of its endpoints and broadcasts on [`SessionNotifiers`] only when the
//! available inputs really change.

mod catalog;
mod config;
mod device;
mod diff;
mod error;
mod events;
mod logging;
pub mod mock;
mod notifier;
mod observer;
mod report;
mod session;
mod traits;

pub use catalog::{DeviceCatalog, DeviceMap, Route};
pub use config::{Category, CategoryOption, Mode, PortOverride, SessionConfig, SessionTuning};
pub use device::{CaptureDevice, DeviceKind, DeviceRecord, PortDescription};
pub use diff::{has_changed, DiffStrategy};
pub use error::{NativeError, SessionError};
pub use events::{
    EventAction, InterruptionType, Notification, NotificationCenter, NotificationName, ObjectId, Observation,
    RouteChangeReason, SessionEvent, StackCallback, ACCESSORY_CONNECTION_KEY, INTERRUPTION_TYPE_KEY,
    ROUTE_CHANGE_REASON_KEY,
};
pub use logging::{
    LogCategory, LogLevel, LoggingConfig, SessionLogger, CONSOLE_TARGET, SDK_TARGET, SYSTEM_TARGET, WEBRTC_TARGET,
};
pub use notifier::{ChangeNotifier, ChangeSignal, ChangeSubscription, SessionNotifiers};
pub use observer::{Inbound, SessionObserver};
pub use report::DumpReport;
pub use session::{apply_config, run_until, HardwareSession};
pub use traits::{Accessory, AccessoryManager, NativeSession, NoAccessories};

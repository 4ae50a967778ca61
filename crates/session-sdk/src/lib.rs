//! Session backend bound to a vendor SDK's audio-session wrapper.
//!
//! Unlike the other variants the backend owns its wrapper outright; the
//! wrapper is torn down with the backend.

mod hardware;
pub mod mock;

pub use hardware::{SdkAudioSession, SdkHardware};

pub use routewatch_session_core::{DeviceKind, DeviceRecord, HardwareSession, SessionConfig};

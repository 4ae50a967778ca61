//! Session backend bound to a WebRTC stack's audio session.
//!
//! The stack owns a single process-wide session. [`SharedRtcSession`] hands
//! out one claim at a time and [`RtcHardware`] holds it for its lifetime.

mod hardware;
pub mod mock;
mod session;

pub use hardware::RtcHardware;
pub use session::{DelegateId, RtcAudioSession, RtcAudioSessionDelegate, RtcSessionClaim, SharedRtcSession};

pub use routewatch_session_core::{DeviceKind, DeviceRecord, HardwareSession, SessionConfig, StackCallback};

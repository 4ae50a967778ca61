//! Plain OS audio-session backend for routewatch.
//!
//! [`SystemHardware`] drives the host's own audio session. On desktops,
//! [`CpalSession`] stands in for that session using cpal enumeration and
//! [`RoutePoller`] supplies the route-change notifications the host lacks.

mod device;
mod hardware;
mod poller;

pub use device::{list_input_names, CpalSession};
pub use hardware::SystemHardware;
pub use poller::{classify, RoutePoller, RouteSnapshot, DEFAULT_POLL_INTERVAL};
pub use routewatch_session_core::{DeviceKind, DeviceRecord, HardwareSession, SessionConfig};

//! Scripted device activity against in-memory sessions.
//!
//! Lets any backend variant be watched on a machine without its native
//! stack. The script mixes real topology changes with the spurious
//! notifications some Bluetooth headsets produce.

use std::sync::Arc;

use routewatch_session_core::mock::{port, MockAccessoryManager, MockNativeSession};
use routewatch_session_core::{
    HardwareSession, InterruptionType, NativeSession, Notification, NotificationCenter, ObjectId, PortDescription,
    RouteChangeReason, SessionConfig, StackCallback,
};
use routewatch_session_sdk::mock::MockSdkSession;
use routewatch_session_sdk::SdkHardware;
use routewatch_session_system::SystemHardware;
use routewatch_session_webrtc::mock::MockRtcSession;
use routewatch_session_webrtc::{RtcHardware, SharedRtcSession};

use crate::config::BackendKind;

/// One scripted event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// "New device available" with nothing new
    Spurious,
    HeadsetArrives,
    CategoryChange,
    HeadsetLeaves,
    InterruptionEnded,
}

pub const SCRIPT: [Step; 8] = [
    Step::Spurious,
    Step::Spurious,
    Step::HeadsetArrives,
    Step::Spurious,
    Step::CategoryChange,
    Step::HeadsetLeaves,
    Step::InterruptionEnded,
    Step::Spurious,
];

fn builtin_mic() -> Arc<PortDescription> {
    port("sim-builtin", "Built-In Microphone", "MicrophoneBuiltIn")
}

fn headset() -> Arc<PortDescription> {
    port("sim-headset", "Bluetooth Headset", "BluetoothHFP")
}

fn seed(native: &MockNativeSession) {
    native.set_route(vec![builtin_mic()], vec![port("sim-speaker", "Speaker", "Speaker")]);
    native.set_available(vec![builtin_mic()]);
}

/// A backend of any variant wired to mock sessions
pub enum Simulation {
    System {
        native: Arc<MockNativeSession>,
        hardware: SystemHardware<MockNativeSession>,
    },
    Webrtc {
        shared: SharedRtcSession<MockRtcSession>,
        hardware: RtcHardware<MockRtcSession>,
    },
    Sdk {
        hardware: SdkHardware<MockSdkSession>,
    },
}

impl Simulation {
    pub fn new(backend: BackendKind, config: SessionConfig, center: &NotificationCenter) -> anyhow::Result<Self> {
        let accessories = Arc::new(MockAccessoryManager::new());

        let simulation = match backend {
            BackendKind::System => {
                let native = Arc::new(MockNativeSession::new());
                seed(&native);
                let hardware = SystemHardware::new(Arc::clone(&native), center.clone(), accessories, config);
                Self::System { native, hardware }
            }
            BackendKind::Webrtc => {
                let session = MockRtcSession::new();
                seed(session.native());
                let shared = SharedRtcSession::new(session);
                let hardware = RtcHardware::new(&shared, center.clone(), accessories, config)?;
                Self::Webrtc { shared, hardware }
            }
            BackendKind::Sdk => {
                let session = MockSdkSession::new("SimulatedSdkSession");
                seed(session.native());
                let hardware = SdkHardware::new(session, center.clone(), accessories, config);
                Self::Sdk { hardware }
            }
        };
        Ok(simulation)
    }

    pub fn hardware(&self) -> &dyn HardwareSession {
        match self {
            Self::System { hardware, .. } => hardware,
            Self::Webrtc { hardware, .. } => hardware,
            Self::Sdk { hardware } => hardware,
        }
    }

    pub fn hardware_mut(&mut self) -> &mut dyn HardwareSession {
        match self {
            Self::System { hardware, .. } => hardware,
            Self::Webrtc { hardware, .. } => hardware,
            Self::Sdk { hardware } => hardware,
        }
    }

    fn native(&self) -> &MockNativeSession {
        match self {
            Self::System { native, .. } => native,
            Self::Webrtc { shared, .. } => shared.session().native(),
            Self::Sdk { hardware } => hardware.sdk_session().native(),
        }
    }

    fn session_id(&self) -> ObjectId {
        self.native().object_id()
    }

    /// Route changes reach the WebRTC variant through its stack delegate,
    /// the others through the notification center.
    fn route_changed(&self, center: &NotificationCenter, reason: RouteChangeReason) {
        match self {
            Self::Webrtc { shared, .. } => shared.session().emit(StackCallback::RouteChanged { reason }),
            _ => center.post(Notification::route_change(self.session_id(), reason)),
        }
    }

    /// Mutate the mock session for `step` and post its notification.
    pub fn apply(&self, center: &NotificationCenter, step: Step) {
        match step {
            Step::Spurious => self.route_changed(center, RouteChangeReason::NewDeviceAvailable),
            Step::HeadsetArrives => {
                self.native().set_available(vec![builtin_mic(), headset()]);
                self.route_changed(center, RouteChangeReason::NewDeviceAvailable);
            }
            Step::CategoryChange => self.route_changed(center, RouteChangeReason::CategoryChange),
            Step::HeadsetLeaves => {
                self.native().set_available(vec![builtin_mic()]);
                self.route_changed(center, RouteChangeReason::OldDeviceUnavailable);
            }
            Step::InterruptionEnded => {
                center.post(Notification::interruption(self.session_id(), InterruptionType::Ended));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use routewatch_session_core::DeviceKind;

    use super::*;

    fn run_script(backend: BackendKind) -> (usize, usize) {
        let center = NotificationCenter::new();
        let mut simulation = Simulation::new(backend, backend.preset(), &center).unwrap();
        let mut mics = simulation.hardware().microphones_changed();

        let mut handled = 0;
        for step in SCRIPT {
            simulation.apply(&center, step);
            handled += simulation.hardware_mut().process_pending_events();
        }
        (handled, mics.drain())
    }

    #[test]
    fn test_script_broadcasts_only_real_changes() {
        for backend in [BackendKind::System, BackendKind::Webrtc, BackendKind::Sdk] {
            let (handled, broadcasts) = run_script(backend);
            assert_eq!(handled, SCRIPT.len(), "{}", backend);
            assert_eq!(broadcasts, 2, "{}", backend);
        }
    }

    #[test]
    fn test_headset_visible_after_arrival() {
        let center = NotificationCenter::new();
        let mut simulation = Simulation::new(BackendKind::Sdk, SessionConfig::sdk(), &center).unwrap();

        simulation.apply(&center, Step::HeadsetArrives);
        simulation.hardware_mut().process_pending_events();

        let names: Vec<String> = simulation
            .hardware()
            .available(DeviceKind::Microphone)
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["Bluetooth Headset", "Built-In Microphone"]);
    }
}

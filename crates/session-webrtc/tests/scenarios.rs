//! The WebRTC backend driven by both OS notifications and stack callbacks.

use std::sync::Arc;

use routewatch_session_core::mock::{port, MockAccessoryManager};
use routewatch_session_core::{NativeSession, Notification, NotificationCenter, RouteChangeReason};
use routewatch_session_webrtc::mock::MockRtcSession;
use routewatch_session_webrtc::{DeviceKind, HardwareSession, RtcHardware, SessionConfig, SharedRtcSession, StackCallback};

struct Fixture {
    shared: SharedRtcSession<MockRtcSession>,
    center: NotificationCenter,
    hardware: RtcHardware<MockRtcSession>,
}

fn fixture() -> Fixture {
    let session = MockRtcSession::new();
    let builtin = port("mic-1", "Built-In Microphone", "MicrophoneBuiltIn");
    session
        .native()
        .set_route(vec![builtin.clone()], vec![port("rcv-1", "Receiver", "Receiver")]);
    session.native().set_available(vec![builtin]);

    let shared = SharedRtcSession::new(session);
    let center = NotificationCenter::new();
    let hardware = RtcHardware::new(
        &shared,
        center.clone(),
        Arc::new(MockAccessoryManager::new()),
        SessionConfig::webrtc(),
    )
    .unwrap();

    Fixture {
        shared,
        center,
        hardware,
    }
}

impl Fixture {
    fn session(&self) -> &MockRtcSession {
        self.shared.session()
    }

    fn plug_headset(&self) {
        self.session().native().set_available(vec![
            port("mic-1", "Built-In Microphone", "MicrophoneBuiltIn"),
            port("hs-1", "Headset Microphone", "HeadsetMic"),
        ]);
    }
}

#[test]
fn stack_route_change_resyncs_and_notifies() {
    let mut f = fixture();
    let mut mics = f.hardware.microphones_changed();
    let mut speakers = f.hardware.speakers_changed();
    let revision = f.hardware.catalog().revision();

    f.plug_headset();
    f.session().emit(StackCallback::RouteChanged {
        reason: RouteChangeReason::NewDeviceAvailable,
    });
    assert_eq!(f.hardware.process_pending_events(), 1);

    assert_eq!(mics.try_next().map(|s| s.revision), Some(revision + 1));
    assert_eq!(speakers.drain(), 1);
    assert_eq!(f.hardware.available(DeviceKind::Microphone).len(), 2);
}

#[test]
fn stack_route_change_without_real_change_is_silent() {
    let mut f = fixture();
    let mut mics = f.hardware.microphones_changed();

    for _ in 0..3 {
        f.session().emit(StackCallback::RouteChanged {
            reason: RouteChangeReason::CategoryChange,
        });
    }
    f.hardware.process_pending_events();

    assert_eq!(mics.drain(), 0);
}

#[test]
fn other_stack_callbacks_only_log() {
    let mut f = fixture();
    let reads = f.session().native().route_reads();

    for callback in [
        StackCallback::BeginInterruption,
        StackCallback::EndInterruption { should_resume: true },
        StackCallback::MediaServerReset,
        StackCallback::DidSetActive(true),
        StackCallback::OutputVolumeChanged(0.5),
        StackCallback::PlayoutGlitch { total: 3 },
        StackCallback::FailedToSetActive {
            active: true,
            error: "busy".to_string(),
        },
    ] {
        f.session().emit(callback);
    }

    assert_eq!(f.hardware.process_pending_events(), 7);
    assert_eq!(f.session().native().route_reads(), reads);
}

#[test]
fn os_notifications_are_observed_on_the_shared_session() {
    let mut f = fixture();
    let mut mics = f.hardware.microphones_changed();

    f.plug_headset();
    f.center.post(Notification::route_change(
        f.session().object_id(),
        RouteChangeReason::NewDeviceAvailable,
    ));
    f.hardware.process_pending_events();

    assert_eq!(mics.drain(), 1);
}

#[test]
fn stop_observing_silences_both_sources() {
    let mut f = fixture();
    f.hardware.stop_observing();

    f.plug_headset();
    f.session().emit(StackCallback::RouteChanged {
        reason: RouteChangeReason::NewDeviceAvailable,
    });
    f.center.post(Notification::route_change(
        f.session().object_id(),
        RouteChangeReason::NewDeviceAvailable,
    ));

    assert_eq!(f.hardware.process_pending_events(), 0);
    assert_eq!(f.hardware.available(DeviceKind::Microphone).len(), 1);
}

#[test]
fn select_input_goes_through_the_shared_session() {
    let mut f = fixture();
    f.plug_headset();
    f.hardware.resync(false);

    let headset = f
        .hardware
        .available(DeviceKind::Microphone)
        .into_iter()
        .find(|d| d.stable_id == "hs-1")
        .unwrap();
    f.hardware.select_input(&headset).unwrap();

    assert_eq!(f.session().native().preferred_input().as_deref(), Some("hs-1"));
}

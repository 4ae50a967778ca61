//! End-to-end behavior of the plain OS backend against an in-memory session.

use std::sync::Arc;
use std::time::Duration;

use routewatch_session_core::mock::{port, MockAccessoryManager, MockNativeSession};
use routewatch_session_core::{
    run_until, Accessory, DiffStrategy, InterruptionType, NativeSession, Notification, NotificationCenter,
    NotificationName, RouteChangeReason, SessionConfig, SessionError,
};
use routewatch_session_system::{DeviceKind, HardwareSession, SystemHardware};

struct Fixture {
    native: Arc<MockNativeSession>,
    accessories: Arc<MockAccessoryManager>,
    center: NotificationCenter,
    hardware: SystemHardware<MockNativeSession>,
}

fn fixture_with(config: SessionConfig) -> Fixture {
    let native = Arc::new(MockNativeSession::new());
    let a = port("mic-1", "Built-In Microphone", "MicrophoneBuiltIn");
    let b = port("mic-2", "USB Interface", "USBAudio");
    native.set_route(vec![a.clone()], vec![port("spk-1", "Speaker", "Speaker")]);
    native.set_available(vec![a, b]);

    let accessories = Arc::new(MockAccessoryManager::new());
    let center = NotificationCenter::new();
    let hardware = SystemHardware::new(Arc::clone(&native), center.clone(), accessories.clone(), config);

    Fixture {
        native,
        accessories,
        center,
        hardware,
    }
}

fn fixture() -> Fixture {
    fixture_with(SessionConfig::system())
}

impl Fixture {
    fn post_route_change(&self, reason: RouteChangeReason) {
        self.center.post(Notification::route_change(self.native.object_id(), reason));
    }

    fn add_input(&self, uid: &str, name: &str) {
        let mut available = vec![
            port("mic-1", "Built-In Microphone", "MicrophoneBuiltIn"),
            port("mic-2", "USB Interface", "USBAudio"),
        ];
        available.push(port(uid, name, "BluetoothHFP"));
        self.native.set_available(available);
    }
}

#[test]
fn resync_builds_catalog_from_route_and_available_inputs() {
    let f = fixture();
    let catalog = f.hardware.catalog();

    assert_eq!(catalog.current_inputs().len(), 1);
    assert!(catalog.current_inputs().contains_key("mic-1"));
    assert!(catalog.available_inputs()["mic-1"].is_current_device);
    assert!(!catalog.available_inputs()["mic-2"].is_current_device);

    let names: Vec<String> = f
        .hardware
        .available(DeviceKind::Microphone)
        .into_iter()
        .map(|d| d.name)
        .collect();
    assert_eq!(names, vec!["Built-In Microphone", "USB Interface"]);
}

#[test]
fn current_flag_tracks_route_membership() {
    let mut f = fixture();
    f.native.set_route(
        vec![port("mic-2", "USB Interface", "USBAudio")],
        vec![port("spk-1", "Speaker", "Speaker")],
    );

    f.hardware.resync(true);

    let catalog = f.hardware.catalog();
    for (uid, record) in catalog.available_inputs() {
        assert_eq!(record.is_current_device, catalog.current_inputs().contains_key(uid));
    }
    assert!(catalog.current_outputs().values().all(|d| d.is_current_device));
}

#[test]
fn old_device_unavailable_resyncs_once_and_notifies() {
    let mut f = fixture();
    let mut mics = f.hardware.microphones_changed();
    let mut speakers = f.hardware.speakers_changed();
    let reads = f.native.route_reads();
    let revision = f.hardware.catalog().revision();

    f.native.set_available(vec![port("mic-1", "Built-In Microphone", "MicrophoneBuiltIn")]);
    f.post_route_change(RouteChangeReason::OldDeviceUnavailable);
    assert_eq!(f.hardware.process_pending_events(), 1);

    assert_eq!(f.native.route_reads(), reads + 1);
    assert_eq!(mics.drain(), 1);
    assert_eq!(speakers.drain(), 1);
    assert_eq!(f.hardware.catalog().revision(), revision + 1);
}

#[test]
fn category_change_resyncs_once_without_notifying() {
    let mut f = fixture();
    let mut mics = f.hardware.microphones_changed();
    let reads = f.native.route_reads();

    f.add_input("bt-1", "AirPods Pro");
    f.post_route_change(RouteChangeReason::CategoryChange);
    f.hardware.process_pending_events();

    assert_eq!(f.native.route_reads(), reads + 1);
    assert_eq!(f.hardware.catalog().available_inputs().len(), 3);
    assert_eq!(mics.drain(), 0);
}

#[test]
fn spurious_new_device_available_is_suppressed() {
    let mut f = fixture();
    let mut mics = f.hardware.microphones_changed();
    let revision = f.hardware.catalog().revision();

    for _ in 0..5 {
        f.post_route_change(RouteChangeReason::NewDeviceAvailable);
    }
    assert_eq!(f.hardware.process_pending_events(), 5);

    assert_eq!(mics.drain(), 0);
    assert_eq!(f.hardware.catalog().revision(), revision);
}

#[test]
fn real_arrival_notifies_once() {
    let mut f = fixture();
    let mut mics = f.hardware.microphones_changed();
    let revision = f.hardware.catalog().revision();

    f.add_input("bt-1", "AirPods Pro");
    f.post_route_change(RouteChangeReason::NewDeviceAvailable);
    f.post_route_change(RouteChangeReason::NewDeviceAvailable);
    f.hardware.process_pending_events();

    let signal = mics.try_next().expect("one change signal");
    assert_eq!(signal.revision, revision + 1);
    assert!(mics.try_next().is_none());
}

#[test]
fn consecutive_resyncs_broadcast_at_most_once() {
    let mut f = fixture();
    let mut mics = f.hardware.microphones_changed();

    f.add_input("usb-9", "Podcast Mic");
    f.hardware.resync(true);
    f.hardware.resync(true);
    assert_eq!(mics.drain(), 1);

    f.hardware.resync(true);
    f.hardware.resync(true);
    assert_eq!(mics.drain(), 0);
}

#[test]
fn resync_without_notification_never_broadcasts() {
    let mut f = fixture();
    let mut mics = f.hardware.microphones_changed();

    f.native.set_available(Vec::new());
    assert!(f.hardware.resync(false));

    assert_eq!(mics.drain(), 0);
    assert!(f.hardware.available(DeviceKind::All).is_empty());
}

#[test]
fn interruption_end_resyncs_but_begin_does_not() {
    let mut f = fixture();
    let id = f.native.object_id();
    let reads = f.native.route_reads();

    f.center.post(Notification::interruption(id, InterruptionType::Began));
    f.hardware.process_pending_events();
    assert_eq!(f.native.route_reads(), reads);

    f.center.post(Notification::interruption(id, InterruptionType::Ended));
    f.hardware.process_pending_events();
    assert_eq!(f.native.route_reads(), reads + 1);
}

#[test]
fn media_services_lost_logs_and_reset_resyncs() {
    let mut f = fixture();
    let id = f.native.object_id();
    let reads = f.native.route_reads();

    f.center.post(Notification::new(NotificationName::MediaServicesWereLost, Some(id)));
    f.center
        .post(Notification::new(NotificationName::SilenceSecondaryAudioHint, Some(id)));
    f.hardware.process_pending_events();
    assert_eq!(f.native.route_reads(), reads);

    f.center
        .post(Notification::new(NotificationName::MediaServicesWereReset, Some(id)));
    f.hardware.process_pending_events();
    assert_eq!(f.native.route_reads(), reads + 1);
}

#[test]
fn accessory_connect_resyncs_and_is_dumped() {
    let mut f = fixture();
    let mut mics = f.hardware.microphones_changed();
    f.accessories.connect(Accessory {
        connection_id: 77,
        name: "Field Recorder".to_string(),
        manufacturer: "Acme".to_string(),
        model_number: "FR-2".to_string(),
    });
    f.add_input("acc-77", "Field Recorder");

    f.center
        .post(Notification::accessory(NotificationName::AccessoryDidConnect, 77));
    f.hardware.process_pending_events();

    assert_eq!(mics.drain(), 1);
    assert_eq!(f.hardware.dump().accessories.len(), 1);
}

#[test]
fn malformed_notification_is_dropped() {
    let mut f = fixture();
    let reads = f.native.route_reads();

    f.center.post(Notification::new(
        NotificationName::RouteChange,
        Some(f.native.object_id()),
    ));
    assert_eq!(f.hardware.process_pending_events(), 1);

    assert_eq!(f.native.route_reads(), reads);
}

#[test]
fn interruption_without_type_is_dropped() {
    let mut f = fixture();
    let mut mics = f.hardware.microphones_changed();
    let reads = f.native.route_reads();
    let revision = f.hardware.catalog().revision();

    f.native.set_available(Vec::new());
    f.center.post(Notification::new(
        NotificationName::Interruption,
        Some(f.native.object_id()),
    ));
    assert_eq!(f.hardware.process_pending_events(), 1);

    assert_eq!(f.native.route_reads(), reads);
    assert_eq!(f.hardware.catalog().revision(), revision);
    assert_eq!(mics.drain(), 0);
}

#[test]
fn other_sessions_notifications_are_ignored() {
    let mut f = fixture();
    let stranger = MockNativeSession::new();

    f.center.post(Notification::route_change(
        stranger.object_id(),
        RouteChangeReason::NewDeviceAvailable,
    ));

    assert_eq!(f.hardware.process_pending_events(), 0);
}

#[test]
fn stop_observing_tears_down_subscriptions() {
    let mut f = fixture();
    let before: Vec<String> = f.hardware.catalog().available_inputs().keys().cloned().collect();
    let reads = f.native.route_reads();

    f.hardware.stop_observing();
    f.add_input("bt-1", "AirPods Pro");
    f.post_route_change(RouteChangeReason::NewDeviceAvailable);

    assert_eq!(f.hardware.process_pending_events(), 0);
    assert_eq!(f.native.route_reads(), reads);
    let after: Vec<String> = f.hardware.catalog().available_inputs().keys().cloned().collect();
    assert_eq!(before, after);
    assert_eq!(f.center.observer_count(), 0);
    assert_eq!(f.accessories.unregistrations(), 1);
}

#[test]
fn backend_without_observation_never_subscribes() {
    let config = SessionConfig {
        observe_notifications: false,
        register_accessories: false,
        ..SessionConfig::system()
    };
    let mut f = fixture_with(config);

    f.post_route_change(RouteChangeReason::NewDeviceAvailable);

    assert_eq!(f.hardware.process_pending_events(), 0);
    assert_eq!(f.accessories.registrations(), 0);
    // Teardown is symmetric even when nothing was set up
    f.hardware.stop_observing();
    assert_eq!(f.accessories.unregistrations(), 1);
}

#[test]
fn select_input_failure_keeps_previous_preference() {
    let mut f = fixture();
    let devices = f.hardware.available(DeviceKind::Microphone);

    f.hardware.select_input(&devices[1]).unwrap();
    assert_eq!(f.native.preferred_input().as_deref(), Some("mic-2"));

    f.native.fail_preferred_input(true);
    let err = f.hardware.select_input(&devices[0]).unwrap_err();

    assert!(matches!(err, SessionError::InputSelection { .. }));
    assert_eq!(f.native.preferred_input().as_deref(), Some("mic-2"));
}

#[test]
fn swapped_device_with_same_count() {
    let mut fixed = fixture();
    let mut legacy = fixture_with(SessionConfig {
        diff_strategy: DiffStrategy::InstanceProbe,
        ..SessionConfig::system()
    });

    for f in [&mut fixed, &mut legacy] {
        f.native.set_available(vec![
            port("mic-1", "Built-In Microphone", "MicrophoneBuiltIn"),
            port("mic-3", "Lavalier", "USBAudio"),
        ]);
    }

    assert!(fixed.hardware.resync(true));
    assert!(!legacy.hardware.resync(true));
}

#[tokio::test]
async fn run_until_processes_events_until_shutdown() {
    let mut f = fixture();
    let mut mics = f.hardware.microphones_changed();

    f.add_input("bt-1", "AirPods Pro");
    f.post_route_change(RouteChangeReason::NewDeviceAvailable);

    run_until(&mut f.hardware, tokio::time::sleep(Duration::from_millis(50))).await;

    assert_eq!(mics.drain(), 1);
    assert_eq!(f.hardware.available(DeviceKind::Microphone).len(), 3);
}

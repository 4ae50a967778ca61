//! The contract every backend variant implements.
//!
//! Variants supply the accessors and their own `configure`; device queries,
//! resync, diagnostic dumps and event dispatch are shared here.

use std::future::Future;

use crate::catalog::DeviceCatalog;
use crate::config::{PortOverride, SessionConfig};
use crate::device::{DeviceKind, DeviceRecord};
use crate::diff;
use crate::error::SessionError;
use crate::events::{EventAction, SessionEvent};
use crate::logging::SessionLogger;
use crate::notifier::{ChangeSubscription, SessionNotifiers};
use crate::observer::{Inbound, SessionObserver};
use crate::report::DumpReport;
use crate::traits::{AccessoryManager, NativeSession};

/// A device-tracking session bound to one native audio stack.
///
/// All calls, including event processing, must happen on one execution
/// context; the session does no locking of its own.
pub trait HardwareSession {
    /// Short variant label used in logs and dumps.
    fn variant(&self) -> &'static str;

    fn logger(&self) -> &SessionLogger;

    fn config(&self) -> &SessionConfig;

    fn native(&self) -> &dyn NativeSession;

    fn accessory_manager(&self) -> &dyn AccessoryManager;

    fn catalog(&self) -> &DeviceCatalog;

    fn catalog_mut(&mut self) -> &mut DeviceCatalog;

    fn notifiers(&self) -> &SessionNotifiers;

    fn observer_mut(&mut self) -> &mut SessionObserver;

    /// Apply category, options and mode to the native session.
    ///
    /// Failures are logged and returned; the session stays usable.
    fn configure(&mut self) -> Result<(), SessionError>;

    /// Run the fixed construction sequence: configure, observe and register
    /// accessories as configured, resync, dump.
    fn start(&mut self) {
        // Already logged, and not fatal
        let _ = self.configure();

        if self.config().observe_notifications {
            self.observe();
        }
        if self.config().register_accessories {
            self.register_accessories();
        }
        self.resync(true);
        self.dump();
    }

    /// Subscribe to the native session's notifications and to accessory
    /// connect/disconnect.
    fn observe(&mut self) {
        self.logger().log(format_args!("{}.observe()", self.variant()));
        let object = self.native().object_id();
        self.observer_mut().observe(object);
    }

    fn register_accessories(&mut self) {
        self.logger().log(format_args!("{}.register_accessories()", self.variant()));
        self.accessory_manager().register_for_local_notifications();
    }

    /// Tear down every subscription. Safe to call at any time.
    fn stop_observing(&mut self) {
        self.logger().log(format_args!("{}.stop_observing()", self.variant()));
        self.observer_mut().stop();
        self.accessory_manager().unregister_for_local_notifications();
    }

    /// Ask the native session to prefer `device` for input.
    ///
    /// On failure the previous preference stays in place.
    fn select_input(&mut self, device: &DeviceRecord) -> Result<(), SessionError> {
        self.logger().log(format_args!("{}.select_input() -> {}", self.variant(), device));

        let port = device
            .port()
            .ok_or_else(|| SessionError::NoNativePort(device.name.clone()))
            .inspect_err(|e| self.logger().error(format_args!("{}.select_input() ERROR {}", self.variant(), e)))?;

        self.native()
            .set_preferred_input(Some(port.as_ref()))
            .map_err(|source| SessionError::InputSelection {
                device: device.name.clone(),
                source,
            })
            .inspect_err(|e| self.logger().error(format_args!("{}.select_input() ERROR {}", self.variant(), e)))
    }

    /// Rebuild the catalog from the native session and broadcast on both
    /// change points if the available inputs really changed and
    /// `send_change_notification` is set. Returns whether a change was seen.
    fn resync(&mut self, send_change_notification: bool) -> bool {
        self.logger().debug(format_args!(
            "{}.resync(send_change_notification: {})",
            self.variant(),
            send_change_notification
        ));

        let route = self.native().current_route();
        let available = self.native().available_inputs();
        let strategy = self.config().diff_strategy;
        let revision = self.catalog().revision();

        let previous = std::mem::replace(
            self.catalog_mut(),
            DeviceCatalog::rebuild(&route, &available, revision),
        );
        let changed = diff::has_changed(previous.available_inputs(), self.catalog().available_inputs(), strategy);
        let revision = if changed {
            self.catalog_mut().bump_revision()
        } else {
            revision
        };

        self.dump();

        if send_change_notification && changed {
            self.logger().log(format_args!("{}.resync() broadcasting revision {}", self.variant(), revision));
            self.notifiers().broadcast(revision);
        }
        changed
    }

    /// Available devices of `kind`, sorted by name.
    fn available(&self, kind: DeviceKind) -> Vec<DeviceRecord> {
        self.logger().debug(format_args!("{}.available() -> {}", self.variant(), kind));

        let capture_devices = if kind.matches(DeviceKind::Camera) {
            self.native().capture_devices()
        } else {
            Vec::new()
        };
        self.catalog().query(kind, &capture_devices)
    }

    /// Snapshot the session and write it to the log.
    fn dump(&self) -> DumpReport {
        let report = DumpReport::new(
            self.variant(),
            self.catalog(),
            self.native().capture_devices(),
            self.accessory_manager().connected_accessories(),
        );
        for line in report.lines() {
            self.logger().log(format_args!("{}.dump {}", self.variant(), line));
        }
        report
    }

    fn microphones_changed(&self) -> ChangeSubscription {
        self.notifiers().microphones.subscribe()
    }

    fn speakers_changed(&self) -> ChangeSubscription {
        self.notifiers().speakers.subscribe()
    }

    fn handle_event(&mut self, event: SessionEvent) -> EventAction {
        self.logger().log(format_args!("{}.handle_event() {:?}", self.variant(), event));

        let action = event.action();
        if let EventAction::Resync { notify } = action {
            self.resync(notify);
        }
        action
    }

    /// Parse and dispatch one queued item. Malformed notifications are
    /// logged and dropped.
    fn handle_inbound(&mut self, inbound: Inbound) -> Option<EventAction> {
        let event = match inbound {
            Inbound::Notification(notification) => match SessionEvent::from_notification(&notification) {
                Ok(event) => event,
                Err(e) => {
                    self.logger().error(format_args!("{}.handle_inbound() ERROR {}", self.variant(), e));
                    return None;
                }
            },
            Inbound::Stack(callback) => SessionEvent::Stack(callback),
        };
        Some(self.handle_event(event))
    }

    /// Handle everything queued so far without waiting. Returns the number
    /// of items taken off the queue.
    fn process_pending_events(&mut self) -> usize {
        let mut handled = 0;
        while let Some(inbound) = self.observer_mut().try_next() {
            self.handle_inbound(inbound);
            handled += 1;
        }
        handled
    }
}

/// Deactivate, apply category, options, mode and output override, then
/// reactivate. [`PortOverride::None`] leaves the output route alone.
///
/// Stops at the first failing call; whatever the stack already applied
/// stays applied.
pub fn apply_config(native: &dyn NativeSession, config: &SessionConfig) -> Result<(), SessionError> {
    native.set_active(false).map_err(SessionError::Configuration)?;
    native
        .set_category(config.category, &config.options)
        .map_err(SessionError::Configuration)?;
    native.set_mode(config.mode).map_err(SessionError::Configuration)?;
    if config.port_override != PortOverride::None {
        native
            .override_output_port(config.port_override)
            .map_err(SessionError::Configuration)?;
    }
    native.set_active(true).map_err(SessionError::Configuration)?;
    Ok(())
}

/// Process queued events as they arrive until `shutdown` completes.
pub async fn run_until<S, F>(session: &mut S, shutdown: F)
where
    S: HardwareSession + ?Sized,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        let inbound = tokio::select! {
            _ = &mut shutdown => None,
            inbound = session.observer_mut().next() => inbound,
        };

        match inbound {
            Some(inbound) => {
                session.handle_inbound(inbound);
            }
            None => break,
        }
    }
}

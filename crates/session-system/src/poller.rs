//! Route-change source for hosts without session notifications.
//!
//! Periodically snapshots the native session and posts a route-change
//! notification, as the session object, whenever the snapshot moves.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use routewatch_session_core::{NativeSession, Notification, NotificationCenter, RouteChangeReason, SYSTEM_TARGET};
use tokio::task::JoinHandle;

/// Default interval between snapshots.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteSnapshot {
    pub available: BTreeSet<String>,
    pub inputs: BTreeSet<String>,
    pub outputs: BTreeSet<String>,
}

impl RouteSnapshot {
    pub fn capture(session: &dyn NativeSession) -> Self {
        let route = session.current_route();
        Self {
            available: session.available_inputs().iter().map(|p| p.uid.clone()).collect(),
            inputs: route.inputs.iter().map(|p| p.uid.clone()).collect(),
            outputs: route.outputs.iter().map(|p| p.uid.clone()).collect(),
        }
    }
}

/// The reason to report for a move from `previous` to `next`, if any.
pub fn classify(previous: &RouteSnapshot, next: &RouteSnapshot) -> Option<RouteChangeReason> {
    if previous == next {
        None
    } else if next.available.difference(&previous.available).next().is_some() {
        Some(RouteChangeReason::NewDeviceAvailable)
    } else if previous.available.difference(&next.available).next().is_some() {
        Some(RouteChangeReason::OldDeviceUnavailable)
    } else {
        Some(RouteChangeReason::Override)
    }
}

/// A running poller. Dropping it stops polling.
pub struct RoutePoller {
    handle: JoinHandle<()>,
}

impl RoutePoller {
    /// Start polling `session` on the current tokio runtime.
    pub fn spawn<N>(session: Arc<N>, center: NotificationCenter, interval: Duration) -> Self
    where
        N: NativeSession + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut previous: Option<RouteSnapshot> = None;
            let mut ticker = tokio::time::interval(interval);

            loop {
                ticker.tick().await;

                // Enumeration may touch the audio server; keep it off the async workers
                let probe = Arc::clone(&session);
                let next = match tokio::task::spawn_blocking(move || RouteSnapshot::capture(probe.as_ref())).await {
                    Ok(snapshot) => snapshot,
                    Err(e) => {
                        tracing::error!(target: SYSTEM_TARGET, "Route snapshot task failed: {}", e);
                        continue;
                    }
                };

                if let Some(reason) = previous.as_ref().and_then(|prev| classify(prev, &next)) {
                    tracing::debug!(target: SYSTEM_TARGET, "Route moved ({:?}), posting route change", reason);
                    center.post(Notification::route_change(session.object_id(), reason));
                }
                previous = Some(next);
            }
        });

        Self { handle }
    }

    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for RoutePoller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

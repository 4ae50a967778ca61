//! The WebRTC audio-session seam and its process-wide shared handle.

use std::sync::{Arc, Mutex, MutexGuard};

use routewatch_session_core::{Inbound, NativeError, NativeSession, SessionError, StackCallback, WEBRTC_TARGET};
use tokio::sync::mpsc as tokio_mpsc;

/// Handle returned when a delegate is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DelegateId(pub u64);

/// Receives lower-level callbacks from the WebRTC audio session.
pub trait RtcAudioSessionDelegate: Send + Sync {
    fn audio_session_callback(&self, callback: StackCallback);
}

/// The WebRTC stack's wrapper around the OS audio session.
///
/// Adds a configuration lock, input tuning and a delegate list on top of the
/// plain native session.
pub trait RtcAudioSession: NativeSession {
    fn lock_for_configuration(&self);

    fn unlock_for_configuration(&self);

    fn set_preferred_sample_rate(&self, sample_rate: f64) -> Result<(), NativeError>;

    fn set_preferred_input_number_of_channels(&self, channels: u32) -> Result<(), NativeError>;

    fn add_delegate(&self, delegate: Arc<dyn RtcAudioSessionDelegate>) -> DelegateId;

    fn remove_delegate(&self, id: DelegateId);
}

/// Holds the configuration lock for its lifetime.
pub(crate) struct ConfigurationLock<'a, S: RtcAudioSession> {
    session: &'a S,
}

impl<'a, S: RtcAudioSession> ConfigurationLock<'a, S> {
    pub(crate) fn acquire(session: &'a S) -> Self {
        session.lock_for_configuration();
        Self { session }
    }
}

impl<S: RtcAudioSession> Drop for ConfigurationLock<'_, S> {
    fn drop(&mut self) {
        self.session.unlock_for_configuration();
    }
}

/// Forwards delegate callbacks onto a backend's event queue.
pub(crate) struct ForwardingDelegate {
    tx: tokio_mpsc::UnboundedSender<Inbound>,
}

impl ForwardingDelegate {
    pub(crate) fn new(tx: tokio_mpsc::UnboundedSender<Inbound>) -> Self {
        Self { tx }
    }
}

impl RtcAudioSessionDelegate for ForwardingDelegate {
    fn audio_session_callback(&self, callback: StackCallback) {
        if let Err(e) = self.tx.send(Inbound::Stack(callback)) {
            tracing::debug!(target: WEBRTC_TARGET, "Dropped stack callback (backend gone): {:?}", e.0);
        }
    }
}

struct SharedInner<S> {
    session: S,
    owner: Mutex<Option<String>>,
}

impl<S> SharedInner<S> {
    fn owner(&self) -> MutexGuard<'_, Option<String>> {
        self.owner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// The process-wide WebRTC audio session.
///
/// Any number of handles may exist, but only one backend may consume the
/// session at a time: [`SharedRtcSession::claim`] enforces it.
pub struct SharedRtcSession<S> {
    inner: Arc<SharedInner<S>>,
}

impl<S> Clone for SharedRtcSession<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: RtcAudioSession> SharedRtcSession<S> {
    pub fn new(session: S) -> Self {
        Self {
            inner: Arc::new(SharedInner {
                session,
                owner: Mutex::new(None),
            }),
        }
    }

    pub fn session(&self) -> &S {
        &self.inner.session
    }

    /// Who currently consumes the session, if anyone.
    pub fn owner(&self) -> Option<String> {
        self.inner.owner().clone()
    }

    /// Take exclusive use of the session until the claim is dropped.
    pub fn claim(&self, owner: &str) -> Result<RtcSessionClaim<S>, SessionError> {
        let mut current = self.inner.owner();
        if let Some(existing) = current.as_ref() {
            return Err(SessionError::SessionInUse {
                owner: existing.clone(),
            });
        }
        *current = Some(owner.to_string());

        Ok(RtcSessionClaim {
            inner: Arc::clone(&self.inner),
        })
    }
}

/// Exclusive use of a [`SharedRtcSession`]. Released on drop.
pub struct RtcSessionClaim<S> {
    inner: Arc<SharedInner<S>>,
}

impl<S> RtcSessionClaim<S> {
    pub fn session(&self) -> &S {
        &self.inner.session
    }
}

impl<S> Drop for RtcSessionClaim<S> {
    fn drop(&mut self) {
        *self.inner.owner() = None;
    }
}

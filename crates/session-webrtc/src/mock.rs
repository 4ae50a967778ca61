//! In-memory WebRTC audio session.
//!
//! Wraps [`MockNativeSession`] and adds the configuration lock, tuning and
//! delegate list, recording enough to assert on lock bracketing.

use std::sync::{Arc, Mutex, MutexGuard};

use routewatch_session_core::mock::MockNativeSession;
use routewatch_session_core::{
    CaptureDevice, Category, CategoryOption, Mode, NativeError, NativeSession, ObjectId, PortDescription, PortOverride,
    Route,
    StackCallback,
};

use crate::session::{DelegateId, RtcAudioSession, RtcAudioSessionDelegate};

#[derive(Default)]
struct RtcState {
    lock_depth: u32,
    locks: usize,
    unlocks: usize,
    category_while_locked: Option<bool>,
    sample_rate: Option<f64>,
    input_channels: Option<u32>,
    fail_sample_rate: bool,
    next_delegate: u64,
    delegates: Vec<(DelegateId, Arc<dyn RtcAudioSessionDelegate>)>,
}

#[derive(Default)]
pub struct MockRtcSession {
    native: MockNativeSession,
    state: Mutex<RtcState>,
}

impl MockRtcSession {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, RtcState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The underlying session, for route setup and call inspection.
    pub fn native(&self) -> &MockNativeSession {
        &self.native
    }

    /// Deliver `callback` to every registered delegate.
    pub fn emit(&self, callback: StackCallback) {
        // Clone out so a delegate may re-enter the session
        let delegates: Vec<_> = self.state().delegates.iter().map(|(_, d)| Arc::clone(d)).collect();
        for delegate in delegates {
            delegate.audio_session_callback(callback.clone());
        }
    }

    /// Make `set_preferred_sample_rate` fail until cleared.
    pub fn fail_sample_rate(&self, fail: bool) {
        self.state().fail_sample_rate = fail;
    }

    pub fn is_locked(&self) -> bool {
        self.state().lock_depth > 0
    }

    pub fn lock_count(&self) -> usize {
        self.state().locks
    }

    pub fn unlock_count(&self) -> usize {
        self.state().unlocks
    }

    /// Whether the last category change happened under the configuration
    /// lock. `None` if no category was ever set.
    pub fn category_set_while_locked(&self) -> Option<bool> {
        self.state().category_while_locked
    }

    pub fn preferred_sample_rate(&self) -> Option<f64> {
        self.state().sample_rate
    }

    pub fn preferred_input_channels(&self) -> Option<u32> {
        self.state().input_channels
    }

    pub fn delegate_count(&self) -> usize {
        self.state().delegates.len()
    }
}

impl NativeSession for MockRtcSession {
    fn object_id(&self) -> ObjectId {
        self.native.object_id()
    }

    fn current_route(&self) -> Route {
        self.native.current_route()
    }

    fn available_inputs(&self) -> Vec<Arc<PortDescription>> {
        self.native.available_inputs()
    }

    fn set_category(&self, category: Category, options: &[CategoryOption]) -> Result<(), NativeError> {
        let locked = self.is_locked();
        self.state().category_while_locked = Some(locked);
        self.native.set_category(category, options)
    }

    fn set_mode(&self, mode: Mode) -> Result<(), NativeError> {
        self.native.set_mode(mode)
    }

    fn set_active(&self, active: bool) -> Result<(), NativeError> {
        self.native.set_active(active)
    }

    fn override_output_port(&self, port: PortOverride) -> Result<(), NativeError> {
        self.native.override_output_port(port)
    }

    fn set_preferred_input(&self, port: Option<&PortDescription>) -> Result<(), NativeError> {
        self.native.set_preferred_input(port)
    }

    fn capture_devices(&self) -> Vec<CaptureDevice> {
        self.native.capture_devices()
    }
}

impl RtcAudioSession for MockRtcSession {
    fn lock_for_configuration(&self) {
        let mut state = self.state();
        state.lock_depth += 1;
        state.locks += 1;
    }

    fn unlock_for_configuration(&self) {
        let mut state = self.state();
        state.lock_depth = state.lock_depth.saturating_sub(1);
        state.unlocks += 1;
    }

    fn set_preferred_sample_rate(&self, sample_rate: f64) -> Result<(), NativeError> {
        let mut state = self.state();
        if state.fail_sample_rate {
            return Err(NativeError::new("setPreferredSampleRate", "rate not supported"));
        }
        state.sample_rate = Some(sample_rate);
        Ok(())
    }

    fn set_preferred_input_number_of_channels(&self, channels: u32) -> Result<(), NativeError> {
        self.state().input_channels = Some(channels);
        Ok(())
    }

    fn add_delegate(&self, delegate: Arc<dyn RtcAudioSessionDelegate>) -> DelegateId {
        let mut state = self.state();
        state.next_delegate += 1;
        let id = DelegateId(state.next_delegate);
        state.delegates.push((id, delegate));
        id
    }

    fn remove_delegate(&self, id: DelegateId) {
        self.state().delegates.retain(|(existing, _)| *existing != id);
    }
}

//! In-memory native session and accessory manager.
//!
//! Used by the backend tests and by the console's simulation mode. Every
//! call is recorded so tests can assert on ordering and counts.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::catalog::Route;
use crate::config::{Category, CategoryOption, Mode, PortOverride};
use crate::device::{CaptureDevice, PortDescription};
use crate::error::NativeError;
use crate::events::ObjectId;
use crate::traits::{Accessory, AccessoryManager, NativeSession};

/// Shorthand for a shared port description.
pub fn port(uid: &str, name: &str, port_type: &str) -> Arc<PortDescription> {
    Arc::new(PortDescription::new(uid, name, port_type))
}

/// A native call as recorded by [`MockNativeSession`].
#[derive(Debug, Clone, PartialEq)]
pub enum NativeCall {
    SetCategory(Category, Vec<CategoryOption>),
    SetMode(Mode),
    SetActive(bool),
    OverrideOutputPort(PortOverride),
    SetPreferredInput(Option<String>),
}

#[derive(Debug, Default)]
struct MockState {
    route_inputs: Vec<Arc<PortDescription>>,
    route_outputs: Vec<Arc<PortDescription>>,
    available: Vec<Arc<PortDescription>>,
    capture_devices: Vec<CaptureDevice>,
    preferred_input: Option<String>,
    category: Option<Category>,
    mode: Option<Mode>,
    port_override: PortOverride,
    active: bool,
    calls: Vec<NativeCall>,
    route_reads: usize,
    fail_category: bool,
    fail_preferred_input: bool,
}

#[derive(Debug)]
pub struct MockNativeSession {
    object_id: ObjectId,
    state: Mutex<MockState>,
}

impl Default for MockNativeSession {
    fn default() -> Self {
        Self::new()
    }
}

impl MockNativeSession {
    pub fn new() -> Self {
        Self {
            object_id: ObjectId::next(),
            state: Mutex::new(MockState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_route(&self, inputs: Vec<Arc<PortDescription>>, outputs: Vec<Arc<PortDescription>>) {
        let mut state = self.state();
        state.route_inputs = inputs;
        state.route_outputs = outputs;
    }

    pub fn set_available(&self, available: Vec<Arc<PortDescription>>) {
        self.state().available = available;
    }

    pub fn set_capture_devices(&self, devices: Vec<CaptureDevice>) {
        self.state().capture_devices = devices;
    }

    /// Make `set_category` fail until cleared.
    pub fn fail_category(&self, fail: bool) {
        self.state().fail_category = fail;
    }

    /// Make `set_preferred_input` fail until cleared.
    pub fn fail_preferred_input(&self, fail: bool) {
        self.state().fail_preferred_input = fail;
    }

    pub fn calls(&self) -> Vec<NativeCall> {
        self.state().calls.clone()
    }

    /// How many times the current route was read. One per resync.
    pub fn route_reads(&self) -> usize {
        self.state().route_reads
    }

    pub fn preferred_input(&self) -> Option<String> {
        self.state().preferred_input.clone()
    }

    pub fn category(&self) -> Option<Category> {
        self.state().category
    }

    pub fn mode(&self) -> Option<Mode> {
        self.state().mode
    }

    pub fn is_active(&self) -> bool {
        self.state().active
    }

    pub fn port_override(&self) -> PortOverride {
        self.state().port_override
    }
}

impl NativeSession for MockNativeSession {
    fn object_id(&self) -> ObjectId {
        self.object_id
    }

    fn current_route(&self) -> Route {
        let mut state = self.state();
        state.route_reads += 1;
        Route {
            inputs: state.route_inputs.clone(),
            outputs: state.route_outputs.clone(),
        }
    }

    fn available_inputs(&self) -> Vec<Arc<PortDescription>> {
        self.state().available.clone()
    }

    fn set_category(&self, category: Category, options: &[CategoryOption]) -> Result<(), NativeError> {
        let mut state = self.state();
        state.calls.push(NativeCall::SetCategory(category, options.to_vec()));
        if state.fail_category {
            return Err(NativeError::new("setCategory", "category rejected"));
        }
        state.category = Some(category);
        Ok(())
    }

    fn set_mode(&self, mode: Mode) -> Result<(), NativeError> {
        let mut state = self.state();
        state.calls.push(NativeCall::SetMode(mode));
        state.mode = Some(mode);
        Ok(())
    }

    fn set_active(&self, active: bool) -> Result<(), NativeError> {
        let mut state = self.state();
        state.calls.push(NativeCall::SetActive(active));
        state.active = active;
        Ok(())
    }

    fn override_output_port(&self, port: PortOverride) -> Result<(), NativeError> {
        let mut state = self.state();
        state.calls.push(NativeCall::OverrideOutputPort(port));
        state.port_override = port;
        Ok(())
    }

    fn set_preferred_input(&self, port: Option<&PortDescription>) -> Result<(), NativeError> {
        let mut state = self.state();
        let uid = port.map(|p| p.uid.clone());
        state.calls.push(NativeCall::SetPreferredInput(uid.clone()));
        if state.fail_preferred_input {
            return Err(NativeError::new("setPreferredInput", "port not routable"));
        }
        state.preferred_input = uid;
        Ok(())
    }

    fn capture_devices(&self) -> Vec<CaptureDevice> {
        self.state().capture_devices.clone()
    }
}

#[derive(Debug, Default)]
struct AccessoryState {
    registrations: usize,
    unregistrations: usize,
    connected: Vec<Accessory>,
}

#[derive(Debug, Default)]
pub struct MockAccessoryManager {
    state: Mutex<AccessoryState>,
}

impl MockAccessoryManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, AccessoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn connect(&self, accessory: Accessory) {
        self.state().connected.push(accessory);
    }

    pub fn disconnect(&self, connection_id: u64) {
        self.state().connected.retain(|a| a.connection_id != connection_id);
    }

    pub fn registrations(&self) -> usize {
        self.state().registrations
    }

    pub fn unregistrations(&self) -> usize {
        self.state().unregistrations
    }
}

impl AccessoryManager for MockAccessoryManager {
    fn register_for_local_notifications(&self) {
        self.state().registrations += 1;
    }

    fn unregister_for_local_notifications(&self) {
        self.state().unregistrations += 1;
    }

    fn connected_accessories(&self) -> Vec<Accessory> {
        self.state().connected.clone()
    }
}

//! In-memory vendor SDK session.

use std::sync::Arc;

use routewatch_session_core::mock::MockNativeSession;
use routewatch_session_core::{
    CaptureDevice, Category, CategoryOption, Mode, NativeError, NativeSession, ObjectId, PortDescription, PortOverride,
    Route,
};

use crate::hardware::SdkAudioSession;

/// An SDK wrapper over [`MockNativeSession`].
#[derive(Debug)]
pub struct MockSdkSession {
    identifier: String,
    native: MockNativeSession,
}

impl MockSdkSession {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            native: MockNativeSession::new(),
        }
    }

    pub fn native(&self) -> &MockNativeSession {
        &self.native
    }
}

impl NativeSession for MockSdkSession {
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

impl SdkAudioSession for MockSdkSession {
    fn identifier(&self) -> &str {
        &self.identifier
    }
}

//! Desktop native session built on cpal host enumeration.
//!
//! cpal has no audio-session categories, so category, mode and activation
//! are recorded but otherwise inert. Device names double as stable ids:
//! cpal 0.15 exposes nothing more durable. A name seen again in the same
//! enumeration gets ` #2`, ` #3` and so on, so identical devices depend on
//! enumeration order.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use cpal::traits::{DeviceTrait, HostTrait};
use routewatch_session_core::{
    Category, CategoryOption, Mode, NativeError, NativeSession, ObjectId, PortDescription, PortOverride, Route,
    SYSTEM_TARGET,
};

#[derive(Debug, Default)]
struct CpalState {
    preferred_input: Option<String>,
    category: Option<Category>,
    mode: Option<Mode>,
    active: bool,
}

/// Native session over the default cpal host.
#[derive(Debug)]
pub struct CpalSession {
    object_id: ObjectId,
    state: Mutex<CpalState>,
}

impl Default for CpalSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CpalSession {
    pub fn new() -> Self {
        Self {
            object_id: ObjectId::next(),
            state: Mutex::new(CpalState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, CpalState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_active(&self) -> bool {
        self.state().active
    }
}

fn host_port_type() -> String {
    format!("cpal:{}", cpal::default_host().id().name())
}

fn port_named(name: String, port_type: &str) -> Arc<PortDescription> {
    Arc::new(PortDescription::new(name.clone(), name, port_type))
}

/// One stable id per enumerated name, suffixing repeats.
fn stable_ids(names: &[String]) -> Vec<String> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    names
        .iter()
        .map(|name| {
            let count = seen.entry(name.as_str()).or_insert(0);
            *count += 1;
            if *count == 1 {
                name.clone()
            } else {
                format!("{} #{}", name, count)
            }
        })
        .collect()
}

fn input_ports(port_type: &str) -> Vec<Arc<PortDescription>> {
    let names = list_input_names();
    stable_ids(&names)
        .into_iter()
        .zip(names)
        .map(|(uid, name)| Arc::new(PortDescription::new(uid, name, port_type)))
        .collect()
}

/// Names of all input devices on the default host.
pub fn list_input_names() -> Vec<String> {
    let host = cpal::default_host();
    let mut names = Vec::new();

    match host.input_devices() {
        Ok(devices) => {
            for device in devices {
                if let Ok(name) = device.name() {
                    names.push(name);
                }
            }
        }
        Err(e) => tracing::warn!(target: SYSTEM_TARGET, "Failed to enumerate input devices: {}", e),
    }

    names
}

fn default_input_name() -> Option<String> {
    cpal::default_host().default_input_device().and_then(|d| d.name().ok())
}

fn default_output_name() -> Option<String> {
    cpal::default_host().default_output_device().and_then(|d| d.name().ok())
}

impl NativeSession for CpalSession {
    fn object_id(&self) -> ObjectId {
        self.object_id
    }

    /// The preferred input when it is still present, otherwise the host
    /// default; the default output.
    fn current_route(&self) -> Route {
        let port_type = host_port_type();
        let ports = input_ports(&port_type);
        let preferred = self.state().preferred_input.clone();

        let input = preferred
            .and_then(|uid| ports.iter().find(|port| port.uid == uid).cloned())
            .or_else(|| {
                default_input_name().map(|name| match ports.iter().find(|port| port.name == name) {
                    Some(port) => Arc::clone(port),
                    None => port_named(name, &port_type),
                })
            });

        Route {
            inputs: input.into_iter().collect(),
            outputs: default_output_name()
                .into_iter()
                .map(|name| port_named(name, &port_type))
                .collect(),
        }
    }

    fn available_inputs(&self) -> Vec<Arc<PortDescription>> {
        input_ports(&host_port_type())
    }

    fn set_category(&self, category: Category, _options: &[CategoryOption]) -> Result<(), NativeError> {
        self.state().category = Some(category);
        Ok(())
    }

    fn set_mode(&self, mode: Mode) -> Result<(), NativeError> {
        self.state().mode = Some(mode);
        Ok(())
    }

    fn set_active(&self, active: bool) -> Result<(), NativeError> {
        self.state().active = active;
        Ok(())
    }

    /// cpal always plays to the default output.
    fn override_output_port(&self, _port: PortOverride) -> Result<(), NativeError> {
        Ok(())
    }

    fn set_preferred_input(&self, port: Option<&PortDescription>) -> Result<(), NativeError> {
        let Some(port) = port else {
            self.state().preferred_input = None;
            return Ok(());
        };

        if !input_ports(&host_port_type()).iter().any(|known| known.uid == port.uid) {
            return Err(NativeError::new("setPreferredInput", format!("no input device with id {}", port.uid)));
        }
        self.state().preferred_input = Some(port.uid.clone());
        Ok(())
    }
}

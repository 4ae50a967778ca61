//! Command handlers
//!
//! Each handler opens a backend (live cpal session or a simulation), runs
//! one operation and writes the result to stdout. Logging never shares
//! that stream.

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use futures::StreamExt;
use routewatch_session_core::{
    DeviceKind, DeviceRecord, HardwareSession, NoAccessories, NotificationCenter, SessionConfig, CONSOLE_TARGET,
};
use routewatch_session_system::{CpalSession, RoutePoller, SystemHardware};

use crate::config::{BackendKind, ConsoleConfig};
use crate::simulate::{Simulation, SCRIPT};

/// Resolved command-line and file settings
pub struct Context {
    pub config: ConsoleConfig,
    pub backend: BackendKind,
    pub simulate: bool,
}

impl Context {
    fn session_config(&self) -> SessionConfig {
        self.config.session_config(self.backend)
    }
}

// ============================================================================
// Backend assembly
// ============================================================================

enum Opened {
    Live {
        native: Arc<CpalSession>,
        hardware: SystemHardware<CpalSession>,
    },
    Simulated(Simulation),
}

impl Opened {
    fn hardware(&self) -> &dyn HardwareSession {
        match self {
            Self::Live { hardware, .. } => hardware,
            Self::Simulated(simulation) => simulation.hardware(),
        }
    }

    fn hardware_mut(&mut self) -> &mut dyn HardwareSession {
        match self {
            Self::Live { hardware, .. } => hardware,
            Self::Simulated(simulation) => simulation.hardware_mut(),
        }
    }

    fn is_simulated(&self) -> bool {
        matches!(self, Self::Simulated(_))
    }
}

fn open(ctx: &Context, center: &NotificationCenter) -> Result<Opened> {
    let session = ctx.session_config();
    tracing::info!(
        target: CONSOLE_TARGET,
        backend = %ctx.backend,
        simulate = ctx.simulate,
        "Opening session backend"
    );

    if ctx.simulate {
        return Ok(Opened::Simulated(Simulation::new(ctx.backend, session, center)?));
    }

    match ctx.backend {
        BackendKind::System => {
            let native = Arc::new(CpalSession::new());
            let hardware = SystemHardware::new(Arc::clone(&native), center.clone(), Arc::new(NoAccessories), session);
            Ok(Opened::Live { native, hardware })
        }
        other => bail!("The {} backend needs its native stack on this host; rerun with --simulate", other),
    }
}

// ============================================================================
// Output
// ============================================================================

fn format_device(device: &DeviceRecord) -> String {
    format!(
        "{:<10} {:<36} {:<24} {}",
        device.kind.as_str(),
        device.name,
        device.port_type,
        if device.is_current_device { "*" } else { "" }
    )
}

fn write_devices(out: &mut impl Write, devices: &[DeviceRecord]) -> io::Result<()> {
    if devices.is_empty() {
        return writeln!(out, "(no devices)");
    }
    for device in devices {
        writeln!(out, "{}", format_device(device))?;
    }
    Ok(())
}

fn write_change(out: &mut impl Write, revision: u64, devices: &[DeviceRecord]) -> io::Result<()> {
    writeln!(out, "-- devices changed (revision {})", revision)?;
    write_devices(out, devices)
}

// ============================================================================
// Commands
// ============================================================================

/// Devices of `kind`, sorted by name, as a table or JSON
pub fn render_devices(ctx: &Context, kind: DeviceKind, json: bool) -> Result<String> {
    let center = NotificationCenter::new();
    let opened = open(ctx, &center)?;
    let devices = opened.hardware().available(kind);

    if json {
        return Ok(serde_json::to_string_pretty(&devices)? + "\n");
    }
    let mut out = Vec::new();
    write_devices(&mut out, &devices)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// The diagnostic snapshot as text or JSON
pub fn render_dump(ctx: &Context, json: bool) -> Result<String> {
    let center = NotificationCenter::new();
    let opened = open(ctx, &center)?;
    let report = opened.hardware().dump();

    if json {
        Ok(serde_json::to_string_pretty(&report)? + "\n")
    } else {
        Ok(report.to_string())
    }
}

pub fn devices(ctx: &Context, kind: DeviceKind, json: bool) -> Result<()> {
    print!("{}", render_devices(ctx, kind, json)?);
    Ok(())
}

pub fn dump(ctx: &Context, json: bool) -> Result<()> {
    print!("{}", render_dump(ctx, json)?);
    Ok(())
}

async fn shutdown_signal(duration: Option<Duration>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(target: CONSOLE_TARGET, "Failed to listen for Ctrl-C: {}", e);
        }
    };

    match duration {
        Some(duration) => {
            tokio::select! {
                _ = tokio::time::sleep(duration) => {}
                _ = ctrl_c => {}
            }
        }
        None => ctrl_c.await,
    }
}

/// Follow the backend, printing the device list on every real change.
///
/// Live sessions are polled at the configured interval; simulations play
/// the script one step per `step_interval` and stop when it runs out,
/// after reporting everything the script queued.
pub async fn watch<W: Write>(
    ctx: &Context,
    duration: Option<Duration>,
    step_interval: Duration,
    out: &mut W,
) -> Result<()> {
    let center = NotificationCenter::new();
    let mut opened = open(ctx, &center)?;

    let _poller = match &opened {
        Opened::Live { native, .. } => Some(RoutePoller::spawn(
            Arc::clone(native),
            center.clone(),
            ctx.config.poll_interval(),
        )),
        Opened::Simulated(_) => None,
    };

    let mut changes = opened.hardware().microphones_changed();
    write_devices(out, &opened.hardware().available(DeviceKind::All))?;

    let shutdown = shutdown_signal(duration);
    tokio::pin!(shutdown);

    let mut script = SCRIPT.iter().copied();
    let mut ticker = tokio::time::interval(step_interval);
    // First tick is immediate
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick(), if opened.is_simulated() => match script.next() {
                Some(step) => {
                    if let Opened::Simulated(simulation) = &opened {
                        tracing::info!(target: CONSOLE_TARGET, ?step, "Simulating");
                        simulation.apply(&center, step);
                    }
                }
                None => {
                    opened.hardware_mut().process_pending_events();
                    while let Some(signal) = changes.try_next() {
                        write_change(out, signal.revision, &opened.hardware().available(DeviceKind::All))?;
                    }
                    break;
                }
            },
            Some(inbound) = opened.hardware_mut().observer_mut().next() => {
                opened.hardware_mut().handle_inbound(inbound);
            }
            Some(signal) = changes.next() => {
                write_change(out, signal.revision, &opened.hardware().available(DeviceKind::All))?;
            }
        }
    }

    tracing::info!(target: CONSOLE_TARGET, "Watch finished");
    Ok(())
}

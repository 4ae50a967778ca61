use std::sync::Arc;

use routewatch_session_core::{
    apply_config, AccessoryManager, DeviceCatalog, HardwareSession, LogCategory, NativeSession,
    NotificationCenter, SessionConfig, SessionError, SessionLogger, SessionNotifiers, SessionObserver,
};

/// Session backend bound directly to the OS audio session.
///
/// The native session is the process-wide shared instance; this backend
/// borrows it through an `Arc` and never tears it down.
pub struct SystemHardware<N: NativeSession> {
    native: Arc<N>,
    accessories: Arc<dyn AccessoryManager>,
    config: SessionConfig,
    logger: SessionLogger,
    catalog: DeviceCatalog,
    notifiers: SessionNotifiers,
    observer: SessionObserver,
}

impl<N: NativeSession> SystemHardware<N> {
    /// Build and start the backend: configure, observe, resync, dump.
    pub fn new(
        native: Arc<N>,
        center: NotificationCenter,
        accessories: Arc<dyn AccessoryManager>,
        config: SessionConfig,
    ) -> Self {
        let mut hardware = Self {
            native,
            accessories,
            config,
            logger: SessionLogger::new(LogCategory::System),
            catalog: DeviceCatalog::default(),
            notifiers: SessionNotifiers::default(),
            observer: SessionObserver::new(center),
        };
        hardware.logger.log("SystemHardware.new()");
        hardware.start();
        hardware
    }

    /// Clear the preferred input and let the OS pick.
    pub fn reset_input(&mut self) -> Result<(), SessionError> {
        self.logger.log("SystemHardware.reset_input()");

        self.native
            .set_preferred_input(None)
            .map_err(|source| SessionError::InputSelection {
                device: "<none>".to_string(),
                source,
            })
            .inspect_err(|e| self.logger.error(format_args!("SystemHardware.reset_input() ERROR {}", e)))
    }
}

impl<N: NativeSession> HardwareSession for SystemHardware<N> {
    fn variant(&self) -> &'static str {
        "SystemHardware"
    }

    fn logger(&self) -> &SessionLogger {
        &self.logger
    }

    fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn native(&self) -> &dyn NativeSession {
        self.native.as_ref()
    }

    fn accessory_manager(&self) -> &dyn AccessoryManager {
        self.accessories.as_ref()
    }

    fn catalog(&self) -> &DeviceCatalog {
        &self.catalog
    }

    fn catalog_mut(&mut self) -> &mut DeviceCatalog {
        &mut self.catalog
    }

    fn notifiers(&self) -> &SessionNotifiers {
        &self.notifiers
    }

    fn observer_mut(&mut self) -> &mut SessionObserver {
        &mut self.observer
    }

    fn configure(&mut self) -> Result<(), SessionError> {
        self.logger.log(format_args!(
            "SystemHardware.configure() category: {}, mode: {}",
            self.config.category, self.config.mode
        ));

        match apply_config(self.native.as_ref(), &self.config) {
            Ok(()) => {
                self.logger.log("SystemHardware.configure() SUCCESS");
                Ok(())
            }
            Err(e) => {
                self.logger.error(format_args!("SystemHardware.configure() ERROR -> {}", e));
                Err(e)
            }
        }
    }
}

impl<N: NativeSession> Drop for SystemHardware<N> {
    fn drop(&mut self) {
        self.logger.log("SystemHardware.drop()");
        self.stop_observing();
    }
}

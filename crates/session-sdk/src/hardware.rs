use std::sync::Arc;

use routewatch_session_core::{
    apply_config, AccessoryManager, DeviceCatalog, HardwareSession, LogCategory, NativeSession, NotificationCenter,
    SessionConfig, SessionError, SessionLogger, SessionNotifiers, SessionObserver,
};

/// A vendor SDK's wrapper around the OS audio session.
///
/// Notifications about the wrapped session are posted with the wrapper's
/// own object id.
pub trait SdkAudioSession: NativeSession {
    /// Label the SDK was given when the wrapper was created.
    fn identifier(&self) -> &str;
}

/// Session backend that owns a vendor SDK session wrapper.
pub struct SdkHardware<W: SdkAudioSession> {
    session: W,
    accessories: Arc<dyn AccessoryManager>,
    config: SessionConfig,
    logger: SessionLogger,
    catalog: DeviceCatalog,
    notifiers: SessionNotifiers,
    observer: SessionObserver,
}

impl<W: SdkAudioSession> SdkHardware<W> {
    /// Take ownership of `session` and start.
    pub fn new(
        session: W,
        center: NotificationCenter,
        accessories: Arc<dyn AccessoryManager>,
        config: SessionConfig,
    ) -> Self {
        let logger = SessionLogger::new(LogCategory::Sdk);
        logger.log(format_args!("SdkHardware.new() identifier: {}", session.identifier()));

        let mut hardware = Self {
            session,
            accessories,
            config,
            logger,
            catalog: DeviceCatalog::default(),
            notifiers: SessionNotifiers::default(),
            observer: SessionObserver::new(center),
        };
        hardware.start();
        hardware
    }

    /// Stop observing. The catalog keeps its last state.
    pub fn reset(&mut self) {
        self.logger.log("SdkHardware.reset()");
        self.stop_observing();
    }

    pub fn sdk_session(&self) -> &W {
        &self.session
    }
}

impl<W: SdkAudioSession> HardwareSession for SdkHardware<W> {
    fn variant(&self) -> &'static str {
        "SdkHardware"
    }

    fn logger(&self) -> &SessionLogger {
        &self.logger
    }

    fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn native(&self) -> &dyn NativeSession {
        &self.session
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
            "SdkHardware.configure() category: {}, mode: {}",
            self.config.category, self.config.mode
        ));

        apply_config(&self.session, &self.config)
            .inspect(|_| self.logger.log("SdkHardware.configure() SUCCESS"))
            .inspect_err(|e| self.logger.error(format_args!("SdkHardware.configure() ERROR -> {}", e)))
    }
}

impl<W: SdkAudioSession> Drop for SdkHardware<W> {
    fn drop(&mut self) {
        self.logger.log("SdkHardware.drop()");
        self.reset();
    }
}

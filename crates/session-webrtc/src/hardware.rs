use std::sync::Arc;

use routewatch_session_core::{
    AccessoryManager, DeviceCatalog, HardwareSession, LogCategory, NativeSession, NotificationCenter, PortOverride,
    SessionConfig, SessionError, SessionLogger, SessionNotifiers, SessionObserver,
};

use crate::session::{
    ConfigurationLock, DelegateId, ForwardingDelegate, RtcAudioSession, RtcSessionClaim, SharedRtcSession,
};

const OWNER: &str = "RtcHardware";

/// Session backend bound to the WebRTC stack's audio session.
///
/// Holds an exclusive claim on the shared session for its whole lifetime.
/// While observing, it is also a delegate of the session and receives the
/// stack's callbacks through its event queue.
pub struct RtcHardware<S: RtcAudioSession> {
    claim: RtcSessionClaim<S>,
    delegate: Option<DelegateId>,
    accessories: Arc<dyn AccessoryManager>,
    config: SessionConfig,
    logger: SessionLogger,
    catalog: DeviceCatalog,
    notifiers: SessionNotifiers,
    observer: SessionObserver,
}

impl<S: RtcAudioSession> RtcHardware<S> {
    /// Claim the shared session and start.
    ///
    /// Fails with [`SessionError::SessionInUse`] if another backend already
    /// consumes the session.
    pub fn new(
        shared: &SharedRtcSession<S>,
        center: NotificationCenter,
        accessories: Arc<dyn AccessoryManager>,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        let logger = SessionLogger::new(LogCategory::Webrtc);
        logger.log("RtcHardware.new()");

        let claim = shared
            .claim(OWNER)
            .inspect_err(|e| logger.error(format_args!("RtcHardware.new() ERROR {}", e)))?;

        let mut hardware = Self {
            claim,
            delegate: None,
            accessories,
            config,
            logger,
            catalog: DeviceCatalog::default(),
            notifiers: SessionNotifiers::default(),
            observer: SessionObserver::new(center),
        };
        hardware.start();
        Ok(hardware)
    }
}

/// Deactivate, then apply category, mode, output override and tuning under
/// the configuration lock, then reactivate. The lock is released on every path.
fn configure_locked<S: RtcAudioSession>(session: &S, config: &SessionConfig) -> Result<(), SessionError> {
    session.set_active(false).map_err(SessionError::Configuration)?;
    {
        let _lock = ConfigurationLock::acquire(session);

        session
            .set_category(config.category, &config.options)
            .map_err(SessionError::Configuration)?;
        session.set_mode(config.mode).map_err(SessionError::Configuration)?;
        if config.port_override != PortOverride::None {
            session
                .override_output_port(config.port_override)
                .map_err(SessionError::Configuration)?;
        }

        if let Some(tuning) = config.tuning {
            session
                .set_preferred_sample_rate(tuning.preferred_sample_rate)
                .map_err(SessionError::Configuration)?;
            session
                .set_preferred_input_number_of_channels(tuning.preferred_input_channels)
                .map_err(SessionError::Configuration)?;
        }
    }
    session.set_active(true).map_err(SessionError::Configuration)?;
    Ok(())
}

impl<S: RtcAudioSession> HardwareSession for RtcHardware<S> {
    fn variant(&self) -> &'static str {
        OWNER
    }

    fn logger(&self) -> &SessionLogger {
        &self.logger
    }

    fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn native(&self) -> &dyn NativeSession {
        self.claim.session()
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

    /// Observe OS notifications and attach as a delegate of the session.
    fn observe(&mut self) {
        self.logger.log("RtcHardware.observe()");
        let object = self.claim.session().object_id();
        self.observer.observe(object);

        if self.delegate.is_none() {
            let forwarder = Arc::new(ForwardingDelegate::new(self.observer.sender()));
            self.delegate = Some(self.claim.session().add_delegate(forwarder));
        }
    }

    fn stop_observing(&mut self) {
        self.logger.log("RtcHardware.stop_observing()");
        if let Some(id) = self.delegate.take() {
            self.claim.session().remove_delegate(id);
        }
        self.observer.stop();
        self.accessories.unregister_for_local_notifications();
    }

    fn configure(&mut self) -> Result<(), SessionError> {
        self.logger.log(format_args!(
            "RtcHardware.configure() category: {}, mode: {}, tuning: {:?}",
            self.config.category, self.config.mode, self.config.tuning
        ));

        configure_locked(self.claim.session(), &self.config)
            .inspect(|_| self.logger.log("RtcHardware.configure() SUCCESS"))
            .inspect_err(|e| self.logger.error(format_args!("RtcHardware.configure() ERROR -> {}", e)))
    }
}

impl<S: RtcAudioSession> Drop for RtcHardware<S> {
    fn drop(&mut self) {
        self.logger.log("RtcHardware.drop()");
        self.stop_observing();
    }
}

#[cfg(test)]
mod tests {
    use routewatch_session_core::mock::{MockAccessoryManager, NativeCall};
    use routewatch_session_core::{Category, CategoryOption, Mode, NoAccessories};

    use super::*;
    use crate::mock::MockRtcSession;

    fn build(shared: &SharedRtcSession<MockRtcSession>) -> Result<RtcHardware<MockRtcSession>, SessionError> {
        RtcHardware::new(
            shared,
            NotificationCenter::new(),
            Arc::new(NoAccessories),
            SessionConfig::webrtc(),
        )
    }

    #[test]
    fn test_configuration_is_bracketed_by_lock() {
        let shared = SharedRtcSession::new(MockRtcSession::new());
        let _hardware = build(&shared).unwrap();
        let session = shared.session();

        assert_eq!(session.category_set_while_locked(), Some(true));
        assert_eq!(session.lock_count(), 1);
        assert_eq!(session.unlock_count(), 1);
        assert!(!session.is_locked());
        assert_eq!(session.preferred_sample_rate(), Some(44_100.0));
        assert_eq!(session.preferred_input_channels(), Some(2));
        assert_eq!(
            session.native().calls(),
            vec![
                NativeCall::SetActive(false),
                NativeCall::SetCategory(Category::Record, vec![CategoryOption::DefaultToSpeaker]),
                NativeCall::SetMode(Mode::Default),
                NativeCall::SetActive(true),
            ]
        );
    }

    #[test]
    fn test_lock_released_when_tuning_fails() {
        let shared = SharedRtcSession::new(MockRtcSession::new());
        shared.session().fail_sample_rate(true);

        let _hardware = build(&shared).unwrap();
        let session = shared.session();

        assert!(!session.is_locked());
        assert_eq!(session.unlock_count(), 1);
        // Never reactivated after the failure
        assert!(!session.native().is_active());
    }

    #[test]
    fn test_second_backend_fails_fast() {
        let shared = SharedRtcSession::new(MockRtcSession::new());
        let first = build(&shared).unwrap();

        assert!(matches!(build(&shared), Err(SessionError::SessionInUse { .. })));

        drop(first);
        assert!(build(&shared).is_ok());
    }

    #[test]
    fn test_drop_detaches_delegate() {
        let shared = SharedRtcSession::new(MockRtcSession::new());
        let accessories = Arc::new(MockAccessoryManager::new());
        let hardware = RtcHardware::new(
            &shared,
            NotificationCenter::new(),
            accessories.clone(),
            SessionConfig::webrtc(),
        )
        .unwrap();
        assert_eq!(shared.session().delegate_count(), 1);

        drop(hardware);

        assert_eq!(shared.session().delegate_count(), 0);
        assert_eq!(accessories.unregistrations(), 1);
        assert_eq!(shared.owner(), None);
    }

    #[test]
    fn test_unobserved_backend_is_not_a_delegate() {
        let shared = SharedRtcSession::new(MockRtcSession::new());
        let config = SessionConfig {
            observe_notifications: false,
            ..SessionConfig::webrtc()
        };
        let mut hardware = RtcHardware::new(&shared, NotificationCenter::new(), Arc::new(NoAccessories), config).unwrap();
        assert_eq!(shared.session().delegate_count(), 0);

        hardware.observe();
        hardware.observe();
        assert_eq!(shared.session().delegate_count(), 1);
    }
}

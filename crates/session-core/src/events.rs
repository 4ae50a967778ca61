//! OS notification source and the event-to-action mapping shared by every
//! backend.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use crate::error::SessionError;

/// Payload key carrying the raw interruption type.
pub const INTERRUPTION_TYPE_KEY: &str = "interruption-type";
/// Payload key carrying the raw route-change reason.
pub const ROUTE_CHANGE_REASON_KEY: &str = "route-change-reason";
/// Payload key carrying the accessory connection id.
pub const ACCESSORY_CONNECTION_KEY: &str = "accessory-connection-id";

/// Identity of a notification sender (a native session object).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(pub u64);

impl ObjectId {
    /// A process-unique id for a new native object.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationName {
    Interruption,
    RouteChange,
    SilenceSecondaryAudioHint,
    MediaServicesWereLost,
    MediaServicesWereReset,
    AccessoryDidConnect,
    AccessoryDidDisconnect,
}

impl NotificationName {
    /// The audio-session notifications, posted by a session object.
    pub const SESSION: [NotificationName; 5] = [
        Self::Interruption,
        Self::RouteChange,
        Self::SilenceSecondaryAudioHint,
        Self::MediaServicesWereLost,
        Self::MediaServicesWereReset,
    ];

    /// The accessory notifications, posted by any sender.
    pub const ACCESSORY: [NotificationName; 2] = [Self::AccessoryDidConnect, Self::AccessoryDidDisconnect];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Interruption => "interruption",
            Self::RouteChange => "route-change",
            Self::SilenceSecondaryAudioHint => "silence-secondary-audio-hint",
            Self::MediaServicesWereLost => "media-services-were-lost",
            Self::MediaServicesWereReset => "media-services-were-reset",
            Self::AccessoryDidConnect => "accessory-did-connect",
            Self::AccessoryDidDisconnect => "accessory-did-disconnect",
        }
    }
}

impl fmt::Display for NotificationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A posted notification.
#[derive(Debug, Clone)]
pub struct Notification {
    pub name: NotificationName,
    pub sender: Option<ObjectId>,
    pub user_info: HashMap<&'static str, u64>,
}

impl Notification {
    pub fn new(name: NotificationName, sender: Option<ObjectId>) -> Self {
        Self {
            name,
            sender,
            user_info: HashMap::new(),
        }
    }

    pub fn with(mut self, key: &'static str, value: u64) -> Self {
        self.user_info.insert(key, value);
        self
    }

    pub fn interruption(sender: ObjectId, kind: InterruptionType) -> Self {
        Self::new(NotificationName::Interruption, Some(sender)).with(INTERRUPTION_TYPE_KEY, kind.raw())
    }

    pub fn route_change(sender: ObjectId, reason: RouteChangeReason) -> Self {
        Self::new(NotificationName::RouteChange, Some(sender)).with(ROUTE_CHANGE_REASON_KEY, reason.raw())
    }

    pub fn accessory(name: NotificationName, connection_id: u64) -> Self {
        Self::new(name, None).with(ACCESSORY_CONNECTION_KEY, connection_id)
    }

    fn require(&self, key: &'static str) -> Result<u64, SessionError> {
        self.user_info
            .get(key)
            .copied()
            .ok_or_else(|| SessionError::NotificationParse {
                name: self.name.to_string(),
                key,
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptionType {
    Began,
    Ended,
    Other(u64),
}

impl InterruptionType {
    pub fn from_raw(raw: u64) -> Self {
        match raw {
            1 => Self::Began,
            0 => Self::Ended,
            other => Self::Other(other),
        }
    }

    pub fn raw(&self) -> u64 {
        match self {
            Self::Began => 1,
            Self::Ended => 0,
            Self::Other(raw) => *raw,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteChangeReason {
    Unknown,
    NewDeviceAvailable,
    OldDeviceUnavailable,
    CategoryChange,
    Override,
    WakeFromSleep,
    NoSuitableRouteForCategory,
    RouteConfigurationChange,
    Other(u64),
}

impl RouteChangeReason {
    pub fn from_raw(raw: u64) -> Self {
        match raw {
            0 => Self::Unknown,
            1 => Self::NewDeviceAvailable,
            2 => Self::OldDeviceUnavailable,
            3 => Self::CategoryChange,
            4 => Self::Override,
            6 => Self::WakeFromSleep,
            7 => Self::NoSuitableRouteForCategory,
            8 => Self::RouteConfigurationChange,
            other => Self::Other(other),
        }
    }

    pub fn raw(&self) -> u64 {
        match self {
            Self::Unknown => 0,
            Self::NewDeviceAvailable => 1,
            Self::OldDeviceUnavailable => 2,
            Self::CategoryChange => 3,
            Self::Override => 4,
            Self::WakeFromSleep => 6,
            Self::NoSuitableRouteForCategory => 7,
            Self::RouteConfigurationChange => 8,
            Self::Other(raw) => *raw,
        }
    }

    /// Only device arrival and departure are worth telling subscribers about.
    pub fn warrants_notification(&self) -> bool {
        matches!(self, Self::NewDeviceAvailable | Self::OldDeviceUnavailable)
    }
}

/// Lower-level callbacks from a stack-specific session delegate.
#[derive(Debug, Clone, PartialEq)]
pub enum StackCallback {
    BeginInterruption,
    EndInterruption { should_resume: bool },
    MediaServerReset,
    MediaServerTerminated,
    StartPlayOrRecord,
    StopPlayOrRecord,
    WillSetActive(bool),
    DidSetActive(bool),
    FailedToSetActive { active: bool, error: String },
    OutputVolumeChanged(f32),
    PlayoutGlitch { total: i64 },
    CanPlayOrRecordChanged(bool),
    RouteChanged { reason: RouteChangeReason },
}

/// A parsed event, ready for dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Interruption(InterruptionType),
    RouteChange(RouteChangeReason),
    SilenceSecondaryAudioHint,
    MediaServicesWereLost,
    MediaServicesWereReset,
    AccessoryConnected { connection_id: Option<u64> },
    AccessoryDisconnected { connection_id: Option<u64> },
    Stack(StackCallback),
}

/// What a session does in response to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventAction {
    Resync { notify: bool },
    LogOnly,
}

impl SessionEvent {
    pub fn from_notification(notification: &Notification) -> Result<Self, SessionError> {
        let event = match notification.name {
            NotificationName::Interruption => {
                Self::Interruption(InterruptionType::from_raw(notification.require(INTERRUPTION_TYPE_KEY)?))
            }
            NotificationName::RouteChange => {
                Self::RouteChange(RouteChangeReason::from_raw(notification.require(ROUTE_CHANGE_REASON_KEY)?))
            }
            NotificationName::SilenceSecondaryAudioHint => Self::SilenceSecondaryAudioHint,
            NotificationName::MediaServicesWereLost => Self::MediaServicesWereLost,
            NotificationName::MediaServicesWereReset => Self::MediaServicesWereReset,
            NotificationName::AccessoryDidConnect => Self::AccessoryConnected {
                connection_id: notification.user_info.get(ACCESSORY_CONNECTION_KEY).copied(),
            },
            NotificationName::AccessoryDidDisconnect => Self::AccessoryDisconnected {
                connection_id: notification.user_info.get(ACCESSORY_CONNECTION_KEY).copied(),
            },
        };
        Ok(event)
    }

    pub fn action(&self) -> EventAction {
        match self {
            Self::Interruption(InterruptionType::Ended) => EventAction::Resync { notify: true },
            Self::Interruption(_) => EventAction::LogOnly,
            Self::RouteChange(reason) => EventAction::Resync {
                notify: reason.warrants_notification(),
            },
            Self::MediaServicesWereReset => EventAction::Resync { notify: true },
            Self::AccessoryConnected { .. } | Self::AccessoryDisconnected { .. } => {
                EventAction::Resync { notify: true }
            }
            Self::SilenceSecondaryAudioHint | Self::MediaServicesWereLost => EventAction::LogOnly,
            Self::Stack(StackCallback::RouteChanged { .. }) => EventAction::Resync { notify: true },
            Self::Stack(_) => EventAction::LogOnly,
        }
    }
}

type ObserverCallback = Arc<dyn Fn(&Notification) + Send + Sync>;

struct ObserverEntry {
    token: u64,
    name: NotificationName,
    object: Option<ObjectId>,
    callback: ObserverCallback,
}

#[derive(Default)]
struct CenterInner {
    next_token: AtomicU64,
    observers: Mutex<Vec<ObserverEntry>>,
}

impl CenterInner {
    fn observers(&self) -> std::sync::MutexGuard<'_, Vec<ObserverEntry>> {
        self.observers.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// A process-wide registry of notification observers.
///
/// Cloning yields another handle to the same registry.
#[derive(Clone, Default)]
pub struct NotificationCenter {
    inner: Arc<CenterInner>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for `name`. With `object == Some(id)` only
    /// notifications from that sender are delivered.
    ///
    /// The observer stays registered until the returned [`Observation`] is
    /// dropped.
    pub fn add_observer<F>(&self, name: NotificationName, object: Option<ObjectId>, callback: F) -> Observation
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        let token = self.inner.next_token.fetch_add(1, Ordering::Relaxed);
        self.inner.observers().push(ObserverEntry {
            token,
            name,
            object,
            callback: Arc::new(callback),
        });
        Observation {
            center: Arc::downgrade(&self.inner),
            token,
        }
    }

    /// Deliver `notification` to every matching observer on the calling
    /// thread.
    pub fn post(&self, notification: Notification) {
        let callbacks: Vec<ObserverCallback> = self
            .inner
            .observers()
            .iter()
            .filter(|entry| entry.name == notification.name)
            .filter(|entry| entry.object.is_none() || entry.object == notification.sender)
            .map(|entry| Arc::clone(&entry.callback))
            .collect();

        // Callbacks run unlocked so they may post or unsubscribe
        for callback in callbacks {
            callback(&notification);
        }
    }

    pub fn observer_count(&self) -> usize {
        self.inner.observers().len()
    }
}

impl fmt::Debug for NotificationCenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationCenter")
            .field("observers", &self.observer_count())
            .finish()
    }
}

/// A registered observer. Dropping it unregisters.
#[derive(Debug)]
pub struct Observation {
    center: Weak<CenterInner>,
    token: u64,
}

impl Drop for Observation {
    fn drop(&mut self) {
        if let Some(center) = self.center.upgrade() {
            center.observers().retain(|entry| entry.token != self.token);
        }
    }
}

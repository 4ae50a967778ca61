//! Moves OS callbacks onto the session's own execution context.
//!
//! Observers registered on the [`NotificationCenter`] run on whatever thread
//! posts. They only forward into an unbounded channel; the session owner
//! drains it, so catalog mutation stays single-threaded.

use tokio::sync::mpsc as tokio_mpsc;

use crate::events::{Notification, NotificationCenter, NotificationName, ObjectId, Observation, StackCallback};

/// Something a backend must react to.
#[derive(Debug, Clone)]
pub enum Inbound {
    Notification(Notification),
    Stack(StackCallback),
}

pub struct SessionObserver {
    center: NotificationCenter,
    tx: tokio_mpsc::UnboundedSender<Inbound>,
    rx: tokio_mpsc::UnboundedReceiver<Inbound>,
    observations: Vec<Observation>,
}

impl SessionObserver {
    pub fn new(center: NotificationCenter) -> Self {
        let (tx, rx) = tokio_mpsc::unbounded_channel();
        Self {
            center,
            tx,
            rx,
            observations: Vec::new(),
        }
    }

    /// Subscribe to the session notifications posted by `session` and the
    /// accessory notifications from any sender. Calling again while already
    /// observing does nothing.
    pub fn observe(&mut self, session: ObjectId) {
        if self.is_observing() {
            return;
        }

        for name in NotificationName::SESSION {
            let observation = self.center.add_observer(name, Some(session), self.forwarder());
            self.observations.push(observation);
        }
        for name in NotificationName::ACCESSORY {
            let observation = self.center.add_observer(name, None, self.forwarder());
            self.observations.push(observation);
        }
    }

    /// Drop every subscription and discard anything still queued.
    pub fn stop(&mut self) {
        self.observations.clear();
        while self.rx.try_recv().is_ok() {}
    }

    pub fn is_observing(&self) -> bool {
        !self.observations.is_empty()
    }

    /// Sender for stack delegates that feed the same queue.
    pub fn sender(&self) -> tokio_mpsc::UnboundedSender<Inbound> {
        self.tx.clone()
    }

    pub fn try_next(&mut self) -> Option<Inbound> {
        self.rx.try_recv().ok()
    }

    pub async fn next(&mut self) -> Option<Inbound> {
        self.rx.recv().await
    }

    fn forwarder(&self) -> impl Fn(&Notification) + Send + Sync + 'static {
        let tx = self.tx.clone();
        move |notification: &Notification| {
            if let Err(e) = tx.send(Inbound::Notification(notification.clone())) {
                tracing::debug!("Dropped {} notification (session gone)", e.0.name());
            }
        }
    }
}

impl Inbound {
    fn name(&self) -> String {
        match self {
            Self::Notification(notification) => notification.name.to_string(),
            Self::Stack(callback) => format!("{:?}", callback),
        }
    }
}

//! Broadcast points for "microphones changed" and "speakers changed".

use std::pin::Pin;
use std::sync::Mutex;
use std::task::{Context, Poll};

use futures::Stream as FuturesStream;
use tokio::sync::mpsc as tokio_mpsc;

/// Delivered to subscribers when a resync detects a real change.
///
/// Carries no device data; subscribers re-query the session. `revision` is
/// the catalog revision that produced the signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeSignal {
    pub revision: u64,
}

/// A single broadcast point with any number of subscribers.
///
/// Every subscriber sees every signal sent after it subscribed. Channels
/// are unbounded so a slow subscriber never misses a signal.
#[derive(Debug, Default)]
pub struct ChangeNotifier {
    subscribers: Mutex<Vec<tokio_mpsc::UnboundedSender<ChangeSignal>>>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> ChangeSubscription {
        let (tx, rx) = tokio_mpsc::unbounded_channel();
        self.lock().push(tx);
        ChangeSubscription { receiver: rx }
    }

    /// Send `signal` to every live subscriber, dropping closed ones.
    pub fn broadcast(&self, signal: ChangeSignal) {
        self.lock().retain(|tx| tx.send(signal).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self.lock();
        subscribers.retain(|tx| !tx.is_closed());
        subscribers.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<tokio_mpsc::UnboundedSender<ChangeSignal>>> {
        self.subscribers.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// The microphone and speaker broadcast points owned by a session.
#[derive(Debug, Default)]
pub struct SessionNotifiers {
    pub microphones: ChangeNotifier,
    pub speakers: ChangeNotifier,
}

impl SessionNotifiers {
    /// Signal both points. Changes are never attributed to one side.
    pub fn broadcast(&self, revision: u64) {
        let signal = ChangeSignal { revision };
        self.microphones.broadcast(signal);
        self.speakers.broadcast(signal);
    }
}

/// Receiving end of a [`ChangeNotifier`] subscription.
pub struct ChangeSubscription {
    receiver: tokio_mpsc::UnboundedReceiver<ChangeSignal>,
}

impl ChangeSubscription {
    /// Next queued signal, without waiting.
    pub fn try_next(&mut self) -> Option<ChangeSignal> {
        self.receiver.try_recv().ok()
    }

    /// Drain and count queued signals.
    pub fn drain(&mut self) -> usize {
        let mut count = 0;
        while self.try_next().is_some() {
            count += 1;
        }
        count
    }
}

impl FuturesStream for ChangeSubscription {
    type Item = ChangeSignal;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.receiver).poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;

    #[test]
    fn test_every_subscriber_receives_broadcast() {
        let notifier = ChangeNotifier::new();
        let mut first = notifier.subscribe();
        let mut second = notifier.subscribe();

        notifier.broadcast(ChangeSignal { revision: 1 });

        assert_eq!(first.try_next(), Some(ChangeSignal { revision: 1 }));
        assert_eq!(second.try_next(), Some(ChangeSignal { revision: 1 }));
    }

    #[test]
    fn test_late_subscriber_misses_earlier_signals() {
        let notifier = ChangeNotifier::new();
        notifier.broadcast(ChangeSignal { revision: 1 });

        let mut late = notifier.subscribe();
        assert_eq!(late.try_next(), None);

        notifier.broadcast(ChangeSignal { revision: 2 });
        assert_eq!(late.try_next(), Some(ChangeSignal { revision: 2 }));
    }

    #[test]
    fn test_dropped_subscribers_are_pruned() {
        let notifier = ChangeNotifier::new();
        let kept = notifier.subscribe();
        drop(notifier.subscribe());

        notifier.broadcast(ChangeSignal { revision: 1 });
        assert_eq!(notifier.subscriber_count(), 1);
        drop(kept);
        assert_eq!(notifier.subscriber_count(), 0);
    }

    #[test]
    fn test_session_notifiers_signal_both_points() {
        let notifiers = SessionNotifiers::default();
        let mut mics = notifiers.microphones.subscribe();
        let mut speakers = notifiers.speakers.subscribe();

        notifiers.broadcast(4);

        assert_eq!(mics.drain(), 1);
        assert_eq!(speakers.drain(), 1);
    }

    #[tokio::test]
    async fn test_subscription_is_a_stream() {
        let notifier = ChangeNotifier::new();
        let mut subscription = notifier.subscribe();

        notifier.broadcast(ChangeSignal { revision: 9 });

        assert_eq!(subscription.next().await, Some(ChangeSignal { revision: 9 }));
    }
}

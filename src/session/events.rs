use tokio::sync::mpsc;

use crate::session::navigation::Frame;
use crate::session::queue::QueueKind;

/// Notifications the session fans out to presentation layers (mini player,
/// tray summary, list views). The core never depends on a concrete view
/// type; subscribers get a receiver and consume what they care about.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The whole queue sequence was replaced.
    QueueReplaced {
        kind: QueueKind,
        len: usize,
        position: Option<usize>,
    },
    /// A single slot was swapped in place (placeholder → resolved track);
    /// views patch one row instead of re-rendering the list.
    SlotUpdated { index: usize, key: String },
    PositionChanged { index: usize },
    /// Back affordance follows `depth`: hidden at depth 1.
    NavigationChanged { depth: usize, top: Frame },
    /// Non-fatal "can't play this track" notice.
    PlaybackUnavailable { key: String, message: String },
    LibraryUpdated {
        tracks: usize,
        albums: usize,
        playlists: usize,
    },
    RescanFailed { message: String },
}

/// Typed publish/subscribe bus owned by the orchestrator.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<mpsc::UnboundedSender<SessionEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<SessionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Fan the event out, dropping subscribers that went away.
    pub fn emit(&mut self, event: SessionEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_reach_every_live_subscriber() {
        let mut bus = EventBus::new();
        let mut a = bus.subscribe();
        let b = bus.subscribe();
        drop(b);

        bus.emit(SessionEvent::PositionChanged { index: 3 });
        assert_eq!(
            a.try_recv().unwrap(),
            SessionEvent::PositionChanged { index: 3 }
        );
        // The dropped subscriber was pruned on emit.
        bus.emit(SessionEvent::PositionChanged { index: 4 });
        assert_eq!(
            a.try_recv().unwrap(),
            SessionEvent::PositionChanged { index: 4 }
        );
    }
}

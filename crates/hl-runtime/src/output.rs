use std::sync::mpsc::{self, Receiver, Sender};

use hl_core::{OutputEvent, OutputKind};

/// Ordered event log of an executor plus its live subscribers.
///
/// Sequence numbers keep counting across [`OutputLog::clear`].
#[derive(Debug, Default)]
pub struct OutputLog {
    events: Vec<OutputEvent>,
    next_sequence: u64,
    subscribers: Vec<Sender<OutputEvent>>,
}

impl OutputLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, kind: OutputKind, payload: impl Into<String>, timestamp_ms: u64) {
        let event = OutputEvent {
            kind,
            payload: payload.into(),
            sequence: self.next_sequence,
            timestamp_ms,
        };
        self.next_sequence += 1;
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
        self.events.push(event);
    }

    pub fn events(&self) -> &[OutputEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn subscribe(&mut self) -> Receiver<OutputEvent> {
        let (sender, receiver) = mpsc::channel();
        self.subscribers.push(sender);
        receiver
    }
}

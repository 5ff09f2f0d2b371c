// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Engine status events for UI layers to observe.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tracing::debug;

/// Capacity of the status event channel. Events beyond this are dropped
/// rather than blocking the engine.
const EVENT_CAPACITY: usize = 256;

/// Something observable that happened inside the engine.
#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    PadTriggered { sound_id: String, velocity: f32 },
    PatternStarted { pattern_id: String },
    PatternFinished { pattern_id: String },
    KitSwitched { kit_id: String },
    SettingsUpdated,
    RecordingStarted,
    RecordingFinished { recording_id: String },
}

/// Fans engine events out to subscribers. Sending never blocks; if no one is
/// draining the channel, events are dropped.
#[derive(Clone)]
pub struct EventBus {
    tx: Sender<EngineEvent>,
    rx: Receiver<EngineEvent>,
}

impl EventBus {
    /// Creates a new event bus.
    pub fn new() -> EventBus {
        let (tx, rx) = bounded(EVENT_CAPACITY);
        EventBus { tx, rx }
    }

    /// Emits an event. Best-effort; a full channel drops the event.
    pub fn emit(&self, event: EngineEvent) {
        if let Err(TrySendError::Full(event)) = self.tx.try_send(event) {
            debug!(event = ?event, "Event channel full, dropping event");
        }
    }

    /// Returns a receiver for engine events. Receivers share the stream;
    /// each event is delivered to one receiver.
    pub fn subscribe(&self) -> Receiver<EngineEvent> {
        self.rx.clone()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        EventBus::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_are_delivered_in_order() {
        let bus = EventBus::new();
        let rx = bus.subscribe();

        bus.emit(EngineEvent::RecordingStarted);
        bus.emit(EngineEvent::PadTriggered {
            sound_id: "kick".to_string(),
            velocity: 1.0,
        });

        assert_eq!(rx.try_recv().unwrap(), EngineEvent::RecordingStarted);
        assert_eq!(
            rx.try_recv().unwrap(),
            EngineEvent::PadTriggered {
                sound_id: "kick".to_string(),
                velocity: 1.0,
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_emit_never_blocks_when_full() {
        let bus = EventBus::new();
        for _ in 0..EVENT_CAPACITY + 10 {
            bus.emit(EngineEvent::SettingsUpdated);
        }

        let rx = bus.subscribe();
        assert_eq!(rx.len(), EVENT_CAPACITY);
    }
}

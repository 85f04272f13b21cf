use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    On,
    Off,
}

/// A note-on or note-off already placed on the absolute tick timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTimedEvent {
    pub tick: u64,
    pub kind: EventKind,
    pub pitch: u8,
    pub velocity: u8,
}

impl RawTimedEvent {
    pub fn on(tick: u64, pitch: u8, velocity: u8) -> Self {
        Self {
            tick,
            kind: EventKind::On,
            pitch,
            velocity,
        }
    }

    pub fn off(tick: u64, pitch: u8, velocity: u8) -> Self {
        Self {
            tick,
            kind: EventKind::Off,
            pitch,
            velocity,
        }
    }
}

//! Annotated events on the source video timeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A labeled time interval within the source video.
///
/// Events carry no identity of their own; their position in the
/// session's event list determines export ordering and numbering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Free-form label, usually one of [`EventLabel`]
    pub label: String,
    /// Start offset in seconds
    pub start_s: f64,
    /// End offset in seconds, always greater than `start_s`
    pub end_s: f64,
}

impl Event {
    pub fn new(label: impl Into<String>, start_s: f64, end_s: f64) -> Self {
        Self {
            label: label.into(),
            start_s,
            end_s,
        }
    }
}

/// Event categories offered to the annotator.
///
/// Advisory only: the event store accepts any label string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EventLabel {
    #[default]
    Shot,
    Possession,
    #[serde(rename = "Foul/TO")]
    FoulTurnover,
    Other,
}

impl EventLabel {
    /// All labels in menu order.
    pub const ALL: [EventLabel; 4] = [
        EventLabel::Shot,
        EventLabel::Possession,
        EventLabel::FoulTurnover,
        EventLabel::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventLabel::Shot => "Shot",
            EventLabel::Possession => "Possession",
            EventLabel::FoulTurnover => "Foul/TO",
            EventLabel::Other => "Other",
        }
    }
}

impl fmt::Display for EventLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<EventLabel> for String {
    fn from(label: EventLabel) -> Self {
        label.as_str().to_string()
    }
}

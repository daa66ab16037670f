//! JSON event manifests for non-interactive use.
//!
//! ```json
//! [
//!   {"label": "Shot", "start": "00:00", "end": "00:05"},
//!   {"label": "Foul/TO", "start": 10, "end": "0:12.5"}
//! ]
//! ```

use serde::{Deserialize, Serialize};

/// A bound as written in a manifest: timestamp text or plain seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeText {
    Text(String),
    Seconds(f64),
}

impl TimeText {
    /// Text form accepted by the timestamp parser.
    pub fn as_text(&self) -> String {
        match self {
            TimeText::Text(text) => text.clone(),
            TimeText::Seconds(secs) => secs.to_string(),
        }
    }
}

/// One manifest row, validated later by the event store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub label: String,
    pub start: TimeText,
    pub end: TimeText,
}

/// Parse a manifest document.
pub fn parse_manifest(json: &[u8]) -> Result<Vec<ManifestEntry>, serde_json::Error> {
    serde_json::from_slice(json)
}

//! Shared data models for hoopclip.
//!
//! This crate provides Serde-serializable types for:
//! - Annotated timeline events and their labels
//! - Timestamp parsing for human-entered bounds
//! - Per-clip export results and output naming
//! - Encoding configuration

pub mod clip;
pub mod encoding;
pub mod event;
pub mod timestamp;

// Re-export common types
pub use clip::{clip_filename, sanitize_label, ClipResult, ClipStatus};
pub use encoding::EncodingConfig;
pub use event::{Event, EventLabel};
pub use timestamp::{format_seconds, parse_timestamp, TimestampError};

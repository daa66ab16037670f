//! Ordered, validated event list for one annotation session.

use tracing::{debug, info};

use hoopclip_models::{parse_timestamp, Event};

use crate::error::{ValidationError, ValidationResult};

/// The session's events in insertion order.
///
/// Order is significant: it decides CSV row order and clip numbering.
/// Duplicates and overlapping intervals are accepted.
#[derive(Debug, Clone, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse, validate and append an event.
    ///
    /// On error the store is left untouched.
    pub fn add(
        &mut self,
        label: impl Into<String>,
        start_text: &str,
        end_text: &str,
    ) -> ValidationResult<()> {
        let label = label.into();
        let start_s = parse_timestamp(start_text)?;
        let end_s = parse_timestamp(end_text)?;

        if start_s < 0.0 {
            return Err(ValidationError::NegativeStart(start_s));
        }
        if end_s <= start_s {
            return Err(ValidationError::NonPositiveDuration { start_s, end_s });
        }

        info!(
            label = %label,
            start_s = start_s,
            end_s = end_s,
            position = self.events.len() + 1,
            "Event added"
        );
        self.events.push(Event::new(label, start_s, end_s));
        Ok(())
    }

    /// Remove the event at a 1-based display position.
    pub fn remove(&mut self, position: usize) -> ValidationResult<Event> {
        if position == 0 || position > self.events.len() {
            return Err(ValidationError::NoSuchEvent(position));
        }
        let event = self.events.remove(position - 1);
        debug!(position = position, label = %event.label, "Event removed");
        Ok(event)
    }

    /// Drop every event.
    pub fn clear(&mut self) {
        debug!(cleared = self.events.len(), "Event list cleared");
        self.events.clear();
    }

    /// Events in insertion order.
    pub fn list(&self) -> &[Event] {
        &self.events
    }

    /// Events paired with their 1-based display number.
    pub fn numbered(&self) -> impl Iterator<Item = (usize, &Event)> + '_ {
        self.events.iter().enumerate().map(|(i, e)| (i + 1, e))
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

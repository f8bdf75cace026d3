//! Exporter event statistics.
//!
//! This module provides thread-safe counters for the events the reconciliation
//! loop and the geolocation cache emit.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;

use super::types::EventType;

/// Thread-safe event statistics tracker.
///
/// Every `EventType` is initialized to zero on creation, so lookups never miss.
/// Shared between the scheduler (writer) and the status handler (reader)
/// through an `Arc`.
pub struct ExporterStats {
    events: HashMap<EventType, AtomicUsize>,
}

impl ExporterStats {
    pub fn new() -> Self {
        let mut events = HashMap::new();
        for event in EventType::iter() {
            events.insert(event, AtomicUsize::new(0));
        }
        ExporterStats { events }
    }

    /// Increment an event counter.
    pub fn increment(&self, event: EventType) {
        if let Some(counter) = self.events.get(&event) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to increment event counter for {:?} which is not in the map",
                event
            );
        }
    }

    /// Get the count for an event type.
    pub fn get(&self, event: EventType) -> usize {
        self.events
            .get(&event)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Snapshot of every counter, keyed by the event's string name.
    pub fn as_map(&self) -> HashMap<&'static str, usize> {
        EventType::iter()
            .map(|event| (event.as_str(), self.get(event)))
            .collect()
    }
}

impl Default for ExporterStats {
    fn default() -> Self {
        Self::new()
    }
}

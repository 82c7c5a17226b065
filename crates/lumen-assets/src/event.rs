//! Asset events for change detection.

use crate::key::AssetId;
use crate::payload::{Asset, AssetKind};

/// Events emitted by the asset pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetEvent {
    /// An asset was decoded for the first time.
    Imported {
        /// The id of the asset.
        id: AssetId,
        /// The kind of the asset.
        kind: AssetKind,
        /// The payload version after the decode.
        version: u32,
    },

    /// An existing payload was re-decoded in place.
    Reloaded {
        /// The id of the asset.
        id: AssetId,
        /// The kind of the asset.
        kind: AssetKind,
        /// The new payload version.
        version: u32,
    },

    /// A decode failed.
    ImportFailed {
        /// The id of the asset.
        id: AssetId,
        /// The kind of the asset.
        kind: AssetKind,
        /// Error message.
        error: String,
    },
}

impl AssetEvent {
    /// Get the kind of the asset this event relates to.
    pub fn kind(&self) -> AssetKind {
        match self {
            AssetEvent::Imported { kind, .. } => *kind,
            AssetEvent::Reloaded { kind, .. } => *kind,
            AssetEvent::ImportFailed { kind, .. } => *kind,
        }
    }

    /// Get the asset id.
    pub fn id(&self) -> AssetId {
        match self {
            AssetEvent::Imported { id, .. } => *id,
            AssetEvent::Reloaded { id, .. } => *id,
            AssetEvent::ImportFailed { id, .. } => *id,
        }
    }

    /// Check if this is a first-import event.
    pub fn is_imported(&self) -> bool {
        matches!(self, AssetEvent::Imported { .. })
    }

    /// Check if this is a hot-reload event.
    pub fn is_reloaded(&self) -> bool {
        matches!(self, AssetEvent::Reloaded { .. })
    }

    /// Check if this is a failure event.
    pub fn is_failed(&self) -> bool {
        matches!(self, AssetEvent::ImportFailed { .. })
    }
}

/// A buffer of asset events that can be drained each frame.
#[derive(Debug, Default)]
pub struct AssetEventBuffer {
    events: Vec<AssetEvent>,
}

impl AssetEventBuffer {
    /// Create a new empty event buffer.
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Push an event to the buffer.
    pub fn push(&mut self, event: AssetEvent) {
        self.events.push(event);
    }

    /// Drain all events from the buffer.
    pub fn drain(&mut self) -> impl Iterator<Item = AssetEvent> + '_ {
        self.events.drain(..)
    }

    /// Get an iterator over events without draining.
    pub fn iter(&self) -> impl Iterator<Item = &AssetEvent> {
        self.events.iter()
    }

    /// Check if there are any events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Get the number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Clear all events.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

/// Keep only the events about assets of kind `T`.
pub fn events_of<'a, T: Asset>(
    events: impl Iterator<Item = &'a AssetEvent>,
) -> impl Iterator<Item = &'a AssetEvent> {
    events.filter(|event| event.kind() == T::KIND)
}

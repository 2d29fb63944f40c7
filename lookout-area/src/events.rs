//! Area events emitted by a tick.
//!
//! Overlays consume these instead of diffing the whole entity table every
//! frame.

use lookout_core::{EntityId, EntityState, EntitySubtype, EntityType, NearbyZones};
use serde::Serialize;

use crate::area::EntityKey;

/// Something that happened to one entity during a tick.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AreaEvent {
    /// A key showed up in the entity list for the first time.
    Appeared { key: EntityKey },

    /// Type and subtype were decided.
    Classified {
        key: EntityKey,
        id: EntityId,
        path: String,
        entity_type: EntityType,
        subtype: EntitySubtype,
    },

    /// State changed.
    StateChanged {
        key: EntityKey,
        from: EntityState,
        to: EntityState,
    },

    /// Entered or left a proximity zone.
    ZonesChanged {
        key: EntityKey,
        from: NearbyZones,
        to: NearbyZones,
    },

    /// The entity was dropped from the table.
    Removed {
        key: EntityKey,
    },
}

impl AreaEvent {
    /// Key of the entity this event is about.
    #[must_use]
    pub fn key(&self) -> EntityKey {
        match self {
            Self::Appeared { key }
            | Self::Classified { key, .. }
            | Self::StateChanged { key, .. }
            | Self::ZonesChanged { key, .. }
            | Self::Removed { key } => *key,
        }
    }

    /// Whether overlays need to redraw the entity's marker.
    #[must_use]
    pub fn affects_display(&self) -> bool {
        !matches!(self, Self::Appeared { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_of_every_variant() {
        let key = EntityKey(42);
        let events = [
            AreaEvent::Appeared { key },
            AreaEvent::StateChanged {
                key,
                from: EntityState::None,
                to: EntityState::Useless,
            },
            AreaEvent::Removed { key },
        ];
        assert!(events.iter().all(|e| e.key() == key));
        assert!(!events[0].affects_display());
        assert!(events[1].affects_display());
    }

    #[test]
    fn serializes_with_variant_tag() {
        let json = serde_json::to_value(AreaEvent::Removed { key: EntityKey(7) }).expect("serialize");
        assert_eq!(json["Removed"]["key"], 7);
    }
}

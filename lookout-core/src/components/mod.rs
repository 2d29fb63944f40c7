//! Capability decoders.
//!
//! Each capability ("component" in the game's own terms) is a plain struct
//! decoded in one pass from its remote address. The [`capabilities!`] table
//! below is the single list of known capabilities: it generates the
//! [`ComponentKind`] tag, the type-erased [`Component`] enum the registry
//! caches, the [`Capability`] impls, and the [`decode`] dispatch.

mod actor;
mod magic;
mod spatial;
mod world;

pub use actor::{Buffs, DiesAfterTime, Life, Player, Stats, StatusEffect};
pub use magic::ObjectMagicProperties;
pub use spatial::{Animated, Positioned, Render, Targetable};
pub use world::{Chest, MinimapIcon, Npc, Shrine, Transitionable, TriggerableBlockage};

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::DecodeResult;
use crate::memory::Reader;
use crate::offsets::header;
use crate::types::Address;

/// A decodable capability.
pub trait Capability: Sized + Send + Sync + 'static {
    /// Registry tag.
    const KIND: ComponentKind;

    /// Decode the capability living at `address`.
    ///
    /// # Errors
    /// Any [`crate::DecodeError`]; callers treat it as "capability absent".
    fn decode(reader: &Reader<'_>, address: Address) -> DecodeResult<Self>;

    /// Entity this capability claims to belong to.
    fn owner(&self) -> Address;

    /// Erase into a [`Component`].
    fn into_component(self: Arc<Self>) -> Component;

    /// Recover the concrete capability from a [`Component`] of the same kind.
    fn from_component(component: &Component) -> Option<Arc<Self>>;
}

/// Read the owner backlink from the common component header.
pub(crate) fn read_owner(reader: &Reader<'_>, address: Address) -> DecodeResult<Address> {
    reader.read_ptr(address.offset(header::OWNER))
}

macro_rules! capabilities {
    ($($kind:ident => $ty:ident, $name:literal;)*) => {
        /// Tag for every capability the pipeline knows how to decode.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum ComponentKind {
            $(
                #[doc = concat!("`", $name, "`")]
                $kind,
            )*
        }

        impl ComponentKind {
            /// Every known kind.
            pub const ALL: &'static [Self] = &[$(Self::$kind),*];

            /// Name the game uses in its component lookup table.
            #[must_use]
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$kind => $name,)*
                }
            }

            /// Inverse of [`Self::name`].
            #[must_use]
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(Self::$kind),)*
                    _ => None,
                }
            }
        }

        /// A decoded capability of any kind.
        #[derive(Debug, Clone)]
        pub enum Component {
            $(
                #[doc = concat!("`", $name, "`")]
                $kind(Arc<$ty>),
            )*
        }

        impl Component {
            /// Tag of the wrapped capability.
            #[must_use]
            pub fn kind(&self) -> ComponentKind {
                match self {
                    $(Self::$kind(_) => ComponentKind::$kind,)*
                }
            }

            /// Owner backlink of the wrapped capability.
            #[must_use]
            pub fn owner(&self) -> Address {
                match self {
                    $(Self::$kind(c) => c.owner,)*
                }
            }
        }

        /// Decode a capability by tag.
        ///
        /// # Errors
        /// As the concrete [`Capability::decode`].
        pub fn decode(kind: ComponentKind, reader: &Reader<'_>, address: Address) -> DecodeResult<Component> {
            match kind {
                $(ComponentKind::$kind => $ty::read(reader, address).map(|c| Component::$kind(Arc::new(c))),)*
            }
        }

        $(
            impl Capability for $ty {
                const KIND: ComponentKind = ComponentKind::$kind;

                fn decode(reader: &Reader<'_>, address: Address) -> DecodeResult<Self> {
                    Self::read(reader, address)
                }

                fn owner(&self) -> Address {
                    self.owner
                }

                fn into_component(self: Arc<Self>) -> Component {
                    Component::$kind(self)
                }

                fn from_component(component: &Component) -> Option<Arc<Self>> {
                    match component {
                        Component::$kind(c) => Some(Arc::clone(c)),
                        _ => None,
                    }
                }
            }
        )*
    };
}

capabilities! {
    Render => Render, "Render";
    Chest => Chest, "Chest";
    Player => Player, "Player";
    Shrine => Shrine, "Shrine";
    Life => Life, "Life";
    TriggerableBlockage => TriggerableBlockage, "TriggerableBlockage";
    Positioned => Positioned, "Positioned";
    ObjectMagicProperties => ObjectMagicProperties, "ObjectMagicProperties";
    DiesAfterTime => DiesAfterTime, "DiesAfterTime";
    Targetable => Targetable, "Targetable";
    Npc => Npc, "NPC";
    Buffs => Buffs, "Buffs";
    Stats => Stats, "Stats";
    MinimapIcon => MinimapIcon, "MinimapIcon";
    Animated => Animated, "Animated";
    Transitionable => Transitionable, "Transitionable";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for kind in ComponentKind::ALL {
            assert_eq!(ComponentKind::from_name(kind.name()), Some(*kind));
        }
        assert_eq!(ComponentKind::ALL.len(), 16);
        assert_eq!(ComponentKind::Npc.name(), "NPC");
        assert_eq!(ComponentKind::from_name("Mods"), None);
    }
}

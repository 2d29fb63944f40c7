//! Core type definitions shared by the entity model and classifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Identity Types
// ---------------------------------------------------------------------------

/// An address inside the remote process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub u64);

impl Address {
    /// The null address.
    pub const NULL: Self = Self(0);

    /// Whether this is the null address.
    #[must_use]
    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Address `offset` bytes past this one.
    #[must_use]
    pub fn offset(self, offset: u64) -> Self {
        Self(self.0.wrapping_add(offset))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Entity identifier as reported by the game.
///
/// Only unique while the owning area instance is alive; the game reuses ids
/// across areas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Key into the game's stat table (`Stats.dat` row index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StatKey(pub i32);

// ---------------------------------------------------------------------------
// Spatial
// ---------------------------------------------------------------------------

/// World units per grid cell.
pub const WORLD_TO_GRID: f32 = 250.0 / 23.0;

/// A position in the game's world space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldPosition {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
    /// Z coordinate (height).
    pub z: f32,
}

impl WorldPosition {
    /// Project onto the 2D terrain grid.
    #[must_use]
    pub fn to_grid(self) -> GridPosition {
        GridPosition {
            x: self.x / WORLD_TO_GRID,
            y: self.y / WORLD_TO_GRID,
        }
    }
}

/// A position on the 2D terrain grid. Zones and distances use these, never
/// screen coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GridPosition {
    /// X cell.
    pub x: f32,
    /// Y cell.
    pub y: f32,
}

impl GridPosition {
    /// Create a grid position.
    #[must_use]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance truncated to a whole number of grid cells.
    #[must_use]
    pub fn distance(self, other: Self) -> u32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        // `as` saturates: NaN -> 0, +inf -> u32::MAX.
        (dx * dx + dy * dy).sqrt() as u32
    }
}

impl fmt::Display for GridPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// Rarity
// ---------------------------------------------------------------------------

/// Monster / item rarity as stored by `ObjectMagicProperties`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rarity {
    /// White.
    #[default]
    Normal,
    /// Blue.
    Magic,
    /// Yellow.
    Rare,
    /// Orange.
    Unique,
}

impl Rarity {
    /// Decode the raw integer. Unknown values read as `Normal`.
    #[must_use]
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            1 => Self::Magic,
            2 => Self::Rare,
            3 => Self::Unique,
            _ => Self::Normal,
        }
    }

    /// The raw integer the game stores.
    #[must_use]
    pub fn to_raw(self) -> i32 {
        match self {
            Self::Normal => 0,
            Self::Magic => 1,
            Self::Rare => 2,
            Self::Unique => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_truncates() {
        let a = GridPosition::new(0.0, 0.0);
        assert_eq!(a.distance(GridPosition::new(3.0, 4.0)), 5);
        assert_eq!(a.distance(GridPosition::new(1.0, 1.0)), 1);
        assert_eq!(a.distance(GridPosition::new(0.9, 0.0)), 0);
    }

    #[test]
    fn distance_handles_nan() {
        let a = GridPosition::new(f32::NAN, 0.0);
        assert_eq!(a.distance(GridPosition::default()), 0);
    }

    #[test]
    fn world_to_grid_projection() {
        let w = WorldPosition { x: WORLD_TO_GRID * 10.0, y: 0.0, z: 5.0 };
        let g = w.to_grid();
        assert!((g.x - 10.0).abs() < 1e-3);
        assert!(g.y.abs() < 1e-6);
    }

    #[test]
    fn rarity_round_trip_and_unknown() {
        assert_eq!(Rarity::from_raw(Rarity::Rare.to_raw()), Rarity::Rare);
        assert_eq!(Rarity::from_raw(77), Rarity::Normal);
    }

    #[test]
    fn address_display_and_offset() {
        let a = Address(0x1000).offset(0x20);
        assert_eq!(a, Address(0x1020));
        assert_eq!(a.to_string(), "0x1020");
        assert!(Address::NULL.is_null());
    }
}

//! Proximity zones around the player.

use bitflags::bitflags;

use crate::config::ZoneConfig;

bitflags! {
    /// Which proximity circles an entity is in. `INNER` always comes with
    /// `OUTER`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
    pub struct NearbyZones: u8 {
        /// Within the outer radius.
        const OUTER = 0b0000_0001;
        /// Within the inner radius.
        const INNER = 0b0000_0010;
    }
}

/// Zones for an entity `distance` grid cells from the player.
///
/// Both radii are exclusive.
#[must_use]
pub fn assess(distance: u32, zones: &ZoneConfig) -> NearbyZones {
    if distance < zones.inner_radius {
        NearbyZones::INNER | NearbyZones::OUTER
    } else if distance < zones.outer_radius {
        NearbyZones::OUTER
    } else {
        NearbyZones::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RADII: ZoneConfig = ZoneConfig {
        inner_radius: 10,
        outer_radius: 40,
    };

    #[test]
    fn circles() {
        assert_eq!(assess(5, &RADII), NearbyZones::INNER | NearbyZones::OUTER);
        assert_eq!(assess(25, &RADII), NearbyZones::OUTER);
        assert_eq!(assess(50, &RADII), NearbyZones::empty());
    }

    #[test]
    fn radii_are_exclusive() {
        assert_eq!(assess(10, &RADII), NearbyZones::OUTER);
        assert_eq!(assess(40, &RADII), NearbyZones::empty());
        assert_eq!(assess(0, &RADII), NearbyZones::INNER | NearbyZones::OUTER);
    }

    #[test]
    fn equal_radii_have_no_outer_only_band() {
        let same = ZoneConfig {
            inner_radius: 20,
            outer_radius: 20,
        };
        assert_eq!(assess(19, &same), NearbyZones::all());
        assert_eq!(assess(20, &same), NearbyZones::empty());
    }
}

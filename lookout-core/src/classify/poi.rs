//! User point-of-interest filters over monsters.

use super::Probe;
use crate::config::{PoiFilter, PoiFilterKind};

/// The first filter that matches the monster behind `probe`, with its index.
///
/// `probe` must carry monster facts; without them only path filters can
/// match.
#[must_use]
pub fn first_match<'f>(filters: &'f [PoiFilter], probe: &Probe<'_>) -> Option<(usize, &'f PoiFilter)> {
    filters.iter().enumerate().find(|(_, f)| matches(f, probe))
}

/// Whether one filter matches.
#[must_use]
pub fn matches(filter: &PoiFilter, probe: &Probe<'_>) -> bool {
    let rarity_ok = || {
        probe
            .magic()
            .is_some_and(|m| Some(m.rarity) == filter.rarity)
    };
    let path_ok = || probe.path.starts_with(filter.value.as_str());
    match filter.kind {
        PoiFilterKind::Path => path_ok(),
        PoiFilterKind::PathAndRarity => rarity_ok() && path_ok(),
        PoiFilterKind::Mod => probe.has_mod(&filter.value),
        PoiFilterKind::ModAndRarity => rarity_ok() && probe.has_mod(&filter.value),
        PoiFilterKind::PathAndStat => {
            let stat_present = filter
                .stat
                .is_some_and(|key| probe.mod_stat(key).is_some() || probe.stat(key).is_some());
            stat_present && path_ok()
        }
    }
}

//! Type classification.

use super::rules::{evaluate, Rule, Then, Verdict};
use super::Probe;
use crate::category::{EntitySubtype, EntityType};
use crate::components::{
    Chest, ComponentKind, DiesAfterTime, Life, Npc, ObjectMagicProperties, Player, Positioned,
    Render, Shrine, Targetable, TriggerableBlockage,
};

/// Result of type classification. A few objects are recognised precisely
/// enough at this stage to fix their subtype too.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeAssignment {
    /// The type.
    pub entity_type: EntityType,
    /// Subtype decided together with the type.
    pub preset_subtype: Option<EntitySubtype>,
}

impl TypeAssignment {
    const fn of(entity_type: EntityType) -> Self {
        Self {
            entity_type,
            preset_subtype: None,
        }
    }
}

/// Namespace of Azmeri league objects.
pub const AZMERI_MISC: &str = "Metadata/MiscellaneousObjects/Azmeri/";
/// Azmeri dust converter.
pub const AZMERI_DUST_CONVERTER: &str = "Metadata/MiscellaneousObjects/Azmeri/AzmeriDustConverter";
/// Namespace of Abyss league objects.
pub const ABYSS_MISC: &str = "Metadata/MiscellaneousObjects/Abyss/Abyss";
/// Delirium daemons hidden inside doodads.
pub const DELIRIUM_HIDDEN: &str = "Metadata/Monsters/LeagueAffliction/DoodadDaemons/DoodadDaemon";
/// Delirium volatile objects.
pub const DELIRIUM_VOLATILE: &str = "Metadata/Monsters/LeagueAffliction/Volatile/";

/// Walls with life that are not worth tracking as blockages.
const USELESS_WALLS: &[&str] = &["Metadata/Monsters/AtlasExiles/OrionArenaObjects/OrionBlockingWall"];

static TYPE_RULES: &[Rule<TypeAssignment>] = &[
    Rule { name: "no render", when: |p| !p.has::<Render>(), then: Then::Miss },
    Rule { name: "chest", when: |p| p.has::<Chest>(), then: Then::Is(TypeAssignment::of(EntityType::Chest)) },
    Rule { name: "player", when: |p| p.has::<Player>(), then: Then::Is(TypeAssignment::of(EntityType::Player)) },
    Rule { name: "shrine", when: |p| p.has::<Shrine>(), then: Then::Is(TypeAssignment::of(EntityType::Shrine)) },
    Rule { name: "living", when: |p| p.has::<Life>(), then: Then::Resolve(resolve_living) },
    Rule { name: "npc", when: |p| p.has::<Npc>(), then: Then::Is(TypeAssignment::of(EntityType::Npc)) },
    Rule { name: "azmeri object", when: |p| p.path.starts_with(AZMERI_MISC), then: Then::Resolve(resolve_azmeri) },
    Rule {
        name: "abyss object",
        when: |p| p.path.starts_with(ABYSS_MISC),
        then: Then::Is(TypeAssignment::of(EntityType::ImportantMiscellaneousObject)),
    },
    Rule {
        name: "any renderable",
        when: |p| p.config.classifier.process_all_renderables && p.has::<Positioned>(),
        then: Then::Is(TypeAssignment::of(EntityType::Renderable)),
    },
];

/// Decide the entity's type.
#[must_use]
pub fn classify(probe: &Probe<'_>) -> Verdict<TypeAssignment> {
    evaluate("type", TYPE_RULES, probe)
}

fn resolve_living(p: &Probe<'_>) -> Verdict<TypeAssignment> {
    let is = |t| Verdict::Resolved(TypeAssignment::of(t));

    if p.has::<TriggerableBlockage>() && !p.path_starts_with_any(USELESS_WALLS) {
        return is(EntityType::Blockage);
    }
    let Some(positioned) = p.get::<Positioned>() else {
        return Verdict::Retry;
    };
    if !p.has::<ObjectMagicProperties>() {
        return Verdict::Retry;
    }
    if !positioned.is_friendly() && p.has::<DiesAfterTime>() {
        return match p.get::<Targetable>() {
            Some(t) if t.is_targetable() => is(EntityType::Monster),
            _ => Verdict::Retry,
        };
    }
    if p.path_starts_with_any(&[DELIRIUM_HIDDEN, DELIRIUM_VOLATILE]) {
        return if p.path.contains("BloodBag") {
            is(EntityType::DeliriumBomb)
        } else if p.path.contains("EggFodder") || p.path.contains("GlobSpawn") {
            is(EntityType::DeliriumSpawner)
        } else {
            Verdict::Miss
        };
    }
    if p.lists(ComponentKind::Buffs) {
        return is(EntityType::Monster);
    }
    Verdict::Miss
}

fn resolve_azmeri(p: &Probe<'_>) -> Verdict<TypeAssignment> {
    if !p.has::<Targetable>() {
        Verdict::Resolved(TypeAssignment::of(EntityType::ImportantMiscellaneousObject))
    } else if p.path.starts_with(AZMERI_DUST_CONVERTER) {
        Verdict::Resolved(TypeAssignment {
            entity_type: EntityType::ImportantMiscellaneousObject,
            preset_subtype: Some(EntitySubtype::AzmeriDustConvertor),
        })
    } else {
        Verdict::Resolved(TypeAssignment::of(EntityType::Shrine))
    }
}

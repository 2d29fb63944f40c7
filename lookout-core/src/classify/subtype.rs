//! Subtype classification, one rule table per type.

use tracing::debug;

use super::poi;
use super::rules::{evaluate, first_contains, first_prefix, PathRule, Rule, Then, Verdict};
use super::Probe;
use crate::category::{EntitySubtype, EntityType};
use crate::components::{Animated, Buffs, Chest, ComponentKind, MinimapIcon, ObjectMagicProperties, Stats};
use crate::metrics::LookoutCounters;
use crate::COUNTERS;

use crate::category::EntitySubtype as S;

/// Result of subtype classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubtypeAssignment {
    /// The subtype the rules resolved.
    pub subtype: EntitySubtype,
    /// Group of the point-of-interest filter that matched, if any. When set
    /// the displayed subtype is [`EntitySubtype::PoiMonster`].
    pub poi_group: Option<i32>,
}

impl From<EntitySubtype> for SubtypeAssignment {
    fn from(subtype: EntitySubtype) -> Self {
        Self {
            subtype,
            poi_group: None,
        }
    }
}

/// Decide the subtype of an entity of type `entity_type`.
#[must_use]
pub fn classify(probe: &Probe<'_>, entity_type: EntityType) -> Verdict<SubtypeAssignment> {
    let subtype = match entity_type {
        EntityType::Chest => evaluate("chest subtype", CHEST_RULES, probe),
        EntityType::Player => Verdict::Resolved(player(probe)),
        EntityType::ImportantMiscellaneousObject => evaluate("object subtype", OBJECT_RULES, probe),
        EntityType::Shrine => Verdict::Resolved(first_prefix(SHRINES, probe.path).unwrap_or(S::None)),
        EntityType::Npc => Verdict::Resolved(npc(probe)),
        EntityType::Monster => return monster(probe),
        EntityType::Blockage
        | EntityType::DeliriumBomb
        | EntityType::DeliriumSpawner
        | EntityType::Renderable => Verdict::Resolved(S::None),
    };
    match subtype {
        Verdict::Resolved(s) => Verdict::Resolved(s.into()),
        Verdict::Retry => Verdict::Retry,
        Verdict::Miss => Verdict::Miss,
    }
}

// ---------------------------------------------------------------------------
// Chests
// ---------------------------------------------------------------------------

const IMPORTANT_STRONGBOXES: &[&str] = &[
    "Metadata/Chests/StrongBoxes/Arcanist",
    "Metadata/Chests/StrongBoxes/Cartographer",
    "Metadata/Chests/StrongBoxes/StrongboxDivination",
    "Metadata/Chests/StrongBoxes/StrongboxScarab",
];

const SYNTHESIS_AMBUSH: &str = "Metadata/Chests/SynthesisChests/SynthesisChestAmbush";

fn chest_flag(p: &Probe<'_>, flag: fn(&Chest) -> bool) -> bool {
    p.get::<Chest>().is_some_and(|c| flag(&c))
}

static CHEST_RULES: &[Rule<EntitySubtype>] = &[
    Rule { name: "chest unreadable", when: |p| !p.has::<Chest>(), then: Then::Retry },
    Rule {
        name: "azmeri omen chest",
        when: |p| p.path.starts_with("Metadata/Chests/LeagueAzmeri/OmenChest"),
        then: Then::Is(S::ImportantStrongbox),
    },
    Rule {
        name: "azmeri chest",
        when: |p| p.path.starts_with("Metadata/Chests/LeagueAzmeri/"),
        then: Then::Is(S::ChestWithLabel),
    },
    Rule {
        name: "expedition chest",
        when: |p| p.path.starts_with("Metadata/Chests/LeaguesExpedition"),
        then: Then::Is(S::ExpeditionChest),
    },
    Rule { name: "chest with minimap icon", when: |p| p.has::<MinimapIcon>(), then: Then::Miss },
    Rule { name: "legion chest", when: |p| p.path.starts_with("Metadata/Chests/LegionChests"), then: Then::Miss },
    Rule {
        name: "delve chest",
        when: |p| p.path.starts_with("Metadata/Chests/DelveChests/"),
        then: Then::Is(S::DelveChest),
    },
    Rule { name: "breach chest", when: |p| p.path.starts_with("Metadata/Chests/Breach"), then: Then::Is(S::BreachChest) },
    Rule {
        name: "strongbox",
        when: |p| chest_flag(p, |c| c.is_strongbox) || p.path.starts_with(SYNTHESIS_AMBUSH),
        then: Then::Resolve(|p| {
            if p.path_starts_with_any(IMPORTANT_STRONGBOXES) {
                Verdict::Resolved(S::ImportantStrongbox)
            } else {
                Verdict::Resolved(S::Strongbox)
            }
        }),
    },
    Rule {
        name: "labelled chest",
        when: |p| chest_flag(p, |c| c.is_label_visible),
        then: Then::Is(S::ChestWithLabel),
    },
    Rule { name: "plain chest", when: |_| true, then: Then::Is(S::None) },
];

// ---------------------------------------------------------------------------
// Players and NPCs
// ---------------------------------------------------------------------------

fn player(p: &Probe<'_>) -> EntitySubtype {
    if p.local_player_id == Some(p.id) {
        S::PlayerSelf
    } else {
        S::PlayerOther
    }
}

const NPCS: &[PathRule<EntitySubtype>] = &[
    ("Metadata/NPC/League/Azmeri/UniqueDealer", S::AzmeriTraderNpc),
    ("Metadata/NPC/League/Affliction/GlyphsHarvestTree", S::AzmeriHarvestNpc),
];

fn npc(p: &Probe<'_>) -> EntitySubtype {
    let special = &p.config.classifier.special_npc_paths;
    if special.iter().any(|prefix| p.path.starts_with(prefix.as_str())) {
        return S::SpecialNpc;
    }
    first_prefix(NPCS, p.path).unwrap_or(S::None)
}

// ---------------------------------------------------------------------------
// Shrines and league objects
// ---------------------------------------------------------------------------

const SHRINES: &[PathRule<EntitySubtype>] = &[
    (
        "Metadata/MiscellaneousObjects/Azmeri/SacrificeAltarObjects/AzmeriSacrificeAltar",
        S::AzmeriSacrificeAltar,
    ),
    ("Metadata/MiscellaneousObjects/Azmeri/AzmeriFlaskRefill", S::AzmeriWell),
    ("Metadata/MiscellaneousObjects/Azmeri/AzmeriBuffEffigySmall", S::AzmeriExperienceGainShrine),
    ("Metadata/MiscellaneousObjects/Azmeri/AzmeriBuffEffigyMedium", S::AzmeriIncreaseQuantityShrine),
    ("Metadata/MiscellaneousObjects/Azmeri/AzmeriBuffEffigyLarge", S::AzmeriCanNotBeDamagedShrine),
    ("Metadata/MiscellaneousObjects/Azmeri/", S::AzmeriUnknownShrine),
];

const WISPS: &[PathRule<EntitySubtype>] = &[
    ("wisp_primal_sml", S::AzmeriBlueWispSmall),
    ("wisp_primal_med", S::AzmeriBlueWispMedium),
    ("wisp_primal_big", S::AzmeriBlueWispBig),
    ("wisp_warden_sml", S::AzmeriYellowWispSmall),
    ("wisp_warden_med", S::AzmeriYellowWispMedium),
    ("wisp_warden_big", S::AzmeriYellowWispBig),
    ("wisp_vodoo_sml", S::AzmeriPurpleWispSmall),
    ("wisp_vodoo_med", S::AzmeriPurpleWispMedium),
    ("wisp_vodoo_big", S::AzmeriPurpleWispBig),
];

const ABYSS: &[PathRule<EntitySubtype>] = &[
    ("Metadata/MiscellaneousObjects/Abyss/AbyssStartNode", S::AbyssStartNode),
    ("Metadata/MiscellaneousObjects/Abyss/AbyssFinalNode", S::AbyssFinalNode),
    ("Metadata/MiscellaneousObjects/Abyss/AbyssCrack", S::AbyssCrack),
    ("Metadata/MiscellaneousObjects/Abyss/AbyssNodeMini", S::AbyssCrack),
    ("Metadata/MiscellaneousObjects/Abyss/AbyssNode", S::AbyssMidNode),
];

static OBJECT_RULES: &[Rule<EntitySubtype>] = &[
    Rule {
        name: "azmeri light bomb",
        when: |p| p.path.starts_with("Metadata/MiscellaneousObjects/Azmeri/AzmeriLightBomb"),
        then: Then::Is(S::AzmeriLightBomb),
    },
    Rule {
        name: "azmeri refuel",
        when: |p| p.path.starts_with("Metadata/MiscellaneousObjects/Azmeri/AzmeriFuelResupply"),
        then: Then::Is(S::AzmeriRefuel),
    },
    Rule {
        name: "azmeri wisp",
        when: |p| p.path.starts_with("Metadata/MiscellaneousObjects/Azmeri/AzmeriResource"),
        then: Then::Resolve(|p| {
            p.get::<Animated>()
                .and_then(|a| first_contains(WISPS, &a.path))
                .map_or(Verdict::Miss, Verdict::Resolved)
        }),
    },
    Rule {
        name: "abyss node",
        when: |p| first_prefix(ABYSS, p.path).is_some(),
        then: Then::Resolve(|p| Verdict::Resolved(first_prefix(ABYSS, p.path).unwrap_or(S::None))),
    },
    Rule { name: "other object", when: |_| true, then: Then::Is(S::None) },
];

// ---------------------------------------------------------------------------
// Monsters
// ---------------------------------------------------------------------------

const LEGION: &str = "Metadata/Monsters/LegionLeague/";
const HARBINGER: &str = "Metadata/Monsters/Avatar/";
const TORMENTED_SPIRIT: &str = "Metadata/Monsters/Spirit/Tormented";
const BETRAYAL: &str = "Metadata/Monsters/LeagueBetrayal/Betrayal";
const SIRUS_CIVILIAN: &str = "Metadata/Monsters/AtlasExiles/OrionArenaObjects/OriathCivilian";
const RITUAL_VOLATILE: &str = "Metadata/Monsters/LeagueAzmeri/TendrilSentinelVolatile";

const ARCHNEMESIS_NOISE: &[&str] = &[
    "Metadata/Monsters/LeagueArchnemesis/LivingCrystal",
    "Metadata/Monsters/VolatileCore/VolatileCoreArchnemesis",
    "Metadata/Monsters/LeagueArchnemesis/ToxicVolatile",
    "Metadata/Monsters/SummonedPhantasm/SummonedPhantasmIncursionExplode",
];

const MAVEN_NOISE: &[&str] = &[
    "Metadata/Monsters/InvisibleFire/MavenLaserBarrageTarget",
    "Metadata/Monsters/MavenBoss/MavenBrainOrbitDaemon",
    "Metadata/Monsters/MavenBoss/MavenBrainVoidsandDaemon",
    "Metadata/Monsters/MavenBoss/TheMavenMap",
    "Metadata/Monsters/MavenBoss/TheMavenProving",
];

/// Tier 17 boss apparitions. The real bosses in standalone maps share these
/// prefixes and carry "Standalone" in their path.
const TIER17_APPARITIONS: &[&str] = &[
    "Metadata/Monsters/Daemon/DaemonElderTentacle",
    "Metadata/Monsters/AtlasBosses/TheShaperBossProjectiles",
    "Metadata/Monsters/AtlasExiles/AtlasExile5Wild",
    "Metadata/Monsters/AtlasExiles/AtlasExile5Apparition",
    "Metadata/Monsters/AtlasExiles/AtlasExile4Apparition",
    "Metadata/Monsters/AtlasExiles/AtlasExile3Apparition",
    "Metadata/Monsters/AtlasExiles/AtlasExile2Apparition",
    "Metadata/Monsters/AtlasExiles/AtlasExile1Apparition",
];

const CORTEX_NOISE: &[&str] = &[
    "Metadata/Monsters/LeagueSynthesis/SynthesisVenariusBoss",
    "Metadata/Monsters/VolatileCore/SynthesisWormholeVolatile",
];

static MONSTER_RULES: &[Rule<EntitySubtype>] = &[
    Rule {
        name: "legion",
        when: |p| p.path.starts_with(LEGION) && p.has::<Buffs>(),
        then: Then::Resolve(legion),
    },
    Rule {
        name: "yellow bestiary beast",
        when: |p| p.mod_stat(p.config.classifier.stat_keys.bestiary_yellow_beast) == Some(1),
        then: Then::Is(S::YellowBestiaryMonster),
    },
    Rule {
        name: "red bestiary beast",
        when: |p| p.stat(p.config.classifier.stat_keys.capturable_monster) == Some(1),
        then: Then::Is(S::RedBestiaryMonster),
    },
    Rule {
        name: "harbinger",
        when: |p| p.path.starts_with(HARBINGER) && p.has_mod("MonsterCannotBeDamaged"),
        then: Then::Is(S::HarbingerMonster),
    },
    Rule {
        name: "tormented spirit",
        when: |p| p.path.starts_with(TORMENTED_SPIRIT),
        then: Then::Is(S::TormentedSpiritsMonster),
    },
    Rule {
        name: "betrayal target",
        when: |p| p.path.starts_with(BETRAYAL) && p.lists(ComponentKind::Npc),
        then: Then::Is(S::BetrayalEnemyNpc),
    },
    Rule { name: "archnemesis effect", when: |p| p.path_starts_with_any(ARCHNEMESIS_NOISE), then: Then::Miss },
    Rule { name: "maven effect", when: |p| p.path_starts_with_any(MAVEN_NOISE), then: Then::Miss },
    Rule { name: "sirus civilian", when: |p| p.path.contains(SIRUS_CIVILIAN), then: Then::Miss },
    Rule {
        name: "tier 17 apparition",
        when: |p| p.path_starts_with_any(TIER17_APPARITIONS) && !p.path.contains("Standalone"),
        then: Then::Miss,
    },
    Rule { name: "cortex effect", when: |p| p.path_starts_with_any(CORTEX_NOISE), then: Then::Miss },
    Rule { name: "ritual volatile", when: |p| p.path.contains(RITUAL_VOLATILE), then: Then::Miss },
    Rule { name: "pinnacle boss", when: |p| p.has_mod("PinnacleAtlasBoss"), then: Then::Is(S::PinnacleBoss) },
    Rule { name: "plain monster", when: |_| true, then: Then::Is(S::None) },
];

fn legion(p: &Probe<'_>) -> Verdict<EntitySubtype> {
    let rewards = p.get::<Buffs>().is_some_and(|b| b.has("legion_reward_display"));
    Verdict::Resolved(if rewards {
        S::LegionChest
    } else if p.path.contains("ChestEpic") {
        S::LegionEpicChest
    } else if p.path.contains("Chest") {
        S::LegionChest
    } else {
        S::LegionMonster
    })
}

fn monster(probe: &Probe<'_>) -> Verdict<SubtypeAssignment> {
    // Every monster lists both; anything without them is not a monster.
    // Listed but unreadable is a torn read.
    if !probe.lists(ComponentKind::ObjectMagicProperties) || !probe.lists(ComponentKind::Stats) {
        return Verdict::Miss;
    }
    let Some(magic) = probe.get::<ObjectMagicProperties>() else {
        return Verdict::Retry;
    };
    let Some(stats) = probe.registry.try_get::<Stats>(false) else {
        return Verdict::Retry;
    };
    let probe = Probe::new(
        probe.path,
        probe.id,
        probe.registry,
        probe.config,
        probe.local_player_id,
    )
    .with_monster_facts(magic, stats);

    let subtype = match evaluate("monster subtype", MONSTER_RULES, &probe) {
        Verdict::Resolved(s) => s,
        Verdict::Retry => return Verdict::Retry,
        Verdict::Miss => return Verdict::Miss,
    };

    let poi_group = poi::first_match(&probe.config.classifier.poi_filters, &probe).map(|(index, filter)| {
        LookoutCounters::bump(&COUNTERS.poi_overrides);
        debug!(path = probe.path, filter = index, group = filter.group, "point-of-interest match");
        filter.group
    });
    Verdict::Resolved(SubtypeAssignment { subtype, poi_group })
}

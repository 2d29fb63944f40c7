//! Classification categories.

use serde::{Deserialize, Serialize};

/// Coarse kind of an entity. Assigned once and never changed.
///
/// An entity without a type yet carries `None` in an `Option<EntityType>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    /// Openable container.
    Chest,
    /// Non-hostile character.
    Npc,
    /// Player character (local or other).
    Player,
    /// Usable shrine or shrine-like object.
    Shrine,
    /// League mechanic object worth highlighting.
    ImportantMiscellaneousObject,
    /// Door or wall that can be triggered open.
    Blockage,
    /// Anything that fights.
    Monster,
    /// Delirium blood bag that explodes on death.
    DeliriumBomb,
    /// Delirium object that spawns fodder.
    DeliriumSpawner,
    /// Any other positioned object, only with `process_all_renderables`.
    Renderable,
}

/// Finer category within an [`EntityType`]. Assigned once; only the
/// displayed value can later change, through a point-of-interest filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum EntitySubtype {
    /// No finer category applies.
    #[default]
    None,
    PlayerSelf,
    PlayerOther,

    AzmeriSacrificeAltar,
    AzmeriWell,
    AzmeriExperienceGainShrine,
    AzmeriIncreaseQuantityShrine,
    AzmeriCanNotBeDamagedShrine,
    AzmeriUnknownShrine,
    AzmeriDustConvertor,
    AzmeriLightBomb,
    AzmeriRefuel,
    AzmeriBlueWispSmall,
    AzmeriBlueWispMedium,
    AzmeriBlueWispBig,
    AzmeriPurpleWispSmall,
    AzmeriPurpleWispMedium,
    AzmeriPurpleWispBig,
    AzmeriYellowWispSmall,
    AzmeriYellowWispMedium,
    AzmeriYellowWispBig,

    ChestWithLabel,
    DelveChest,
    ExpeditionChest,
    BreachChest,
    ImportantStrongbox,
    Strongbox,
    LegionEpicChest,
    LegionChest,

    SpecialNpc,
    AzmeriTraderNpc,
    AzmeriHarvestNpc,

    LegionMonster,
    YellowBestiaryMonster,
    RedBestiaryMonster,
    HarbingerMonster,
    /// Displayed when a user point-of-interest filter matched.
    PoiMonster,
    TormentedSpiritsMonster,
    BetrayalEnemyNpc,
    PinnacleBoss,

    AbyssCrack,
    AbyssMidNode,
    AbyssFinalNode,
    AbyssStartNode,
}

impl EntitySubtype {
    /// Bestiary capture targets.
    #[must_use]
    pub fn is_bestiary(self) -> bool {
        matches!(self, Self::YellowBestiaryMonster | Self::RedBestiaryMonster)
    }

    /// Legion encounter members.
    #[must_use]
    pub fn is_legion(self) -> bool {
        matches!(self, Self::LegionChest | Self::LegionEpicChest | Self::LegionMonster)
    }
}

/// Per-tick state of an entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityState {
    /// Nothing special.
    #[default]
    None,
    /// No rule could classify the entity. Terminal.
    Unclassifiable,
    /// Dead, opened, captured or otherwise spent. Terminal.
    Useless,
    /// A monster currently on the player's side.
    MonsterFriendly,
    /// A pinnacle boss that is not yet attackable.
    PinnacleBossHidden,
    /// Another player who is the configured party leader.
    PlayerLeader,
    /// Legion member before the monolith is clicked.
    LegionStage0,
    /// Legion member frozen in time and not yet killed.
    LegionStage1Alive,
    /// Legion member killed while frozen, loot pending.
    LegionStage1Dead,
}

impl EntityState {
    /// Terminal states are never left and stop all further decoding.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Unclassifiable | Self::Useless)
    }
}

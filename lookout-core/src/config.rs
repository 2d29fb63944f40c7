//! Configuration for the lookout entity pipeline.
//!
//! Maps directly to `lookout.toml`. A [`LookoutConfig`] is handed to every
//! refresh call as a snapshot; nothing in the pipeline reads process-wide
//! settings.

use serde::{Deserialize, Serialize};

use crate::types::{Rarity, StatKey};

/// Top-level lookout configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LookoutConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Proximity zone radii.
    #[serde(default)]
    pub zones: ZoneConfig,
    /// Classification tuning and user point-of-interest filters.
    #[serde(default)]
    pub classifier: ClassifierConfig,
    /// Sanity caps applied while decoding remote memory.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Tick budget enforcement.
    #[serde(default)]
    pub performance: PerformanceConfig,
}

impl LookoutConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `LookoutError::Config` if the TOML is invalid or fails validation.
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| crate::LookoutError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    /// Returns `LookoutError::Config` describing the first violation.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.zones.inner_radius > self.zones.outer_radius {
            return Err(crate::LookoutError::Config(format!(
                "zones.inner_radius ({}) exceeds zones.outer_radius ({})",
                self.zones.inner_radius, self.zones.outer_radius
            )));
        }
        if self.limits.max_components_per_entity == 0 {
            return Err(crate::LookoutError::Config(
                "limits.max_components_per_entity must be positive".to_string(),
            ));
        }
        for (i, filter) in self.classifier.poi_filters.iter().enumerate() {
            filter
                .validate()
                .map_err(|reason| crate::LookoutError::Config(format!("poi_filters[{i}]: {reason}")))?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General system settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Whether entity processing is enabled at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_level: "info".to_string(),
        }
    }
}

/// Proximity zone radii, in grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// Entities closer than this are in the inner circle.
    #[serde(default = "default_inner_radius")]
    pub inner_radius: u32,
    /// Entities closer than this are in the outer circle.
    #[serde(default = "default_outer_radius")]
    pub outer_radius: u32,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            inner_radius: 30,
            outer_radius: 60,
        }
    }
}

/// Classification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Classify every positioned renderable that no other rule claims.
    #[serde(default)]
    pub process_all_renderables: bool,
    /// Name of the party leader; matching players get `PlayerLeader`.
    #[serde(default)]
    pub leader_name: String,
    /// Path prefixes of NPCs the user always wants highlighted.
    #[serde(default)]
    pub special_npc_paths: Vec<String>,
    /// Ordered point-of-interest filters. The first match wins.
    #[serde(default)]
    pub poi_filters: Vec<PoiFilter>,
    /// Stat table keys the monster rules depend on.
    #[serde(default)]
    pub stat_keys: StatKeys,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            process_all_renderables: false,
            leader_name: String::new(),
            special_npc_paths: Vec::new(),
            poi_filters: Vec::new(),
            stat_keys: StatKeys::default(),
        }
    }
}

/// Stat table keys. These move between game patches, so they live in config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatKeys {
    /// `is_bestiary_yellow_beast`, carried on monster mods.
    #[serde(default = "default_yellow_beast_stat")]
    pub bestiary_yellow_beast: StatKey,
    /// `is_capturable_monster`, carried on the monster's stats.
    #[serde(default = "default_capturable_stat")]
    pub capturable_monster: StatKey,
}

impl Default for StatKeys {
    fn default() -> Self {
        Self {
            bestiary_yellow_beast: default_yellow_beast_stat(),
            capturable_monster: default_capturable_stat(),
        }
    }
}

/// How a point-of-interest filter matches a monster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoiFilterKind {
    /// Path starts with `value`.
    Path,
    /// Path starts with `value` and rarity equals `rarity`.
    PathAndRarity,
    /// A mod named `value` is present.
    Mod,
    /// A mod named `value` is present and rarity equals `rarity`.
    ModAndRarity,
    /// Path starts with `value` and stat `stat` is present (mods or stats).
    PathAndStat,
}

/// One user-defined point-of-interest filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoiFilter {
    /// Match strategy.
    pub kind: PoiFilterKind,
    /// Path prefix or mod name, depending on `kind`.
    pub value: String,
    /// Required rarity for the `*_and_rarity` kinds.
    #[serde(default)]
    pub rarity: Option<Rarity>,
    /// Required stat for `path_and_stat`.
    #[serde(default)]
    pub stat: Option<StatKey>,
    /// Presentation group recorded on the entity when this filter matches.
    #[serde(default)]
    pub group: i32,
}

impl PoiFilter {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.value.is_empty() {
            return Err("value must not be empty".to_string());
        }
        match self.kind {
            PoiFilterKind::PathAndRarity | PoiFilterKind::ModAndRarity if self.rarity.is_none() => {
                Err(format!("{:?} requires a rarity", self.kind))
            }
            PoiFilterKind::PathAndStat if self.stat.is_none() => {
                Err("path_and_stat requires a stat".to_string())
            }
            _ => Ok(()),
        }
    }
}

/// Sanity caps for remote decoding. Anything larger is treated as a torn read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Capacity of an entity's component lookup table.
    #[serde(default = "default_max_components")]
    pub max_components_per_entity: usize,
    /// Longest string (in characters) the reader will follow.
    #[serde(default = "default_max_string_chars")]
    pub max_string_chars: usize,
    /// Longest vector (in elements) the reader will follow.
    #[serde(default = "default_max_vector_len")]
    pub max_vector_len: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_components_per_entity: 50,
            max_string_chars: 512,
            max_vector_len: 4096,
        }
    }
}

/// Tick budget enforcement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceConfig {
    /// Log a warning when one refresh pass exceeds this many milliseconds.
    #[serde(default = "default_tick_budget_ms")]
    pub tick_budget_ms: f32,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self { tick_budget_ms: 4.0 }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_inner_radius() -> u32 { 30 }
fn default_outer_radius() -> u32 { 60 }
fn default_yellow_beast_stat() -> StatKey { StatKey(9_718) }
fn default_capturable_stat() -> StatKey { StatKey(9_720) }
fn default_max_components() -> usize { 50 }
fn default_max_string_chars() -> usize { 512 }
fn default_max_vector_len() -> usize { 4096 }
fn default_tick_budget_ms() -> f32 { 4.0 }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = LookoutConfig::from_toml("").expect("empty config parses");
        assert_eq!(config.zones, ZoneConfig::default());
        assert!(config.general.enabled);
        assert!(config.classifier.poi_filters.is_empty());
        assert_eq!(config.limits.max_components_per_entity, 50);
    }

    #[test]
    fn parses_poi_filters_in_order() {
        let config = LookoutConfig::from_toml(
            r#"
            [zones]
            inner_radius = 10
            outer_radius = 40

            [classifier]
            leader_name = "Tabula"

            [[classifier.poi_filters]]
            kind = "path"
            value = "Metadata/Monsters/Kitava"
            group = 2

            [[classifier.poi_filters]]
            kind = "mod_and_rarity"
            value = "MonsterSplits"
            rarity = "Rare"
            group = 5
            "#,
        )
        .expect("valid config");

        assert_eq!(config.zones.inner_radius, 10);
        assert_eq!(config.classifier.leader_name, "Tabula");
        let filters = &config.classifier.poi_filters;
        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0].kind, PoiFilterKind::Path);
        assert_eq!(filters[1].rarity, Some(Rarity::Rare));
        assert_eq!(filters[1].group, 5);
    }

    #[test]
    fn rejects_inverted_radii() {
        let err = LookoutConfig::from_toml("[zones]\ninner_radius = 50\nouter_radius = 10\n");
        assert!(matches!(err, Err(crate::LookoutError::Config(_))));
    }

    #[test]
    fn rejects_rarity_filter_without_rarity() {
        let err = LookoutConfig::from_toml(
            "[[classifier.poi_filters]]\nkind = \"path_and_rarity\"\nvalue = \"Metadata/Monsters\"\n",
        );
        assert!(matches!(err, Err(crate::LookoutError::Config(msg)) if msg.contains("poi_filters[0]")));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("lookout.toml");
        std::fs::write(&path, "[classifier]\nprocess_all_renderables = true\n").expect("write");
        let config = LookoutConfig::from_file(&path).expect("load");
        assert!(config.classifier.process_all_renderables);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = LookoutConfig::from_file(std::path::Path::new("/nonexistent/lookout.toml"));
        assert!(matches!(err, Err(crate::LookoutError::Io(_))));
    }
}

//! TOML configuration for the command-line adapter.

use std::{fs, path::Path};

use anyhow::{Context, Result as AnyResult};
use monster_defence_core::{
    Cadence, GameError, GridDimensions, Monster, TowerKind, DEFAULT_MAP_COLUMNS,
    DEFAULT_MAP_ROWS, DEFAULT_TILE_SIZE,
};
use monster_defence_system_input::{PickerEntry, TowerPicker};
use monster_defence_world::Rules;
use serde::Deserialize;

/// Raw configuration as written in the TOML file. Every key is optional.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GameConfig {
    /// Edge length of a tile in pixels.
    pub(crate) tile_size: u32,
    /// Number of tile columns.
    pub(crate) map_columns: u32,
    /// Number of tile rows.
    pub(crate) map_rows: u32,
    /// Ticks between two tower volleys.
    pub(crate) fire_cadence: u64,
    /// Ticks between two projectile movement phases.
    pub(crate) movement_cadence: u64,
    /// Removes projectiles that left the play field.
    pub(crate) despawn_out_of_bounds: bool,
    /// Towers offered by the picker, top to bottom.
    pub(crate) picker: Vec<PickerConfig>,
}

/// One `[[picker]]` table.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct PickerConfig {
    /// Tower kind name, matched case-insensitively.
    pub(crate) kind: String,
    /// Monster drawn for the tower.
    pub(crate) monster: String,
}

/// Validated configuration ready to build a world from.
#[derive(Clone, Debug)]
pub(crate) struct Settings {
    /// Simulation rules.
    pub(crate) rules: Rules,
    /// Picker entries in slot order.
    pub(crate) picker: Vec<PickerEntry>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            map_columns: DEFAULT_MAP_COLUMNS,
            map_rows: DEFAULT_MAP_ROWS,
            fire_cadence: Cadence::DEFAULT_FIRE.period(),
            movement_cadence: Cadence::DEFAULT_MOVEMENT.period(),
            despawn_out_of_bounds: true,
            picker: TowerPicker::with_default_roster(DEFAULT_TILE_SIZE)
                .entries()
                .iter()
                .map(|entry| PickerConfig {
                    kind: entry.kind().name().to_owned(),
                    monster: entry.monster().name().to_owned(),
                })
                .collect(),
        }
    }
}

impl GameConfig {
    /// Reads the configuration from `path`, or returns the defaults when no
    /// path was given.
    pub(crate) fn load(path: Option<&Path>) -> AnyResult<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    /// Parses configuration text.
    pub(crate) fn parse(text: &str) -> AnyResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Converts the raw values into typed settings.
    pub(crate) fn validate(&self) -> Result<Settings, GameError> {
        let dimensions = GridDimensions::new(self.map_columns, self.map_rows, self.tile_size)?;
        let rules = Rules::new(dimensions)
            .with_fire_cadence(Cadence::new(self.fire_cadence)?)
            .with_movement_cadence(Cadence::new(self.movement_cadence)?)
            .with_despawn_out_of_bounds(self.despawn_out_of_bounds);

        let picker = self
            .picker
            .iter()
            .map(|entry| -> Result<PickerEntry, GameError> {
                let kind: TowerKind = entry.kind.parse()?;
                Ok(PickerEntry::new(kind, Monster::new(entry.monster.trim())))
            })
            .collect::<Result<Vec<_>, GameError>>()?;

        Ok(Settings { rules, picker })
    }
}

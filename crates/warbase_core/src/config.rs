//! Engine configuration loaded from RON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::buildings::CAPTURE_TICKS;
use crate::economy::Resources;
use crate::error::{EngineError, Result};
use crate::map_generation::BattlefieldConfig;

/// Starting general resource for each faction.
pub const DEFAULT_STARTING_GENERAL: u8 = 20;

/// Minimum external ticks per simulated cycle.
pub const DEFAULT_MIN_TICKS_PER_CYCLE: u32 = 10;

/// Settings for a new game.
///
/// Every field has a default, so a RON file only needs the overrides:
///
/// ```
/// use warbase_core::config::EngineConfig;
///
/// let config = EngineConfig::from_ron_str("(seed: 7, enemy_ai_enabled: false)").unwrap();
/// assert_eq!(config.seed, 7);
/// assert!(!config.enemy_ai_enabled);
/// assert_eq!(config.capture_ticks, 144);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seed for the simulation random source.
    pub seed: u64,
    /// Battlefield layout settings.
    pub battlefield: BattlefieldConfig,
    /// Human player's opening stock.
    pub player_resources: Resources,
    /// Computer player's opening stock.
    pub enemy_resources: Resources,
    /// Throttle floor used by the game loop.
    pub min_ticks_per_cycle: u32,
    /// Ticks needed to capture a building.
    pub capture_ticks: u8,
    /// Whether the computer faction acts at all.
    pub enemy_ai_enabled: bool,
    /// Starting column of the player ship.
    pub player_start_x: i16,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            battlefield: BattlefieldConfig::default(),
            player_resources: Resources::with_general(DEFAULT_STARTING_GENERAL),
            enemy_resources: Resources::with_general(DEFAULT_STARTING_GENERAL),
            min_ticks_per_cycle: DEFAULT_MIN_TICKS_PER_CYCLE,
            capture_ticks: CAPTURE_TICKS,
            enemy_ai_enabled: true,
            player_start_x: 20,
        }
    }
}

impl EngineConfig {
    /// Parse a RON document.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] on malformed input or invalid values.
    pub fn from_ron_str(source: &str) -> Result<Self> {
        let config: Self = ron::from_str(source)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a RON file.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Io`] if the file cannot be read and
    /// [`EngineError::Config`] if it does not parse.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Self::from_ron_str(&source)
    }

    /// Render as pretty RON.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] if serialization fails.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {e}")))
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        if self.capture_ticks == 0 {
            return Err(EngineError::Config("capture_ticks must be positive".into()));
        }
        if !(crate::map::MIN_ROBOT_X..=crate::map::MAX_ROBOT_X).contains(&self.player_start_x) {
            return Err(EngineError::Config(format!(
                "player_start_x {} is outside the playable columns",
                self.player_start_x
            )));
        }
        Ok(())
    }

    /// Same settings with another seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.min_ticks_per_cycle, 10);
        assert_eq!(config.capture_ticks, 144);
        assert_eq!(config.player_resources.general, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ron_round_trip() {
        let config = EngineConfig::default().with_seed(42);
        let text = config.to_ron_string().unwrap();
        assert_eq!(EngineConfig::from_ron_str(&text).unwrap(), config);
    }

    #[test]
    fn test_partial_document_uses_defaults() {
        let config = EngineConfig::from_ron_str("(capture_ticks: 12)").unwrap();
        assert_eq!(config.capture_ticks, 12);
        assert_eq!(config.seed, EngineConfig::default().seed);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = EngineConfig::from_ron_str("(capture_ticks: 0)").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
        let err = EngineConfig::from_ron_str("(player_start_x: 3)").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
        assert!(EngineConfig::from_ron_str("not ron").is_err());
    }
}

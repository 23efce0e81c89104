//! Engine configuration: the seat roster and the blind schedule.
//!
//! Both are plain data documents; `HOLDEM_CONFIG` may point at a JSON file
//! overriding the built-in defaults.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::entities::{Chips, GameBlind};

/// One seat descriptor in the starting roster.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SeatConfig {
    pub name: String,
    #[serde(default = "default_true")]
    pub is_online: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// One row of the blind schedule.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct BlindLevel {
    pub level: i32,
    pub small_blind_amount: Chips,
    pub big_blind_amount: Chips,
    pub ante: Chips,
}

impl BlindLevel {
    pub fn to_blind(&self) -> GameBlind {
        GameBlind {
            game_level: self.level,
            small_blind_amount: self.small_blind_amount,
            big_blind_amount: self.big_blind_amount,
            ante: self.ante,
        }
    }
}

/// Complete engine configuration.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct EngineConfig {
    pub seats: Vec<SeatConfig>,
    pub levels: Vec<BlindLevel>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let seats = (1..=4)
            .map(|i| SeatConfig {
                name: format!("Player {i}"),
                is_online: true,
                is_active: true,
            })
            .collect();
        let levels = [
            (1, 50, 100, 100),
            (2, 100, 200, 200),
            (3, 150, 300, 300),
            (4, 200, 400, 400),
            (5, 300, 600, 600),
            (6, 500, 1_000, 1_000),
            (7, 700, 1_400, 1_400),
            (8, 1_000, 2_000, 2_000),
        ]
        .into_iter()
        .map(|(level, small_blind_amount, big_blind_amount, ante)| BlindLevel {
            level,
            small_blind_amount,
            big_blind_amount,
            ante,
        })
        .collect();
        Self { seats, levels }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the file named by `HOLDEM_CONFIG`, or fall back to the
    /// defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var("HOLDEM_CONFIG") {
            Ok(path) => Self::from_json(&std::fs::read_to_string(path)?),
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.seats.len() < 2 {
            return Err(ConfigError::Invalid {
                field: "seats".into(),
                reason: "need at least 2 seats".into(),
            });
        }
        if self.seats.iter().any(|s| s.name.trim().is_empty()) {
            return Err(ConfigError::Invalid {
                field: "seats".into(),
                reason: "seat names must be non-empty".into(),
            });
        }
        if self.levels.is_empty() {
            return Err(ConfigError::Invalid {
                field: "levels".into(),
                reason: "blind schedule must not be empty".into(),
            });
        }
        for (i, level) in self.levels.iter().enumerate() {
            if level.level != i as i32 + 1 {
                return Err(ConfigError::Invalid {
                    field: "levels".into(),
                    reason: format!("levels must be contiguous from 1, found {}", level.level),
                });
            }
            if level.small_blind_amount <= 0 {
                return Err(ConfigError::Invalid {
                    field: "levels".into(),
                    reason: format!("level {}: small blind must be positive", level.level),
                });
            }
            if level.big_blind_amount <= level.small_blind_amount {
                return Err(ConfigError::Invalid {
                    field: "levels".into(),
                    reason: format!(
                        "level {}: big blind must exceed the small blind",
                        level.level
                    ),
                });
            }
            if level.ante < 0 {
                return Err(ConfigError::Invalid {
                    field: "levels".into(),
                    reason: format!("level {}: ante must not be negative", level.level),
                });
            }
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration for {field}: {reason}")]
    Invalid { field: String, reason: String },

    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = EngineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.levels[0].small_blind_amount, 50);
        assert_eq!(config.levels[0].big_blind_amount, 100);
    }

    #[test]
    fn rejects_single_seat() {
        let mut config = EngineConfig::default();
        config.seats.truncate(1);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn rejects_gap_in_levels() {
        let mut config = EngineConfig::default();
        config.levels[1].level = 5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_inverted_blinds() {
        let mut config = EngineConfig::default();
        config.levels[0].big_blind_amount = config.levels[0].small_blind_amount;
        assert!(config.validate().is_err());
    }

    #[test]
    fn json_round_trip() {
        let raw = r#"{
            "seats": [
                {"name": "Alice"},
                {"name": "Bob", "is_online": false}
            ],
            "levels": [
                {"level": 1, "small_blind_amount": 25, "big_blind_amount": 50, "ante": 0}
            ]
        }"#;
        let config = EngineConfig::from_json(raw).unwrap();
        assert_eq!(config.seats.len(), 2);
        assert!(config.seats[0].is_online);
        assert!(!config.seats[1].is_online);
        assert_eq!(config.levels[0].ante, 0);
    }
}

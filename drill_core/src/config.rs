use std::{
    env, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use bevy_ecs::prelude::Resource;
use serde::Deserialize;
use thiserror::Error;

pub const BUILTIN_DRILL_CONFIG: &str = include_str!("data/drill_config.json");
pub const DRILL_CONFIG_ENV: &str = "DRILL_CONFIG_PATH";

/// Tunables for a stress-test session. Defaults reproduce the shipped drill.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DrillConfig {
    pub starting_health: f64,
    pub tick_budget: u32,
    /// Maximum number of simultaneously unresolved faults.
    pub concurrency_cap: usize,
    /// Spawn probability while health is above `high_health_threshold`.
    pub spawn_chance_high: f64,
    pub spawn_chance_low: f64,
    pub high_health_threshold: f64,
    pub resolve_bonus: f64,
    pub fatal_penalty: f64,
    pub ineffective_penalty: f64,
    pub log_capacity: usize,
    pub tick_period_ms: u64,
}

impl Default for DrillConfig {
    fn default() -> Self {
        Self {
            starting_health: 100.0,
            tick_budget: 60,
            concurrency_cap: 4,
            spawn_chance_high: 0.6,
            spawn_chance_low: 0.3,
            high_health_threshold: 80.0,
            resolve_bonus: 10.0,
            fatal_penalty: 20.0,
            ineffective_penalty: 5.0,
            log_capacity: 20,
            tick_period_ms: 1000,
        }
    }
}

impl DrillConfig {
    pub fn builtin() -> Arc<Self> {
        Arc::new(
            serde_json::from_str(BUILTIN_DRILL_CONFIG).expect("builtin drill config should parse"),
        )
    }

    pub fn from_json_str(json: &str) -> Result<Self, DrillConfigError> {
        let config: DrillConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, DrillConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| DrillConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<(), DrillConfigError> {
        if !(self.starting_health > 0.0 && self.starting_health <= 100.0) {
            return Err(DrillConfigError::Invalid {
                field: "starting_health",
                reason: "must lie in (0, 100]",
            });
        }
        if self.tick_budget == 0 {
            return Err(DrillConfigError::Invalid {
                field: "tick_budget",
                reason: "must be positive",
            });
        }
        if self.concurrency_cap == 0 {
            return Err(DrillConfigError::Invalid {
                field: "concurrency_cap",
                reason: "must be positive",
            });
        }
        if self.log_capacity == 0 {
            return Err(DrillConfigError::Invalid {
                field: "log_capacity",
                reason: "must be positive",
            });
        }
        if self.tick_period_ms == 0 {
            return Err(DrillConfigError::Invalid {
                field: "tick_period_ms",
                reason: "must be positive",
            });
        }
        for (field, chance) in [
            ("spawn_chance_high", self.spawn_chance_high),
            ("spawn_chance_low", self.spawn_chance_low),
        ] {
            if !(0.0..=1.0).contains(&chance) {
                return Err(DrillConfigError::Invalid {
                    field,
                    reason: "must be a probability in [0, 1]",
                });
            }
        }
        for (field, amount) in [
            ("resolve_bonus", self.resolve_bonus),
            ("fatal_penalty", self.fatal_penalty),
            ("ineffective_penalty", self.ineffective_penalty),
        ] {
            if !(amount.is_finite() && amount >= 0.0) {
                return Err(DrillConfigError::Invalid {
                    field,
                    reason: "must be a non-negative number",
                });
            }
        }
        Ok(())
    }

    /// Spawn probability for the given health level.
    pub fn spawn_chance(&self, health: f64) -> f64 {
        if health > self.high_health_threshold {
            self.spawn_chance_high
        } else {
            self.spawn_chance_low
        }
    }
}

#[derive(Debug, Error)]
pub enum DrillConfigError {
    #[error("failed to parse drill config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read drill config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid drill config field {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

#[derive(Resource, Debug, Clone)]
pub struct DrillConfigHandle(Arc<DrillConfig>);

impl DrillConfigHandle {
    pub fn new(config: Arc<DrillConfig>) -> Self {
        Self(config)
    }

    pub fn get(&self) -> Arc<DrillConfig> {
        Arc::clone(&self.0)
    }

    pub fn config(&self) -> &DrillConfig {
        &self.0
    }
}

/// Loads the config named by `DRILL_CONFIG_PATH`, falling back to the builtin
/// copy when the variable is unset or the file is unusable.
pub fn load_drill_config_from_env() -> Arc<DrillConfig> {
    match env::var(DRILL_CONFIG_ENV).ok().map(PathBuf::from) {
        Some(path) => load_drill_config_or_builtin(&path),
        None => {
            tracing::info!(target: "drill::config", "drill_config.loaded=builtin");
            DrillConfig::builtin()
        }
    }
}

pub fn load_drill_config_or_builtin(path: &Path) -> Arc<DrillConfig> {
    match DrillConfig::from_file(path) {
        Ok(config) => {
            tracing::info!(
                target: "drill::config",
                path = %path.display(),
                "drill_config.loaded=file"
            );
            Arc::new(config)
        }
        Err(err) => {
            tracing::warn!(
                target: "drill::config",
                path = %path.display(),
                error = %err,
                "drill_config.load_failed"
            );
            DrillConfig::builtin()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_matches_defaults() {
        assert_eq!(*DrillConfig::builtin(), DrillConfig::default());
        assert!(DrillConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let config = DrillConfig::from_json_str(r#"{ "tick_budget": 30, "concurrency_cap": 2 }"#)
            .expect("partial config parses");
        assert_eq!(config.tick_budget, 30);
        assert_eq!(config.concurrency_cap, 2);
        assert_eq!(config.spawn_chance_high, 0.6);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let err = DrillConfig::from_json_str(r#"{ "spawn_chance_low": 1.5 }"#).unwrap_err();
        assert!(matches!(
            err,
            DrillConfigError::Invalid {
                field: "spawn_chance_low",
                ..
            }
        ));
        assert!(DrillConfig::from_json_str(r#"{ "starting_health": 120 }"#).is_err());
        assert!(DrillConfig::from_json_str(r#"{ "tick_budget": 0 }"#).is_err());
    }

    #[test]
    fn spawn_chance_backs_off_at_threshold() {
        let config = DrillConfig::default();
        assert_eq!(config.spawn_chance(100.0), 0.6);
        assert_eq!(config.spawn_chance(80.5), 0.6);
        assert_eq!(config.spawn_chance(80.0), 0.3);
        assert_eq!(config.spawn_chance(10.0), 0.3);
    }

    #[test]
    fn missing_file_falls_back_to_builtin() {
        let config = load_drill_config_or_builtin(Path::new("/nonexistent/drill_config.json"));
        assert_eq!(*config, DrillConfig::default());
    }
}

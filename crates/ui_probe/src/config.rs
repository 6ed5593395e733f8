use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::handlers::DEFAULT_MAX_HANDLER_DEPTH;

pub const TESTING_MODE_ENV_VAR: &str = "UI_PROBE_TESTING_MODE";
pub const TPS_ENV_VAR: &str = "UI_PROBE_TPS";
pub const TIMEOUT_ENV_VAR: &str = "UI_PROBE_TIMEOUT_SECS";

pub const DEFAULT_TARGET_TPS: u32 = 60;
pub const DEFAULT_TIMEOUT_SECONDS: f32 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// While set, live device pointer input is ignored by the scene host so
    /// it cannot interleave with synthetic clicks.
    pub testing_mode: bool,
    pub target_tps: u32,
    pub default_timeout_seconds: f32,
    pub max_handler_depth: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            testing_mode: true,
            target_tps: DEFAULT_TARGET_TPS,
            default_timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            max_handler_depth: DEFAULT_MAX_HANDLER_DEPTH,
        }
    }
}

impl ProbeConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let testing_mode = match lookup(TESTING_MODE_ENV_VAR).as_deref() {
            Some("1") => true,
            Some("0") => false,
            Some(value) => {
                warn!(
                    var = TESTING_MODE_ENV_VAR,
                    value,
                    fallback = defaults.testing_mode,
                    "probe_config_invalid_flag_using_default"
                );
                defaults.testing_mode
            }
            None => defaults.testing_mode,
        };
        let target_tps = parse_or_default(
            TPS_ENV_VAR,
            lookup(TPS_ENV_VAR).as_deref(),
            defaults.target_tps,
            |tps: &u32| *tps > 0,
        );
        let default_timeout_seconds = parse_or_default(
            TIMEOUT_ENV_VAR,
            lookup(TIMEOUT_ENV_VAR).as_deref(),
            defaults.default_timeout_seconds,
            |seconds: &f32| seconds.is_finite() && *seconds >= 0.0,
        );

        Self {
            testing_mode,
            target_tps,
            default_timeout_seconds,
            ..defaults
        }
    }

    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.target_tps.max(1) as f64)
    }

    pub fn tick_seconds(&self) -> f32 {
        self.tick_duration().as_secs_f32()
    }
}

fn parse_or_default<T>(
    var: &'static str,
    raw: Option<&str>,
    fallback: T,
    is_valid: impl Fn(&T) -> bool,
) -> T
where
    T: std::str::FromStr + Copy + std::fmt::Debug,
{
    let Some(value) = raw else {
        return fallback;
    };
    match value.trim().parse::<T>() {
        Ok(parsed) if is_valid(&parsed) => parsed,
        _ => {
            warn!(var, value, fallback = ?fallback, "probe_config_invalid_value_using_default");
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn missing_env_uses_defaults() {
        let config = ProbeConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config, ProbeConfig::default());
        assert!(config.testing_mode);
    }

    #[test]
    fn env_values_override_defaults() {
        let config = ProbeConfig::from_lookup(lookup_from(&[
            (TESTING_MODE_ENV_VAR, "0"),
            (TPS_ENV_VAR, "30"),
            (TIMEOUT_ENV_VAR, "2.5"),
        ]));
        assert!(!config.testing_mode);
        assert_eq!(config.target_tps, 30);
        assert_eq!(config.default_timeout_seconds, 2.5);
    }

    #[test]
    fn invalid_env_values_fall_back() {
        let config = ProbeConfig::from_lookup(lookup_from(&[
            (TESTING_MODE_ENV_VAR, "yes"),
            (TPS_ENV_VAR, "0"),
            (TIMEOUT_ENV_VAR, "soon"),
        ]));
        assert_eq!(config, ProbeConfig::default());
    }

    #[test]
    fn tick_duration_follows_target_tps() {
        let config = ProbeConfig {
            target_tps: 50,
            ..ProbeConfig::default()
        };
        assert_eq!(config.tick_duration(), Duration::from_millis(20));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: ProbeConfig =
            serde_json::from_str(r#"{ "target_tps": 120 }"#).expect("config json");
        assert_eq!(config.target_tps, 120);
        assert_eq!(config.max_handler_depth, DEFAULT_MAX_HANDLER_DEPTH);
        assert!(config.testing_mode);
    }
}

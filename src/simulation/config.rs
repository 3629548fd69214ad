//! Global tunables
//!
//! Everything a control panel can change between ticks. Out-of-range values
//! are clamped or replaced by their documented default and logged; they never
//! fail the simulation.

use anyhow::{anyhow, Result};
use clap::ValueEnum;
use log::warn;
use std::fmt;
use std::str::FromStr;

use super::chooser::{RoutingMode, SelectionMethod, SpeedMode};
use super::timing::LaunchTiming;
use super::types::{TrafficParams, CAR_LENGTH, MIN_LAUNCH_RATE, SPEED_LIMIT};

/// Simulation settings with the defaults of the reference model
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// Cars per speed-limit unit of clock; at least [`MIN_LAUNCH_RATE`]
    pub launch_rate: f64,
    /// In `[0, 1]`
    pub congestion_coef: f64,
    pub timing: LaunchTiming,
    pub routing: RoutingMode,
    pub speed_mode: SpeedMode,
    pub selection: SelectionMethod,
    pub bridge_open: bool,
    /// Stop launching after this many departures; `None` is unlimited
    pub max_cars: Option<usize>,
    pub speed_limit: f64,
    pub car_length: f64,
    /// Fixed RNG seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            launch_rate: 0.55,
            congestion_coef: 0.55,
            timing: LaunchTiming::default(),
            routing: RoutingMode::default(),
            speed_mode: SpeedMode::default(),
            selection: SelectionMethod::default(),
            bridge_open: false,
            max_cars: None,
            speed_limit: SPEED_LIMIT,
            car_length: CAR_LENGTH,
            seed: None,
        }
    }
}

impl SimConfig {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Clamp every tunable into its accepted range
    pub fn normalized(mut self) -> Self {
        self.launch_rate = clamp_launch_rate(self.launch_rate);
        self.congestion_coef = clamp_congestion(self.congestion_coef);
        if self.max_cars == Some(0) {
            self.max_cars = None;
        }
        self
    }

    pub fn traffic_params(&self) -> TrafficParams {
        TrafficParams {
            speed_limit: self.speed_limit,
            car_length: self.car_length,
            congestion_coef: self.congestion_coef,
        }
    }
}

pub fn clamp_launch_rate(rate: f64) -> f64 {
    if rate.is_nan() || rate < MIN_LAUNCH_RATE {
        warn!("Launch rate {rate} raised to {MIN_LAUNCH_RATE}");
        MIN_LAUNCH_RATE
    } else {
        rate
    }
}

pub fn clamp_congestion(coef: f64) -> f64 {
    if coef.is_nan() {
        warn!("Congestion coefficient NaN replaced by 0");
        return 0.0;
    }
    let clamped = coef.clamp(0.0, 1.0);
    if clamped != coef {
        warn!("Congestion coefficient {coef} clamped to {clamped}");
    }
    clamped
}

/// Parse a launch limit typed by a user
///
/// Zero, blank, negative and non-numeric input all mean unlimited.
pub fn parse_max_cars(input: &str) -> Option<usize> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<i64>() {
        Ok(limit) if limit > 0 => usize::try_from(limit).ok(),
        Ok(_) => None,
        Err(_) => {
            warn!("Ignoring max cars {trimmed:?}; launching without limit");
            None
        }
    }
}

/// Lower-case names shared by the CLI and `FromStr`
macro_rules! named_tunable {
    ($($ty:ty),* $(,)?) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self.to_possible_value() {
                    Some(value) => f.write_str(value.get_name()),
                    None => write!(f, "{self:?}"),
                }
            }
        }

        impl FromStr for $ty {
            type Err = anyhow::Error;

            fn from_str(s: &str) -> Result<Self> {
                <$ty as ValueEnum>::from_str(s.trim(), true).map_err(|msg| anyhow!(msg))
            }
        }
    )*};
}

named_tunable!(LaunchTiming, RoutingMode, SpeedMode, SelectionMethod);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SimConfig::default();
        assert_eq!(config.launch_rate, 0.55);
        assert_eq!(config.congestion_coef, 0.55);
        assert_eq!(config.timing, LaunchTiming::Poisson);
        assert_eq!(config.routing, RoutingMode::Selfish);
        assert_eq!(config.speed_mode, SpeedMode::Theoretical);
        assert_eq!(config.selection, SelectionMethod::Minimum);
        assert!(!config.bridge_open);
        assert_eq!(config.max_cars, None);
        assert_eq!(config.traffic_params(), TrafficParams::default());
    }

    #[test]
    fn test_normalized_clamps() {
        let config = SimConfig {
            launch_rate: 0.0,
            congestion_coef: 1.7,
            max_cars: Some(0),
            ..SimConfig::default()
        }
        .normalized();
        assert_eq!(config.launch_rate, MIN_LAUNCH_RATE);
        assert_eq!(config.congestion_coef, 1.0);
        assert_eq!(config.max_cars, None);
        assert_eq!(clamp_congestion(-0.5), 0.0);
        assert_eq!(clamp_congestion(0.3), 0.3);
    }

    #[test]
    fn test_parse_max_cars() {
        assert_eq!(parse_max_cars("250"), Some(250));
        assert_eq!(parse_max_cars(" 12 "), Some(12));
        assert_eq!(parse_max_cars("0"), None);
        assert_eq!(parse_max_cars(""), None);
        assert_eq!(parse_max_cars("-4"), None);
        assert_eq!(parse_max_cars("lots"), None);
    }

    #[test]
    fn test_tunable_names_round_trip() {
        assert_eq!("poisson".parse::<LaunchTiming>().unwrap(), LaunchTiming::Poisson);
        assert_eq!("Periodic".parse::<LaunchTiming>().unwrap(), LaunchTiming::Periodic);
        assert_eq!("random".parse::<RoutingMode>().unwrap(), RoutingMode::Random);
        assert_eq!("historical".parse::<SpeedMode>().unwrap(), SpeedMode::Historical);
        assert_eq!(
            "probabilistic".parse::<SelectionMethod>().unwrap(),
            SelectionMethod::Probabilistic
        );
        assert_eq!(SpeedMode::Actual.to_string(), "actual");
        assert_eq!(RoutingMode::Selfish.to_string(), "selfish");
        assert!("sideways".parse::<SpeedMode>().is_err());
    }
}

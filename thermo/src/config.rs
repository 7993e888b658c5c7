//! Tuning of the adaptive PID engine

use std::io::Read;

use serde::Deserialize;

/// Gains and gates of the adaptive PID engine. Any field missing from a
/// config file keeps its default.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PidConfig {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
    /// Control tick period in seconds
    pub dt_s: f32,
    /// Relative deviation from the set point at which the integral term is
    /// seeded and enabled
    pub integral_closeness: f32,
    /// Largest distance the integral term may drift from its seeded value,
    /// in output volts
    pub integral_max_deviation: f32,
}

impl Default for PidConfig {
    fn default() -> Self {
        Self {
            kp: 10.0,
            ki: 0.05,
            kd: 500.0,
            dt_s: 1.0,
            integral_closeness: 0.1,
            integral_max_deviation: 2.0,
        }
    }
}

impl PidConfig {
    pub fn from_json<R: Read>(reader: R) -> Result<Self, serde_json::Error> {
        serde_json::from_reader(reader)
    }
}

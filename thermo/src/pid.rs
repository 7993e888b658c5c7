//! Adaptive PID engine driving the chamber's peltier voltage.
//!
//! On top of a plain PID this engine:
//! - forgets everything when the set point changes
//! - seeds the integral from [`INTEGRAL_BOOTSTRAP_TABLE`] once the chamber is
//!   close to the set point, so regulation starts without winding up from zero
//! - keeps the integral term within a fixed distance of that seed
//! - averages the derivative over a window of samples taken since the last reset

use log::{debug, info};

use crate::config::PidConfig;
use crate::history::{ErrorHistory, DERIVATIVE_WINDOW};
use crate::table::{lookup_contribution, INTEGRAL_BOOTSTRAP_TABLE};

/// Control state carried from one tick to the next.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ControlState {
    previous_set_point: f32,
    integral: f32,
    integral_enabled: bool,
    integral_estimate: f32,
    history: ErrorHistory<DERIVATIVE_WINDOW>,
    ticks_since_reset: usize,
}

impl ControlState {
    pub fn new() -> Self {
        Self::default()
    }

    fn reset(&mut self) {
        self.history.clear();
        self.ticks_since_reset = 0;
        self.integral_enabled = false;
        self.integral = 0.0;
    }

    #[inline]
    pub fn previous_set_point(&self) -> f32 {
        self.previous_set_point
    }

    #[inline]
    pub fn integral(&self) -> f32 {
        self.integral
    }

    #[inline]
    pub fn integral_enabled(&self) -> bool {
        self.integral_enabled
    }

    #[inline]
    pub fn integral_estimate(&self) -> f32 {
        self.integral_estimate
    }

    #[inline]
    pub fn history(&self) -> &ErrorHistory<DERIVATIVE_WINDOW> {
        &self.history
    }

    #[inline]
    pub fn ticks_since_reset(&self) -> usize {
        self.ticks_since_reset
    }
}

/// Output of one tick, `output` being the sum of the three parts.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ControlOutput {
    pub p: f32,
    pub i: f32,
    pub d: f32,
    pub output: f32,
}

#[derive(Clone, Debug, Default)]
pub struct AdaptivePid {
    config: PidConfig,
}

impl AdaptivePid {
    pub fn new(config: PidConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &PidConfig {
        &self.config
    }

    /// Integral accumulator value that makes the integral term equal the
    /// table's estimate for this set point and outside temperature.
    pub fn assign_integral_value(&self, set_temp: f32, outside_temp: f32) -> f32 {
        if self.config.ki == 0.0 {
            return 0.0;
        }

        lookup_contribution(&INTEGRAL_BOOTSTRAP_TABLE, set_temp - outside_temp) / self.config.ki
    }

    /// Whether the chamber is close enough to the set point to engage the
    /// integral. A zero set point never is.
    fn within_closeness(&self, current_temp: f32, set_temp: f32) -> bool {
        if set_temp == 0.0 {
            return false;
        }

        (current_temp - set_temp).abs() / set_temp.abs() <= self.config.integral_closeness
    }

    /// Run one control tick, updating `state` in place.
    pub fn compute_output(
        &self,
        state: &mut ControlState,
        current_temp: f32,
        set_temp: f32,
        outside_temp: f32,
    ) -> ControlOutput {
        let PidConfig {
            kp,
            ki,
            kd,
            dt_s,
            integral_max_deviation,
            ..
        } = self.config;

        let set_point_changed = set_temp != state.previous_set_point;

        if set_point_changed {
            info!(
                "Set point changed {:.2}C -> {:.2}C, resetting",
                state.previous_set_point, set_temp
            );
            state.reset();
        }

        state.previous_set_point = set_temp;

        let error = set_temp - current_temp;

        // The integral stays off for the tick the set point changed on
        if !set_point_changed
            && !state.integral_enabled
            && self.within_closeness(current_temp, set_temp)
        {
            state.integral_estimate = self.assign_integral_value(set_temp, outside_temp);
            state.integral = state.integral_estimate;
            state.integral_enabled = true;

            info!(
                "Integral enabled at {:.2}C, seeded with {:.3}V",
                current_temp,
                ki * state.integral_estimate
            );
        }

        if state.integral_enabled {
            let integral = state.integral + error * dt_s;

            if (ki * state.integral_estimate - ki * integral).abs() <= integral_max_deviation {
                state.integral = integral;
            }
        }

        state.history.push(error);

        let earliest = state.history.from_end(state.ticks_since_reset);
        let derivative = (state.history.newest() - earliest) / (DERIVATIVE_WINDOW as f32 * dt_s);

        let p = kp * error;
        let i = ki * state.integral;
        let d = kd * derivative;

        state.ticks_since_reset = (state.ticks_since_reset + 1).min(DERIVATIVE_WINDOW);

        debug!(
            "PID error {:.3} p {:.3} i {:.3} d {:.3}",
            error, p, i, d
        );

        ControlOutput {
            p,
            i,
            d,
            output: p + i + d,
        }
    }
}

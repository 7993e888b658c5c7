//! One control tick: read temperatures, run the PID, actuate the LT8722.

use std::fmt::{Debug, Display};

use embedded_hal::spi::SpiDevice;
use lt8722::codec::voltage_to_dac_code;
use lt8722::{AdcSampler, DacCode, LoadMonitor, Lt8722, Register};
use shared::TemperatureSource;

use crate::pid::{AdaptivePid, ControlOutput, ControlState};

#[derive(Debug)]
pub enum TickError<A, S> {
    Actuator(lt8722::Error<A>),
    Sensor(S),
}

impl<A: Debug, S: Debug> Display for TickError<A, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Actuator(e) => write!(f, "Actuator fault: {}", e),
            Self::Sensor(e) => write!(f, "Temperature sensor fault: {:?}", e),
        }
    }
}

impl<A: Debug, S: Debug> std::error::Error for TickError<A, S> {}

impl<A, S> From<lt8722::Error<A>> for TickError<A, S> {
    fn from(value: lt8722::Error<A>) -> Self {
        Self::Actuator(value)
    }
}

/// Output commanded while checking for a load. The AMUX and sense readings
/// agree at 0V whether or not anything is attached.
pub const LOAD_PROBE_V: f32 = 1.0;

/// What happened during a completed tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickReport {
    pub inside_c: f32,
    pub outside_c: f32,
    pub output: ControlOutput,
    pub code: DacCode,
}

/// The chamber's control loop, owning the actuator, both sensors and the
/// state carried between ticks.
pub struct Chamber<SPI, T> {
    pid: AdaptivePid,
    state: ControlState,
    lt8722: Lt8722<SPI>,
    inside: T,
    outside: T,
    set_point_c: f32,
    /// Last code written to the DAC
    output: DacCode,
}

impl<SPI: SpiDevice, T: TemperatureSource> Chamber<SPI, T> {
    pub fn new(pid: AdaptivePid, lt8722: Lt8722<SPI>, inside: T, outside: T, set_point_c: f32) -> Self {
        Self {
            pid,
            state: ControlState::new(),
            lt8722,
            inside,
            outside,
            set_point_c,
            output: voltage_to_dac_code(0.0),
        }
    }

    #[inline]
    pub fn set_point(&self) -> f32 {
        self.set_point_c
    }

    /// Takes effect on the next tick.
    #[inline]
    pub fn set_set_point(&mut self, set_point_c: f32) {
        self.set_point_c = set_point_c;
    }

    #[inline]
    pub fn state(&self) -> &ControlState {
        &self.state
    }

    /// Code the output was last commanded to.
    #[inline]
    pub fn output(&self) -> DacCode {
        self.output
    }

    #[inline]
    pub fn lt8722(&mut self) -> &mut Lt8722<SPI> {
        &mut self.lt8722
    }

    /// Read both temperatures without running the controller.
    pub fn read_temperatures(&mut self) -> Result<(f32, f32), T::Error> {
        Ok((
            self.inside.read_temperature()?,
            self.outside.read_temperature()?,
        ))
    }

    /// Run one full tick. The control state only advances when the new
    /// output reached the actuator.
    pub fn tick(&mut self) -> Result<TickReport, TickError<SPI::Error, T::Error>> {
        let (inside_c, outside_c) = self.read_temperatures().map_err(TickError::Sensor)?;

        let mut state = self.state.clone();

        let output = self
            .pid
            .compute_output(&mut state, inside_c, self.set_point_c, outside_c);

        let code = self.lt8722.set_output_voltage(output.output)?;

        self.state = state;
        self.output = code;

        Ok(TickReport {
            inside_c,
            outside_c,
            output,
            code,
        })
    }

    /// Drive the output to 0V without advancing the controller.
    pub fn hold(&mut self) -> Result<DacCode, lt8722::Error<SPI::Error>> {
        self.output = self.lt8722.set_output_voltage(0.0)?;

        Ok(self.output)
    }

    /// Check for a load with the output briefly at `probe_v`.
    ///
    /// Afterwards the previous output is restored if a load was seen,
    /// otherwise the output is left at 0V.
    pub fn probe_load<A: AdcSampler>(
        &mut self,
        monitor: &LoadMonitor,
        adc: &mut A,
        probe_v: f32,
    ) -> Result<bool, lt8722::Error<SPI::Error>> {
        let connected = self
            .lt8722
            .set_output_voltage(probe_v)
            .and_then(|_| self.lt8722.is_load_connected(monitor, adc));

        let restore = match connected {
            Ok(true) => self.output,
            _ => voltage_to_dac_code(0.0),
        };

        let restored = self.lt8722.write_register(Register::Dac, restore.to_register());

        if restored.is_ok() {
            self.output = restore;
        }

        let connected = connected?;
        restored?;

        Ok(connected)
    }
}

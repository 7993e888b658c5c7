//! Detect whether a load is attached to the regulator output.
//!
//! The output voltage reported through the AMUX is compared against an
//! external ADC channel sensing the same node. With nothing attached the two
//! disagree, so a difference beyond the tolerance means no load.

use embedded_hal::spi::SpiDevice;
use log::{debug, warn};

use crate::codec::{amux_channel_to_voltage, AmuxChannel};
use crate::{Error, Lt8722, Register};

/// Default allowed disagreement between the two readings, in volts.
pub const LOAD_TOLERANCE_V: f32 = 0.5;

/// Source of external ADC samples, in volts at the sensed node.
pub trait AdcSampler {
    /// Sample `channel`, `None` if the conversion failed.
    fn sample_channel(&mut self, channel: u8) -> Option<f32>;
}

impl<F: FnMut(u8) -> Option<f32>> AdcSampler for F {
    #[inline]
    fn sample_channel(&mut self, channel: u8) -> Option<f32> {
        self(channel)
    }
}

/// Wiring and tolerance of the load check.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LoadMonitor {
    /// ADC channel wired to the LT8722 AOUT pin.
    pub aout_channel: u8,
    /// ADC channel wired to the regulator output.
    pub sense_channel: u8,
    pub tolerance_v: f32,
}

impl Default for LoadMonitor {
    fn default() -> Self {
        Self {
            aout_channel: 0,
            sense_channel: 1,
            tolerance_v: LOAD_TOLERANCE_V,
        }
    }
}

impl<SPI: SpiDevice> Lt8722<SPI> {
    /// Advisory check for a connected load. Leaves the AMUX on `Vout`.
    pub fn is_load_connected<A: AdcSampler>(
        &mut self,
        monitor: &LoadMonitor,
        adc: &mut A,
    ) -> Result<bool, Error<SPI::Error>> {
        self.select_amux(AmuxChannel::Vout)?;

        let amux = self.read_register(Register::Amux)?;

        if AmuxChannel::decode(amux) != Some(AmuxChannel::Vout) {
            warn!("AMUX did not take the Vout selector, reads {:#04x}", amux);
            return Err(Error::Amux(amux));
        }

        let aout_v = adc
            .sample_channel(monitor.aout_channel)
            .ok_or(Error::Adc(monitor.aout_channel))?;

        let reported = amux_channel_to_voltage(amux, aout_v);

        let sensed_v = adc
            .sample_channel(monitor.sense_channel)
            .ok_or(Error::Adc(monitor.sense_channel))?;

        let connected = (reported.value - sensed_v).abs() <= monitor.tolerance_v;

        debug!(
            "Load check, reported {:.3}V sensed {:.3}V",
            reported.value, sensed_v
        );

        if !connected {
            warn!(
                "No load detected, reported {:.3}V but sensed {:.3}V",
                reported.value, sensed_v
            );
        }

        Ok(connected)
    }
}

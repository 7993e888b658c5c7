//! Conversions between output voltage, DAC codes and AMUX readings.

use embedded_hal::spi::SpiDevice;
use enum_primitive_derive::Primitive;
use log::debug;
use num_traits::FromPrimitive;

use crate::{Error, Lt8722, Register};

/// Most positive output the regulator is driven to.
pub const MAX_POS_VOUT: f64 = 10.14;
/// Most negative output the regulator is driven to.
pub const MAX_NEG_VOUT: f64 = -10.50;

/// Code for `MAX_POS_VOUT`, never go below this.
pub const MIN_POS_DAC_CODE: DacCode = DacCode(0xFF7A_0000_u32 as i32);
/// Code for `MAX_NEG_VOUT`, never go above this.
pub const MAX_NEG_DAC_CODE: DacCode = DacCode(0x008B_0000);

/// Slope of the code/voltage line, negative since code rises as voltage falls.
const CODES_PER_VOLT: f64 =
    (MIN_POS_DAC_CODE.0 as f64 - MAX_NEG_DAC_CODE.0 as f64) / (MAX_POS_VOUT - MAX_NEG_VOUT);

/// Reference the AMUX output is centred on.
const AOUT_OFFSET_V: f32 = 1.25;
/// Attenuation of the output voltage onto the AMUX pin.
const AOUT_VOUT_GAIN: f32 = 16.0;
/// Output current per volt on the AMUX pin.
const AOUT_IOUT_GAIN_A: f32 = 8.0;

/// Selector bits of the AMUX register, including AOUT enable.
const AMUX_SELECT_MASK: u32 = 0x7F;

/// Signed DAC code as written to the DAC register.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct DacCode(pub i32);

impl DacCode {
    #[inline]
    pub fn to_register(self) -> u32 {
        self.0 as u32
    }

    #[inline]
    pub fn from_register(raw: u32) -> Self {
        Self(raw as i32)
    }
}

/// Clamp `volts` into the safe output range and convert to the nearest DAC code.
///
/// NaN is treated as a request for 0 V.
pub fn voltage_to_dac_code(volts: f32) -> DacCode {
    let requested = match volts.is_nan() {
        true => 0.0,
        false => volts as f64,
    };

    let clamped = requested.clamp(MAX_NEG_VOUT, MAX_POS_VOUT);

    if clamped != requested {
        debug!("Output saturated, requested {:.3}V got {:.3}V", requested, clamped);
    }

    let code = MAX_NEG_DAC_CODE.0 as f64 + (clamped - MAX_NEG_VOUT) * CODES_PER_VOLT;

    DacCode(code.round() as i32)
}

pub fn dac_code_to_voltage(code: DacCode) -> f32 {
    (MAX_NEG_VOUT + (code.0 as f64 - MAX_NEG_DAC_CODE.0 as f64) / CODES_PER_VOLT) as f32
}

/// Analog signals the AMUX can route to the AOUT pin.
#[repr(u8)]
#[derive(Primitive, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AmuxChannel {
    Vout = 0x43,
    Iout = 0x44,
    V1P25 = 0x46,
    V1P65 = 0x47,
}

impl AmuxChannel {
    /// Decode the selector held in an AMUX register value, `None` for a
    /// selector this driver never writes.
    #[inline]
    pub fn decode(raw: u32) -> Option<Self> {
        Self::from_u32(raw & AMUX_SELECT_MASK)
    }

    /// Decode the selector held in an AMUX register value.
    ///
    /// # Panics
    /// Panics on a selector this driver never writes.
    pub fn from_register(raw: u32) -> Self {
        match Self::decode(raw) {
            Some(channel) => channel,
            None => panic!("Unrecognized AMUX selector {:#04x}", raw & AMUX_SELECT_MASK),
        }
    }

    #[inline]
    pub fn to_register(self) -> u32 {
        self as u32
    }
}

/// A reading taken through the AMUX, volts or amps depending on channel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Measurement {
    pub channel: AmuxChannel,
    pub value: f32,
}

/// Scale a voltage sampled on the AOUT pin to the quantity selected by the
/// AMUX register value `raw_register_value`.
pub fn amux_channel_to_voltage(raw_register_value: u32, aout_v: f32) -> Measurement {
    let channel = AmuxChannel::from_register(raw_register_value);

    let value = match channel {
        AmuxChannel::Vout => (aout_v - AOUT_OFFSET_V) * AOUT_VOUT_GAIN,
        AmuxChannel::Iout => (aout_v - AOUT_OFFSET_V) * AOUT_IOUT_GAIN_A,
        AmuxChannel::V1P25 | AmuxChannel::V1P65 => aout_v,
    };

    Measurement { channel, value }
}

impl<SPI: SpiDevice> Lt8722<SPI> {
    /// Command a new output voltage, clamped into the safe range.
    pub fn set_output_voltage(&mut self, volts: f32) -> Result<DacCode, Error<SPI::Error>> {
        let code = voltage_to_dac_code(volts);

        self.write_register(Register::Dac, code.to_register())?;

        Ok(code)
    }

    /// Voltage currently commanded by the DAC register.
    pub fn read_output_voltage(&mut self) -> Result<f32, Error<SPI::Error>> {
        let raw = self.read_register(Register::Dac)?;

        Ok(dac_code_to_voltage(DacCode::from_register(raw)))
    }

    /// Route `channel` to the AOUT pin.
    pub fn select_amux(&mut self, channel: AmuxChannel) -> Result<(), Error<SPI::Error>> {
        self.write_register(Register::Amux, channel.to_register())
    }

    /// Write the negative current limit DAC.
    pub fn set_current_limit(&mut self, code: u32) -> Result<(), Error<SPI::Error>> {
        self.write_register(Register::DacIlimn, code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimLt8722;

    #[test]
    fn boundary_codes() {
        assert_eq!(voltage_to_dac_code(10.14), MIN_POS_DAC_CODE);
        assert_eq!(voltage_to_dac_code(-10.50), MAX_NEG_DAC_CODE);
        assert!((dac_code_to_voltage(MIN_POS_DAC_CODE) - 10.14).abs() < 1e-5);
        assert!((dac_code_to_voltage(MAX_NEG_DAC_CODE) + 10.50).abs() < 1e-5);
    }

    #[test]
    fn out_of_range_saturates() {
        assert_eq!(voltage_to_dac_code(12.0), MIN_POS_DAC_CODE);
        assert_eq!(voltage_to_dac_code(f32::INFINITY), MIN_POS_DAC_CODE);
        assert_eq!(voltage_to_dac_code(-50.0), MAX_NEG_DAC_CODE);
        assert_eq!(voltage_to_dac_code(f32::NEG_INFINITY), MAX_NEG_DAC_CODE);
        assert_eq!(voltage_to_dac_code(f32::NAN), voltage_to_dac_code(0.0));
    }

    #[test]
    fn monotonic() {
        let low = voltage_to_dac_code(-1.0);
        let zero = voltage_to_dac_code(0.0);
        let high = voltage_to_dac_code(1.0);

        assert!(low > zero);
        assert!(zero > high);
    }

    #[test]
    fn code_round_trip() {
        let step = ((MAX_NEG_DAC_CODE.0 - MIN_POS_DAC_CODE.0) / 997) as usize;

        for code in (MIN_POS_DAC_CODE.0..=MAX_NEG_DAC_CODE.0).step_by(step) {
            let code = DacCode(code);
            let back = voltage_to_dac_code(dac_code_to_voltage(code));

            assert!((back.0 - code.0).abs() <= 1, "{:?} came back as {:?}", code, back);
        }
    }

    #[test]
    fn amux_scaling() {
        let vout = amux_channel_to_voltage(0x43, 1.5625);
        assert_eq!(vout.channel, AmuxChannel::Vout);
        assert_eq!(vout.value, 5.0);

        let iout = amux_channel_to_voltage(0x44, 1.0);
        assert_eq!(iout.channel, AmuxChannel::Iout);
        assert_eq!(iout.value, -2.0);

        assert_eq!(amux_channel_to_voltage(0x46, 1.25).value, 1.25);
        assert_eq!(amux_channel_to_voltage(0x47, 1.65).channel, AmuxChannel::V1P65);
    }

    #[test]
    fn amux_decode() {
        assert_eq!(AmuxChannel::decode(0x43), Some(AmuxChannel::Vout));
        // bits above the selector are ignored
        assert_eq!(AmuxChannel::decode(0x1C4), Some(AmuxChannel::Iout));
        assert_eq!(AmuxChannel::decode(0x00), None);
        assert_eq!(AmuxChannel::decode(0x45), None);
    }

    #[test]
    #[should_panic(expected = "Unrecognized AMUX selector")]
    fn unknown_amux_selector() {
        amux_channel_to_voltage(0x40, 1.0);
    }

    #[test]
    fn set_and_read_back_output() {
        let mut lt8722 = Lt8722::new(SimLt8722::default());

        let code = lt8722.set_output_voltage(3.3).unwrap();
        assert_eq!(lt8722.read_output_voltage().unwrap(), dac_code_to_voltage(code));
        assert!((lt8722.read_output_voltage().unwrap() - 3.3).abs() < 1e-5);

        lt8722.set_output_voltage(40.0).unwrap();

        let sim = lt8722.release();
        assert_eq!(sim.register(Register::Dac), MIN_POS_DAC_CODE.to_register());
    }

    #[test]
    fn amux_and_current_limit_writes() {
        let mut lt8722 = Lt8722::new(SimLt8722::default());

        lt8722.select_amux(AmuxChannel::Iout).unwrap();
        lt8722.set_current_limit(0x0010_0000).unwrap();

        let sim = lt8722.release();
        assert_eq!(sim.register(Register::Amux), 0x44);
        assert_eq!(sim.register(Register::DacIlimn), 0x0010_0000);
    }
}

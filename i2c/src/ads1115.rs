//! Driver for the ADS1115 ADC sampling the LT8722 AOUT pin and output node

use embedded_hal::{delay::DelayNs, i2c::I2c};
use log::debug;

/// Conversion register address
const ADDR_CONV: u8 = 0x00;
/// Config address
const ADDR_CFG: u8 = 0x01;

/// Single shot, ±4.096V full scale, 128SPS, comparator disabled.
/// The input mux bits are filled in per conversion.
const CONFIG: u16 = 0b1_000_001_1_100_0_0_0_11;
/// Offset of the MUX field, single ended inputs start at 0b100
const CONFIG_MUX_SHIFT: u16 = 12;
const CONFIG_MUX_SINGLE: u16 = 0b100;

/// Volts per LSB at ±4.096V full scale
const LSB_V: f32 = 4.096 / 32768.0;

/// Worst case conversion time at 128SPS plus margin
const CONVERSION_US: u32 = 9_000;

pub const CHANNEL_COUNT: u8 = 4;

pub struct Ads1115<I2C, D> {
    i2c: I2C,
    delay: D,
    addr: u8,
    /// Multiplier from pin voltage to node voltage, for input dividers
    scales: [f32; CHANNEL_COUNT as usize],
}

impl<I2C: I2c, D: DelayNs> Ads1115<I2C, D> {
    pub fn new(i2c: I2C, delay: D, addr: u8) -> Self {
        Self {
            i2c,
            delay,
            addr,
            scales: [1.0; CHANNEL_COUNT as usize],
        }
    }

    /// Set the divider ratio in front of `channel`.
    pub fn set_channel_scale(&mut self, channel: u8, scale: f32) {
        if let Some(s) = self.scales.get_mut(channel as usize) {
            *s = scale;
        }
    }

    pub fn write_u16(&mut self, reg: u8, val: u16) -> Result<(), I2C::Error> {
        let val_bytes = val.to_be_bytes();
        let buffer: [u8; 3] = [reg, val_bytes[0], val_bytes[1]];

        self.i2c.write(self.addr, &buffer)
    }

    pub fn read_i16(&mut self, reg: u8) -> Result<i16, I2C::Error> {
        let mut buffer: [u8; 2] = [0; 2];

        self.i2c.write_read(self.addr, &[reg], &mut buffer)?;

        Ok(i16::from_be_bytes(buffer))
    }

    /// Run a single ended conversion on `channel` and return the scaled voltage.
    ///
    /// Returns `None` for channels the chip doesn't have.
    pub fn sample_volts(&mut self, channel: u8) -> Option<Result<f32, I2C::Error>> {
        let scale = *self.scales.get(channel as usize)?;

        let config = CONFIG | ((CONFIG_MUX_SINGLE | channel as u16) << CONFIG_MUX_SHIFT);

        Some(self.convert(config).map(|raw| {
            let volts = raw as f32 * LSB_V * scale;

            debug!("ADS1115 AIN{} {:.4}V", channel, volts);

            volts
        }))
    }

    fn convert(&mut self, config: u16) -> Result<i16, I2C::Error> {
        self.write_u16(ADDR_CFG, config)?;

        self.delay.delay_us(CONVERSION_US);

        self.read_i16(ADDR_CONV)
    }
}

use std::{thread::sleep, time::Instant};

/// Default SPI clock for the LT8722 in Hz
pub const SPI_CLOCK_HZ: u32 = 1_000_000;
/// I2C bus the temperature sensors and ADC live on
pub const I2C_BUS: u8 = 1;

/// A temperature sensor read once per control tick.
pub trait TemperatureSource {
    type Error;

    /// Read the temperature in celcius.
    fn read_temperature(&mut self) -> Result<f32, Self::Error>;
}

#[inline]
pub fn sleep_till(instant: Instant) {
    let time_now = Instant::now();

    let sleep_dur = instant.saturating_duration_since(time_now);

    sleep(sleep_dur)
}

//! Drivers for the peripherals on the chamber's i2c bus

pub mod ads1115;
pub mod tmp1075;

#[cfg(test)]
pub(crate) mod fake;

pub use ads1115::Ads1115;
pub use tmp1075::Tmp1075;

/// TMP1075 mounted outside of the chamber
pub const I2CADDR_TEMP_OUTSIDE: u8 = 0x48;
/// TMP1075 mounted inside of the chamber
pub const I2CADDR_TEMP_INSIDE: u8 = 0x49;
/// ADS1115 with the ADDR pin tied to SDA
pub const I2CADDR_ADC: u8 = 0x4A;

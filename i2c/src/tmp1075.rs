use embedded_hal::i2c::I2c;
use shared::TemperatureSource;

/// Conversion rate between the raw temperature value and degrees celcius.
const TEMP_CONV_C: f32 = 0.0625;

/// Temperature register address.
const ADDR_TEMP: u8 = 0x00;
/// Configuration register address.
const ADDR_CFG: u8 = 0x01;
/// Device ID register address.
const ADDR_DEV_ID: u8 = 0x0F;

/// Continuous conversion, 27.5ms period, comparator mode, alert active low.
const CONFIG: u16 = 0x00FF;

/// Value of the device ID register on a genuine TMP1075.
pub const DEV_ID: u16 = 0x7500;

/// Driver for the TMP1075 temperature sensor.
pub struct Tmp1075<I2C> {
    /// I2C bus to use.
    i2c: I2C,
    /// 7-bit address of the chip.
    addr: u8,
}

impl<I2C: I2c> Tmp1075<I2C> {
    /// Create a new driver given an i2c bus and the address of the chip.
    pub fn new(i2c: I2C, addr: u8) -> Self {
        Self { i2c, addr }
    }

    /// Initialize the TMP1075
    pub fn init(&mut self) -> Result<(), I2C::Error> {
        self.write_u16(ADDR_CFG, CONFIG)
    }

    /// Write a 16 bit register of the TMP1075.
    pub fn write_u16(&mut self, reg: u8, val: u16) -> Result<(), I2C::Error> {
        let val_bytes = val.to_be_bytes();
        let buffer: [u8; 3] = [reg, val_bytes[0], val_bytes[1]];

        self.i2c.write(self.addr, &buffer)
    }

    /// Read two bytes from the TMP1075.
    pub fn read_i16(&mut self, reg: u8) -> Result<i16, I2C::Error> {
        let mut buffer: [u8; 2] = [0; 2];

        self.i2c.write_read(self.addr, &[reg], &mut buffer)?;

        Ok(i16::from_be_bytes(buffer))
    }

    /// Read the device ID register.
    pub fn device_id(&mut self) -> Result<u16, I2C::Error> {
        Ok(self.read_i16(ADDR_DEV_ID)? as u16)
    }

    /// Get the temperature reading in celcius from the TMP1075.
    pub fn get_temp_c(&mut self) -> Result<f32, I2C::Error> {
        // 12 bit two's complement, left justified
        let raw = self.read_i16(ADDR_TEMP)? >> 4;

        Ok(raw as f32 * TEMP_CONV_C)
    }
}

impl<I2C: I2c> TemperatureSource for Tmp1075<I2C> {
    type Error = I2C::Error;

    #[inline]
    fn read_temperature(&mut self) -> Result<f32, Self::Error> {
        self.get_temp_c()
    }
}

//! Register map and command opcodes of the LT8722 SPI slave.

use enum_primitive_derive::Primitive;

/// Byte returned by the LT8722 after every accepted command.
pub const SLAVE_ACK: u8 = 0xA5;

/// Power-on value for the command register: switcher off, default
/// frequency and current limits.
pub const COMMAND_DEFAULT: u32 = 0x0A_A214;

/// Width of the status word clocked out at the start of every frame.
pub const STATUS_WIDTH: usize = 2;
/// Width of a data register transfer.
pub const DATA_WIDTH: usize = 4;

/// Command type, always the first byte of a frame.
#[repr(u8)]
#[derive(Primitive, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    StatusAcquisition = 0xF0,
    DataWrite = 0xF2,
    DataRead = 0xF4,
}

impl Command {
    /// Total frame length, request and response are clocked together.
    pub const fn frame_len(self) -> usize {
        match self {
            // cmd, addr, crc, ack
            Command::StatusAcquisition => 4,
            // cmd, addr, data, crc, ack
            Command::DataWrite => 3 + DATA_WIDTH + 1,
            // cmd, addr, crc in, status, data, crc, ack out
            Command::DataRead => STATUS_WIDTH + DATA_WIDTH + 2,
        }
    }
}

/// Register byte addresses, already shifted into the address byte.
#[repr(u8)]
#[derive(Primitive, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Register {
    Command = 0x00,
    Status = 0x02,
    DacIlimn = 0x04,
    Dac = 0x08,
    Amux = 0x0E,
}

impl Register {
    /// Number of meaningful bytes in the register.
    pub const fn width(self) -> usize {
        match self {
            Register::Status => STATUS_WIDTH,
            _ => DATA_WIDTH,
        }
    }

    #[inline]
    pub const fn addr(self) -> u8 {
        self as u8
    }

    /// Mask of the bits the register actually holds.
    pub const fn mask(self) -> u32 {
        match self.width() {
            STATUS_WIDTH => 0xFFFF,
            _ => u32::MAX,
        }
    }
}

/// Status word returned in the first two bytes of every frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatusWord(pub u16);

impl StatusWord {
    const SWEN: u16 = 1 << 0;
    const SRVO_ILIM: u16 = 1 << 1;
    const SRVO_PLT: u16 = 1 << 2;
    const MIN_OT: u16 = 1 << 3;
    const POR_OCC: u16 = 1 << 4;
    const OVER_CURRENT: u16 = 1 << 5;
    const TSD: u16 = 1 << 6;
    const VCC_UVLO: u16 = 1 << 7;
    const VDDIO_UVLO: u16 = 1 << 8;
    const CP_UVLO: u16 = 1 << 9;
    const V2P5_UVLO: u16 = 1 << 10;

    const FAULTS: u16 = Self::OVER_CURRENT
        | Self::TSD
        | Self::VCC_UVLO
        | Self::VDDIO_UVLO
        | Self::CP_UVLO
        | Self::V2P5_UVLO;

    #[inline]
    pub fn from_be_bytes(bytes: [u8; STATUS_WIDTH]) -> Self {
        Self(u16::from_be_bytes(bytes))
    }

    /// Switching regulator enabled.
    #[inline]
    pub fn switching(&self) -> bool {
        self.0 & Self::SWEN != 0
    }

    /// Output is being limited by the current limit servo.
    #[inline]
    pub fn current_limited(&self) -> bool {
        self.0 & Self::SRVO_ILIM != 0
    }

    /// Output is being limited by the power limit servo.
    #[inline]
    pub fn power_limited(&self) -> bool {
        self.0 & Self::SRVO_PLT != 0
    }

    #[inline]
    pub fn min_on_time(&self) -> bool {
        self.0 & Self::MIN_OT != 0
    }

    /// Power-on reset happened since the flag was last cleared.
    #[inline]
    pub fn power_on_reset(&self) -> bool {
        self.0 & Self::POR_OCC != 0
    }

    /// Any of the over-current, thermal shutdown or undervoltage flags.
    #[inline]
    pub fn has_fault(&self) -> bool {
        self.0 & Self::FAULTS != 0
    }
}

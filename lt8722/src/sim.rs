//! Simulated LT8722 on the far side of an SPI bus, for tests.

use embedded_hal::spi::{ErrorKind, ErrorType, Operation, SpiDevice};
use num_traits::FromPrimitive;

use crate::checksum::compute_checksum;
use crate::registers::*;

#[derive(Default)]
pub struct SimLt8722 {
    /// Register file indexed by `addr >> 1`.
    pub registers: [u32; 8],
    pub status: u16,
    /// Every frame clocked in, as sent by the driver.
    pub frames: Vec<Vec<u8>>,
    pub fail_bus: bool,
    pub corrupt_status: bool,
    pub corrupt_data: bool,
    pub nak: bool,
    /// Register that acknowledges writes without taking them.
    pub ignore_writes: Option<Register>,
}

impl SimLt8722 {
    pub fn register(&self, register: Register) -> u32 {
        self.registers[(register.addr() >> 1) as usize]
    }

    fn respond(&mut self, buf: &mut [u8]) {
        self.frames.push(buf.to_vec());

        let command = Command::from_u8(buf[0]);
        let addr = buf[1];
        let index = ((addr >> 1) & 0x07) as usize;

        let crc_index = match command {
            Some(Command::DataWrite) => 2 + DATA_WIDTH,
            _ => 2,
        };

        let valid = match command {
            Some(command) => {
                buf.len() == command.frame_len()
                    && compute_checksum(&buf[..crc_index]) == buf[crc_index]
            }
            None => false,
        };

        let written = match buf.get(2..2 + DATA_WIDTH) {
            Some(data) => u32::from_be_bytes([data[0], data[1], data[2], data[3]]),
            None => 0,
        };
        let len = buf.len();

        buf.fill(0);

        let status = self.status.to_be_bytes();
        buf[..STATUS_WIDTH].copy_from_slice(&status);
        buf[STATUS_WIDTH] = compute_checksum(&status) ^ (self.corrupt_status as u8);

        if valid && !self.nak {
            match command {
                Some(Command::DataWrite) => {
                    if self.ignore_writes.map(Register::addr) != Some(addr) {
                        self.registers[index] = written;
                    }
                }
                Some(Command::DataRead) => {
                    let crc_index = STATUS_WIDTH + DATA_WIDTH;

                    buf[STATUS_WIDTH..crc_index].copy_from_slice(&self.registers[index].to_be_bytes());
                    buf[crc_index] = compute_checksum(&buf[..crc_index])
                        ^ (self.corrupt_status as u8)
                        ^ ((self.corrupt_data as u8) << 1);
                }
                _ => {}
            }

            buf[len - 1] = SLAVE_ACK;
        }
    }
}

impl ErrorType for SimLt8722 {
    type Error = ErrorKind;
}

impl SpiDevice for SimLt8722 {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), ErrorKind> {
        if self.fail_bus {
            return Err(ErrorKind::Other);
        }

        for operation in operations {
            match operation {
                Operation::TransferInPlace(buf) => self.respond(buf),
                _ => return Err(ErrorKind::Other),
            }
        }

        Ok(())
    }
}

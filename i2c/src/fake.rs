//! In-memory i2c bus for driver tests.

use std::collections::HashMap;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

#[derive(Default)]
pub struct FakeI2c {
    /// Readable registers keyed by (address, register pointer).
    pub regs: HashMap<(u8, u8), [u8; 2]>,
    /// Register writes, pointer-only writes excluded.
    pub writes: Vec<(u8, Vec<u8>)>,
    pointer: u8,
}

impl ErrorType for FakeI2c {
    type Error = ErrorKind;
}

impl I2c for FakeI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        for operation in operations {
            match operation {
                Operation::Write(bytes) => {
                    if let Some(pointer) = bytes.first() {
                        self.pointer = *pointer;
                    }

                    if bytes.len() > 1 {
                        self.writes.push((address, bytes.to_vec()));
                    }
                }
                Operation::Read(buf) => {
                    let value = self
                        .regs
                        .get(&(address, self.pointer))
                        .ok_or(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address))?;

                    buf.copy_from_slice(&value[..buf.len()]);
                }
            }
        }

        Ok(())
    }
}

pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

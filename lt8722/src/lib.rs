//! Driver for the LT8722 bipolar voltage/current regulator over SPI.
//!
//! Every transaction is a single full-duplex frame: the device clocks out its
//! status word while the command goes in, then the command is executed and
//! acknowledged. Checksums are validated on everything inbound before any
//! payload is trusted.

use std::fmt::{Debug, Display};

use embedded_hal::spi::SpiDevice;
use log::{debug, info, warn};

pub mod checksum;
pub mod codec;
pub mod load;
pub mod registers;

#[cfg(any(test, feature = "sim"))]
pub mod sim;

use checksum::{compute_checksum, verify_checksum};
use registers::*;

pub use codec::{AmuxChannel, DacCode, Measurement};
pub use load::{AdcSampler, LoadMonitor};
pub use registers::{Register, StatusWord};

/// Longest frame the driver ever clocks.
const MAX_FRAME_LEN: usize = Command::DataRead.frame_len();

#[derive(Debug)]
pub enum Error<E> {
    /// SPI transport failed or timed out.
    Spi(E),
    /// Inbound frame failed its checksum.
    BadChecksum { calc: u8, rcvd: u8 },
    /// Device did not acknowledge, holds the byte received instead.
    Nak(u8),
    /// External ADC channel could not be sampled.
    Adc(u8),
    /// AMUX register read back something other than what was selected.
    Amux(u32),
}

impl<E: Debug> Display for Error<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spi(e) => write!(f, "SPI transport error {:?}", e),
            Self::BadChecksum { calc, rcvd } => {
                write!(f, "Bad checksum, calc'd {:#04x} got {:#04x}", calc, rcvd)
            }
            Self::Nak(resp) => write!(f, "Expected ACK {:#04x}, got {:#04x}", SLAVE_ACK, resp),
            Self::Adc(channel) => write!(f, "Unable to sample ADC channel {}", channel),
            Self::Amux(raw) => write!(f, "AMUX register reads back {:#04x}", raw),
        }
    }
}

impl<E: Debug> std::error::Error for Error<E> {}

pub struct Lt8722<SPI> {
    spi: SPI,
    status: StatusWord,
}

impl<SPI: SpiDevice> Lt8722<SPI> {
    pub fn new(spi: SPI) -> Self {
        Self {
            spi,
            status: StatusWord::default(),
        }
    }

    /// Give the SPI device back.
    pub fn release(self) -> SPI {
        self.spi
    }

    /// Status word clocked out by the most recent successful frame.
    #[inline]
    pub fn last_status(&self) -> StatusWord {
        self.status
    }

    /// Bring the device into a known state by writing the default command word.
    pub fn initialize(&mut self) -> Result<(), Error<SPI::Error>> {
        let status = self.acquire_status()?;

        if status.has_fault() {
            warn!("LT8722 reporting faults before init: {:#06x}", status.0);
        }

        self.write_register(Register::Command, COMMAND_DEFAULT)?;

        info!("LT8722 initialized, status {:#06x}", self.status.0);

        Ok(())
    }

    pub fn acquire_status(&mut self) -> Result<StatusWord, Error<SPI::Error>> {
        self.transfer(Command::StatusAcquisition, Register::Status, 0)?;

        Ok(self.status)
    }

    pub fn read_register(&mut self, register: Register) -> Result<u32, Error<SPI::Error>> {
        let data = self.transfer(Command::DataRead, register, 0)?;

        Ok(data & register.mask())
    }

    pub fn write_register(&mut self, register: Register, data: u32) -> Result<(), Error<SPI::Error>> {
        self.transfer(Command::DataWrite, register, data & register.mask())?;

        Ok(())
    }

    /// Clock one frame and validate the response.
    ///
    /// Returns the data word for reads, zero otherwise.
    fn transfer(
        &mut self,
        command: Command,
        register: Register,
        data: u32,
    ) -> Result<u32, Error<SPI::Error>> {
        let len = command.frame_len();
        let mut buf = [0_u8; MAX_FRAME_LEN];
        let frame = &mut buf[..len];

        frame[0] = command as u8;
        frame[1] = register.addr();

        let crc_index = match command {
            Command::DataWrite => {
                frame[2..2 + DATA_WIDTH].copy_from_slice(&data.to_be_bytes());
                2 + DATA_WIDTH
            }
            Command::StatusAcquisition | Command::DataRead => 2,
        };
        frame[crc_index] = compute_checksum(&frame[..crc_index]);

        debug!("LT8722 tx {:02x?}", frame);

        self.spi.transfer_in_place(frame).map_err(Error::Spi)?;

        debug!("LT8722 rx {:02x?}", frame);

        // Reads cover status and data with one checksum, everything else
        // just the status
        let crc_index = match command {
            Command::DataRead => STATUS_WIDTH + DATA_WIDTH,
            Command::StatusAcquisition | Command::DataWrite => STATUS_WIDTH,
        };

        let rcvd = frame[crc_index];
        verify_checksum(&frame[..crc_index], rcvd).map_err(|calc| {
            warn!("LT8722 checksum mismatch on {:?} of {:?}", command, register);
            Error::BadChecksum { calc, rcvd }
        })?;

        let ack = frame[len - 1];
        if ack != SLAVE_ACK {
            warn!("LT8722 did not acknowledge {:?} of {:?}", command, register);
            return Err(Error::Nak(ack));
        }

        self.status = StatusWord::from_be_bytes([frame[0], frame[1]]);

        match command {
            Command::DataRead => Ok(u32::from_be_bytes([frame[2], frame[3], frame[4], frame[5]])),
            Command::StatusAcquisition | Command::DataWrite => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::spi::{ErrorKind, ErrorType, Operation, SpiDevice};
    use sim::SimLt8722;

    /// Answers every frame with a fixed response.
    struct Canned {
        response: Vec<u8>,
        sent: Vec<u8>,
    }

    impl ErrorType for Canned {
        type Error = ErrorKind;
    }

    impl SpiDevice for Canned {
        fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), ErrorKind> {
            for operation in operations {
                match operation {
                    Operation::TransferInPlace(buf) if buf.len() == self.response.len() => {
                        self.sent = buf.to_vec();
                        buf.copy_from_slice(&self.response);
                    }
                    _ => return Err(ErrorKind::Other),
                }
            }

            Ok(())
        }
    }

    #[test]
    fn initialize_writes_default_command() {
        let mut lt8722 = Lt8722::new(SimLt8722::default());

        lt8722.initialize().unwrap();

        let sim = lt8722.release();
        assert_eq!(sim.register(Register::Command), COMMAND_DEFAULT);

        let write = sim.frames.last().unwrap();
        assert_eq!(write[..6], [0xF2, 0x00, 0x00, 0x0A, 0xA2, 0x14]);
        assert_eq!(write[6], compute_checksum(&write[..6]));
    }

    #[test]
    fn initialize_faults_without_ack() {
        let mut sim = SimLt8722::default();
        sim.nak = true;

        let mut lt8722 = Lt8722::new(sim);

        match lt8722.initialize() {
            Err(Error::Nak(_)) => {}
            other => panic!("Incorrect result returned! {:?}", other),
        }
    }

    #[test]
    fn status_acquisition() {
        let mut sim = SimLt8722::default();
        sim.status = 0x0011;

        let mut lt8722 = Lt8722::new(sim);

        let status = lt8722.acquire_status().unwrap();
        assert!(status.switching());
        assert!(status.power_on_reset());
        assert_eq!(lt8722.last_status(), status);

        let sim = lt8722.release();
        let frame = &sim.frames[0];
        assert_eq!(frame.len(), 4);
        assert_eq!(frame[..2], [0xF0, 0x02]);
        assert_eq!(frame[2], compute_checksum(&frame[..2]));
    }

    #[test]
    fn register_write_then_read() {
        let mut lt8722 = Lt8722::new(SimLt8722::default());

        lt8722.write_register(Register::Dac, 0x008B_0000).unwrap();
        assert_eq!(lt8722.read_register(Register::Dac).unwrap(), 0x008B_0000);

        lt8722.write_register(Register::Status, 0xDEAD_BEEF).unwrap();
        assert_eq!(lt8722.read_register(Register::Status).unwrap(), 0xBEEF);
    }

    #[test]
    fn transport_failure_is_distinct() {
        let mut sim = SimLt8722::default();
        sim.fail_bus = true;

        let mut lt8722 = Lt8722::new(sim);

        match lt8722.acquire_status() {
            Err(Error::Spi(ErrorKind::Other)) => {}
            other => panic!("Incorrect result returned! {:?}", other),
        }
    }

    #[test]
    fn corrupted_status_rejected() {
        let mut sim = SimLt8722::default();
        sim.corrupt_status = true;

        let mut lt8722 = Lt8722::new(sim);

        match lt8722.write_register(Register::Dac, 0) {
            Err(Error::BadChecksum { calc, rcvd }) => assert_ne!(calc, rcvd),
            other => panic!("Incorrect result returned! {:?}", other),
        }
    }

    #[test]
    fn corrupted_data_rejected() {
        let mut sim = SimLt8722::default();
        sim.corrupt_data = true;

        let mut lt8722 = Lt8722::new(sim);
        lt8722.write_register(Register::Dac, 0x1234_5678).unwrap();

        match lt8722.read_register(Register::Dac) {
            Err(Error::BadChecksum { .. }) => {}
            other => panic!("Incorrect result returned! {:?}", other),
        }
    }

    #[test]
    fn error_display() {
        let error: Error<ErrorKind> = Error::Nak(0x00);
        assert_eq!(error.to_string(), "Expected ACK 0xa5, got 0x00");

        let error: Error<ErrorKind> = Error::BadChecksum { calc: 0x12, rcvd: 0x34 };
        assert_eq!(error.to_string(), "Bad checksum, calc'd 0x12 got 0x34");
    }

    #[test]
    fn read_frame_layout() {
        // status, data, checksum over both, ack
        let mut response = vec![0x00, 0x11, 0x00, 0x8B, 0x00, 0x00];
        response.push(compute_checksum(&response));
        response.push(SLAVE_ACK);

        let mut lt8722 = Lt8722::new(Canned {
            response,
            sent: Vec::new(),
        });

        assert_eq!(lt8722.read_register(Register::Dac).unwrap(), 0x008B_0000);
        assert_eq!(lt8722.last_status(), StatusWord(0x0011));

        let sent = lt8722.release().sent;
        assert_eq!(sent.len(), 8);
        assert_eq!(sent[..3], [0xF4, 0x08, compute_checksum(&[0xF4, 0x08])]);
        assert!(sent[3..].iter().all(|b| *b == 0));
    }

    #[test]
    fn read_checksum_covers_status() {
        let mut response = vec![0x00, 0x11, 0x00, 0x8B, 0x00, 0x00];
        response.push(compute_checksum(&response));
        response.push(SLAVE_ACK);
        // status changed after the checksum was taken
        response[1] = 0x10;

        let mut lt8722 = Lt8722::new(Canned {
            response,
            sent: Vec::new(),
        });

        match lt8722.read_register(Register::Dac) {
            Err(Error::BadChecksum { .. }) => {}
            other => panic!("Incorrect result returned! {:?}", other),
        }
    }
}

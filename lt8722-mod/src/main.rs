//! Utility for peeking and poking LT8722 registers

use std::{error::Error, thread::sleep, time::Duration};

use clap::{Parser, ValueEnum};
use embedded_hal_bus::spi::ExclusiveDevice;
use lt8722::{codec::dac_code_to_voltage, DacCode, Lt8722, Register, StatusWord};
use rppal::{
    gpio::Gpio,
    spi::{Bus, Mode, SlaveSelect, Spi},
};
use shared::SPI_CLOCK_HZ;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The register to address
    #[arg(short, long, value_name = "register")]
    register: RegisterName,

    /// Allow for continuous monitoring
    #[arg(short, long)]
    continuous: bool,

    /// Write data to the register, decimal or 0x prefixed hex
    #[arg(short, long, value_name = "data")]
    write: Option<String>,

    /// Run the power up sequence before anything else
    #[arg(short, long)]
    init: bool,

    /// GPIO pin driving chip select
    #[arg(long, default_value_t = 25)]
    cs_pin: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum RegisterName {
    Command,
    Status,
    DacIlimn,
    Dac,
    Amux,
}

impl From<RegisterName> for Register {
    fn from(value: RegisterName) -> Self {
        match value {
            RegisterName::Command => Register::Command,
            RegisterName::Status => Register::Status,
            RegisterName::DacIlimn => Register::DacIlimn,
            RegisterName::Dac => Register::Dac,
            RegisterName::Amux => Register::Amux,
        }
    }
}

fn parse_data(data: &str) -> Result<u32, std::num::ParseIntError> {
    match data.strip_prefix("0x") {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => data.parse(),
    }
}

fn describe(register: Register, data: u32) -> String {
    match register {
        Register::Dac => format!(
            "{:#010x} ({:.3}V)",
            data,
            dac_code_to_voltage(DacCode::from_register(data))
        ),
        _ => format!("{:#010x}", data),
    }
}

/// Status word with the names of the flags that are set.
fn describe_status(status: StatusWord) -> String {
    let flags = [
        (status.switching(), "SWEN"),
        (status.current_limited(), "ILIM"),
        (status.power_limited(), "PLIM"),
        (status.min_on_time(), "MIN_OT"),
        (status.power_on_reset(), "POR"),
        (status.has_fault(), "FAULT"),
    ];

    let set: Vec<&str> = flags
        .iter()
        .filter(|(set, _)| *set)
        .map(|(_, name)| *name)
        .collect();

    format!("{:#06x} [{}]", status.0, set.join(" "))
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let register = Register::from(cli.register);

    let spi = Spi::new(Bus::Spi0, SlaveSelect::Ss0, SPI_CLOCK_HZ, Mode::Mode0)?;
    let cs = Gpio::new()?.get(cli.cs_pin)?.into_output_high();
    let mut lt8722 = Lt8722::new(ExclusiveDevice::new_no_delay(spi, cs)?);

    if cli.init {
        lt8722.initialize()?;
    }

    if let Some(data) = cli.write {
        let data = parse_data(&data)?;

        println!("{:?}->{}", register, describe(register, lt8722.read_register(register)?));
        println!("{:?}<-{}", register, describe(register, data));

        lt8722.write_register(register, data)?;
    }

    loop {
        let data = lt8722.read_register(register)?;

        print!(
            "\r{:?}->{} status {}",
            register,
            describe(register, data),
            describe_status(lt8722.last_status())
        );

        if !cli.continuous {
            break;
        }

        sleep(Duration::from_millis(100));
    }

    println!("");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_formats() {
        assert_eq!(parse_data("10"), Ok(10));
        assert_eq!(parse_data("0x0AA214"), Ok(0x0A_A214));
        assert!(parse_data("0xZZ").is_err());
        assert!(parse_data("-1").is_err());
    }

    #[test]
    fn dac_described_in_volts() {
        assert_eq!(describe(Register::Dac, 0x008B_0000), "0x008b0000 (-10.500V)");
        assert_eq!(describe(Register::Amux, 0x43), "0x00000043");
    }

    #[test]
    fn status_flags_named() {
        assert_eq!(describe_status(StatusWord(0x0000)), "0x0000 []");
        assert_eq!(describe_status(StatusWord(0x0003)), "0x0003 [SWEN ILIM]");
        assert_eq!(describe_status(StatusWord(0x001C)), "0x001c [PLIM MIN_OT POR]");
        assert_eq!(describe_status(StatusWord(0x0040)), "0x0040 [FAULT]");
    }
}

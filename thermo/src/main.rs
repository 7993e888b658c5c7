//! Chamber controller running on the Raspberry Pi

use std::{
    cell::RefCell,
    error::Error,
    fs::File,
    io::BufReader,
    path::PathBuf,
    time::{Duration, Instant},
};

use clap::Parser;
use embedded_hal_bus::{i2c::RefCellDevice, spi::ExclusiveDevice};
use log::{error, info, warn};
use rppal::{
    gpio::Gpio,
    hal::Delay,
    i2c::I2c,
    spi::{Bus, Mode, SlaveSelect, Spi},
    uart::{Parity, Uart},
};

use i2c::{Ads1115, Tmp1075, I2CADDR_ADC, I2CADDR_TEMP_INSIDE, I2CADDR_TEMP_OUTSIDE};
use lt8722::{LoadMonitor, Lt8722};
use shared::*;
use thermo::{control::LOAD_PROBE_V, host, AdaptivePid, Chamber, PidConfig};

/// Baud rate of the host serial link
const UART_BAUD: u32 = 115_200;

/// Ratio of the divider between the regulator output and the ADC sense input,
/// keeps the full output swing inside the ADC's 4.096V range
const SENSE_DIVIDER: f32 = 4.0;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// JSON file overriding the PID tuning
    #[arg(short, long, value_name = "json")]
    config: Option<PathBuf>,

    /// Serial device the host is attached to
    #[arg(short, long, value_name = "path")]
    uart: Option<PathBuf>,

    /// SPI bus the LT8722 is on
    #[arg(long, default_value_t = 0)]
    spi_bus: u8,

    /// GPIO pin driving the LT8722 chip select
    #[arg(long, default_value_t = 25)]
    cs_pin: u8,

    /// Control period in milliseconds
    #[arg(long, default_value_t = 1000)]
    tick_ms: u64,

    /// Initial set point in celcius
    #[arg(short, long, default_value_t = 25.0)]
    set_point: f32,

    /// Check for a load every this many ticks
    #[arg(long, default_value_t = 10)]
    load_check_ticks: u32,

    /// Allowed disagreement between output readings in volts
    #[arg(long, default_value_t = lt8722::load::LOAD_TOLERANCE_V)]
    load_tolerance: f32,

    /// Divider ratio in front of the ADC output sense channel
    #[arg(long, default_value_t = SENSE_DIVIDER)]
    sense_scale: f32,
}

fn spi_bus(bus: u8) -> Result<Bus, String> {
    match bus {
        0 => Ok(Bus::Spi0),
        1 => Ok(Bus::Spi1),
        2 => Ok(Bus::Spi2),
        _ => Err(format!("No SPI bus {}", bus)),
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<PidConfig, Box<dyn Error>> {
    let config = match path {
        Some(path) => PidConfig::from_json(BufReader::new(File::open(path)?))?,
        None => PidConfig::default(),
    };

    info!("PID tuning {:?}", config);

    Ok(config)
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = load_config(cli.config.as_ref())?;

    // LT8722 on SPI with a GPIO chip select
    let spi = Spi::new(spi_bus(cli.spi_bus)?, SlaveSelect::Ss0, SPI_CLOCK_HZ, Mode::Mode0)?;
    let cs = Gpio::new()?.get(cli.cs_pin)?.into_output_high();
    let spi = ExclusiveDevice::new_no_delay(spi, cs)?;

    let mut lt8722 = Lt8722::new(spi);
    lt8722.initialize()?;
    lt8722.set_output_voltage(0.0)?;

    // Sensors and ADC share one I2C bus
    let i2c_bus = RefCell::new(I2c::with_bus(I2C_BUS)?);

    let mut inside = Tmp1075::new(RefCellDevice::new(&i2c_bus), I2CADDR_TEMP_INSIDE);
    let mut outside = Tmp1075::new(RefCellDevice::new(&i2c_bus), I2CADDR_TEMP_OUTSIDE);
    inside.init()?;
    outside.init()?;

    let monitor = LoadMonitor {
        tolerance_v: cli.load_tolerance,
        ..Default::default()
    };

    let mut adc = Ads1115::new(RefCellDevice::new(&i2c_bus), Delay::new(), I2CADDR_ADC);
    adc.set_channel_scale(monitor.sense_channel, cli.sense_scale);

    let mut uart = match &cli.uart {
        Some(path) => {
            let mut uart = Uart::with_path(path, UART_BAUD, Parity::None, 8, 1)?;
            uart.set_read_mode(0, Duration::ZERO)?;
            Some(uart)
        }
        None => None,
    };

    let mut reader = host::SetPointReader::new();
    let mut rx_buf = [0_u8; host::MAX_LINE_LEN];

    let mut chamber = Chamber::new(AdaptivePid::new(config), lt8722, inside, outside, cli.set_point);

    let period = Duration::from_millis(cli.tick_ms);
    let mut wakeup = Instant::now();
    let mut load_connected = true;

    info!("Controlling to {:.2}C every {}ms", cli.set_point, cli.tick_ms);

    for tick in 0_u64.. {
        wakeup += period;

        // Pick up a new set point from the host
        if let Some(uart) = uart.as_mut() {
            loop {
                match uart.read(&mut rx_buf) {
                    Ok(0) => break,
                    Ok(len) => {
                        if let Some(set_point) = reader.push(&rx_buf[..len]) {
                            chamber.set_set_point(set_point);
                        }
                    }
                    Err(e) => {
                        warn!("Host read failed: {}", e);
                        break;
                    }
                }
            }
        }

        if cli.load_check_ticks != 0 && tick % cli.load_check_ticks as u64 == 0 {
            let mut sampler = |channel: u8| match adc.sample_volts(channel) {
                Some(Ok(volts)) => Some(volts),
                Some(Err(e)) => {
                    warn!("ADC channel {} failed: {:?}", channel, e);
                    None
                }
                None => None,
            };

            // Checked at the probe voltage, at 0V the readings agree with or
            // without a load
            match chamber.probe_load(&monitor, &mut sampler, LOAD_PROBE_V) {
                Ok(connected) => {
                    if connected && !load_connected {
                        info!("Load connected, resuming control");
                    }
                    load_connected = connected;
                }
                Err(e) => error!("Load check failed: {}", e),
            }
        }

        let temps = if load_connected {
            match chamber.tick() {
                Ok(report) => Some((report.inside_c, report.outside_c)),
                Err(e) => {
                    error!("Tick failed: {}", e);
                    None
                }
            }
        } else {
            warn!("No load on the output, holding 0V");

            if let Err(e) = chamber.hold() {
                error!("Failed to hold output: {}", e);
            }

            chamber.read_temperatures().ok()
        };

        if let (Some(uart), Some((inside_c, outside_c))) = (uart.as_mut(), temps) {
            if let Err(e) = uart.write(host::format_report(inside_c, outside_c).as_bytes()) {
                warn!("Host write failed: {}", e);
            }
        }

        sleep_till(wakeup);
    }

    Ok(())
}

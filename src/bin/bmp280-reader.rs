use chrono::Local;
use clap::{Parser, ValueEnum};
use log::{error, info};
use std::path::Path;
use std::process::ExitCode;
use std::{thread, time};

use bmp280_sensor::bmp280::*;
use bmp280_sensor::i2cio::I2cBus;

const EXIT_CODE_SET_CTR_C_HNDLR_FAILED: u8 = 0x02;
const EXIT_CODE_BUS_OPEN_FAILED: u8 = 0x03;
const EXIT_CODE_BMP280_INIT_FAILED: u8 = 0x71;
const EXIT_CODE_BMP280_OPEN_FAILED: u8 = 0x72;
const EXIT_CODE_BMP280_READ_FAILED: u8 = 0x73;
const EXIT_CODE_BMP280_PARSE_FAILED: u8 = 0x74;

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum Address {
    Primary,
    Secondary,
}

impl From<Address> for Bmp280DeviceAddress {
    fn from(address: Address) -> Self {
        match address {
            Address::Primary => Bmp280DeviceAddress::Primary,
            Address::Secondary => Bmp280DeviceAddress::Secondary,
        }
    }
}

#[derive(Parser)]
struct Args {
    // -- i2c bus device
    bus_path: String,
    #[clap(long, value_enum, default_value_t = Address::Primary)]
    address: Address,
    // -- bytes requested per read call
    #[clap(long, default_value_t = 256)]
    chunk_size: usize,
    // -- repeat the reading at this interval until Ctrl-C
    #[clap(long)]
    interval_ms: Option<u64>,
}

// -- reads one sample through the char device interface until end of stream
fn read_sample<D: CharDevice>(device: &D, session: &mut D::Session, chunk_size: usize) -> Result<String, DeviceError> {
    let mut text = String::new();
    loop {
        let chunk = device.read(session, chunk_size)?;
        if chunk.is_empty() {
            return Ok(text)
        }
        text.push_str(&chunk);
    }
}

fn main() -> ExitCode {

    // -- read .env file
    dotenv::dotenv().ok();
    // -- setup logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let now = Local::now();
    info!("Starting up: {now}");

    let args = Args::parse();
    let bus_path = args.bus_path;
    info!("Using i2c bus device {bus_path}");

    // -- set handler for Ctrl-C
    if let Err(err) = ctrlc::set_handler(move || {
        info!("Received Ctrl+C, terminating...");
        std::process::exit(0);
    }) {
        error!("ERROR - Failed to set Ctrl-C handler: {err}");
        return ExitCode::from(EXIT_CODE_SET_CTR_C_HNDLR_FAILED);
    }

    let dev_addr = Bmp280DeviceAddress::from(args.address);
    let bus = match I2cBus::open(Path::new(&bus_path), dev_addr.value()) {
        Ok(bus) => bus,
        Err(err) => {
            error!("ERROR - Failed to open i2c bus {bus_path}: {err}");
            return ExitCode::from(EXIT_CODE_BUS_OPEN_FAILED);
        }
    };

    info!("Initializing BMP280 at {:#04x}", bus.get_device_addr());
    let bmp280 = BMP280::new(dev_addr);
    if let Err(err) = bmp280.attach(bus) {
        error!("ERROR - Failed to initialize BMP280: {err}");
        return ExitCode::from(EXIT_CODE_BMP280_INIT_FAILED);
    }
    let mut session = match bmp280.open() {
        Ok(session) => session,
        Err(err) => {
            error!("ERROR - Failed to open BMP280 session: {err}");
            return ExitCode::from(EXIT_CODE_BMP280_OPEN_FAILED);
        }
    };

    loop {
        let sample = match read_sample(&bmp280, &mut session, args.chunk_size) {
            Ok(sample) => sample,
            Err(err) => {
                error!("ERROR - Failed to read temperature from BMP280: {err}");
                return ExitCode::from(EXIT_CODE_BMP280_READ_FAILED);
            }
        };
        let temperature: f64 = match sample.trim().parse() {
            Ok(temperature) => temperature,
            Err(err) => {
                error!("ERROR - Failed to parse temperature '{}': {err}", sample.trim());
                return ExitCode::from(EXIT_CODE_BMP280_PARSE_FAILED);
            }
        };
        println!("Current Temperature: {temperature:.2}°C");

        let Some(interval_ms) = args.interval_ms else {
            break;
        };
        // -- delay next reading
        thread::sleep(time::Duration::from_millis(interval_ms));
        if let Err(err) = bmp280.rewind(&mut session) {
            error!("ERROR - Failed to start a new BMP280 read cycle: {err}");
            return ExitCode::from(EXIT_CODE_BMP280_READ_FAILED);
        }
    }

    bmp280.release(&mut session);
    bmp280.detach();
    ExitCode::SUCCESS
}

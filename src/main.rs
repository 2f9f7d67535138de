//! axiscan - SPI flash scanner
//!
//! Reimplementation of the scan firmware from a small AXI SoC: read the
//! flash word by word through the SPI master and stream every word as a
//! hex text line through the UART. The protocol logic lives in
//! axiscan-core and runs against either register backend:
//!
//! - `--backend sim` drives in-memory peripheral models (axiscan-sim) and
//!   mirrors the UART output to stdout
//! - `--backend mmio` drives the real registers through /dev/mem
//!   (axiscan-mmio, Linux, root)

mod cli;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use thiserror::Error;

use axiscan_core::bus::RegisterBus;
use axiscan_core::scan::ScanDriver;
use axiscan_core::spi::{SpiConfig, SpiFlashReader};
use axiscan_core::uart::{UartConfig, UartTransmitter};
use cli::{Backend, Cli};

#[derive(Debug, Error)]
enum AppError {
    #[error("failed to load flash image {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Mmio(#[from] axiscan_mmio::MmioError),
    #[error(transparent)]
    Scan(#[from] axiscan_core::Error),
}

/// Set by the SIGINT handler, checked once per scan iteration.
static CANCEL: AtomicBool = AtomicBool::new(false);

extern "C" fn on_sigint(_signum: libc::c_int) {
    CANCEL.store(true, Ordering::Relaxed);
}

fn main() -> Result<(), AppError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    unsafe {
        libc::signal(libc::SIGINT, on_sigint as libc::sighandler_t);
    }

    match cli.backend {
        Backend::Sim => {
            let image = load_image(cli.image.as_deref())?;
            log::info!("sim backend: {} byte flash image", image.len());
            let spi = axiscan_sim::SimSpiMaster::with_data(image);
            let mut uart = axiscan_sim::SimUart::new();
            uart.echo_to_stdout(true);
            run_scan(spi, uart, &cli)
        }
        Backend::Mmio => {
            log::info!(
                "mmio backend: SPI master at {:#x}, UART at {:#x}",
                cli.spi_base,
                cli.uart_base
            );
            let spi = axiscan_mmio::MmioBus::map(cli.spi_base)?;
            let uart = axiscan_mmio::MmioBus::map(cli.uart_base)?;
            run_scan(spi, uart, &cli)
        }
    }
}

fn load_image(path: Option<&std::path::Path>) -> Result<Vec<u8>, AppError> {
    match path {
        Some(path) => std::fs::read(path).map_err(|source| AppError::ImageLoad {
            path: path.to_path_buf(),
            source,
        }),
        // Erased-flash default, same fill the hardware would show.
        None => Ok(vec![0xff; 16 * 1024 * 1024]),
    }
}

fn run_scan<S, U>(spi_bus: S, uart_bus: U, cli: &Cli) -> Result<(), AppError>
where
    S: RegisterBus,
    U: RegisterBus,
{
    let spi = SpiFlashReader::with_config(
        spi_bus,
        SpiConfig {
            poll_budget: cli.poll_budget,
            settle_ticks: cli.settle_ticks,
        },
    );
    let mut uart = UartTransmitter::with_config(
        uart_bus,
        UartConfig {
            poll_budget: cli.poll_budget,
        },
    );

    uart.configure_baud(cli.baud_divisor);
    uart.reset_fifos();

    let mut driver = ScanDriver::with_start(spi, uart, cli.start)?;
    driver.announce()?;

    match cli.count {
        Some(count) => {
            for _ in 0..count {
                if CANCEL.load(Ordering::Relaxed) {
                    break;
                }
                if let Err(err) = driver.step() {
                    log::error!("scan step failed: {}", err);
                }
            }
        }
        None => driver.run(&CANCEL),
    }

    let uart = driver.uart();
    if uart.overruns() > 0 || uart.frame_errors() > 0 {
        log::warn!(
            "UART line errors during scan: {} overruns, {} framing",
            uart.overruns(),
            uart.frame_errors()
        );
    }
    log::info!("scan stopped at {:#010x}", driver.cursor());
    Ok(())
}

//! CLI argument parsing

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Parse a string as a hex or decimal u64
fn parse_hex_u64(s: &str) -> Result<u64, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u64>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Parse a string as a hex or decimal u16
fn parse_hex_u16(s: &str) -> Result<u16, String> {
    parse_hex_u32(s).and_then(|v| {
        u16::try_from(v).map_err(|_| format!("Value {:#x} does not fit in 16 bits", v))
    })
}

/// How the scanner reaches the peripheral registers
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// In-memory peripheral simulation (no hardware required)
    Sim,
    /// Physical registers through /dev/mem (Linux, requires root)
    Mmio,
}

#[derive(Parser)]
#[command(name = "axiscan")]
#[command(author, version, about = "Stream SPI flash contents as hex text over a UART", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Register access backend
    #[arg(short, long, value_enum, default_value_t = Backend::Sim)]
    pub backend: Backend,

    /// Flash image file for the sim backend (defaults to 16 MiB of 0xFF)
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// First flash address to scan (word aligned)
    #[arg(long, value_parser = parse_hex_u32, default_value = "0x0")]
    pub start: u32,

    /// Number of words to scan (default: scan until interrupted)
    #[arg(short = 'n', long)]
    pub count: Option<u64>,

    /// Physical base address of the UART controller
    #[arg(long, value_parser = parse_hex_u64, default_value = "0x10100")]
    pub uart_base: u64,

    /// Physical base address of the SPI master
    #[arg(long, value_parser = parse_hex_u64, default_value = "0x10200")]
    pub spi_base: u64,

    /// 16-bit UART baud clock divisor (0x364 = 115200 baud)
    #[arg(long, value_parser = parse_hex_u16, default_value = "0x364")]
    pub baud_divisor: u16,

    /// Retry budget for SPI and UART status polls
    #[arg(long, default_value_t = 100_000)]
    pub poll_budget: u32,

    /// SPI post-transfer settle delay in spin ticks
    #[arg(long, default_value_t = 233)]
    pub settle_ticks: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_and_decimal_both_parse() {
        assert_eq!(parse_hex_u32("0x130000"), Ok(0x13_0000));
        assert_eq!(parse_hex_u32("64"), Ok(64));
        assert!(parse_hex_u32("0xzz").is_err());
    }

    #[test]
    fn divisor_must_fit_16_bits() {
        assert_eq!(parse_hex_u16("0x364"), Ok(0x364));
        assert!(parse_hex_u16("0x10000").is_err());
    }
}

//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse a string as a hex or decimal u16
fn parse_hex_u16(s: &str) -> Result<u16, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u16::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u16>().map_err(|e| format!("Invalid number: {}", e))
    }
}

#[derive(Parser)]
#[command(name = "fourway")]
#[command(author, version, about = "FourWay ESC bootloader flashing tool", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Link options shared across commands
#[derive(clap::Args, Debug, Clone)]
pub struct LinkArgs {
    /// Connection: dev=PATH[:BAUD], ip=HOST:PORT, or dummy
    #[arg(short, long)]
    pub port: String,

    /// ESC device number (motor position, 0-3)
    #[arg(short, long, default_value_t = 0)]
    pub device: u8,

    /// Acknowledgment timeout in milliseconds
    #[arg(long, default_value_t = 250)]
    pub ack_timeout_ms: u64,

    /// Attempts per command or page before giving up
    #[arg(long, default_value_t = 8)]
    pub retries: u32,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the flash interface and show EEPROM settings
    Connect {
        #[command(flatten)]
        link: LinkArgs,
    },

    /// Write a firmware image to the ESC
    Write {
        #[command(flatten)]
        link: LinkArgs,

        /// Firmware binary to flash
        #[arg(short, long)]
        input: PathBuf,

        /// Skip the post-write verification pass
        #[arg(long)]
        no_verify: bool,
    },

    /// Verify flashed memory against a firmware image
    Verify {
        #[command(flatten)]
        link: LinkArgs,

        /// Firmware binary to compare against
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Dump device memory to a file
    Read {
        #[command(flatten)]
        link: LinkArgs,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Start address (hex or decimal)
        #[arg(long, value_parser = parse_hex_u16, default_value = "0x1000")]
        address: u16,

        /// Number of bytes to read
        #[arg(long, default_value_t = 4096)]
        length: usize,
    },

    /// Erase flash memory
    Erase {
        #[command(flatten)]
        link: LinkArgs,

        /// Erase a single page
        #[arg(long, conflicts_with = "all")]
        page: Option<u8>,

        /// Erase the entire flash
        #[arg(long)]
        all: bool,
    },

    /// Show or change EEPROM settings flags
    Eeprom {
        #[command(flatten)]
        link: LinkArgs,

        #[command(subcommand)]
        action: EepromAction,
    },
}

#[derive(Subcommand)]
pub enum EepromAction {
    /// Print the five settings flags
    Show,
    /// Change flags, e.g. `set bidirectional=true complementary-pwm=false`
    Set {
        /// FLAG=BOOL assignments
        #[arg(required = true)]
        assignments: Vec<String>,
    },
}

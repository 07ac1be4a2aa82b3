//! fourway - FourWay ESC bootloader flashing tool
//!
//! Talks to an ESC bootloader through a flight-controller pass-through
//! link: connect handshake, page-oriented firmware flashing with bounded
//! retries, read-back verification, memory dumps, erases and EEPROM
//! settings editing. The protocol lives in `fourway-core`, the session and
//! flashing workflow in `fourway-link`.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let result = match &cli.command {
        Commands::Connect { link } => commands::connect::run_connect(link),
        Commands::Write {
            link,
            input,
            no_verify,
        } => commands::write::run_write(link, input, *no_verify),
        Commands::Verify { link, input } => commands::verify::run_verify(link, input),
        Commands::Read {
            link,
            output,
            address,
            length,
        } => commands::read::run_read(link, output, *address, *length),
        Commands::Erase { link, page, all } => commands::erase::run_erase(link, *page, *all),
        Commands::Eeprom { link, action } => commands::eeprom::run_eeprom(link, action),
    };

    if let Err(e) = &result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    result
}

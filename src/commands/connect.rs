//! Connect command implementation

use fourway_core::eeprom::SettingFlag;

use crate::cli::LinkArgs;
use crate::commands::open_session;

/// Run the connect handshake and report EEPROM settings presence
pub fn run_connect(link: &LinkArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut dev = open_session(link)?;

    let record = dev.read_settings()?;
    if record.is_present() {
        println!("EEPROM settings present:");
        for flag in SettingFlag::ALL {
            // Present record, so every flag reads as Some
            let on = record.flag(flag).unwrap_or(false);
            println!("  {:<24} {}", flag.name(), on);
        }
    } else {
        println!("No EEPROM settings record on this ESC");
    }

    dev.shutdown();
    Ok(())
}

//! EEPROM command implementation

use fourway_core::eeprom::SettingFlag;

use crate::cli::{EepromAction, LinkArgs};
use crate::commands::open_session;

/// Show or change the five settings flags
pub fn run_eeprom(
    link: &LinkArgs,
    action: &EepromAction,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut dev = open_session(link)?;
    let mut record = dev.read_settings()?;

    match action {
        EepromAction::Show => {
            if !record.is_present() {
                println!("No EEPROM settings record on this ESC");
            } else {
                for flag in SettingFlag::ALL {
                    let on = record.flag(flag).unwrap_or(false);
                    println!("{:<24} {}", flag.name(), on);
                }
            }
        }
        EepromAction::Set { assignments } => {
            if !record.is_present() {
                return Err("cannot set flags: no EEPROM settings record".into());
            }

            for assignment in assignments {
                let (name, value) = assignment
                    .split_once('=')
                    .ok_or_else(|| format!("expected FLAG=BOOL, got {:?}", assignment))?;
                let flag = SettingFlag::from_name(name)
                    .ok_or_else(|| format!("unknown flag {:?}", name))?;
                let on: bool = value
                    .parse()
                    .map_err(|_| format!("expected true or false, got {:?}", value))?;
                record.set_flag(flag, on);
                println!("{:<24} -> {}", flag.name(), on);
            }

            dev.write_settings(&record)?;
            println!("Settings written");
        }
    }

    dev.shutdown();
    Ok(())
}

//! EEPROM settings record
//!
//! A fixed 48-byte record stored at device address 0x7C00. Byte 0 equal to
//! 1 marks the record as present; any other value means the ESC holds no
//! EEPROM settings, and every flag reads as unknown rather than false.

use crate::error::{Error, Result};

/// Record length in bytes
pub const RECORD_LEN: usize = 48;
/// Value of byte 0 marking a valid record
const PRESENT_MARKER: u8 = 0x01;

/// Boolean configuration flags at fixed byte offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum SettingFlag {
    /// Reversed rotation direction
    ReverseDirection = 17,
    /// Bidirectional (3D) mode
    Bidirectional = 18,
    /// Sinusoidal startup ramp
    SinusoidalStartup = 19,
    /// Complementary PWM drive
    ComplementaryPwm = 20,
    /// Variable PWM frequency
    VariablePwmFrequency = 21,
}

impl SettingFlag {
    /// All five flags in record order
    pub const ALL: [SettingFlag; 5] = [
        SettingFlag::ReverseDirection,
        SettingFlag::Bidirectional,
        SettingFlag::SinusoidalStartup,
        SettingFlag::ComplementaryPwm,
        SettingFlag::VariablePwmFrequency,
    ];

    /// Byte offset of the flag within the record
    pub fn offset(self) -> usize {
        self as usize
    }

    /// Short name used for display and CLI parsing
    pub fn name(self) -> &'static str {
        match self {
            SettingFlag::ReverseDirection => "reverse-direction",
            SettingFlag::Bidirectional => "bidirectional",
            SettingFlag::SinusoidalStartup => "sinusoidal-startup",
            SettingFlag::ComplementaryPwm => "complementary-pwm",
            SettingFlag::VariablePwmFrequency => "variable-pwm-frequency",
        }
    }

    /// Parse a flag from its short name
    pub fn from_name(name: &str) -> Option<SettingFlag> {
        SettingFlag::ALL.into_iter().find(|f| f.name() == name)
    }
}

/// The 48-byte settings record as read from the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsRecord {
    raw: [u8; RECORD_LEN],
}

impl SettingsRecord {
    /// Wrap a buffer read from the device; it must be exactly 48 bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != RECORD_LEN {
            return Err(Error::BadSettingsLength(bytes.len()));
        }
        let mut raw = [0u8; RECORD_LEN];
        raw.copy_from_slice(bytes);
        Ok(Self { raw })
    }

    /// Whether the device holds valid settings (byte 0 == 1)
    pub fn is_present(&self) -> bool {
        self.raw[0] == PRESENT_MARKER
    }

    /// Read a flag; `None` when the record is absent
    pub fn flag(&self, flag: SettingFlag) -> Option<bool> {
        if !self.is_present() {
            return None;
        }
        Some(self.raw[flag.offset()] != 0)
    }

    /// Set a flag; refused (returns false) when the record is absent
    pub fn set_flag(&mut self, flag: SettingFlag, on: bool) -> bool {
        if !self.is_present() {
            return false;
        }
        self.raw[flag.offset()] = on as u8;
        true
    }

    /// The raw record bytes, for writing back to the device
    pub fn as_bytes(&self) -> &[u8; RECORD_LEN] {
        &self.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn present_record() -> SettingsRecord {
        let mut raw = [0u8; RECORD_LEN];
        raw[0] = 0x01;
        raw[17] = 1;
        raw[20] = 1;
        SettingsRecord::from_bytes(&raw).unwrap()
    }

    #[test]
    fn present_record_reads_flags() {
        let rec = present_record();
        assert!(rec.is_present());
        assert_eq!(rec.flag(SettingFlag::ReverseDirection), Some(true));
        assert_eq!(rec.flag(SettingFlag::Bidirectional), Some(false));
        assert_eq!(rec.flag(SettingFlag::ComplementaryPwm), Some(true));
    }

    #[test]
    fn absent_record_reports_unknown_not_false() {
        for marker in [0x00u8, 0x02, 0xFF] {
            let mut raw = [0u8; RECORD_LEN];
            raw[0] = marker;
            raw[17] = 1;
            let rec = SettingsRecord::from_bytes(&raw).unwrap();
            assert!(!rec.is_present());
            for flag in SettingFlag::ALL {
                assert_eq!(rec.flag(flag), None);
            }
        }
    }

    #[test]
    fn set_flag_round_trips_and_respects_absence() {
        let mut rec = present_record();
        assert!(rec.set_flag(SettingFlag::SinusoidalStartup, true));
        assert_eq!(rec.flag(SettingFlag::SinusoidalStartup), Some(true));
        assert_eq!(rec.as_bytes()[19], 1);

        let mut absent = SettingsRecord::from_bytes(&[0u8; RECORD_LEN]).unwrap();
        assert!(!absent.set_flag(SettingFlag::Bidirectional, true));
    }

    #[test]
    fn wrong_length_is_rejected() {
        assert_eq!(
            SettingsRecord::from_bytes(&[0u8; 47]),
            Err(Error::BadSettingsLength(47))
        );
    }

    #[test]
    fn flag_names_round_trip() {
        for flag in SettingFlag::ALL {
            assert_eq!(SettingFlag::from_name(flag.name()), Some(flag));
        }
        assert_eq!(SettingFlag::from_name("unknown-flag"), None);
    }
}

//! Flashing workflow tests against the in-memory ESC emulator

use std::time::Duration;

use fourway_core::eeprom::SettingFlag;
use fourway_dummy::DummyEsc;
use fourway_link::flash::{self, FlashConfig, FlashProgress, NoProgress};
use fourway_link::{FourWay, LinkConfig, LinkError};

fn session(esc: DummyEsc, retry_budget: u32) -> FourWay<DummyEsc> {
    let config = LinkConfig {
        ack_timeout: Duration::from_millis(5),
        retry_budget,
    };
    let mut dev = FourWay::with_config(esc, config);
    dev.enable_passthrough().unwrap();
    dev.connect(0).unwrap();
    dev
}

fn test_image(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 + 3) as u8).collect()
}

#[derive(Default)]
struct Recorder {
    percents: Vec<u8>,
    verified: Vec<usize>,
    cancel_after: Option<usize>,
}

impl FlashProgress for Recorder {
    fn write_progress(&mut self, _bytes_sent: usize, percent: u8) {
        self.percents.push(percent);
    }

    fn verify_progress(&mut self, bytes_checked: usize) {
        self.verified.push(bytes_checked);
    }

    fn cancelled(&mut self) -> bool {
        match self.cancel_after {
            Some(n) => self.percents.len() >= n,
            None => false,
        }
    }
}

#[test]
fn programs_a_multi_page_image() {
    let image = test_image(2500);
    let mut dev = session(DummyEsc::new(), 8);
    let mut progress = Recorder::default();

    let stats = flash::program(&mut dev, &image, &FlashConfig::default(), &mut progress).unwrap();

    assert_eq!(stats.bytes_written, 2500);
    assert_eq!(stats.pages_written, 3);
    assert_eq!(stats.retries, 0);

    let esc = dev.into_transport();
    assert!(esc.passthrough_started());
    assert_eq!(&esc.memory()[0x2000..0x2000 + 2500], &image[..]);

    // Address advances monotonically: one write per 256-byte chunk.
    let expected: Vec<u16> = (0..10).map(|i| 0x2000 + i * 0x100).collect();
    assert_eq!(esc.write_log(), &expected[..]);

    // Progress ends at 100 and never decreases.
    assert_eq!(progress.percents.last(), Some(&100));
    assert!(progress.percents.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn retry_budget_exhausts_without_advancing() {
    // Connect over a clean line, then corrupt every reply from there on.
    let mut dev = session(DummyEsc::new(), 4);
    dev.transport_mut().corrupt_all_replies();

    let err = flash::program(
        &mut dev,
        &test_image(512),
        &FlashConfig::default(),
        &mut NoProgress,
    )
    .unwrap_err();

    match err {
        LinkError::RetryBudgetExhausted {
            attempts,
            page,
            address,
        } => {
            assert_eq!(attempts, 4);
            assert_eq!(page, 0);
            assert_eq!(address, 0x2000);
        }
        other => panic!("expected RetryBudgetExhausted, got {}", other),
    }

    // Exactly `budget` attempts, all on the first chunk of the same page.
    let esc = dev.into_transport();
    assert_eq!(esc.write_log(), &[0x2000; 4]);
}

#[test]
fn crc_failure_rewinds_the_whole_page() {
    let mut esc = DummyEsc::new();
    // Garble the reply to the third chunk of the first page, once.
    esc.corrupt_reply_once_at(0x2200);
    let mut dev = session(esc, 8);

    let image = test_image(1024);
    let stats = flash::program(&mut dev, &image, &FlashConfig::default(), &mut NoProgress).unwrap();
    assert_eq!(stats.retries, 1);

    let esc = dev.into_transport();
    // The failed chunk is followed by chunk 0 of the same page, not chunk 3.
    assert_eq!(
        esc.write_log(),
        &[0x2000, 0x2100, 0x2200, 0x2000, 0x2100, 0x2200, 0x2300]
    );
    assert_eq!(&esc.memory()[0x2000..0x2400], &image[..]);
}

#[test]
fn lost_acknowledgment_retries_like_a_crc_error() {
    let mut esc = DummyEsc::new();
    esc.drop_reply_once_at(0x2100);
    let mut dev = session(esc, 8);

    let image = test_image(1024);
    flash::program(&mut dev, &image, &FlashConfig::default(), &mut NoProgress).unwrap();

    let esc = dev.into_transport();
    assert_eq!(
        esc.write_log(),
        &[0x2000, 0x2100, 0x2000, 0x2100, 0x2200, 0x2300]
    );
}

#[test]
fn device_nak_aborts_immediately() {
    let mut esc = DummyEsc::new();
    esc.nak_writes_at(0x2100);
    let mut dev = session(esc, 8);

    let err = flash::program(
        &mut dev,
        &test_image(1024),
        &FlashConfig::default(),
        &mut NoProgress,
    )
    .unwrap_err();

    match err {
        LinkError::DeviceNak {
            status, address, ..
        } => {
            assert_eq!(status, fourway_dummy::NAK_STATUS);
            assert_eq!(address, 0x2100);
        }
        other => panic!("expected DeviceNak, got {}", other),
    }

    // No retries after a NAK: only the accepted first chunk was written.
    assert_eq!(dev.into_transport().write_log(), &[0x2000]);
}

#[test]
fn verification_passes_after_a_clean_write() {
    let image = test_image(1000);
    let mut dev = session(DummyEsc::new(), 8);
    flash::program(&mut dev, &image, &FlashConfig::default(), &mut NoProgress).unwrap();
    flash::verify(&mut dev, &image, &FlashConfig::default(), &mut NoProgress).unwrap();
}

#[test]
fn verification_stops_at_the_first_mismatch() {
    let image = test_image(1000);
    let mut dev = session(DummyEsc::new(), 8);
    flash::program(&mut dev, &image, &FlashConfig::default(), &mut NoProgress).unwrap();

    // Plant a single-byte difference at image offset 50.
    dev.transport_mut().memory_mut()[0x2000 + 50] ^= 0xFF;

    let mut progress = Recorder::default();
    let err = flash::verify(&mut dev, &image, &FlashConfig::default(), &mut progress).unwrap_err();

    match err {
        LinkError::VerificationMismatch {
            offset,
            expected,
            found,
        } => {
            assert_eq!(offset, 50);
            assert_eq!(found, expected ^ 0xFF);
        }
        other => panic!("expected VerificationMismatch, got {}", other),
    }

    // Short-circuit: the mismatch lands in the first 128-byte chunk, so no
    // chunk ever completes.
    assert!(progress.verified.is_empty());
}

#[test]
fn flashing_requires_a_connected_session() {
    let mut dev = FourWay::new(DummyEsc::new());
    let err = flash::program(
        &mut dev,
        &test_image(256),
        &FlashConfig::default(),
        &mut NoProgress,
    )
    .unwrap_err();
    assert!(matches!(err, LinkError::NotConnected));
}

#[test]
fn cancellation_is_honored_between_chunks() {
    let mut dev = session(DummyEsc::new(), 8);
    let mut progress = Recorder {
        cancel_after: Some(2),
        ..Recorder::default()
    };

    let err = flash::program(
        &mut dev,
        &test_image(2048),
        &FlashConfig::default(),
        &mut progress,
    )
    .unwrap_err();
    assert!(matches!(err, LinkError::Cancelled));

    // Cancellation lands on a chunk boundary.
    assert_eq!(dev.into_transport().write_log().len(), 2);
}

#[test]
fn connect_gives_up_on_a_dead_line() {
    let mut esc = DummyEsc::new();
    esc.corrupt_all_replies();
    let config = LinkConfig {
        ack_timeout: Duration::from_millis(5),
        retry_budget: 4,
    };
    let mut dev = FourWay::with_config(esc, config);
    dev.enable_passthrough().unwrap();

    let err = dev.connect(0).unwrap_err();
    assert!(matches!(err, LinkError::NotConnected));
    assert!(!dev.is_connected());
}

#[test]
fn failed_reconnect_clears_the_connected_state() {
    let mut dev = session(DummyEsc::new(), 4);
    assert!(dev.is_connected());

    // A connect attempt that never sees a clean init-flash ack must not
    // leave the session marked connected from the earlier handshake.
    dev.transport_mut().corrupt_all_replies();
    let err = dev.connect(0).unwrap_err();
    assert!(matches!(err, LinkError::NotConnected));
    assert!(!dev.is_connected());
}

#[test]
fn shutdown_sends_exit_interface_and_disconnects() {
    let mut dev = session(DummyEsc::new(), 8);
    assert!(dev.is_connected());

    dev.shutdown();
    assert!(!dev.is_connected());

    // The emulator saw the exit-interface command and left flash mode.
    assert!(!dev.into_transport().flash_initialized());
}

#[test]
fn settings_record_round_trip() {
    let mut dev = session(DummyEsc::new(), 8);

    let mut record = dev.read_settings().unwrap();
    assert!(record.is_present());
    assert_eq!(record.flag(SettingFlag::Bidirectional), Some(false));

    assert!(record.set_flag(SettingFlag::Bidirectional, true));
    dev.write_settings(&record).unwrap();

    let reread = dev.read_settings().unwrap();
    assert_eq!(reread.flag(SettingFlag::Bidirectional), Some(true));
}

#[test]
fn absent_settings_report_unknown() {
    let mut esc = DummyEsc::new();
    esc.clear_settings();
    let mut dev = session(esc, 8);

    let record = dev.read_settings().unwrap();
    assert!(!record.is_present());
    for flag in SettingFlag::ALL {
        assert_eq!(record.flag(flag), None);
    }
}

#[test]
fn erase_commands_acknowledge() {
    let mut dev = session(DummyEsc::new(), 8);
    flash::program(
        &mut dev,
        &test_image(1024),
        &FlashConfig::default(),
        &mut NoProgress,
    )
    .unwrap();

    dev.erase_page(8).unwrap();
    assert!(dev.into_transport().memory()[0x2000..0x2400]
        .iter()
        .all(|&b| b == 0xFF));
}

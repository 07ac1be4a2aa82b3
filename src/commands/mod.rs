//! Command implementations

pub mod connect;
pub mod eeprom;
pub mod erase;
pub mod read;
pub mod verify;
pub mod write;

use std::time::Duration;

use fourway_dummy::DummyEsc;
use fourway_link::{FourWay, LinkConfig, Transport};
use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::LinkArgs;

/// Open a transport, enable pass-through and run the connect handshake
pub fn open_session(
    link: &LinkArgs,
) -> Result<FourWay<Box<dyn Transport>>, Box<dyn std::error::Error>> {
    let transport: Box<dyn Transport> = if link.port == "dummy" {
        log::info!("using in-memory dummy ESC");
        Box::new(DummyEsc::new())
    } else {
        fourway_link::open_transport(&link.port)?
    };

    let config = LinkConfig {
        ack_timeout: Duration::from_millis(link.ack_timeout_ms),
        retry_budget: link.retries,
    };

    let mut dev = FourWay::with_config(transport, config);
    dev.enable_passthrough()?;
    dev.connect(link.device)?;
    println!("ESC {} connected", link.device);
    Ok(dev)
}

/// Progress reporter using indicatif progress bars
pub struct IndicatifProgress {
    bar: Option<ProgressBar>,
}

impl Default for IndicatifProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl IndicatifProgress {
    pub fn new() -> Self {
        Self { bar: None }
    }

    fn create_bar(&mut self, total: u64, phase: &'static str) {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(&format!(
                    "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{bytes}}/{{total_bytes}} {}",
                    phase
                ))
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        self.bar = Some(pb);
    }

    fn finish(&mut self, message: &'static str) {
        if let Some(pb) = self.bar.take() {
            pb.finish_with_message(message);
        }
    }
}

impl fourway_link::flash::FlashProgress for IndicatifProgress {
    fn writing(&mut self, total_bytes: usize) {
        self.create_bar(total_bytes as u64, "Writing");
    }

    fn write_progress(&mut self, bytes_sent: usize, _percent: u8) {
        if let Some(pb) = &self.bar {
            pb.set_position(bytes_sent as u64);
        }
    }

    fn verifying(&mut self, total_bytes: usize) {
        self.finish("Write complete");
        self.create_bar(total_bytes as u64, "Verifying");
    }

    fn verify_progress(&mut self, bytes_checked: usize) {
        if let Some(pb) = &self.bar {
            pb.set_position(bytes_checked as u64);
        }
    }
}

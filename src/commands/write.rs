//! Write command implementation

use std::path::Path;

use fourway_link::flash::{self, FlashConfig};

use crate::cli::LinkArgs;
use crate::commands::{open_session, IndicatifProgress};

/// Flash a firmware image, then verify it unless told not to
pub fn run_write(
    link: &LinkArgs,
    input: &Path,
    no_verify: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let image = std::fs::read(input)?;
    println!("Read {} bytes from {:?}", image.len(), input);

    let mut dev = open_session(link)?;
    let cfg = FlashConfig::default();
    let mut progress = IndicatifProgress::new();

    let stats = flash::program(&mut dev, &image, &cfg, &mut progress)?;

    if no_verify {
        progress.finish("Write complete");
    } else {
        flash::verify(&mut dev, &image, &cfg, &mut progress)?;
        progress.finish("Verify complete");
    }

    println!(
        "Wrote {} bytes in {} pages ({} rewinds)",
        stats.bytes_written, stats.pages_written, stats.retries
    );
    dev.shutdown();
    Ok(())
}

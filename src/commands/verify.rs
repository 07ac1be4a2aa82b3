//! Verify command implementation

use std::path::Path;

use fourway_link::flash::{self, FlashConfig};

use crate::cli::LinkArgs;
use crate::commands::{open_session, IndicatifProgress};

/// Compare flashed memory against a firmware image
pub fn run_verify(link: &LinkArgs, input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let image = std::fs::read(input)?;
    println!("Read {} bytes from {:?}", image.len(), input);

    let mut dev = open_session(link)?;
    let mut progress = IndicatifProgress::new();

    flash::verify(&mut dev, &image, &FlashConfig::default(), &mut progress)?;
    progress.finish("Verify complete");

    println!("Verification passed");
    dev.shutdown();
    Ok(())
}

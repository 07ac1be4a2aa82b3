//! Erase command implementation

use crate::cli::LinkArgs;
use crate::commands::open_session;

/// Erase a single page or the entire flash
pub fn run_erase(
    link: &LinkArgs,
    page: Option<u8>,
    all: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut dev = open_session(link)?;

    match (page, all) {
        (Some(page), false) => {
            dev.erase_page(page)?;
            println!("Erased page {}", page);
        }
        (None, true) => {
            dev.erase_all()?;
            println!("Erased all flash");
        }
        _ => return Err("specify either --page N or --all".into()),
    }

    dev.shutdown();
    Ok(())
}

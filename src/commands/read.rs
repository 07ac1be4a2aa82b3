//! Read command implementation

use std::io::Write;
use std::path::Path;

use fourway_core::protocol::VERIFY_CHUNK_SIZE;

use crate::cli::LinkArgs;
use crate::commands::open_session;

/// Dump a region of device memory to a file
pub fn run_read(
    link: &LinkArgs,
    output: &Path,
    address: u16,
    length: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    if length == 0 {
        return Err("length must be non-zero".into());
    }
    if address as usize + length > 0x1_0000 {
        return Err(format!(
            "region 0x{:04X}+{} exceeds the device address space",
            address, length
        )
        .into());
    }

    let mut dev = open_session(link)?;
    let mut dump = Vec::with_capacity(length);

    let mut offset = 0usize;
    while offset < length {
        let len = VERIFY_CHUNK_SIZE.min(length - offset);
        let chunk = dev.read(address + offset as u16, len)?;
        dump.extend_from_slice(&chunk);
        offset += len;
    }

    let mut file = std::fs::File::create(output)?;
    file.write_all(&dump)?;
    println!("Dumped {} bytes from 0x{:04X} to {:?}", length, address, output);
    dev.shutdown();
    Ok(())
}

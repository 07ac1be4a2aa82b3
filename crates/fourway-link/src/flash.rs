//! Flashing and verification workflow
//!
//! The programmer splits the image into 1024-byte pages of four 256-byte
//! chunks and drives write-then-acknowledge cycles. A CRC-failed or lost
//! acknowledgment rewinds the whole current page to chunk 0, since the
//! device-side page state may be inconsistent after the error; a device NAK
//! aborts immediately. The verifier re-reads flashed memory in 128-byte
//! chunks and stops at the first mismatching byte.

use fourway_core::protocol::{CHUNK_SIZE, FLASH_BASE, PAGE_SIZE, VERIFY_BASE, VERIFY_CHUNK_SIZE};

use crate::device::{FourWay, Response};
use crate::error::{LinkError, Result};
use crate::transport::Transport;

/// End of the 16-bit device address space
const ADDRESS_SPACE: usize = 0x1_0000;

/// Address layout and chunk sizes for the flashing workflow
#[derive(Debug, Clone)]
pub struct FlashConfig {
    /// Base address writes start at
    pub flash_base: u16,
    /// Base address verification reads start at
    pub verify_base: u16,
    /// Page size in bytes; the rewind unit on retry
    pub page_size: usize,
    /// Write chunk size in bytes
    pub chunk_size: usize,
    /// Verification read chunk size in bytes
    pub verify_chunk_size: usize,
}

impl Default for FlashConfig {
    fn default() -> Self {
        Self {
            flash_base: FLASH_BASE,
            verify_base: VERIFY_BASE,
            page_size: PAGE_SIZE,
            chunk_size: CHUNK_SIZE,
            verify_chunk_size: VERIFY_CHUNK_SIZE,
        }
    }
}

/// Progress and cancellation sink for the flashing workflow
///
/// Callbacks fire between chunks, never mid-frame; returning true from
/// [`FlashProgress::cancelled`] stops the loop at the next chunk boundary.
pub trait FlashProgress {
    /// Writing is about to start
    fn writing(&mut self, _total_bytes: usize) {}

    /// A chunk was acknowledged; `percent` is `bytes_sent * 100 / total`
    fn write_progress(&mut self, _bytes_sent: usize, _percent: u8) {}

    /// Verification is about to start
    fn verifying(&mut self, _total_bytes: usize) {}

    /// A verify chunk compared equal
    fn verify_progress(&mut self, _bytes_checked: usize) {}

    /// Poll for cancellation
    fn cancelled(&mut self) -> bool {
        false
    }
}

/// No-op progress sink
pub struct NoProgress;

impl FlashProgress for NoProgress {}

/// Outcome of a completed write pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlashStats {
    /// Image bytes acknowledged by the device
    pub bytes_written: usize,
    /// Pages completed, counting a partial trailing page
    pub pages_written: usize,
    /// Page rewinds spent on CRC mismatches and timeouts
    pub retries: u32,
}

/// Write an image to the device, page by page
///
/// Requires a connected session. The address for each chunk is
/// `flash_base + page * page_size + chunk * chunk_size`, monotonic except
/// on the page-rewind retry path.
pub fn program<T: Transport, P: FlashProgress>(
    dev: &mut FourWay<T>,
    image: &[u8],
    cfg: &FlashConfig,
    progress: &mut P,
) -> Result<FlashStats> {
    if !dev.is_connected() {
        return Err(LinkError::NotConnected);
    }

    let total = image.len();
    let mut stats = FlashStats::default();
    if total == 0 {
        return Ok(stats);
    }
    if cfg.flash_base as usize + total > ADDRESS_SPACE {
        return Err(LinkError::ImageTooLarge(total));
    }

    let budget = dev.config().retry_budget.max(1);
    progress.writing(total);
    log::info!(
        "writing {} bytes at 0x{:04X}, {} byte pages",
        total,
        cfg.flash_base,
        cfg.page_size
    );

    let page_count = total.div_ceil(cfg.page_size);
    for page in 0..page_count {
        let page_start = page * cfg.page_size;
        let page_len = cfg.page_size.min(total - page_start);
        let mut attempts: u32 = 0;
        let mut chunk = 0usize;

        while chunk * cfg.chunk_size < page_len {
            if progress.cancelled() {
                return Err(LinkError::Cancelled);
            }

            let chunk_start = page_start + chunk * cfg.chunk_size;
            let chunk_len = cfg.chunk_size.min(total - chunk_start);
            let address = cfg.flash_base + chunk_start as u16;
            let data = &image[chunk_start..chunk_start + chunk_len];

            let frame = fourway_core::command::write(address, data)?;
            match dev.transact(&frame) {
                Ok(Response::Ack) | Ok(Response::Connected) => {
                    attempts = 0;
                    chunk += 1;
                    let bytes_sent = (chunk_start + chunk_len).min(total);
                    progress.write_progress(bytes_sent, (bytes_sent * 100 / total) as u8);
                }
                Ok(Response::Data(_)) => {
                    // A data reply to a write is nonsense; treat like a
                    // garbled line and spend retry budget on it.
                    attempts = spend_retry(attempts, budget, page, address)?;
                    chunk = 0;
                    stats.retries += 1;
                }
                Err(e) if e.is_retryable() => {
                    log::warn!("page {} chunk {} at 0x{:04X}: {}", page, chunk, address, e);
                    attempts = spend_retry(attempts, budget, page, address)?;
                    chunk = 0;
                    stats.retries += 1;
                }
                Err(e) => return Err(e),
            }
        }

        stats.pages_written += 1;
        stats.bytes_written = (page_start + page_len).min(total);
    }

    log::info!(
        "wrote {} bytes in {} pages ({} rewinds)",
        stats.bytes_written,
        stats.pages_written,
        stats.retries
    );
    Ok(stats)
}

fn spend_retry(attempts: u32, budget: u32, page: usize, address: u16) -> Result<u32> {
    let attempts = attempts + 1;
    if attempts >= budget {
        return Err(LinkError::RetryBudgetExhausted {
            attempts,
            page,
            address,
        });
    }
    Ok(attempts)
}

/// Re-read flashed memory and byte-compare against the source image
///
/// Reads `verify_chunk_size` bytes at a time starting at `verify_base`;
/// each read retries up to the session budget. The first mismatching byte
/// aborts with [`LinkError::VerificationMismatch`].
pub fn verify<T: Transport, P: FlashProgress>(
    dev: &mut FourWay<T>,
    image: &[u8],
    cfg: &FlashConfig,
    progress: &mut P,
) -> Result<()> {
    if !dev.is_connected() {
        return Err(LinkError::NotConnected);
    }

    let total = image.len();
    if total == 0 {
        return Ok(());
    }
    if cfg.verify_base as usize + total > ADDRESS_SPACE {
        return Err(LinkError::ImageTooLarge(total));
    }

    progress.verifying(total);
    log::info!("verifying {} bytes at 0x{:04X}", total, cfg.verify_base);

    let mut offset = 0usize;
    while offset < total {
        if progress.cancelled() {
            return Err(LinkError::Cancelled);
        }

        let len = cfg.verify_chunk_size.min(total - offset);
        let address = cfg.verify_base + offset as u16;
        let readback = dev.read(address, len)?;

        for (i, (&found, &expected)) in readback.iter().zip(&image[offset..offset + len]).enumerate()
        {
            if found != expected {
                return Err(LinkError::VerificationMismatch {
                    offset: offset + i,
                    expected,
                    found,
                });
            }
        }

        offset += len;
        progress.verify_progress(offset);
    }

    log::info!("verification passed");
    Ok(())
}

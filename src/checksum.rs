//! Checksum over the cartridge code pages, as computed by the console boot ROM.
//!
//! The sum covers bytes `0x0000..0x7ff0` (everything before the header) followed by
//! every further 16 KiB page the header's ROM size declares, starting at `0x8000`.

use log::{debug, trace};

use crate::error::RomError;
use crate::field::get_field;
use crate::header::HeaderField;
use crate::size::resolved_size;

pub const PAGE_SIZE: usize = 0x4000;

/// Start of the first page after the header.
const FIRST_EXTRA_PAGE: usize = 0x8000;

/// Adds `bytes` to a running checksum.
///
/// The low byte wraps, and a carry moves into the high byte whenever the low byte
/// decreased across an addition. The high byte wraps as well.
pub fn accumulate(checksum: u16, bytes: &[u8]) -> u16 {
    let [mut low, mut high] = checksum.to_le_bytes();
    for &byte in bytes {
        let wrapped = (u16::from(low) + u16::from(byte)) as u8;
        let carry = u8::from(low > wrapped);
        low = wrapped;
        high = high.wrapping_add(carry);
    }
    u16::from_le_bytes([low, high])
}

/// Computes the checksum of `data` for a ROM that declares `virtual_size` bytes.
///
/// # Errors
///
/// - [`RomError::UnresolvedSize`] if `virtual_size` is smaller than two pages.
/// - [`RomError::OutOfRange`] if a page lies past the end of `data`.
pub fn calculate_with_size(data: &[u8], virtual_size: usize) -> Result<u16, RomError> {
    let pages = virtual_size / PAGE_SIZE;
    let extra_pages = pages.checked_sub(2).ok_or_else(|| RomError::UnresolvedSize {
        details: format!(
            "declared size of {} bytes is smaller than two {} byte pages",
            virtual_size, PAGE_SIZE
        ),
    })?;
    debug!(
        "Checksumming header page and {} extra page(s) for a {} byte ROM",
        extra_pages, virtual_size
    );

    let header_start = HeaderField::TmrSega.spec().offset;
    let mut checksum = accumulate(0, get_field(data, 0, header_start)?);

    let mut start = FIRST_EXTRA_PAGE;
    for _ in 0..extra_pages {
        checksum = accumulate(checksum, get_field(data, start, PAGE_SIZE)?);
        trace!("Checksum after page at 0x{:05x}: 0x{:04x}", start, checksum);
        start += PAGE_SIZE;
    }

    Ok(checksum)
}

/// Computes the checksum of `data`, using the ROM size its header declares.
pub fn calculate(data: &[u8]) -> Result<u16, RomError> {
    let virtual_size = resolved_size(data).map_err(|err| match err {
        RomError::UnknownSizeCode(code) => RomError::UnresolvedSize {
            details: format!("unknown ROM size code 0x{:x}", code),
        },
        other => other,
    })?;
    calculate_with_size(data, virtual_size)
}

/// The two bytes to store at the checksum offset.
pub fn compute_checksum(data: &[u8]) -> Result<[u8; 2], RomError> {
    Ok(calculate(data)?.to_le_bytes())
}

/// The checksum bytes currently stored in the header.
pub fn stored_checksum(data: &[u8]) -> Result<[u8; 2], RomError> {
    let field = HeaderField::Checksum.read(data)?;
    Ok([field[0], field[1]])
}

/// Whether the stored checksum matches the computed one.
pub fn verify(data: &[u8]) -> Result<bool, RomError> {
    Ok(stored_checksum(data)? == compute_checksum(data)?)
}

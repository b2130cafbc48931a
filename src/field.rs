//! Bounds-checked access to raw ROM bytes.
//!
//! Every header reader in this crate goes through these helpers, so a ROM that is
//! too short for a field produces [`RomError::OutOfRange`] instead of a panic.

use log::trace;

use crate::error::RomError;

/// Returns exactly `length` bytes of `data` starting at `offset`.
///
/// # Examples
///
/// ```rust
/// use sms_rom_tools::field::get_field;
///
/// let data = [0x10, 0x20, 0x30, 0x40];
/// assert_eq!(get_field(&data, 1, 2).unwrap(), &[0x20u8, 0x30]);
/// assert!(get_field(&data, 3, 2).is_err());
/// ```
pub fn get_field(data: &[u8], offset: usize, length: usize) -> Result<&[u8], RomError> {
    let out_of_range = || RomError::OutOfRange {
        offset,
        length,
        rom_size: data.len(),
    };
    let end = offset.checked_add(length).ok_or_else(out_of_range)?;
    trace!("Reading {} bytes at 0x{:04x}", length, offset);
    data.get(offset..end).ok_or_else(out_of_range)
}

/// Reads a zero-terminated Latin-1 string starting at `offset`.
///
/// Returns `None` when nothing could be read: either `offset` is past the end of the
/// buffer or the very first byte is the terminator.
pub fn get_str_field(data: &[u8], offset: usize) -> Option<String> {
    let field: String = data
        .get(offset..)?
        .iter()
        .take_while(|&&byte| byte != 0)
        .map(|&byte| char::from(byte))
        .collect();

    if field.is_empty() { None } else { Some(field) }
}

/// Reads a little-endian `u16` at `offset`.
pub fn get_u16_le(data: &[u8], offset: usize) -> Result<u16, RomError> {
    let bytes = get_field(data, offset, 2)?;
    Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_field_in_range() -> Result<(), RomError> {
        let data = vec![0xAA; 0x8000];
        let field = get_field(&data, 0x7ff0, 0x10)?;
        assert_eq!(field.len(), 0x10);
        Ok(())
    }

    #[test]
    fn test_get_field_out_of_range() {
        let data = vec![0; 0x7fff];
        match get_field(&data, 0x7ffc, 4) {
            Err(RomError::OutOfRange {
                offset,
                length,
                rom_size,
            }) => {
                assert_eq!(offset, 0x7ffc);
                assert_eq!(length, 4);
                assert_eq!(rom_size, 0x7fff);
            }
            other => panic!("Expected OutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn test_get_field_ending_exactly_at_end_of_rom() -> Result<(), RomError> {
        let mut data = vec![0; 0x7fff];
        data[0x7ffc..].copy_from_slice(&[0x12, 0x34, 0x56]);
        assert_eq!(get_field(&data, 0x7ffc, 3)?, &[0x12u8, 0x34, 0x56]);
        assert!(get_field(&data, 0x7ffd, 3).is_err());
        Ok(())
    }

    #[test]
    fn test_get_field_overflowing_offset() {
        let data = vec![0; 16];
        assert!(get_field(&data, usize::MAX, 2).is_err());
    }

    #[test]
    fn test_get_str_field_reads_until_terminator() {
        let mut data = vec![0; 32];
        data[4..9].copy_from_slice(b"Hello");
        assert_eq!(get_str_field(&data, 4), Some("Hello".to_string()));
    }

    #[test]
    fn test_get_str_field_latin1() {
        let data = [b'c', 0xE9, 0x00];
        assert_eq!(get_str_field(&data, 0), Some("c\u{e9}".to_string()));
    }

    #[test]
    fn test_get_str_field_runs_to_end_of_buffer() {
        let data = *b"ABC";
        assert_eq!(get_str_field(&data, 1), Some("BC".to_string()));
    }

    #[test]
    fn test_get_str_field_not_available() {
        let data = [0u8; 8];
        assert_eq!(get_str_field(&data, 2), None);
        assert_eq!(get_str_field(&data, 8), None);
        assert_eq!(get_str_field(&data, 0xffff), None);
    }

    #[test]
    fn test_get_u16_le() -> Result<(), RomError> {
        let data = [0x00, 0x34, 0x12];
        assert_eq!(get_u16_le(&data, 1)?, 0x1234);
        assert!(get_u16_le(&data, 2).is_err());
        Ok(())
    }
}

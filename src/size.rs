use serde::Serialize;

use crate::error::RomError;
use crate::header::read_region_size_nibbles;

const KB: usize = 1024;

/// ROM sizes encoded in the low nibble of `0x7fff`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RomSize {
    Size8Kb = 0xa,
    Size16Kb = 0xb,
    Size32Kb = 0xc,
    Size48Kb = 0xd,
    Size64Kb = 0xe,
    Size128Kb = 0xf,
    Size256Kb = 0x0,
    Size512Kb = 0x1,
    Size1Mb = 0x2,
}

impl RomSize {
    pub fn from_code(code: u8) -> Option<RomSize> {
        match code {
            0xa => Some(RomSize::Size8Kb),
            0xb => Some(RomSize::Size16Kb),
            0xc => Some(RomSize::Size32Kb),
            0xd => Some(RomSize::Size48Kb),
            0xe => Some(RomSize::Size64Kb),
            0xf => Some(RomSize::Size128Kb),
            0x0 => Some(RomSize::Size256Kb),
            0x1 => Some(RomSize::Size512Kb),
            0x2 => Some(RomSize::Size1Mb),
            _ => None,
        }
    }

    pub fn bytes(self) -> usize {
        match self {
            RomSize::Size8Kb => 8 * KB,
            RomSize::Size16Kb => 16 * KB,
            RomSize::Size32Kb => 32 * KB,
            RomSize::Size48Kb => 48 * KB,
            RomSize::Size64Kb => 64 * KB,
            RomSize::Size128Kb => 128 * KB,
            RomSize::Size256Kb => 256 * KB,
            RomSize::Size512Kb => 512 * KB,
            RomSize::Size1Mb => 1024 * KB,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RomSize::Size8Kb => "8kb",
            RomSize::Size16Kb => "16kb",
            RomSize::Size32Kb => "32kb",
            RomSize::Size48Kb => "48kb",
            RomSize::Size64Kb => "64kb",
            RomSize::Size128Kb => "128kb",
            RomSize::Size256Kb => "256kb",
            RomSize::Size512Kb => "512kb",
            RomSize::Size1Mb => "1mb",
        }
    }
}

/// Maps a ROM size nibble to the number of bytes it declares.
///
/// # Examples
///
/// ```rust
/// use sms_rom_tools::size::resolve_rom_size_code;
///
/// assert_eq!(resolve_rom_size_code(0xc).unwrap(), 0x8000);
/// assert!(resolve_rom_size_code(0x5).is_err());
/// ```
pub fn resolve_rom_size_code(code: u8) -> Result<usize, RomError> {
    RomSize::from_code(code)
        .map(RomSize::bytes)
        .ok_or(RomError::UnknownSizeCode(code))
}

/// The real length of the ROM buffer.
pub fn actual_size(data: &[u8]) -> usize {
    data.len()
}

/// The size declared by the header of `data`.
pub fn resolved_size(data: &[u8]) -> Result<usize, RomError> {
    let (_, rom_size_code) = read_region_size_nibbles(data)?;
    resolve_rom_size_code(rom_size_code)
}

/// Checks that the size declared by the header of `data` matches the buffer length.
pub fn check_size_consistency(data: &[u8]) -> Result<(), RomError> {
    let (_, rom_size_code) = read_region_size_nibbles(data)?;
    check_declared_size(rom_size_code, data)
}

/// Checks that `rom_size_code` declares exactly the length of `data`.
pub fn check_declared_size(rom_size_code: u8, data: &[u8]) -> Result<(), RomError> {
    let declared = resolve_rom_size_code(rom_size_code)?;
    let real = actual_size(data);
    if declared != real {
        return Err(RomError::ValidationFailure {
            expected: real.to_string(),
            actual: declared.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::tests::create_rom_with_header;

    #[test]
    fn test_resolve_every_assigned_code() -> Result<(), RomError> {
        let table = [
            (0x0, 256 * KB),
            (0x1, 512 * KB),
            (0x2, 1024 * KB),
            (0xa, 8 * KB),
            (0xb, 16 * KB),
            (0xc, 32 * KB),
            (0xd, 48 * KB),
            (0xe, 64 * KB),
            (0xf, 128 * KB),
        ];
        for (code, bytes) in table {
            assert_eq!(resolve_rom_size_code(code)?, bytes, "code 0x{:x}", code);
        }
        Ok(())
    }

    #[test]
    fn test_resolve_unassigned_codes_fail() {
        for code in 0x3..=0x9 {
            assert!(matches!(
                resolve_rom_size_code(code),
                Err(RomError::UnknownSizeCode(c)) if c == code
            ));
        }
    }

    #[test]
    fn test_resolved_size_reads_low_nibble() -> Result<(), RomError> {
        let data = create_rom_with_header(0x8000, 0x4c);
        assert_eq!(resolved_size(&data)?, 0x8000);
        assert_eq!(actual_size(&data), 0x8000);
        check_size_consistency(&data)?;
        Ok(())
    }

    #[test]
    fn test_size_mismatch_reports_both_values() {
        let data = create_rom_with_header(0x8000, 0x4a);
        let err = check_size_consistency(&data).unwrap_err();
        assert_eq!(err.to_string(), "8192 != 32768");
    }

    #[test]
    fn test_check_declared_size() {
        let data = vec![0; 0x10000];
        assert!(check_declared_size(0xe, &data).is_ok());
        assert!(matches!(
            check_declared_size(0xf, &data),
            Err(RomError::ValidationFailure { .. })
        ));
        assert!(matches!(
            check_declared_size(0x4, &data),
            Err(RomError::UnknownSizeCode(0x4))
        ));
    }

    #[test]
    fn test_resolved_size_short_rom() {
        let data = vec![0; 0x100];
        assert!(matches!(
            resolved_size(&data),
            Err(RomError::OutOfRange { .. })
        ));
    }
}

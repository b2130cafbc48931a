use std::error::Error;
use std::fmt;

use zip::result::ZipError;

/// Errors produced while reading, validating or patching a ROM image.
#[derive(Debug)]
pub enum RomError {
    /// A field read reached past the end of the ROM buffer.
    OutOfRange {
        offset: usize,
        length: usize,
        rom_size: usize,
    },
    /// A field expected to hold text contained non-ASCII bytes.
    DecodeError {
        field: &'static str,
        bytes: Vec<u8>,
    },
    /// The ROM size nibble is not one of the assigned codes.
    UnknownSizeCode(u8),
    /// The checksum engine could not derive a page count from the header.
    UnresolvedSize { details: String },
    /// A header field did not hold the value it should.
    ValidationFailure { expected: String, actual: String },
    /// The buffer cannot hold the structure being read.
    DataTooSmall {
        file_size: usize,
        required_size: usize,
        details: String,
    },
    /// The path was given but does not exist.
    FileNotFound(String),
    /// The path has an extension this tool does not handle for the requested operation.
    UnsupportedFile(String),
    /// A zip archive contained no `.sms` or `.gg` entry.
    NoRomInArchive(String),
    IoError(std::io::Error),
    ZipError(ZipError),
    /// Another error, annotated with the file it came from.
    WithPath(String, Box<RomError>),
}

impl fmt::Display for RomError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RomError::OutOfRange {
                offset,
                length,
                rom_size,
            } => write!(
                f,
                "field at 0x{:04x} ({} bytes) is out of range for a {} byte ROM",
                offset, length, rom_size
            ),
            RomError::DecodeError { field, bytes } => {
                write!(f, "{} contains non-text bytes: {:02x?}", field, bytes)
            }
            RomError::UnknownSizeCode(code) => write!(f, "unknown ROM size code 0x{:x}", code),
            RomError::UnresolvedSize { details } => {
                write!(f, "cannot determine checksum page count: {}", details)
            }
            RomError::ValidationFailure { expected, actual } => {
                write!(f, "{} != {}", actual, expected)
            }
            RomError::DataTooSmall {
                file_size,
                required_size,
                details,
            } => write!(
                f,
                "ROM data is too small to contain a {} (size: {} bytes, requires at least {} bytes)",
                details, file_size, required_size
            ),
            RomError::FileNotFound(path) => write!(f, "File not found: {}", path),
            RomError::UnsupportedFile(path) => write!(f, "Unsupported file: {}", path),
            RomError::NoRomInArchive(path) => write!(
                f,
                "No supported ROM files found within the zip archive: {}",
                path
            ),
            RomError::IoError(err) => write!(f, "IO Error: {}", err),
            RomError::ZipError(err) => write!(f, "Zip Error: {}", err),
            RomError::WithPath(path, err) => write!(f, "{}: {}", path, err),
        }
    }
}

impl Error for RomError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RomError::IoError(err) => Some(err),
            RomError::ZipError(err) => Some(err),
            RomError::WithPath(_, err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<ZipError> for RomError {
    fn from(err: ZipError) -> RomError {
        RomError::ZipError(err)
    }
}

impl From<std::io::Error> for RomError {
    fn from(err: std::io::Error) -> RomError {
        RomError::IoError(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_failure_message() {
        let err = RomError::ValidationFailure {
            expected: "TMR SEGA".to_string(),
            actual: "TMR SEGO".to_string(),
        };
        assert_eq!(err.to_string(), "TMR SEGO != TMR SEGA");
    }

    #[test]
    fn test_with_path_wraps_source() {
        let err = RomError::WithPath("game.sms".to_string(), Box::new(RomError::UnknownSizeCode(5)));
        assert_eq!(err.to_string(), "game.sms: unknown ROM size code 0x5");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_data_too_small_message() {
        let err = RomError::DataTooSmall {
            file_size: 100,
            required_size: 0x8000,
            details: "ROM header".to_string(),
        };
        assert!(err.to_string().contains("too small"));
    }
}

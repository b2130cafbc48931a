//! Field-by-field validation of the primary header.
//!
//! Every check runs, in [`HeaderField::ALL`] order, whether or not an earlier one
//! failed. Errors raised while reading or interpreting a field become a failing
//! [`ValidationOutcome`] for that field.

use log::debug;
use serde::Serialize;

use crate::checksum::compute_checksum;
use crate::error::RomError;
use crate::header::{
    HeaderField, MIN_HEADER_ROM_SIZE, RegionCode, SEGA_HEADER_SIGNATURE, product_code_digits,
    read_region_size_nibbles,
};
use crate::size::check_declared_size;

const RESERVED_SPACE_PATTERNS: [[u8; 2]; 3] = [[0x00, 0x00], [0xff, 0xff], [0x20, 0x20]];

/// Result of checking a single header field.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct ValidationOutcome {
    pub field: HeaderField,
    pub name: &'static str,
    pub passed: bool,
    /// Why the check failed. Always `None` for a passing check.
    pub reason: Option<String>,
}

impl ValidationOutcome {
    /// Returns a printable line for this outcome.
    pub fn print(&self) -> String {
        match (&self.reason, self.passed) {
            (_, true) => format!("[  OK  ] {}", self.name),
            (Some(reason), false) => format!("[ FAIL ] {}...{}", self.name, reason),
            (None, false) => format!("[ FAIL ] {}", self.name),
        }
    }
}

/// Outcomes of one validation pass over a ROM.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct ValidationReport {
    pub source_name: String,
    pub outcomes: Vec<ValidationOutcome>,
}

impl ValidationReport {
    /// True when every field check passed.
    pub fn passed(&self) -> bool {
        self.outcomes.iter().all(|outcome| outcome.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ValidationOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.passed)
    }

    /// Returns a printable String of the report, one line per field.
    pub fn print(&self) -> String {
        let lines: Vec<String> = self.outcomes.iter().map(ValidationOutcome::print).collect();
        format!("{}\n{}", self.source_name, lines.join("\n"))
    }
}

fn check_tmr_sega(field: &[u8]) -> Result<(), RomError> {
    if field == SEGA_HEADER_SIGNATURE {
        return Ok(());
    }
    if !field.is_ascii() {
        return Err(RomError::DecodeError {
            field: HeaderField::TmrSega.name(),
            bytes: field.to_vec(),
        });
    }
    Err(RomError::ValidationFailure {
        expected: String::from_utf8_lossy(SEGA_HEADER_SIGNATURE).to_string(),
        actual: String::from_utf8_lossy(field).to_string(),
    })
}

fn check_reserved_space(field: &[u8]) -> Result<(), RomError> {
    if RESERVED_SPACE_PATTERNS.iter().any(|pattern| pattern == field) {
        return Ok(());
    }
    Err(RomError::ValidationFailure {
        expected: "0x0000, 0xffff or 0x2020".to_string(),
        actual: format!("0x{:02x}{:02x}", field[0], field[1]),
    })
}

fn check_checksum(field: &[u8], data: &[u8]) -> Result<(), RomError> {
    let computed = compute_checksum(data)?;
    if field == computed.as_slice() {
        return Ok(());
    }
    Err(RomError::ValidationFailure {
        expected: format!("0x{:02x}{:02x}", computed[0], computed[1]),
        actual: format!("0x{:02x}{:02x}", field[0], field[1]),
    })
}

fn check_product_code(field: &[u8]) -> Result<(), RomError> {
    let code = product_code_digits(field);
    if code.chars().all(|c| c.is_ascii_digit()) {
        return Ok(());
    }
    Err(RomError::ValidationFailure {
        expected: "a numerical string".to_string(),
        actual: code,
    })
}

fn check_version(field: &[u8]) -> Result<(), RomError> {
    let version = field[0] & 0x0f;
    if version <= 15 {
        return Ok(());
    }
    Err(RomError::ValidationFailure {
        expected: "a version in 0..=15".to_string(),
        actual: version.to_string(),
    })
}

fn check_region_code(region_code: u8) -> Result<(), RomError> {
    if RegionCode::from_nibble(region_code).is_some() {
        return Ok(());
    }
    Err(RomError::ValidationFailure {
        expected: format!(
            "a region code in {}..={}",
            RegionCode::SmsJapan as u8,
            RegionCode::GgInternational as u8
        ),
        actual: region_code.to_string(),
    })
}

/// The region and size nibbles of `0x7fff` when the byte could be read, otherwise the
/// read error for `field`.
fn shared_nibbles(
    field: HeaderField,
    data: &[u8],
    nibbles: Option<(u8, u8)>,
) -> Result<(u8, u8), RomError> {
    match nibbles {
        Some(pair) => Ok(pair),
        None => {
            field.read(data)?;
            read_region_size_nibbles(data)
        }
    }
}

fn check_field_with(
    field: HeaderField,
    data: &[u8],
    nibbles: Option<(u8, u8)>,
) -> Result<(), RomError> {
    match field {
        HeaderField::TmrSega => check_tmr_sega(field.read(data)?),
        HeaderField::ReservedSpace => check_reserved_space(field.read(data)?),
        HeaderField::Checksum => check_checksum(field.read(data)?, data),
        HeaderField::ProductCode => check_product_code(field.read(data)?),
        HeaderField::Version => check_version(field.read(data)?),
        HeaderField::RegionCode => {
            let (region_code, _) = shared_nibbles(field, data, nibbles)?;
            check_region_code(region_code)
        }
        HeaderField::RomSize => {
            let (_, rom_size_code) = shared_nibbles(field, data, nibbles)?;
            check_declared_size(rom_size_code, data)
        }
    }
}

/// Runs the check for `field` against `data`.
pub fn check_field(field: HeaderField, data: &[u8]) -> Result<(), RomError> {
    check_field_with(field, data, read_region_size_nibbles(data).ok())
}

/// Checks every header field and collects one outcome per field.
///
/// The byte shared by the region code and ROM size is read once for the whole pass.
pub fn validate_fields(data: &[u8]) -> Vec<ValidationOutcome> {
    let nibbles = read_region_size_nibbles(data).ok();
    HeaderField::ALL
        .iter()
        .map(|&field| {
            let result = check_field_with(field, data, nibbles);
            debug!("{}: {:?}", field.name(), result);
            ValidationOutcome {
                field,
                name: field.name(),
                passed: result.is_ok(),
                reason: result.err().map(|err| err.to_string()),
            }
        })
        .collect()
}

/// Validates the header of `data`.
///
/// # Errors
///
/// Returns [`RomError::DataTooSmall`] if `data` is shorter than the header itself.
/// Every other problem is reported in the returned [`ValidationReport`].
pub fn validate_rom(data: &[u8], source_name: &str) -> Result<ValidationReport, RomError> {
    if data.len() < MIN_HEADER_ROM_SIZE {
        return Err(RomError::DataTooSmall {
            file_size: data.len(),
            required_size: MIN_HEADER_ROM_SIZE,
            details: "ROM header".to_string(),
        });
    }

    Ok(ValidationReport {
        source_name: source_name.to_string(),
        outcomes: validate_fields(data),
    })
}

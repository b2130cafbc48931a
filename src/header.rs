//! The primary Sega 8-bit ROM header at `0x7ff0`.
//!
//! Header documentation referenced here:
//! <https://www.smspower.org/Development/ROMHeader>

use log::debug;
use serde::Serialize;

use crate::error::RomError;
use crate::field::get_field;
use crate::region::Region;
use crate::size::RomSize;

/// The header signature every licensed cartridge carries.
pub const SEGA_HEADER_SIGNATURE: &[u8; 8] = b"TMR SEGA";

/// Smallest buffer that holds the whole header.
pub const MIN_HEADER_ROM_SIZE: usize = 0x8000;

/// Where a header field lives in the ROM image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub offset: usize,
    pub length: usize,
}

/// The fields of the primary header, in validation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HeaderField {
    TmrSega,
    ReservedSpace,
    Checksum,
    ProductCode,
    Version,
    RegionCode,
    RomSize,
}

impl HeaderField {
    pub const ALL: [HeaderField; 7] = [
        HeaderField::TmrSega,
        HeaderField::ReservedSpace,
        HeaderField::Checksum,
        HeaderField::ProductCode,
        HeaderField::Version,
        HeaderField::RegionCode,
        HeaderField::RomSize,
    ];

    /// Offset and length of the field. Nibble fields are read as the whole byte.
    pub const fn spec(self) -> FieldSpec {
        match self {
            HeaderField::TmrSega => FieldSpec {
                offset: 0x7ff0,
                length: 8,
            },
            HeaderField::ReservedSpace => FieldSpec {
                offset: 0x7ff8,
                length: 2,
            },
            HeaderField::Checksum => FieldSpec {
                offset: 0x7ffa,
                length: 2,
            },
            // 2 bytes + 1 nibble
            HeaderField::ProductCode => FieldSpec {
                offset: 0x7ffc,
                length: 3,
            },
            HeaderField::Version => FieldSpec {
                offset: 0x7ffe,
                length: 1,
            },
            // Region code and ROM size share one byte.
            HeaderField::RegionCode | HeaderField::RomSize => FieldSpec {
                offset: 0x7fff,
                length: 1,
            },
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            HeaderField::TmrSega => "TMR SEGA",
            HeaderField::ReservedSpace => "Reserved space",
            HeaderField::Checksum => "Checksum",
            HeaderField::ProductCode => "Product code",
            HeaderField::Version => "Version",
            HeaderField::RegionCode => "Region code",
            HeaderField::RomSize => "ROM size",
        }
    }

    /// Reads the raw bytes of this field from `data`.
    ///
    /// Fails with [`RomError::OutOfRange`] for any ROM shorter than the full header,
    /// even if this field's own bytes are present.
    pub fn read(self, data: &[u8]) -> Result<&[u8], RomError> {
        let spec = self.spec();
        if data.len() < MIN_HEADER_ROM_SIZE {
            return Err(RomError::OutOfRange {
                offset: spec.offset,
                length: spec.length,
                rom_size: data.len(),
            });
        }
        get_field(data, spec.offset, spec.length)
    }
}

/// Splits the byte at `0x7fff` into `(region_code, rom_size_code)`.
pub fn split_region_size_byte(byte: u8) -> (u8, u8) {
    (byte >> 4, byte & 0x0f)
}

/// Reads the shared region/size byte once and returns both nibbles.
pub fn read_region_size_nibbles(data: &[u8]) -> Result<(u8, u8), RomError> {
    let field = HeaderField::RegionCode.read(data)?;
    Ok(split_region_size_byte(field[0]))
}

/// Returns the five product code digits of the raw 3-byte product code field.
///
/// The low nibble of the last byte is the version and is dropped.
///
/// # Examples
///
/// ```rust
/// use sms_rom_tools::header::product_code_digits;
///
/// assert_eq!(product_code_digits(&[0x12, 0x34, 0x5f]), "12345");
/// ```
pub fn product_code_digits(field: &[u8]) -> String {
    let mut digits: String = field.iter().map(|byte| format!("{:02x}", byte)).collect();
    digits.truncate(5);
    digits
}

/// Console and market named by the region code nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RegionCode {
    SmsJapan = 3,
    SmsExport = 4,
    GgJapan = 5,
    GgExport = 6,
    GgInternational = 7,
}

impl RegionCode {
    pub fn from_nibble(code: u8) -> Option<RegionCode> {
        match code {
            3 => Some(RegionCode::SmsJapan),
            4 => Some(RegionCode::SmsExport),
            5 => Some(RegionCode::GgJapan),
            6 => Some(RegionCode::GgExport),
            7 => Some(RegionCode::GgInternational),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RegionCode::SmsJapan => "sms japan",
            RegionCode::SmsExport => "sms export",
            RegionCode::GgJapan => "gg japan",
            RegionCode::GgExport => "gg export",
            RegionCode::GgInternational => "gg international",
        }
    }

    pub fn region(self) -> Region {
        match self {
            RegionCode::SmsJapan | RegionCode::GgJapan => Region::JAPAN,
            RegionCode::SmsExport | RegionCode::GgExport | RegionCode::GgInternational => {
                Region::USA | Region::EUROPE
            }
        }
    }
}

/// Decoded view of the primary header.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct RomHeader {
    /// The signature text, or `None` when it is not ASCII.
    pub tmr_sega: Option<String>,
    /// Stored checksum as read from `0x7ffa`.
    pub checksum: u16,
    /// Five hex digits of the product code.
    pub product_code: String,
    pub version: u8,
    pub region_code: u8,
    pub region: Option<RegionCode>,
    pub rom_size_code: u8,
    pub rom_size: Option<RomSize>,
}

impl RomHeader {
    /// Decodes the header of `data`.
    ///
    /// # Errors
    ///
    /// Returns [`RomError::DataTooSmall`] if `data` does not reach the end of the header.
    pub fn parse(data: &[u8]) -> Result<RomHeader, RomError> {
        if data.len() < MIN_HEADER_ROM_SIZE {
            return Err(RomError::DataTooSmall {
                file_size: data.len(),
                required_size: MIN_HEADER_ROM_SIZE,
                details: "ROM header".to_string(),
            });
        }

        let signature = HeaderField::TmrSega.read(data)?;
        let tmr_sega = signature
            .is_ascii()
            .then(|| String::from_utf8_lossy(signature).to_string());
        let checksum_bytes = HeaderField::Checksum.read(data)?;
        let checksum = u16::from_le_bytes([checksum_bytes[0], checksum_bytes[1]]);
        let product_code = product_code_digits(HeaderField::ProductCode.read(data)?);
        let version = HeaderField::Version.read(data)?[0] & 0x0f;
        let (region_code, rom_size_code) = read_region_size_nibbles(data)?;
        debug!(
            "Header region nibble 0x{:x}, size nibble 0x{:x}",
            region_code, rom_size_code
        );

        Ok(RomHeader {
            tmr_sega,
            checksum,
            product_code,
            version,
            region_code,
            region: RegionCode::from_nibble(region_code),
            rom_size_code,
            rom_size: RomSize::from_code(rom_size_code),
        })
    }

    /// Whether the signature field holds `TMR SEGA`.
    pub fn exists(&self) -> bool {
        self.tmr_sega.as_deref().map(str::as_bytes) == Some(SEGA_HEADER_SIGNATURE.as_slice())
    }

    /// Markets named by the region code, `Region::UNKNOWN` for unassigned codes.
    pub fn market(&self) -> Region {
        self.region.map_or(Region::UNKNOWN, RegionCode::region)
    }

    /// Returns a printable String of the header.
    pub fn print(&self) -> String {
        if !self.exists() {
            return "ROM HEADER\n\nnot available".to_string();
        }
        let region_name = self.region.map_or("unknown", RegionCode::name);
        let size_name = self.rom_size.map_or("unknown", RomSize::name);
        format!(
            "ROM HEADER\n\n\
             tmr sega:     {}\n\
             checksum:     0x{:04x}\n\
             product code: 0x{}\n\
             version:      0x{:x}\n\
             region code:  0x{:x} ({})\n\
             rom size:     0x{:x} ({})",
            self.tmr_sega.as_deref().unwrap_or_default(),
            self.checksum,
            self.product_code,
            self.version,
            self.region_code,
            region_name,
            self.rom_size_code,
            size_name
        )
    }
}

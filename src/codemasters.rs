//! CodeMasters header, found at `0x7fe0` on their later releases.
//!
//! CodeMasters header documentation referenced here:
//! <https://www.smspower.org/Development/CodemastersHeader>

use serde::Serialize;

use crate::error::RomError;
use crate::field::{get_field, get_u16_le};
use crate::header::MIN_HEADER_ROM_SIZE;
use crate::sdsc::SdscHeader;

const BANKS_NUMBER_OFFSET: usize = 0x7fe0;
const TIMESTAMP_OFFSET: usize = 0x7fe1;
const CHECKSUM_OFFSET: usize = 0x7fe6;
const INVERSE_CHECKSUM_OFFSET: usize = 0x7fe8;

#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct CodeMastersHeader {
    pub banks_number: u8,
    /// BCD `hh:mm dd/mm/yy`.
    pub timestamp: String,
    pub checksum: u16,
    /// Stored as `0x10000 - checksum`.
    pub inverse_checksum: u16,
}

impl CodeMastersHeader {
    /// Reads the CodeMasters header of `data`, or `None` if the ROM has none.
    ///
    /// The block overlaps the SDSC header, so a ROM with an SDSC marker never has one.
    pub fn find(data: &[u8]) -> Result<Option<CodeMastersHeader>, RomError> {
        if data.len() < MIN_HEADER_ROM_SIZE {
            return Err(RomError::DataTooSmall {
                file_size: data.len(),
                required_size: MIN_HEADER_ROM_SIZE,
                details: "CodeMasters header".to_string(),
            });
        }
        if SdscHeader::find(data)?.is_some() {
            return Ok(None);
        }

        let banks_number = get_field(data, BANKS_NUMBER_OFFSET, 1)?[0];
        if banks_number == 0 || banks_number == 0xff {
            return Ok(None);
        }

        let ts = get_field(data, TIMESTAMP_OFFSET, 5)?;
        Ok(Some(CodeMastersHeader {
            banks_number,
            timestamp: format!(
                "{:02x}:{:02x} {:02x}/{:02x}/{:02x}",
                ts[3], ts[4], ts[0], ts[1], ts[2]
            ),
            checksum: get_u16_le(data, CHECKSUM_OFFSET)?,
            inverse_checksum: get_u16_le(data, INVERSE_CHECKSUM_OFFSET)?,
        }))
    }

    /// Whether the inverse checksum word agrees with the checksum word.
    pub fn inverse_checksum_matches(&self) -> bool {
        u32::from(self.checksum) + u32::from(self.inverse_checksum) == 0x10000
    }

    /// Returns a printable String of the header.
    pub fn print(&self) -> String {
        format!(
            "CODEMASTERS HEADER\n\n\
             number of banks:  {}\n\
             timestamp:        {}\n\
             checksum:         0x{:04x}\n\
             inverse checksum: 0x{:04x}{}",
            self.banks_number,
            self.timestamp,
            self.checksum,
            self.inverse_checksum,
            if self.inverse_checksum_matches() {
                ""
            } else {
                " (mismatch)"
            }
        )
    }
}

/// Printable CodeMasters section for `header`, including the absent case.
pub fn print_codemasters(header: Option<&CodeMastersHeader>) -> String {
    header.map_or_else(
        || "CODEMASTERS HEADER\n\nnot available".to_string(),
        CodeMastersHeader::print,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_codemasters_rom(checksum: u16, inverse: u16) -> Vec<u8> {
        let mut data = vec![0; 0x8000];
        data[0x7fe0] = 8;
        data[0x7fe1..0x7fe6].copy_from_slice(&[0x24, 0x11, 0x93, 0x18, 0x05]);
        data[0x7fe6..0x7fe8].copy_from_slice(&checksum.to_le_bytes());
        data[0x7fe8..0x7fea].copy_from_slice(&inverse.to_le_bytes());
        data
    }

    #[test]
    fn test_find_codemasters_header() -> Result<(), RomError> {
        let data = create_codemasters_rom(0x1234, 0xedcc);
        let header = CodeMastersHeader::find(&data)?.expect("header present");
        assert_eq!(header.banks_number, 8);
        assert_eq!(header.timestamp, "18:05 24/11/93");
        assert_eq!(header.checksum, 0x1234);
        assert!(header.inverse_checksum_matches());
        assert!(!header.print().contains("mismatch"));
        Ok(())
    }

    #[test]
    fn test_inverse_checksum_mismatch() -> Result<(), RomError> {
        let data = create_codemasters_rom(0x1234, 0x0000);
        let header = CodeMastersHeader::find(&data)?.expect("header present");
        assert!(!header.inverse_checksum_matches());
        assert!(header.print().ends_with("(mismatch)"));
        Ok(())
    }

    #[test]
    fn test_no_header_for_empty_bank_count() -> Result<(), RomError> {
        for banks in [0x00, 0xff] {
            let mut data = create_codemasters_rom(0x1234, 0xedcc);
            data[0x7fe0] = banks;
            assert_eq!(CodeMastersHeader::find(&data)?, None);
        }
        assert_eq!(print_codemasters(None), "CODEMASTERS HEADER\n\nnot available");
        Ok(())
    }

    #[test]
    fn test_sdsc_rom_has_no_codemasters_header() -> Result<(), RomError> {
        let mut data = create_codemasters_rom(0x1234, 0xedcc);
        data[0x7fe0..0x7fe4].copy_from_slice(b"SDSC");
        assert_eq!(CodeMastersHeader::find(&data)?, None);
        Ok(())
    }
}

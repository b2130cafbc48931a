//! SDSC homebrew header, found at `0x7fe0` just before the primary header.
//!
//! SDSC header documentation referenced here:
//! <https://www.smspower.org/Development/SDSCHeader>

use log::debug;
use serde::Serialize;

use crate::error::RomError;
use crate::field::{get_field, get_str_field, get_u16_le};
use crate::header::MIN_HEADER_ROM_SIZE;

const SDSC_OFFSET: usize = 0x7fe0;
const VERSION_OFFSET: usize = 0x7fe4;
const DATE_OFFSET: usize = 0x7fe6;
const AUTHOR_POINTER_OFFSET: usize = 0x7fea;
const NAME_POINTER_OFFSET: usize = 0x7fec;
const DESCRIPTION_POINTER_OFFSET: usize = 0x7fee;

const SDSC_MARKER: &[u8] = b"SDSC";
/// Pointer value meaning "no string".
const NO_STRING: u16 = 0xffff;

#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct SdscHeader {
    /// BCD `major.minor`, e.g. `1.02`.
    pub version: String,
    /// BCD `dd/mm/yyyy`.
    pub date: String,
    pub author_pointer: u16,
    pub author: Option<String>,
    pub name_pointer: u16,
    pub name: Option<String>,
    pub description_pointer: u16,
    pub description: Option<String>,
}

fn pointed_string(data: &[u8], pointer: u16) -> Option<String> {
    if pointer == NO_STRING {
        return None;
    }
    get_str_field(data, usize::from(pointer))
}

impl SdscHeader {
    /// Reads the SDSC header of `data`, or `None` if the ROM has none.
    pub fn find(data: &[u8]) -> Result<Option<SdscHeader>, RomError> {
        if data.len() < MIN_HEADER_ROM_SIZE {
            return Err(RomError::DataTooSmall {
                file_size: data.len(),
                required_size: MIN_HEADER_ROM_SIZE,
                details: "SDSC header".to_string(),
            });
        }

        if get_field(data, SDSC_OFFSET, SDSC_MARKER.len())? != SDSC_MARKER {
            return Ok(None);
        }
        debug!("Found SDSC marker at 0x{:x}", SDSC_OFFSET);

        let version = get_field(data, VERSION_OFFSET, 2)?;
        let date = get_field(data, DATE_OFFSET, 4)?;
        let author_pointer = get_u16_le(data, AUTHOR_POINTER_OFFSET)?;
        let name_pointer = get_u16_le(data, NAME_POINTER_OFFSET)?;
        let description_pointer = get_u16_le(data, DESCRIPTION_POINTER_OFFSET)?;

        Ok(Some(SdscHeader {
            version: format!("{:x}.{:02x}", version[0], version[1]),
            date: format!(
                "{:02x}/{:02x}/{:02x}{:02x}",
                date[0], date[1], date[3], date[2]
            ),
            author_pointer,
            author: pointed_string(data, author_pointer),
            name_pointer,
            name: pointed_string(data, name_pointer),
            description_pointer,
            description: pointed_string(data, description_pointer),
        }))
    }

    /// Returns a printable String of the header.
    pub fn print(&self) -> String {
        const NOT_AVAILABLE: &str = "N/A";
        format!(
            "SDSC HEADER\n\n\
             version:              {}\n\
             date:                 {} (dd/mm/yyyy)\n\
             author pointer:       0x{:04x}\n\
             author:               {}\n\
             name pointer:         0x{:04x}\n\
             name:                 {}\n\
             description pointer:  0x{:04x}\n\
             description:          {}",
            self.version,
            self.date,
            self.author_pointer,
            self.author.as_deref().unwrap_or(NOT_AVAILABLE),
            self.name_pointer,
            self.name.as_deref().unwrap_or(NOT_AVAILABLE),
            self.description_pointer,
            self.description.as_deref().unwrap_or(NOT_AVAILABLE)
        )
    }
}

/// Printable SDSC section for `header`, including the absent case.
pub fn print_sdsc(header: Option<&SdscHeader>) -> String {
    header.map_or_else(|| "SDSC HEADER\n\nnot available".to_string(), SdscHeader::print)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_sdsc_rom() -> Vec<u8> {
        let mut data = vec![0; 0x8000];
        data[0x7fe0..0x7fe4].copy_from_slice(b"SDSC");
        data[0x7fe4..0x7fe6].copy_from_slice(&[0x01, 0x02]);
        data[0x7fe6..0x7fea].copy_from_slice(&[0x31, 0x12, 0x99, 0x19]);
        // author at 0x7000, no name, empty description
        data[0x7fea..0x7fec].copy_from_slice(&[0x00, 0x70]);
        data[0x7fec..0x7fee].copy_from_slice(&[0xff, 0xff]);
        data[0x7fee..0x7ff0].copy_from_slice(&[0x00, 0x71]);
        data[0x7000..0x7006].copy_from_slice(b"Maxim\0");
        data
    }

    #[test]
    fn test_find_sdsc_header() -> Result<(), RomError> {
        let header = SdscHeader::find(&create_sdsc_rom())?.expect("header present");
        assert_eq!(header.version, "1.02");
        assert_eq!(header.date, "31/12/1999");
        assert_eq!(header.author_pointer, 0x7000);
        assert_eq!(header.author.as_deref(), Some("Maxim"));
        assert_eq!(header.name, None);
        assert_eq!(header.description_pointer, 0x7100);
        assert_eq!(header.description, None);
        assert!(header.print().contains("name:                 N/A"));
        Ok(())
    }

    #[test]
    fn test_no_sdsc_header() -> Result<(), RomError> {
        for marker in [[0x00; 4], [0xff; 4], *b"SDSX"] {
            let mut data = vec![0; 0x8000];
            data[0x7fe0..0x7fe4].copy_from_slice(&marker);
            assert_eq!(SdscHeader::find(&data)?, None);
        }
        assert_eq!(print_sdsc(None), "SDSC HEADER\n\nnot available");
        Ok(())
    }

    #[test]
    fn test_sdsc_too_small() {
        let data = vec![0; 0x7fe0];
        assert!(SdscHeader::find(&data).is_err());
    }
}

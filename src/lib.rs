//! Inspection, validation and checksum patching of Sega Master System and Game Gear
//! ROM headers.
//!
//! The header model ([`header`], [`size`], [`checksum`], [`validation`]) works on
//! borrowed byte buffers only. Loading ROMs from disk and writing a fixed checksum back
//! lives in this module.

pub mod archive;
pub mod checksum;
pub mod codemasters;
pub mod error;
pub mod field;
pub mod header;
pub mod region;
pub mod sdsc;
pub mod size;
pub mod validation;

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Serialize;
use walkdir::WalkDir;

use crate::codemasters::{CodeMastersHeader, print_codemasters};
use crate::error::RomError;
use crate::header::{HeaderField, RomHeader};
use crate::region::check_region_mismatch;
use crate::sdsc::{SdscHeader, print_sdsc};

pub use crate::checksum::compute_checksum;
pub use crate::size::resolved_size;
pub use crate::validation::validate_rom;

pub const SUPPORTED_ROM_EXTENSIONS: &[&str] = &[
    ".sms", // Sega Master System
    ".gg",  // Sega Game Gear
];

pub const ARCHIVE_EXTENSION: &str = ".zip";

/// A ROM image read from disk.
#[derive(Debug, PartialEq, Clone)]
pub struct LoadedRom {
    pub data: Vec<u8>,
    /// The path it was read from, or `<archive>/<entry>` for zipped ROMs.
    pub source_name: String,
}

pub fn is_supported_rom(name: &str) -> bool {
    let lower_name = name.to_lowercase();
    SUPPORTED_ROM_EXTENSIONS
        .iter()
        .any(|ext| lower_name.ends_with(ext))
}

pub fn is_archive(name: &str) -> bool {
    name.to_lowercase().ends_with(ARCHIVE_EXTENSION)
}

fn open_rom_file(path: &Path, options: &OpenOptions) -> Result<File, RomError> {
    options.open(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => RomError::FileNotFound(path.display().to_string()),
        _ => RomError::IoError(err),
    })
}

/// Reads a ROM from `path`. Zip archives yield their first `.sms` / `.gg` entry; any
/// other file is read as a raw image.
pub fn read_rom_file(path: &Path) -> Result<LoadedRom, RomError> {
    let source_name = path.display().to_string();
    let mut file = open_rom_file(path, OpenOptions::new().read(true))?;

    if is_archive(&source_name) {
        return archive::zip::read_rom_from_zip(file, &source_name);
    }
    if !is_supported_rom(&source_name) {
        debug!("Reading {} as a raw ROM image", source_name);
    }

    let mut data = Vec::new();
    file.read_to_end(&mut data)?;
    Ok(LoadedRom { data, source_name })
}

/// Expands directories in `inputs` into the ROMs and archives they contain.
///
/// Plain file arguments are returned as given, whatever their extension.
pub fn collect_rom_paths(inputs: &[String]) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for input in inputs {
        let path = Path::new(input);
        if !path.is_dir() {
            paths.push(path.to_path_buf());
            continue;
        }

        let mut found: Vec<PathBuf> = WalkDir::new(path)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping unreadable entry under {}: {}", input, e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| {
                let name = path.to_string_lossy();
                is_supported_rom(&name) || is_archive(&name)
            })
            .collect();
        found.sort();
        debug!("Found {} ROM(s) under {}", found.len(), input);
        paths.extend(found);
    }
    paths
}

/// Recomputes the checksum of the ROM at `path` and writes it into the header in place.
///
/// Returns the bytes written.
pub fn write_checksum(path: &Path) -> Result<[u8; 2], RomError> {
    let source_name = path.display().to_string();
    if is_archive(&source_name) {
        return Err(RomError::UnsupportedFile(source_name));
    }

    debug!("[*] loading rom {}", source_name);
    let mut file = open_rom_file(path, OpenOptions::new().read(true).write(true))?;
    let mut data = Vec::new();
    file.read_to_end(&mut data)?;

    debug!("[*] calculating checksum...");
    let checksum = compute_checksum(&data)?;

    debug!("[*] patching rom...");
    let offset = HeaderField::Checksum.spec().offset;
    file.seek(SeekFrom::Start(offset as u64))?;
    file.write_all(&checksum)?;

    Ok(checksum)
}

/// Which header a dump should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKind {
    RomHeader,
    Sdsc,
    CodeMasters,
}

/// Every header found in a ROM.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct HeaderDump {
    pub source_name: String,
    pub rom_header: RomHeader,
    pub sdsc: Option<SdscHeader>,
    pub codemasters: Option<CodeMastersHeader>,
    /// If the region in the ROM header doesn't match the region in the filename.
    pub region_mismatch: bool,
}

impl HeaderDump {
    pub fn read(data: &[u8], source_name: &str) -> Result<HeaderDump, RomError> {
        let rom_header = RomHeader::parse(data)?;
        let region_mismatch =
            rom_header.exists() && check_region_mismatch(source_name, rom_header.market());

        Ok(HeaderDump {
            source_name: source_name.to_string(),
            region_mismatch,
            sdsc: SdscHeader::find(data)?,
            codemasters: CodeMastersHeader::find(data)?,
            rom_header,
        })
    }

    /// Returns a printable String of the requested headers, separated by blank lines.
    pub fn print(&self, kinds: &[HeaderKind]) -> String {
        let sections: Vec<String> = kinds
            .iter()
            .map(|kind| match kind {
                HeaderKind::RomHeader => self.rom_header.print(),
                HeaderKind::Sdsc => print_sdsc(self.sdsc.as_ref()),
                HeaderKind::CodeMasters => print_codemasters(self.codemasters.as_ref()),
            })
            .collect();
        format!("{}\n\n{}", self.source_name, sections.join("\n\n"))
    }
}

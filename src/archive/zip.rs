use std::fs::File;
use std::io::Read;

use log::debug;
use zip::ZipArchive;

use crate::error::RomError;
use crate::{LoadedRom, is_supported_rom};

/// Extracts the first `.sms` / `.gg` entry of a zip archive.
///
/// The returned source name is `<archive>/<entry>`, so region inference still sees
/// the entry's own filename.
pub fn read_rom_from_zip(file: File, original_filename: &str) -> Result<LoadedRom, RomError> {
    let mut archive = ZipArchive::new(file)?;

    debug!("[+] Reading ZIP archive: {}", original_filename);

    for i in 0..archive.len() {
        let mut file_in_zip = archive.by_index(i)?;
        if file_in_zip.is_dir() {
            continue;
        }

        let entry_name = file_in_zip.name().to_string();
        if !is_supported_rom(&entry_name) {
            debug!("[-] Skipping unsupported zip entry: {}", entry_name);
            continue;
        }

        debug!("[+] Found supported ROM in zip: {}", entry_name);
        let mut data = Vec::new();
        file_in_zip.read_to_end(&mut data)?;
        return Ok(LoadedRom {
            data,
            source_name: format!("{}/{}", original_filename, entry_name),
        });
    }

    Err(RomError::NoRomInArchive(original_filename.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::write::FileOptions;

    fn write_zip(path: &std::path::Path, entries: &[(&str, &[u8])]) -> Result<(), RomError> {
        let mut writer = zip::ZipWriter::new(File::create(path)?);
        for (name, contents) in entries {
            writer.start_file(*name, FileOptions::default())?;
            writer.write_all(contents)?;
        }
        writer.finish()?;
        Ok(())
    }

    #[test]
    fn test_read_first_supported_entry() -> Result<(), RomError> {
        let dir = tempdir()?;
        let path = dir.path().join("roms.zip");
        write_zip(
            &path,
            &[
                ("readme.txt", &b"hello"[..]),
                ("Game (J).sms", &b"ROMDATA"[..]),
                ("other.gg", &b"OTHER"[..]),
            ],
        )?;

        let rom = read_rom_from_zip(File::open(&path)?, "roms.zip")?;
        assert_eq!(rom.data, &b"ROMDATA"[..]);
        assert_eq!(rom.source_name, "roms.zip/Game (J).sms");
        Ok(())
    }

    #[test]
    fn test_archive_without_rom() -> Result<(), RomError> {
        let dir = tempdir()?;
        let path = dir.path().join("docs.zip");
        write_zip(&path, &[("manual.pdf", &b"%PDF"[..])])?;

        match read_rom_from_zip(File::open(&path)?, "docs.zip") {
            Err(RomError::NoRomInArchive(name)) => assert_eq!(name, "docs.zip"),
            other => panic!("Expected NoRomInArchive, got {:?}", other),
        }
        Ok(())
    }
}

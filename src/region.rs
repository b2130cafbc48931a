use std::fmt;

use bitflags::bitflags;
use serde::Serialize;

bitflags! {
    /// Markets a cartridge is intended for.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
    pub struct Region: u8 {
        const UNKNOWN = 0;
        const JAPAN = 1 << 0;
        const USA = 1 << 1;
        const EUROPE = 1 << 2;
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "Unknown");
        }
        let names: Vec<&str> = [
            (Region::JAPAN, "Japan"),
            (Region::USA, "USA"),
            (Region::EUROPE, "Europe"),
        ]
        .iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, name)| *name)
        .collect();
        write!(f, "{}", names.join("/"))
    }
}

/// Guesses the release region from the usual dump naming tags, e.g. `(J)` or `(USA)`.
pub fn infer_region_from_filename(name: &str) -> Region {
    let lower_name = name.to_lowercase();

    if lower_name.contains("jap") || lower_name.contains("(j)") || lower_name.contains("[j]") {
        Region::JAPAN
    } else if lower_name.contains("usa") || lower_name.contains("(u)") || lower_name.contains("[u]")
    {
        Region::USA
    } else if lower_name.contains("eur") || lower_name.contains("(e)") || lower_name.contains("[e]")
    {
        Region::EUROPE
    } else {
        Region::UNKNOWN
    }
}

/// Returns true when the filename names a region and the header region does not cover it.
pub fn check_region_mismatch(source_name: &str, header_region: Region) -> bool {
    let inferred = infer_region_from_filename(source_name);
    !inferred.is_empty() && !header_region.is_empty() && !header_region.intersects(inferred)
}

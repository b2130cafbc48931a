//! Readers for ROMs distributed inside archives.

pub mod zip;

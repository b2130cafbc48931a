use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use log::{LevelFilter, error, info, warn};
use rayon::prelude::*;
use serde::Serialize;

use sms_rom_tools::error::RomError;
use sms_rom_tools::region::infer_region_from_filename;
use sms_rom_tools::validation::ValidationReport;
use sms_rom_tools::{
    HeaderDump, HeaderKind, collect_rom_paths, read_rom_file, validate_rom, write_checksum,
};

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Command,

    /// Verbosity level (-vv for most verbose)
    #[clap(short, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Silence all output except errors
    #[clap(short, long, action = ArgAction::SetTrue, global = true)]
    quiet: bool,

    /// Format output as JSON (suppresses everything except STDERR)
    #[clap(short, long, action = ArgAction::SetTrue, global = true)]
    json: bool,

    /// Number of threads to use for parallel processing (0 or omitted uses all available threads)
    #[clap(long, value_name = "N", global = true)]
    threads: Option<usize>,
}

#[derive(Subcommand)]
enum Command {
    /// Validate every field of the ROM header
    Check {
        /// ROM files, zip archives or directories to scan
        #[clap(value_parser, num_args = 1..)]
        paths: Vec<String>,
    },
    /// Recompute the header checksum and write it back into the ROM file
    FixChecksum {
        /// ROM files or directories to scan (zip archives are skipped)
        #[clap(value_parser, num_args = 1..)]
        paths: Vec<String>,
    },
    /// Print the ROM, SDSC and CodeMasters headers
    Dump {
        /// Which header to print
        #[clap(long, value_enum, default_value_t = HeaderSelection::All)]
        header: HeaderSelection,

        /// ROM files, zip archives or directories to scan
        #[clap(value_parser, num_args = 1..)]
        paths: Vec<String>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum HeaderSelection {
    RomHeader,
    Sdsc,
    Codemasters,
    All,
}

impl HeaderSelection {
    fn kinds(self) -> &'static [HeaderKind] {
        match self {
            HeaderSelection::RomHeader => &[HeaderKind::RomHeader],
            HeaderSelection::Sdsc => &[HeaderKind::Sdsc],
            HeaderSelection::Codemasters => &[HeaderKind::CodeMasters],
            HeaderSelection::All => &[
                HeaderKind::RomHeader,
                HeaderKind::Sdsc,
                HeaderKind::CodeMasters,
            ],
        }
    }
}

/// A patched checksum, reported per file.
#[derive(Debug, PartialEq, Serialize)]
struct ChecksumPatch {
    source_name: String,
    checksum: String,
}

fn get_log_level(quiet: bool, verbose: u8) -> LevelFilter {
    if quiet {
        LevelFilter::Error // Only show errors if --quiet is passed.
    } else {
        match verbose {
            0 => LevelFilter::Info,  // (no -v): Show Info messages
            1 => LevelFilter::Debug, // -v: Show Debug messages
            _ => LevelFilter::Trace, // -vv or more: Show everything (Trace)
        }
    }
}

/// Attaches the file path to an error. Missing files already carry it.
fn with_path(path: &Path, err: RomError) -> RomError {
    match err {
        RomError::FileNotFound(_) => err,
        other => RomError::WithPath(path.display().to_string(), Box::new(other)),
    }
}

/// Runs `op` on every path in parallel. Results are returned in the same order as the
/// input paths.
fn process_files_parallel<T, F>(paths: &[PathBuf], op: F) -> Vec<Result<T, RomError>>
where
    T: Send,
    F: Fn(&Path) -> Result<T, RomError> + Sync,
{
    paths
        .par_iter()
        .map(|path| op(path).map_err(|e| with_path(path, e)))
        .collect()
}

fn check_file(path: &Path) -> Result<ValidationReport, RomError> {
    let rom = read_rom_file(path)?;
    validate_rom(&rom.data, &rom.source_name)
}

fn dump_file(path: &Path) -> Result<HeaderDump, RomError> {
    let rom = read_rom_file(path)?;
    HeaderDump::read(&rom.data, &rom.source_name)
}

fn fix_file(path: &Path) -> Result<ChecksumPatch, RomError> {
    let checksum = write_checksum(path)?;
    Ok(ChecksumPatch {
        source_name: path.display().to_string(),
        checksum: format!("0x{:04x}", u16::from_le_bytes(checksum)),
    })
}

/// Logs errors, and collects successes for JSON output.
///
/// Returns whether any file failed, along with the successful results.
fn report_results<T>(
    results: Vec<Result<T, RomError>>,
    json: bool,
    mut on_success: impl FnMut(&T) -> bool,
) -> (bool, Vec<T>) {
    let mut had_error = false;
    let mut successes = Vec::new();
    for result in results {
        match result {
            Ok(value) => {
                if !json && !on_success(&value) {
                    had_error = true;
                }
                successes.push(value);
            }
            Err(e) => {
                error!("{}", e);
                had_error = true;
            }
        }
    }
    (had_error, successes)
}

fn print_json<T: Serialize>(values: &[T]) -> bool {
    match serde_json::to_string_pretty(values) {
        Ok(json_output) => {
            println!("{}", json_output);
            true
        }
        Err(e) => {
            eprintln!("Error serializing combined JSON output: {}", e);
            false
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if let Some(num_threads) = cli.threads
        && num_threads != 0
    {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .unwrap_or_else(|e| {
                eprintln!("Failed to set thread pool: {}", e);
                std::process::exit(1);
            });
    }

    env_logger::Builder::new()
        .filter_level(get_log_level(cli.quiet, cli.verbose))
        .format_timestamp(None)
        .format_module_path(false)
        .format_level(false)
        .format_target(false)
        .init();

    let had_error = match &cli.command {
        Command::Check { paths } => {
            let results = process_files_parallel(&collect_rom_paths(paths), check_file);
            let (had_error, reports) = report_results(results, cli.json, |report| {
                if report.passed() {
                    info!("{}", report.print());
                } else {
                    warn!("{}", report.print());
                }
                report.passed()
            });
            let failed_fields = reports.iter().any(|report| !report.passed());
            had_error || failed_fields || (cli.json && !print_json(&reports))
        }
        Command::FixChecksum { paths } => {
            let results = process_files_parallel(&collect_rom_paths(paths), fix_file);
            let (had_error, patches) = report_results(results, cli.json, |patch| {
                info!(
                    "[*] patched {} with checksum {}",
                    patch.source_name, patch.checksum
                );
                true
            });
            had_error || (cli.json && !print_json(&patches))
        }
        Command::Dump { header, paths } => {
            let results = process_files_parallel(&collect_rom_paths(paths), dump_file);
            let (had_error, dumps) = report_results(results, cli.json, |dump| {
                info!("{}", dump.print(header.kinds()));
                if dump.region_mismatch {
                    warn!(
                        "POSSIBLE REGION MISMATCH\n\
                         Source file:          {}\n\
                         Filename suggests:    {}\n\
                         ROM Header claims:    {}\n\
                         The ROM may be mislabeled or have been patched.",
                        dump.source_name,
                        infer_region_from_filename(&dump.source_name),
                        dump.rom_header.market(),
                    );
                }
                true
            });
            had_error || (cli.json && !print_json(&dumps))
        }
    };

    if had_error {
        std::process::exit(1);
    }
}

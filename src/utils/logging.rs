//! Logger setup for the binary.
//!
//! Everything down to debug goes to the log file. The terminal only sees
//! warnings and errors unless `verbose` is set.

use simplelog::{
    ColorChoice, CombinedLogger, Config, LevelFilter, TermLogger, TerminalMode, WriteLogger,
};
use std::error::Error;
use std::fs::File;
use std::path::Path;

pub fn terminal_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    }
}

/// Install the global logger. Fails if the log file cannot be created or a
/// logger is already installed.
pub fn init_logging(log_file: &Path, verbose: bool) -> Result<(), Box<dyn Error>> {
    CombinedLogger::init(vec![
        WriteLogger::new(LevelFilter::Debug, Config::default(), File::create(log_file)?),
        TermLogger::new(
            terminal_level(verbose),
            Config::default(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ),
    ])?;

    log::debug!("Logging to {}", log_file.display());
    Ok(())
}

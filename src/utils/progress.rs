//! Progress spinner shared by the commands.

use crate::constants::SPINNER_CHARS;
use indicatif::{ProgressBar, ProgressStyle};

/// Create a standard progress spinner with consistent styling.
///
/// The spinner draws to stderr and stays hidden when stderr is not a terminal,
/// so it never mixes with the token listing on stdout.
///
/// # Example
///
/// ```ignore
/// use cyclefeed::utils::progress::create_progress_spinner;
///
/// let spinner = create_progress_spinner();
/// spinner.set_message("Scanning sources...");
/// // ... do work ...
/// spinner.finish_and_clear();
/// ```
pub fn create_progress_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(SPINNER_CHARS),
    );
    spinner
}

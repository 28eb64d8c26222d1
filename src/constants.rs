//! Project-wide constants used across multiple modules.

/// Spinner animation characters for progress indicators
pub const SPINNER_CHARS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Directories to skip during recursive traversal
pub const SKIP_DIRECTORIES: &[&str] = &["node_modules", ".git", "temp"];

/// Audio file extensions kept by `audio_only`
pub const AUDIO_EXTENSIONS: &[&str] = &["wav", "flac", "aiff", "mp3", "m4a", "ogg"];

/// Directory name under the user's config dir
pub const CONFIG_DIR_NAME: &str = "cyclefeed";

/// Log file name used when `log_file` is not configured
pub const DEFAULT_LOG_FILE: &str = "cyclefeed.log";

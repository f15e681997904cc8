//! Terminal logging with coloured module prefixes.
//!
//! ```ignore
//! log!("build"; "wrote {} documents", count);
//! warn!("select"; "no template matches {}", input);
//! debug!("resolve"; "{} tags for {}", tags.len(), entry);
//! ```

use std::io::{Write, stderr, stdout};
use std::sync::atomic::{AtomicBool, Ordering};

use owo_colors::{OwoColorize, Stream};

/// Global verbose flag (set by --verbose CLI argument)
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Set verbose mode globally
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

/// Check if verbose mode is enabled
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

/// Log a message with a colored module prefix
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a warning to stderr with a colored module prefix
#[macro_export]
macro_rules! warn {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::warn($module, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown when --verbose is enabled)
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

/// Write `message` to stdout behind a coloured `[module]` prefix.
pub fn log(module: &str, message: &str) {
    let prefix = format!("[{module}]");
    let prefix = match module.to_ascii_lowercase().as_str() {
        "dev" => prefix
            .if_supports_color(Stream::Stdout, |text| text.bright_blue().bold().to_string())
            .to_string(),
        "build" => prefix
            .if_supports_color(Stream::Stdout, |text| text.bright_green().bold().to_string())
            .to_string(),
        _ => prefix
            .if_supports_color(Stream::Stdout, |text| text.bright_yellow().bold().to_string())
            .to_string(),
    };

    let mut out = stdout().lock();
    writeln!(out, "{prefix} {message}").ok();
    out.flush().ok();
}

/// Write `message` to stderr behind a red `[module]` prefix.
pub fn warn(module: &str, message: &str) {
    let prefix = format!("[{module}]");
    let prefix = prefix
        .if_supports_color(Stream::Stderr, |text| text.bright_red().bold().to_string())
        .to_string();

    let mut out = stderr().lock();
    writeln!(out, "{prefix} {message}").ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_flag_round_trips() {
        let before = is_verbose();
        set_verbose(true);
        assert!(is_verbose());
        set_verbose(before);
    }
}

//! Terminal output helpers.
//!
//! Status messages go to stderr so that `webrequire tags` can be piped.
//!
//! ```no_run
//! use webrequire_cli::ui;
//!
//! ui::init_colors(false);
//! ui::info("Building 12 files");
//! ui::success("Wrote 4 packs");
//! ```

mod format;
mod messages;

pub use format::{format_duration, format_size};
pub use messages::{debug, error, info, success, warning};

/// Whether colored output should be used on stderr.
///
/// `NO_COLOR` disables colors, `FORCE_COLOR` enables them even when stderr is
/// not a terminal.
pub fn should_use_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }
    console::user_attended_stderr()
}

/// Set up color support once, early in `main`.
pub fn init_colors(no_color: bool) {
    let enabled = !no_color && should_use_color();
    console::set_colors_enabled(enabled);
    console::set_colors_enabled_stderr(enabled);
}

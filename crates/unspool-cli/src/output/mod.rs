//! Result and error rendering for the two output modes.

mod formatter;
mod human;
mod json;

pub use formatter::OutputFormatter;

/// Picks the JSON formatter for `--json`, the terminal one otherwise.
/// Verbosity only affects the terminal formatter.
pub fn create_formatter(json: bool, verbose: bool, quiet: bool) -> Box<dyn OutputFormatter> {
    if json {
        return Box::new(json::JsonFormatter);
    }
    Box::new(human::HumanFormatter::new(verbose, quiet))
}

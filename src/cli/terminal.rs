//! Terminal capability detection and diagnostic output

use asciireqs::{Diagnostic, Diagnostics, Severity};
use owo_colors::{OwoColorize, colors::css};

/// Detects whether colored output should be enabled
pub fn supports_color() -> bool {
    supports_color::on(supports_color::Stream::Stderr).is_some()
}

/// Extension trait for colorizing output
pub trait Colorize {
    /// Color as success (green)
    fn success(&self) -> String;
    /// Color as warning (amber)
    fn warning(&self) -> String;
    /// Color as error (red)
    fn error(&self) -> String;
    /// Dim the text
    fn dim(&self) -> String;
}

impl Colorize for str {
    fn success(&self) -> String {
        if supports_color() {
            self.fg::<css::Green>().to_string()
        } else {
            self.to_string()
        }
    }

    fn warning(&self) -> String {
        if supports_color() {
            self.fg::<css::Orange>().to_string()
        } else {
            self.to_string()
        }
    }

    fn error(&self) -> String {
        if supports_color() {
            self.fg::<css::Red>().bold().to_string()
        } else {
            self.to_string()
        }
    }

    fn dim(&self) -> String {
        if supports_color() {
            self.dimmed().to_string()
        } else {
            self.to_string()
        }
    }
}

impl Colorize for String {
    fn success(&self) -> String {
        self.as_str().success()
    }

    fn warning(&self) -> String {
        self.as_str().warning()
    }

    fn error(&self) -> String {
        self.as_str().error()
    }

    fn dim(&self) -> String {
        self.as_str().dim()
    }
}

fn format_diagnostic(diagnostic: &Diagnostic) -> String {
    let severity = match diagnostic.severity {
        Severity::Error => "error".error(),
        Severity::Warning => "warning".warning(),
    };
    let location = match (&diagnostic.source, diagnostic.line) {
        (Some(source), Some(line)) => format!("{source}:{line}: "),
        (Some(source), None) => format!("{source}: "),
        (None, Some(line)) => format!("line {line}: "),
        (None, None) => String::new(),
    };
    format!("{severity}: {}{}", location.dim(), diagnostic.message)
}

/// Prints every diagnostic to stderr, one per line.
pub fn print_diagnostics(diagnostics: &Diagnostics) {
    for diagnostic in diagnostics.iter() {
        eprintln!("{}", format_diagnostic(diagnostic));
    }
}

/// A one line summary of the errors and warnings in `diagnostics`.
pub fn summary(diagnostics: &Diagnostics) -> String {
    let errors = diagnostics.error_count();
    let warnings = diagnostics.len() - errors;
    match (errors, warnings) {
        (0, 0) => "no problems found".success(),
        (0, w) => format!("{w} warning(s)").warning(),
        (e, w) => format!("{e} error(s), {w} warning(s)").error(),
    }
}

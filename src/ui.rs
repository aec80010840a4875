use colored::Colorize;
use declarative::{Diagnostic, Diagnostics, Severity};

/// Format one diagnostic as a marker, a bold summary and an indented detail
pub fn format_diagnostic(diagnostic: &Diagnostic) -> String {
    let marker = match diagnostic.severity {
        Severity::Error => "✗".red(),
        Severity::Warning => "⚠".yellow(),
    };
    let mut out = format!("{} {}", marker, diagnostic.summary.bold());
    for line in diagnostic.detail.lines() {
        out.push_str(&format!("\n  {}", line.dimmed()));
    }
    out
}

/// Print diagnostics to stderr
///
/// `quiet` drops warnings; errors are always printed.
pub fn diagnostics(diagnostics: &Diagnostics, quiet: bool) {
    for diagnostic in diagnostics.iter() {
        if quiet && !diagnostic.is_error() {
            continue;
        }
        eprintln!("{}", format_diagnostic(diagnostic));
    }
}

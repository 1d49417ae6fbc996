//! Structured diagnostic log produced while parsing a disc.
#![warn(missing_docs)]
#![warn(unsafe_code)]
use std::fmt::{Display, Formatter, Result};

/// Severity of a single diagnostic entry.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum Severity {
    /// Purely informational; only shown when verbose output is requested.
    Inform,
    /// A recoverable structural problem was found and worked around.
    Warning,
    /// A structural problem was found and the affected subtree was dropped.
    Error,
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            Severity::Inform => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A single diagnostic entry recorded during parsing.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LogEntry {
    /// The severity of this entry.
    pub severity: Severity,
    /// The message describing what happened.
    pub message: String,
}

impl LogEntry {
    /// Build a new log entry.
    pub fn new(severity: Severity, message: impl Into<String>) -> LogEntry {
        LogEntry {
            severity,
            message: message.into(),
        }
    }
}

impl Display for LogEntry {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// The diagnostic log accumulated while parsing a `Disc`.
///
/// Entries only accumulate when the `Disc` was opened with `verify`
/// set; otherwise the log stays empty regardless of what the parser
/// encounters.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DiagnosticLog {
    entries: Vec<LogEntry>,
    enabled: bool,
    mapped_defects: usize,
}

impl DiagnosticLog {
    /// Create a new log. When `enabled` is false, `push` is a no-op.
    pub fn new(enabled: bool) -> DiagnosticLog {
        DiagnosticLog {
            entries: Vec::new(),
            enabled,
            mapped_defects: 0,
        }
    }

    /// Record the number of extents found under the fragment map's
    /// defect file number (`spec.md` §6), as decoded by
    /// [`crate::map::decode`]. Old-catalogue discs have no fragment
    /// map and leave this at zero.
    pub fn set_mapped_defects(&mut self, count: usize) {
        self.mapped_defects = count;
    }

    /// Record an entry, if the log is enabled.
    pub fn push(&mut self, severity: Severity, message: impl Into<String>) {
        if self.enabled {
            self.entries.push(LogEntry::new(severity, message));
        }
    }

    /// Return every recorded entry.
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Return entries, optionally filtering out `Inform` entries.
    ///
    /// When `verbose` is false only warnings and errors are returned,
    /// matching the "pretty" printer described for the CLI surface.
    pub fn filtered(&self, verbose: bool) -> Vec<&LogEntry> {
        self.entries
            .iter()
            .filter(|e| verbose || e.severity != Severity::Inform)
            .collect()
    }

    /// The number of mapped defects recorded via [`Self::set_mapped_defects`].
    pub fn defect_count(&self) -> usize {
        self.mapped_defects
    }

    /// Render the log the way the CLI's `verify` subcommand does: one
    /// line per entry (respecting `verbose`), plus a summary line
    /// reporting the number of mapped defects with correct plural
    /// forms.
    pub fn pretty(&self, verbose: bool) -> String {
        let mut out = String::new();
        for entry in self.filtered(verbose) {
            out.push_str(&entry.to_string());
            out.push('\n');
        }

        let defects = self.defect_count();
        match defects {
            0 => out.push_str("No mapped defects found.\n"),
            1 => out.push_str("1 mapped defect found.\n"),
            n => out.push_str(&format!("{} mapped defects found.\n", n)),
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_log_does_not_record() {
        let mut log = DiagnosticLog::new(false);
        log.push(Severity::Warning, "should not appear");
        assert!(log.entries().is_empty());
    }

    #[test]
    fn enabled_log_records() {
        let mut log = DiagnosticLog::new(true);
        log.push(Severity::Warning, "broken directory");
        assert_eq!(log.entries().len(), 1);
    }

    #[test]
    fn filtered_hides_inform_by_default() {
        let mut log = DiagnosticLog::new(true);
        log.push(Severity::Inform, "parsing zone 0");
        log.push(Severity::Warning, "broken directory");

        assert_eq!(log.filtered(false).len(), 1);
        assert_eq!(log.filtered(true).len(), 2);
    }

    #[test]
    fn defect_plural_forms() {
        let mut log = DiagnosticLog::new(true);
        assert!(log.pretty(false).contains("No mapped defects"));

        log.set_mapped_defects(1);
        assert!(log.pretty(false).contains("1 mapped defect found."));

        log.set_mapped_defects(2);
        assert!(log.pretty(false).contains("2 mapped defects found."));
    }
}

//! Log error scanning
//!
//! Finds error-indicating lines in aggregated workload logs. A line is reported
//! when it matches the trigger pattern and does not also match the exception
//! pattern, which lets operators silence known-benign lines without weakening
//! the trigger list.

mod registry;
mod report;

pub use registry::{PatternContribution, PatternRegistry};
pub use report::{LogErrorsDetected, LogFinding, ScanReport};

use regex::{Regex, RegexBuilder};

/// Log scanning errors
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("No trigger patterns configured")]
    NoTriggers,

    #[error("Invalid {kind} pattern `{pattern}`: {source}")]
    InvalidPattern {
        kind: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// How trigger and exception strings are matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchFlags {
    pub case_insensitive: bool,
    /// Treat each string as literal text rather than a regular expression
    pub literal: bool,
}

impl Default for MatchFlags {
    fn default() -> Self {
        Self {
            case_insensitive: true,
            literal: true,
        }
    }
}

/// Compiled trigger and exception patterns
#[derive(Debug, Clone)]
pub struct ScanPatterns {
    trigger: Regex,
    exception: Option<Regex>,
}

impl ScanPatterns {
    /// Build patterns from string sets, joining each set with `|`
    pub fn new<S: AsRef<str>>(
        triggers: &[S],
        exceptions: &[S],
        flags: MatchFlags,
    ) -> Result<Self, ScanError> {
        let trigger = join_patterns(triggers, flags.literal).ok_or(ScanError::NoTriggers)?;
        let exception = join_patterns(exceptions, flags.literal);
        Self::from_joined(&trigger, exception.as_deref(), flags.case_insensitive)
    }

    /// Build patterns from already pipe-joined expressions
    pub fn from_joined(
        trigger: &str,
        exception: Option<&str>,
        case_insensitive: bool,
    ) -> Result<Self, ScanError> {
        if trigger.trim().is_empty() {
            return Err(ScanError::NoTriggers);
        }
        let trigger = compile("trigger", trigger, case_insensitive)?;
        let exception = match exception.filter(|e| !e.trim().is_empty()) {
            Some(pattern) => Some(compile("exception", pattern, case_insensitive)?),
            None => None,
        };
        Ok(Self { trigger, exception })
    }

    pub fn trigger(&self) -> &str {
        self.trigger.as_str()
    }

    pub fn exception(&self) -> Option<&str> {
        self.exception.as_ref().map(|e| e.as_str())
    }

    /// Scan one log and return its findings in order of appearance
    pub fn scan(&self, source_id: &str, text: &str) -> ScanReport {
        let mut report = ScanReport::default();
        for (idx, line) in text.lines().enumerate() {
            let Some(hit) = self.trigger.find(line) else {
                continue;
            };
            if let Some(exception) = &self.exception {
                if exception.is_match(line) {
                    tracing::debug!("Suppressed known line in {}: {}", source_id, line);
                    continue;
                }
            }
            report.push(LogFinding {
                source_id: source_id.to_string(),
                line_number: idx + 1,
                text: line.to_string(),
                reason: hit.as_str().to_string(),
            });
        }
        report
    }

    /// Scan several logs, keeping findings grouped in input order
    pub fn scan_all<'a, I>(&self, sources: I) -> ScanReport
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut report = ScanReport::default();
        for (source_id, text) in sources {
            report.merge(self.scan(source_id, text));
        }
        report
    }
}

fn join_patterns<S: AsRef<str>>(items: &[S], literal: bool) -> Option<String> {
    let parts: Vec<String> = items
        .iter()
        .map(|s| s.as_ref())
        .filter(|s| !s.is_empty())
        .map(|s| if literal { regex::escape(s) } else { s.to_string() })
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("|"))
    }
}

fn compile(kind: &'static str, pattern: &str, case_insensitive: bool) -> Result<Regex, ScanError> {
    RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|source| ScanError::InvalidPattern {
            kind,
            pattern: pattern.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "INFO ok\nERROR disk full\n";

    #[test]
    fn test_trigger_finds_error_line() {
        let patterns = ScanPatterns::new(&["error"], &[], MatchFlags::default()).unwrap();
        let report = patterns.scan("web", LOG);
        assert!(report.has_errors());
        assert_eq!(report.findings().len(), 1);
        let finding = &report.findings()[0];
        assert_eq!(finding.text, "ERROR disk full");
        assert_eq!(finding.line_number, 2);
        assert_eq!(finding.reason, "ERROR");
        assert_eq!(finding.source_id, "web");
    }

    #[test]
    fn test_exception_suppresses_line() {
        let patterns = ScanPatterns::new(&["error"], &["disk full"], MatchFlags::default()).unwrap();
        let report = patterns.scan("web", LOG);
        assert!(!report.has_errors());
        assert!(report.findings().is_empty());
    }

    #[test]
    fn test_case_sensitive_flag() {
        let flags = MatchFlags {
            case_insensitive: false,
            literal: true,
        };
        let patterns = ScanPatterns::new(&["error"], &[], flags).unwrap();
        assert!(!patterns.scan("web", LOG).has_errors());
    }

    #[test]
    fn test_literal_strings_are_escaped() {
        let patterns = ScanPatterns::new(&["[ERR]"], &[], MatchFlags::default()).unwrap();
        assert_eq!(patterns.trigger(), r"\[ERR\]");
        assert!(!patterns.scan("web", "E\nR\n").has_errors());
        assert!(patterns.scan("web", "x [err] y").has_errors());
    }

    #[test]
    fn test_regex_strings_when_not_literal() {
        let flags = MatchFlags {
            case_insensitive: true,
            literal: false,
        };
        let patterns = ScanPatterns::new(&[r"exit code [1-9]"], &[], flags).unwrap();
        assert!(patterns.scan("job", "exit code 3").has_errors());
        assert!(!patterns.scan("job", "exit code 0").has_errors());
    }

    #[test]
    fn test_no_triggers_is_error() {
        let empty: [&str; 0] = [];
        assert!(matches!(
            ScanPatterns::new(&empty, &empty, MatchFlags::default()),
            Err(ScanError::NoTriggers)
        ));
        assert!(matches!(
            ScanPatterns::from_joined("  ", None, true),
            Err(ScanError::NoTriggers)
        ));
    }

    #[test]
    fn test_invalid_joined_pattern() {
        let err = ScanPatterns::from_joined("error|(", None, true).unwrap_err();
        assert!(matches!(
            err,
            ScanError::InvalidPattern {
                kind: "trigger",
                ..
            }
        ));
    }

    #[test]
    fn test_scan_all_preserves_source_order() {
        let patterns = ScanPatterns::from_joined("fatal|panic", Some(""), true).unwrap();
        let report = patterns.scan_all([
            ("b", "panic: nil map\n"),
            ("a", "ok\nFATAL boom\nfatal again\n"),
        ]);
        let ids: Vec<_> = report
            .findings()
            .iter()
            .map(|f| (f.source_id.as_str(), f.line_number))
            .collect();
        assert_eq!(ids, [("b", 1), ("a", 2), ("a", 3)]);
    }
}

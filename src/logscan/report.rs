//! Scan findings and the failure report

use std::fmt;

/// One error-indicating log line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFinding {
    /// Workload the log came from (e.g. `staging/web-7d9f-abcde`)
    pub source_id: String,
    /// 1-based line number inside that workload's log
    pub line_number: usize,
    pub text: String,
    /// Trigger text that matched
    pub reason: String,
}

/// Findings of one scan, in first-to-last order of appearance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    findings: Vec<LogFinding>,
}

impl ScanReport {
    pub fn has_errors(&self) -> bool {
        !self.findings.is_empty()
    }

    pub fn findings(&self) -> &[LogFinding] {
        &self.findings
    }

    pub(crate) fn push(&mut self, finding: LogFinding) {
        self.findings.push(finding);
    }

    pub fn merge(&mut self, other: ScanReport) {
        self.findings.extend(other.findings);
    }

    /// Turn a report with findings into an error, keeping the report attached
    pub fn into_result(self) -> Result<ScanReport, LogErrorsDetected> {
        if self.has_errors() {
            Err(LogErrorsDetected { report: self })
        } else {
            Ok(self)
        }
    }
}

impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.findings.is_empty() {
            return writeln!(f, "No errors found");
        }
        writeln!(f, "Found {} error line(s):", self.findings.len())?;
        let mut current: Option<&str> = None;
        for finding in &self.findings {
            if current != Some(finding.source_id.as_str()) {
                writeln!(f, "{}", finding.source_id)?;
                current = Some(&finding.source_id);
            }
            writeln!(
                f,
                "  {:>5} [{}] {}",
                finding.line_number, finding.reason, finding.text
            )?;
        }
        Ok(())
    }
}

/// Raised by health-verification commands when a scan has findings
#[derive(Debug, thiserror::Error)]
#[error("Detected {} error line(s) in workload logs", report.findings().len())]
pub struct LogErrorsDetected {
    pub report: ScanReport,
}

//! Deployment readiness from application logs
//!
//! The managed application announces its progress in its own log output: numbered
//! step markers such as `pre-init.d - 05_seed_data` while it starts, and a
//! literal finish marker once it is done. The backends expose no "ready" event
//! for the commands used here, so completion is inferred from that convention.

mod poller;

pub use poller::{LogSource, ReadinessObserver, ReadinessPoller};

use regex::Regex;
use std::fmt;

use crate::exec::ExecError;

/// Default step marker: two-digit step number, underscore, descriptive token
pub const DEFAULT_STEP_PATTERN: &str = r"(?P<step>\b\d{2})_(?P<label>\w+)";

/// Label reported before the first step marker appears
pub const STARTING_LABEL: &str = "Starting";

/// Label reported once the finish marker appears
pub const COMPLETE_LABEL: &str = "Complete";

/// Readiness errors
#[derive(Debug, thiserror::Error)]
pub enum ReadinessError {
    #[error("Deployment did not finish within {cycles} poll cycles")]
    Timeout { cycles: u32, log: String },

    #[error("Failed to fetch logs: {0}")]
    Logs(#[from] ExecError),

    #[error("Invalid step pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Progress of a starting deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadinessState {
    Starting,
    InProgress { percent: u8, label: String },
    Complete,
}

impl ReadinessState {
    pub fn percent(&self) -> u8 {
        match self {
            ReadinessState::Starting => 0,
            ReadinessState::InProgress { percent, .. } => *percent,
            ReadinessState::Complete => 100,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            ReadinessState::Starting => STARTING_LABEL,
            ReadinessState::InProgress { label, .. } => label,
            ReadinessState::Complete => COMPLETE_LABEL,
        }
    }

    /// `Complete` is the only terminal state
    pub fn is_complete(&self) -> bool {
        matches!(self, ReadinessState::Complete)
    }
}

impl fmt::Display for ReadinessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>3}% {}", self.percent(), self.label())
    }
}

/// Derives a [`ReadinessState`] from accumulated log text
#[derive(Debug, Clone)]
pub struct ProgressParser {
    finish_marker: String,
    step_pattern: Regex,
}

impl ProgressParser {
    /// The step pattern must define `step` and `label` capture groups
    pub fn new(finish_marker: impl Into<String>, step_pattern: &str) -> Result<Self, ReadinessError> {
        let invalid = |reason: String| ReadinessError::InvalidPattern {
            pattern: step_pattern.to_string(),
            reason,
        };
        let regex = Regex::new(step_pattern).map_err(|e| invalid(e.to_string()))?;
        for group in ["step", "label"] {
            if !regex.capture_names().flatten().any(|name| name == group) {
                return Err(invalid(format!("missing `{}` capture group", group)));
            }
        }
        let finish_marker = finish_marker.into();
        if finish_marker.is_empty() {
            return Err(invalid("finish marker must not be empty".to_string()));
        }
        Ok(Self {
            finish_marker,
            step_pattern: regex,
        })
    }

    pub fn finish_marker(&self) -> &str {
        &self.finish_marker
    }

    /// Evaluate the whole log.
    ///
    /// The finish marker anywhere wins. Otherwise the last step marker is the
    /// current step; an earlier, higher step number is not remembered.
    pub fn evaluate(&self, log: &str) -> ReadinessState {
        if log.contains(&self.finish_marker) {
            return ReadinessState::Complete;
        }

        let last = self.step_pattern.captures_iter(log).filter_map(|caps| {
            let percent = step_percent(caps.name("step")?.as_str())?;
            let label = caps.name("label")?.as_str().to_string();
            Some((percent, label))
        });

        match last.last() {
            Some((percent, label)) => ReadinessState::InProgress { percent, label },
            None => ReadinessState::Starting,
        }
    }
}

/// Percent for a captured step number, saturated at 99.
///
/// 100 is reserved for the finish marker. Captures that are not a number
/// do not count as a step.
fn step_percent(step: &str) -> Option<u8> {
    let step = step.trim();
    if step.is_empty() || !step.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Digit strings too long for u32 are still steps past 99
    let number = step.parse::<u32>().unwrap_or(u32::MAX);
    Some(number.min(99) as u8)
}

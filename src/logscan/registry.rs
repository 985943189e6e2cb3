//! Pattern handler registry
//!
//! Handlers contribute extra trigger and exception strings for a log source
//! kind (e.g. `local`, `kubernetes`). Contributions are collected when patterns
//! are built and merged after the base lists.

use super::{MatchFlags, ScanError, ScanPatterns};

/// Strings contributed by one handler
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternContribution {
    pub triggers: Vec<String>,
    pub exceptions: Vec<String>,
}

impl PatternContribution {
    pub fn new(triggers: Vec<String>, exceptions: Vec<String>) -> Self {
        Self {
            triggers,
            exceptions,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty() && self.exceptions.is_empty()
    }
}

type Handler = Box<dyn Fn(&str) -> PatternContribution + Send + Sync>;

/// Registry of pattern handlers, invoked in registration order
#[derive(Default)]
pub struct PatternRegistry {
    handlers: Vec<(String, Handler)>,
}

impl std::fmt::Debug for PatternRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternRegistry")
            .field("handlers", &self.names())
            .finish()
    }
}

impl PatternRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler that is consulted for every source kind
    pub fn register<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(&str) -> PatternContribution + Send + Sync + 'static,
    {
        self.handlers.push((name.into(), Box::new(handler)));
    }

    /// Register a fixed contribution that only applies to one source kind
    pub fn register_for_kind(&mut self, kind: impl Into<String>, contribution: PatternContribution) {
        let kind = kind.into();
        let name = format!("{}-patterns", kind);
        self.register(name, move |requested| {
            if requested == kind {
                contribution.clone()
            } else {
                PatternContribution::default()
            }
        });
    }

    /// Get handler names in registration order
    pub fn names(&self) -> Vec<String> {
        self.handlers.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Merge base strings with every handler's contribution for `kind`.
    ///
    /// Order is preserved and duplicates are dropped.
    pub fn collect(
        &self,
        kind: &str,
        base_triggers: &[String],
        base_exceptions: &[String],
    ) -> PatternContribution {
        let mut merged = PatternContribution::default();
        push_unique(&mut merged.triggers, base_triggers);
        push_unique(&mut merged.exceptions, base_exceptions);

        for (name, handler) in &self.handlers {
            let contribution = handler(kind);
            if !contribution.is_empty() {
                tracing::debug!(
                    "Pattern handler {} contributed {} trigger(s), {} exception(s) for {}",
                    name,
                    contribution.triggers.len(),
                    contribution.exceptions.len(),
                    kind
                );
            }
            push_unique(&mut merged.triggers, &contribution.triggers);
            push_unique(&mut merged.exceptions, &contribution.exceptions);
        }
        merged
    }

    /// Collect strings for `kind` and compile them
    pub fn build_patterns(
        &self,
        kind: &str,
        base_triggers: &[String],
        base_exceptions: &[String],
        flags: MatchFlags,
    ) -> Result<ScanPatterns, ScanError> {
        let merged = self.collect(kind, base_triggers, base_exceptions);
        ScanPatterns::new(&merged.triggers, &merged.exceptions, flags)
    }
}

fn push_unique(target: &mut Vec<String>, items: &[String]) {
    for item in items {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}

use super::PolicyViolation;
use log::Level;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Conditions worth telling someone about that don't stop rewriting
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A class reference was rewritten
    Redirected { from: String, to: String },

    /// A strict-mode violation (the rewrite of the class is aborted)
    PolicyViolation(PolicyViolation),

    /// A lazy-mode violation (the reference became a `forbidden/` sentinel)
    DeferredViolation(PolicyViolation),

    /// Descriptor outside the known grammar, left as is
    UnrecognizedDescriptor { descriptor: String, sandbox: String },

    /// Supertypes of a class could not be determined, so it has no inherited method costs
    HierarchyResolutionFailure { class: String, reason: String },

    /// Policy or cost resources could not be loaded
    StartupFailure(String),
}

impl Diagnostic {
    pub fn level(&self) -> Level {
        match self {
            Diagnostic::Redirected { .. } => Level::Trace,
            Diagnostic::PolicyViolation(_) | Diagnostic::StartupFailure(_) => Level::Error,
            Diagnostic::DeferredViolation(_)
            | Diagnostic::UnrecognizedDescriptor { .. }
            | Diagnostic::HierarchyResolutionFailure { .. } => Level::Warn,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Redirected { from, to } => write!(f, "{} -> {}", from, to),
            Diagnostic::PolicyViolation(violation) => violation.fmt(f),
            Diagnostic::DeferredViolation(violation) => write!(f, "{} (deferred)", violation),
            Diagnostic::UnrecognizedDescriptor {
                descriptor,
                sandbox,
            } => write!(
                f,
                "unrecognized descriptor '{}' referenced by player {}",
                descriptor, sandbox
            ),
            Diagnostic::HierarchyResolutionFailure { class, reason } => write!(
                f,
                "can't find the class \"{}\" while resolving method costs: {}",
                class, reason
            ),
            Diagnostic::StartupFailure(msg) => write!(f, "startup failure: {}", msg),
        }
    }
}

/// Sink for diagnostics
///
/// Reporters are shared between rewriting threads, hence `&self`.
pub trait Reporter: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);
}

impl<R: Reporter + ?Sized> Reporter for Arc<R> {
    fn report(&self, diagnostic: Diagnostic) {
        (**self).report(diagnostic)
    }
}

/// Forwards diagnostics to the `log` facade
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&self, diagnostic: Diagnostic) {
        log::log!(diagnostic.level(), "{}", diagnostic);
    }
}

/// Keeps every diagnostic it is sent
#[derive(Default)]
pub struct MemoryReporter(Mutex<Vec<Diagnostic>>);

impl MemoryReporter {
    /// Take out all diagnostics received so far
    pub fn drain(&self) -> Vec<Diagnostic> {
        match self.0.lock() {
            Ok(mut diagnostics) => diagnostics.drain(..).collect(),
            Err(poisoned) => poisoned.into_inner().drain(..).collect(),
        }
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, diagnostic: Diagnostic) {
        match self.0.lock() {
            Ok(mut diagnostics) => diagnostics.push(diagnostic),
            Err(poisoned) => poisoned.into_inner().push(diagnostic),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn levels() {
        let violation = PolicyViolation {
            class: String::from("java/io/File"),
            sandbox: String::from("team1"),
        };
        assert_eq!(
            Diagnostic::PolicyViolation(violation.clone()).level(),
            Level::Error
        );
        assert_eq!(
            Diagnostic::DeferredViolation(violation).level(),
            Level::Warn
        );
        assert_eq!(
            Diagnostic::Redirected {
                from: String::from("java/util/Map"),
                to: String::from("sandboxed/java/util/Map"),
            }
            .level(),
            Level::Trace
        );
    }

    #[test]
    fn shared_memory_reporter() {
        let reporter = Arc::new(MemoryReporter::default());
        let boxed: Box<dyn Reporter> = Box::new(reporter.clone());
        boxed.report(Diagnostic::StartupFailure(String::from("no policy")));

        assert_eq!(
            reporter.drain(),
            vec![Diagnostic::StartupFailure(String::from("no policy"))]
        );
        assert!(reporter.drain().is_empty());
    }
}

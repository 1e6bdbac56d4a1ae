use super::{Error, LogReporter, Reporter};
use crate::jvm::{BinaryName, Name};

pub struct Settings {
    /// Namespace that private per-sandbox copies of library classes live in
    pub sandboxed_namespace: BinaryName,

    /// Namespace for sentinel names standing in for lazily reported violations
    ///
    /// Nothing is ever loaded from this namespace: using the class fails at link time, and by
    /// then the violation has already been reported.
    pub forbidden_namespace: BinaryName,

    /// Namespace of the runtime doing the sandboxing (trusted, never rewritten)
    pub runtime_namespace: BinaryName,

    /// Package holding the replacements for classes that open covert channels
    ///
    /// `java/lang/System` becomes `<this package>/System`, and so on.
    pub runtime_lang_package: BinaryName,

    /// Support class inside the runtime namespace that still gets a private copy per sandbox
    pub support_shim: BinaryName,

    /// What happens on a policy violation
    pub violation_mode: ViolationMode,

    /// Where diagnostics go
    pub reporter: Box<dyn Reporter>,
}

impl Settings {
    pub fn new() -> Result<Settings, Error> {
        fn make_name(name: impl Into<String>) -> Result<BinaryName, Error> {
            BinaryName::from_string(name.into()).map_err(Error::MalformedName)
        }

        Ok(Settings {
            sandboxed_namespace: make_name("sandboxed")?,
            forbidden_namespace: make_name("forbidden")?,
            runtime_namespace: make_name("battlecode")?,
            runtime_lang_package: make_name("battlecode/engine/instrumenter/lang")?,
            support_shim: make_name("battlecode/engine/instrumenter/lang/InstrumentableFunctions")?,
            violation_mode: ViolationMode::Strict,
            reporter: Box::new(LogReporter),
        })
    }

    /// Validate and set the sandboxed namespace
    pub fn with_sandboxed_namespace(mut self, namespace: impl Into<String>) -> Result<Self, Error> {
        self.sandboxed_namespace =
            BinaryName::from_string(namespace.into()).map_err(Error::MalformedName)?;
        Ok(self)
    }

    pub fn with_violation_mode(mut self, violation_mode: ViolationMode) -> Self {
        self.violation_mode = violation_mode;
        self
    }

    pub fn with_reporter(mut self, reporter: impl Reporter + 'static) -> Self {
        self.reporter = Box::new(reporter);
        self
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ViolationMode {
    /// Abort rewriting the class on the first violation
    Strict,

    /// Substitute a `forbidden/` sentinel name, collect the violation, and keep going
    Lazy,
}

use crate::jvm;
use std::fmt;
use std::io;
use std::path::PathBuf;

#[derive(Debug)]
pub enum Error {
    /// A policy or cost file could not be read
    ResourceLoad { file: PathBuf, error: io::Error },

    /// A policy or cost file has a line that doesn't parse
    MalformedResource {
        file: PathBuf,
        line: usize,
        message: String,
    },

    /// Reference to a class that the sandbox may not use, or a malformed reference (only in
    /// strict mode)
    PolicyViolation { class: String, sandbox: String },

    /// Namespace or sandbox name that is not a valid binary name
    MalformedName(String),

    /// Class file could not be read, written, or interpreted
    ClassFile(jvm::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ResourceLoad { file, error } => write!(
                f,
                "error loading {}: {} (check that the file exists and is not corrupted)",
                file.display(),
                error
            ),
            Error::MalformedResource {
                file,
                line,
                message,
            } => write!(f, "{}:{}: {}", file.display(), line, message),
            Error::PolicyViolation { class, sandbox } => write!(
                f,
                "illegal class: {} cannot be referenced by player {}",
                class, sandbox
            ),
            Error::MalformedName(msg) => write!(f, "malformed name: {}", msg),
            Error::ClassFile(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {}

impl From<jvm::Error> for Error {
    fn from(err: jvm::Error) -> Error {
        Error::ClassFile(err)
    }
}

impl From<PolicyViolation> for Error {
    fn from(violation: PolicyViolation) -> Error {
        Error::PolicyViolation {
            class: violation.class,
            sandbox: violation.sandbox,
        }
    }
}

/// A class some sandbox referenced but is not allowed to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PolicyViolation {
    /// Class name, as referenced (not rewritten)
    pub class: String,

    /// Sandbox (team package) responsible for the reference
    pub sandbox: String,
}

impl fmt::Display for PolicyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "illegal class: {} cannot be referenced by player {}",
            self.class, self.sandbox
        )
    }
}

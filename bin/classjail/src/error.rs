use classjail::{jvm, sandbox};
use std::fmt;
use std::io;

/// Ways a command can fail outright
#[derive(Debug)]
pub enum CliError {
    Io(io::Error),
    ClassFile(jvm::Error),
    Sandbox(sandbox::Error),
    MissingArgument(&'static str),

    /// Class whose name would put its output file outside the output directory
    UnsafeOutputPath(String),
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> CliError {
        CliError::Io(err)
    }
}

impl From<jvm::Error> for CliError {
    fn from(err: jvm::Error) -> CliError {
        CliError::ClassFile(err)
    }
}

impl From<sandbox::Error> for CliError {
    fn from(err: sandbox::Error) -> CliError {
        CliError::Sandbox(err)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Io(err) => write!(f, "IO - {}", err),
            CliError::ClassFile(err) => write!(f, "{}", err),
            CliError::Sandbox(err) => write!(f, "{}", err),
            CliError::MissingArgument(name) => write!(f, "missing argument '{}'", name),
            CliError::UnsafeOutputPath(class) => {
                write!(f, "refusing to write class '{}' outside the output directory", class)
            }
        }
    }
}

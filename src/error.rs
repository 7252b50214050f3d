use std::{
    error::Error as StdError,
    fmt::{Display, Formatter, Result as FmtResult},
};

/// The error kinds produced by this crate.
///
/// Consult the operation that returned this value — the allocation and
/// transfer variants are fatal to the `Buffer` they occurred on. Cooperative
/// `stop()` (spec.md §5) is not modeled as an `Error` variant at all: it is
/// the one clean shutdown path and never reaches a run-level error
/// collector.
#[derive(Debug)]
pub enum Error {
    /// A host or device allocation failed.
    AllocationFailure,

    /// A host<->device transfer failed.
    TransferFailure,

    /// An abstract task method was not overridden by the concrete subtype.
    TaskNotImplemented(&'static str),

    /// A messenger address was malformed, or a bind/connect/send failed.
    ConnectionProblem(String),

    /// A task's own `process`/`collect`/`reduce` call reported failure.
    TaskFailure(String),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::AllocationFailure => write!(f, "host or device allocation failed"),
            Self::TransferFailure => write!(f, "host<->device transfer failed"),
            Self::TaskNotImplemented(method) => {
                write!(f, "task method `{method}` is not implemented")
            }
            Self::ConnectionProblem(msg) => write!(f, "messenger connection problem: {msg}"),
            Self::TaskFailure(msg) => write!(f, "task failure: {msg}"),
        }
    }
}

impl StdError for Error {}

pub type Result<T> = std::result::Result<T, Error>;

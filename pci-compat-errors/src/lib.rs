use std::fmt;
use std::io::{self, ErrorKind};
use std::num::ParseIntError;

use thiserror::Error;

/// Returned by a pop on a device stack with no records. The stack is left untouched.
#[derive(Copy, Clone, Debug, Default, Hash, PartialEq, Eq, Error)]
#[error("cannot pop from an empty device stack")]
pub struct EmptyStackError;

#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum FailureKind {
    OsError,
    ReadError,
    PermissionDenied,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::OsError => f.write_str("an operating system specific error was encountered"),
            Self::ReadError => f.write_str("a read error was encountered"),
            Self::PermissionDenied => f.write_str("permission denied"),
        }
    }
}

/// The platform registry could not be queried at all.
#[derive(Debug, Error)]
#[error("device registry could not be queried: {kind}")]
pub struct EnumerationFailure {
    kind: FailureKind,
    #[source]
    source: Option<io::Error>,
}

impl EnumerationFailure {
    pub const fn new(kind: FailureKind) -> Self {
        Self { kind, source: None }
    }

    pub fn with_source(kind: FailureKind, source: io::Error) -> Self {
        Self {
            kind,
            source: Some(source),
        }
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn io_source(&self) -> Option<&io::Error> {
        self.source.as_ref()
    }

    pub fn into_io_source(self) -> Option<io::Error> {
        self.source
    }

    pub fn status(&self) -> CompatStatus {
        match self.kind {
            FailureKind::OsError => CompatStatus::OsError,
            FailureKind::ReadError => CompatStatus::ReadError,
            FailureKind::PermissionDenied => CompatStatus::PermissionDenied,
        }
    }
}

impl From<io::Error> for EnumerationFailure {
    fn from(err: io::Error) -> Self {
        let kind = match err.kind() {
            ErrorKind::PermissionDenied => FailureKind::PermissionDenied,
            ErrorKind::UnexpectedEof | ErrorKind::InvalidData => FailureKind::ReadError,
            _ => FailureKind::OsError,
        };
        Self::with_source(kind, err)
    }
}

/// Integer status used at the C boundary. `0` is success, every failure is negative.
#[repr(i32)]
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum CompatStatus {
    Success = 0,
    OsError = -1,
    ReadError = -2,
    PermissionDenied = -3,
    EmptyStack = -4,
}

impl CompatStatus {
    /// Any code that isn't recognized is reported as [`CompatStatus::OsError`]
    pub const fn from_raw(x: i32) -> Self {
        match x {
            0 => Self::Success,
            -2 => Self::ReadError,
            -3 => Self::PermissionDenied,
            -4 => Self::EmptyStack,
            _ => Self::OsError,
        }
    }

    pub const fn into_raw(self) -> i32 {
        self as i32
    }
}

impl From<&EnumerationFailure> for CompatStatus {
    fn from(err: &EnumerationFailure) -> Self {
        err.status()
    }
}

impl From<EmptyStackError> for CompatStatus {
    fn from(_: EmptyStackError) -> Self {
        Self::EmptyStack
    }
}

#[derive(Error, Debug)]
pub enum PciEnumerationError {
    #[error("an operating system specific error was encountered.")]
    OsError,
    #[error("a read error was encountered.")]
    ReadError,
    #[error("required files could not be found.")]
    NotFound,
    #[error("permission denied.")]
    PermissionDenied,
    #[error("the following generic error occurred: {0}.")]
    GenericIoError(#[source] io::Error),
    #[error("the following integer parsing error occurred: {0}.")]
    ParseInt(#[from] ParseIntError),
    #[error("{0}.")]
    EmptyStack(#[from] EmptyStackError),
}

impl PciEnumerationError {
    /// Maps a raw C status onto an error. Returns `None` for success.
    pub fn from_status(status: CompatStatus) -> Option<Self> {
        match status {
            CompatStatus::Success => None,
            CompatStatus::OsError => Some(Self::OsError),
            CompatStatus::ReadError => Some(Self::ReadError),
            CompatStatus::PermissionDenied => Some(Self::PermissionDenied),
            CompatStatus::EmptyStack => Some(Self::EmptyStack(EmptyStackError)),
        }
    }
}

impl From<io::Error> for PciEnumerationError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            ErrorKind::NotFound => Self::NotFound,
            ErrorKind::PermissionDenied => Self::PermissionDenied,
            _ => Self::GenericIoError(err),
        }
    }
}

impl From<EnumerationFailure> for PciEnumerationError {
    fn from(err: EnumerationFailure) -> Self {
        match err.kind() {
            FailureKind::PermissionDenied => Self::PermissionDenied,
            FailureKind::ReadError => Self::ReadError,
            FailureKind::OsError => match err.into_io_source() {
                Some(io) => Self::from(io),
                None => Self::OsError,
            },
        }
    }
}

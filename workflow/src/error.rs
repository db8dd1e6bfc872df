use std::{error::Error, fmt, io};

use imaging::{CodecError, VolumeError};
use platform::PlatformErr;

/// The workflow's result type.
pub type Result<T> = std::result::Result<T, WorkflowErr>;

/// Orchestration failures. Any of these aborts the run.
#[derive(Debug)]
pub enum WorkflowErr {
    Io(io::Error),
    Platform(PlatformErr),
    Volume(VolumeError),
    Codec(CodecError),
    /// The configuration failed validation.
    Config(String),
    /// The prediction tensor does not match the sample volume.
    ShapeMismatch {
        expected: (usize, usize, usize),
        got: (usize, usize, usize),
    },
}

impl fmt::Display for WorkflowErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowErr::Io(e) => write!(f, "io error: {e}"),
            WorkflowErr::Platform(e) => write!(f, "platform error: {e}"),
            WorkflowErr::Volume(e) => write!(f, "volume error: {e}"),
            WorkflowErr::Codec(e) => write!(f, "codec error: {e}"),
            WorkflowErr::Config(msg) => write!(f, "invalid configuration: {msg}"),
            WorkflowErr::ShapeMismatch { expected, got } => write!(
                f,
                "prediction shape {got:?} does not match sample volume {expected:?}"
            ),
        }
    }
}

impl Error for WorkflowErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            WorkflowErr::Io(e) => Some(e),
            WorkflowErr::Platform(e) => Some(e),
            WorkflowErr::Volume(e) => Some(e),
            WorkflowErr::Codec(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for WorkflowErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<PlatformErr> for WorkflowErr {
    fn from(value: PlatformErr) -> Self {
        Self::Platform(value)
    }
}

impl From<VolumeError> for WorkflowErr {
    fn from(value: VolumeError) -> Self {
        Self::Volume(value)
    }
}

impl From<CodecError> for WorkflowErr {
    fn from(value: CodecError) -> Self {
        Self::Codec(value)
    }
}

/// Boundary conversion for binaries / I/O APIs.
impl From<WorkflowErr> for io::Error {
    fn from(value: WorkflowErr) -> Self {
        match value {
            WorkflowErr::Io(e) => e,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}

use std::{error::Error, fmt, io, path::PathBuf, process::ExitStatus};

use platform::PlatformErr;

/// The pipeline's result type.
pub type Result<T> = std::result::Result<T, PrepErr>;

/// Data-preparation failures.
#[derive(Debug)]
pub enum PrepErr {
    Io(io::Error),
    Json(serde_json::Error),
    Platform(PlatformErr),
    /// The dataset tree holds no files at all.
    EmptyDataset { path: PathBuf },
    /// A required environment variable is absent.
    MissingEnv { key: &'static str },
    /// An external tool exited with a failure status.
    Command { program: &'static str, status: ExitStatus },
}

impl fmt::Display for PrepErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrepErr::Io(e) => write!(f, "io error: {e}"),
            PrepErr::Json(e) => write!(f, "record error: {e}"),
            PrepErr::Platform(e) => write!(f, "platform error: {e}"),
            PrepErr::EmptyDataset { path } => {
                write!(f, "no files found under '{}'", path.display())
            }
            PrepErr::MissingEnv { key } => write!(f, "environment variable {key} is not set"),
            PrepErr::Command { program, status } => {
                write!(f, "{program} exited with {status}")
            }
        }
    }
}

impl Error for PrepErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PrepErr::Io(e) => Some(e),
            PrepErr::Json(e) => Some(e),
            PrepErr::Platform(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for PrepErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for PrepErr {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<PlatformErr> for PrepErr {
    fn from(value: PlatformErr) -> Self {
        Self::Platform(value)
    }
}

/// Boundary conversion for binaries / I/O APIs.
impl From<PrepErr> for io::Error {
    fn from(value: PrepErr) -> Self {
        match value {
            PrepErr::Io(e) => e,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}

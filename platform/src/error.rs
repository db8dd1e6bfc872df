use std::{error::Error, fmt, io};

/// The platform module's result type.
pub type Result<T> = std::result::Result<T, PlatformErr>;

/// The kind of workspace resource an operation addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Asset,
    Compute,
    Environment,
    Job,
    Endpoint,
    Deployment,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Asset => "asset",
            ResourceKind::Compute => "compute",
            ResourceKind::Environment => "environment",
            ResourceKind::Job => "job",
            ResourceKind::Endpoint => "endpoint",
            ResourceKind::Deployment => "deployment",
        };
        f.write_str(name)
    }
}

/// Workspace client failures.
///
/// `NotFound` is the only variant call sites are allowed to branch on; it
/// backs the single existence check in the system (compute provisioning).
#[derive(Debug)]
pub enum PlatformErr {
    Io(io::Error),
    Json(serde_json::Error),
    NotFound { kind: ResourceKind, name: String },
    AlreadyExists { kind: ResourceKind, name: String },
    InvalidSpec(String),
    Backend(String),
}

impl PlatformErr {
    /// Shorthand for a `NotFound` error.
    pub fn not_found(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }
}

impl fmt::Display for PlatformErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformErr::Io(e) => write!(f, "io error: {e}"),
            PlatformErr::Json(e) => write!(f, "invalid record: {e}"),
            PlatformErr::NotFound { kind, name } => write!(f, "{kind} '{name}' not found"),
            PlatformErr::AlreadyExists { kind, name } => {
                write!(f, "{kind} '{name}' already exists")
            }
            PlatformErr::InvalidSpec(msg) => write!(f, "invalid spec: {msg}"),
            PlatformErr::Backend(msg) => write!(f, "backend error: {msg}"),
        }
    }
}

impl Error for PlatformErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PlatformErr::Io(e) => Some(e),
            PlatformErr::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for PlatformErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for PlatformErr {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Boundary conversion for binaries / I/O APIs.
impl From<PlatformErr> for io::Error {
    fn from(value: PlatformErr) -> Self {
        match value {
            PlatformErr::Io(e) => e,
            PlatformErr::NotFound { .. } => io::Error::new(io::ErrorKind::NotFound, value),
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}

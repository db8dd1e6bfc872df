use std::{fmt, fs, io, path::Path};

use ndarray::Array3;
use serde::{Deserialize, Serialize};

/// The result type for volume loading and construction.
pub type Result<T> = std::result::Result<T, VolumeError>;

/// Errors produced while constructing or loading a label volume.
#[derive(Debug)]
pub enum VolumeError {
    Io(io::Error),
    Json(serde_json::Error),
    /// The flat label buffer does not match the declared shape.
    LengthMismatch { expected: usize, got: usize },
    /// The declared shape has a zero-length axis.
    EmptyAxis { axis: usize },
}

impl fmt::Display for VolumeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VolumeError::Io(e) => write!(f, "io error: {e}"),
            VolumeError::Json(e) => write!(f, "invalid volume file: {e}"),
            VolumeError::LengthMismatch { expected, got } => {
                write!(f, "label buffer length mismatch: got {got}, expected {expected}")
            }
            VolumeError::EmptyAxis { axis } => {
                write!(f, "volume shape has zero-length axis {axis}")
            }
        }
    }
}

impl std::error::Error for VolumeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VolumeError::Io(e) => Some(e),
            VolumeError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for VolumeError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for VolumeError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// One MRI input channel of a multi-modal study.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modality {
    Flair,
    T1,
    T1ce,
    T2,
}

impl Modality {
    /// All four modalities in wire-format key order.
    pub const ALL: [Modality; 4] = [Modality::Flair, Modality::T1, Modality::T1ce, Modality::T2];

    /// Returns the wire-format key for this modality.
    pub fn key(self) -> &'static str {
        match self {
            Modality::Flair => "flair",
            Modality::T1 => "t1",
            Modality::T1ce => "t1ce",
            Modality::T2 => "t2",
        }
    }
}

/// On-disk form of a sample label volume: a shape and a flat code buffer.
#[derive(Debug, Serialize, Deserialize)]
struct VolumeFile {
    shape: [usize; 3],
    labels: Vec<u8>,
}

/// A 3D integer-coded label volume.
///
/// Valid clinical codes are {0, 1, 2, 4}; code 3 is unused by the labeling
/// protocol and every remapping treats it as background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelVolume {
    codes: Array3<u8>,
}

impl LabelVolume {
    /// Creates a volume from a flat buffer in row-major order.
    ///
    /// # Arguments
    /// * `shape` - The (x, y, z) extents of the volume.
    /// * `labels` - Flat code buffer of length `x * y * z`.
    ///
    /// # Returns
    /// The volume, or an error if the buffer does not match the shape.
    pub fn from_flat(shape: [usize; 3], labels: Vec<u8>) -> Result<Self> {
        for (axis, len) in shape.iter().enumerate() {
            if *len == 0 {
                return Err(VolumeError::EmptyAxis { axis });
            }
        }

        let expected = shape.iter().product();
        if labels.len() != expected {
            return Err(VolumeError::LengthMismatch {
                expected,
                got: labels.len(),
            });
        }

        // SAFETY: The buffer length was checked against the shape just above.
        let codes = Array3::from_shape_vec((shape[0], shape[1], shape[2]), labels)
            .expect("length checked against shape");

        Ok(Self { codes })
    }

    /// Loads a volume from its JSON file form (`{ shape, labels }`).
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let file: VolumeFile = serde_json::from_str(&content)?;
        Self::from_flat(file.shape, file.labels)
    }

    /// Writes the volume in its JSON file form.
    pub fn save(&self, path: &Path) -> Result<()> {
        let (x, y, z) = self.codes.dim();
        let file = VolumeFile {
            shape: [x, y, z],
            labels: self.codes.iter().copied().collect(),
        };
        fs::write(path, serde_json::to_string(&file)?)?;
        Ok(())
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize, usize) {
        self.codes.dim()
    }

    #[inline]
    pub fn codes(&self) -> &Array3<u8> {
        &self.codes
    }
}

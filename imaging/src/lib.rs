//! Volume model and label semantics for the segmentation workflow.
//!
//! This crate owns the only reproducible image logic in the system: the
//! integer-coded label volume, its remapping into clinical boolean channels,
//! and the JSON/base64 wire format used to score a sample against a deployed
//! endpoint.

pub mod codec;
pub mod masks;
pub mod volume;

pub use codec::{CodecError, PredictionTensor, ScoreRequest};
pub use masks::{TumorMasks, remap_labels};
pub use volume::{LabelVolume, Modality, VolumeError};

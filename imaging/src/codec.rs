use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ndarray::{Array4, ArrayView3, Axis};
use serde::{Deserialize, Serialize};

use crate::volume::Modality;

/// The result type for wire-format encoding and decoding.
pub type Result<T> = std::result::Result<T, CodecError>;

/// Number of channels a scoring response must carry.
const CHANNELS: usize = 3;

/// Errors produced while encoding requests or decoding responses.
#[derive(Debug)]
pub enum CodecError {
    Json(serde_json::Error),
    Base64(base64::DecodeError),
    /// The request's `data` array did not hold exactly one study.
    StudyCount { got: usize },
    /// The response tensor did not have exactly three channels.
    ChannelCount { got: usize },
    /// The response's nested arrays were jagged or empty.
    RaggedTensor,
    /// A flat buffer did not match its declared shape.
    LengthMismatch { expected: usize, got: usize },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Json(e) => write!(f, "invalid json: {e}"),
            CodecError::Base64(e) => write!(f, "invalid base64 payload: {e}"),
            CodecError::StudyCount { got } => {
                write!(f, "request must carry exactly one study, got {got}")
            }
            CodecError::ChannelCount { got } => {
                write!(f, "response must carry {CHANNELS} channels, got {got}")
            }
            CodecError::RaggedTensor => write!(f, "response tensor is jagged or empty"),
            CodecError::LengthMismatch { expected, got } => {
                write!(f, "tensor buffer length mismatch: got {got}, expected {expected}")
            }
        }
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CodecError::Json(e) => Some(e),
            CodecError::Base64(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<base64::DecodeError> for CodecError {
    fn from(value: base64::DecodeError) -> Self {
        Self::Base64(value)
    }
}

/// One study: the four MRI modalities, each base64-encoded file contents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StudyPayload {
    pub flair: String,
    pub t1: String,
    pub t1ce: String,
    pub t2: String,
}

/// The scoring request body: a `data` array with a single study.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreRequest {
    pub data: Vec<StudyPayload>,
}

impl ScoreRequest {
    /// Builds a request from raw modality file bytes in wire-key order
    /// (flair, t1, t1ce, t2).
    pub fn from_modalities(modalities: [&[u8]; 4]) -> Self {
        let [flair, t1, t1ce, t2] = modalities.map(|bytes| STANDARD.encode(bytes));
        Self {
            data: vec![StudyPayload { flair, t1, t1ce, t2 }],
        }
    }

    /// Parses a request from its JSON body.
    pub fn from_json(body: &str) -> Result<Self> {
        let req: Self = serde_json::from_str(body)?;
        if req.data.len() != 1 {
            return Err(CodecError::StudyCount { got: req.data.len() });
        }
        Ok(req)
    }

    /// Serializes the request to its JSON body.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes one modality back into raw file bytes.
    pub fn modality(&self, modality: Modality) -> Result<Vec<u8>> {
        let study = match self.data.as_slice() {
            [study] => study,
            other => return Err(CodecError::StudyCount { got: other.len() }),
        };

        let encoded = match modality {
            Modality::Flair => &study.flair,
            Modality::T1 => &study.t1,
            Modality::T1ce => &study.t1ce,
            Modality::T2 => &study.t2,
        };

        Ok(STANDARD.decode(encoded)?)
    }
}

/// A decoded scoring response of shape (channels, height, width, slices).
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionTensor {
    values: Array4<f32>,
}

impl PredictionTensor {
    /// Creates a tensor from a flat buffer in row-major order.
    pub fn from_flat(shape: [usize; 4], values: Vec<f32>) -> Result<Self> {
        if shape[0] != CHANNELS {
            return Err(CodecError::ChannelCount { got: shape[0] });
        }

        let expected = shape.iter().product();
        if values.len() != expected {
            return Err(CodecError::LengthMismatch {
                expected,
                got: values.len(),
            });
        }

        // SAFETY: The buffer length was checked against the shape just above.
        let values = Array4::from_shape_vec((shape[0], shape[1], shape[2], shape[3]), values)
            .expect("length checked against shape");

        Ok(Self { values })
    }

    /// Decodes a response body: a JSON nested array
    /// `[channel][height][width][slices]` with exactly three channels.
    pub fn from_json(body: &str) -> Result<Self> {
        let nested: Vec<Vec<Vec<Vec<f32>>>> = serde_json::from_str(body)?;

        if nested.len() != CHANNELS {
            return Err(CodecError::ChannelCount { got: nested.len() });
        }

        let h = nested[0].len();
        let w = nested[0].first().map_or(0, |p| p.len());
        let s = nested[0]
            .first()
            .and_then(|p| p.first())
            .map_or(0, |r| r.len());

        if h == 0 || w == 0 || s == 0 {
            return Err(CodecError::RaggedTensor);
        }

        let mut flat = Vec::with_capacity(CHANNELS * h * w * s);
        for channel in &nested {
            if channel.len() != h {
                return Err(CodecError::RaggedTensor);
            }
            for plane in channel {
                if plane.len() != w {
                    return Err(CodecError::RaggedTensor);
                }
                for row in plane {
                    if row.len() != s {
                        return Err(CodecError::RaggedTensor);
                    }
                    flat.extend_from_slice(row);
                }
            }
        }

        Self::from_flat([CHANNELS, h, w, s], flat)
    }

    /// Serializes the tensor to the response body format.
    pub fn to_json(&self) -> Result<String> {
        let (_, h, w, s) = self.values.dim();
        let mut nested = Vec::with_capacity(CHANNELS);

        for ch in 0..CHANNELS {
            let view = self.values.index_axis(Axis(0), ch);
            let mut planes = Vec::with_capacity(h);
            for i in 0..h {
                let mut rows = Vec::with_capacity(w);
                for j in 0..w {
                    let mut row = Vec::with_capacity(s);
                    for k in 0..s {
                        row.push(view[(i, j, k)]);
                    }
                    rows.push(row);
                }
                planes.push(rows);
            }
            nested.push(planes);
        }

        Ok(serde_json::to_string(&nested)?)
    }

    /// Returns one channel as a 3D view.
    #[inline]
    pub fn channel(&self, ch: usize) -> ArrayView3<'_, f32> {
        self.values.index_axis(Axis(0), ch)
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize, usize, usize) {
        self.values.dim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_roundtrips_modality_bytes() {
        let flair = b"flair-bytes".as_slice();
        let t1 = b"t1-bytes".as_slice();
        let t1ce = b"t1ce-bytes".as_slice();
        let t2 = b"t2-bytes".as_slice();

        let req = ScoreRequest::from_modalities([flair, t1, t1ce, t2]);
        let parsed = ScoreRequest::from_json(&req.to_json().unwrap()).unwrap();

        assert_eq!(parsed.modality(Modality::Flair).unwrap(), flair);
        assert_eq!(parsed.modality(Modality::T1).unwrap(), t1);
        assert_eq!(parsed.modality(Modality::T1ce).unwrap(), t1ce);
        assert_eq!(parsed.modality(Modality::T2).unwrap(), t2);
    }

    #[test]
    fn request_body_uses_wire_keys() {
        let req = ScoreRequest::from_modalities([b"a", b"b", b"c", b"d"]);
        let body = req.to_json().unwrap();
        for key in ["\"data\"", "\"flair\"", "\"t1\"", "\"t1ce\"", "\"t2\""] {
            assert!(body.contains(key), "missing {key} in {body}");
        }
    }

    #[test]
    fn request_rejects_multiple_studies() {
        let body = r#"{"data":[
            {"flair":"","t1":"","t1ce":"","t2":""},
            {"flair":"","t1":"","t1ce":"","t2":""}
        ]}"#;
        assert!(matches!(
            ScoreRequest::from_json(body),
            Err(CodecError::StudyCount { got: 2 })
        ));
    }

    #[test]
    fn tensor_roundtrips_through_json() {
        let values: Vec<f32> = (0..24).map(|v| v as f32 / 10.0).collect();
        let tensor = PredictionTensor::from_flat([3, 2, 2, 2], values).unwrap();
        let decoded = PredictionTensor::from_json(&tensor.to_json().unwrap()).unwrap();
        assert_eq!(decoded, tensor);
        assert_eq!(decoded.shape(), (3, 2, 2, 2));
    }

    #[test]
    fn tensor_rejects_wrong_channel_count() {
        assert!(matches!(
            PredictionTensor::from_json("[[[[0.0]]],[[[0.0]]]]"),
            Err(CodecError::ChannelCount { got: 2 })
        ));
    }

    #[test]
    fn tensor_rejects_jagged_rows() {
        let body = "[[[[0.0,0.0]]],[[[0.0]]],[[[0.0,0.0]]]]";
        assert!(matches!(
            PredictionTensor::from_json(body),
            Err(CodecError::RaggedTensor)
        ));
    }

    #[test]
    fn channel_views_match_layout() {
        let values: Vec<f32> = (0..24).map(|v| v as f32).collect();
        let tensor = PredictionTensor::from_flat([3, 2, 2, 2], values).unwrap();
        assert_eq!(tensor.channel(0)[(0, 0, 0)], 0.0);
        assert_eq!(tensor.channel(1)[(0, 0, 0)], 8.0);
        assert_eq!(tensor.channel(2)[(1, 1, 1)], 23.0);
    }
}

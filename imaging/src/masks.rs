use ndarray::{Array2, Array3};

use crate::volume::LabelVolume;

/// Source label codes carried by the labeling protocol.
const NECROTIC_CORE: u8 = 1;
const EDEMA: u8 = 2;
const ENHANCING: u8 = 4;

/// Three boolean channels over one label volume, one per clinical region.
///
/// Channel semantics:
/// - `tumor_core`: source code 1 or 4.
/// - `whole_tumor`: source code 1, 2 or 4.
/// - `enhancing_tumor`: source code 4.
///
/// Any other code (including the unused code 3) is background in all
/// channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TumorMasks {
    pub tumor_core: Array3<bool>,
    pub whole_tumor: Array3<bool>,
    pub enhancing_tumor: Array3<bool>,
}

/// Remaps an integer-coded label volume into the three clinical channels.
///
/// Pure and elementwise; the output shape equals the input shape.
pub fn remap_labels(volume: &LabelVolume) -> TumorMasks {
    let codes = volume.codes();

    TumorMasks {
        tumor_core: codes.mapv(|l| l == NECROTIC_CORE || l == ENHANCING),
        whole_tumor: codes.mapv(|l| l == NECROTIC_CORE || l == EDEMA || l == ENHANCING),
        enhancing_tumor: codes.mapv(|l| l == ENHANCING),
    }
}

impl TumorMasks {
    #[inline]
    pub fn shape(&self) -> (usize, usize, usize) {
        self.whole_tumor.dim()
    }

    /// Returns the channels in prediction-tensor order.
    pub fn channels(&self) -> [&Array3<bool>; 3] {
        [&self.tumor_core, &self.whole_tumor, &self.enhancing_tumor]
    }

    /// Returns the display names matching [`TumorMasks::channels`] order.
    pub fn channel_names() -> [&'static str; 3] {
        ["tumor_core", "whole_tumor", "enhancing_tumor"]
    }

    /// Counts the positive voxels per channel, in channel order.
    pub fn voxel_counts(&self) -> [usize; 3] {
        self.channels().map(|c| c.iter().filter(|v| **v).count())
    }

    /// Returns the middle axial slice of a channel (fixed last axis).
    pub fn mid_slice(&self, channel: usize) -> Array2<bool> {
        let masks = self.channels();
        let mask = masks[channel];
        let (_, _, z) = mask.dim();
        mask.index_axis(ndarray::Axis(2), z / 2).to_owned()
    }

    /// Dice coefficient per channel against a thresholded prediction.
    ///
    /// # Arguments
    /// * `prediction` - Per-channel probabilities with this mask's shape.
    /// * `threshold` - Probability above which a voxel counts as positive.
    ///
    /// # Returns
    /// One Dice score per channel; 1.0 when both sides are empty.
    pub fn dice(&self, prediction: &crate::codec::PredictionTensor, threshold: f32) -> [f32; 3] {
        let mut scores = [0.0f32; 3];

        for (ch, mask) in self.channels().into_iter().enumerate() {
            let pred = prediction.channel(ch);
            let mut overlap = 0usize;
            let mut truth = 0usize;
            let mut positive = 0usize;

            for (m, p) in mask.iter().zip(pred.iter()) {
                let hit = *p > threshold;
                truth += usize::from(*m);
                positive += usize::from(hit);
                overlap += usize::from(*m && hit);
            }

            scores[ch] = if truth + positive == 0 {
                1.0
            } else {
                2.0 * overlap as f32 / (truth + positive) as f32
            };
        }

        scores
    }
}

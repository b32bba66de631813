// Params - trained weights for one model precision
//
// Fixed-point formats:
//   Q8:  weights i8 in Q4 (w / 16),    activation steepness u8 in Q4 (a / 16)
//   Q16: weights i16 in Q12 (w / 4096), activation steepness u16 in Q8 (a / 256)
//   F32: plain floats
//
// Weight blobs can also be loaded from little-endian binary data. Casting is
// zero-copy through bytemuck; misaligned input is rejected instead of copied.

use super::precision::Precision;
use crate::error::SetupError;
use bytemuck::PodCastError;
use serde::{Deserialize, Serialize};

/// Weights and per-neuron activation steepness, tagged by precision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "precision", rename_all = "lowercase")]
pub enum ModelParams {
    Q8 { weights: Vec<i8>, act_weights: Vec<u8> },
    Q16 { weights: Vec<i16>, act_weights: Vec<u16> },
    F32 { weights: Vec<f32>, act_weights: Vec<f32> },
}

impl ModelParams {
    pub fn precision(&self) -> Precision {
        match self {
            ModelParams::Q8 { .. } => Precision::Q8,
            ModelParams::Q16 { .. } => Precision::Q16,
            ModelParams::F32 { .. } => Precision::F32,
        }
    }

    pub fn weights_num(&self) -> usize {
        match self {
            ModelParams::Q8 { weights, .. } => weights.len(),
            ModelParams::Q16 { weights, .. } => weights.len(),
            ModelParams::F32 { weights, .. } => weights.len(),
        }
    }

    pub fn act_weights_num(&self) -> usize {
        match self {
            ModelParams::Q8 { act_weights, .. } => act_weights.len(),
            ModelParams::Q16 { act_weights, .. } => act_weights.len(),
            ModelParams::F32 { act_weights, .. } => act_weights.len(),
        }
    }

    /// Check blob sizes against the graph
    pub fn validate(&self, weights_num: usize, neurons_num: usize) -> Result<(), SetupError> {
        if self.weights_num() != weights_num {
            return Err(SetupError::TableLength {
                table: "weights",
                expected: weights_num,
                actual: self.weights_num(),
            });
        }
        if self.act_weights_num() != neurons_num {
            return Err(SetupError::TableLength {
                table: "act_weights",
                expected: neurons_num,
                actual: self.act_weights_num(),
            });
        }
        Ok(())
    }

    /// Load weights from little-endian binary blobs
    ///
    /// # Arguments
    /// * `precision` - Element types of the blobs
    /// * `weights` - Weight blob, element-aligned
    /// * `act_weights` - Activation steepness blob, element-aligned
    ///
    /// # Errors
    /// * `BlobMisaligned` if a blob does not start on an element boundary
    /// * `Parse` if a blob length is not a whole number of elements
    pub fn from_le_bytes(
        precision: Precision,
        weights: &[u8],
        act_weights: &[u8],
    ) -> Result<Self, SetupError> {
        Ok(match precision {
            Precision::Q8 => ModelParams::Q8 {
                weights: cast_blob::<i8>("weights", weights)?.to_vec(),
                act_weights: act_weights.to_vec(),
            },
            Precision::Q16 => ModelParams::Q16 {
                weights: cast_blob::<i16>("weights", weights)?
                    .iter()
                    .map(|&w| i16::from_le(w))
                    .collect(),
                act_weights: cast_blob::<u16>("act_weights", act_weights)?
                    .iter()
                    .map(|&a| u16::from_le(a))
                    .collect(),
            },
            Precision::F32 => ModelParams::F32 {
                weights: floats_le("weights", weights)?,
                act_weights: floats_le("act_weights", act_weights)?,
            },
        })
    }
}

fn cast_blob<'a, T: bytemuck::Pod>(blob: &str, bytes: &'a [u8]) -> Result<&'a [T], SetupError> {
    bytemuck::try_cast_slice::<u8, T>(bytes).map_err(|e| match e {
        PodCastError::TargetAlignmentGreaterAndInputNotAligned | PodCastError::AlignmentMismatch => {
            SetupError::BlobMisaligned {
                blob: blob.to_string(),
            }
        }
        other => SetupError::Parse {
            reason: format!("{} blob of {} bytes: {:?}", blob, bytes.len(), other),
        },
    })
}

fn floats_le(blob: &str, bytes: &[u8]) -> Result<Vec<f32>, SetupError> {
    Ok(cast_blob::<u32>(blob, bytes)?
        .iter()
        .map(|&bits| f32::from_bits(u32::from_le(bits)))
        .collect())
}

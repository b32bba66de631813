//! Output decoder - turns raw network outputs into task results
//!
//! Raw outputs are first dequantised to the unit interval (divisors 255 for
//! Q8 and 65535 for Q16), then interpreted by task:
//! - Classification: per-class probabilities and the arg-max class
//! - Regression: per-output values de-scaled to original units
//! - Anomaly: RMS distance to the reference embedding, de-scaled
//!
//! The decoded result lives in a buffer sized at setup and is overwritten on
//! every decode.

use crate::error::SetupError;
use crate::inference::Network;
use crate::input::{descale_value, ScaleTable};
use crate::model::{ModelDescriptor, TaskType};
use serde::Serialize;

/// Result of one inference, selected by task type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum DecodedOutput {
    Classification {
        predicted_class: usize,
        probabilities: Vec<f32>,
    },
    Regression {
        values: Vec<f32>,
    },
    Anomaly {
        score: f32,
    },
}

impl DecodedOutput {
    /// Predicted class and its probability, for classification results
    pub fn prediction(&self) -> Option<(usize, f32)> {
        match self {
            DecodedOutput::Classification {
                predicted_class,
                probabilities,
            } => Some((
                *predicted_class,
                probabilities.get(*predicted_class).copied().unwrap_or(0.0),
            )),
            _ => None,
        }
    }
}

/// Index of the first maximum
pub fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Fill `probabilities` from unit scores and return the arg-max class
///
/// A single score is a binary probability `p1`, expanded to `[1 - p1, p1]`.
/// Otherwise scores are normalised to sum 1 when their sum is positive.
pub fn decode_classification(units: &[f32], probabilities: &mut [f32]) -> usize {
    if units.len() == 1 {
        let p1 = units[0].clamp(0.0, 1.0);
        probabilities[0] = 1.0 - p1;
        probabilities[1] = p1;
        return argmax(&probabilities[..2]);
    }

    let sum: f32 = units.iter().sum();
    for (p, &u) in probabilities.iter_mut().zip(units) {
        *p = if sum > 0.0 { u / sum } else { u };
    }
    argmax(&probabilities[..units.len()])
}

/// De-scale each unit output with its min/max entry
pub fn decode_regression(units: &[f32], scale: &ScaleTable, values: &mut [f32]) {
    for (i, (v, &u)) in values.iter_mut().zip(units).enumerate() {
        *v = descale_value(u, scale.min[i], scale.max[i]);
    }
}

/// RMS distance between the embedding and the reference, de-scaled with
/// entry 0 of `scale`
pub fn decode_anomaly(units: &[f32], average_embedding: &[f32], scale: &ScaleTable) -> f32 {
    if units.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = units
        .iter()
        .zip(average_embedding)
        .map(|(&u, &a)| (u - a) * (u - a))
        .sum();
    let rms = (sum_sq / units.len() as f32).sqrt();
    descale_value(rms, scale.min[0], scale.max[0])
}

/// Decoder bound to one validated model
#[derive(Debug, Clone)]
pub struct OutputDecoder {
    task: TaskType,
    scale: ScaleTable,
    average_embedding: Vec<f32>,
    units: Vec<f32>,
    decoded: DecodedOutput,
}

impl OutputDecoder {
    /// Allocate the decoded-output buffer for the model's task
    pub fn new(model: &ModelDescriptor) -> Result<Self, SetupError> {
        let outputs = model.outputs_num();
        let decoded = match model.task {
            TaskType::MultiClass | TaskType::BinaryClass => {
                if model.task == TaskType::MultiClass && outputs < 2 {
                    return Err(SetupError::TaskMismatch {
                        reason: format!("multiclass model with {} outputs", outputs),
                    });
                }
                DecodedOutput::Classification {
                    predicted_class: 0,
                    probabilities: vec![0.0; outputs.max(2)],
                }
            }
            TaskType::Regression => {
                model.output.scale.validate("output_scale", outputs)?;
                DecodedOutput::Regression {
                    values: vec![0.0; outputs],
                }
            }
            TaskType::AnomalyDetection => {
                if model.output.scale.is_empty() {
                    return Err(SetupError::TableLength {
                        table: "output_scale",
                        expected: 1,
                        actual: 0,
                    });
                }
                DecodedOutput::Anomaly { score: 0.0 }
            }
        };

        Ok(Self {
            task: model.task,
            scale: model.output.scale.clone(),
            average_embedding: model.output.average_embedding.clone(),
            units: vec![0.0; outputs],
            decoded,
        })
    }

    pub fn task(&self) -> TaskType {
        self.task
    }

    /// Decode the current outputs of `network`
    pub fn decode(&mut self, network: &Network) -> &DecodedOutput {
        network.outputs_into(&mut self.units);
        self.decode_units()
    }

    /// Decode already dequantised outputs
    pub fn decode_from_units(&mut self, units: &[f32]) -> &DecodedOutput {
        for (dst, &u) in self.units.iter_mut().zip(units) {
            *dst = u;
        }
        self.decode_units()
    }

    fn decode_units(&mut self) -> &DecodedOutput {
        match &mut self.decoded {
            DecodedOutput::Classification {
                predicted_class,
                probabilities,
            } => {
                *predicted_class = decode_classification(&self.units, probabilities);
            }
            DecodedOutput::Regression { values } => {
                decode_regression(&self.units, &self.scale, values);
            }
            DecodedOutput::Anomaly { score } => {
                *score = decode_anomaly(&self.units, &self.average_embedding, &self.scale);
            }
        }
        &self.decoded
    }

    /// Last decoded result
    pub fn decoded(&self) -> &DecodedOutput {
        &self.decoded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_picks_first_maximum() {
        assert_eq!(argmax(&[0.1, 0.4, 0.4, 0.1]), 1);
        assert_eq!(argmax(&[0.0, 0.0]), 0);
        assert_eq!(argmax(&[]), 0);
    }

    #[test]
    fn test_multiclass_normalised() {
        let mut probs = [0.0; 3];
        let class = decode_classification(&[0.2, 0.6, 0.2], &mut probs);
        assert_eq!(class, 1);
        assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-6);
        assert!((probs[1] - 0.6).abs() < 1e-6);

        // zero scores stay zero, class 0 wins
        let class = decode_classification(&[0.0, 0.0, 0.0], &mut probs);
        assert_eq!(class, 0);
        assert_eq!(probs, [0.0; 3]);
    }

    #[test]
    fn test_binary_single_output() {
        let mut probs = [0.0; 2];
        assert_eq!(decode_classification(&[0.75], &mut probs), 1);
        assert_eq!(probs, [0.25, 0.75]);
        assert_eq!(decode_classification(&[0.5], &mut probs), 0);
    }

    #[test]
    fn test_regression_descaled() {
        let scale = ScaleTable::new(vec![-10.0, 0.0], vec![10.0, 100.0]);
        let mut values = [0.0; 2];
        decode_regression(&[0.5, 0.25], &scale, &mut values);
        assert_eq!(values, [0.0, 25.0]);
    }

    #[test]
    fn test_anomaly_distance() {
        let scale = ScaleTable::new(vec![0.0], vec![2.0]);
        let score = decode_anomaly(&[1.0, 0.0], &[0.0, 1.0], &scale);
        // rms = 1.0, de-scaled to 2.0
        assert!((score - 2.0).abs() < 1e-6);
        assert_eq!(decode_anomaly(&[0.3, 0.3], &[0.3, 0.3], &scale), 0.0);
    }

    #[test]
    fn test_prediction_accessor() {
        let decoded = DecodedOutput::Classification {
            predicted_class: 2,
            probabilities: vec![0.1, 0.2, 0.7],
        };
        assert_eq!(decoded.prediction(), Some((2, 0.7)));
        assert_eq!(DecodedOutput::Anomaly { score: 1.0 }.prediction(), None);
    }
}

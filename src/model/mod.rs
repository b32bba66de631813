// Model module - immutable model data: topology, weights and metadata
//
// A model is supplied as a JSON descriptor (optionally with weights loaded
// from binary blobs) and never mutated by the pipeline. Everything is
// validated once at setup; a descriptor that passes `validate()` can be run
// without further checks.

pub mod graph;
pub mod params;
pub mod precision;

pub use graph::{NeuronGraph, NeuronLayout};
pub use params::ModelParams;
pub use precision::{Precision, Quantum};

use crate::error::SetupError;
use crate::features::FeatureConfig;
use crate::input::{InputConfig, ScaleTable};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// What the network was trained to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum TaskType {
    MultiClass = 0,
    BinaryClass = 1,
    Regression = 2,
    AnomalyDetection = 3,
}

impl TaskType {
    pub fn is_classification(self) -> bool {
        matches!(self, TaskType::MultiClass | TaskType::BinaryClass)
    }
}

/// Vectors feeding the network's external links
///
/// With both set, the scaled raw window comes first, followed by the scaled
/// extracted features.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsesAsInput {
    #[serde(default)]
    pub raw: bool,
    #[serde(default)]
    pub extracted: bool,
}

impl UsesAsInput {
    /// Packed flags: bit 0 raw input, bit 1 extracted features
    pub fn bits(self) -> u8 {
        (self.raw as u8) | ((self.extracted as u8) << 1)
    }

    pub fn from_bits(bits: u8) -> Self {
        Self {
            raw: bits & 0b01 != 0,
            extracted: bits & 0b10 != 0,
        }
    }
}

/// Output decoding metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputMeta {
    /// Regression: min/max per output. Anomaly: entry 0 de-scales the score.
    #[serde(default)]
    pub scale: ScaleTable,
    /// Anomaly: reference embedding, one value per output in `[0, 1]`
    #[serde(default)]
    pub average_embedding: Vec<f32>,
    /// Optional class names, one per output
    #[serde(default)]
    pub labels: Vec<String>,
}

/// Complete model data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub solution_id: String,
    pub task: TaskType,
    pub uses_as_input: UsesAsInput,
    pub input: InputConfig,
    #[serde(default)]
    pub features: Option<FeatureConfig>,
    pub network: NeuronGraph,
    pub params: ModelParams,
    #[serde(default)]
    pub output: OutputMeta,
}

impl ModelDescriptor {
    /// Parse a JSON descriptor
    ///
    /// # Errors
    /// `SetupError::Parse` for malformed JSON
    pub fn from_json(json: &str) -> Result<Self, SetupError> {
        serde_json::from_str(json).map_err(|e| SetupError::Parse {
            reason: e.to_string(),
        })
    }

    /// Read and parse a JSON descriptor file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, SetupError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| SetupError::Parse {
            reason: format!("{}: {}", path.display(), e),
        })?;
        let model = Self::from_json(&contents)?;
        log::info!("Loaded model '{}' from {}", model.solution_id, path.display());
        Ok(model)
    }

    pub fn precision(&self) -> Precision {
        self.params.precision()
    }

    pub fn neurons_num(&self) -> usize {
        self.network.neurons_num()
    }

    pub fn weights_num(&self) -> usize {
        self.params.weights_num()
    }

    pub fn outputs_num(&self) -> usize {
        self.network.outputs_num()
    }

    /// Length of the scaled raw window
    pub fn raw_inputs_num(&self) -> usize {
        self.input.window.used_axes().len() * self.input.window.effective_window_size()
    }

    /// Length of the vector feeding the external links
    pub fn network_inputs_num(&self) -> usize {
        let raw = if self.uses_as_input.raw {
            self.raw_inputs_num()
        } else {
            0
        };
        let extracted = match (&self.features, self.uses_as_input.extracted) {
            (Some(features), true) => features.overall_num,
            _ => 0,
        };
        raw + extracted
    }

    /// Check every table of the model against each other
    ///
    /// Feature masks and arguments are checked when the feature extractor is
    /// built, since that needs the FFT geometry.
    pub fn validate(&self) -> Result<(), SetupError> {
        self.input.validate()?;

        let uses = self.uses_as_input;
        if !uses.raw && !uses.extracted {
            return Err(SetupError::TaskMismatch {
                reason: "model uses neither raw input nor extracted features".to_string(),
            });
        }
        if uses.extracted && self.features.is_none() {
            return Err(SetupError::TaskMismatch {
                reason: "model uses extracted features but has no feature section".to_string(),
            });
        }
        if !uses.extracted && self.features.is_some() {
            log::warn!(
                "Model '{}' has a feature section that the network does not use",
                self.solution_id
            );
        }

        self.network.validate(self.network_inputs_num())?;
        self.params
            .validate(self.network.weights_num(), self.network.neurons_num())?;
        self.validate_task()
    }

    fn validate_task(&self) -> Result<(), SetupError> {
        let outputs = self.outputs_num();
        let mismatch = |reason: String| Err(SetupError::TaskMismatch { reason });

        match self.task {
            TaskType::MultiClass if outputs < 2 => {
                mismatch(format!("multiclass model with {} outputs", outputs))
            }
            TaskType::BinaryClass if outputs > 2 => {
                mismatch(format!("binary model with {} outputs", outputs))
            }
            TaskType::Regression => self.output.scale.validate("output_scale", outputs),
            TaskType::AnomalyDetection => {
                if self.output.scale.is_empty() {
                    return Err(SetupError::TableLength {
                        table: "output_scale",
                        expected: 1,
                        actual: 0,
                    });
                }
                if self.output.average_embedding.len() != outputs {
                    return Err(SetupError::TableLength {
                        table: "average_embedding",
                        expected: outputs,
                        actual: self.output.average_embedding.len(),
                    });
                }
                Ok(())
            }
            _ => {
                if !self.output.labels.is_empty() && self.output.labels.len() != outputs {
                    return Err(SetupError::TableLength {
                        table: "labels",
                        expected: outputs,
                        actual: self.output.labels.len(),
                    });
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;

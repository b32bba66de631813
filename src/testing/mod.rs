//! Deterministic fixtures for tests and the CLI demo.
//!
//! `StubModelBuilder` produces small, fully valid models whose predictions
//! are known in advance; `RecordingTransport` captures emitted payloads.

use std::sync::{Arc, Mutex, PoisonError};

use crate::dsp::SampleKind;
use crate::features::{FeatureConfig, FeatureMask, TimeFeature};
use crate::input::{InputConfig, ScaleTable, WindowConfig, WindowMode};
use crate::model::{
    ModelDescriptor, ModelParams, NeuronGraph, OutputMeta, Precision, TaskType, UsesAsInput,
};
use crate::postprocess::GestureClass;
use crate::transport::Transport;

/// Builder for a bias-dominated multiclass model
///
/// Defaults: 6 float axes, discrete windows of 8 samples, raw input,
/// 10 sigmoid output neurons. Every neuron reads network input 0 with weight
/// zero, so the outputs depend only on the biases: the winning class gets a
/// positive bias, every other class a negative one.
#[derive(Debug, Clone)]
pub struct StubModelBuilder {
    input_type: SampleKind,
    axes: usize,
    window_size: usize,
    classes: usize,
    winning_class: usize,
    precision: Precision,
    with_features: bool,
}

impl Default for StubModelBuilder {
    fn default() -> Self {
        Self {
            input_type: SampleKind::F32,
            axes: 6,
            window_size: 8,
            classes: GestureClass::COUNT,
            winning_class: GestureClass::Idle.index(),
            precision: Precision::F32,
            with_features: false,
        }
    }
}

impl StubModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input_type(mut self, kind: SampleKind) -> Self {
        self.input_type = kind;
        self
    }

    pub fn axes(mut self, axes: usize) -> Self {
        self.axes = axes;
        self
    }

    pub fn window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn classes(mut self, classes: usize) -> Self {
        self.classes = classes;
        self
    }

    pub fn winning_class(mut self, class: usize) -> Self {
        self.winning_class = class;
        self
    }

    pub fn precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    /// Also extract mean and standard deviation of every axis
    pub fn with_features(mut self) -> Self {
        self.with_features = true;
        self
    }

    pub fn build(self) -> ModelDescriptor {
        let n = self.classes;
        let features = self.with_features.then(|| {
            let overall_num = 2 * self.axes;
            FeatureConfig {
                masks: vec![FeatureMask::from_features(
                    &[TimeFeature::Mean, TimeFeature::Std],
                    &[],
                )],
                overall_num,
                scale: ScaleTable::new(vec![-1.0; overall_num], vec![1.0; overall_num]),
                arguments: Vec::new(),
                fft_len: None,
            }
        });

        // [bias, weight on input 0] per neuron
        let bias = |class: usize| if class == self.winning_class { 1.0 } else { -1.0 };
        let params = match self.precision {
            Precision::Q8 => ModelParams::Q8 {
                weights: (0..n).flat_map(|c| [(bias(c) * 32.0) as i8, 0]).collect(),
                act_weights: vec![16; n],
            },
            Precision::Q16 => ModelParams::Q16 {
                weights: (0..n).flat_map(|c| [(bias(c) * 8192.0) as i16, 0]).collect(),
                act_weights: vec![256; n],
            },
            Precision::F32 => ModelParams::F32 {
                weights: (0..n).flat_map(|c| [bias(c) * 2.0, 0.0]).collect(),
                act_weights: vec![1.0; n],
            },
        };

        ModelDescriptor {
            solution_id: format!("stub-{}-class", n),
            task: TaskType::MultiClass,
            uses_as_input: UsesAsInput {
                raw: true,
                extracted: self.with_features,
            },
            input: InputConfig {
                input_type: self.input_type,
                window: WindowConfig {
                    mode: WindowMode::Discrete,
                    unique_num: self.axes,
                    window_size: self.window_size,
                    window_shift: 0,
                    usage_mask: None,
                },
                subwindow_num: 1,
                scale: ScaleTable::new(vec![-1.0; self.axes], vec![1.0; self.axes]),
            },
            features,
            network: NeuronGraph {
                internal_links: vec![0; n],
                external_links: vec![1; n],
                links: vec![0; n],
                activation_mask: vec![0xff; n.div_ceil(8)],
                outputs: (0..n as u16).collect(),
            },
            params,
            output: OutputMeta::default(),
        }
    }
}

/// Transport that keeps every payload; clones share the record
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    payloads: Arc<Mutex<Vec<String>>>,
}

impl RecordingTransport {
    pub fn payloads(&self) -> Vec<String> {
        self.payloads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Transport for RecordingTransport {
    fn send(&mut self, payload: &[u8]) {
        self.payloads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(String::from_utf8_lossy(payload).into_owned());
    }
}

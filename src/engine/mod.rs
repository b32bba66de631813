//! Engine module - composition root of the inference pipeline
//!
//! `GestureEngine` binds one validated model to its contexts: input window,
//! feature extractor (with its FFT tables), network buffers and decoded
//! output. Every buffer is allocated in `setup`; feeding and inference reuse
//! them. The engine is not reentrant and is owned by a single consumer,
//! usually the inference thread driven by `runtime::GestureRuntime`.

pub mod runtime;

pub use runtime::{spawn_inference_thread, GestureRuntime, InferenceThread};

use crate::dsp::{Sample, SampleKind};
use crate::error::{PipelineError, SetupError};
use crate::features::{ExtractedFeatures, FeatureExtractor};
use crate::inference::Network;
use crate::input::{FeedStatus, InputContext, InputSamples, WindowMode};
use crate::model::{ModelDescriptor, Precision, TaskType};
use crate::output::{DecodedOutput, OutputDecoder};

/// One sensor frame converted to the model's input precision
#[derive(Debug, Clone)]
enum FrameScratch {
    I8(Vec<i8>),
    I16(Vec<i16>),
    F32(Vec<f32>),
}

impl FrameScratch {
    fn new(kind: SampleKind, len: usize) -> Self {
        match kind {
            SampleKind::I8 => FrameScratch::I8(vec![0; len]),
            SampleKind::I16 => FrameScratch::I16(vec![0; len]),
            SampleKind::F32 => FrameScratch::F32(vec![0.0; len]),
        }
    }

    fn load(&mut self, values: &[f32]) -> InputSamples<'_> {
        match self {
            FrameScratch::I8(buf) => InputSamples::I8(convert(values, buf)),
            FrameScratch::I16(buf) => InputSamples::I16(convert(values, buf)),
            FrameScratch::F32(buf) => InputSamples::F32(convert(values, buf)),
        }
    }
}

fn convert<'a, T: Sample>(values: &[f32], buf: &'a mut [T]) -> &'a [T] {
    for (dst, &v) in buf.iter_mut().zip(values) {
        *dst = T::from_f32_saturating(v);
    }
    buf
}

/// Inference pipeline bound to one model
#[derive(Debug)]
pub struct GestureEngine {
    solution_id: String,
    task: TaskType,
    weights_num: usize,
    input: InputContext,
    features: Option<FeatureExtractor>,
    network: Network,
    decoder: OutputDecoder,
    frame: FrameScratch,
}

impl GestureEngine {
    /// Validate the model and build every pipeline context
    ///
    /// # Arguments
    /// * `model` - Model data; only read, never kept by reference
    ///
    /// # Errors
    /// Any `SetupError` from the model, window, feature or network checks
    pub fn setup(model: &ModelDescriptor) -> Result<Self, SetupError> {
        model.validate()?;

        let input = InputContext::new(&model.input, model.uses_as_input.raw)?;
        let features = match (&model.features, model.uses_as_input.extracted) {
            (Some(config), true) => Some(FeatureExtractor::new(config, &input)?),
            _ => None,
        };
        let network = Network::new(model)?;
        let decoder = OutputDecoder::new(model)?;
        let frame = FrameScratch::new(input.input_type(), input.unique_num());

        log::info!(
            "[Engine] Model '{}' ready: {:?} {:?}, {} neurons, {} weights, {} outputs",
            model.solution_id,
            model.task,
            model.precision(),
            network.neurons_num(),
            model.weights_num(),
            network.outputs_num()
        );
        log::info!(
            "[Engine] Window: {:?} {} x {} ({} used axes, {} sub-windows), {} features, fft {:?}",
            input.mode(),
            input.unique_num(),
            input.window_size(),
            input.used_axes().len(),
            input.subwindow_num(),
            features.as_ref().map_or(0, |f| f.overall_num()),
            features.as_ref().and_then(|f| f.fft_len())
        );

        Ok(Self {
            solution_id: model.solution_id.clone(),
            task: model.task,
            weights_num: model.weights_num(),
            input,
            features,
            network,
            decoder,
            frame,
        })
    }

    /// Feed raw samples of the model's input precision
    ///
    /// # Returns
    /// `Ready { consumed }` once a window is complete, `InProgress` otherwise
    ///
    /// # Errors
    /// `InvalidArgument` for a precision mismatch or a partial vector,
    /// `NullArgument` for empty input
    pub fn feed_inputs(&mut self, samples: InputSamples<'_>) -> Result<FeedStatus, PipelineError> {
        self.input.feed(samples)
    }

    /// Feed one sensor frame, converting it to the model's input precision
    ///
    /// # Errors
    /// `InvalidArgument` if the frame does not have `unique_inputs()` values
    pub fn feed_frame(&mut self, values: &[f32]) -> Result<FeedStatus, PipelineError> {
        if values.len() != self.input.unique_num() {
            return Err(PipelineError::InvalidArgument {
                reason: format!(
                    "frame has {} values, model expects {}",
                    values.len(),
                    self.input.unique_num()
                ),
            });
        }
        let samples = self.frame.load(values);
        self.input.feed(samples)
    }

    /// Extract features, run the network and decode its outputs
    ///
    /// # Errors
    /// `Unavailable` if no window is ready
    pub fn run_inference(&mut self) -> Result<&DecodedOutput, PipelineError> {
        if !self.input.is_ready() {
            return Err(PipelineError::Unavailable {
                what: "input window",
            });
        }
        if let Some(features) = self.features.as_mut() {
            features.extract(&self.input)?;
        }
        self.network.load_input(&self.input, self.features.as_ref())?;
        self.network.run();
        Ok(self.decoder.decode(&self.network))
    }

    /// Drop buffered samples; the next window starts empty
    pub fn reset(&mut self) {
        self.input.reset();
    }

    pub fn is_window_ready(&self) -> bool {
        self.input.is_ready()
    }

    /// Last decoded result
    pub fn decoded(&self) -> &DecodedOutput {
        self.decoder.decoded()
    }

    /// Features of the last inference, if the model extracts any
    pub fn extracted_features(&self) -> Option<&ExtractedFeatures> {
        self.features.as_ref().map(|f| f.features())
    }

    pub fn input_type(&self) -> SampleKind {
        self.input.input_type()
    }

    pub fn unique_inputs(&self) -> usize {
        self.input.unique_num()
    }

    pub fn window_size(&self) -> usize {
        self.input.window_size()
    }

    pub fn window_mode(&self) -> WindowMode {
        self.input.mode()
    }

    pub fn subwindow_num(&self) -> usize {
        self.input.subwindow_num()
    }

    pub fn features_num(&self) -> usize {
        self.features.as_ref().map_or(0, |f| f.overall_num())
    }

    pub fn neurons_num(&self) -> usize {
        self.network.neurons_num()
    }

    pub fn weights_num(&self) -> usize {
        self.weights_num
    }

    pub fn outputs_num(&self) -> usize {
        self.network.outputs_num()
    }

    pub fn task(&self) -> TaskType {
        self.task
    }

    pub fn precision(&self) -> Precision {
        self.network.precision()
    }

    pub fn solution_id(&self) -> &str {
        &self.solution_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Status;
    use crate::testing::StubModelBuilder;

    #[test]
    fn test_setup_exposes_model_geometry() {
        let engine = GestureEngine::setup(&StubModelBuilder::new().build()).unwrap();
        assert_eq!(engine.input_type(), SampleKind::F32);
        assert_eq!(engine.unique_inputs(), 6);
        assert_eq!(engine.window_size(), 8);
        assert_eq!(engine.outputs_num(), 10);
        assert_eq!(engine.neurons_num(), 10);
        assert_eq!(engine.task(), TaskType::MultiClass);
        assert_eq!(engine.solution_id(), "stub-10-class");
    }

    #[test]
    fn test_inference_needs_ready_window() {
        let mut engine = GestureEngine::setup(&StubModelBuilder::new().build()).unwrap();
        let err = engine.run_inference().unwrap_err();
        assert_eq!(err.status(), Status::Unavailable);
    }

    #[test]
    fn test_feed_frame_converts_precision() {
        let model = StubModelBuilder::new()
            .input_type(SampleKind::I16)
            .window_size(1)
            .build();
        let mut engine = GestureEngine::setup(&model).unwrap();
        let status = engine.feed_frame(&[1.4, -2.6, 0.0, 0.0, 0.0, 40000.0]).unwrap();
        assert!(status.is_ready());

        assert!(matches!(
            engine.feed_frame(&[0.0; 3]),
            Err(PipelineError::InvalidArgument { .. })
        ));
        assert!(matches!(
            engine.feed_inputs(InputSamples::F32(&[0.0; 6])),
            Err(PipelineError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_feed_reports_in_progress() {
        let mut engine = GestureEngine::setup(&StubModelBuilder::new().build()).unwrap();
        let status = engine.feed_inputs(InputSamples::F32(&[0.0; 6])).unwrap();
        assert_eq!(status, FeedStatus::InProgress);
        assert_eq!(status.status(), Status::InProgress);
    }
}

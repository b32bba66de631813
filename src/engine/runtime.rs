// Runtime - engine + post-processor + transport, and the inference thread
//
// Each completed window runs the whole pipeline to completion:
//   window -> features -> inference -> decode -> post-process -> transport
// before the next frame is consumed. The inference thread blocks on the
// sensor ready signal and drains the queue frame by frame; pipeline state is
// owned exclusively by that thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::GestureEngine;
use crate::config::{AppConfig, RuntimeConfig};
use crate::error::{log_pipeline_error, PipelineError};
use crate::input::{FeedStatus, InputSamples};
use crate::postprocess::{Postprocessor, PredictionEvent};
use crate::sensor::{SensorConsumer, SensorFrame};
use crate::transport::Transport;

/// Poll interval of the inference thread's shutdown check
const WAIT_TIMEOUT: Duration = Duration::from_millis(50);

/// Complete on-device pipeline
pub struct GestureRuntime {
    engine: GestureEngine,
    postprocessor: Postprocessor,
    transport: Box<dyn Transport>,
    config: RuntimeConfig,
    inferences: u64,
    events: u64,
}

impl GestureRuntime {
    pub fn new(engine: GestureEngine, config: &AppConfig, transport: Box<dyn Transport>) -> Self {
        Self {
            engine,
            postprocessor: Postprocessor::new(config.postprocess.clone()),
            transport,
            config: config.runtime.clone(),
            inferences: 0,
            events: 0,
        }
    }

    pub fn engine(&self) -> &GestureEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut GestureEngine {
        &mut self.engine
    }

    pub fn postprocessor(&self) -> &Postprocessor {
        &self.postprocessor
    }

    /// Completed inferences since start
    pub fn inferences(&self) -> u64 {
        self.inferences
    }

    /// Events handed to the transport since start
    pub fn events(&self) -> u64 {
        self.events
    }

    /// Feed one sensor frame and run the pipeline if a window completed
    ///
    /// # Returns
    /// The emitted event, if any
    pub fn process_frame(&mut self, frame: &SensorFrame) -> Result<Option<PredictionEvent>, PipelineError> {
        let status = self.engine.feed_frame(frame.values())?;
        if !status.is_ready() {
            return Ok(None);
        }
        self.on_window_ready(frame.timestamp_ms)
    }

    /// Feed raw samples, running the pipeline for every window they complete
    ///
    /// # Arguments
    /// * `samples` - Whole vectors in the model's input precision
    /// * `now_ms` - Timestamp used for every window completed by this call
    /// * `events` - Receives the emitted events
    pub fn process_samples(
        &mut self,
        samples: InputSamples<'_>,
        now_ms: u64,
        events: &mut Vec<PredictionEvent>,
    ) -> Result<(), PipelineError> {
        let mut rest = samples;
        while !rest.is_empty() {
            let status = self.engine.feed_inputs(rest)?;
            match status {
                FeedStatus::Ready { consumed } => {
                    if let Some(event) = self.on_window_ready(now_ms)? {
                        events.push(event);
                    }
                    rest = rest.tail(consumed);
                }
                FeedStatus::InProgress => break,
            }
        }
        Ok(())
    }

    fn on_window_ready(&mut self, now_ms: u64) -> Result<Option<PredictionEvent>, PipelineError> {
        let decoded = self.engine.run_inference()?;
        self.inferences += 1;

        let every = self.config.log_every_n_inferences;
        if every > 0 && self.inferences % every == 0 {
            tracing::info!(
                "[InferenceThread] {} inferences, {} events",
                self.inferences,
                self.events
            );
        }

        let Some((class, probability)) = decoded.prediction() else {
            tracing::debug!("[InferenceThread] {:?} at {} ms", decoded, now_ms);
            return Ok(None);
        };
        tracing::debug!(
            "[InferenceThread] Raw prediction class={} p={:.3} at {} ms",
            class,
            probability,
            now_ms
        );

        let Some(event) = self.postprocessor.process(class, probability, now_ms) else {
            return Ok(None);
        };
        // Raw predictions are diagnostics only; the transport gets debounced gestures
        if event.raw {
            tracing::info!(
                "[InferenceThread] Raw prediction {} ({}) {}% at {} ms",
                event.name,
                event.class,
                event.percentage,
                event.timestamp_ms
            );
            return Ok(Some(event));
        }

        self.transport.send(event.payload().as_bytes());
        self.events += 1;
        tracing::info!(
            "[InferenceThread] Gesture {} ({}) {}% at {} ms",
            event.name,
            event.class,
            event.percentage,
            event.timestamp_ms
        );
        Ok(Some(event))
    }
}

/// Running inference thread
pub struct InferenceThread {
    running: Arc<AtomicBool>,
    handle: JoinHandle<GestureRuntime>,
}

impl InferenceThread {
    /// Ask the thread to finish and wait for it
    ///
    /// Frames already queued are processed first.
    ///
    /// # Returns
    /// The runtime, or the panic payload if the thread panicked
    pub fn stop(self) -> thread::Result<GestureRuntime> {
        self.running.store(false, Ordering::SeqCst);
        self.handle.join()
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

/// Move the runtime onto a dedicated thread fed by `consumer`
///
/// # Errors
/// The OS error if the thread cannot be spawned
pub fn spawn_inference_thread(
    mut runtime: GestureRuntime,
    mut consumer: SensorConsumer,
) -> std::io::Result<InferenceThread> {
    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);

    let handle = thread::Builder::new()
        .name("gesture-inference".to_string())
        .spawn(move || {
            tracing::info!(
                "[InferenceThread] Starting inference loop for '{}'",
                runtime.engine().solution_id()
            );
            let mut overruns = 0;
            loop {
                let signalled = consumer.wait(WAIT_TIMEOUT);
                while let Some(frame) = consumer.pop() {
                    if let Err(err) = runtime.process_frame(&frame) {
                        log_pipeline_error(&err, "inference thread");
                    }
                }

                let total = consumer.overruns();
                if total > overruns {
                    tracing::warn!(
                        "[InferenceThread] Sensor queue overrun, {} frames dropped",
                        total - overruns
                    );
                    overruns = total;
                }

                if !signalled && !flag.load(Ordering::SeqCst) {
                    break;
                }
            }
            tracing::info!(
                "[InferenceThread] Stopped after {} inferences",
                runtime.inferences()
            );
            runtime
        })?;

    Ok(InferenceThread { running, handle })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::SensorChannels;
    use crate::testing::{RecordingTransport, StubModelBuilder};

    fn runtime(class: usize) -> (GestureRuntime, RecordingTransport) {
        let engine = GestureEngine::setup(&StubModelBuilder::new().winning_class(class).build()).unwrap();
        let transport = RecordingTransport::default();
        let runtime = GestureRuntime::new(engine, &AppConfig::default(), Box::new(transport.clone()));
        (runtime, transport)
    }

    fn zero_frame(t: u64) -> SensorFrame {
        SensorFrame::new(t, &[0.0; 6]).unwrap()
    }

    #[test]
    fn test_process_frame_emits_on_window() {
        let (mut runtime, transport) = runtime(4);
        for t in 0..7 {
            assert_eq!(runtime.process_frame(&zero_frame(t)).unwrap(), None);
        }
        let event = runtime.process_frame(&zero_frame(7)).unwrap().unwrap();
        assert_eq!(event.class, 4);
        assert_eq!(transport.payloads(), vec![event.payload().as_str().to_string()]);
        assert_eq!(runtime.inferences(), 1);
    }

    #[test]
    fn test_process_samples_runs_every_window() {
        let (mut runtime, transport) = runtime(7);
        let samples = vec![0.0f32; 6 * 8 * 3];
        let mut events = Vec::new();
        runtime
            .process_samples(InputSamples::F32(&samples), 100, &mut events)
            .unwrap();
        // rotation is repeatable, every window fires
        assert_eq!(events.len(), 3);
        assert_eq!(transport.payloads().len(), 3);
    }

    #[test]
    fn test_inference_thread_drains_queue() {
        let (runtime, transport) = runtime(1);
        let SensorChannels {
            mut producer,
            consumer,
        } = SensorChannels::new(64);
        let thread = spawn_inference_thread(runtime, consumer).unwrap();
        for t in 0..16 {
            producer.push(zero_frame(t * 10));
        }
        let runtime = thread.stop().unwrap();
        assert_eq!(runtime.inferences(), 2);
        // second window is 80 ms after the first: debounced
        assert_eq!(transport.payloads().len(), 1);
    }
}

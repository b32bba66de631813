//! Debounce behaviour of the runtime, end to end
//!
//! Windows are fed through `GestureRuntime::process_samples` with explicit
//! timestamps so the timeout arithmetic is exact.

use gesture_engine::config::{AppConfig, PostprocessConfig};
use gesture_engine::engine::{GestureEngine, GestureRuntime};
use gesture_engine::input::InputSamples;
use gesture_engine::postprocess::{GestureClass, PredictionEvent};
use gesture_engine::testing::{RecordingTransport, StubModelBuilder};

struct Harness {
    runtime: GestureRuntime,
    transport: RecordingTransport,
    window: Vec<f32>,
}

impl Harness {
    fn new(class: GestureClass, postprocess: PostprocessConfig) -> Self {
        let model = StubModelBuilder::new().winning_class(class.index()).build();
        let engine = GestureEngine::setup(&model).unwrap();
        let window = vec![0.0; engine.unique_inputs() * engine.window_size()];
        let config = AppConfig {
            postprocess,
            ..AppConfig::default()
        };
        let transport = RecordingTransport::default();
        let runtime = GestureRuntime::new(engine, &config, Box::new(transport.clone()));
        Self {
            runtime,
            transport,
            window,
        }
    }

    /// Feed one complete window stamped `now_ms`
    fn window_at(&mut self, now_ms: u64) -> Option<PredictionEvent> {
        let mut events = Vec::new();
        self.runtime
            .process_samples(InputSamples::F32(&self.window), now_ms, &mut events)
            .unwrap();
        assert!(events.len() <= 1);
        events.pop()
    }
}

/// Two gestures within the timeout emit once; one after it emits again
#[test]
fn test_timeout_suppresses_repeats() {
    let mut h = Harness::new(GestureClass::SwipeUp, PostprocessConfig::default());

    let first = h.window_at(1_000).expect("first gesture fires");
    assert_eq!(first.class, GestureClass::SwipeUp.index());
    assert!(!first.raw);

    assert!(h.window_at(1_500).is_none());
    // exactly at the timeout is still suppressed
    assert!(h.window_at(1_800).is_none());
    assert!(h.window_at(1_801).is_some());

    assert_eq!(h.runtime.inferences(), 4);
    assert_eq!(h.transport.payloads().len(), 2);
}

/// Suppressed predictions do not extend the timeout
#[test]
fn test_suppressed_prediction_does_not_restart_timer() {
    let mut h = Harness::new(GestureClass::SwipeLeft, PostprocessConfig::default());
    assert!(h.window_at(0).is_some());
    assert!(h.window_at(700).is_none());
    assert!(h.window_at(801).is_some());
}

/// Repeatable classes are emitted on every window
#[test]
fn test_repeatable_classes_bypass_timeout() {
    for class in [GestureClass::RotationRight, GestureClass::RotationLeft] {
        let mut h = Harness::new(class, PostprocessConfig::default());
        assert!(h.window_at(100).is_some());
        assert!(h.window_at(110).is_some());
        assert!(h.window_at(120).is_some());
        assert_eq!(h.transport.payloads().len(), 3);
        assert_eq!(h.runtime.postprocessor().state().last_fired_ms, Some(120));
    }
}

/// A repeatable emission restarts the timeout for other classes too
#[test]
fn test_repeatable_updates_shared_timestamp() {
    let mut h = Harness::new(GestureClass::RotationRight, PostprocessConfig::default());
    assert!(h.window_at(0).is_some());
    assert!(h.window_at(500).is_some());
    assert_eq!(h.runtime.postprocessor().state().last_fired_ms, Some(500));
}

/// Disabled post-processing returns every prediction, sentinels included,
/// but only logs them: nothing reaches the transport
#[test]
fn test_disabled_postprocess_emits_raw() {
    let config = PostprocessConfig {
        enabled: false,
        ..PostprocessConfig::default()
    };
    let mut h = Harness::new(GestureClass::Idle, config);
    for t in [0, 10, 20] {
        let event = h.window_at(t).expect("raw mode emits");
        assert!(event.raw);
        assert_eq!(event.class, GestureClass::Idle.index());
    }
    assert_eq!(h.runtime.postprocessor().state().last_fired_ms, None);
    assert_eq!(h.runtime.inferences(), 3);
    assert_eq!(h.runtime.events(), 0);
    assert!(h.transport.payloads().is_empty());
}

/// Raw mode keeps actionable classes off the transport too
#[test]
fn test_raw_gestures_are_not_sent() {
    let config = PostprocessConfig {
        enabled: false,
        ..PostprocessConfig::default()
    };
    let mut h = Harness::new(GestureClass::SwipeDown, config);
    let event = h.window_at(0).expect("raw mode emits");
    assert!(event.raw);
    assert_eq!(event.class, GestureClass::SwipeDown.index());
    assert!(h.transport.payloads().is_empty());
}

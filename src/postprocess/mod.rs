// Postprocess - debounce state machine turning predictions into gestures
//
// A prediction becomes a recognised gesture only if its class is neither the
// unknown nor the idle sentinel, and either the class is repeatable or more
// than `timeout_ms` passed since the last emission of any class. With
// postprocessing disabled every prediction is emitted raw, unfiltered.
//
// Timestamps are caller-supplied monotonic milliseconds, so the state machine
// is deterministic under test.

use crate::config::PostprocessConfig;
use serde::Serialize;
use std::fmt;
use std::io::{Cursor, Write};

/// Gesture labels of the reference 10-class model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum GestureClass {
    Unknown = 0,
    SwipeUp = 1,
    SwipeDown = 2,
    SwipeLeft = 3,
    SwipeRight = 4,
    DoubleThumb = 5,
    DoubleShake = 6,
    RotationRight = 7,
    RotationLeft = 8,
    Idle = 9,
}

impl GestureClass {
    pub const COUNT: usize = 10;

    pub fn from_index(index: usize) -> Option<Self> {
        use GestureClass::*;
        const ALL: [GestureClass; GestureClass::COUNT] = [
            Unknown,
            SwipeUp,
            SwipeDown,
            SwipeLeft,
            SwipeRight,
            DoubleThumb,
            DoubleShake,
            RotationRight,
            RotationLeft,
            Idle,
        ];
        ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            GestureClass::Unknown => "unknown",
            GestureClass::SwipeUp => "swipe_up",
            GestureClass::SwipeDown => "swipe_down",
            GestureClass::SwipeLeft => "swipe_left",
            GestureClass::SwipeRight => "swipe_right",
            GestureClass::DoubleThumb => "double_thumb",
            GestureClass::DoubleShake => "double_shake",
            GestureClass::RotationRight => "rotation_right",
            GestureClass::RotationLeft => "rotation_left",
            GestureClass::Idle => "idle",
        }
    }
}

impl fmt::Display for GestureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Display name of a class index, "class" for indices without a label
pub fn class_name(index: usize) -> &'static str {
    GestureClass::from_index(index)
        .map(GestureClass::name)
        .unwrap_or("class")
}

/// Payload buffer size; the last byte stays free, so payloads are at most
/// 14 bytes
pub const PAYLOAD_CAPACITY: usize = 15;

/// Transport payload `"<class>,<pct>"`, ASCII, stored inline
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Payload {
    bytes: [u8; PAYLOAD_CAPACITY],
    len: usize,
}

impl Payload {
    fn new(class: usize, percentage: usize) -> Self {
        let mut bytes = [0u8; PAYLOAD_CAPACITY];
        let len = {
            let mut cursor = Cursor::new(&mut bytes[..PAYLOAD_CAPACITY - 1]);
            // Longer output is truncated
            let _ = write!(cursor, "{},{}", class, percentage);
            cursor.position() as usize
        };
        Self { bytes, len }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(self.as_bytes()).unwrap_or("")
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Payload({:?})", self.as_str())
    }
}

/// Prediction emitted to the transport
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictionEvent {
    pub class: usize,
    pub name: &'static str,
    pub probability: f32,
    /// Integer percentage, truncated
    pub percentage: usize,
    /// True when emitted without debouncing
    pub raw: bool,
    pub timestamp_ms: u64,
}

impl PredictionEvent {
    pub fn new(class: usize, probability: f32, raw: bool, timestamp_ms: u64) -> Self {
        Self {
            class,
            name: class_name(class),
            probability,
            percentage: (100.0 * probability.clamp(0.0, 1.0)) as usize,
            raw,
            timestamp_ms,
        }
    }

    pub fn payload(&self) -> Payload {
        Payload::new(self.class, self.percentage)
    }
}

/// Debounce memory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebounceState {
    /// Time of the last recognised gesture, `None` before the first one
    pub last_fired_ms: Option<u64>,
}

impl DebounceState {
    /// True if more than `timeout_ms` passed since the last emission
    pub fn expired(&self, now_ms: u64, timeout_ms: u64) -> bool {
        match self.last_fired_ms {
            Some(last) => now_ms.saturating_sub(last) > timeout_ms,
            None => true,
        }
    }
}

/// Prediction post-processor
#[derive(Debug, Clone)]
pub struct Postprocessor {
    config: PostprocessConfig,
    state: DebounceState,
}

impl Postprocessor {
    pub fn new(config: PostprocessConfig) -> Self {
        Self {
            config,
            state: DebounceState::default(),
        }
    }

    pub fn config(&self) -> &PostprocessConfig {
        &self.config
    }

    pub fn state(&self) -> DebounceState {
        self.state
    }

    /// Forget the last emission
    pub fn reset(&mut self) {
        self.state = DebounceState::default();
    }

    /// True for classes that never produce a gesture
    pub fn is_sentinel(&self, class: usize) -> bool {
        class == self.config.unknown_class || class == self.config.idle_class
    }

    pub fn is_repeatable(&self, class: usize) -> bool {
        self.config.repeatable_classes.contains(&class)
    }

    /// Run one prediction through the state machine
    ///
    /// # Arguments
    /// * `class` - Predicted class index
    /// * `probability` - Probability of the predicted class
    /// * `now_ms` - Monotonic timestamp of the prediction
    ///
    /// # Returns
    /// The event to emit, or `None` if the prediction is suppressed
    pub fn process(&mut self, class: usize, probability: f32, now_ms: u64) -> Option<PredictionEvent> {
        if !self.config.enabled {
            return Some(PredictionEvent::new(class, probability, true, now_ms));
        }
        if self.is_sentinel(class) {
            return None;
        }
        if !self.is_repeatable(class) && !self.state.expired(now_ms, self.config.timeout_ms) {
            log::debug!(
                "Debounced class {} at {} ms (last fired {:?})",
                class,
                now_ms,
                self.state.last_fired_ms
            );
            return None;
        }

        self.state.last_fired_ms = Some(now_ms);
        Some(PredictionEvent::new(class, probability, false, now_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn postprocessor() -> Postprocessor {
        Postprocessor::new(PostprocessConfig::default())
    }

    #[test]
    fn test_first_gesture_fires() {
        let mut pp = postprocessor();
        let event = pp.process(1, 0.9, 0).unwrap();
        assert_eq!(event.class, 1);
        assert_eq!(event.name, "swipe_up");
        assert!(!event.raw);
        assert_eq!(pp.state().last_fired_ms, Some(0));
    }

    #[test]
    fn test_sentinels_suppressed() {
        let mut pp = postprocessor();
        assert!(pp.process(0, 1.0, 1000).is_none());
        assert!(pp.process(9, 1.0, 2000).is_none());
        assert_eq!(pp.state(), DebounceState::default());
    }

    #[test]
    fn test_timeout_is_exclusive() {
        let mut pp = postprocessor();
        assert!(pp.process(2, 0.8, 1000).is_some());
        assert!(pp.process(3, 0.8, 1800).is_none());
        assert!(pp.process(3, 0.8, 1801).is_some());
    }

    #[test]
    fn test_repeatable_updates_timestamp() {
        let mut pp = postprocessor();
        assert!(pp.process(7, 0.6, 100).is_some());
        assert!(pp.process(8, 0.6, 110).is_some());
        // a non-repeatable class is debounced against the rotation
        assert!(pp.process(1, 0.9, 500).is_none());
    }

    #[test]
    fn test_disabled_emits_everything_raw() {
        let mut pp = Postprocessor::new(PostprocessConfig {
            enabled: false,
            ..PostprocessConfig::default()
        });
        for t in 0..3 {
            let event = pp.process(9, 0.5, t).unwrap();
            assert!(event.raw);
        }
        assert_eq!(pp.state().last_fired_ms, None);
    }

    #[test]
    fn test_payload_format() {
        let event = PredictionEvent::new(4, 0.876, false, 0);
        assert_eq!(event.percentage, 87);
        assert_eq!(event.payload().as_bytes(), b"4,87");

        let event = PredictionEvent::new(12, 1.0, true, 0);
        assert_eq!(event.payload().as_str(), "12,100");
        assert_eq!(event.name, "class");
    }

    #[test]
    fn test_payload_truncated_to_capacity() {
        let event = PredictionEvent::new(1_234_567_890_123, 1.0, false, 0);
        assert_eq!(event.payload().as_bytes().len(), PAYLOAD_CAPACITY - 1);
        assert_eq!(event.payload().as_str(), "1234567890123,");
    }

    #[test]
    fn test_gesture_class_lookup() {
        assert_eq!(GestureClass::from_index(8), Some(GestureClass::RotationLeft));
        assert_eq!(GestureClass::from_index(10), None);
        assert_eq!(GestureClass::DoubleShake.to_string(), "double_shake");
        assert_eq!(GestureClass::Idle.index(), 9);
    }
}

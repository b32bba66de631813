// Sensor - plumbing between the sensor-ready producer and the pipeline
//
// Architecture:
// - The producer (sensor interrupt or timer) pushes fixed-size frames into a
//   lock-free SPSC ring buffer and gives the ready signal
// - The consumer (inference thread) blocks on the signal, then drains the
//   queue and runs the pipeline for each frame
//
// The signal is the only state shared across the boundary besides the queue
// itself. A full queue drops the new frame and counts an overrun; the
// producer never blocks.

use crate::config::SensorConfig;
use crate::error::PipelineError;
use rtrb::{Consumer, Producer, RingBuffer};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Largest number of values in one frame
pub const MAX_FRAME_AXES: usize = 16;

/// Binary semaphore: `give` sets, `take` waits for and clears
#[derive(Debug, Default)]
pub struct ReadySignal {
    ready: Mutex<bool>,
    cond: Condvar,
}

impl ReadySignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal the consumer; repeated gives before a take collapse into one
    pub fn give(&self) {
        let mut ready = self.ready.lock().unwrap_or_else(PoisonError::into_inner);
        *ready = true;
        self.cond.notify_one();
    }

    /// Block until signalled
    pub fn take(&self) {
        let mut ready = self.ready.lock().unwrap_or_else(PoisonError::into_inner);
        while !*ready {
            ready = self.cond.wait(ready).unwrap_or_else(PoisonError::into_inner);
        }
        *ready = false;
    }

    /// Block until signalled or `timeout` elapses
    ///
    /// # Returns
    /// `true` if the signal was taken
    pub fn take_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut ready = self.ready.lock().unwrap_or_else(PoisonError::into_inner);
        while !*ready {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            ready = self
                .cond
                .wait_timeout(ready, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        *ready = false;
        true
    }

    /// Clear without waiting
    ///
    /// # Returns
    /// `true` if the signal was set
    pub fn try_take(&self) -> bool {
        let mut ready = self.ready.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *ready, false)
    }
}

/// One sample period of sensor values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorFrame {
    pub timestamp_ms: u64,
    values: [f32; MAX_FRAME_AXES],
    len: usize,
}

impl SensorFrame {
    /// # Errors
    /// `InvalidArgument` for more than `MAX_FRAME_AXES` values, `NullArgument`
    /// for none
    pub fn new(timestamp_ms: u64, values: &[f32]) -> Result<Self, PipelineError> {
        if values.is_empty() {
            return Err(PipelineError::NullArgument { argument: "values" });
        }
        if values.len() > MAX_FRAME_AXES {
            return Err(PipelineError::InvalidArgument {
                reason: format!(
                    "{} values exceed the {} axes of a frame",
                    values.len(),
                    MAX_FRAME_AXES
                ),
            });
        }
        let mut frame = Self {
            timestamp_ms,
            values: [0.0; MAX_FRAME_AXES],
            len: values.len(),
        };
        frame.values[..values.len()].copy_from_slice(values);
        Ok(frame)
    }

    pub fn values(&self) -> &[f32] {
        &self.values[..self.len]
    }
}

/// Producer half, owned by the sensor side
pub struct SensorProducer {
    producer: Producer<SensorFrame>,
    signal: Arc<ReadySignal>,
    overruns: Arc<AtomicU64>,
}

impl SensorProducer {
    /// Queue a frame and wake the consumer
    ///
    /// # Returns
    /// `false` if the queue was full and the frame was dropped
    pub fn push(&mut self, frame: SensorFrame) -> bool {
        let queued = match self.producer.push(frame) {
            Ok(()) => true,
            Err(_) => {
                self.overruns.fetch_add(1, Ordering::Relaxed);
                false
            }
        };
        self.signal.give();
        queued
    }

    pub fn overruns(&self) -> u64 {
        self.overruns.load(Ordering::Relaxed)
    }

    /// Frames that can be queued before the next one is dropped
    pub fn free_slots(&self) -> usize {
        self.producer.slots()
    }

    /// Wake the consumer without queueing a frame
    pub fn wake(&self) {
        self.signal.give();
    }
}

/// Consumer half, owned by the inference thread
pub struct SensorConsumer {
    consumer: Consumer<SensorFrame>,
    signal: Arc<ReadySignal>,
    overruns: Arc<AtomicU64>,
}

impl SensorConsumer {
    pub fn pop(&mut self) -> Option<SensorFrame> {
        self.consumer.pop().ok()
    }

    /// Frames waiting in the queue
    pub fn pending(&self) -> usize {
        self.consumer.slots()
    }

    /// Wait for the producer, at most `timeout`
    pub fn wait(&self, timeout: Duration) -> bool {
        self.signal.take_timeout(timeout)
    }

    pub fn overruns(&self) -> u64 {
        self.overruns.load(Ordering::Relaxed)
    }
}

/// Split sensor channels, created once at startup
pub struct SensorChannels {
    pub producer: SensorProducer,
    pub consumer: SensorConsumer,
}

impl SensorChannels {
    /// # Arguments
    /// * `capacity` - Frames the queue holds before dropping
    pub fn new(capacity: usize) -> Self {
        let (producer, consumer) = RingBuffer::new(capacity.max(1));
        let signal = Arc::new(ReadySignal::new());
        let overruns = Arc::new(AtomicU64::new(0));
        Self {
            producer: SensorProducer {
                producer,
                signal: Arc::clone(&signal),
                overruns: Arc::clone(&overruns),
            },
            consumer: SensorConsumer {
                consumer,
                signal,
                overruns,
            },
        }
    }

    pub fn from_config(config: &SensorConfig) -> Self {
        Self::new(config.queue_capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_signal_collapses_gives() {
        let signal = ReadySignal::new();
        signal.give();
        signal.give();
        assert!(signal.try_take());
        assert!(!signal.try_take());
        assert!(!signal.take_timeout(Duration::from_millis(5)));
    }

    #[test]
    fn test_signal_wakes_other_thread() {
        let signal = Arc::new(ReadySignal::new());
        let waiter = {
            let signal = Arc::clone(&signal);
            thread::spawn(move || signal.take())
        };
        signal.give();
        waiter.join().unwrap();
        assert!(!signal.try_take());
    }

    #[test]
    fn test_frame_limits() {
        assert!(SensorFrame::new(0, &[]).is_err());
        assert!(SensorFrame::new(0, &[0.0; MAX_FRAME_AXES + 1]).is_err());
        let frame = SensorFrame::new(5, &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(frame.values(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_full_queue_counts_overruns() {
        let SensorChannels {
            mut producer,
            mut consumer,
        } = SensorChannels::new(2);
        let frame = SensorFrame::new(0, &[0.0; 6]).unwrap();
        assert!(producer.push(frame));
        assert!(producer.push(frame));
        assert!(!producer.push(frame));
        assert_eq!(consumer.overruns(), 1);

        assert!(consumer.wait(Duration::from_millis(1)));
        assert_eq!(consumer.pending(), 2);
        assert!(consumer.pop().is_some());
        assert!(consumer.pop().is_some());
        assert!(consumer.pop().is_none());
    }

    #[test]
    fn test_channels_are_send() {
        fn assert_send<T: Send>() {}
        assert_send::<SensorProducer>();
        assert_send::<SensorConsumer>();
    }
}

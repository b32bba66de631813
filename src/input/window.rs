// Window - accumulation of raw sensor vectors into analysis windows
//
// Each fed vector carries one value per unique input (sensor axis). Values of
// the used axes are stored planar: one contiguous slot of `window_size`
// samples per used axis, so per-axis statistics work on plain slices.
//
// Strategies:
// - NoWindow: every vector is a complete "window" of one sample
// - Discrete: non-overlapping windows; the buffer restarts after each window
// - Sliding: after each window the oldest `window_shift` samples are dropped
//   and the rest slide to the front, so consecutive windows overlap by
//   `window_size - window_shift` samples
//
// A usage mask selects the axes that are stored; unused axes are skipped.

use crate::dsp::Sample;
use crate::error::{PipelineError, SetupError, Status};
use serde::{Deserialize, Serialize};

/// Windowing strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowMode {
    NoWindow,
    Discrete,
    Sliding,
}

/// Window geometry from the model data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    pub mode: WindowMode,
    /// Values per fed vector
    pub unique_num: usize,
    /// Samples per axis in one window (ignored for `NoWindow`)
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    /// Samples dropped between sliding windows
    #[serde(default)]
    pub window_shift: usize,
    /// Bit `i` of byte `i / 8` marks axis `i` as used; `None` uses every axis
    #[serde(default)]
    pub usage_mask: Option<Vec<u8>>,
}

fn default_window_size() -> usize {
    1
}

/// Read bit `index` from a little-endian byte bitmask
pub fn mask_bit(mask: &[u8], index: usize) -> bool {
    mask.get(index / 8)
        .map(|byte| byte & (1 << (index % 8)) != 0)
        .unwrap_or(false)
}

impl WindowConfig {
    /// Samples per axis in one window after applying the strategy
    pub fn effective_window_size(&self) -> usize {
        match self.mode {
            WindowMode::NoWindow => 1,
            _ => self.window_size,
        }
    }

    /// Indices of the axes stored in the window
    pub fn used_axes(&self) -> Vec<usize> {
        match &self.usage_mask {
            Some(mask) => (0..self.unique_num).filter(|&i| mask_bit(mask, i)).collect(),
            None => (0..self.unique_num).collect(),
        }
    }

    /// Check the geometry once at setup
    pub fn validate(&self) -> Result<(), SetupError> {
        let invalid = |reason: String| Err(SetupError::InvalidWindow { reason });

        if self.unique_num == 0 {
            return invalid("unique_num must be at least 1".to_string());
        }
        if self.mode != WindowMode::NoWindow && self.window_size == 0 {
            return invalid("window_size must be at least 1".to_string());
        }
        if self.mode == WindowMode::Sliding
            && (self.window_shift == 0 || self.window_shift > self.window_size)
        {
            return invalid(format!(
                "window_shift {} must be in 1..={}",
                self.window_shift, self.window_size
            ));
        }
        if let Some(mask) = &self.usage_mask {
            let needed = self.unique_num.div_ceil(8);
            if mask.len() < needed {
                return Err(SetupError::TableLength {
                    table: "usage_mask",
                    expected: needed,
                    actual: mask.len(),
                });
            }
        }
        if self.used_axes().is_empty() {
            return invalid("usage mask selects no axis".to_string());
        }
        Ok(())
    }
}

/// Result of feeding values into a window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    /// All values consumed, window not complete yet
    InProgress,
    /// A window completed after `consumed` values; the rest were not read
    Ready { consumed: usize },
}

impl FeedStatus {
    pub fn status(self) -> Status {
        match self {
            FeedStatus::InProgress => Status::InProgress,
            FeedStatus::Ready { .. } => Status::Success,
        }
    }

    pub fn is_ready(self) -> bool {
        matches!(self, FeedStatus::Ready { .. })
    }
}

/// Window buffer for one input precision
#[derive(Debug, Clone)]
pub struct Window<T> {
    mode: WindowMode,
    unique_num: usize,
    window_size: usize,
    window_shift: usize,
    used: Vec<usize>,
    buffer: Vec<T>,
    filled: usize,
    ready: bool,
}

impl<T: Sample> Window<T> {
    /// Allocate window memory for a validated geometry
    pub fn new(config: &WindowConfig) -> Result<Self, SetupError> {
        config.validate()?;
        let window_size = config.effective_window_size();
        let used = config.used_axes();
        Ok(Self {
            mode: config.mode,
            unique_num: config.unique_num,
            window_size,
            window_shift: match config.mode {
                WindowMode::Sliding => config.window_shift,
                _ => window_size,
            },
            buffer: vec![T::default(); used.len() * window_size],
            used,
            filled: 0,
            ready: false,
        })
    }

    pub fn mode(&self) -> WindowMode {
        self.mode
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn window_shift(&self) -> usize {
        self.window_shift
    }

    pub fn unique_num(&self) -> usize {
        self.unique_num
    }

    /// Axes stored in the window, in slot order
    pub fn used_axes(&self) -> &[usize] {
        &self.used
    }

    /// Samples currently buffered per axis
    pub fn filled(&self) -> usize {
        self.filled
    }

    /// True once a window completed and until the next feed
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Planar window memory: `used_axes().len()` slots of `window_size()`
    pub fn data(&self) -> &[T] {
        &self.buffer
    }

    /// Samples of one used axis slot
    pub fn axis(&self, slot: usize) -> &[T] {
        let start = slot * self.window_size;
        &self.buffer[start..start + self.window_size]
    }

    /// Drop all buffered samples
    pub fn reset(&mut self) {
        self.filled = 0;
        self.ready = false;
    }

    /// Append vectors until a window completes
    ///
    /// # Arguments
    /// * `values` - Whole vectors of `unique_num()` values each
    ///
    /// # Returns
    /// `Ready { consumed }` as soon as a window completes (values after
    /// `consumed` are not read), `InProgress` otherwise.
    ///
    /// # Errors
    /// * `NullArgument` for an empty slice
    /// * `InvalidArgument` if the length is not a multiple of `unique_num()`
    pub fn feed(&mut self, values: &[T]) -> Result<FeedStatus, PipelineError> {
        if values.is_empty() {
            return Err(PipelineError::NullArgument { argument: "values" });
        }
        if values.len() % self.unique_num != 0 {
            return Err(PipelineError::InvalidArgument {
                reason: format!(
                    "{} values is not a multiple of {} inputs",
                    values.len(),
                    self.unique_num
                ),
            });
        }

        for (i, vector) in values.chunks_exact(self.unique_num).enumerate() {
            if self.ready {
                self.begin_next_window();
            }
            for (slot, &axis) in self.used.iter().enumerate() {
                self.buffer[slot * self.window_size + self.filled] = vector[axis];
            }
            self.filled += 1;
            if self.filled == self.window_size {
                self.ready = true;
                return Ok(FeedStatus::Ready {
                    consumed: (i + 1) * self.unique_num,
                });
            }
        }
        Ok(FeedStatus::InProgress)
    }

    fn begin_next_window(&mut self) {
        self.ready = false;
        match self.mode {
            WindowMode::Sliding if self.window_shift < self.window_size => {
                for slot in 0..self.used.len() {
                    let start = slot * self.window_size;
                    self.buffer[start..start + self.window_size]
                        .copy_within(self.window_shift.., 0);
                }
                self.filled = self.window_size - self.window_shift;
            }
            _ => self.filled = 0,
        }
    }
}

#[cfg(test)]
#[path = "window_tests.rs"]
mod tests;

// Input module - raw sample intake, windowing and scaling
//
// The input context owns the window memory for the model's input precision
// and scales a complete window into the network's value domain.

pub mod scale;
pub mod window;

pub use scale::{descale_value, scale_value, ScaleTable};
pub use window::{mask_bit, FeedStatus, Window, WindowConfig, WindowMode};

use crate::dsp::{Sample, SampleKind};
use crate::error::{PipelineError, SetupError};
use crate::model::Quantum;
use serde::{Deserialize, Serialize};

/// Input section of the model data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    pub input_type: SampleKind,
    #[serde(flatten)]
    pub window: WindowConfig,
    /// Equal sub-windows each window is split into for feature extraction
    #[serde(default = "default_subwindow_num")]
    pub subwindow_num: usize,
    /// Min/max per used axis for raw-window scaling
    #[serde(default)]
    pub scale: ScaleTable,
}

fn default_subwindow_num() -> usize {
    1
}

impl InputConfig {
    pub fn validate(&self) -> Result<(), SetupError> {
        self.window.validate()?;
        let ws = self.window.effective_window_size();
        if self.subwindow_num == 0 || ws % self.subwindow_num != 0 {
            return Err(SetupError::InvalidWindow {
                reason: format!(
                    "{} sub-windows do not divide a window of {}",
                    self.subwindow_num, ws
                ),
            });
        }
        Ok(())
    }
}

/// Raw samples handed to the pipeline, tagged by precision
#[derive(Debug, Clone, Copy)]
pub enum InputSamples<'a> {
    I8(&'a [i8]),
    I16(&'a [i16]),
    F32(&'a [f32]),
}

impl<'a> InputSamples<'a> {
    pub fn kind(&self) -> SampleKind {
        match self {
            InputSamples::I8(_) => SampleKind::I8,
            InputSamples::I16(_) => SampleKind::I16,
            InputSamples::F32(_) => SampleKind::F32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            InputSamples::I8(v) => v.len(),
            InputSamples::I16(v) => v.len(),
            InputSamples::F32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Samples from `start` on (empty past the end)
    pub fn tail(&self, start: usize) -> InputSamples<'a> {
        match *self {
            InputSamples::I8(v) => InputSamples::I8(v.get(start..).unwrap_or(&[])),
            InputSamples::I16(v) => InputSamples::I16(v.get(start..).unwrap_or(&[])),
            InputSamples::F32(v) => InputSamples::F32(v.get(start..).unwrap_or(&[])),
        }
    }
}

impl<'a> From<&'a [i8]> for InputSamples<'a> {
    fn from(values: &'a [i8]) -> Self {
        InputSamples::I8(values)
    }
}

impl<'a> From<&'a [i16]> for InputSamples<'a> {
    fn from(values: &'a [i16]) -> Self {
        InputSamples::I16(values)
    }
}

impl<'a> From<&'a [f32]> for InputSamples<'a> {
    fn from(values: &'a [f32]) -> Self {
        InputSamples::F32(values)
    }
}

/// Window memory typed by input precision
#[derive(Debug, Clone)]
pub enum InputWindow {
    I8(Window<i8>),
    I16(Window<i16>),
    F32(Window<f32>),
}

/// Input stage of the pipeline
#[derive(Debug, Clone)]
pub struct InputContext {
    window: InputWindow,
    subwindow_num: usize,
    scale: ScaleTable,
}

impl InputContext {
    /// Build the input stage
    ///
    /// # Arguments
    /// * `config` - Input section of the model
    /// * `scales_raw` - Whether the raw window feeds the network, in which case
    ///   the scale table must cover every used axis
    pub fn new(config: &InputConfig, scales_raw: bool) -> Result<Self, SetupError> {
        config.validate()?;
        let window = match config.input_type {
            SampleKind::I8 => InputWindow::I8(Window::new(&config.window)?),
            SampleKind::I16 => InputWindow::I16(Window::new(&config.window)?),
            SampleKind::F32 => InputWindow::F32(Window::new(&config.window)?),
        };
        let ctx = Self {
            window,
            subwindow_num: config.subwindow_num,
            scale: config.scale.clone(),
        };
        if scales_raw {
            ctx.scale.validate("input_scale", ctx.used_axes().len())?;
        }
        Ok(ctx)
    }

    pub fn input_type(&self) -> SampleKind {
        match &self.window {
            InputWindow::I8(_) => SampleKind::I8,
            InputWindow::I16(_) => SampleKind::I16,
            InputWindow::F32(_) => SampleKind::F32,
        }
    }

    pub fn window(&self) -> &InputWindow {
        &self.window
    }

    pub fn unique_num(&self) -> usize {
        match &self.window {
            InputWindow::I8(w) => w.unique_num(),
            InputWindow::I16(w) => w.unique_num(),
            InputWindow::F32(w) => w.unique_num(),
        }
    }

    pub fn window_size(&self) -> usize {
        match &self.window {
            InputWindow::I8(w) => w.window_size(),
            InputWindow::I16(w) => w.window_size(),
            InputWindow::F32(w) => w.window_size(),
        }
    }

    pub fn mode(&self) -> WindowMode {
        match &self.window {
            InputWindow::I8(w) => w.mode(),
            InputWindow::I16(w) => w.mode(),
            InputWindow::F32(w) => w.mode(),
        }
    }

    pub fn used_axes(&self) -> &[usize] {
        match &self.window {
            InputWindow::I8(w) => w.used_axes(),
            InputWindow::I16(w) => w.used_axes(),
            InputWindow::F32(w) => w.used_axes(),
        }
    }

    pub fn subwindow_num(&self) -> usize {
        self.subwindow_num
    }

    /// Length of the scaled raw window
    pub fn scaled_len(&self) -> usize {
        self.used_axes().len() * self.window_size()
    }

    pub fn is_ready(&self) -> bool {
        match &self.window {
            InputWindow::I8(w) => w.is_ready(),
            InputWindow::I16(w) => w.is_ready(),
            InputWindow::F32(w) => w.is_ready(),
        }
    }

    pub fn reset(&mut self) {
        match &mut self.window {
            InputWindow::I8(w) => w.reset(),
            InputWindow::I16(w) => w.reset(),
            InputWindow::F32(w) => w.reset(),
        }
    }

    /// Feed raw samples of the model's input precision
    ///
    /// # Errors
    /// `InvalidArgument` if the samples have a different precision, plus the
    /// errors of `Window::feed`
    pub fn feed(&mut self, samples: InputSamples<'_>) -> Result<FeedStatus, PipelineError> {
        let expected = self.input_type();
        match (&mut self.window, samples) {
            (InputWindow::I8(w), InputSamples::I8(v)) => w.feed(v),
            (InputWindow::I16(w), InputSamples::I16(v)) => w.feed(v),
            (InputWindow::F32(w), InputSamples::F32(v)) => w.feed(v),
            (_, other) => Err(PipelineError::InvalidArgument {
                reason: format!(
                    "model expects {:?} samples, got {:?}",
                    expected,
                    other.kind()
                ),
            }),
        }
    }

    /// Scale the current window into `out` (planar, one slot per used axis)
    pub fn scale_window<Q: Quantum>(&self, out: &mut [Q]) {
        match &self.window {
            InputWindow::I8(w) => scale_planar(w, &self.scale, out),
            InputWindow::I16(w) => scale_planar(w, &self.scale, out),
            InputWindow::F32(w) => scale_planar(w, &self.scale, out),
        }
    }
}

fn scale_planar<T: Sample, Q: Quantum>(window: &Window<T>, table: &ScaleTable, out: &mut [Q]) {
    let ws = window.window_size();
    for slot in 0..window.used_axes().len() {
        let samples = window.axis(slot);
        for (dst, &v) in out[slot * ws..(slot + 1) * ws].iter_mut().zip(samples) {
            *dst = table.scale(slot, v.to_f64());
        }
    }
}

// Features module - DSP feature extraction from a complete input window
//
// For every sub-window, every used axis and every selected feature (time
// domain first, then frequency domain, both in bit order) one or more values
// are appended to the extracted-feature buffer. The buffer is typed by the
// input precision (i8 -> i16, i16 -> i32, f32 -> f32) and scaled per feature
// into the model precision afterwards.
//
// Argument order per axis follows the same walk:
//   time features with an argument, one value each
//   peak search (peaks count, min distance) at the first DOM_FREQS* feature
//   THD harmonics count
//   band split (low/mid bin, mid/high bin) at the first FER_* feature
//   SPECTRUM_BINS (start bin, bins count)

pub mod args;
pub mod kernels;
pub mod mask;
pub mod spectrum;

pub use args::{ArgumentTable, FeatureArguments, FeatureId};
pub use kernels::TimeDomain;
pub use mask::{FeatureMask, FreqFeature, TimeFeature};
pub use spectrum::SpectrumEngine;

use crate::dsp::spectral::{MAX_PEAKS, NO_PEAK};
use crate::dsp::{FeatureValue, SampleKind, StatContext, Strided};
use crate::error::{PipelineError, SetupError};
use crate::input::{InputContext, InputWindow, ScaleTable, Window};
use crate::model::Quantum;
use args::{BAND_SPLIT_ARGS, PEAK_SEARCH_ARGS, SPECTRUM_BINS_ARGS};
use kernels::arg_usize;
use serde::{Deserialize, Serialize};

/// Feature section of the model data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// One mask per used axis, or a single mask shared by every axis
    pub masks: Vec<FeatureMask>,
    /// Total number of extracted features
    pub overall_num: usize,
    /// Min/max per extracted feature
    #[serde(default)]
    pub scale: ScaleTable,
    /// Argument list per used axis, or a single list shared by every axis
    #[serde(default)]
    pub arguments: Vec<Vec<f32>>,
    /// Real FFT length; defaults to the sub-window length rounded up to a
    /// power of two (at least 16)
    #[serde(default)]
    pub fft_len: Option<usize>,
}

/// Extracted features typed by input precision
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractedFeatures {
    I16(Vec<i16>),
    I32(Vec<i32>),
    F32(Vec<f32>),
}

impl ExtractedFeatures {
    fn new(kind: SampleKind, len: usize) -> Self {
        match kind {
            SampleKind::I8 => ExtractedFeatures::I16(vec![0; len]),
            SampleKind::I16 => ExtractedFeatures::I32(vec![0; len]),
            SampleKind::F32 => ExtractedFeatures::F32(vec![0.0; len]),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ExtractedFeatures::I16(v) => v.len(),
            ExtractedFeatures::I32(v) => v.len(),
            ExtractedFeatures::F32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        match self {
            ExtractedFeatures::I16(v) => v.get(index).map(|x| x.to_f64()),
            ExtractedFeatures::I32(v) => v.get(index).map(|x| x.to_f64()),
            ExtractedFeatures::F32(v) => v.get(index).map(|x| x.to_f64()),
        }
    }

    pub fn to_f64_vec(&self) -> Vec<f64> {
        (0..self.len()).filter_map(|i| self.get(i)).collect()
    }
}

/// Sequential writer into the extracted-feature buffer
struct FeatureWriter<'a, F> {
    out: &'a mut [F],
    pos: usize,
}

impl<'a, F: FeatureValue> FeatureWriter<'a, F> {
    fn new(out: &'a mut [F]) -> Self {
        Self { out, pos: 0 }
    }

    fn push(&mut self, value: f64) -> Result<(), PipelineError> {
        let pos = self.pos;
        let slot = self.out.get_mut(pos).ok_or_else(|| PipelineError::Unspecified {
            details: format!("feature buffer of {} overflowed", pos),
        })?;
        *slot = F::from_f64_saturating(value);
        self.pos += 1;
        Ok(())
    }
}

/// Mask walk state shared by the dry count and the extraction
struct ExtractionPlan {
    masks: Vec<FeatureMask>,
    subwindow_num: usize,
    args: Box<dyn FeatureArguments>,
    spectrum: Option<SpectrumEngine>,
}

impl ExtractionPlan {
    fn mask(&self, slot: usize) -> FeatureMask {
        match self.masks.len() {
            1 => self.masks[0],
            _ => self.masks[slot],
        }
    }

    /// Count the features one window produces and validate every argument
    fn count(&mut self, axes: usize, sub_len: usize) -> Result<usize, SetupError> {
        let bins = self.spectrum.as_ref().map_or(0, SpectrumEngine::bins);
        self.args.rewind();
        let mut per_window = 0;

        for slot in 0..axes {
            let mask = self.mask(slot);
            for feature in mask.time_features() {
                if feature.args_num() == 0 {
                    continue;
                }
                let mut arg = [0.0f32];
                fetch_setup(self.args.as_mut(), slot, FeatureId::Time(feature), &mut arg)?;
                let invalid = match feature {
                    TimeFeature::P2pLowFreq | TimeFeature::P2pHighFreq => arg_usize(arg[0]) == 0,
                    TimeFeature::Autocorr => arg_usize(arg[0]) >= sub_len.max(1),
                    _ => !arg[0].is_finite(),
                };
                if invalid {
                    return Err(invalid_argument(
                        feature.name(),
                        format!("argument {} out of range", arg[0]),
                    ));
                }
            }
            per_window += mask.time.count_ones() as usize;

            let mut peaks_num = 0;
            let mut peaks_fetched = false;
            let mut bands_fetched = false;
            for feature in mask.freq_features() {
                let name = feature.name();
                if feature.uses_peaks() && !peaks_fetched {
                    let mut group = [0.0f32; PEAK_SEARCH_ARGS];
                    fetch_setup(
                        self.args.as_mut(),
                        slot,
                        FeatureId::Freq(FreqFeature::DomFreqs),
                        &mut group,
                    )?;
                    peaks_num = arg_usize(group[0]);
                    if peaks_num == 0 || peaks_num > MAX_PEAKS {
                        return Err(invalid_argument(
                            name,
                            format!("peaks count {} not in 1..={}", group[0], MAX_PEAKS),
                        ));
                    }
                    peaks_fetched = true;
                }
                if feature.uses_bands() && !bands_fetched {
                    let mut split = [0.0f32; BAND_SPLIT_ARGS];
                    fetch_setup(
                        self.args.as_mut(),
                        slot,
                        FeatureId::Freq(FreqFeature::FerLowMid),
                        &mut split,
                    )?;
                    let (low, high) = (arg_usize(split[0]), arg_usize(split[1]));
                    if low > high || high > bins {
                        return Err(invalid_argument(
                            name,
                            format!("band split {}..{} outside {} bins", low, high, bins),
                        ));
                    }
                    bands_fetched = true;
                }
                per_window += match feature {
                    FreqFeature::DomFreqs | FreqFeature::DomFreqsAmpl => peaks_num,
                    FreqFeature::DomFreqsThd => {
                        let mut harmonics = [0.0f32];
                        fetch_setup(self.args.as_mut(), slot, FeatureId::Freq(feature), &mut harmonics)?;
                        if arg_usize(harmonics[0]) == 0 {
                            return Err(invalid_argument(name, "harmonics count must be at least 1".to_string()));
                        }
                        peaks_num
                    }
                    FreqFeature::SpectrumBins => {
                        let mut range = [0.0f32; SPECTRUM_BINS_ARGS];
                        fetch_setup(self.args.as_mut(), slot, FeatureId::Freq(feature), &mut range)?;
                        let (start, count) = (arg_usize(range[0]), arg_usize(range[1]));
                        if count == 0 || start + count > bins {
                            return Err(invalid_argument(
                                name,
                                format!("bins {}+{} outside {} bins", start, count, bins),
                            ));
                        }
                        count
                    }
                    _ => 1,
                };
            }
        }
        Ok(per_window * self.subwindow_num)
    }

    /// Extract every feature of a complete window into `out`
    fn run<S: TimeDomain>(
        &mut self,
        window: &Window<S>,
        out: &mut [S::Feature],
    ) -> Result<usize, PipelineError> {
        let sub_len = window.window_size() / self.subwindow_num;
        let mut writer = FeatureWriter::new(out);

        for sub in 0..self.subwindow_num {
            self.args.rewind();
            for slot in 0..window.used_axes().len() {
                let x = &window.axis(slot)[sub * sub_len..(sub + 1) * sub_len];
                let mask = self.mask(slot);

                let mut ctx = StatContext::new();
                for feature in mask.time_features() {
                    let mut arg = [0.0f32];
                    if feature.args_num() > 0 {
                        self.args.fetch(slot, FeatureId::Time(feature), &mut arg)?;
                    }
                    writer.push(S::time_feature(
                        feature,
                        Strided::contiguous(x),
                        &mut ctx,
                        arg[0],
                    ))?;
                }

                if mask.needs_spectrum() {
                    self.freq_features(slot, mask, x, &mut writer)?;
                }
            }
        }
        Ok(writer.pos)
    }

    fn freq_features<S: TimeDomain>(
        &mut self,
        slot: usize,
        mask: FeatureMask,
        x: &[S],
        writer: &mut FeatureWriter<'_, S::Feature>,
    ) -> Result<(), PipelineError> {
        let spectrum = self
            .spectrum
            .as_mut()
            .ok_or(PipelineError::Unavailable { what: "spectrum" })?;
        spectrum.compute(x)?;
        let bins = spectrum.bins();

        let mut peaks = [NO_PEAK; MAX_PEAKS];
        let mut peaks_num = 0;
        let mut bands: Option<(usize, usize)> = None;

        for feature in mask.freq_features() {
            if feature.uses_peaks() && peaks_num == 0 {
                let mut group = [0.0f32; PEAK_SEARCH_ARGS];
                self.args
                    .fetch(slot, FeatureId::Freq(FreqFeature::DomFreqs), &mut group)?;
                peaks_num = arg_usize(group[0]).clamp(1, MAX_PEAKS);
                spectrum.find_peaks(arg_usize(group[1]), &mut peaks[..peaks_num]);
            }
            if feature.uses_bands() && bands.is_none() {
                let mut split = [0.0f32; BAND_SPLIT_ARGS];
                self.args
                    .fetch(slot, FeatureId::Freq(FreqFeature::FerLowMid), &mut split)?;
                let low = arg_usize(split[0]).min(bins);
                bands = Some((low, arg_usize(split[1]).clamp(low, bins)));
            }
            let peaks = &peaks[..peaks_num];
            let (low, high) = bands.unwrap_or((0, 0));

            match feature {
                FreqFeature::DomFreqs => {
                    for &p in peaks {
                        writer.push(p as f64)?;
                    }
                }
                FreqFeature::DomFreqsAmpl => {
                    for &p in peaks {
                        let amplitude = if p < 0 { 0.0 } else { spectrum.magnitude(p as usize) };
                        writer.push(amplitude)?;
                    }
                }
                FreqFeature::DomFreqsThd => {
                    let mut harmonics = [0.0f32];
                    self.args.fetch(slot, FeatureId::Freq(feature), &mut harmonics)?;
                    for &p in peaks {
                        writer.push(spectrum.thd(p, arg_usize(harmonics[0])))?;
                    }
                }
                FreqFeature::DomFreqsSnr => writer.push(spectrum.snr(peaks))?,
                FreqFeature::DomFreqsMeanDist => writer.push(spectrum.peaks_mean_distance(peaks))?,
                FreqFeature::FerLowMid => writer.push(spectrum.energy_ratio(0..low, low..high))?,
                FreqFeature::FerMidHigh => writer.push(spectrum.energy_ratio(low..high, high..bins))?,
                FreqFeature::FerLowHigh => writer.push(spectrum.energy_ratio(0..low, high..bins))?,
                FreqFeature::SpectralRms => writer.push(spectrum.rms())?,
                FreqFeature::SpectralCrest => writer.push(spectrum.crest())?,
                FreqFeature::SpectralCentroid => writer.push(spectrum.centroid())?,
                FreqFeature::SpectralSpread => writer.push(spectrum.spread())?,
                FreqFeature::SpectrumBins => {
                    let mut range = [0.0f32; SPECTRUM_BINS_ARGS];
                    self.args.fetch(slot, FeatureId::Freq(feature), &mut range)?;
                    let start = arg_usize(range[0]);
                    for bin in start..start + arg_usize(range[1]) {
                        writer.push(spectrum.magnitude(bin))?;
                    }
                }
            }
        }
        Ok(())
    }
}

fn invalid_argument(feature: &str, reason: String) -> SetupError {
    SetupError::InvalidArgument {
        feature: feature.to_string(),
        reason,
    }
}

fn fetch_setup(
    args: &mut dyn FeatureArguments,
    slot: usize,
    feature: FeatureId,
    out: &mut [f32],
) -> Result<(), SetupError> {
    args.fetch(slot, feature, out).map_err(|e| {
        let name = match feature {
            FeatureId::Time(f) => f.name(),
            FeatureId::Freq(f) => f.name(),
        };
        invalid_argument(name, e.to_string())
    })
}

/// Expand a per-axis table given either once or once per used axis
fn per_axis<T: Clone>(
    table: &'static str,
    values: &[T],
    axes: usize,
) -> Result<Vec<T>, SetupError> {
    match values.len() {
        n if n == axes => Ok(values.to_vec()),
        1 => Ok(vec![values[0].clone(); axes]),
        actual => Err(SetupError::TableLength {
            table,
            expected: axes,
            actual,
        }),
    }
}

/// Feature extraction stage of the pipeline
pub struct FeatureExtractor {
    plan: ExtractionPlan,
    extracted: ExtractedFeatures,
    scale: ScaleTable,
}

impl std::fmt::Debug for FeatureExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureExtractor")
            .field("masks", &self.plan.masks)
            .field("subwindow_num", &self.plan.subwindow_num)
            .field("fft_len", &self.fft_len())
            .field("overall_num", &self.overall_num())
            .finish()
    }
}

impl FeatureExtractor {
    /// Build the extraction stage with arguments from the model data
    pub fn new(config: &FeatureConfig, input: &InputContext) -> Result<Self, SetupError> {
        let axes = input.used_axes().len();
        let arguments = if config.arguments.is_empty() {
            vec![Vec::new(); axes]
        } else {
            per_axis("feature_arguments", &config.arguments, axes)?
        };
        Self::with_arguments(config, input, Box::new(ArgumentTable::new(arguments)))
    }

    /// Build the extraction stage with a custom argument accessor
    ///
    /// # Errors
    /// * `TableLength` if masks or scale tables do not match the geometry
    /// * `FftLength` for an unsupported transform length
    /// * `InvalidArgument` for missing or out-of-range feature arguments
    /// * `FeatureCountMismatch` if the masks produce a different number of
    ///   features than `overall_num`
    pub fn with_arguments(
        config: &FeatureConfig,
        input: &InputContext,
        args: Box<dyn FeatureArguments>,
    ) -> Result<Self, SetupError> {
        let axes = input.used_axes().len();
        let masks = per_axis("feature_masks", &config.masks, axes)?;
        let sub_len = input.window_size() / input.subwindow_num();

        let spectrum = if masks.iter().any(|m| m.needs_spectrum()) {
            let fft_len = config
                .fft_len
                .unwrap_or_else(|| sub_len.next_power_of_two().max(16));
            Some(SpectrumEngine::new(input.input_type(), fft_len)?)
        } else {
            None
        };

        let mut plan = ExtractionPlan {
            masks,
            subwindow_num: input.subwindow_num(),
            args,
            spectrum,
        };
        let computed = plan.count(axes, sub_len)?;
        if computed != config.overall_num {
            return Err(SetupError::FeatureCountMismatch {
                declared: config.overall_num,
                computed,
            });
        }
        config.scale.validate("feature_scale", computed)?;

        log::info!(
            "Feature extraction ready: {} features from {} axes x {} sub-windows (fft {:?})",
            computed,
            axes,
            plan.subwindow_num,
            plan.spectrum.as_ref().map(SpectrumEngine::fft_len)
        );

        Ok(Self {
            extracted: ExtractedFeatures::new(input.input_type(), computed),
            plan,
            scale: config.scale.clone(),
        })
    }

    pub fn overall_num(&self) -> usize {
        self.extracted.len()
    }

    pub fn fft_len(&self) -> Option<usize> {
        self.plan.spectrum.as_ref().map(SpectrumEngine::fft_len)
    }

    /// Features of the last extracted window
    pub fn features(&self) -> &ExtractedFeatures {
        &self.extracted
    }

    /// Extract the features of the input's current window
    ///
    /// # Errors
    /// `Unavailable` if no window is ready
    pub fn extract(&mut self, input: &InputContext) -> Result<(), PipelineError> {
        if !input.is_ready() {
            return Err(PipelineError::Unavailable { what: "input window" });
        }
        let written = match (input.window(), &mut self.extracted) {
            (InputWindow::I8(w), ExtractedFeatures::I16(out)) => self.plan.run(w, out)?,
            (InputWindow::I16(w), ExtractedFeatures::I32(out)) => self.plan.run(w, out)?,
            (InputWindow::F32(w), ExtractedFeatures::F32(out)) => self.plan.run(w, out)?,
            _ => {
                return Err(PipelineError::InvalidArgument {
                    reason: "input precision differs from the extractor's".to_string(),
                })
            }
        };
        if written != self.extracted.len() {
            return Err(PipelineError::Unspecified {
                details: format!(
                    "extracted {} features, expected {}",
                    written,
                    self.extracted.len()
                ),
            });
        }
        Ok(())
    }

    /// Scale the extracted features into the model precision
    pub fn scale_into<Q: Quantum>(&self, out: &mut [Q]) {
        for (i, dst) in out.iter_mut().enumerate().take(self.extracted.len()) {
            if let Some(v) = self.extracted.get(i) {
                *dst = self.scale.scale(i, v);
            }
        }
    }
}

#[cfg(test)]
#[path = "features_tests.rs"]
mod tests;

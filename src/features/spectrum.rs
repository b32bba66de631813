// Spectrum - magnitude spectrum of one sub-window and the spectral measures
// the frequency-domain features are built from
//
// Float inputs use the f32 real FFT; i8/i16 inputs are converted to Q15 and
// go through the fixed-point real FFT. The sub-window is zero-padded or
// truncated to the transform length.

use super::kernels::TimeDomain;
use crate::dsp::fft::q15::rfft_magnitudes_q15;
use crate::dsp::fft::{Rfft, RfftQ15};
use crate::dsp::spectral::{self, fixed, float, SpectralContext};
use crate::dsp::SampleKind;
use crate::error::{PipelineError, SetupError};
use rustfft::num_complex::Complex;
use std::ops::Range;

#[derive(Debug, Clone)]
pub struct FloatSpectrum {
    rfft: Rfft,
    input: Vec<f32>,
    packed: Vec<Complex<f32>>,
    mag: Vec<f32>,
    ctx: SpectralContext<f32>,
}

#[derive(Debug, Clone)]
pub struct FixedSpectrum {
    rfft: RfftQ15,
    input: Vec<i16>,
    packed: Vec<Complex<i16>>,
    mag: Vec<i16>,
    ctx: SpectralContext<i64>,
}

/// FFT state and magnitude spectrum for one input precision
#[derive(Debug, Clone)]
pub enum SpectrumEngine {
    Float(FloatSpectrum),
    Fixed(FixedSpectrum),
}

impl SpectrumEngine {
    /// Allocate FFT tables and buffers
    ///
    /// # Errors
    /// `SetupError::FftLength` for an unsupported transform length
    pub fn new(kind: SampleKind, fft_len: usize) -> Result<Self, SetupError> {
        match kind {
            SampleKind::F32 => {
                let rfft = Rfft::new(fft_len)?;
                let bins = rfft.bins();
                Ok(SpectrumEngine::Float(FloatSpectrum {
                    rfft,
                    input: vec![0.0; fft_len],
                    packed: vec![Complex::new(0.0, 0.0); bins],
                    mag: vec![0.0; bins],
                    ctx: SpectralContext::new(),
                }))
            }
            SampleKind::I8 | SampleKind::I16 => {
                let rfft = RfftQ15::new(fft_len)?;
                let bins = rfft.bins();
                Ok(SpectrumEngine::Fixed(FixedSpectrum {
                    rfft,
                    input: vec![0; fft_len],
                    packed: vec![Complex::new(0, 0); bins],
                    mag: vec![0; bins],
                    ctx: SpectralContext::new(),
                }))
            }
        }
    }

    pub fn fft_len(&self) -> usize {
        match self {
            SpectrumEngine::Float(s) => s.rfft.len(),
            SpectrumEngine::Fixed(s) => s.rfft.len(),
        }
    }

    /// Number of magnitude bins
    pub fn bins(&self) -> usize {
        match self {
            SpectrumEngine::Float(s) => s.mag.len(),
            SpectrumEngine::Fixed(s) => s.mag.len(),
        }
    }

    /// Transform a sub-window and refresh the magnitude spectrum
    pub fn compute<T: TimeDomain>(&mut self, x: &[T]) -> Result<(), PipelineError> {
        match self {
            SpectrumEngine::Float(s) => {
                load_padded(&mut s.input, x, |v| v.to_f32());
                s.rfft.process(&s.input, &mut s.packed)?;
                Rfft::magnitudes(&s.packed, &mut s.mag);
                s.ctx.clear();
            }
            SpectrumEngine::Fixed(s) => {
                load_padded(&mut s.input, x, |v| v.to_q15_sample());
                s.rfft.process(&s.input, &mut s.packed)?;
                rfft_magnitudes_q15(&s.packed, &mut s.mag);
                s.ctx.clear();
            }
        }
        Ok(())
    }

    /// Magnitude of one bin, 0 outside the spectrum
    pub fn magnitude(&self, bin: usize) -> f64 {
        match self {
            SpectrumEngine::Float(s) => s.mag.get(bin).map_or(0.0, |&m| m as f64),
            SpectrumEngine::Fixed(s) => s.mag.get(bin).map_or(0.0, |&m| m as f64),
        }
    }

    /// Dominant peaks of the current spectrum; see `spectral::find_peaks`
    pub fn find_peaks(&self, min_distance: usize, out: &mut [i16]) -> usize {
        match self {
            SpectrumEngine::Float(s) => spectral::find_peaks(&s.mag, 0.0, min_distance, out),
            SpectrumEngine::Fixed(s) => spectral::find_peaks(&s.mag, 0, min_distance, out),
        }
    }

    /// Harmonic distortion around one peak bin; 0 for an unfilled peak slot
    pub fn thd(&self, peak: i16, harmonics: usize) -> f64 {
        if peak < 0 {
            return 0.0;
        }
        match self {
            SpectrumEngine::Float(s) => float::thd(&s.mag, peak as usize, harmonics) as f64,
            SpectrumEngine::Fixed(s) => fixed::thd(&s.mag, peak as usize, harmonics) as f64,
        }
    }

    pub fn snr(&self, peaks: &[i16]) -> f64 {
        match self {
            SpectrumEngine::Float(s) => float::snr(&s.mag, peaks) as f64,
            SpectrumEngine::Fixed(s) => fixed::snr(&s.mag, peaks) as f64,
        }
    }

    pub fn peaks_mean_distance(&self, peaks: &[i16]) -> f64 {
        match self {
            SpectrumEngine::Float(_) => float::peaks_mean_distance(peaks) as f64,
            SpectrumEngine::Fixed(_) => fixed::peaks_mean_distance(peaks) as f64,
        }
    }

    pub fn energy_ratio(&self, numerator: Range<usize>, denominator: Range<usize>) -> f64 {
        match self {
            SpectrumEngine::Float(s) => float::energy_ratio(&s.mag, numerator, denominator) as f64,
            SpectrumEngine::Fixed(s) => fixed::energy_ratio(&s.mag, numerator, denominator) as f64,
        }
    }

    pub fn rms(&self) -> f64 {
        match self {
            SpectrumEngine::Float(s) => float::rms(&s.mag) as f64,
            SpectrumEngine::Fixed(s) => fixed::rms(&s.mag) as f64,
        }
    }

    pub fn crest(&mut self) -> f64 {
        match self {
            SpectrumEngine::Float(s) => float::crest(&s.mag, &mut s.ctx) as f64,
            SpectrumEngine::Fixed(s) => fixed::crest(&s.mag, &mut s.ctx) as f64,
        }
    }

    pub fn centroid(&mut self) -> f64 {
        match self {
            SpectrumEngine::Float(s) => float::centroid(&s.mag, &mut s.ctx) as f64,
            SpectrumEngine::Fixed(s) => fixed::centroid(&s.mag, &mut s.ctx) as f64,
        }
    }

    pub fn spread(&mut self) -> f64 {
        match self {
            SpectrumEngine::Float(s) => float::spread(&s.mag, &mut s.ctx) as f64,
            SpectrumEngine::Fixed(s) => fixed::spread(&s.mag, &mut s.ctx) as f64,
        }
    }
}

fn load_padded<T: Copy, U: Copy + Default>(dst: &mut [U], src: &[T], convert: impl Fn(T) -> U) {
    let n = src.len().min(dst.len());
    for (d, &s) in dst[..n].iter_mut().zip(src) {
        *d = convert(s);
    }
    dst[n..].iter_mut().for_each(|d| *d = U::default());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn tone(len: usize, bin: usize, amplitude: f32) -> Vec<f32> {
        (0..len)
            .map(|i| amplitude * (2.0 * PI * bin as f32 * i as f32 / len as f32).sin())
            .collect()
    }

    #[test]
    fn test_float_spectrum_finds_tone() {
        let mut engine = SpectrumEngine::new(SampleKind::F32, 64).unwrap();
        assert_eq!(engine.bins(), 32);
        engine.compute(&tone(64, 5, 1.0)).unwrap();

        let mut peaks = [0i16; 2];
        let found = engine.find_peaks(2, &mut peaks);
        assert!(found >= 1);
        assert_eq!(peaks[0], 5);
        assert!((engine.magnitude(5) - 32.0).abs() < 0.1);
        assert!((engine.centroid() - 5.0).abs() < 0.1);
    }

    #[test]
    fn test_fixed_spectrum_finds_tone() {
        let samples: Vec<i16> = tone(64, 7, 16000.0).iter().map(|&v| v as i16).collect();
        let mut engine = SpectrumEngine::new(SampleKind::I16, 64).unwrap();
        engine.compute(&samples).unwrap();

        let mut peaks = [0i16; 1];
        engine.find_peaks(1, &mut peaks);
        assert_eq!(peaks[0], 7);
        assert!(engine.magnitude(7) > 4000.0);
    }

    #[test]
    fn test_short_input_is_zero_padded() {
        let mut engine = SpectrumEngine::new(SampleKind::F32, 16).unwrap();
        engine.compute(&[1.0f32; 4]).unwrap();
        assert_eq!(engine.magnitude(0), 4.0);
    }

    #[test]
    fn test_unsupported_length() {
        assert!(matches!(
            SpectrumEngine::new(SampleKind::F32, 48),
            Err(SetupError::FftLength { len: 48 })
        ));
        assert!(SpectrumEngine::new(SampleKind::I8, 8).is_err());
    }

    #[test]
    fn test_unfilled_peak_has_no_thd() {
        let engine = SpectrumEngine::new(SampleKind::F32, 16).unwrap();
        assert_eq!(engine.thd(-1, 3), 0.0);
    }
}

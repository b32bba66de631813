// Float spectral measures over f32 magnitude spectra

use super::{peak_span, SpectralContext};
use crate::dsp::ZERO_DIV_FLAG_F32;
use std::ops::Range;

/// Sum of magnitudes, cached in the context
pub fn magnitude_sum(mag: &[f32], ctx: &mut SpectralContext<f32>) -> f32 {
    if let Some(s) = ctx.magnitude_sum {
        return s;
    }
    let s = mag.iter().sum::<f32>();
    ctx.magnitude_sum = Some(s);
    s
}

/// Magnitude-weighted mean bin, cached in the context
pub fn centroid(mag: &[f32], ctx: &mut SpectralContext<f32>) -> f32 {
    if let Some(c) = ctx.centroid {
        return c;
    }
    let total = magnitude_sum(mag, ctx);
    let c = if total == 0.0 {
        ZERO_DIV_FLAG_F32
    } else {
        mag.iter().enumerate().map(|(k, m)| k as f32 * m).sum::<f32>() / total
    };
    ctx.centroid = Some(c);
    c
}

/// Magnitude-weighted standard deviation of the bin index around the centroid
pub fn spread(mag: &[f32], ctx: &mut SpectralContext<f32>) -> f32 {
    let total = magnitude_sum(mag, ctx);
    if total == 0.0 {
        return ZERO_DIV_FLAG_F32;
    }
    let c = centroid(mag, ctx);
    let acc: f32 = mag
        .iter()
        .enumerate()
        .map(|(k, m)| (k as f32 - c).powi(2) * m)
        .sum();
    (acc / total).sqrt()
}

/// Peak magnitude over mean magnitude
pub fn crest(mag: &[f32], ctx: &mut SpectralContext<f32>) -> f32 {
    if mag.is_empty() {
        return 0.0;
    }
    let total = magnitude_sum(mag, ctx);
    if total == 0.0 {
        return ZERO_DIV_FLAG_F32;
    }
    let peak = mag.iter().copied().fold(0.0, f32::max);
    peak / (total / mag.len() as f32)
}

/// Root mean square of the magnitudes
pub fn rms(mag: &[f32]) -> f32 {
    if mag.is_empty() {
        return 0.0;
    }
    (mag.iter().map(|m| m * m).sum::<f32>() / mag.len() as f32).sqrt()
}

/// Energy (sum of squared magnitudes) in a bin range, clamped to the spectrum
pub fn band_energy(mag: &[f32], band: Range<usize>) -> f32 {
    let end = band.end.min(mag.len());
    let start = band.start.min(end);
    mag[start..end].iter().map(|m| m * m).sum()
}

/// Ratio of the energies of two bands
pub fn energy_ratio(mag: &[f32], numerator: Range<usize>, denominator: Range<usize>) -> f32 {
    let den = band_energy(mag, denominator);
    if den == 0.0 {
        return ZERO_DIV_FLAG_F32;
    }
    band_energy(mag, numerator) / den
}

/// Total harmonic distortion relative to the fundamental
///
/// Uses harmonics 2..=`harmonics + 1` that fall inside the spectrum.
pub fn thd(mag: &[f32], fundamental: usize, harmonics: usize) -> f32 {
    if fundamental == 0 || fundamental >= mag.len() || mag[fundamental] == 0.0 {
        return ZERO_DIV_FLAG_F32;
    }
    let power: f32 = (2..=harmonics + 1)
        .map(|h| h * fundamental)
        .take_while(|&bin| bin < mag.len())
        .map(|bin| mag[bin] * mag[bin])
        .sum();
    power.sqrt() / mag[fundamental]
}

/// Signal-to-noise ratio in dB of the selected bins against all other bins
///
/// Negative entries in `bins` are ignored, as are duplicates.
pub fn snr(mag: &[f32], bins: &[i16]) -> f32 {
    let mut signal = 0.0f32;
    for (i, &b) in bins.iter().enumerate() {
        if b < 0 || (b as usize) >= mag.len() || bins[..i].contains(&b) {
            continue;
        }
        signal += mag[b as usize] * mag[b as usize];
    }
    let total: f32 = mag.iter().map(|m| m * m).sum();
    let noise = total - signal;
    if noise <= 0.0 || signal <= 0.0 {
        return ZERO_DIV_FLAG_F32;
    }
    10.0 * (signal / noise).log10()
}

/// Mean distance in bins between neighbouring peaks
pub fn peaks_mean_distance(peaks: &[i16]) -> f32 {
    match peak_span(peaks) {
        Some((count, lo, hi)) if count > 1 => (hi - lo) as f32 / (count - 1) as f32,
        _ => 0.0,
    }
}

/// Magnitude of each dominant peak, 0 for unfilled slots
pub fn peak_amplitudes(mag: &[f32], peaks: &[i16], out: &mut [f32]) {
    for (slot, &p) in out.iter_mut().zip(peaks) {
        *slot = if p >= 0 && (p as usize) < mag.len() {
            mag[p as usize]
        } else {
            0.0
        };
    }
}

// Fixed-point spectral measures over Q15 magnitude spectra
//
// Scale of each result:
//   bins (rounded): centroid, spread, peaks mean distance
//   x1000: crest, energy ratio, THD
//   x100 dB: SNR
//   magnitude units: RMS

use super::{peak_span, SpectralContext};
use crate::dsp::{isqrt, DECIBEL_TO_INT_FACTOR, PERCENTAGE_TO_INT_FACTOR, ZERO_DIV_FLAG};
use std::ops::Range;

fn wide(m: i16) -> i64 {
    m as i64
}

/// Sum of magnitudes, cached in the context
pub fn magnitude_sum(mag: &[i16], ctx: &mut SpectralContext<i64>) -> i64 {
    if let Some(s) = ctx.magnitude_sum {
        return s;
    }
    let s = mag.iter().copied().map(wide).sum::<i64>();
    ctx.magnitude_sum = Some(s);
    s
}

/// Centroid in thousandths of a bin, cached in the context
fn centroid_milli(mag: &[i16], ctx: &mut SpectralContext<i64>) -> i64 {
    if let Some(c) = ctx.centroid {
        return c;
    }
    let total = magnitude_sum(mag, ctx);
    let c = if total == 0 {
        ZERO_DIV_FLAG
    } else {
        let weighted: i64 = mag
            .iter()
            .enumerate()
            .map(|(k, &m)| k as i64 * wide(m))
            .sum();
        weighted * PERCENTAGE_TO_INT_FACTOR / total
    };
    ctx.centroid = Some(c);
    c
}

/// Magnitude-weighted mean bin, rounded
pub fn centroid(mag: &[i16], ctx: &mut SpectralContext<i64>) -> i64 {
    let milli = centroid_milli(mag, ctx);
    (milli + PERCENTAGE_TO_INT_FACTOR / 2) / PERCENTAGE_TO_INT_FACTOR
}

/// Spread of the bin index around the centroid, rounded bins
pub fn spread(mag: &[i16], ctx: &mut SpectralContext<i64>) -> i64 {
    let total = magnitude_sum(mag, ctx);
    if total == 0 {
        return ZERO_DIV_FLAG;
    }
    let c = centroid_milli(mag, ctx) as i128;
    let scale = PERCENTAGE_TO_INT_FACTOR as i128;
    let acc: i128 = mag
        .iter()
        .enumerate()
        .map(|(k, &m)| {
            let d = k as i128 * scale - c;
            d * d * m as i128
        })
        .sum();
    let var_milli2 = acc / total as i128;
    let root_milli = isqrt(var_milli2.max(0) as u128) as i64;
    (root_milli + PERCENTAGE_TO_INT_FACTOR / 2) / PERCENTAGE_TO_INT_FACTOR
}

/// Peak magnitude over mean magnitude, x1000
pub fn crest(mag: &[i16], ctx: &mut SpectralContext<i64>) -> i64 {
    if mag.is_empty() {
        return 0;
    }
    let total = magnitude_sum(mag, ctx);
    if total == 0 {
        return ZERO_DIV_FLAG;
    }
    let peak = mag.iter().copied().map(wide).max().unwrap_or(0);
    peak * mag.len() as i64 * PERCENTAGE_TO_INT_FACTOR / total
}

/// Root mean square of the magnitudes
pub fn rms(mag: &[i16]) -> i64 {
    if mag.is_empty() {
        return 0;
    }
    let power: i64 = mag.iter().map(|&m| wide(m) * wide(m)).sum();
    isqrt((power / mag.len() as i64) as u128) as i64
}

/// Energy in a bin range, clamped to the spectrum
pub fn band_energy(mag: &[i16], band: Range<usize>) -> i64 {
    let end = band.end.min(mag.len());
    let start = band.start.min(end);
    mag[start..end].iter().map(|&m| wide(m) * wide(m)).sum()
}

/// Ratio of the energies of two bands, x1000
pub fn energy_ratio(mag: &[i16], numerator: Range<usize>, denominator: Range<usize>) -> i64 {
    let den = band_energy(mag, denominator);
    if den == 0 {
        return ZERO_DIV_FLAG;
    }
    band_energy(mag, numerator) * PERCENTAGE_TO_INT_FACTOR / den
}

/// Total harmonic distortion relative to the fundamental, x1000
pub fn thd(mag: &[i16], fundamental: usize, harmonics: usize) -> i64 {
    if fundamental == 0 || fundamental >= mag.len() || mag[fundamental] <= 0 {
        return ZERO_DIV_FLAG;
    }
    let power: i64 = (2..=harmonics + 1)
        .map(|h| h * fundamental)
        .take_while(|&bin| bin < mag.len())
        .map(|bin| wide(mag[bin]) * wide(mag[bin]))
        .sum();
    let scale = PERCENTAGE_TO_INT_FACTOR as u128;
    isqrt(power as u128 * scale * scale) as i64 / wide(mag[fundamental])
}

/// Signal-to-noise ratio of the selected bins, x100 dB
pub fn snr(mag: &[i16], bins: &[i16]) -> i64 {
    let mut signal = 0i64;
    for (i, &b) in bins.iter().enumerate() {
        if b < 0 || (b as usize) >= mag.len() || bins[..i].contains(&b) {
            continue;
        }
        signal += wide(mag[b as usize]) * wide(mag[b as usize]);
    }
    let total: i64 = mag.iter().map(|&m| wide(m) * wide(m)).sum();
    let noise = total - signal;
    if noise <= 0 || signal <= 0 {
        return ZERO_DIV_FLAG;
    }
    let db = 10.0 * (signal as f64 / noise as f64).log10();
    (db * DECIBEL_TO_INT_FACTOR as f64).round() as i64
}

/// Mean distance in bins between neighbouring peaks, rounded
pub fn peaks_mean_distance(peaks: &[i16]) -> i64 {
    match peak_span(peaks) {
        Some((count, lo, hi)) if count > 1 => {
            let gaps = count as i64 - 1;
            ((hi - lo) as i64 + gaps / 2) / gaps
        }
        _ => 0,
    }
}

/// Magnitude of each dominant peak, 0 for unfilled slots
pub fn peak_amplitudes(mag: &[i16], peaks: &[i16], out: &mut [i64]) {
    for (slot, &p) in out.iter_mut().zip(peaks) {
        *slot = if p >= 0 && (p as usize) < mag.len() {
            wide(mag[p as usize])
        } else {
            0
        };
    }
}

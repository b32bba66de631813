// Float statistics - f32 samples, f32 accumulators
//
// Accumulation happens in f32, so results for signals with a very small
// spread (below ~1e-4 relative to the mean) lose precision.

use super::{Hjorth, LinearFit, PeakToPeak, StatContext};
use crate::dsp::{Strided, ZERO_DIV_FLAG_F32};

/// Minimum and maximum of the signal, `(0, 0)` when empty
pub fn min_max(x: Strided<'_, f32>) -> (f32, f32) {
    let mut iter = x.iter();
    let first = match iter.next() {
        Some(v) => v,
        None => return (0.0, 0.0),
    };
    iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

pub fn min(x: Strided<'_, f32>) -> f32 {
    min_max(x).0
}

pub fn max(x: Strided<'_, f32>) -> f32 {
    min_max(x).1
}

/// Difference between maximum and minimum
pub fn range(x: Strided<'_, f32>) -> f32 {
    let (lo, hi) = min_max(x);
    hi - lo
}

/// Sum of all samples, cached in the context
pub fn sum(x: Strided<'_, f32>, ctx: &mut StatContext<f32>) -> f32 {
    if let Some(s) = ctx.sum {
        return s;
    }
    let s = x.iter().sum::<f32>();
    ctx.sum = Some(s);
    s
}

pub fn mean(x: Strided<'_, f32>, ctx: &mut StatContext<f32>) -> f32 {
    if x.is_empty() {
        return 0.0;
    }
    sum(x, ctx) / x.len() as f32
}

/// Population variance, cached in the context
pub fn variance(x: Strided<'_, f32>, ctx: &mut StatContext<f32>) -> f32 {
    if x.is_empty() {
        return 0.0;
    }
    if let Some(v) = ctx.var {
        return v;
    }
    let m = mean(x, ctx);
    let v = x.iter().map(|s| (s - m) * (s - m)).sum::<f32>() / x.len() as f32;
    ctx.var = Some(v);
    v
}

pub fn std_dev(x: Strided<'_, f32>, ctx: &mut StatContext<f32>) -> f32 {
    variance(x, ctx).sqrt()
}

/// Mean absolute deviation around the mean
pub fn mad(x: Strided<'_, f32>, ctx: &mut StatContext<f32>) -> f32 {
    if x.is_empty() {
        return 0.0;
    }
    let m = mean(x, ctx);
    x.iter().map(|s| (s - m).abs()).sum::<f32>() / x.len() as f32
}

/// Standardised central moment of the given order
fn standard_moment(x: Strided<'_, f32>, ctx: &mut StatContext<f32>, order: i32) -> f32 {
    if x.is_empty() {
        return 0.0;
    }
    let var = variance(x, ctx);
    if var == 0.0 {
        return ZERO_DIV_FLAG_F32;
    }
    let m = mean(x, ctx);
    let moment = x.iter().map(|s| (s - m).powi(order)).sum::<f32>() / x.len() as f32;
    moment / var.sqrt().powi(order)
}

/// Skewness (third standardised moment)
pub fn skewness(x: Strided<'_, f32>, ctx: &mut StatContext<f32>) -> f32 {
    standard_moment(x, ctx, 3)
}

/// Kurtosis (fourth standardised moment, not excess)
pub fn kurtosis(x: Strided<'_, f32>, ctx: &mut StatContext<f32>) -> f32 {
    standard_moment(x, ctx, 4)
}

/// Root mean square
pub fn rms(x: Strided<'_, f32>) -> f32 {
    if x.is_empty() {
        return 0.0;
    }
    (x.iter().map(|s| s * s).sum::<f32>() / x.len() as f32).sqrt()
}

/// Mean of absolute values
pub fn abs_mean(x: Strided<'_, f32>) -> f32 {
    if x.is_empty() {
        return 0.0;
    }
    x.iter().map(f32::abs).sum::<f32>() / x.len() as f32
}

/// Rate at which the signal crosses `level`
///
/// A crossing is counted whenever consecutive samples fall on different sides
/// of the level (`>= level` counts as above). Normalised by `len - 1`.
pub fn crossing_rate(x: Strided<'_, f32>, level: f32) -> f32 {
    if x.len() < 2 {
        return 0.0;
    }
    let mut crossings = 0usize;
    let mut prev_above = x.get(0) >= level;
    for s in x.iter().skip(1) {
        let above = s >= level;
        if above != prev_above {
            crossings += 1;
        }
        prev_above = above;
    }
    crossings as f32 / (x.len() - 1) as f32
}

/// Mean-crossing rate
pub fn mcr(x: Strided<'_, f32>, ctx: &mut StatContext<f32>) -> f32 {
    let m = mean(x, ctx);
    crossing_rate(x, m)
}

/// Zero-crossing rate
pub fn zcr(x: Strided<'_, f32>) -> f32 {
    crossing_rate(x, 0.0)
}

/// Threshold-crossing rate
pub fn tcr(x: Strided<'_, f32>, threshold: f32) -> f32 {
    crossing_rate(x, threshold)
}

/// Rate of crossings of `mean + sigma_factor * std`
pub fn positive_sigma_crossing_rate(
    x: Strided<'_, f32>,
    ctx: &mut StatContext<f32>,
    sigma_factor: f32,
) -> f32 {
    let level = mean(x, ctx) + sigma_factor * std_dev(x, ctx);
    crossing_rate(x, level)
}

/// Rate of crossings of `mean - sigma_factor * std`
pub fn negative_sigma_crossing_rate(
    x: Strided<'_, f32>,
    ctx: &mut StatContext<f32>,
    sigma_factor: f32,
) -> f32 {
    let level = mean(x, ctx) - sigma_factor * std_dev(x, ctx);
    crossing_rate(x, level)
}

fn fraction_where(x: Strided<'_, f32>, pred: impl Fn(f32) -> bool) -> f32 {
    if x.is_empty() {
        return 0.0;
    }
    x.iter().filter(|&s| pred(s)).count() as f32 / x.len() as f32
}

/// Fraction of samples above zero
pub fn psoz(x: Strided<'_, f32>) -> f32 {
    fraction_where(x, |s| s > 0.0)
}

/// Fraction of samples above the mean
pub fn psom(x: Strided<'_, f32>, ctx: &mut StatContext<f32>) -> f32 {
    let m = mean(x, ctx);
    fraction_where(x, |s| s > m)
}

/// Fraction of samples further than `sigma_factor * std` from the mean
pub fn psos(x: Strided<'_, f32>, ctx: &mut StatContext<f32>, sigma_factor: f32) -> f32 {
    let m = mean(x, ctx);
    let limit = sigma_factor * std_dev(x, ctx);
    fraction_where(x, |s| (s - m).abs() > limit)
}

/// Fraction of samples above `threshold`
pub fn psot(x: Strided<'_, f32>, threshold: f32) -> f32 {
    fraction_where(x, |s| s > threshold)
}

/// Crest factor: peak absolute value over RMS
pub fn crest_factor(x: Strided<'_, f32>) -> f32 {
    let r = rms(x);
    if r == 0.0 {
        return ZERO_DIV_FLAG_F32;
    }
    x.iter().map(f32::abs).fold(0.0, f32::max) / r
}

/// Average magnitude difference between consecutive samples
pub fn amdf(x: Strided<'_, f32>) -> f32 {
    if x.len() < 2 {
        return 0.0;
    }
    let total: f32 = (1..x.len()).map(|i| (x.get(i) - x.get(i - 1)).abs()).sum();
    total / (x.len() - 1) as f32
}

/// Root mean square of consecutive differences
pub fn rmds(x: Strided<'_, f32>) -> f32 {
    if x.len() < 2 {
        return 0.0;
    }
    let total: f32 = (1..x.len())
        .map(|i| {
            let d = x.get(i) - x.get(i - 1);
            d * d
        })
        .sum();
    (total / (x.len() - 1) as f32).sqrt()
}

/// Normalised autocorrelation at `lag`, in `[-1, 1]`
///
/// Returns 0 when the lag is not shorter than the signal or the signal is
/// constant.
pub fn autocorrelation(x: Strided<'_, f32>, ctx: &mut StatContext<f32>, lag: usize) -> f32 {
    let n = x.len();
    if n == 0 || lag >= n {
        return 0.0;
    }
    let var = variance(x, ctx);
    if var == 0.0 {
        return ZERO_DIV_FLAG_F32;
    }
    let m = mean(x, ctx);
    let acc: f32 = (0..n - lag)
        .map(|i| (x.get(i) - m) * (x.get(i + lag) - m))
        .sum();
    acc / (n as f32 * var)
}

/// Variance of the first (`order == 1`) or second (`order == 2`) difference
pub fn derivative_variance(x: Strided<'_, f32>, order: usize) -> f32 {
    let order = order.clamp(1, 2);
    let diff = |i: usize| -> f32 {
        match order {
            1 => x.get(i + 1) - x.get(i),
            _ => x.get(i + 2) - 2.0 * x.get(i + 1) + x.get(i),
        }
    };
    if x.len() <= order {
        return 0.0;
    }
    let count = x.len() - order;
    let m = (0..count).map(diff).sum::<f32>() / count as f32;
    (0..count)
        .map(|i| {
            let d = diff(i) - m;
            d * d
        })
        .sum::<f32>()
        / count as f32
}

/// Hjorth activity, mobility and complexity
pub fn hjorth(x: Strided<'_, f32>, ctx: &mut StatContext<f32>) -> Hjorth<f32> {
    let activity = variance(x, ctx);
    let var_d1 = derivative_variance(x, 1);
    let var_d2 = derivative_variance(x, 2);

    let mobility = if activity == 0.0 {
        ZERO_DIV_FLAG_F32
    } else {
        (var_d1 / activity).sqrt()
    };
    let mobility_d1 = if var_d1 == 0.0 {
        ZERO_DIV_FLAG_F32
    } else {
        (var_d2 / var_d1).sqrt()
    };
    let complexity = if mobility == 0.0 {
        ZERO_DIV_FLAG_F32
    } else {
        mobility_d1 / mobility
    };

    Hjorth {
        activity,
        mobility,
        complexity,
    }
}

/// Least-squares slope and intercept of the signal against sample index
pub fn linear_regression(x: Strided<'_, f32>, ctx: &mut StatContext<f32>) -> LinearFit<f32> {
    let n = x.len();
    if n == 0 {
        return LinearFit::default();
    }
    let sum_y = sum(x, ctx);
    if n == 1 {
        return LinearFit {
            slope: 0.0,
            intercept: sum_y,
        };
    }
    let nf = n as f32;
    let sum_i = nf * (nf - 1.0) / 2.0;
    let sum_ii = (nf - 1.0) * nf * (2.0 * nf - 1.0) / 6.0;
    let sum_iy: f32 = x.iter().enumerate().map(|(i, y)| i as f32 * y).sum();

    let denom = nf * sum_ii - sum_i * sum_i;
    let slope = if denom == 0.0 {
        ZERO_DIV_FLAG_F32
    } else {
        (nf * sum_iy - sum_i * sum_y) / denom
    };
    LinearFit {
        slope,
        intercept: (sum_y - slope * sum_i) / nf,
    }
}

/// Peak-to-peak amplitude of the low/high-frequency split
///
/// The low-frequency component is a causal moving average over `span`
/// samples (fewer at the start of the signal); the high-frequency component
/// is the residual.
pub fn peak_to_peak(x: Strided<'_, f32>, span: usize) -> PeakToPeak<f32> {
    if x.is_empty() {
        return PeakToPeak::default();
    }
    let span = span.max(1);
    let mut running = 0.0f32;
    let (mut lo_min, mut lo_max) = (f32::MAX, f32::MIN);
    let (mut hi_min, mut hi_max) = (f32::MAX, f32::MIN);

    for i in 0..x.len() {
        let s = x.get(i);
        running += s;
        if i >= span {
            running -= x.get(i - span);
        }
        let low = running / (i + 1).min(span) as f32;
        let high = s - low;
        lo_min = lo_min.min(low);
        lo_max = lo_max.max(low);
        hi_min = hi_min.min(high);
        hi_max = hi_max.max(high);
    }

    PeakToPeak {
        low: lo_max - lo_min,
        high: hi_max - hi_min,
    }
}

// Fixed-point statistics - i8/i16 samples, integer accumulators
//
// Sums are accumulated in i64 (i128 where products of centred values are
// involved) and results are saturated into the sample's feature type.
//
// Scale of each result:
//   x1000 (PERCENTAGE_TO_INT_FACTOR): rates, fractions, skewness, kurtosis,
//     crest factor, autocorrelation, Hjorth mobility/complexity, regression slope
//   input units (truncated): min, max, range, mean, MAD, std, RMS, abs mean,
//     AMDF, RMDS, regression intercept (rounded), peak-to-peak
//   squared input units: variance, Hjorth activity
//
// Ratios that need a square root of a ratio are finalised in f64 from exact
// integer moments and rounded.

use super::{Hjorth, LinearFit, PeakToPeak, StatContext};
use crate::dsp::{isqrt, FixedSample, Strided, PERCENTAGE_TO_INT_FACTOR, ZERO_DIV_FLAG};

const SCALE: i64 = PERCENTAGE_TO_INT_FACTOR;

fn wide<T: FixedSample>(v: T) -> i64 {
    v.into()
}

fn scaled_ratio<T: FixedSample>(value: f64) -> T::Feature {
    T::saturate_feature((value * SCALE as f64).round() as i64)
}

/// Minimum and maximum of the signal, `(0, 0)` when empty
pub fn min_max<T: FixedSample>(x: Strided<'_, T>) -> (T::Feature, T::Feature) {
    let mut iter = x.iter().map(wide);
    let first = match iter.next() {
        Some(v) => v,
        None => return (T::Feature::default(), T::Feature::default()),
    };
    let (lo, hi) = iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
    (T::saturate_feature(lo), T::saturate_feature(hi))
}

pub fn min<T: FixedSample>(x: Strided<'_, T>) -> T::Feature {
    min_max(x).0
}

pub fn max<T: FixedSample>(x: Strided<'_, T>) -> T::Feature {
    min_max(x).1
}

pub fn range<T: FixedSample>(x: Strided<'_, T>) -> T::Feature {
    let mut iter = x.iter().map(wide);
    let first = match iter.next() {
        Some(v) => v,
        None => return T::Feature::default(),
    };
    let (lo, hi) = iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
    T::saturate_feature(hi - lo)
}

/// Sum of all samples, cached in the context
pub fn sum<T: FixedSample>(x: Strided<'_, T>, ctx: &mut StatContext<i64>) -> i64 {
    if let Some(s) = ctx.sum {
        return s;
    }
    let s = x.iter().map(wide).sum::<i64>();
    ctx.sum = Some(s);
    s
}

/// Mean, truncated toward zero
pub fn mean<T: FixedSample>(x: Strided<'_, T>, ctx: &mut StatContext<i64>) -> T::Feature {
    if x.is_empty() {
        return T::Feature::default();
    }
    T::saturate_feature(sum(x, ctx) / x.len() as i64)
}

/// Sum of squared centred values scaled by `n`: `sum((n*x - S)^2)`
fn centred_square_sum<T: FixedSample>(x: Strided<'_, T>, s: i64) -> i128 {
    let n = x.len() as i128;
    x.iter()
        .map(|v| {
            let d = n * wide(v) as i128 - s as i128;
            d * d
        })
        .sum()
}

/// `sum((n*x - S)^2)` rebuilt from the cached variance when the context
/// holds one; otherwise computed and its variance cached
fn second_moment<T: FixedSample>(x: Strided<'_, T>, s: i64, ctx: &mut StatContext<i64>) -> i128 {
    let n = x.len() as i128;
    if let Some(v) = ctx.var {
        return v as i128 * n * n * n;
    }
    let m2 = centred_square_sum(x, s);
    ctx.var = Some((m2 / (n * n * n)) as i64);
    m2
}

/// Population variance in squared input units, cached in the context
pub fn variance<T: FixedSample>(x: Strided<'_, T>, ctx: &mut StatContext<i64>) -> T::Feature {
    T::saturate_feature(variance_raw(x, ctx))
}

fn variance_raw<T: FixedSample>(x: Strided<'_, T>, ctx: &mut StatContext<i64>) -> i64 {
    if x.is_empty() {
        return 0;
    }
    if let Some(v) = ctx.var {
        return v;
    }
    let n = x.len() as i128;
    let s = sum(x, ctx);
    let tss: i128 = x.iter().map(|v| (wide(v) as i128) * (wide(v) as i128)).sum();
    let v = ((n * tss - (s as i128) * (s as i128)) / (n * n)) as i64;
    ctx.var = Some(v);
    v
}

/// Exact population variance as f64
fn variance_exact<T: FixedSample>(x: Strided<'_, T>, ctx: &mut StatContext<i64>) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    let n = x.len() as f64;
    let s = sum(x, ctx);
    centred_square_sum(x, s) as f64 / (n * n * n)
}

/// Standard deviation in input units (floor of the root of the variance)
pub fn std_dev<T: FixedSample>(x: Strided<'_, T>, ctx: &mut StatContext<i64>) -> T::Feature {
    let v = variance_raw(x, ctx).max(0) as u128;
    T::saturate_feature(isqrt(v) as i64)
}

/// Mean absolute deviation around the mean, input units
pub fn mad<T: FixedSample>(x: Strided<'_, T>, ctx: &mut StatContext<i64>) -> T::Feature {
    if x.is_empty() {
        return T::Feature::default();
    }
    let n = x.len() as i128;
    let s = sum(x, ctx) as i128;
    let total: i128 = x.iter().map(|v| (n * wide(v) as i128 - s).abs()).sum();
    T::saturate_feature((total / (n * n)) as i64)
}

/// Skewness x1000
pub fn skewness<T: FixedSample>(x: Strided<'_, T>, ctx: &mut StatContext<i64>) -> T::Feature {
    if x.is_empty() {
        return T::Feature::default();
    }
    let n = x.len() as i64;
    let s = sum(x, ctx);
    let m2 = second_moment(x, s, ctx);
    if m2 == 0 {
        return T::saturate_feature(ZERO_DIV_FLAG);
    }
    let m3: f64 = x
        .iter()
        .map(|v| {
            let d = (n * wide(v) - s) as f64;
            d * d * d
        })
        .sum();
    scaled_ratio::<T>(m3 * (n as f64).sqrt() / (m2 as f64).powf(1.5))
}

/// Kurtosis (not excess) x1000
pub fn kurtosis<T: FixedSample>(x: Strided<'_, T>, ctx: &mut StatContext<i64>) -> T::Feature {
    if x.is_empty() {
        return T::Feature::default();
    }
    let n = x.len() as i64;
    let s = sum(x, ctx);
    let m2 = second_moment(x, s, ctx);
    if m2 == 0 {
        return T::saturate_feature(ZERO_DIV_FLAG);
    }
    let m4: f64 = x
        .iter()
        .map(|v| {
            let d = (n * wide(v) - s) as f64;
            (d * d) * (d * d)
        })
        .sum();
    let m2 = m2 as f64;
    scaled_ratio::<T>(m4 * n as f64 / (m2 * m2))
}

/// Root mean square, input units
pub fn rms<T: FixedSample>(x: Strided<'_, T>) -> T::Feature {
    if x.is_empty() {
        return T::Feature::default();
    }
    let tss: i128 = x.iter().map(|v| (wide(v) as i128).pow(2)).sum();
    T::saturate_feature(isqrt((tss / x.len() as i128) as u128) as i64)
}

/// Mean of absolute values, input units
pub fn abs_mean<T: FixedSample>(x: Strided<'_, T>) -> T::Feature {
    if x.is_empty() {
        return T::Feature::default();
    }
    let total: i64 = x.iter().map(|v| wide(v).abs()).sum();
    T::saturate_feature(total / x.len() as i64)
}

/// Crossing rate x1000 for an arbitrary "above" predicate
fn crossing_rate_by<T: FixedSample>(x: Strided<'_, T>, above: impl Fn(i64) -> bool) -> T::Feature {
    if x.len() < 2 {
        return T::Feature::default();
    }
    let mut crossings = 0i64;
    let mut prev = above(wide(x.get(0)));
    for v in x.iter().skip(1) {
        let cur = above(wide(v));
        if cur != prev {
            crossings += 1;
        }
        prev = cur;
    }
    T::saturate_feature(crossings * SCALE / (x.len() as i64 - 1))
}

/// Mean-crossing rate x1000
pub fn mcr<T: FixedSample>(x: Strided<'_, T>, ctx: &mut StatContext<i64>) -> T::Feature {
    let n = x.len() as i64;
    let s = sum(x, ctx);
    crossing_rate_by(x, |v| v * n >= s)
}

/// Zero-crossing rate x1000
pub fn zcr<T: FixedSample>(x: Strided<'_, T>) -> T::Feature {
    crossing_rate_by(x, |v| v >= 0)
}

/// Threshold-crossing rate x1000
pub fn tcr<T: FixedSample>(x: Strided<'_, T>, threshold: T) -> T::Feature {
    let level = wide(threshold);
    crossing_rate_by(x, |v| v >= level)
}

fn sigma_level<T: FixedSample>(x: Strided<'_, T>, ctx: &mut StatContext<i64>, offset: f64) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    let mean = sum(x, ctx) as f64 / x.len() as f64;
    mean + offset * variance_exact(x, ctx).sqrt()
}

/// Rate of crossings of `mean + sigma_factor * std`, x1000
pub fn positive_sigma_crossing_rate<T: FixedSample>(
    x: Strided<'_, T>,
    ctx: &mut StatContext<i64>,
    sigma_factor: f32,
) -> T::Feature {
    let level = sigma_level(x, ctx, sigma_factor as f64);
    crossing_rate_by(x, |v| v as f64 >= level)
}

/// Rate of crossings of `mean - sigma_factor * std`, x1000
pub fn negative_sigma_crossing_rate<T: FixedSample>(
    x: Strided<'_, T>,
    ctx: &mut StatContext<i64>,
    sigma_factor: f32,
) -> T::Feature {
    let level = sigma_level(x, ctx, -(sigma_factor as f64));
    crossing_rate_by(x, |v| v as f64 >= level)
}

fn fraction_where<T: FixedSample>(x: Strided<'_, T>, pred: impl Fn(i64) -> bool) -> T::Feature {
    if x.is_empty() {
        return T::Feature::default();
    }
    let count = x.iter().map(wide).filter(|&v| pred(v)).count() as i64;
    T::saturate_feature(count * SCALE / x.len() as i64)
}

/// Fraction of samples above zero, x1000
pub fn psoz<T: FixedSample>(x: Strided<'_, T>) -> T::Feature {
    fraction_where(x, |v| v > 0)
}

/// Fraction of samples above the mean, x1000
pub fn psom<T: FixedSample>(x: Strided<'_, T>, ctx: &mut StatContext<i64>) -> T::Feature {
    let n = x.len() as i64;
    let s = sum(x, ctx);
    fraction_where(x, |v| v * n > s)
}

/// Fraction of samples further than `sigma_factor * std` from the mean, x1000
pub fn psos<T: FixedSample>(
    x: Strided<'_, T>,
    ctx: &mut StatContext<i64>,
    sigma_factor: f32,
) -> T::Feature {
    if x.is_empty() {
        return T::Feature::default();
    }
    let mean = sum(x, ctx) as f64 / x.len() as f64;
    let limit = sigma_factor as f64 * variance_exact(x, ctx).sqrt();
    fraction_where(x, |v| (v as f64 - mean).abs() > limit)
}

/// Fraction of samples above `threshold`, x1000
pub fn psot<T: FixedSample>(x: Strided<'_, T>, threshold: T) -> T::Feature {
    let level = wide(threshold);
    fraction_where(x, |v| v > level)
}

/// Crest factor (peak absolute value over RMS), x1000
pub fn crest_factor<T: FixedSample>(x: Strided<'_, T>) -> T::Feature {
    if x.is_empty() {
        return T::Feature::default();
    }
    let tss: i128 = x.iter().map(|v| (wide(v) as i128).pow(2)).sum();
    if tss == 0 {
        return T::saturate_feature(ZERO_DIV_FLAG);
    }
    let peak = x.iter().map(|v| wide(v).abs()).max().unwrap_or(0) as f64;
    let rms = (tss as f64 / x.len() as f64).sqrt();
    scaled_ratio::<T>(peak / rms)
}

/// Average magnitude difference between consecutive samples, input units
pub fn amdf<T: FixedSample>(x: Strided<'_, T>) -> T::Feature {
    if x.len() < 2 {
        return T::Feature::default();
    }
    let total: i64 = (1..x.len())
        .map(|i| (wide(x.get(i)) - wide(x.get(i - 1))).abs())
        .sum();
    T::saturate_feature(total / (x.len() as i64 - 1))
}

/// Root mean square of consecutive differences, input units
pub fn rmds<T: FixedSample>(x: Strided<'_, T>) -> T::Feature {
    if x.len() < 2 {
        return T::Feature::default();
    }
    let total: i128 = (1..x.len())
        .map(|i| ((wide(x.get(i)) - wide(x.get(i - 1))) as i128).pow(2))
        .sum();
    T::saturate_feature(isqrt((total / (x.len() as i128 - 1)) as u128) as i64)
}

/// Normalised autocorrelation at `lag`, x1000 in `[-1000, 1000]`
pub fn autocorrelation<T: FixedSample>(
    x: Strided<'_, T>,
    ctx: &mut StatContext<i64>,
    lag: usize,
) -> T::Feature {
    let n = x.len();
    if n == 0 || lag >= n {
        return T::Feature::default();
    }
    let s = sum(x, ctx) as i128;
    let nn = n as i128;
    let centred = |i: usize| nn * wide(x.get(i)) as i128 - s;
    let denom = centred_square_sum(x, s as i64);
    if denom == 0 {
        return T::saturate_feature(ZERO_DIV_FLAG);
    }
    let numer: i128 = (0..n - lag).map(|i| centred(i) * centred(i + lag)).sum();
    T::saturate_feature((numer * SCALE as i128 / denom) as i64)
}

/// Exact variance of the first or second difference as f64
fn derivative_variance_exact<T: FixedSample>(x: Strided<'_, T>, order: usize) -> f64 {
    let order = order.clamp(1, 2);
    if x.len() <= order {
        return 0.0;
    }
    let diff = |i: usize| -> i128 {
        let a = wide(x.get(i)) as i128;
        let b = wide(x.get(i + 1)) as i128;
        match order {
            1 => b - a,
            _ => wide(x.get(i + 2)) as i128 - 2 * b + a,
        }
    };
    let count = (x.len() - order) as i128;
    let s: i128 = (0..count as usize).map(diff).sum();
    let centred: f64 = (0..count as usize)
        .map(|i| {
            let d = (count * diff(i) - s) as f64;
            d * d
        })
        .sum();
    let c = count as f64;
    centred / (c * c * c)
}

/// Variance of the first or second difference, squared input units
pub fn derivative_variance<T: FixedSample>(x: Strided<'_, T>, order: usize) -> T::Feature {
    T::saturate_feature(derivative_variance_exact(x, order).trunc() as i64)
}

/// Hjorth parameters; mobility and complexity x1000
pub fn hjorth<T: FixedSample>(x: Strided<'_, T>, ctx: &mut StatContext<i64>) -> Hjorth<T::Feature> {
    let activity = variance(x, ctx);
    let var = variance_exact(x, ctx);
    let var_d1 = derivative_variance_exact(x, 1);
    let var_d2 = derivative_variance_exact(x, 2);

    let mobility = if var == 0.0 { 0.0 } else { (var_d1 / var).sqrt() };
    let mobility_d1 = if var_d1 == 0.0 {
        0.0
    } else {
        (var_d2 / var_d1).sqrt()
    };
    let complexity = if mobility == 0.0 {
        0.0
    } else {
        mobility_d1 / mobility
    };

    Hjorth {
        activity,
        mobility: scaled_ratio::<T>(mobility),
        complexity: scaled_ratio::<T>(complexity),
    }
}

/// Least-squares fit against sample index; slope x1000, intercept rounded
pub fn linear_regression<T: FixedSample>(
    x: Strided<'_, T>,
    ctx: &mut StatContext<i64>,
) -> LinearFit<T::Feature> {
    let n = x.len();
    if n == 0 {
        return LinearFit::default();
    }
    let sum_y = sum(x, ctx) as i128;
    if n == 1 {
        return LinearFit {
            slope: T::Feature::default(),
            intercept: T::saturate_feature(sum_y as i64),
        };
    }
    let nn = n as i128;
    let sum_i = nn * (nn - 1) / 2;
    let sum_ii = (nn - 1) * nn * (2 * nn - 1) / 6;
    let sum_iy: i128 = x
        .iter()
        .enumerate()
        .map(|(i, y)| i as i128 * wide(y) as i128)
        .sum();

    let denom = nn * sum_ii - sum_i * sum_i;
    let slope = if denom == 0 {
        0.0
    } else {
        (nn * sum_iy - sum_i * sum_y) as f64 / denom as f64
    };
    let intercept = (sum_y as f64 - slope * sum_i as f64) / nn as f64;

    LinearFit {
        slope: scaled_ratio::<T>(slope),
        intercept: T::saturate_feature(intercept.round() as i64),
    }
}

/// Peak-to-peak of the moving-average split, input units
///
/// The low-frequency component is a causal integer moving average over
/// `span` samples; the high-frequency component is the residual.
pub fn peak_to_peak<T: FixedSample>(x: Strided<'_, T>, span: usize) -> PeakToPeak<T::Feature> {
    if x.is_empty() {
        return PeakToPeak::default();
    }
    let span = span.max(1);
    let mut running = 0i64;
    let (mut lo_min, mut lo_max) = (i64::MAX, i64::MIN);
    let (mut hi_min, mut hi_max) = (i64::MAX, i64::MIN);

    for i in 0..x.len() {
        let s = wide(x.get(i));
        running += s;
        if i >= span {
            running -= wide(x.get(i - span));
        }
        let low = running / (i + 1).min(span) as i64;
        let high = s - low;
        lo_min = lo_min.min(low);
        lo_max = lo_max.max(low);
        hi_min = hi_min.min(high);
        hi_max = hi_max.max(high);
    }

    PeakToPeak {
        low: T::saturate_feature(lo_max - lo_min),
        high: T::saturate_feature(hi_max - hi_min),
    }
}

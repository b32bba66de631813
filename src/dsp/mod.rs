// DSP module - numeric kernels for feature extraction
//
// Statistics over strided sample views, FFTs and spectral measures in float
// and fixed-point flavours. Kernels never allocate and never fail: empty input
// yields 0 and divisions by zero yield `ZERO_DIV_FLAG`.

pub mod fft;
pub mod sample;
pub mod spectral;
pub mod stats;

pub use sample::{FeatureValue, FixedSample, Sample, SampleKind, Strided};
pub use stats::StatContext;

/// Scale factor applied to ratio-valued fixed-point results
pub const PERCENTAGE_TO_INT_FACTOR: i64 = 1000;

/// Scale factor applied to fixed-point decibel results
pub const DECIBEL_TO_INT_FACTOR: i64 = 100;

/// Value returned in place of a quotient whose divisor is zero
pub const ZERO_DIV_FLAG: i64 = 0;

/// Float counterpart of `ZERO_DIV_FLAG`
pub const ZERO_DIV_FLAG_F32: f32 = 0.0;

/// Integer square root (floor)
pub fn isqrt(value: u128) -> u128 {
    if value < 2 {
        return value;
    }
    // Newton iteration from an over-estimate converges monotonically
    let mut x = 1u128 << ((128 - value.leading_zeros()).div_ceil(2));
    loop {
        let y = (x + value / x) / 2;
        if y >= x {
            return x;
        }
        x = y;
    }
}

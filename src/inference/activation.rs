//! Activation functions for the three model precisions
//!
//! The quantised sigmoid is a table lookup over a clamped input range of
//! ±8, where the sigmoid is within 1/3000 of its asymptotes:
//! - Q8: 256 entries indexed by the pre-activation in Q4 (1/16 steps)
//! - Q16: 4096 entries indexed by the pre-activation in Q8 (1/256 steps)
//!
//! Tables are built once on first use and shared read-only afterwards.

use once_cell::sync::Lazy;

/// Q4 pre-activation range of the Q8 table
pub const Q8_SIGMOID_MIN: i32 = -128;
pub const Q8_SIGMOID_MAX: i32 = 127;

/// Q8 pre-activation range of the Q16 table
pub const Q16_SIGMOID_MIN: i32 = -2048;
pub const Q16_SIGMOID_MAX: i32 = 2047;

static SIGMOID_Q8: Lazy<Vec<u8>> = Lazy::new(|| {
    (Q8_SIGMOID_MIN..=Q8_SIGMOID_MAX)
        .map(|z| (sigmoid(z as f32 / 16.0) * 255.0).round() as u8)
        .collect()
});

static SIGMOID_Q16: Lazy<Vec<u16>> = Lazy::new(|| {
    (Q16_SIGMOID_MIN..=Q16_SIGMOID_MAX)
        .map(|z| (sigmoid(z as f32 / 256.0) * 65535.0).round() as u16)
        .collect()
});

/// Logistic function
#[inline]
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Identity clamped to the unit interval
#[inline]
pub fn linear(x: f32) -> f32 {
    if x.is_nan() {
        return 0.0;
    }
    x.clamp(0.0, 1.0)
}

/// Quantised sigmoid for a Q4 pre-activation, result in 0..=255
#[inline]
pub fn sigmoid_q8(z_q4: i32) -> u8 {
    let index = z_q4.clamp(Q8_SIGMOID_MIN, Q8_SIGMOID_MAX) - Q8_SIGMOID_MIN;
    SIGMOID_Q8[index as usize]
}

/// Quantised sigmoid for a Q8 pre-activation, result in 0..=65535
#[inline]
pub fn sigmoid_q16(z_q8: i32) -> u16 {
    let index = z_q8.clamp(Q16_SIGMOID_MIN, Q16_SIGMOID_MAX) - Q16_SIGMOID_MIN;
    SIGMOID_Q16[index as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_centered_at_half() {
        assert_eq!(sigmoid_q8(0), 128);
        assert_eq!(sigmoid_q16(0), 32768);
        assert_eq!(SIGMOID_Q8.len(), 256);
        assert_eq!(SIGMOID_Q16.len(), 4096);
    }

    #[test]
    fn test_tables_saturate_outside_range() {
        assert_eq!(sigmoid_q8(-10_000), sigmoid_q8(Q8_SIGMOID_MIN));
        assert_eq!(sigmoid_q8(10_000), 255);
        assert_eq!(sigmoid_q16(i32::MIN), sigmoid_q16(Q16_SIGMOID_MIN));
        assert!(sigmoid_q16(Q16_SIGMOID_MAX) > 65500);
    }

    #[test]
    fn test_tables_monotonic() {
        assert!(SIGMOID_Q8.windows(2).all(|w| w[0] <= w[1]));
        assert!(SIGMOID_Q16.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_float_activations() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert_eq!(linear(-0.5), 0.0);
        assert_eq!(linear(0.25), 0.25);
        assert_eq!(linear(3.0), 1.0);
        assert_eq!(linear(f32::NAN), 0.0);
    }
}

// Precision - neuron value domains of the three model precisions
//
// Every neuron value lives in the unit interval:
//   Q8  -> u8,  0..=255   represents 0.0..=1.0
//   Q16 -> u16, 0..=65535 represents 0.0..=1.0
//   F32 -> f32, 0.0..=1.0

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Model arithmetic precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    Q8,
    Q16,
    F32,
}

/// Value in the unit-interval domain of one precision
pub trait Quantum: Copy + Default + Debug + PartialEq + PartialOrd + Send + Sync + 'static {
    const PRECISION: Precision;

    /// Integer divisor that maps the raw value to `[0, 1]` (1 for float)
    const UNIT: f64;

    /// Quantise a ratio in `[0, 1]`; values outside are clamped
    fn from_unit(ratio: f64) -> Self;

    /// Dequantise to `[0, 1]`
    fn to_unit(self) -> f32;
}

impl Quantum for u8 {
    const PRECISION: Precision = Precision::Q8;
    const UNIT: f64 = 255.0;

    fn from_unit(ratio: f64) -> Self {
        (ratio.clamp(0.0, 1.0) * Self::UNIT).round() as u8
    }

    fn to_unit(self) -> f32 {
        self as f32 / Self::UNIT as f32
    }
}

impl Quantum for u16 {
    const PRECISION: Precision = Precision::Q16;
    const UNIT: f64 = 65535.0;

    fn from_unit(ratio: f64) -> Self {
        (ratio.clamp(0.0, 1.0) * Self::UNIT).round() as u16
    }

    fn to_unit(self) -> f32 {
        self as f32 / Self::UNIT as f32
    }
}

impl Quantum for f32 {
    const PRECISION: Precision = Precision::F32;
    const UNIT: f64 = 1.0;

    fn from_unit(ratio: f64) -> Self {
        ratio.clamp(0.0, 1.0) as f32
    }

    fn to_unit(self) -> f32 {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantise_bounds() {
        assert_eq!(u8::from_unit(0.0), 0);
        assert_eq!(u8::from_unit(1.0), 255);
        assert_eq!(u8::from_unit(2.0), 255);
        assert_eq!(u8::from_unit(-1.0), 0);
        assert_eq!(u16::from_unit(0.5), 32768);
        assert_eq!(f32::from_unit(0.25), 0.25);
    }

    #[test]
    fn test_dequantise() {
        assert_eq!(255u8.to_unit(), 1.0);
        assert_eq!(0u16.to_unit(), 0.0);
        assert!((128u8.to_unit() - 0.50196).abs() < 1e-4);
    }
}

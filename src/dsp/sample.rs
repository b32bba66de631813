// Sample - input precisions and strided views shared by every kernel
//
// Three input precisions are supported: 8-bit and 16-bit fixed-point and
// 32-bit float. Each precision has a matching, wider feature type used to
// store extracted features without overflow:
//
//   i8  -> i16
//   i16 -> i32
//   f32 -> f32

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Input precision tag
///
/// The discriminant is the element size in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum SampleKind {
    I8 = 1,
    I16 = 2,
    F32 = 4,
}

impl SampleKind {
    /// Size of one element in bytes
    pub fn size_bytes(self) -> usize {
        self as usize
    }
}

/// Value type used to store extracted features
pub trait FeatureValue:
    Copy + Default + Debug + PartialEq + PartialOrd + Send + Sync + 'static
{
    fn to_f64(self) -> f64;

    /// Convert from float, rounding and saturating for integer types
    fn from_f64_saturating(value: f64) -> Self;
}

impl FeatureValue for i16 {
    fn to_f64(self) -> f64 {
        self as f64
    }

    fn from_f64_saturating(value: f64) -> Self {
        value.round() as i16
    }
}

impl FeatureValue for i32 {
    fn to_f64(self) -> f64 {
        self as f64
    }

    fn from_f64_saturating(value: f64) -> Self {
        value.round() as i32
    }
}

impl FeatureValue for f32 {
    fn to_f64(self) -> f64 {
        self as f64
    }

    fn from_f64_saturating(value: f64) -> Self {
        value as f32
    }
}

/// Raw input sample
pub trait Sample: Copy + Default + Debug + PartialEq + PartialOrd + Send + Sync + 'static {
    const KIND: SampleKind;

    /// Wider type extracted features are stored in
    type Feature: FeatureValue;

    fn to_f32(self) -> f32;

    fn to_f64(self) -> f64;

    /// Convert from float, rounding and saturating for integer types
    fn from_f32_saturating(value: f32) -> Self;
}

/// Fixed-point input sample
///
/// Fixed-point kernels accumulate in `i64` and saturate their result into
/// the feature type.
pub trait FixedSample: Sample + Into<i64> {
    fn saturate_feature(value: i64) -> Self::Feature;

    /// Convert to Q15 for the fixed-point FFT
    fn to_q15(self) -> i16;
}

impl Sample for i8 {
    const KIND: SampleKind = SampleKind::I8;
    type Feature = i16;

    fn to_f32(self) -> f32 {
        self as f32
    }

    fn to_f64(self) -> f64 {
        self as f64
    }

    fn from_f32_saturating(value: f32) -> Self {
        value.round() as i8
    }
}

impl FixedSample for i8 {
    fn saturate_feature(value: i64) -> i16 {
        value.clamp(i16::MIN as i64, i16::MAX as i64) as i16
    }

    fn to_q15(self) -> i16 {
        (self as i16) << 8
    }
}

impl Sample for i16 {
    const KIND: SampleKind = SampleKind::I16;
    type Feature = i32;

    fn to_f32(self) -> f32 {
        self as f32
    }

    fn to_f64(self) -> f64 {
        self as f64
    }

    fn from_f32_saturating(value: f32) -> Self {
        value.round() as i16
    }
}

impl FixedSample for i16 {
    fn saturate_feature(value: i64) -> i32 {
        value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
    }

    fn to_q15(self) -> i16 {
        self
    }
}

impl Sample for f32 {
    const KIND: SampleKind = SampleKind::F32;
    type Feature = f32;

    fn to_f32(self) -> f32 {
        self
    }

    fn to_f64(self) -> f64 {
        self as f64
    }

    fn from_f32_saturating(value: f32) -> Self {
        value
    }
}

/// Read-only view over every `stride`-th element of a slice
///
/// Element `i` is `data[i * stride]`. The element count is clamped to what
/// the slice can provide, so a view never reads out of bounds.
#[derive(Debug, Clone, Copy)]
pub struct Strided<'a, T> {
    data: &'a [T],
    num: usize,
    stride: usize,
}

impl<'a, T: Copy> Strided<'a, T> {
    /// Create a view of `num` elements spaced `stride` apart
    ///
    /// A stride of 0 is treated as 1.
    pub fn new(data: &'a [T], num: usize, stride: usize) -> Self {
        let stride = stride.max(1);
        let available = if data.is_empty() {
            0
        } else {
            (data.len() - 1) / stride + 1
        };
        Self {
            data,
            num: num.min(available),
            stride,
        }
    }

    /// View over every element of a slice
    pub fn contiguous(data: &'a [T]) -> Self {
        Self::new(data, data.len(), 1)
    }

    pub fn len(&self) -> usize {
        self.num
    }

    pub fn is_empty(&self) -> bool {
        self.num == 0
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Element `i` of the view
    ///
    /// # Panics
    /// Panics if `i >= len()`
    pub fn get(&self, i: usize) -> T {
        assert!(i < self.num, "strided index {} out of range {}", i, self.num);
        self.data[i * self.stride]
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + 'a {
        self.data.iter().step_by(self.stride).take(self.num).copied()
    }
}

impl<'a, T: Copy> From<&'a [T]> for Strided<'a, T> {
    fn from(data: &'a [T]) -> Self {
        Strided::contiguous(data)
    }
}

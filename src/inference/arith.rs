// Arith - per-precision neuron arithmetic
//
// Neuron values are unit-interval quanta (see `model::precision`). For an
// integer precision with unit U and weight scale W, the accumulator holds
// `sum(w * x)` so that the real pre-activation is `acc / (W * U)`:
//
//   Q8:  W = 16,   U = 255    -> acc / 4080,           i32 saturating
//   Q16: W = 4096, U = 65535  -> acc / 268_431_360,    i64 saturating
//
// The bias is multiplied by U, as if it were a weight on a constant 1.

use super::activation::{linear, sigmoid, sigmoid_q16, sigmoid_q8};
use crate::model::Quantum;
use std::fmt::Debug;

/// Arithmetic of one model precision
pub trait NeuronArith: Quantum {
    type Weight: Copy + Debug + Send + Sync + 'static;
    type Steepness: Copy + Debug + Send + Sync + 'static;
    type Acc: Copy + Debug;

    const ZERO: Self::Acc;

    /// Accumulate the bias weight
    fn bias(acc: Self::Acc, weight: Self::Weight) -> Self::Acc;

    /// Accumulate one weighted input
    fn mac(acc: Self::Acc, weight: Self::Weight, value: Self) -> Self::Acc;

    /// Apply the activation with its steepness
    fn activate(acc: Self::Acc, steepness: Self::Steepness, sigmoid: bool) -> Self;
}

const Q8_ACC_UNIT: i64 = 16 * 255;
const Q16_ACC_UNIT: i128 = 4096 * 65535;

impl NeuronArith for u8 {
    type Weight = i8;
    type Steepness = u8;
    type Acc = i32;

    const ZERO: i32 = 0;

    #[inline]
    fn bias(acc: i32, weight: i8) -> i32 {
        acc.saturating_add(weight as i32 * 255)
    }

    #[inline]
    fn mac(acc: i32, weight: i8, value: u8) -> i32 {
        acc.saturating_add(weight as i32 * value as i32)
    }

    fn activate(acc: i32, steepness: u8, use_sigmoid: bool) -> u8 {
        // a * z in Q4 is acc * a / 4080
        let scaled = acc as i64 * steepness as i64;
        if use_sigmoid {
            let z_q4 = (scaled / Q8_ACC_UNIT).clamp(i32::MIN as i64, i32::MAX as i64);
            sigmoid_q8(z_q4 as i32)
        } else {
            // (acc / 4080) * (a / 16) * 255 = acc * a / 256
            (scaled / 256).clamp(0, 255) as u8
        }
    }
}

impl NeuronArith for u16 {
    type Weight = i16;
    type Steepness = u16;
    type Acc = i64;

    const ZERO: i64 = 0;

    #[inline]
    fn bias(acc: i64, weight: i16) -> i64 {
        acc.saturating_add(weight as i64 * 65535)
    }

    #[inline]
    fn mac(acc: i64, weight: i16, value: u16) -> i64 {
        acc.saturating_add(weight as i64 * value as i64)
    }

    fn activate(acc: i64, steepness: u16, use_sigmoid: bool) -> u16 {
        let scaled = acc as i128 * steepness as i128;
        if use_sigmoid {
            // a * z in Q8 is acc * a / (4096 * 65535)
            let z_q8 = (scaled / Q16_ACC_UNIT).clamp(i32::MIN as i128, i32::MAX as i128);
            sigmoid_q16(z_q8 as i32)
        } else {
            // (acc / (4096 * 65535)) * (a / 256) * 65535 = acc * a / 2^20
            (scaled >> 20).clamp(0, 65535) as u16
        }
    }
}

impl NeuronArith for f32 {
    type Weight = f32;
    type Steepness = f32;
    type Acc = f32;

    const ZERO: f32 = 0.0;

    #[inline]
    fn bias(acc: f32, weight: f32) -> f32 {
        acc + weight
    }

    #[inline]
    fn mac(acc: f32, weight: f32, value: f32) -> f32 {
        acc + weight * value
    }

    fn activate(acc: f32, steepness: f32, use_sigmoid: bool) -> f32 {
        let x = steepness * acc;
        if use_sigmoid {
            sigmoid(x)
        } else {
            linear(x)
        }
    }
}

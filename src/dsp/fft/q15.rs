// Q15 fixed-point FFTs
//
// Radix-2 decimation in frequency. Every stage halves its butterfly outputs,
// so a complex transform of N points returns `DFT / N`. The real transform
// applies one more halving in its split step and returns `DFT / len`.

use super::tables::{cfft_twiddles_q15, is_power_of_two, reorder_table};
use super::{MAX_CFFT_LEN, MIN_CFFT_LEN};
use crate::dsp::isqrt;
use crate::error::{PipelineError, SetupError};
use rustfft::num_complex::Complex;

fn sat16(value: i32) -> i16 {
    value.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

/// Q15 complex multiply
fn mul_q15(a: Complex<i16>, w: Complex<i16>) -> Complex<i16> {
    let (ar, ai) = (a.re as i32, a.im as i32);
    let (wr, wi) = (w.re as i32, w.im as i32);
    Complex::new(sat16((ar * wr - ai * wi) >> 15), sat16((ar * wi + ai * wr) >> 15))
}

/// Halved sum and halved difference of two Q15 values
fn half_sum_diff(a: Complex<i16>, b: Complex<i16>) -> (Complex<i16>, Complex<i16>) {
    let (ar, ai, br, bi) = (a.re as i32, a.im as i32, b.re as i32, b.im as i32);
    (
        Complex::new(((ar + br) >> 1) as i16, ((ai + bi) >> 1) as i16),
        Complex::new(((ar - br) >> 1) as i16, ((ai - bi) >> 1) as i16),
    )
}

/// Q15 complex FFT of a fixed power-of-two length
#[derive(Debug, Clone)]
pub struct CfftQ15 {
    len: usize,
    twiddles: Vec<Complex<i16>>,
    reorder: Vec<[u16; 2]>,
}

impl CfftQ15 {
    /// # Errors
    /// `SetupError::FftLength` unless `len` is a power of two in
    /// `MIN_CFFT_LEN..=MAX_CFFT_LEN`
    pub fn new(len: usize) -> Result<Self, SetupError> {
        if !is_power_of_two(len) || !(MIN_CFFT_LEN..=MAX_CFFT_LEN).contains(&len) {
            return Err(SetupError::FftLength { len });
        }
        let radices = vec![2; len.trailing_zeros() as usize];
        Ok(Self {
            len,
            twiddles: cfft_twiddles_q15(len)?,
            reorder: reorder_table(&radices, len),
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Forward transform in place; output is scaled by `1 / len()`
    pub fn process(&self, data: &mut [Complex<i16>], reorder: bool) -> Result<(), PipelineError> {
        if data.len() != self.len {
            return Err(PipelineError::InvalidArgument {
                reason: format!("q15 cfft expects {} points, got {}", self.len, data.len()),
            });
        }

        let mut block = self.len;
        while block > 1 {
            let half = block / 2;
            let step = self.len / block;
            for base in (0..self.len).step_by(block) {
                for n in 0..half {
                    let (sum, diff) = half_sum_diff(data[base + n], data[base + n + half]);
                    data[base + n] = sum;
                    data[base + n + half] = mul_q15(diff, self.twiddles[n * step]);
                }
            }
            block = half;
        }

        if reorder {
            for &[a, b] in &self.reorder {
                data.swap(a as usize, b as usize);
            }
        }
        Ok(())
    }
}

/// Q15 real FFT built on a half-length `CfftQ15`
///
/// Packing matches the float `Rfft`: bin 0 carries DC in the real part and
/// Nyquist in the imaginary part.
#[derive(Debug, Clone)]
pub struct RfftQ15 {
    len: usize,
    cfft: CfftQ15,
    twiddles: Vec<Complex<i16>>,
}

impl RfftQ15 {
    pub fn new(len: usize) -> Result<Self, SetupError> {
        if !is_power_of_two(len) || len < 2 * MIN_CFFT_LEN {
            return Err(SetupError::FftLength { len });
        }
        let cfft = CfftQ15::new(len / 2).map_err(|_| SetupError::FftLength { len })?;
        let mut twiddles = cfft_twiddles_q15(len)?;
        twiddles.truncate(len / 2);
        Ok(Self {
            len,
            cfft,
            twiddles,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bins(&self) -> usize {
        self.len / 2
    }

    /// Forward transform; output is scaled by `1 / len()`
    pub fn process(&self, input: &[i16], output: &mut [Complex<i16>]) -> Result<(), PipelineError> {
        let half = self.bins();
        if input.len() != self.len || output.len() != half {
            return Err(PipelineError::InvalidArgument {
                reason: format!(
                    "q15 rfft expects {} samples and {} bins, got {} and {}",
                    self.len,
                    half,
                    input.len(),
                    output.len()
                ),
            });
        }

        for (slot, pair) in output.iter_mut().zip(input.chunks_exact(2)) {
            *slot = Complex::new(pair[0], pair[1]);
        }
        self.cfft.process(output, true)?;

        let z0 = output[0];
        let (re, im) = (z0.re as i32, z0.im as i32);
        output[0] = Complex::new(sat16((re + im) >> 1), sat16((re - im) >> 1));

        for k in 1..=half / 2 {
            let j = half - k;
            let zk = output[k];
            let zj = output[j];
            output[k] = self.split_bin(zk, zj, self.twiddles[k]);
            if j != k {
                output[j] = self.split_bin(zj, zk, self.twiddles[j]);
            }
        }
        Ok(())
    }

    /// `(E + W*O) / 2` with `E = (Zk + conj Zj)/2`, `O = -i (Zk - conj Zj)/2`
    fn split_bin(&self, zk: Complex<i16>, zj: Complex<i16>, w: Complex<i16>) -> Complex<i16> {
        let (kr, ki, jr, ji) = (zk.re as i32, zk.im as i32, zj.re as i32, zj.im as i32);
        let even = Complex::new(sat16((kr + jr) >> 1), sat16((ki - ji) >> 1));
        // -i * (a + ib) = b - ia, with (a, b) = Zk - conj(Zj)
        let odd = Complex::new(sat16((ki + ji) >> 1), sat16(-(kr - jr) >> 1));
        let rotated = mul_q15(odd, w);
        Complex::new(
            sat16((even.re as i32 + rotated.re as i32) >> 1),
            sat16((even.im as i32 + rotated.im as i32) >> 1),
        )
    }
}

/// Magnitudes of Q15 complex values, saturated to i16
pub fn magnitudes_q15(input: &[Complex<i16>], out: &mut [i16]) {
    for (m, c) in out.iter_mut().zip(input) {
        let power = (c.re as i64).pow(2) + (c.im as i64).pow(2);
        *m = isqrt(power as u128).min(i16::MAX as u128) as i16;
    }
}

/// Magnitude spectrum of a packed real transform
pub fn rfft_magnitudes_q15(packed: &[Complex<i16>], out: &mut [i16]) {
    magnitudes_q15(packed, out);
    if let (Some(first), Some(dc)) = (out.first_mut(), packed.first()) {
        *first = (dc.re as i32).abs().min(i16::MAX as i32) as i16;
    }
}

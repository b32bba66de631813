// FFT module - fixed-length complex and real FFTs with precomputed tables
//
// Transforms are in-place decimation-in-frequency. The stage layout is chosen
// by length family:
//
//   radix-8-by-2: one radix-2 stage, then radix-8 stages (16, 128, 1024)
//   radix-8-by-4: one radix-4 stage, then radix-8 stages (32, 256, 2048)
//   radix-8:      radix-8 stages only (8, 64, 512, 4096)
//
// Outputs come out in digit-reversed order; the optional reorder step applies a
// precomputed swap table to restore natural order.

pub mod q15;
pub mod tables;

pub use q15::{CfftQ15, RfftQ15};
pub use tables::{cfft_twiddles, cfft_twiddles_q15, is_power_of_two, reorder_table, rfft_twiddles};

use crate::error::{PipelineError, SetupError};
use rustfft::num_complex::Complex;

/// Shortest supported complex transform
pub const MIN_CFFT_LEN: usize = 8;
/// Longest supported complex transform
pub const MAX_CFFT_LEN: usize = 4096;

const FRAC_1_SQRT_2: f32 = std::f32::consts::FRAC_1_SQRT_2;

/// Stage layout of a complex transform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FftKernel {
    Radix8By2,
    Radix8By4,
    Radix8,
}

impl FftKernel {
    /// Kernel family a power-of-two length belongs to
    pub fn for_len(len: usize) -> Option<Self> {
        if !is_power_of_two(len) || len < MIN_CFFT_LEN {
            return None;
        }
        match len.trailing_zeros() % 3 {
            0 => Some(FftKernel::Radix8),
            1 => Some(FftKernel::Radix8By2),
            _ => Some(FftKernel::Radix8By4),
        }
    }

    /// Stage radices for a transform of `len` points, outermost first
    pub fn radices(self, len: usize) -> Vec<usize> {
        let mut radices = Vec::new();
        let mut rest = len;
        match self {
            FftKernel::Radix8By2 => {
                radices.push(2);
                rest /= 2;
            }
            FftKernel::Radix8By4 => {
                radices.push(4);
                rest /= 4;
            }
            FftKernel::Radix8 => {}
        }
        while rest > 1 {
            radices.push(8);
            rest /= 8;
        }
        radices
    }
}

/// Complex FFT of a fixed power-of-two length
#[derive(Debug, Clone)]
pub struct Cfft {
    len: usize,
    kernel: FftKernel,
    radices: Vec<usize>,
    twiddles: Vec<Complex<f32>>,
    reorder: Vec<[u16; 2]>,
}

impl Cfft {
    /// Build tables for a transform of `len` points
    ///
    /// # Errors
    /// `SetupError::FftLength` unless `len` is a power of two in
    /// `MIN_CFFT_LEN..=MAX_CFFT_LEN`
    pub fn new(len: usize) -> Result<Self, SetupError> {
        let kernel = FftKernel::for_len(len).ok_or(SetupError::FftLength { len })?;
        Self::with_kernel(len, kernel)
    }

    /// Build tables for an explicitly chosen kernel
    ///
    /// # Errors
    /// `SetupError::FftLength` if the kernel cannot handle `len`
    pub fn with_kernel(len: usize, kernel: FftKernel) -> Result<Self, SetupError> {
        if len > MAX_CFFT_LEN || FftKernel::for_len(len) != Some(kernel) {
            return Err(SetupError::FftLength { len });
        }
        let radices = kernel.radices(len);
        Ok(Self {
            len,
            kernel,
            twiddles: cfft_twiddles(len)?,
            reorder: reorder_table(&radices, len),
            radices,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn kernel(&self) -> FftKernel {
        self.kernel
    }

    /// Forward transform in place
    ///
    /// # Arguments
    /// * `data` - Exactly `len()` complex samples
    /// * `reorder` - Restore natural bin order after the butterflies
    pub fn process(&self, data: &mut [Complex<f32>], reorder: bool) -> Result<(), PipelineError> {
        if data.len() != self.len {
            return Err(PipelineError::InvalidArgument {
                reason: format!("cfft expects {} points, got {}", self.len, data.len()),
            });
        }

        let mut block = self.len;
        for &radix in &self.radices {
            match radix {
                2 => dif_stage::<2>(data, block, &self.twiddles, butterfly2),
                4 => dif_stage::<4>(data, block, &self.twiddles, butterfly4),
                _ => dif_stage::<8>(data, block, &self.twiddles, butterfly8),
            }
            block /= radix;
        }

        if reorder {
            for &[a, b] in &self.reorder {
                data.swap(a as usize, b as usize);
            }
        }
        Ok(())
    }
}

/// One decimation-in-frequency stage over every block of `block` points
fn dif_stage<const R: usize>(
    data: &mut [Complex<f32>],
    block: usize,
    twiddles: &[Complex<f32>],
    butterfly: fn([Complex<f32>; R]) -> [Complex<f32>; R],
) {
    let len = data.len();
    let quarter = block / R;
    let twiddle_step = len / block;

    for base in (0..len).step_by(block) {
        for n in 0..quarter {
            let mut x = [Complex::new(0.0, 0.0); R];
            for (j, slot) in x.iter_mut().enumerate() {
                *slot = data[base + n + j * quarter];
            }
            let y = butterfly(x);
            for (m, value) in y.into_iter().enumerate() {
                let w = twiddles[(n * m * twiddle_step) % len];
                data[base + n + m * quarter] = value * w;
            }
        }
    }
}

fn butterfly2(x: [Complex<f32>; 2]) -> [Complex<f32>; 2] {
    [x[0] + x[1], x[0] - x[1]]
}

/// Multiply by `-i`
fn rotate_neg_i(v: Complex<f32>) -> Complex<f32> {
    Complex::new(v.im, -v.re)
}

fn butterfly4(x: [Complex<f32>; 4]) -> [Complex<f32>; 4] {
    let a = x[0] + x[2];
    let b = x[0] - x[2];
    let c = x[1] + x[3];
    let d = rotate_neg_i(x[1] - x[3]);
    [a + c, b + d, a - c, b - d]
}

fn butterfly8(x: [Complex<f32>; 8]) -> [Complex<f32>; 8] {
    let even = butterfly4([x[0], x[2], x[4], x[6]]);
    let odd = butterfly4([x[1], x[3], x[5], x[7]]);
    let w = [
        Complex::new(1.0, 0.0),
        Complex::new(FRAC_1_SQRT_2, -FRAC_1_SQRT_2),
        Complex::new(0.0, -1.0),
        Complex::new(-FRAC_1_SQRT_2, -FRAC_1_SQRT_2),
    ];
    let mut out = [Complex::new(0.0, 0.0); 8];
    for k in 0..4 {
        let t = odd[k] * w[k];
        out[k] = even[k] + t;
        out[k + 4] = even[k] - t;
    }
    out
}

/// Real FFT of a fixed power-of-two length, built on a half-length `Cfft`
///
/// Output holds `len / 2` complex bins; bin 0 packs the DC term in its real
/// part and the Nyquist term in its imaginary part.
#[derive(Debug, Clone)]
pub struct Rfft {
    len: usize,
    cfft: Cfft,
    twiddles: Vec<Complex<f32>>,
}

impl Rfft {
    /// # Errors
    /// `SetupError::FftLength` unless `len` is a power of two in `16..=8192`
    pub fn new(len: usize) -> Result<Self, SetupError> {
        if !is_power_of_two(len) || len < 2 * MIN_CFFT_LEN {
            return Err(SetupError::FftLength { len });
        }
        let cfft = Cfft::new(len / 2).map_err(|_| SetupError::FftLength { len })?;
        Ok(Self {
            len,
            cfft,
            twiddles: rfft_twiddles(len)?,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of complex bins produced
    pub fn bins(&self) -> usize {
        self.len / 2
    }

    /// Forward transform
    ///
    /// # Arguments
    /// * `input` - Exactly `len()` real samples
    /// * `output` - Exactly `bins()` complex values, also used as work buffer
    pub fn process(&self, input: &[f32], output: &mut [Complex<f32>]) -> Result<(), PipelineError> {
        let half = self.bins();
        if input.len() != self.len || output.len() != half {
            return Err(PipelineError::InvalidArgument {
                reason: format!(
                    "rfft expects {} samples and {} bins, got {} and {}",
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
        output[0] = Complex::new(z0.re + z0.im, z0.re - z0.im);

        for k in 1..=half / 2 {
            let j = half - k;
            let zk = output[k];
            let zj = output[j];
            output[k] = split_bin(zk, zj, self.twiddles[k]);
            if j != k {
                output[j] = split_bin(zj, zk, self.twiddles[j]);
            }
        }
        Ok(())
    }

    /// Magnitude spectrum of a packed output, `bins()` values
    pub fn magnitudes(packed: &[Complex<f32>], out: &mut [f32]) {
        for (m, c) in out.iter_mut().zip(packed) {
            *m = c.norm();
        }
        if let (Some(first), Some(dc)) = (out.first_mut(), packed.first()) {
            *first = dc.re.abs();
        }
    }
}

/// `X[k] = (Zk + conj(Zj)) / 2 - i * W^k * (Zk - conj(Zj)) / 2`
fn split_bin(zk: Complex<f32>, zj: Complex<f32>, w: Complex<f32>) -> Complex<f32> {
    let even = (zk + zj.conj()) * 0.5;
    let odd = rotate_neg_i(zk - zj.conj()) * 0.5;
    even + w * odd
}

#[cfg(test)]
#[path = "fft_tests.rs"]
mod tests;

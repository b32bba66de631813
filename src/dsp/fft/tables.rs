// FFT tables - twiddle factors and reorder swap tables
//
// All tables are generated once during setup and are read-only afterwards.

use crate::error::SetupError;
use rustfft::num_complex::Complex;
use std::f64::consts::PI;

/// Check that `len` is a non-zero power of two
pub fn is_power_of_two(len: usize) -> bool {
    len != 0 && len & (len - 1) == 0
}

fn require_power_of_two(len: usize) -> Result<(), SetupError> {
    if is_power_of_two(len) {
        Ok(())
    } else {
        Err(SetupError::FftLength { len })
    }
}

/// Twiddle factors `W_N^k = exp(-2*pi*i*k/N)` for `k in 0..len`
///
/// # Errors
/// `SetupError::FftLength` if `len` is not a power of two
pub fn cfft_twiddles(len: usize) -> Result<Vec<Complex<f32>>, SetupError> {
    require_power_of_two(len)?;
    Ok((0..len)
        .map(|k| {
            let phase = -2.0 * PI * k as f64 / len as f64;
            Complex::new(phase.cos() as f32, phase.sin() as f32)
        })
        .collect())
}

/// Twiddle factors for the real-FFT split step: `W_len^k` for `k in 0..len/2`
///
/// `len` is the real transform length.
pub fn rfft_twiddles(len: usize) -> Result<Vec<Complex<f32>>, SetupError> {
    require_power_of_two(len)?;
    let full = cfft_twiddles(len)?;
    Ok(full[..len / 2].to_vec())
}

/// Q15 twiddle factors `W_N^k` for `k in 0..len`
pub fn cfft_twiddles_q15(len: usize) -> Result<Vec<Complex<i16>>, SetupError> {
    require_power_of_two(len)?;
    Ok((0..len)
        .map(|k| {
            let phase = -2.0 * PI * k as f64 / len as f64;
            Complex::new(to_q15(phase.cos()), to_q15(phase.sin()))
        })
        .collect())
}

fn to_q15(value: f64) -> i16 {
    (value * 32767.0).round().clamp(i16::MIN as f64, i16::MAX as f64) as i16
}

/// Output position of frequency bin `k` after in-place decimation in
/// frequency with the given stage radices (outermost stage first)
fn output_position(k: usize, radices: &[usize], len: usize) -> usize {
    let mut pos = 0;
    let mut block = len;
    let mut rem = k;
    for &r in radices {
        block /= r;
        pos += (rem % r) * block;
        rem /= r;
    }
    pos
}

/// Swap pairs that move every bin to its natural position
///
/// For pure radix-2 stages this is the classic bit-reversal table; mixed
/// radices produce the matching digit-reversal. Applying the swaps in order
/// sorts the transform output.
pub fn reorder_table(radices: &[usize], len: usize) -> Vec<[u16; 2]> {
    let source: Vec<usize> = (0..len).map(|k| output_position(k, radices, len)).collect();
    let mut visited = vec![false; len];
    let mut swaps = Vec::new();

    for start in 0..len {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        let mut j = start;
        while source[j] != start {
            swaps.push([j as u16, source[j] as u16]);
            j = source[j];
            visited[j] = true;
        }
    }
    swaps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_twiddles_reject_non_power_of_two() {
        assert!(matches!(
            cfft_twiddles(100),
            Err(SetupError::FftLength { len: 100 })
        ));
        assert!(rfft_twiddles(0).is_err());
        assert!(cfft_twiddles_q15(48).is_err());
    }

    #[test]
    fn test_twiddle_values() {
        let w = cfft_twiddles(4).unwrap();
        assert_eq!(w.len(), 4);
        assert!((w[0].re - 1.0).abs() < 1e-7);
        assert!((w[1].im + 1.0).abs() < 1e-7);
        assert!((w[2].re + 1.0).abs() < 1e-7);

        let r = rfft_twiddles(16).unwrap();
        assert_eq!(r.len(), 8);

        let q = cfft_twiddles_q15(8).unwrap();
        assert_eq!(q[0], Complex::new(32767, 0));
        assert_eq!(q[2], Complex::new(0, -32767));
    }

    #[test]
    fn test_radix2_table_is_bit_reversal() {
        let swaps = reorder_table(&[2, 2, 2], 8);
        let mut data: Vec<usize> = (0..8).collect();
        // Place k at its bit-reversed slot, then undo with the swap table
        let mut scrambled = vec![0; 8];
        for k in 0..8 {
            let rev = ((k & 1) << 2) | (k & 2) | ((k & 4) >> 2);
            scrambled[rev] = k;
        }
        data.copy_from_slice(&scrambled);
        for [a, b] in swaps {
            data.swap(a as usize, b as usize);
        }
        assert_eq!(data, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn test_mixed_radix_table_sorts_output() {
        let radices = [2, 8];
        let len = 16;
        let mut data = vec![0usize; len];
        for k in 0..len {
            data[output_position(k, &radices, len)] = k;
        }
        for [a, b] in reorder_table(&radices, len) {
            data.swap(a as usize, b as usize);
        }
        assert_eq!(data, (0..len).collect::<Vec<_>>());
    }
}

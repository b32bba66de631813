// Spectral module - measures over magnitude spectra
//
// Magnitude spectra come from the real FFT: bin `k` of `n` bins. Float
// kernels return bin-unit or ratio values directly; fixed kernels work on the
// Q15 magnitude spectrum and return scaled integers.
//
// References:
// - Peeters, G. (2004). A large set of audio features for sound description

pub mod fixed;
pub mod float;

/// Largest number of dominant peaks tracked per spectrum
pub const MAX_PEAKS: usize = 32;

/// Marker for a peak slot that was not filled
pub const NO_PEAK: i16 = -1;

/// Cached spectrum-wide sums shared by spectral measures
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpectralContext<A> {
    pub magnitude_sum: Option<A>,
    pub centroid: Option<A>,
}

impl<A> SpectralContext<A> {
    pub fn new() -> Self {
        Self {
            magnitude_sum: None,
            centroid: None,
        }
    }

    pub fn clear(&mut self) {
        self.magnitude_sum = None;
        self.centroid = None;
    }
}

/// Find up to `out.len()` dominant local maxima
///
/// A bin is a candidate when it is strictly above its left neighbour, not
/// below its right neighbour and at least `min_height`. Peaks are picked in
/// descending height; a candidate closer than `min_distance` bins to an already
/// picked peak is skipped. Unfilled slots are set to `NO_PEAK`.
///
/// # Returns
/// Number of peaks found
pub fn find_peaks<T: Copy + PartialOrd>(
    spectrum: &[T],
    min_height: T,
    min_distance: usize,
    out: &mut [i16],
) -> usize {
    out.iter_mut().for_each(|slot| *slot = NO_PEAK);
    let n = spectrum.len();
    let is_candidate = |i: usize| -> bool {
        let v = spectrum[i];
        if v < min_height {
            return false;
        }
        let left_ok = i == 0 || v > spectrum[i - 1];
        let right_ok = i + 1 == n || v >= spectrum[i + 1];
        left_ok && right_ok
    };

    let mut found = 0;
    while found < out.len() {
        let mut best: Option<usize> = None;
        for i in 0..n {
            if !is_candidate(i) {
                continue;
            }
            let taken = out[..found].iter().any(|&p| {
                let p = p as usize;
                p == i || p.abs_diff(i) < min_distance
            });
            if taken {
                continue;
            }
            match best {
                Some(b) if spectrum[b] >= spectrum[i] => {}
                _ => best = Some(i),
            }
        }
        match best {
            Some(i) => {
                out[found] = i as i16;
                found += 1;
            }
            None => break,
        }
    }
    found
}

/// Valid peak indices with their minimum and maximum
fn peak_span(peaks: &[i16]) -> Option<(usize, i16, i16)> {
    let mut valid = peaks.iter().copied().filter(|&p| p >= 0);
    let first = valid.next()?;
    let (count, lo, hi) = valid.fold((1usize, first, first), |(c, lo, hi), p| {
        (c + 1, lo.min(p), hi.max(p))
    });
    Some((count, lo, hi))
}

#[cfg(test)]
#[path = "spectral_tests.rs"]
mod tests;

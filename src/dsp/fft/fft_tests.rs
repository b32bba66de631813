use super::*;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rustfft::FftPlanner;

fn random_signal(len: usize, seed: u64) -> Vec<Complex<f32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len)
        .map(|_| Complex::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)))
        .collect()
}

fn reference_fft(input: &[Complex<f32>]) -> Vec<Complex<f32>> {
    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(input.len());
    let mut buffer = input.to_vec();
    fft.process(&mut buffer);
    buffer
}

fn max_error(a: &[Complex<f32>], b: &[Complex<f32>]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y).norm()).fold(0.0, f32::max)
}

#[test]
fn test_kernel_selection_by_length() {
    assert_eq!(FftKernel::for_len(8), Some(FftKernel::Radix8));
    assert_eq!(FftKernel::for_len(16), Some(FftKernel::Radix8By2));
    assert_eq!(FftKernel::for_len(32), Some(FftKernel::Radix8By4));
    assert_eq!(FftKernel::for_len(64), Some(FftKernel::Radix8));
    assert_eq!(FftKernel::for_len(128), Some(FftKernel::Radix8By2));
    assert_eq!(FftKernel::for_len(256), Some(FftKernel::Radix8By4));
    assert_eq!(FftKernel::for_len(4096), Some(FftKernel::Radix8));
    assert_eq!(FftKernel::for_len(4), None);
    assert_eq!(FftKernel::for_len(100), None);

    assert_eq!(FftKernel::Radix8By2.radices(1024), vec![2, 8, 8, 8]);
    assert_eq!(FftKernel::Radix8By4.radices(32), vec![4, 8]);
    assert_eq!(FftKernel::Radix8.radices(512), vec![8, 8, 8]);
}

#[test]
fn test_cfft_rejects_unsupported_lengths() {
    assert!(matches!(Cfft::new(100), Err(SetupError::FftLength { len: 100 })));
    assert!(Cfft::new(4).is_err());
    assert!(Cfft::new(8192).is_err());
    assert!(Cfft::with_kernel(64, FftKernel::Radix8By2).is_err());
    assert!(Cfft::with_kernel(64, FftKernel::Radix8).is_ok());
}

#[test]
fn test_cfft_matches_reference_for_all_lengths() {
    let mut len = MIN_CFFT_LEN;
    while len <= MAX_CFFT_LEN {
        let cfft = Cfft::new(len).unwrap();
        let input = random_signal(len, len as u64);
        let mut data = input.clone();
        cfft.process(&mut data, true).unwrap();

        let expected = reference_fft(&input);
        let tolerance = 1e-4 * (len as f32).sqrt() * 4.0;
        let err = max_error(&data, &expected);
        println!("cfft len={} kernel={:?} max_err={}", len, cfft.kernel(), err);
        assert!(err < tolerance, "len {} error {}", len, err);
        len *= 2;
    }
}

#[test]
fn test_cfft_without_reorder_is_a_permutation() {
    let len = 128;
    let cfft = Cfft::new(len).unwrap();
    let input = random_signal(len, 7);
    let mut scrambled = input.clone();
    cfft.process(&mut scrambled, false).unwrap();
    let mut ordered = input;
    cfft.process(&mut ordered, true).unwrap();

    let mut a: Vec<f32> = scrambled.iter().map(|c| c.norm()).collect();
    let mut b: Vec<f32> = ordered.iter().map(|c| c.norm()).collect();
    a.sort_by(|x, y| x.partial_cmp(y).unwrap());
    b.sort_by(|x, y| x.partial_cmp(y).unwrap());
    assert_eq!(a, b);
}

#[test]
fn test_cfft_wrong_buffer_length() {
    let cfft = Cfft::new(16).unwrap();
    let mut data = vec![Complex::new(0.0, 0.0); 15];
    assert!(matches!(
        cfft.process(&mut data, true),
        Err(PipelineError::InvalidArgument { .. })
    ));
}

#[test]
fn test_rfft_matches_reference() {
    let mut len = 16;
    while len <= 8192 {
        let rfft = Rfft::new(len).unwrap();
        let mut rng = StdRng::seed_from_u64(len as u64);
        let input: Vec<f32> = (0..len).map(|_| rng.gen_range(-1.0..1.0)).collect();
        let mut output = vec![Complex::new(0.0, 0.0); rfft.bins()];
        rfft.process(&input, &mut output).unwrap();

        let complex_input: Vec<Complex<f32>> =
            input.iter().map(|&x| Complex::new(x, 0.0)).collect();
        let expected = reference_fft(&complex_input);
        let tolerance = 1e-4 * (len as f32).sqrt() * 4.0;

        assert!((output[0].re - expected[0].re).abs() < tolerance);
        assert!((output[0].im - expected[len / 2].re).abs() < tolerance);
        let err = max_error(&output[1..], &expected[1..len / 2]);
        assert!(err < tolerance, "len {} error {}", len, err);
        len *= 2;
    }
}

#[test]
fn test_rfft_sine_peaks_at_its_bin() {
    let len = 256;
    let bin = 12;
    let rfft = Rfft::new(len).unwrap();
    let input: Vec<f32> = (0..len)
        .map(|n| (2.0 * std::f32::consts::PI * bin as f32 * n as f32 / len as f32).sin())
        .collect();
    let mut output = vec![Complex::new(0.0, 0.0); rfft.bins()];
    rfft.process(&input, &mut output).unwrap();

    let mut mags = vec![0.0f32; rfft.bins()];
    Rfft::magnitudes(&output, &mut mags);
    let peak = mags
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
        .map(|(i, _)| i)
        .unwrap();
    assert_eq!(peak, bin);
    assert!((mags[bin] - len as f32 / 2.0).abs() < 0.01);
    let leakage: f32 = mags
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != bin)
        .map(|(_, m)| *m)
        .fold(0.0, f32::max);
    assert!(leakage < 1e-2, "leakage {}", leakage);
}

#[test]
fn test_rfft_rejects_bad_lengths() {
    assert!(Rfft::new(12).is_err());
    assert!(Rfft::new(8).is_err());
    assert!(Rfft::new(16384).is_err());
    let rfft = Rfft::new(32).unwrap();
    let mut out = vec![Complex::new(0.0, 0.0); 8];
    assert!(rfft.process(&[0.0; 32], &mut out).is_err());
}

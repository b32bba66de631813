use super::*;
use crate::dsp::Strided;

fn view(data: &[f32]) -> Strided<'_, f32> {
    Strided::contiguous(data)
}

fn approx(a: f32, b: f32, tol: f32) -> bool {
    (a - b).abs() <= tol
}

#[test]
fn test_empty_input_returns_zero() {
    let empty: [f32; 0] = [];
    let mut ctx = StatContext::new();
    assert_eq!(float::mean(view(&empty), &mut ctx), 0.0);
    assert_eq!(float::variance(view(&empty), &mut ctx), 0.0);
    assert_eq!(float::rms(view(&empty)), 0.0);
    assert_eq!(float::zcr(view(&empty)), 0.0);
    assert_eq!(float::min_max(view(&empty)), (0.0, 0.0));
    assert_eq!(float::autocorrelation(view(&empty), &mut ctx, 1), 0.0);

    let empty_i16: [i16; 0] = [];
    let mut ictx = StatContext::new();
    assert_eq!(fixed::mean(Strided::contiguous(&empty_i16), &mut ictx), 0);
    assert_eq!(fixed::variance(Strided::contiguous(&empty_i16), &mut ictx), 0);
    assert_eq!(fixed::rms(Strided::contiguous(&empty_i16)), 0);
    assert_eq!(fixed::skewness(Strided::contiguous(&empty_i16), &mut ictx), 0);
}

#[test]
fn test_constant_signal_hits_zero_div_flag() {
    let data = [3.0_f32; 16];
    let mut ctx = StatContext::new();
    assert_eq!(float::variance(view(&data), &mut ctx), 0.0);
    assert_eq!(float::skewness(view(&data), &mut ctx), 0.0);
    assert_eq!(float::kurtosis(view(&data), &mut ctx), 0.0);
    assert_eq!(float::autocorrelation(view(&data), &mut ctx, 2), 0.0);

    let data = [-7_i8; 16];
    let mut ictx = StatContext::new();
    assert_eq!(fixed::skewness(Strided::contiguous(&data), &mut ictx), 0);
    assert_eq!(fixed::autocorrelation(Strided::contiguous(&data), &mut ictx, 1), 0);
    let h = fixed::hjorth(Strided::contiguous(&data), &mut ictx);
    assert_eq!(h.mobility, 0);
    assert_eq!(h.complexity, 0);
}

#[test]
fn test_variance_with_seeded_sum_matches_scratch() {
    let data = [1.5_f32, -2.0, 4.25, 0.0, 3.0, 9.5, -1.25, 2.0];
    let scratch = float::variance(view(&data), &mut StatContext::new());

    let total: f32 = data.iter().sum();
    let seeded = float::variance(view(&data), &mut StatContext::with_sum(total));
    assert_eq!(scratch, seeded);

    let idata = [10_i16, -20, 300, 45, -8, 0, 77, 12];
    let scratch = fixed::variance(Strided::contiguous(&idata), &mut StatContext::new());
    let total: i64 = idata.iter().map(|&v| v as i64).sum();
    let seeded = fixed::variance(Strided::contiguous(&idata), &mut StatContext::with_sum(total));
    assert_eq!(scratch, seeded);
}

#[test]
fn test_context_caches_moments() {
    let data = [1.0_f32, 2.0, 3.0, 4.0];
    let mut ctx = StatContext::new();
    let v = float::variance(view(&data), &mut ctx);
    assert_eq!(ctx.sum, Some(10.0));
    assert_eq!(ctx.var, Some(v));
    assert!(approx(v, 1.25, 1e-6));
    assert!(approx(float::std_dev(view(&data), &mut ctx), 1.118034, 1e-5));
}

#[test]
fn test_basic_float_moments() {
    let data = [2.0_f32, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
    let mut ctx = StatContext::new();
    assert!(approx(float::mean(view(&data), &mut ctx), 5.0, 1e-6));
    assert!(approx(float::std_dev(view(&data), &mut ctx), 2.0, 1e-6));
    assert!(approx(float::mad(view(&data), &mut ctx), 1.5, 1e-6));
    assert_eq!(float::range(view(&data)), 7.0);
    assert!(approx(float::abs_mean(view(&[-1.0, 1.0, -3.0, 3.0])), 2.0, 1e-6));
    assert!(approx(float::rms(view(&[3.0, -3.0, 3.0, -3.0])), 3.0, 1e-6));
}

#[test]
fn test_symmetric_signal_has_zero_skew() {
    let data = [-3.0_f32, -1.0, 1.0, 3.0];
    let mut ctx = StatContext::new();
    assert!(approx(float::skewness(view(&data), &mut ctx), 0.0, 1e-6));

    let idata = [-3_i16, -1, 1, 3];
    assert_eq!(fixed::skewness(Strided::contiguous(&idata), &mut StatContext::new()), 0);
    // Kurtosis of {-3,-1,1,3}: m4 = 41, var = 5 -> 1.64
    assert_eq!(fixed::kurtosis(Strided::contiguous(&idata), &mut StatContext::new()), 1640);
}

#[test]
fn test_fixed_moments_share_cached_variance() {
    let idata = [-3_i16, -1, 1, 3];
    let x = Strided::contiguous(&idata);

    let mut ctx = StatContext::new();
    assert_eq!(fixed::kurtosis(x, &mut ctx), 1640);
    assert_eq!(ctx.var, Some(5));
    assert_eq!(fixed::variance(x, &mut ctx), 5);

    // a seeded variance is used as is: twice the variance, a quarter of the kurtosis
    let mut ctx = StatContext::new();
    ctx.var = Some(10);
    assert_eq!(fixed::kurtosis(x, &mut ctx), 410);
}

#[test]
fn test_crossing_rates() {
    let data = [1.0_f32, -1.0, 1.0, -1.0, 1.0];
    assert!(approx(float::zcr(view(&data)), 1.0, 1e-6));
    assert!(approx(float::tcr(view(&data), 2.0), 0.0, 1e-6));

    let idata = [1_i8, -1, 1, -1, 1];
    assert_eq!(fixed::zcr(Strided::contiguous(&idata)), 1000);
    assert_eq!(fixed::mcr(Strided::contiguous(&idata), &mut StatContext::new()), 1000);
    assert_eq!(fixed::tcr(Strided::contiguous(&idata), 5), 0);
}

#[test]
fn test_fraction_features() {
    let data = [1.0_f32, 2.0, -1.0, 0.0];
    assert!(approx(float::psoz(view(&data)), 0.5, 1e-6));
    assert!(approx(float::psot(view(&data), 1.5), 0.25, 1e-6));

    let idata = [1_i16, 2, -1, 0];
    assert_eq!(fixed::psoz(Strided::contiguous(&idata)), 500);
    assert_eq!(fixed::psom(Strided::contiguous(&idata), &mut StatContext::new()), 500);
    assert_eq!(fixed::psot(Strided::contiguous(&idata), 1), 250);
}

#[test]
fn test_autocorrelation_of_alternating_signal() {
    let data = [1.0_f32, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0];
    let mut ctx = StatContext::new();
    let r1 = float::autocorrelation(view(&data), &mut ctx, 1);
    let r2 = float::autocorrelation(view(&data), &mut ctx, 2);
    assert!(approx(r1, -7.0 / 8.0, 1e-6));
    assert!(approx(r2, 6.0 / 8.0, 1e-6));
    assert_eq!(float::autocorrelation(view(&data), &mut ctx, 8), 0.0);

    let idata = [1_i16, -1, 1, -1, 1, -1, 1, -1];
    let mut ictx = StatContext::new();
    assert_eq!(fixed::autocorrelation(Strided::contiguous(&idata), &mut ictx, 1), -875);
    assert_eq!(fixed::autocorrelation(Strided::contiguous(&idata), &mut ictx, 2), 750);
}

#[test]
fn test_linear_regression_on_ramp() {
    let data: Vec<f32> = (0..10).map(|i| 2.0 * i as f32 + 1.0).collect();
    let fit = float::linear_regression(view(&data), &mut StatContext::new());
    assert!(approx(fit.slope, 2.0, 1e-4));
    assert!(approx(fit.intercept, 1.0, 1e-4));

    let idata: Vec<i16> = (0..10).map(|i| 3 * i as i16 - 4).collect();
    let fit = fixed::linear_regression(Strided::contiguous(&idata), &mut StatContext::new());
    assert_eq!(fit.slope, 3000);
    assert_eq!(fit.intercept, -4);
}

#[test]
fn test_hjorth_sine() {
    let data: Vec<f32> = (0..256)
        .map(|i| (2.0 * std::f32::consts::PI * i as f32 / 32.0).sin())
        .collect();
    let h = float::hjorth(view(&data), &mut StatContext::new());
    // Mobility of a pure tone approximates its angular frequency
    let omega = 2.0 * std::f32::consts::PI / 32.0;
    assert!(approx(h.mobility, omega, 0.01), "mobility {}", h.mobility);
    assert!(approx(h.complexity, 1.0, 0.05), "complexity {}", h.complexity);
    assert!(approx(h.activity, 0.5, 0.01));
}

#[test]
fn test_difference_features() {
    let data = [0.0_f32, 2.0, 0.0, 2.0];
    assert!(approx(float::amdf(view(&data)), 2.0, 1e-6));
    assert!(approx(float::rmds(view(&data)), 2.0, 1e-6));

    let idata = [0_i8, 2, 0, 2];
    assert_eq!(fixed::amdf(Strided::contiguous(&idata)), 2);
    assert_eq!(fixed::rmds(Strided::contiguous(&idata)), 2);
}

#[test]
fn test_crest_factor_of_square_wave() {
    let data = [1.0_f32, -1.0, 1.0, -1.0];
    assert!(approx(float::crest_factor(view(&data)), 1.0, 1e-6));
    let idata = [100_i16, -100, 100, -100];
    assert_eq!(fixed::crest_factor(Strided::contiguous(&idata)), 1000);
    assert_eq!(fixed::crest_factor(Strided::contiguous(&[0_i16; 4])), 0);
}

#[test]
fn test_peak_to_peak_split() {
    // Step from 0 to 4 with a span-2 moving average
    let data = [0.0_f32, 0.0, 4.0, 4.0];
    let p2p = float::peak_to_peak(view(&data), 2);
    assert!(approx(p2p.low, 4.0, 1e-6));
    assert!(approx(p2p.high, 2.0, 1e-6));

    let idata = [0_i16, 0, 4, 4];
    let p2p = fixed::peak_to_peak(Strided::contiguous(&idata), 2);
    assert_eq!(p2p.low, 4);
    assert_eq!(p2p.high, 2);
}

#[test]
fn test_strided_statistics_pick_one_axis() {
    // Interleaved (x, y) pairs; x is a ramp, y is constant
    let data = [0.0_f32, 5.0, 1.0, 5.0, 2.0, 5.0, 3.0, 5.0];
    let xs = Strided::new(&data, 4, 2);
    let ys = Strided::new(&data[1..], 4, 2);
    assert!(approx(float::mean(xs, &mut StatContext::new()), 1.5, 1e-6));
    assert_eq!(float::variance(ys, &mut StatContext::new()), 0.0);
}

#[test]
fn test_fixed_i8_saturates_into_i16() {
    let data = [127_i8, -128, 127, -128];
    let v = fixed::variance(Strided::contiguous(&data), &mut StatContext::new());
    assert_eq!(v, 16256);
    assert_eq!(fixed::range(Strided::contiguous(&data)), 255);
}

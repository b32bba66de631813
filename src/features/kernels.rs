// Kernels - time-domain feature dispatch per input precision
//
// Float inputs use the f32 statistics, fixed inputs the integer statistics
// with their documented scale factors. Every result is widened to f64 so the
// extractor can store it in the feature type of the input precision without
// loss.

use super::mask::TimeFeature;
use crate::dsp::stats::{fixed, float};
use crate::dsp::{FeatureValue, FixedSample, Sample, StatContext, Strided};

/// Input precision that features can be extracted from
pub trait TimeDomain: Sample {
    /// Accumulator type of the statistics context
    type Acc: Copy + Default + std::fmt::Debug + Send;

    /// Compute one time-domain feature
    ///
    /// # Arguments
    /// * `feature` - Feature to compute
    /// * `x` - Sub-window of one axis
    /// * `ctx` - Moments shared by the features of this sub-window
    /// * `arg` - The feature's argument, 0 when it takes none
    fn time_feature(
        feature: TimeFeature,
        x: Strided<'_, Self>,
        ctx: &mut StatContext<Self::Acc>,
        arg: f32,
    ) -> f64;

    /// Sample as Q15 for the fixed-point spectrum
    fn to_q15_sample(self) -> i16;
}

/// Non-negative integer argument (lag, span); invalid values read as 0
pub fn arg_usize(arg: f32) -> usize {
    if arg.is_finite() && arg > 0.0 {
        arg as usize
    } else {
        0
    }
}

impl TimeDomain for f32 {
    type Acc = f32;

    fn time_feature(
        feature: TimeFeature,
        x: Strided<'_, f32>,
        ctx: &mut StatContext<f32>,
        arg: f32,
    ) -> f64 {
        let value = match feature {
            TimeFeature::Min => float::min(x),
            TimeFeature::Max => float::max(x),
            TimeFeature::Range => float::range(x),
            TimeFeature::Mean => float::mean(x, ctx),
            TimeFeature::Mad => float::mad(x, ctx),
            TimeFeature::Skew => float::skewness(x, ctx),
            TimeFeature::Kurtosis => float::kurtosis(x, ctx),
            TimeFeature::Std => float::std_dev(x, ctx),
            TimeFeature::Rms => float::rms(x),
            TimeFeature::Mcr => float::mcr(x, ctx),
            TimeFeature::Zcr => float::zcr(x),
            TimeFeature::Tcr => float::tcr(x, arg),
            TimeFeature::P2pLowFreq => float::peak_to_peak(x, arg_usize(arg)).low,
            TimeFeature::P2pHighFreq => float::peak_to_peak(x, arg_usize(arg)).high,
            TimeFeature::AbsMean => float::abs_mean(x),
            TimeFeature::Amdf => float::amdf(x),
            TimeFeature::Pscr => float::positive_sigma_crossing_rate(x, ctx, arg),
            TimeFeature::Nscr => float::negative_sigma_crossing_rate(x, ctx, arg),
            TimeFeature::Psoz => float::psoz(x),
            TimeFeature::Psom => float::psom(x, ctx),
            TimeFeature::Psos => float::psos(x, ctx, arg),
            TimeFeature::Crest => float::crest_factor(x),
            TimeFeature::Rmds => float::rmds(x),
            TimeFeature::Autocorr => float::autocorrelation(x, ctx, arg_usize(arg)),
            TimeFeature::HjorthMobility => float::hjorth(x, ctx).mobility,
            TimeFeature::HjorthComplexity => float::hjorth(x, ctx).complexity,
            TimeFeature::LrSlope => float::linear_regression(x, ctx).slope,
            TimeFeature::LrIntercept => float::linear_regression(x, ctx).intercept,
        };
        value as f64
    }

    fn to_q15_sample(self) -> i16 {
        (self.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
    }
}

fn fixed_time_feature<T: FixedSample>(
    feature: TimeFeature,
    x: Strided<'_, T>,
    ctx: &mut StatContext<i64>,
    arg: f32,
) -> f64 {
    let value: T::Feature = match feature {
        TimeFeature::Min => fixed::min(x),
        TimeFeature::Max => fixed::max(x),
        TimeFeature::Range => fixed::range(x),
        TimeFeature::Mean => fixed::mean(x, ctx),
        TimeFeature::Mad => fixed::mad(x, ctx),
        TimeFeature::Skew => fixed::skewness(x, ctx),
        TimeFeature::Kurtosis => fixed::kurtosis(x, ctx),
        TimeFeature::Std => fixed::std_dev(x, ctx),
        TimeFeature::Rms => fixed::rms(x),
        TimeFeature::Mcr => fixed::mcr(x, ctx),
        TimeFeature::Zcr => fixed::zcr(x),
        TimeFeature::Tcr => fixed::tcr(x, T::from_f32_saturating(arg)),
        TimeFeature::P2pLowFreq => fixed::peak_to_peak(x, arg_usize(arg)).low,
        TimeFeature::P2pHighFreq => fixed::peak_to_peak(x, arg_usize(arg)).high,
        TimeFeature::AbsMean => fixed::abs_mean(x),
        TimeFeature::Amdf => fixed::amdf(x),
        TimeFeature::Pscr => fixed::positive_sigma_crossing_rate(x, ctx, arg),
        TimeFeature::Nscr => fixed::negative_sigma_crossing_rate(x, ctx, arg),
        TimeFeature::Psoz => fixed::psoz(x),
        TimeFeature::Psom => fixed::psom(x, ctx),
        TimeFeature::Psos => fixed::psos(x, ctx, arg),
        TimeFeature::Crest => fixed::crest_factor(x),
        TimeFeature::Rmds => fixed::rmds(x),
        TimeFeature::Autocorr => fixed::autocorrelation(x, ctx, arg_usize(arg)),
        TimeFeature::HjorthMobility => fixed::hjorth(x, ctx).mobility,
        TimeFeature::HjorthComplexity => fixed::hjorth(x, ctx).complexity,
        TimeFeature::LrSlope => fixed::linear_regression(x, ctx).slope,
        TimeFeature::LrIntercept => fixed::linear_regression(x, ctx).intercept,
    };
    value.to_f64()
}

impl TimeDomain for i8 {
    type Acc = i64;

    fn time_feature(
        feature: TimeFeature,
        x: Strided<'_, i8>,
        ctx: &mut StatContext<i64>,
        arg: f32,
    ) -> f64 {
        fixed_time_feature(feature, x, ctx, arg)
    }

    fn to_q15_sample(self) -> i16 {
        self.to_q15()
    }
}

impl TimeDomain for i16 {
    type Acc = i64;

    fn time_feature(
        feature: TimeFeature,
        x: Strided<'_, i16>,
        ctx: &mut StatContext<i64>,
        arg: f32,
    ) -> f64 {
        fixed_time_feature(feature, x, ctx, arg)
    }

    fn to_q15_sample(self) -> i16 {
        self.to_q15()
    }
}

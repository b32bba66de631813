// Mask - feature identifiers and the per-axis feature selection bitmask
//
// Bit positions are part of the model format. Features are always computed
// and emitted in ascending bit order, time domain first.

use serde::{Deserialize, Serialize};

/// Time-domain features, in emission order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TimeFeature {
    Min = 0,
    Max,
    Range,
    Mean,
    Mad,
    Skew,
    Kurtosis,
    Std,
    Rms,
    Mcr,
    Zcr,
    Tcr,
    P2pLowFreq,
    P2pHighFreq,
    AbsMean,
    Amdf,
    Pscr,
    Nscr,
    Psoz,
    Psom,
    Psos,
    Crest,
    Rmds,
    Autocorr,
    HjorthMobility,
    HjorthComplexity,
    LrSlope,
    LrIntercept,
}

impl TimeFeature {
    pub const COUNT: usize = 28;

    pub const ALL: [TimeFeature; Self::COUNT] = [
        TimeFeature::Min,
        TimeFeature::Max,
        TimeFeature::Range,
        TimeFeature::Mean,
        TimeFeature::Mad,
        TimeFeature::Skew,
        TimeFeature::Kurtosis,
        TimeFeature::Std,
        TimeFeature::Rms,
        TimeFeature::Mcr,
        TimeFeature::Zcr,
        TimeFeature::Tcr,
        TimeFeature::P2pLowFreq,
        TimeFeature::P2pHighFreq,
        TimeFeature::AbsMean,
        TimeFeature::Amdf,
        TimeFeature::Pscr,
        TimeFeature::Nscr,
        TimeFeature::Psoz,
        TimeFeature::Psom,
        TimeFeature::Psos,
        TimeFeature::Crest,
        TimeFeature::Rmds,
        TimeFeature::Autocorr,
        TimeFeature::HjorthMobility,
        TimeFeature::HjorthComplexity,
        TimeFeature::LrSlope,
        TimeFeature::LrIntercept,
    ];

    pub fn bit(self) -> u32 {
        1 << (self as u32)
    }

    /// Number of arguments read from the argument accessor
    pub fn args_num(self) -> usize {
        match self {
            TimeFeature::Tcr
            | TimeFeature::P2pLowFreq
            | TimeFeature::P2pHighFreq
            | TimeFeature::Pscr
            | TimeFeature::Nscr
            | TimeFeature::Psos
            | TimeFeature::Autocorr => 1,
            _ => 0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TimeFeature::Min => "MIN",
            TimeFeature::Max => "MAX",
            TimeFeature::Range => "RANGE",
            TimeFeature::Mean => "MEAN",
            TimeFeature::Mad => "MAD",
            TimeFeature::Skew => "SKEW",
            TimeFeature::Kurtosis => "KUR",
            TimeFeature::Std => "STD",
            TimeFeature::Rms => "RMS",
            TimeFeature::Mcr => "MCR",
            TimeFeature::Zcr => "ZCR",
            TimeFeature::Tcr => "TCR",
            TimeFeature::P2pLowFreq => "P2P_LF",
            TimeFeature::P2pHighFreq => "P2P_HF",
            TimeFeature::AbsMean => "ABSMEAN",
            TimeFeature::Amdf => "AMDF",
            TimeFeature::Pscr => "PSCR",
            TimeFeature::Nscr => "NSCR",
            TimeFeature::Psoz => "PSOZ",
            TimeFeature::Psom => "PSOM",
            TimeFeature::Psos => "PSOS",
            TimeFeature::Crest => "CREST",
            TimeFeature::Rmds => "RMDS",
            TimeFeature::Autocorr => "AUTOCORR",
            TimeFeature::HjorthMobility => "HJ_MOBILITY",
            TimeFeature::HjorthComplexity => "HJ_COMPLEXITY",
            TimeFeature::LrSlope => "LR_SLOPE",
            TimeFeature::LrIntercept => "LR_INTERCEPT",
        }
    }
}

/// Frequency-domain features, in emission order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FreqFeature {
    DomFreqs = 0,
    DomFreqsAmpl,
    DomFreqsThd,
    DomFreqsSnr,
    DomFreqsMeanDist,
    FerLowMid,
    FerMidHigh,
    FerLowHigh,
    SpectralRms,
    SpectralCrest,
    SpectralCentroid,
    SpectralSpread,
    SpectrumBins,
}

impl FreqFeature {
    pub const COUNT: usize = 13;

    pub const ALL: [FreqFeature; Self::COUNT] = [
        FreqFeature::DomFreqs,
        FreqFeature::DomFreqsAmpl,
        FreqFeature::DomFreqsThd,
        FreqFeature::DomFreqsSnr,
        FreqFeature::DomFreqsMeanDist,
        FreqFeature::FerLowMid,
        FreqFeature::FerMidHigh,
        FreqFeature::FerLowHigh,
        FreqFeature::SpectralRms,
        FreqFeature::SpectralCrest,
        FreqFeature::SpectralCentroid,
        FreqFeature::SpectralSpread,
        FreqFeature::SpectrumBins,
    ];

    pub fn bit(self) -> u16 {
        1 << (self as u16)
    }

    /// Features that depend on the dominant peak search
    pub fn uses_peaks(self) -> bool {
        matches!(
            self,
            FreqFeature::DomFreqs
                | FreqFeature::DomFreqsAmpl
                | FreqFeature::DomFreqsThd
                | FreqFeature::DomFreqsSnr
                | FreqFeature::DomFreqsMeanDist
        )
    }

    /// Features that depend on the band split
    pub fn uses_bands(self) -> bool {
        matches!(
            self,
            FreqFeature::FerLowMid | FreqFeature::FerMidHigh | FreqFeature::FerLowHigh
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            FreqFeature::DomFreqs => "DOM_FREQS",
            FreqFeature::DomFreqsAmpl => "DOM_FREQS_AMPL",
            FreqFeature::DomFreqsThd => "DOM_FREQS_THD",
            FreqFeature::DomFreqsSnr => "DOM_FREQS_SNR",
            FreqFeature::DomFreqsMeanDist => "DOM_FREQS_MEAN_DIST",
            FreqFeature::FerLowMid => "FER_LOWMID",
            FreqFeature::FerMidHigh => "FER_MIDHIGH",
            FreqFeature::FerLowHigh => "FER_LOWHIGH",
            FreqFeature::SpectralRms => "SPECTRAL_RMS",
            FreqFeature::SpectralCrest => "SPECTRAL_CREST",
            FreqFeature::SpectralCentroid => "SPECTRAL_CENTROID",
            FreqFeature::SpectralSpread => "SPECTRAL_SPREAD",
            FreqFeature::SpectrumBins => "SPECTRUM_BINS",
        }
    }
}

/// Feature selection for one axis
///
/// Packed layout of `bits()`: frequency features in bits 0-15, time features
/// in bits 32-63.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureMask {
    #[serde(default)]
    pub time: u32,
    #[serde(default)]
    pub freq: u16,
}

impl FeatureMask {
    pub fn new(time: u32, freq: u16) -> Self {
        Self { time, freq }
    }

    /// Mask selecting the given features
    pub fn from_features(time: &[TimeFeature], freq: &[FreqFeature]) -> Self {
        Self {
            time: time.iter().fold(0, |acc, f| acc | f.bit()),
            freq: freq.iter().fold(0, |acc, f| acc | f.bit()),
        }
    }

    pub fn from_bits(bits: u64) -> Self {
        Self {
            time: (bits >> 32) as u32,
            freq: (bits & 0xFFFF) as u16,
        }
    }

    pub fn bits(self) -> u64 {
        ((self.time as u64) << 32) | self.freq as u64
    }

    pub fn is_empty(self) -> bool {
        self.time == 0 && self.freq == 0
    }

    pub fn has_time(self, feature: TimeFeature) -> bool {
        self.time & feature.bit() != 0
    }

    pub fn has_freq(self, feature: FreqFeature) -> bool {
        self.freq & feature.bit() != 0
    }

    /// Whether any frequency feature needs a spectrum
    pub fn needs_spectrum(self) -> bool {
        self.freq != 0
    }

    /// Selected time features in emission order
    pub fn time_features(self) -> impl Iterator<Item = TimeFeature> {
        TimeFeature::ALL.into_iter().filter(move |f| self.has_time(*f))
    }

    /// Selected frequency features in emission order
    pub fn freq_features(self) -> impl Iterator<Item = FreqFeature> {
        FreqFeature::ALL.into_iter().filter(move |f| self.has_freq(*f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_positions_are_stable() {
        assert_eq!(TimeFeature::Min.bit(), 1);
        assert_eq!(TimeFeature::LrIntercept.bit(), 1 << 27);
        assert_eq!(FreqFeature::DomFreqs.bit(), 1);
        assert_eq!(FreqFeature::SpectrumBins.bit(), 1 << 12);
        for (i, f) in TimeFeature::ALL.iter().enumerate() {
            assert_eq!(*f as usize, i);
        }
        for (i, f) in FreqFeature::ALL.iter().enumerate() {
            assert_eq!(*f as usize, i);
        }
    }

    #[test]
    fn test_packed_layout() {
        let mask = FeatureMask::from_features(
            &[TimeFeature::Mean, TimeFeature::Min],
            &[FreqFeature::SpectralRms],
        );
        assert_eq!(mask.bits(), (0b1001u64 << 32) | (1 << 8));
        assert_eq!(FeatureMask::from_bits(mask.bits()), mask);
    }

    #[test]
    fn test_iteration_follows_bit_order() {
        let mask = FeatureMask::from_features(
            &[TimeFeature::Autocorr, TimeFeature::Min, TimeFeature::Std],
            &[FreqFeature::SpectrumBins, FreqFeature::DomFreqs],
        );
        let time: Vec<_> = mask.time_features().collect();
        assert_eq!(
            time,
            vec![TimeFeature::Min, TimeFeature::Std, TimeFeature::Autocorr]
        );
        let freq: Vec<_> = mask.freq_features().collect();
        assert_eq!(freq, vec![FreqFeature::DomFreqs, FreqFeature::SpectrumBins]);
        assert!(mask.needs_spectrum());
    }

    #[test]
    fn test_mask_serde() {
        let mask: FeatureMask = serde_json::from_str(r#"{"time": 7}"#).unwrap();
        assert_eq!(mask, FeatureMask::new(7, 0));
    }
}

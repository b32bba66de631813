// Args - per-feature arguments supplied by the model
//
// Some features are parameterised (crossing threshold, lag, smoothing span,
// peak search...). The extractor asks an argument accessor for them in
// extraction order; the default accessor reads them sequentially from one
// table per used axis.

use super::mask::{FreqFeature, TimeFeature};
use crate::error::PipelineError;

/// Feature an argument request belongs to
///
/// Grouped arguments are requested once per axis under the first feature of
/// the group: `DomFreqs` for the peak search, `FerLowMid` for the band split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureId {
    Time(TimeFeature),
    Freq(FreqFeature),
}

/// Arguments of the dominant peak search: peaks count, min distance in bins
pub const PEAK_SEARCH_ARGS: usize = 2;
/// Arguments of the band split: low/mid and mid/high boundary bins
pub const BAND_SPLIT_ARGS: usize = 2;
/// Arguments of SPECTRUM_BINS: start bin, bins count
pub const SPECTRUM_BINS_ARGS: usize = 2;

/// Source of feature arguments
pub trait FeatureArguments: Send {
    /// Restart from the first argument of every axis
    ///
    /// Called before each sub-window, so every sub-window sees the same
    /// arguments.
    fn rewind(&mut self);

    /// Fill `out` with the next arguments of `feature` on used-axis `slot`
    fn fetch(&mut self, slot: usize, feature: FeatureId, out: &mut [f32])
        -> Result<(), PipelineError>;
}

/// Sequential reader over one argument list per used axis
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgumentTable {
    axes: Vec<Vec<f32>>,
    cursors: Vec<usize>,
}

impl ArgumentTable {
    pub fn new(axes: Vec<Vec<f32>>) -> Self {
        let cursors = vec![0; axes.len()];
        Self { axes, cursors }
    }

    /// Arguments not consumed yet on `slot`
    pub fn remaining(&self, slot: usize) -> usize {
        match (self.axes.get(slot), self.cursors.get(slot)) {
            (Some(args), Some(&cursor)) => args.len() - cursor,
            _ => 0,
        }
    }
}

impl FeatureArguments for ArgumentTable {
    fn rewind(&mut self) {
        self.cursors.iter_mut().for_each(|c| *c = 0);
    }

    fn fetch(
        &mut self,
        slot: usize,
        feature: FeatureId,
        out: &mut [f32],
    ) -> Result<(), PipelineError> {
        let (args, cursor) = match (self.axes.get(slot), self.cursors.get_mut(slot)) {
            (Some(args), Some(cursor)) => (args, cursor),
            _ => {
                return Err(PipelineError::InvalidArgument {
                    reason: format!("no arguments for axis slot {} ({:?})", slot, feature),
                })
            }
        };
        let end = *cursor + out.len();
        if end > args.len() {
            return Err(PipelineError::InvalidArgument {
                reason: format!(
                    "axis slot {} has {} arguments, {:?} needs {} more",
                    slot,
                    args.len() - *cursor,
                    feature,
                    out.len()
                ),
            });
        }
        out.copy_from_slice(&args[*cursor..end]);
        *cursor = end;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_reads_sequentially_per_axis() {
        let mut table = ArgumentTable::new(vec![vec![1.0, 2.0, 3.0], vec![9.0]]);
        let mut one = [0.0];
        let mut two = [0.0; 2];

        table
            .fetch(0, FeatureId::Time(TimeFeature::Tcr), &mut one)
            .unwrap();
        assert_eq!(one, [1.0]);
        table
            .fetch(1, FeatureId::Time(TimeFeature::Autocorr), &mut one)
            .unwrap();
        assert_eq!(one, [9.0]);
        table
            .fetch(0, FeatureId::Freq(FreqFeature::DomFreqs), &mut two)
            .unwrap();
        assert_eq!(two, [2.0, 3.0]);
        assert_eq!(table.remaining(0), 0);
    }

    #[test]
    fn test_rewind_restarts_every_axis() {
        let mut table = ArgumentTable::new(vec![vec![4.0], vec![5.0]]);
        let mut out = [0.0];
        table.fetch(0, FeatureId::Time(TimeFeature::Psos), &mut out).unwrap();
        table.fetch(1, FeatureId::Time(TimeFeature::Psos), &mut out).unwrap();
        table.rewind();
        assert_eq!(table.remaining(0), 1);
        table.fetch(1, FeatureId::Time(TimeFeature::Psos), &mut out).unwrap();
        assert_eq!(out, [5.0]);
    }

    #[test]
    fn test_exhausted_table_is_an_error() {
        let mut table = ArgumentTable::new(vec![vec![1.0]]);
        let mut two = [0.0; 2];
        assert!(table
            .fetch(0, FeatureId::Freq(FreqFeature::SpectrumBins), &mut two)
            .is_err());
        let mut one = [0.0];
        assert!(table
            .fetch(3, FeatureId::Time(TimeFeature::Tcr), &mut one)
            .is_err());
    }
}

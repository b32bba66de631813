// Stats module - time-domain statistics over strided sample views
//
// `float` works on f32 samples with f32 accumulators. `fixed` works on i8/i16
// samples with integer accumulators and returns results saturated into the
// matching feature type; ratio-valued results carry the documented
// `PERCENTAGE_TO_INT_FACTOR` scale.
//
// Kernels that need the sum or the variance read them from a `StatContext`
// when present and store what they computed, so a feature set computed in
// order reuses the shared moments.

pub mod fixed;
pub mod float;

/// Shared intermediate moments for one signal
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatContext<A> {
    /// Sum of all samples
    pub sum: Option<A>,
    /// Population variance
    pub var: Option<A>,
}

impl<A> StatContext<A> {
    /// Context with no cached moments
    pub fn new() -> Self {
        Self {
            sum: None,
            var: None,
        }
    }

    /// Context seeded with a precomputed sum
    pub fn with_sum(sum: A) -> Self {
        Self {
            sum: Some(sum),
            var: None,
        }
    }

    pub fn clear(&mut self) {
        self.sum = None;
        self.var = None;
    }
}

/// Hjorth parameters of a signal
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Hjorth<T> {
    pub activity: T,
    pub mobility: T,
    pub complexity: T,
}

/// Least-squares line through `(i, x[i])`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LinearFit<T> {
    pub slope: T,
    pub intercept: T,
}

/// Peak-to-peak amplitudes of the moving-average split of a signal
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PeakToPeak<T> {
    /// Peak-to-peak of the smoothed (low-frequency) component
    pub low: T,
    /// Peak-to-peak of the residual (high-frequency) component
    pub high: T,
}

#[cfg(test)]
#[path = "stats_tests.rs"]
mod tests;

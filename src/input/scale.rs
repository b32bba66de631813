// Scale - min-max normalisation into the model's value domain
//
// value -> (value - min) / (max - min), clamped to [0, 1], then quantised to
// u8 / u16 / f32 by the model precision. A degenerate range (max <= min) maps
// every value to 0.

use crate::error::SetupError;
use crate::model::Quantum;
use serde::{Deserialize, Serialize};

/// Per-entry min/max pairs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScaleTable {
    pub min: Vec<f32>,
    pub max: Vec<f32>,
}

impl ScaleTable {
    pub fn new(min: Vec<f32>, max: Vec<f32>) -> Self {
        Self { min, max }
    }

    pub fn len(&self) -> usize {
        self.min.len()
    }

    pub fn is_empty(&self) -> bool {
        self.min.is_empty()
    }

    /// Check that both columns have `expected` entries
    pub fn validate(&self, table: &'static str, expected: usize) -> Result<(), SetupError> {
        for actual in [self.min.len(), self.max.len()] {
            if actual != expected {
                return Err(SetupError::TableLength {
                    table,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Scale one value with entry `index`
    pub fn scale<Q: Quantum>(&self, index: usize, value: f64) -> Q {
        scale_value(value, self.min[index] as f64, self.max[index] as f64)
    }
}

/// Min-max scale a single value
pub fn scale_value<Q: Quantum>(value: f64, min: f64, max: f64) -> Q {
    if max <= min {
        return Q::from_unit(0.0);
    }
    Q::from_unit((value - min) / (max - min))
}

/// Inverse of `scale_value` for a dequantised ratio
pub fn descale_value(unit: f32, min: f32, max: f32) -> f32 {
    min + unit * (max - min)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_clamps_to_domain() {
        assert_eq!(scale_value::<u8>(-5.0, 0.0, 10.0), 0);
        assert_eq!(scale_value::<u8>(15.0, 0.0, 10.0), 255);
        assert_eq!(scale_value::<u8>(5.0, 0.0, 10.0), 128);
        assert_eq!(scale_value::<u16>(10.0, 0.0, 10.0), 65535);
        assert_eq!(scale_value::<f32>(2.5, 0.0, 10.0), 0.25);
    }

    #[test]
    fn test_degenerate_range_maps_to_zero() {
        assert_eq!(scale_value::<u8>(3.0, 3.0, 3.0), 0);
        assert_eq!(scale_value::<f32>(1.0, 5.0, 2.0), 0.0);
    }

    #[test]
    fn test_descale_inverts_scale() {
        let scaled: f32 = scale_value(7.5, -10.0, 30.0);
        assert!((descale_value(scaled, -10.0, 30.0) - 7.5).abs() < 1e-5);
    }

    #[test]
    fn test_table_validation() {
        let table = ScaleTable::new(vec![0.0; 3], vec![1.0; 2]);
        assert!(matches!(
            table.validate("input_scale", 3),
            Err(SetupError::TableLength { actual: 2, .. })
        ));
        let table = ScaleTable::new(vec![0.0; 2], vec![1.0; 2]);
        assert!(table.validate("input_scale", 2).is_ok());
        assert_eq!(table.scale::<u8>(1, 1.0), 255);
    }
}

#[cfg(feature = "serde")]
use serde::Deserialize;

use crate::error::FilterError;
use crate::filter;
use crate::grid::PixelGrid;

/// A single filter step.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "lowercase"))]
pub enum FilterSpec {
    Mean { kernel_size: usize },
    Gaussian { kernel_size: usize, sigma: f64 },
    Unsharp { kernel_size: usize, amount: f64 },
}

impl FilterSpec {
    /// Run this step on `grid` in place.
    pub fn apply(&self, grid: &mut PixelGrid) -> Result<(), FilterError> {
        match *self {
            FilterSpec::Mean { kernel_size } => filter::mean_filter(grid, kernel_size),
            FilterSpec::Gaussian { kernel_size, sigma } => {
                filter::gaussian_smoothing(grid, kernel_size, sigma)
            }
            FilterSpec::Unsharp {
                kernel_size,
                amount,
            } => filter::unsharp_mask(grid, kernel_size, amount),
        }
    }
}

/// An ordered list of filter steps, typically read from TOML:
///
/// ```toml
/// [[filters]]
/// type = "gaussian"
/// kernel_size = 5
/// sigma = 1.4
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub struct Pipeline {
    #[cfg_attr(feature = "serde", serde(default))]
    pub filters: Vec<FilterSpec>,
}

impl Pipeline {
    pub fn new(filters: Vec<FilterSpec>) -> Self {
        Self { filters }
    }

    /// Parse a pipeline from a TOML string.
    #[cfg(feature = "serde")]
    pub fn from_toml(toml_str: &str) -> Result<Pipeline, FilterError> {
        toml::from_str(toml_str).map_err(|e| FilterError::Config(e.to_string()))
    }

    /// Apply each step in order. Stops at the first failing step, leaving
    /// the earlier steps applied.
    pub fn apply(&self, grid: &mut PixelGrid) -> Result<(), FilterError> {
        for step in &self.filters {
            step.apply(grid)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_dispatches_to_mean() {
        let mut grid = PixelGrid::from_buf(1, 1, vec![100]).unwrap();
        FilterSpec::Mean { kernel_size: 3 }.apply(&mut grid).unwrap();
        assert_eq!(grid.get(0, 0), 11);
    }

    #[test]
    fn pipeline_applies_in_order() {
        let mut grid = PixelGrid::from_buf(1, 1, vec![100]).unwrap();
        let pipeline = Pipeline::new(vec![
            FilterSpec::Mean { kernel_size: 3 },
            FilterSpec::Mean { kernel_size: 3 },
        ]);
        pipeline.apply(&mut grid).unwrap();
        // 100 / 9 = 11, then 11 / 9 = 1
        assert_eq!(grid.get(0, 0), 1);
    }

    #[test]
    fn pipeline_propagates_step_error() {
        let mut grid = PixelGrid::new(2, 2);
        let pipeline = Pipeline::new(vec![FilterSpec::Gaussian {
            kernel_size: 3,
            sigma: 0.0,
        }]);
        assert_eq!(pipeline.apply(&mut grid), Err(FilterError::InvalidSigma(0.0)));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn from_toml_parses_all_kinds() {
        let pipeline = Pipeline::from_toml(
            r#"
            [[filters]]
            type = "mean"
            kernel_size = 3

            [[filters]]
            type = "gaussian"
            kernel_size = 5
            sigma = 1.4

            [[filters]]
            type = "unsharp"
            kernel_size = 5
            amount = 1.5
            "#,
        )
        .unwrap();
        assert_eq!(
            pipeline.filters,
            vec![
                FilterSpec::Mean { kernel_size: 3 },
                FilterSpec::Gaussian {
                    kernel_size: 5,
                    sigma: 1.4
                },
                FilterSpec::Unsharp {
                    kernel_size: 5,
                    amount: 1.5
                },
            ]
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn from_toml_rejects_unknown_type() {
        let err = Pipeline::from_toml("[[filters]]\ntype = \"median\"\nkernel_size = 3\n").unwrap_err();
        assert!(matches!(err, FilterError::Config(_)));
    }
}

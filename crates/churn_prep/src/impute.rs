//! Numeric coercion with mean imputation
//!
//! Values that do not parse as finite numbers become missing and are filled
//! with the mean of the values that did parse. The fill value is rounded to
//! [`FILL_DECIMALS`] decimal places; parsed values are kept unchanged.

use serde::Serialize;

use crate::config::ImputationFallback;
use crate::errors::DataQualityError;

/// Decimal places kept in an imputed mean.
pub const FILL_DECIMALS: i32 = 6;

/// Parse a cell as a finite number; blank and non-numeric text yield `None`.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Round half away from zero to [`FILL_DECIMALS`] places.
pub fn round_fill(value: f64) -> f64 {
    let factor = 10f64.powi(FILL_DECIMALS);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / factor
}

/// Arithmetic mean, or `None` for no values. Falls back to a running mean
/// when the plain sum overflows.
fn mean<I>(values: I) -> Option<f64>
where
    I: Iterator<Item = f64> + Clone,
{
    let (sum, count) = values
        .clone()
        .fold((0.0f64, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        return None;
    }
    let plain = sum / count as f64;
    if plain.is_finite() {
        return Some(plain);
    }
    let running = values
        .enumerate()
        .fold(0.0f64, |mean, (i, v)| mean + (v - mean) / (i + 1) as f64);
    Some(running)
}

/// Outcome of coercing one column.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Imputation {
    pub column: String,
    pub values: Vec<f64>,
    pub fill_value: f64,
    /// Row positions that received `fill_value`.
    pub imputed_rows: Vec<usize>,
}

impl Imputation {
    pub fn imputed_count(&self) -> usize {
        self.imputed_rows.len()
    }
}

/// Coerce a column to numbers and fill the gaps with the column mean.
pub fn coerce_and_fill<'a, I>(
    column: &str,
    values: I,
    fallback: ImputationFallback,
) -> Result<Imputation, DataQualityError>
where
    I: IntoIterator<Item = &'a str>,
{
    let parsed: Vec<Option<f64>> = values.into_iter().map(parse_numeric).collect();

    let fill_value = if let Some(mean) = mean(parsed.iter().flatten().copied()) {
        round_fill(mean)
    } else {
        match fallback {
            ImputationFallback::Reject => {
                return Err(DataQualityError::NoNumericValues {
                    column: column.to_string(),
                })
            }
            ImputationFallback::Constant(value) => {
                tracing::warn!(
                    column,
                    fill_value = value,
                    "No numeric values found, filling with configured constant"
                );
                value
            }
        }
    };

    let mut imputed_rows = Vec::new();
    let values = parsed
        .iter()
        .enumerate()
        .map(|(row, &value)| {
            value.unwrap_or_else(|| {
                imputed_rows.push(row);
                fill_value
            })
        })
        .collect();

    Ok(Imputation {
        column: column.to_string(),
        values,
        fill_value,
        imputed_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numeric() {
        assert_eq!(parse_numeric("29.85"), Some(29.85));
        assert_eq!(parse_numeric(" 7 "), Some(7.0));
        assert_eq!(parse_numeric("1e3"), Some(1000.0));
        assert_eq!(parse_numeric(""), None);
        assert_eq!(parse_numeric("   "), None);
        assert_eq!(parse_numeric("abc"), None);
        assert_eq!(parse_numeric("NaN"), None);
        assert_eq!(parse_numeric("inf"), None);
    }

    #[test]
    fn test_non_numeric_value_takes_mean_of_others() {
        let result =
            coerce_and_fill("TotalCharges", ["10.5", "abc", "20.5"], ImputationFallback::Reject)
                .unwrap();
        assert_eq!(result.values, vec![10.5, 15.5, 20.5]);
        assert_eq!(result.fill_value, 15.5);
        assert_eq!(result.imputed_rows, vec![1]);
    }

    #[test]
    fn test_blank_value_mean_is_rounded() {
        let result =
            coerce_and_fill("TotalCharges", ["29.85", "", "56.95"], ImputationFallback::Reject)
                .unwrap();
        assert_eq!(result.fill_value, 43.4);
        assert_eq!(result.values[1].to_string(), "43.4");
    }

    #[test]
    fn test_mean_rounds_to_six_places() {
        let result = coerce_and_fill("x", ["1", "1", "2", ""], ImputationFallback::Reject).unwrap();
        assert_eq!(result.fill_value, 1.333333);
    }

    #[test]
    fn test_all_non_numeric_rejected_by_default() {
        let err = coerce_and_fill("TotalCharges", [" ", "abc"], ImputationFallback::Reject)
            .unwrap_err();
        assert_eq!(
            err,
            DataQualityError::NoNumericValues {
                column: "TotalCharges".to_string()
            }
        );
    }

    #[test]
    fn test_all_non_numeric_with_constant_fallback() {
        let result =
            coerce_and_fill("TotalCharges", ["", "n/a"], ImputationFallback::Constant(0.0))
                .unwrap();
        assert_eq!(result.values, vec![0.0, 0.0]);
        assert_eq!(result.imputed_count(), 2);
    }

    #[test]
    fn test_mean_of_huge_values_stays_finite() {
        let result =
            coerce_and_fill("x", ["1e308", "1e308", "", "1e308"], ImputationFallback::Reject)
                .unwrap();
        assert!(result.fill_value.is_finite());
        assert_eq!(result.fill_value, 1e308);
        assert_eq!(result.values[2], 1e308);
    }

    #[test]
    fn test_clean_column_is_untouched() {
        let result = coerce_and_fill("x", ["0.1", "0.2"], ImputationFallback::Reject).unwrap();
        assert_eq!(result.values, vec![0.1, 0.2]);
        assert!(result.imputed_rows.is_empty());
    }
}

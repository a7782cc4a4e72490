//! Column access helpers
//!
//! Every pipeline step reads columns either as numbers (`Option<f64>`) or as
//! category labels (`Option<String>`). Both conversions live here so that
//! validation messages stay consistent across raking, statistics and cleaning.

use polars::prelude::*;

use super::error::{Result, SurveyError};

/// Names of all columns in the frame, in order
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|s| s.to_string()).collect()
}

/// Look up a column, failing with `InvalidInput` when it does not exist.
///
/// `role` names the column's purpose in the error message ("weight",
/// "raking variable", ...).
pub fn require_column<'a>(df: &'a DataFrame, name: &str, role: &str) -> Result<&'a Column> {
    df.column(name).map_err(|_| {
        SurveyError::invalid(format!(
            "{} column '{}' not found. Available columns: {:?}",
            role,
            name,
            column_names(df)
        ))
    })
}

/// Read a numeric column as `f64` values, nulls preserved as `None`.
///
/// Non-numeric columns are rejected rather than parsed.
pub fn numeric_values(df: &DataFrame, name: &str, role: &str) -> Result<Vec<Option<f64>>> {
    let column = require_column(df, name, role)?;

    if !column.dtype().is_primitive_numeric() {
        return Err(SurveyError::invalid(format!(
            "{} column '{}' must be numeric, found {}",
            role,
            name,
            column.dtype()
        )));
    }

    let float_col = column.cast(&DataType::Float64)?;
    Ok(float_col.f64()?.into_iter().collect())
}

/// Read any column as category labels.
///
/// Numbers are rendered with `{}` so that `1` and `1.0` both become `"1"`.
pub fn category_values(df: &DataFrame, name: &str, role: &str) -> Result<Vec<Option<String>>> {
    let column = require_column(df, name, role)?;
    column_to_strings(column)
}

pub(crate) fn column_to_strings(col: &Column) -> Result<Vec<Option<String>>> {
    let values: Vec<Option<String>> = match col.dtype() {
        DataType::String => col
            .str()?
            .into_iter()
            .map(|v| v.map(|s| s.to_string()))
            .collect(),
        DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 => {
            let cast = col.cast(&DataType::Int64)?;
            cast.i64()?
                .into_iter()
                .map(|v| v.map(|n| n.to_string()))
                .collect()
        }
        DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 => {
            let cast = col.cast(&DataType::UInt64)?;
            cast.u64()?
                .into_iter()
                .map(|v| v.map(|n| n.to_string()))
                .collect()
        }
        DataType::Float32 | DataType::Float64 => {
            let cast = col.cast(&DataType::Float64)?;
            cast.f64()?
                .into_iter()
                .map(|v| v.map(|n| format!("{}", n)))
                .collect()
        }
        DataType::Boolean => col
            .bool()?
            .into_iter()
            .map(|v| v.map(|b| b.to_string()))
            .collect(),
        _ => {
            let cast = col.cast(&DataType::String)?;
            cast.str()?
                .into_iter()
                .map(|v| v.map(|s| s.to_string()))
                .collect()
        }
    };

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_values_casts_integers() {
        let df = df! {
            "age" => [Some(30i64), None, Some(45)],
        }
        .unwrap();

        let values = numeric_values(&df, "age", "analysis").unwrap();
        assert_eq!(values, vec![Some(30.0), None, Some(45.0)]);
    }

    #[test]
    fn test_numeric_values_rejects_strings() {
        let df = df! {
            "region" => ["north", "south"],
        }
        .unwrap();

        let err = numeric_values(&df, "region", "weight").unwrap_err();
        assert!(err.is_invalid_input());
        assert!(err.to_string().contains("must be numeric"));
    }

    #[test]
    fn test_missing_column_lists_available() {
        let df = df! {
            "a" => [1.0f64],
        }
        .unwrap();

        let err = require_column(&df, "b", "raking variable").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("raking variable column 'b' not found"));
        assert!(message.contains("\"a\""));
    }

    #[test]
    fn test_category_values_render_numbers() {
        let df = df! {
            "code" => [1i32, 2, 1],
            "score" => [1.0f64, 2.5, 3.0],
            "flag" => [true, false, true],
        }
        .unwrap();

        assert_eq!(
            category_values(&df, "code", "category").unwrap(),
            vec![Some("1".to_string()), Some("2".to_string()), Some("1".to_string())]
        );
        assert_eq!(
            category_values(&df, "score", "category").unwrap(),
            vec![Some("1".to_string()), Some("2.5".to_string()), Some("3".to_string())]
        );
        assert_eq!(
            category_values(&df, "flag", "category").unwrap()[1],
            Some("false".to_string())
        );
    }
}

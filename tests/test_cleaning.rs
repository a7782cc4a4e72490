//! Integration tests for record cleaning

use polars::prelude::*;
use svykit::pipeline::{
    category_values, impute_missing, load_category_mappings, numeric_values, remove_duplicates,
    standardize_categories, CategoryMapping, ImputeStrategy,
};
use tempfile::TempDir;

#[path = "common/mod.rs"]
mod common;

fn responses() -> DataFrame {
    df! {
        "respondent" => [1i32, 2, 2, 3, 4],
        "region" => [Some(" north"), Some("South"), Some("South"), None, Some("N")],
        "age" => [Some(30i64), Some(40), Some(40), None, Some(40)],
        "income" => [Some(10.0f64), None, None, Some(30.0), Some(50.0)],
    }
    .unwrap()
}

#[test]
fn test_remove_duplicates_all_columns() {
    let df = responses();

    let (deduped, removed) = remove_duplicates(&df, None).unwrap();

    assert_eq!(removed, 1);
    assert_eq!(deduped.height(), 4);
    assert_eq!(
        numeric_values(&deduped, "respondent", "id").unwrap(),
        vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)]
    );
}

#[test]
fn test_remove_duplicates_on_subset_keeps_first() {
    let df = responses();
    let subset = vec!["age".to_string()];

    let (deduped, removed) = remove_duplicates(&df, Some(&subset)).unwrap();

    // age: 30, 40, 40, null, 40 -> the second and third 40 go
    assert_eq!(removed, 2);
    assert_eq!(
        numeric_values(&deduped, "respondent", "id").unwrap(),
        vec![Some(1.0), Some(2.0), Some(3.0)]
    );
}

#[test]
fn test_remove_duplicates_rejects_bad_subset() {
    let df = responses();

    assert!(remove_duplicates(&df, Some(&[])).is_err());
    assert!(remove_duplicates(&df, Some(&["nope".to_string()])).is_err());
}

#[test]
fn test_impute_mean_and_median() {
    let df = responses();

    let mean = impute_missing(&df, "income", ImputeStrategy::Mean).unwrap();
    assert_eq!(
        numeric_values(&mean, "income", "x").unwrap(),
        vec![Some(10.0), Some(30.0), Some(30.0), Some(30.0), Some(50.0)]
    );

    let median = impute_missing(&df, "age", ImputeStrategy::Median).unwrap();
    assert_eq!(median.column("age").unwrap().dtype(), &DataType::Float64);
    assert_eq!(numeric_values(&median, "age", "x").unwrap()[3], Some(40.0));

    // Input untouched
    assert_eq!(df.column("income").unwrap().null_count(), 2);
}

#[test]
fn test_impute_numeric_mode_keeps_dtype() {
    let df = responses();

    let imputed = impute_missing(&df, "age", ImputeStrategy::Mode).unwrap();

    assert_eq!(imputed.column("age").unwrap().dtype(), &DataType::Int64);
    assert_eq!(imputed.column("age").unwrap().null_count(), 0);
    assert_eq!(numeric_values(&imputed, "age", "x").unwrap()[3], Some(40.0));
}

#[test]
fn test_impute_label_mode() {
    let df = responses();

    let imputed = impute_missing(&df, "region", ImputeStrategy::Mode).unwrap();

    assert_eq!(
        category_values(&imputed, "region", "x").unwrap()[3],
        Some("South".to_string())
    );
}

#[test]
fn test_impute_mean_rejects_text_and_empty_columns() {
    let df = responses();
    assert!(impute_missing(&df, "region", ImputeStrategy::Mean).is_err());

    let empty = df! { "x" => [None::<f64>, None] }.unwrap();
    let err = impute_missing(&empty, "x", ImputeStrategy::Median).unwrap_err();
    assert!(err.to_string().contains("no observed values"));
}

#[test]
fn test_standardize_categories() {
    let df = responses();
    let mapping = CategoryMapping::new("region", [("north", "North"), ("N", "North")]);

    let cleaned = standardize_categories(&df, &mapping).unwrap();

    assert_eq!(
        category_values(&cleaned, "region", "x").unwrap(),
        vec![
            Some("North".to_string()),
            Some("South".to_string()),
            Some("South".to_string()),
            None,
            Some("North".to_string()),
        ]
    );
}

#[test]
fn test_load_category_mappings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mapping.json");
    std::fs::write(
        &path,
        r#"[{"column": "region", "mapping": {"N": "North", "S": "South"}}]"#,
    )
    .unwrap();

    let mappings = load_category_mappings(&path).unwrap();

    assert_eq!(mappings.len(), 1);
    assert_eq!(mappings[0].mapping["S"], "South");
}

#[test]
fn test_load_category_mappings_bad_json() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mapping.json");
    std::fs::write(&path, "{not json").unwrap();

    assert!(load_category_mappings(&path).is_err());
}

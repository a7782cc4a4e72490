//! Integration tests for frequency tables and cross tabulations

use approx::assert_abs_diff_eq;
use polars::prelude::*;
use svykit::pipeline::{cross_tab, frequency_table};

#[path = "common/mod.rs"]
mod common;

use common::create_survey_dataframe;

#[test]
fn test_unweighted_frequency_table() {
    let df = create_survey_dataframe();

    let table = frequency_table(&df, "education", None).unwrap();

    assert!(!table.weighted);
    assert_eq!(table.total, 5.0);
    let levels: Vec<&str> = table.rows.iter().map(|r| r.level.as_str()).collect();
    assert_eq!(levels, vec!["Bachelor", "Graduate", "HighSchool"]);
    assert_eq!(table.value("Graduate"), Some(1.0));
    assert_abs_diff_eq!(table.rows[0].proportion, 0.4, epsilon = 1e-12);
}

#[test]
fn test_weighted_frequency_table() {
    let df = df! {
        "region" => [Some("North"), Some("South"), Some("North"), None],
        "weight" => [1.5f64, 2.0, 0.5, 10.0],
    }
    .unwrap();

    let table = frequency_table(&df, "region", Some("weight")).unwrap();

    assert!(table.weighted);
    assert_eq!(table.value("North"), Some(2.0));
    assert_eq!(table.value("South"), Some(2.0));
    assert_eq!(table.value("West"), None);
    assert_eq!(table.total, 4.0);
}

#[test]
fn test_numeric_levels_are_labelled() {
    let df = df! { "score" => [1i32, 2, 2, 3] }.unwrap();

    let table = frequency_table(&df, "score", None).unwrap();

    assert_eq!(table.value("2"), Some(2.0));
}

#[test]
fn test_frequency_table_all_null_is_error() {
    let df = df! { "region" => [None::<&str>, None] }.unwrap();

    assert!(frequency_table(&df, "region", None).is_err());
}

#[test]
fn test_unweighted_cross_tab_with_chi_square() {
    // 10 A/x, 20 A/y, 30 B/x, 40 B/y
    let mut rows = Vec::new();
    let mut cols = Vec::new();
    for (r, c, n) in [("A", "x", 10), ("A", "y", 20), ("B", "x", 30), ("B", "y", 40)] {
        for _ in 0..n {
            rows.push(r);
            cols.push(c);
        }
    }
    let df = df! { "group" => rows, "answer" => cols }.unwrap();

    let table = cross_tab(&df, "group", "answer", None).unwrap();

    assert_eq!(table.row_levels, vec!["A", "B"]);
    assert_eq!(table.column_levels, vec!["x", "y"]);
    assert_eq!(table.cell("B", "y"), Some(40.0));
    assert_eq!(table.row_totals, vec![30.0, 70.0]);
    assert_eq!(table.column_totals, vec![40.0, 60.0]);
    assert_eq!(table.grand_total, 100.0);

    let test = table.chi_square.unwrap();
    assert_eq!(test.degrees_of_freedom, 1);
    assert_abs_diff_eq!(test.statistic, 0.7936508, epsilon = 1e-6);
    assert!(test.p_value > 0.37 && test.p_value < 0.38);
}

#[test]
fn test_weighted_cross_tab_has_no_chi_square() {
    let df = create_survey_dataframe();

    let table = cross_tab(&df, "gender", "education", Some("weight")).unwrap();

    assert!(table.weighted);
    assert!(table.chi_square.is_none());
    assert_eq!(table.cell("Male", "Graduate"), Some(0.0));
    assert_eq!(table.cell("Female", "Graduate"), Some(1.0));
}

#[test]
fn test_single_level_cross_tab_has_no_chi_square() {
    let df = df! {
        "group" => ["A", "A", "A"],
        "answer" => ["x", "y", "x"],
    }
    .unwrap();

    let table = cross_tab(&df, "group", "answer", None).unwrap();

    assert!(table.chi_square.is_none());
    assert_eq!(table.cell("A", "x"), Some(2.0));
}

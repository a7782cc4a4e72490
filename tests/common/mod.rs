//! Shared test utilities and fixture generators
#![allow(dead_code)]

use polars::prelude::*;
use std::path::{Path, PathBuf};
use svykit::pipeline::{weighted_margin_totals, RakingMargin};

/// Five respondents with unit weights.
///
/// Gender counts are 2 Male / 3 Female and education counts are
/// 2 HighSchool / 2 Bachelor / 1 Graduate, so raking to
/// `gender = {Male: 3, Female: 2}` has to move weight between rows.
pub fn create_survey_dataframe() -> DataFrame {
    df! {
        "id" => [1i32, 2, 3, 4, 5],
        "gender" => ["Male", "Male", "Female", "Female", "Female"],
        "education" => ["HighSchool", "Bachelor", "HighSchool", "Bachelor", "Graduate"],
        "income" => [30.0f64, 55.0, 28.0, 60.0, 90.0],
        "weight" => [1.0f64; 5],
    }
    .unwrap()
}

/// The margins matching [`create_survey_dataframe`]
pub fn survey_margins() -> Vec<RakingMargin> {
    vec![
        RakingMargin::new("gender", [("Male", 3.0), ("Female", 2.0)]),
        RakingMargin::new(
            "education",
            [("HighSchool", 2.0), ("Bachelor", 2.0), ("Graduate", 1.0)],
        ),
    ]
}

/// Sum of `weight_column` over rows where `column == level`
pub fn level_total(df: &DataFrame, column: &str, level: &str, weight_column: &str) -> f64 {
    let levels = df
        .column(column)
        .unwrap()
        .as_materialized_series()
        .str()
        .unwrap()
        .clone();
    let weights = df
        .column(weight_column)
        .unwrap()
        .cast(&DataType::Float64)
        .unwrap();
    let weights = weights.f64().unwrap();

    levels
        .into_iter()
        .zip(weights.into_iter())
        .filter(|(l, _)| *l == Some(level))
        .map(|(_, w)| w.unwrap_or(0.0))
        .sum()
}

/// Assert that every target level present in the data is met within
/// `epsilon * max(target, 1)`
pub fn assert_margins_met(
    df: &DataFrame,
    weight_column: &str,
    margins: &[RakingMargin],
    epsilon: f64,
) {
    for margin in margins {
        let totals = weighted_margin_totals(df, weight_column, &margin.variable).unwrap();
        for (level, target) in &margin.targets {
            let Some(achieved) = totals.get(level) else {
                continue;
            };
            assert!(
                (achieved - target).abs() <= epsilon * target.max(1.0),
                "{}={}: achieved {} vs target {}",
                margin.variable,
                level,
                achieved,
                target
            );
        }
    }
}

/// All values of a Float64 weight column
pub fn weight_values(df: &DataFrame, weight_column: &str) -> Vec<f64> {
    df.column(weight_column)
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .map(|w| w.unwrap())
        .collect()
}

/// Write a DataFrame as CSV into `dir`
pub fn write_csv(dir: &Path, name: &str, df: &mut DataFrame) -> PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();
    path
}

/// Write a DataFrame as Parquet into `dir`
pub fn write_parquet(dir: &Path, name: &str, df: &mut DataFrame) -> PathBuf {
    let path = dir.join(name);
    let file = std::fs::File::create(&path).unwrap();
    ParquetWriter::new(file).finish(df).unwrap();
    path
}

/// Write margins as a targets JSON file into `dir`
pub fn write_targets(dir: &Path, name: &str, margins: &[RakingMargin]) -> PathBuf {
    let path = dir.join(name);
    let json = serde_json::json!({ "margins": margins });
    std::fs::write(&path, serde_json::to_string_pretty(&json).unwrap()).unwrap();
    path
}

/// Larger random survey for stress tests
pub fn create_large_survey(rows: usize, seed: u64) -> DataFrame {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(seed);
    let regions = ["North", "South", "East", "West"];
    let ages = ["18-34", "35-54", "55+"];

    let region: Vec<&str> = (0..rows).map(|_| regions[rng.gen_range(0..4)]).collect();
    let age: Vec<&str> = (0..rows).map(|_| ages[rng.gen_range(0..3)]).collect();
    let weight: Vec<f64> = (0..rows).map(|_| rng.gen_range(0.5..2.0)).collect();

    df! {
        "region" => region,
        "age" => age,
        "weight" => weight,
    }
    .unwrap()
}

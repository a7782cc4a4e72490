//! Terminal summaries for raking runs and weighted statistics

use std::collections::BTreeSet;

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};
use console::style;
use polars::prelude::DataFrame;
use serde::Serialize;

use crate::pipeline::{
    get_weights, total_weight, weighted_margin_totals, CrossTab, FrequencyTable, RakingMargin,
    RakingOutcome, Result, WeightedSummary,
};

/// Achieved vs target total for one level of one raking variable
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarginCheck {
    pub variable: String,
    pub level: String,
    /// `None` for levels observed in the data without a target
    pub target: Option<f64>,
    pub achieved: f64,
}

impl MarginCheck {
    /// `achieved - target`, if there is a target
    pub fn deviation(&self) -> Option<f64> {
        self.target.map(|t| self.achieved - t)
    }
}

/// Summary of one raking run
#[derive(Debug, Clone, Serialize)]
pub struct RakingSummary {
    pub rows: usize,
    pub converged: bool,
    pub iterations: usize,
    pub max_relative_change: Option<f64>,
    pub initial_weight_total: f64,
    pub final_weight_total: f64,
    pub margins: Vec<MarginCheck>,
}

impl RakingSummary {
    /// Compare the raked totals of `outcome` with the margin targets.
    pub fn from_outcome(
        input: &DataFrame,
        outcome: &RakingOutcome,
        weight_column: &str,
        margins: &[RakingMargin],
    ) -> Result<Self> {
        let initial = get_weights(input, Some(weight_column))?;
        let raked = get_weights(&outcome.data, Some(weight_column))?;

        let mut checks = Vec::new();
        for margin in margins {
            let achieved = weighted_margin_totals(&outcome.data, weight_column, &margin.variable)?;
            let levels: BTreeSet<&String> = achieved.keys().chain(margin.targets.keys()).collect();

            for level in levels {
                checks.push(MarginCheck {
                    variable: margin.variable.clone(),
                    level: level.clone(),
                    target: margin.targets.get(level).copied(),
                    achieved: achieved.get(level).copied().unwrap_or(0.0),
                });
            }
        }

        Ok(Self {
            rows: input.height(),
            converged: outcome.converged,
            iterations: outcome.iterations,
            max_relative_change: outcome.max_relative_change,
            initial_weight_total: total_weight(&initial),
            final_weight_total: total_weight(&raked),
            margins: checks,
        })
    }

    /// Largest absolute deviation from a target over all levels
    pub fn max_abs_deviation(&self) -> f64 {
        self.margins
            .iter()
            .filter_map(|m| m.deviation())
            .fold(0.0, |acc, d| acc.max(d.abs()))
    }

    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("📋").cyan(),
            style("RAKING SUMMARY").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        table.add_row(vec![Cell::new("Rows"), Cell::new(self.rows)]);
        table.add_row(vec![
            Cell::new("Converged"),
            Cell::new(if self.converged { "yes" } else { "no" }).fg(if self.converged {
                Color::Green
            } else {
                Color::Red
            }),
        ]);
        table.add_row(vec![Cell::new("Iterations"), Cell::new(self.iterations)]);
        table.add_row(vec![
            Cell::new("Max relative change"),
            Cell::new(
                self.max_relative_change
                    .map(|c| format!("{:.3e}", c))
                    .unwrap_or_else(|| "-".to_string()),
            ),
        ]);
        table.add_row(vec![
            Cell::new("Weight total (before)"),
            Cell::new(format!("{:.4}", self.initial_weight_total)),
        ]);
        table.add_row(vec![
            Cell::new("Weight total (after)"),
            Cell::new(format!("{:.4}", self.final_weight_total))
                .add_attribute(Attribute::Bold),
        ]);

        print_indented(&table);

        if self.margins.is_empty() {
            return;
        }

        println!();
        let mut margins = Table::new();
        margins.load_preset(UTF8_FULL_CONDENSED);
        margins.set_header(vec![
            Cell::new("Variable").add_attribute(Attribute::Bold),
            Cell::new("Level").add_attribute(Attribute::Bold),
            Cell::new("Target").add_attribute(Attribute::Bold),
            Cell::new("Achieved").add_attribute(Attribute::Bold),
            Cell::new("Deviation").add_attribute(Attribute::Bold),
        ]);

        for check in &self.margins {
            let deviation = check.deviation();
            let color = match deviation {
                Some(d) if d.abs() < 1e-6 => Color::Green,
                Some(_) => Color::Yellow,
                None => Color::DarkGrey,
            };
            margins.add_row(vec![
                Cell::new(&check.variable),
                Cell::new(&check.level),
                Cell::new(
                    check
                        .target
                        .map(|t| format!("{:.4}", t))
                        .unwrap_or_else(|| "-".to_string()),
                )
                .set_alignment(CellAlignment::Right),
                Cell::new(format!("{:.4}", check.achieved)).set_alignment(CellAlignment::Right),
                Cell::new(
                    deviation
                        .map(|d| format!("{:+.2e}", d))
                        .unwrap_or_else(|| "-".to_string()),
                )
                .fg(color)
                .set_alignment(CellAlignment::Right),
            ]);
        }

        print_indented(&margins);
    }
}

/// Print weighted summaries of numeric columns
pub fn display_weighted_summaries(summaries: &[WeightedSummary], weight_column: &str) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Column").add_attribute(Attribute::Bold),
        Cell::new("Complete").add_attribute(Attribute::Bold),
        Cell::new(format!("Σ {}", weight_column)).add_attribute(Attribute::Bold),
        Cell::new("Weighted mean").add_attribute(Attribute::Bold),
        Cell::new("Weighted total").add_attribute(Attribute::Bold),
    ]);

    for s in summaries {
        table.add_row(vec![
            Cell::new(&s.column),
            Cell::new(s.complete_cases).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.4}", s.weight_sum)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.4}", s.mean))
                .fg(Color::Cyan)
                .set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.4}", s.total)).set_alignment(CellAlignment::Right),
        ]);
    }

    print_indented(&table);
}

/// Print a frequency table
pub fn display_frequency_table(table_data: &FrequencyTable) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new(&table_data.column).add_attribute(Attribute::Bold),
        Cell::new(if table_data.weighted { "Weighted" } else { "Count" })
            .add_attribute(Attribute::Bold),
        Cell::new("Percent").add_attribute(Attribute::Bold),
    ]);

    for row in &table_data.rows {
        table.add_row(vec![
            Cell::new(&row.level),
            Cell::new(format_value(row.value, table_data.weighted))
                .set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.1}%", row.proportion * 100.0))
                .set_alignment(CellAlignment::Right),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total").add_attribute(Attribute::Bold),
        Cell::new(format_value(table_data.total, table_data.weighted))
            .add_attribute(Attribute::Bold)
            .set_alignment(CellAlignment::Right),
        Cell::new("100.0%").set_alignment(CellAlignment::Right),
    ]);

    print_indented(&table);
}

/// Print a cross tabulation and its chi-square test
pub fn display_cross_tab(crosstab: &CrossTab) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);

    let mut header = vec![Cell::new(format!(
        "{} \\ {}",
        crosstab.row_variable, crosstab.column_variable
    ))
    .add_attribute(Attribute::Bold)];
    header.extend(
        crosstab
            .column_levels
            .iter()
            .map(|l| Cell::new(l).add_attribute(Attribute::Bold)),
    );
    header.push(Cell::new("Total").add_attribute(Attribute::Bold));
    table.set_header(header);

    for (i, level) in crosstab.row_levels.iter().enumerate() {
        let mut row = vec![Cell::new(level)];
        row.extend(crosstab.cells[i].iter().map(|&v| {
            Cell::new(format_value(v, crosstab.weighted)).set_alignment(CellAlignment::Right)
        }));
        row.push(
            Cell::new(format_value(crosstab.row_totals[i], crosstab.weighted))
                .add_attribute(Attribute::Bold)
                .set_alignment(CellAlignment::Right),
        );
        table.add_row(row);
    }

    let mut totals = vec![Cell::new("Total").add_attribute(Attribute::Bold)];
    totals.extend(crosstab.column_totals.iter().map(|&v| {
        Cell::new(format_value(v, crosstab.weighted))
            .add_attribute(Attribute::Bold)
            .set_alignment(CellAlignment::Right)
    }));
    totals.push(
        Cell::new(format_value(crosstab.grand_total, crosstab.weighted))
            .add_attribute(Attribute::Bold)
            .set_alignment(CellAlignment::Right),
    );
    table.add_row(totals);

    print_indented(&table);

    match &crosstab.chi_square {
        Some(test) => println!(
            "\n    χ² = {:.4}, df = {}, p = {:.4}",
            style(test.statistic).yellow(),
            test.degrees_of_freedom,
            style(test.p_value).yellow().bold()
        ),
        None if crosstab.weighted => println!(
            "\n    {}",
            style("Chi-square test not available for weighted tables").dim()
        ),
        None => println!(
            "\n    {}",
            style("Chi-square test needs at least two levels per variable").dim()
        ),
    }
}

fn format_value(value: f64, weighted: bool) -> String {
    if weighted {
        format!("{:.2}", value)
    } else {
        format!("{}", value as u64)
    }
}

fn print_indented(table: &Table) {
    for line in table.to_string().lines() {
        println!("    {}", line);
    }
}

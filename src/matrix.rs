use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use tracing::debug;

use crate::error::{Error, Result};
use crate::labels::LabelIndex;
use crate::result::{Cell, MatrixResult};

/// The types of confusion matrices that can be generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatrixType {
    /// Raw (weighted) counts.
    #[default]
    Counts,
    /// Every cell divided by the grand total.
    Percentages,
    /// Every cell divided by the total of its row.
    PercentagesPerRow,
}

impl MatrixType {
    const TAGS: &'static str = "counts, percentages, percentages_per_row";
}

impl FromStr for MatrixType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "counts" => Ok(Self::Counts),
            "percentages" => Ok(Self::Percentages),
            "percentages_per_row" => Ok(Self::PercentagesPerRow),
            _ => Err(Error::UnrecognizedValue {
                kind: "matrix type",
                value: s.to_string(),
                expected: Self::TAGS,
            }),
        }
    }
}

impl fmt::Display for MatrixType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Counts => "counts",
            Self::Percentages => "percentages",
            Self::PercentagesPerRow => "percentages_per_row",
        })
    }
}

/// Generates confusion matrices from parallel actual/predicted labels and optional weights.
#[derive(Debug, Clone)]
pub struct ConfusionMatrix {
    actual: Vec<String>,
    predicted: Vec<String>,
    /// Per-observation weights, every observation counts as 1 when absent.
    weight: Option<Vec<f64>>,
    labels: LabelIndex,
    actual_prefix: String,
    predicted_prefix: String,
    /// Text of the top-left header cell.
    corner: String,
}

impl ConfusionMatrix {
    pub fn new(
        actual: Vec<String>,
        predicted: Vec<String>,
        weight: Option<Vec<f64>>,
    ) -> Result<Self> {
        if actual.len() != predicted.len() {
            return Err(Error::length_mismatch(
                "Actual and predicted labels",
                actual.len(),
                predicted.len(),
            ));
        }
        if let Some(weight) = &weight {
            if weight.len() != predicted.len() {
                return Err(Error::length_mismatch(
                    "Weights and predicted labels",
                    weight.len(),
                    predicted.len(),
                ));
            }
        }

        let labels = LabelIndex::derive(&actual, &predicted);
        debug!(labels = labels.len(), observations = actual.len(), "derived label index");

        Ok(Self {
            actual,
            predicted,
            weight,
            labels,
            actual_prefix: "a: ".to_string(),
            predicted_prefix: "p: ".to_string(),
            corner: "x".to_string(),
        })
    }

    /// Replaces the derived labels with a predefined index.
    pub fn with_labels(mut self, labels: LabelIndex) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_actual_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.actual_prefix = prefix.into();
        self
    }

    pub fn with_predicted_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.predicted_prefix = prefix.into();
        self
    }

    pub fn with_corner(mut self, corner: impl Into<String>) -> Self {
        self.corner = corner.into();
        self
    }

    pub fn labels(&self) -> &LabelIndex {
        &self.labels
    }

    /// Generates the matrix. `max_decimals` of `None` renders floats at full precision.
    pub fn generate(
        &self,
        matrix_type: MatrixType,
        max_decimals: Option<usize>,
    ) -> Result<MatrixResult> {
        let mut grid = self.empty_grid();
        self.tally(&mut grid)?;

        match matrix_type {
            MatrixType::Counts => {}
            MatrixType::Percentages => normalize_total(&mut grid),
            MatrixType::PercentagesPerRow => normalize_rows(&mut grid)?,
        }

        Ok(MatrixResult::new(grid, max_decimals))
    }

    /// Header row and header column around an all-zero interior.
    fn empty_grid(&self) -> Vec<Vec<Cell>> {
        let n = self.labels.len();
        let header: Vec<Cell> = std::iter::once(Cell::text(&self.corner))
            .chain(
                self.labels
                    .iter()
                    .map(|l| Cell::text(format!("{}{}", self.predicted_prefix, l))),
            )
            .collect();

        std::iter::once(header)
            .chain(self.labels.iter().map(|l| {
                std::iter::once(Cell::text(format!("{}{}", self.actual_prefix, l)))
                    .chain(std::iter::repeat(Cell::Count(0)).take(n))
                    .collect::<Vec<_>>()
            }))
            .collect()
    }

    fn tally(&self, grid: &mut [Vec<Cell>]) -> Result<()> {
        for (i, (act, pred)) in self.actual.iter().zip(self.predicted.iter()).enumerate() {
            let row = self.labels.require("actual", act)?;
            let col = self.labels.require("predicted", pred)?;
            let weight = self.weight.as_ref().map_or(1.0, |w| w[i]);
            grid[row][col].add(weight);
        }

        debug!(
            observations = self.actual.len(),
            total = interior(grid).map(Cell::value).sum::<f64>(),
            "tallied observations"
        );
        Ok(())
    }
}

/// The numeric cells, skipping the header row and column.
fn interior(grid: &[Vec<Cell>]) -> impl Iterator<Item = &Cell> {
    grid.iter().skip(1).flat_map(|row| row.iter().skip(1))
}

fn normalize_total(grid: &mut [Vec<Cell>]) {
    let total: f64 = interior(grid).map(Cell::value).sum();
    if total > 0.0 {
        grid.iter_mut()
            .skip(1)
            .flat_map(|row| row.iter_mut().skip(1))
            .for_each(|cell| cell.divide(total));
    }
}

/// Divides every row by its own total. Unlike the grand total, an empty row is an error.
fn normalize_rows(grid: &mut [Vec<Cell>]) -> Result<()> {
    for row in grid.iter_mut().skip(1) {
        let total: f64 = row.iter().skip(1).map(Cell::value).sum();
        if total == 0.0 {
            return Err(Error::DivisionByZero {
                row: row[0].to_string(),
            });
        }
        row.iter_mut().skip(1).for_each(|cell| cell.divide(total));
    }
    Ok(())
}

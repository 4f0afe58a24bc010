use serde::Serialize;
use std::{fmt, io::Write};

use crate::error::{Error, Result};

/// A single cell of the matrix grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    /// Header text (corner and prefixed labels).
    Text(String),
    /// An exact count, kept while every added weight is integral.
    Count(i64),
    Value(f64),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// The numeric value of the cell, header text counts as 0.
    pub fn value(&self) -> f64 {
        match *self {
            Cell::Text(_) => 0.0,
            Cell::Count(c) => c as f64,
            Cell::Value(v) => v,
        }
    }

    pub(crate) fn add(&mut self, weight: f64) {
        let exact = match *self {
            Cell::Count(c) if weight.fract() == 0.0 && weight.abs() < i64::MAX as f64 => {
                c.checked_add(weight as i64)
            }
            _ => None,
        };
        *self = match exact {
            Some(count) => Cell::Count(count),
            // Fractional weights, or counts past the i64 range.
            None => Cell::Value(self.value() + weight),
        };
    }

    pub(crate) fn divide(&mut self, total: f64) {
        *self = Cell::Value(self.value() / total);
    }

    /// Renders the cell, fixing floats to `max_decimals` digits when set.
    pub fn format(&self, max_decimals: Option<usize>) -> String {
        match (self, max_decimals) {
            (Cell::Value(v), Some(decimals)) => format!("{v:.decimals$}"),
            _ => self.to_string(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(t) => f.write_str(t),
            Cell::Count(c) => write!(f, "{c}"),
            Cell::Value(v) => write_float(f, *v),
        }
    }
}

/// Shortest round-trip form, switching to `1e-05`/`1e+20` style outside [1e-4, 1e16).
/// Integral floats keep a fractional part, so 1.0 does not read as a count.
fn write_float(f: &mut fmt::Formatter<'_>, v: f64) -> fmt::Result {
    let magnitude = v.abs();
    if v.is_finite() && v != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let scientific = format!("{v:e}");
        let (mantissa, exponent) = scientific.split_once('e').unwrap_or((&scientific, "0"));
        let exponent: i32 = exponent.parse().unwrap_or(0);
        let sign = if exponent < 0 { '-' } else { '+' };
        write!(f, "{mantissa}e{sign}{:02}", exponent.unsigned_abs())
    } else if v.is_finite() && v.fract() == 0.0 {
        write!(f, "{v:.1}")
    } else {
        write!(f, "{v}")
    }
}

/// Delimited-text settings shared by the reader and the CSV serializer.
#[derive(Debug, Clone, Copy)]
pub struct Dialect {
    pub delimiter: u8,
    pub quote: u8,
    pub quoting: csv::QuoteStyle,
}

impl Dialect {
    /// Builds a dialect from single-character delimiter and quote settings.
    /// Fields are quoted only when needed.
    pub fn new(delimiter: char, quote: char) -> Result<Self> {
        Ok(Self {
            delimiter: single_byte("delimiter", delimiter)?,
            quote: single_byte("quote character", quote)?,
            quoting: csv::QuoteStyle::Necessary,
        })
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            quoting: csv::QuoteStyle::Necessary,
        }
    }
}

fn single_byte(what: &'static str, c: char) -> Result<u8> {
    u8::try_from(c)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| Error::InvalidDialect {
            what,
            value: c.to_string(),
        })
}

/// A generated confusion matrix, ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixResult {
    /// Row-major grid, row 0 and column 0 hold the headers.
    grid: Vec<Vec<Cell>>,
    /// Digits after the decimal point for float cells, `None` for full precision.
    max_decimals: Option<usize>,
}

impl MatrixResult {
    pub fn new(grid: Vec<Vec<Cell>>, max_decimals: Option<usize>) -> Self {
        Self { grid, max_decimals }
    }

    pub fn grid(&self) -> &[Vec<Cell>] {
        &self.grid
    }

    /// Every cell rendered as a string, headers included.
    pub fn to_list(&self) -> Vec<Vec<String>> {
        self.grid
            .iter()
            .map(|row| row.iter().map(|c| c.format(self.max_decimals)).collect())
            .collect()
    }

    /// Writes the rows as delimited text.
    pub fn to_csv<W: Write>(&self, writer: W, dialect: &Dialect) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(dialect.delimiter)
            .quote(dialect.quote)
            .quote_style(dialect.quoting)
            .flexible(true)
            .from_writer(writer);
        for row in self.to_list() {
            writer.write_record(&row)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Returns the rows encoded as delimited text.
    pub fn to_csv_string(&self, dialect: &Dialect) -> Result<String> {
        let mut buffer = Vec::new();
        self.to_csv(&mut buffer, dialect)?;
        String::from_utf8(buffer)
            .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
    }

    /// Renders an aligned table: header row and first column left-justified,
    /// the rest right-justified.
    pub fn to_plaintext(&self) -> String {
        let rows = self.to_list();
        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        let widths: Vec<usize> = (0..columns)
            .map(|col| {
                rows.iter()
                    .filter_map(|row| row.get(col))
                    .map(|cell| cell.chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        rows.iter()
            .enumerate()
            .map(|(r, row)| {
                row.iter()
                    .enumerate()
                    .map(|(c, cell)| {
                        let width = widths[c];
                        if r == 0 || c == 0 {
                            format!("{cell:<width$}")
                        } else {
                            format!("{cell:>width$}")
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for MatrixResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_plaintext())
    }
}

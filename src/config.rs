use serde::{Deserialize, Serialize};
use std::io::Read;

use crate::dataset::Columns;
use crate::error::Result;
use crate::matrix::MatrixType;
use crate::output::OutputFormat;
use crate::result::Dialect;

/// Every option of a matrix generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    /// Column delimiter of the input (and CSV output) file.
    pub delimiter: char,
    pub quotechar: char,
    /// Whether the input file starts with a header row.
    pub header: bool,
    pub output_format: OutputFormat,
    /// 1-based column of the actual labels.
    pub col_actual: usize,
    /// 1-based column of the predicted labels.
    pub col_predicted: usize,
    /// 1-based column of the optional weights.
    pub col_weight: Option<usize>,
    pub prefix_actual: String,
    pub prefix_predicted: String,
    pub corner: String,
    /// Digits after the decimal point for float cells, -1 for no limit.
    pub max_decimals: i32,
    pub matrix_type: MatrixType,
    /// Predefined labels, derived from the data when absent.
    pub labels: Option<Vec<String>>,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            quotechar: '"',
            header: true,
            output_format: OutputFormat::Csv,
            col_actual: 1,
            col_predicted: 2,
            col_weight: None,
            prefix_actual: "a: ".to_string(),
            prefix_predicted: "p: ".to_string(),
            corner: "x".to_string(),
            max_decimals: 3,
            matrix_type: MatrixType::Counts,
            labels: None,
        }
    }
}

impl GenerateConfig {
    /// Loads a config from a JSON file, missing keys keep their defaults.
    pub fn load_from_file(file: &mut dyn Read) -> Result<Self> {
        let mut buffer = String::new();
        file.read_to_string(&mut buffer)?;
        Ok(serde_json::from_str(&buffer)?)
    }

    /// Saves the config as JSON.
    pub fn save_to_file(&self, file: &mut dyn std::io::Write) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self)?;
        file.write_all(serialized.as_bytes())?;
        Ok(())
    }

    pub fn columns(&self) -> Columns {
        Columns {
            actual: self.col_actual,
            predicted: self.col_predicted,
            weight: self.col_weight,
        }
    }

    pub fn dialect(&self) -> Result<Dialect> {
        Dialect::new(self.delimiter, self.quotechar)
    }

    /// A negative `max_decimals` disables fixed formatting.
    pub fn decimals(&self) -> Option<usize> {
        usize::try_from(self.max_decimals).ok()
    }
}

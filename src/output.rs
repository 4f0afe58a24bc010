use serde::{Deserialize, Serialize};
use std::{fmt, fs::File, io::Write, path::Path, str::FromStr};
use tracing::info;

use crate::error::{Error, Result};
use crate::result::{Dialect, MatrixResult};

/// The formats a matrix can be written to a file in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Plaintext,
    Json,
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "plaintext" => Ok(Self::Plaintext),
            "json" => Ok(Self::Json),
            _ => Err(Error::UnhandledFormat(s.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Csv => "csv",
            Self::Plaintext => "plaintext",
            Self::Json => "json",
        })
    }
}

/// Encodes the matrix in the given format.
pub fn write_to(
    result: &MatrixResult,
    writer: &mut dyn Write,
    format: OutputFormat,
    dialect: &Dialect,
) -> Result<()> {
    match format {
        OutputFormat::Csv => result.to_csv(writer, dialect),
        OutputFormat::Plaintext => {
            writer.write_all(result.to_plaintext().as_bytes())?;
            Ok(())
        }
        OutputFormat::Json => {
            writer.write_all(result.to_json()?.as_bytes())?;
            Ok(())
        }
    }
}

/// Prints the plaintext matrix to stdout when no output file is set,
/// otherwise saves it in `format`.
pub fn write(
    result: &MatrixResult,
    output: Option<&Path>,
    format: OutputFormat,
    dialect: &Dialect,
) -> Result<()> {
    match output {
        None => {
            println!("{}", result.to_plaintext());
            Ok(())
        }
        Some(path) => {
            let mut file = File::create(path)?;
            write_to(result, &mut file, format, dialect)?;
            info!(path = %path.display(), %format, "wrote matrix");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::Cell;

    fn result() -> MatrixResult {
        MatrixResult::new(
            vec![
                vec![Cell::text("x"), Cell::text("p: A")],
                vec![Cell::text("a: A"), Cell::Value(0.1234)],
            ],
            Some(2),
        )
    }

    #[test]
    fn output_format_parses_case_insensitively() {
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert_eq!("PlainText".parse::<OutputFormat>().unwrap(), OutputFormat::Plaintext);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!(matches!(
            "xml".parse::<OutputFormat>(),
            Err(Error::UnhandledFormat(ref f)) if f == "xml"
        ));
        assert_eq!(OutputFormat::Plaintext.to_string(), "plaintext");
    }

    #[test]
    fn writes_each_format() {
        let dialect = Dialect::default();
        let encode = |format| {
            let mut buffer = Vec::new();
            write_to(&result(), &mut buffer, format, &dialect).unwrap();
            String::from_utf8(buffer).unwrap()
        };

        assert_eq!(encode(OutputFormat::Csv), "x,p: A\na: A,0.12\n");
        assert_eq!(encode(OutputFormat::Plaintext), "x    p: A\na: A 0.12");
        assert!(encode(OutputFormat::Json).contains("\"max_decimals\": 2"));
    }

    #[test]
    fn writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matrix.txt");

        write(&result(), Some(&path), OutputFormat::Plaintext, &Dialect::default()).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "x    p: A\na: A 0.12");
    }
}

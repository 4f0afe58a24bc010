use parquet::{
    file::{reader::FileReader, serialized_reader::SerializedFileReader},
    record::Field,
};
use std::path::Path;
use tracing::info;

use crate::error::{Error, Result};
use crate::result::Dialect;

/// 1-based column indices of the observation columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Columns {
    pub actual: usize,
    pub predicted: usize,
    pub weight: Option<usize>,
}

impl Columns {
    fn validate(&self) -> Result<()> {
        let weight = self.weight.map(|c| ("weight", c));
        for (role, column) in [("actual", self.actual), ("predicted", self.predicted)]
            .into_iter()
            .chain(weight)
        {
            if column == 0 {
                return Err(Error::invalid_column(
                    role,
                    column,
                    "column indices are 1-based",
                ));
            }
        }
        Ok(())
    }
}

/// The parallel observation columns loaded from a dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Observations {
    pub actual: Vec<String>,
    pub predicted: Vec<String>,
    pub weight: Option<Vec<f64>>,
}

impl Observations {
    fn empty(weighted: bool) -> Self {
        Self {
            weight: weighted.then(Vec::new),
            ..Default::default()
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.actual.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.actual.is_empty()
    }
}

/// Loads the observations, reading Parquet for `.parquet` files and delimited text otherwise.
pub fn load(
    path: &Path,
    columns: Columns,
    dialect: &Dialect,
    header: bool,
) -> Result<Observations> {
    columns.validate()?;
    let is_parquet = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("parquet"));

    let observations = if is_parquet {
        load_parquet(path, columns)?
    } else {
        let file = std::fs::File::open(path)?;
        load_csv(file, columns, dialect, header)?
    };

    info!(path = %path.display(), rows = observations.len(), "loaded observations");
    Ok(observations)
}

/// Reads delimited text, skipping the first row when `header` is set.
pub fn load_csv<R: std::io::Read>(
    reader: R,
    columns: Columns,
    dialect: &Dialect,
    header: bool,
) -> Result<Observations> {
    columns.validate()?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(dialect.delimiter)
        .quote(dialect.quote)
        .has_headers(header)
        .flexible(true)
        .from_reader(reader);

    let mut observations = Observations::empty(columns.weight.is_some());
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        let row = idx + 1 + usize::from(header);
        let cell = |role: &'static str, column: usize| {
            record.get(column - 1).ok_or_else(|| {
                let reason = format!("row {row} has only {} columns", record.len());
                Error::invalid_column(role, column, reason)
            })
        };

        observations.actual.push(cell("actual", columns.actual)?.to_string());
        observations.predicted.push(cell("predicted", columns.predicted)?.to_string());
        if let (Some(weights), Some(column)) = (observations.weight.as_mut(), columns.weight) {
            let value = cell("weight", column)?;
            weights.push(parse_weight(value, row)?);
        }
    }

    Ok(observations)
}

fn parse_weight(value: &str, row: usize) -> Result<f64> {
    value.trim().parse().map_err(|_| Error::InvalidWeight {
        row,
        value: value.to_string(),
    })
}

/// Reads a Parquet file row by row. Column indices count the fields of each row.
pub fn load_parquet(path: &Path, columns: Columns) -> Result<Observations> {
    columns.validate()?;
    let file = std::fs::File::open(path)?;
    let dataset: SerializedFileReader<std::fs::File> = SerializedFileReader::new(file)?;

    let mut observations = Observations::empty(columns.weight.is_some());
    for (idx, row) in dataset.get_row_iter(None)?.enumerate() {
        let row = row?;
        let fields: Vec<&Field> = row.get_column_iter().map(|(_, field)| field).collect();
        let field = |role: &'static str, column: usize| {
            fields.get(column - 1).copied().ok_or_else(|| {
                let reason = format!("row {} has only {} fields", idx + 1, fields.len());
                Error::invalid_column(role, column, reason)
            })
        };

        observations.actual.push(field_label(field("actual", columns.actual)?));
        observations.predicted.push(field_label(field("predicted", columns.predicted)?));
        if let (Some(weights), Some(column)) = (observations.weight.as_mut(), columns.weight) {
            weights.push(field_weight(field("weight", column)?, idx + 1)?);
        }
    }

    Ok(observations)
}

fn field_label(field: &Field) -> String {
    match field {
        Field::Str(s) => s.clone(),
        Field::Null => String::new(),
        other => other.to_string(),
    }
}

fn field_weight(field: &Field, row: usize) -> Result<f64> {
    match *field {
        Field::Float(v) => Ok(v as f64),
        Field::Double(v) => Ok(v),
        Field::Byte(v) => Ok(v as f64),
        Field::Short(v) => Ok(v as f64),
        Field::Int(v) => Ok(v as f64),
        Field::Long(v) => Ok(v as f64),
        Field::UByte(v) => Ok(v as f64),
        Field::UShort(v) => Ok(v as f64),
        Field::UInt(v) => Ok(v as f64),
        Field::ULong(v) => Ok(v as f64),
        Field::Str(ref s) => parse_weight(s, row),
        ref other => Err(Error::InvalidWeight {
            row,
            value: other.to_string(),
        }),
    }
}

/// Splits a comma-separated list of predefined labels.
pub fn parse_labels(list: &str) -> Vec<String> {
    list.split(',').map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use parquet::{
        data_type::{ByteArray, ByteArrayType, DoubleType},
        file::{properties::WriterProperties, writer::SerializedFileWriter},
        schema::parser::parse_message_type,
    };
    use std::{io::Write, sync::Arc};

    const COLUMNS: Columns = Columns {
        actual: 1,
        predicted: 2,
        weight: None,
    };

    #[test]
    fn reads_columns_and_skips_header() {
        let data = "actual,predicted\ncat,dog\ndog,dog\n";
        let obs = load_csv(data.as_bytes(), COLUMNS, &Dialect::default(), true).unwrap();

        assert_eq!(obs.actual, vec!["cat", "dog"]);
        assert_eq!(obs.predicted, vec!["dog", "dog"]);
        assert_eq!(obs.weight, None);
    }

    #[test]
    fn reads_first_row_without_header() {
        let data = "cat,dog\ndog,dog\n";
        let obs = load_csv(data.as_bytes(), COLUMNS, &Dialect::default(), false).unwrap();
        assert_eq!(obs.len(), 2);
        assert_eq!(obs.actual[0], "cat");
    }

    #[test]
    fn reads_weights_with_custom_dialect() {
        let data = "w;pred;act\n0.5;'a;b';x\n 1 ;x;x\n";
        let columns = Columns {
            actual: 3,
            predicted: 2,
            weight: Some(1),
        };
        let dialect = Dialect::new(';', '\'').unwrap();
        let obs = load_csv(data.as_bytes(), columns, &dialect, true).unwrap();

        assert_eq!(obs.actual, vec!["x", "x"]);
        assert_eq!(obs.predicted, vec!["a;b", "x"]);
        assert_eq!(obs.weight, Some(vec![0.5, 1.0]));
    }

    #[test]
    fn bad_weight_names_the_row() {
        let data = "a,p,w\nx,x,0.5\nx,x,high\n";
        let columns = Columns {
            weight: Some(3),
            ..COLUMNS
        };
        let err = load_csv(data.as_bytes(), columns, &Dialect::default(), true).unwrap_err();
        assert!(matches!(err, Error::InvalidWeight { row: 3, ref value } if value == "high"));
    }

    #[test]
    fn missing_column_is_an_error() {
        let data = "x,y\nz\n";
        let err = load_csv(data.as_bytes(), COLUMNS, &Dialect::default(), false).unwrap_err();
        assert!(matches!(err, Error::InvalidColumn { role: "predicted", column: 2, .. }));

        let zero = Columns { actual: 0, ..COLUMNS };
        let err = load_csv("a,b\n".as_bytes(), zero, &Dialect::default(), false).unwrap_err();
        assert!(matches!(err, Error::InvalidColumn { role: "actual", column: 0, .. }));
    }

    #[test]
    fn load_dispatches_on_extension() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(file, "a\tp\nx\ty\n").unwrap();
        let dialect = Dialect::new('\t', '"').unwrap();

        let obs = load(file.path(), COLUMNS, &dialect, true).unwrap();
        assert_eq!(obs.actual, vec!["x"]);
        assert_eq!(obs.predicted, vec!["y"]);
    }

    #[test]
    fn reads_parquet_rows() {
        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let schema = Arc::new(
            parse_message_type(
                "message observations {
                    REQUIRED BYTE_ARRAY actual (UTF8);
                    REQUIRED BYTE_ARRAY predicted (UTF8);
                    REQUIRED DOUBLE weight;
                }",
            )
            .unwrap(),
        );
        let props = Arc::new(WriterProperties::builder().build());
        let mut writer = SerializedFileWriter::new(file.reopen().unwrap(), schema, props).unwrap();
        let mut row_group = writer.next_row_group().unwrap();
        let labels: [&[&str]; 2] = [&["ham", "spam", "spam"], &["ham", "ham", "spam"]];
        let mut column_idx = 0;
        while let Some(mut column) = row_group.next_column().unwrap() {
            if column_idx < 2 {
                let values: Vec<ByteArray> =
                    labels[column_idx].iter().map(|&l| ByteArray::from(l)).collect();
                column
                    .typed::<ByteArrayType>()
                    .write_batch(&values, None, None)
                    .unwrap();
            } else {
                column
                    .typed::<DoubleType>()
                    .write_batch(&[1.0, 0.5, 0.25], None, None)
                    .unwrap();
            }
            column.close().unwrap();
            column_idx += 1;
        }
        row_group.close().unwrap();
        writer.close().unwrap();

        let columns = Columns {
            weight: Some(3),
            ..COLUMNS
        };
        let obs = load(file.path(), columns, &Dialect::default(), true).unwrap();

        assert_eq!(obs.actual, vec!["ham", "spam", "spam"]);
        assert_eq!(obs.predicted, vec!["ham", "ham", "spam"]);
        assert_eq!(obs.weight, Some(vec![1.0, 0.5, 0.25]));
    }

    #[test]
    fn label_list_is_comma_separated() {
        assert_eq!(parse_labels("b,a,c"), vec!["b", "a", "c"]);
    }
}

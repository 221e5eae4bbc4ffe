use crate::domain::model::{Dataset, Value};
use crate::utils::error::{EtlError, Result};
use std::borrow::Cow;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// 讀取時視為缺失值的字串
const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn decode(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(e) => {
            tracing::warn!(
                "Input is not valid UTF-8 (first bad byte at {}), decoding lossily",
                e.valid_up_to()
            );
            String::from_utf8_lossy(bytes)
        }
    }
}

/// Parses CSV bytes into a dataset. The header row names the columns; a
/// column becomes numeric only when every non-missing field parses as a number.
pub fn read_dataset(bytes: &[u8]) -> Result<Dataset> {
    let text = decode(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let width = columns.len();

    let mut raw: Vec<Vec<Option<String>>> = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() > width {
            return Err(EtlError::ValidationError {
                message: format!(
                    "data row {} has {} fields, header has {}",
                    line + 1,
                    record.len(),
                    width
                ),
            });
        }
        // 欄位不足的列以 null 補齊
        let mut row: Vec<Option<String>> = record
            .iter()
            .map(|field| (!NA_TOKENS.contains(&field)).then(|| field.to_string()))
            .collect();
        row.resize(width, None);
        raw.push(row);
    }

    let numeric: Vec<bool> = (0..width)
        .map(|c| {
            raw.iter()
                .filter_map(|row| row[c].as_deref())
                .all(|field| parse_number(field).is_some())
        })
        .collect();

    let rows = raw
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&numeric)
                .map(|(field, &is_numeric)| match field {
                    None => Value::Null,
                    Some(s) if is_numeric => parse_number(&s).map(Value::Number).unwrap_or(Value::Null),
                    Some(s) => Value::Text(s),
                })
                .collect()
        })
        .collect();

    let dataset = Dataset::new(columns).with_rows(rows);
    tracing::debug!(
        "Parsed CSV with {} rows and {} columns",
        dataset.len(),
        dataset.width()
    );
    Ok(dataset)
}

fn parse_number(field: &str) -> Option<f64> {
    field.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

pub fn write_dataset(dataset: &Dataset) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(dataset.columns())?;
    for row in dataset.rows() {
        writer.write_record(row.iter().map(Value::to_field_string))?;
    }
    writer
        .into_inner()
        .map_err(|e| EtlError::IoError(e.into_error()))
}

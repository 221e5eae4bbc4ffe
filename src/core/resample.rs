use crate::core::dates::{bucket_label, next_label, parse_date};
use crate::domain::model::{Dataset, Value};
use crate::domain::params::{AggregationConfig, Granularity};
use chrono::{NaiveDate, NaiveTime};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResampleError {
    #[error("value '{value}' in date column '{column}' is not a date")]
    InvalidDate { column: String, value: String },

    #[error("value '{value}' in amount column '{column}' is not numeric")]
    NonNumericAmount { column: String, value: String },

    #[error("bucket range starting at {start} overflows the calendar")]
    CalendarOverflow { start: NaiveDate },
}

/// 重採樣結果。失敗時帶回原始資料，錯誤只記錄不往上拋。
#[derive(Debug)]
pub enum ResampleOutcome {
    Resampled(Dataset),
    Skipped(Dataset),
    Fallback { dataset: Dataset, error: ResampleError },
}

impl ResampleOutcome {
    pub fn into_dataset(self) -> Dataset {
        match self {
            ResampleOutcome::Resampled(dataset)
            | ResampleOutcome::Skipped(dataset)
            | ResampleOutcome::Fallback { dataset, .. } => dataset,
        }
    }

    pub fn is_resampled(&self) -> bool {
        matches!(self, ResampleOutcome::Resampled(_))
    }
}

/// Collapses rows into date buckets, summing the amount column. Only active
/// when the date column, a granularity and the amount column are all present.
pub fn resample_by_date(dataset: Dataset, config: &AggregationConfig) -> ResampleOutcome {
    let (Some(date_column), Some(granularity)) = (config.date_column.as_deref(), config.date_granularity)
    else {
        return ResampleOutcome::Skipped(dataset);
    };
    let Some(amount_column) = config.amount_column.as_deref() else {
        return ResampleOutcome::Skipped(dataset);
    };
    if !dataset.has_column(date_column) || !dataset.has_column(amount_column) {
        return ResampleOutcome::Skipped(dataset);
    }

    match try_resample(&dataset, date_column, amount_column, granularity) {
        Ok(resampled) => {
            tracing::debug!(
                "Resampled {} rows into {} '{}' buckets",
                dataset.len(),
                resampled.len(),
                granularity.code()
            );
            ResampleOutcome::Resampled(resampled)
        }
        Err(error) => {
            tracing::warn!("Resampling skipped, using un-resampled data: {}", error);
            ResampleOutcome::Fallback { dataset, error }
        }
    }
}

fn try_resample(
    dataset: &Dataset,
    date_column: &str,
    amount_column: &str,
    granularity: Granularity,
) -> Result<Dataset, ResampleError> {
    let mut buckets: BTreeMap<NaiveDate, f64> = BTreeMap::new();

    for (date_cell, amount_cell) in dataset
        .column_values(date_column)
        .unwrap_or_default()
        .into_iter()
        .zip(dataset.column_values(amount_column).unwrap_or_default())
    {
        // 日期為 null 的列不屬於任何區間
        if date_cell.is_null() {
            continue;
        }
        let ts = parse_date(date_cell).ok_or_else(|| ResampleError::InvalidDate {
            column: date_column.to_string(),
            value: date_cell.to_field_string(),
        })?;
        let label = bucket_label(ts, granularity).ok_or(ResampleError::CalendarOverflow {
            start: ts.date(),
        })?;

        let amount = match amount_cell {
            Value::Null => 0.0,
            other => other.as_f64().ok_or_else(|| ResampleError::NonNumericAmount {
                column: amount_column.to_string(),
                value: other.to_field_string(),
            })?,
        };
        *buckets.entry(label).or_insert(0.0) += amount;
    }

    let columns = [date_column, amount_column];
    let (Some(&first), Some(&last)) = (buckets.keys().next(), buckets.keys().next_back()) else {
        return Ok(Dataset::new(columns));
    };

    // 區間連續，中間沒有資料的區間總和為 0
    let mut rows = Vec::new();
    let mut label = first;
    loop {
        let total = buckets.get(&label).copied().unwrap_or(0.0);
        rows.push(vec![Value::Date(label.and_time(NaiveTime::MIN)), Value::Number(total)]);
        if label >= last {
            break;
        }
        label = next_label(label, granularity).ok_or(ResampleError::CalendarOverflow { start: label })?;
    }
    Ok(Dataset::new(columns).with_rows(rows))
}

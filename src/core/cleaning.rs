use crate::core::dates::parse_date;
use crate::core::stats;
use crate::domain::model::{normalize_column_name, Dataset, Value};
use crate::domain::params::{CleaningConfig, FillMissing, OutlierStrategy};
use std::collections::HashSet;

/// Column names the caller designates for the cleaning stages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnRefs {
    pub date_column: Option<String>,
    pub amount_column: Option<String>,
}

impl ColumnRefs {
    pub fn from_config(config: &CleaningConfig) -> Self {
        Self {
            date_column: config.date_column.clone(),
            amount_column: config.amount_column.clone(),
        }
    }
}

/// 清洗流程：固定順序 Normalize → BlankCoerce → DateParse → Deduplicate → FillMissing → ClipOutliers
#[derive(Debug, Clone, Default)]
pub struct CleaningPipeline {
    config: CleaningConfig,
}

impl CleaningPipeline {
    pub fn new(config: CleaningConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CleaningConfig {
        &self.config
    }

    pub fn run(&self, dataset: Dataset) -> Dataset {
        let config = &self.config;
        let stage_done = |stage: &str, dataset: &Dataset| {
            tracing::debug!(stage = stage, rows = dataset.len(), "Cleaning stage done");
        };

        let (dataset, refs) = normalize_columns(
            dataset,
            ColumnRefs::from_config(config),
            config.normalize_columns,
        );
        stage_done("normalize", &dataset);
        let date_column = refs.date_column.as_deref();
        let amount_column = refs.amount_column.as_deref();

        let dataset = coerce_blanks(dataset, config.treat_blank_as_na);
        stage_done("blank", &dataset);
        let dataset = parse_dates(dataset, date_column);
        stage_done("dates", &dataset);

        let input_rows = dataset.len();
        let dataset = drop_duplicate_rows(dataset, config.drop_duplicates);
        tracing::debug!(
            "Deduplication kept {} of {} rows",
            dataset.len(),
            input_rows
        );

        let dataset = fill_missing(dataset, amount_column, config.fill_missing);
        stage_done("fill", &dataset);
        let dataset = clip_outliers(dataset, amount_column, config.outlier_strategy);
        stage_done("clip", &dataset);
        dataset
    }
}

/// Trims and lower-cases every column name, and the caller's column
/// references with it. Disabled mode returns both untouched.
pub fn normalize_columns(dataset: Dataset, refs: ColumnRefs, enabled: bool) -> (Dataset, ColumnRefs) {
    if !enabled {
        return (dataset, refs);
    }
    let refs = ColumnRefs {
        date_column: refs.date_column.as_deref().map(normalize_column_name),
        amount_column: refs.amount_column.as_deref().map(normalize_column_name),
    };
    (dataset.rename_columns(normalize_column_name), refs)
}

/// 空白字串（含只有空白字元）一律視為缺失值
pub fn coerce_blanks(dataset: Dataset, enabled: bool) -> Dataset {
    if !enabled {
        return dataset;
    }
    dataset.map_cells(|value| match value {
        Value::Text(s) if s.trim().is_empty() => Value::Null,
        other => other,
    })
}

pub fn parse_dates(dataset: Dataset, date_column: Option<&str>) -> Dataset {
    let Some(idx) = date_column.and_then(|name| dataset.column_index(name)) else {
        return dataset;
    };

    let mut unparsed = 0usize;
    let dataset = dataset.map_column(idx, |value| {
        if value.is_null() {
            return Value::Null;
        }
        match parse_date(&value) {
            Some(d) => Value::Date(d),
            None => {
                unparsed += 1;
                Value::Null
            }
        }
    });

    if unparsed > 0 {
        tracing::debug!(
            "{} value(s) in date column '{}' could not be parsed and were set to null",
            unparsed,
            date_column.unwrap_or_default()
        );
    }
    dataset
}

/// Keeps the first occurrence of each distinct row, in original order.
pub fn drop_duplicate_rows(dataset: Dataset, enabled: bool) -> Dataset {
    if !enabled {
        return dataset;
    }
    let rows: Vec<Vec<Value>> = {
        let mut seen: HashSet<&[Value]> = HashSet::with_capacity(dataset.len());
        dataset
            .rows()
            .iter()
            .filter(|row| seen.insert(row.as_slice()))
            .cloned()
            .collect()
    };
    dataset.with_rows(rows)
}

/// Imputes nulls in the amount column. The fill value is computed once from
/// the values present when the stage runs.
pub fn fill_missing(dataset: Dataset, amount_column: Option<&str>, policy: FillMissing) -> Dataset {
    let Some(idx) = amount_column.and_then(|name| dataset.column_index(name)) else {
        return dataset;
    };

    let present = stats::present(&dataset.numeric_column(idx));
    let fill_value = match policy {
        FillMissing::None => None,
        FillMissing::Zero => Some(0.0),
        FillMissing::Mean => stats::mean(&present),
        FillMissing::Median => stats::median(&present),
    };

    let Some(fill_value) = fill_value else {
        return dataset;
    };
    dataset.map_column(idx, |value| match value {
        Value::Null => Value::Number(fill_value),
        other => other,
    })
}

/// IQR 截尾：先轉成數值（無法轉換者為 null），再夾到 [Q1 - 1.5·IQR, Q3 + 1.5·IQR]
pub fn clip_outliers(dataset: Dataset, amount_column: Option<&str>, strategy: OutlierStrategy) -> Dataset {
    if strategy != OutlierStrategy::Iqr {
        return dataset;
    }
    let Some(idx) = amount_column.and_then(|name| dataset.column_index(name)) else {
        return dataset;
    };

    let numeric = dataset.numeric_column(idx);
    let present = stats::present(&numeric);

    let bounds = match (stats::quantile(&present, 0.25), stats::quantile(&present, 0.75)) {
        (Some(q1), Some(q3)) if present.len() >= 2 && q3 - q1 > 0.0 => {
            let iqr = q3 - q1;
            Some((q1 - 1.5 * iqr, q3 + 1.5 * iqr))
        }
        _ => None,
    };

    match bounds {
        Some((lower, upper)) => tracing::debug!("Clipping amount column to [{}, {}]", lower, upper),
        None => tracing::debug!("IQR undefined or not positive, amount column left unclipped"),
    }

    let mut numeric = numeric.into_iter();
    dataset.map_column(idx, |_| match numeric.next().flatten() {
        Some(n) => match bounds {
            Some((lower, upper)) => Value::Number(n.clamp(lower, upper)),
            None => Value::Number(n),
        },
        None => Value::Null,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amounts(values: &[Option<f64>]) -> Dataset {
        Dataset::from_rows(
            ["amount"],
            values.iter().map(|v| vec![Value::from(*v)]).collect(),
        )
        .unwrap()
    }

    fn amount_column(dataset: &Dataset) -> Vec<Value> {
        dataset
            .column_values("amount")
            .unwrap()
            .into_iter()
            .cloned()
            .collect()
    }

    #[test]
    fn test_normalize_columns_is_idempotent() {
        let dataset = Dataset::new(["  Region ", "AMOUNT", "Order Date"]);
        let refs = ColumnRefs {
            date_column: Some(" Order Date".to_string()),
            amount_column: Some("Amount".to_string()),
        };

        let (once, refs_once) = normalize_columns(dataset, refs, true);
        assert_eq!(once.columns(), ["region", "amount", "order date"]);
        assert_eq!(refs_once.amount_column.as_deref(), Some("amount"));
        assert_eq!(refs_once.date_column.as_deref(), Some("order date"));

        let (twice, refs_twice) = normalize_columns(once.clone(), refs_once.clone(), true);
        assert_eq!(twice, once);
        assert_eq!(refs_twice, refs_once);
    }

    #[test]
    fn test_normalize_disabled_is_noop() {
        let dataset = Dataset::new([" Region "]);
        let refs = ColumnRefs {
            date_column: None,
            amount_column: Some(" Amount".to_string()),
        };
        let (out, out_refs) = normalize_columns(dataset.clone(), refs.clone(), false);
        assert_eq!(out, dataset);
        assert_eq!(out_refs, refs);
    }

    #[test]
    fn test_coerce_blanks() {
        let dataset = Dataset::from_rows(
            ["name", "amount"],
            vec![
                vec![Value::from("   "), Value::from(1.0)],
                vec![Value::from(""), Value::Null],
                vec![Value::from(" x "), Value::from(0.0)],
            ],
        )
        .unwrap();

        let out = coerce_blanks(dataset.clone(), true);
        assert_eq!(out.get(0, "name"), Some(&Value::Null));
        assert_eq!(out.get(1, "name"), Some(&Value::Null));
        assert_eq!(out.get(2, "name"), Some(&Value::from(" x ")));
        assert_eq!(out.get(2, "amount"), Some(&Value::from(0.0)));

        assert_eq!(coerce_blanks(dataset.clone(), false), dataset);
    }

    #[test]
    fn test_parse_dates_nulls_invalid_entries() {
        let dataset = Dataset::from_rows(
            ["date"],
            vec![
                vec![Value::from("2024-02-01")],
                vec![Value::from("yesterday")],
                vec![Value::Null],
            ],
        )
        .unwrap();

        let out = parse_dates(dataset, Some("date"));
        assert!(matches!(out.get(0, "date"), Some(Value::Date(_))));
        assert_eq!(out.get(1, "date"), Some(&Value::Null));
        assert_eq!(out.get(2, "date"), Some(&Value::Null));
    }

    #[test]
    fn test_parse_dates_missing_column_is_noop() {
        let dataset = Dataset::from_rows(["when"], vec![vec![Value::from("2024-02-01")]]).unwrap();
        assert_eq!(parse_dates(dataset.clone(), Some("date")), dataset);
        assert_eq!(parse_dates(dataset.clone(), None), dataset);
    }

    #[test]
    fn test_drop_duplicates_keeps_first_occurrence() {
        let dataset = Dataset::from_rows(
            ["k", "v"],
            vec![
                vec![Value::from("b"), Value::Null],
                vec![Value::from("a"), Value::from(1.0)],
                vec![Value::from("b"), Value::Null],
                vec![Value::from("a"), Value::from(2.0)],
                vec![Value::from("a"), Value::from(1.0)],
            ],
        )
        .unwrap();

        let out = drop_duplicate_rows(dataset.clone(), true);
        assert_eq!(out.len(), 3);
        assert_eq!(out.get(0, "k"), Some(&Value::from("b")));
        assert_eq!(out.get(1, "v"), Some(&Value::from(1.0)));
        assert_eq!(out.get(2, "v"), Some(&Value::from(2.0)));

        assert_eq!(drop_duplicate_rows(out.clone(), true), out);
        assert_eq!(drop_duplicate_rows(dataset.clone(), false), dataset);
    }

    #[test]
    fn test_fill_zero() {
        let out = fill_missing(amounts(&[Some(5.0), None, None]), Some("amount"), FillMissing::Zero);
        assert_eq!(
            amount_column(&out),
            vec![Value::from(5.0), Value::from(0.0), Value::from(0.0)]
        );
    }

    #[test]
    fn test_fill_mean_and_median_use_single_value() {
        let input = amounts(&[Some(1.0), None, Some(2.0), Some(9.0), None]);

        let out = fill_missing(input.clone(), Some("amount"), FillMissing::Mean);
        assert_eq!(out.get(1, "amount"), Some(&Value::from(4.0)));
        assert_eq!(out.get(4, "amount"), Some(&Value::from(4.0)));

        let out = fill_missing(input, Some("amount"), FillMissing::Median);
        assert_eq!(out.get(1, "amount"), Some(&Value::from(2.0)));
        assert_eq!(out.get(4, "amount"), Some(&Value::from(2.0)));
    }

    #[test]
    fn test_fill_all_null_column_stays_null() {
        let input = amounts(&[None, None]);
        let out = fill_missing(input.clone(), Some("amount"), FillMissing::Median);
        assert_eq!(out, input);

        let out = fill_missing(input.clone(), Some("amount"), FillMissing::Zero);
        assert_eq!(amount_column(&out), vec![Value::from(0.0), Value::from(0.0)]);
    }

    #[test]
    fn test_fill_none_or_missing_column_is_noop() {
        let input = amounts(&[Some(1.0), None]);
        assert_eq!(fill_missing(input.clone(), Some("amount"), FillMissing::None), input);
        assert_eq!(fill_missing(input.clone(), Some("price"), FillMissing::Zero), input);
        assert_eq!(fill_missing(input.clone(), None, FillMissing::Zero), input);
    }

    #[test]
    fn test_clip_outliers_iqr() {
        let input = amounts(&[Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(100.0)]);
        let out = clip_outliers(input, Some("amount"), OutlierStrategy::Iqr);
        assert_eq!(
            amount_column(&out),
            vec![
                Value::from(1.0),
                Value::from(2.0),
                Value::from(3.0),
                Value::from(4.0),
                Value::from(7.0)
            ]
        );
    }

    #[test]
    fn test_clip_zero_iqr_only_coerces() {
        let dataset = Dataset::from_rows(
            ["amount"],
            vec![
                vec![Value::from("5")],
                vec![Value::from(5.0)],
                vec![Value::from("n/a")],
                vec![Value::from(5.0)],
            ],
        )
        .unwrap();

        let out = clip_outliers(dataset, Some("amount"), OutlierStrategy::Iqr);
        assert_eq!(
            amount_column(&out),
            vec![Value::from(5.0), Value::from(5.0), Value::Null, Value::from(5.0)]
        );
    }

    #[test]
    fn test_clip_single_value_and_disabled() {
        let input = amounts(&[Some(42.0), None]);
        let out = clip_outliers(input.clone(), Some("amount"), OutlierStrategy::Iqr);
        assert_eq!(amount_column(&out), vec![Value::from(42.0), Value::Null]);

        let input = amounts(&[Some(1.0), Some(1000.0)]);
        assert_eq!(clip_outliers(input.clone(), Some("amount"), OutlierStrategy::None), input);
    }

    #[test]
    fn test_pipeline_runs_stages_in_order() {
        // 空白先轉成 null，去重後才用中位數補值，最後截尾
        let dataset = Dataset::from_rows(
            [" Region", "Amount "],
            vec![
                vec![Value::from("N"), Value::from("10")],
                vec![Value::from("N"), Value::from("10")],
                vec![Value::from("S"), Value::from("  ")],
                vec![Value::from("S"), Value::from("30")],
            ],
        )
        .unwrap();

        let pipeline = CleaningPipeline::new(CleaningConfig {
            amount_column: Some("AMOUNT".to_string()),
            outlier_strategy: OutlierStrategy::Iqr,
            ..Default::default()
        });
        let out = pipeline.run(dataset);

        assert_eq!(out.columns(), ["region", "amount"]);
        assert_eq!(out.len(), 3);
        assert_eq!(
            amount_column(&out),
            vec![Value::from(10.0), Value::from(20.0), Value::from(30.0)]
        );
    }
}

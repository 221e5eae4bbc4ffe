use crate::domain::model::normalize_column_name;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{validate_range, Validate};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PREVIEW_LIMIT: usize = 20;
pub const MAX_PREVIEW_LIMIT: usize = 1000;

/// 金額欄缺失值填補策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillMissing {
    None,
    Zero,
    Mean,
    #[default]
    Median,
}

/// 金額欄異常值處理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlierStrategy {
    #[default]
    None,
    Iqr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl Granularity {
    /// Parses the `D|W|M|Q|Y` codes; anything else yields `None`.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "D" => Some(Granularity::Day),
            "W" => Some(Granularity::Week),
            "M" => Some(Granularity::Month),
            "Q" => Some(Granularity::Quarter),
            "Y" => Some(Granularity::Year),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Granularity::Day => "D",
            Granularity::Week => "W",
            Granularity::Month => "M",
            Granularity::Quarter => "Q",
            Granularity::Year => "Y",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Sum,
    Mean,
    Median,
    Max,
    Min,
    Count,
}

impl Metric {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "sum" => Some(Metric::Sum),
            "mean" => Some(Metric::Mean),
            "median" => Some(Metric::Median),
            "max" => Some(Metric::Max),
            "min" => Some(Metric::Min),
            "count" => Some(Metric::Count),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Sum => "sum",
            Metric::Mean => "mean",
            Metric::Median => "median",
            Metric::Max => "max",
            Metric::Min => "min",
            Metric::Count => "count",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CleaningConfig {
    pub date_column: Option<String>,
    pub amount_column: Option<String>,
    pub drop_duplicates: bool,
    pub fill_missing: FillMissing,
    pub normalize_columns: bool,
    pub treat_blank_as_na: bool,
    pub outlier_strategy: OutlierStrategy,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            date_column: None,
            amount_column: None,
            drop_duplicates: true,
            fill_missing: FillMissing::Median,
            normalize_columns: true,
            treat_blank_as_na: true,
            outlier_strategy: OutlierStrategy::None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregationConfig {
    pub group_by: Option<Vec<String>>,
    pub amount_column: Option<String>,
    pub date_column: Option<String>,
    pub date_granularity: Option<Granularity>,
    /// Raw metric names as requested; unknown names are filtered out at aggregation time.
    pub metrics: Option<Vec<String>>,
}

/// 分析參數（與上傳時附帶的 JSON 參數同一格式）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzeParams {
    /// 日期欄名
    pub date_column: Option<String>,
    /// 銷售金額欄名
    pub amount_column: Option<String>,
    pub drop_duplicates: bool,
    /// none|zero|median|mean，null 等同 none
    pub fill_missing: Option<FillMissing>,
    /// 分組欄列表，如 ["region", "product"]
    pub group_by: Option<Vec<String>>,
    /// D|W|M|Q|Y
    pub date_granularity: Option<String>,
    /// sum|mean|median|max|min|count，預設只回傳 sum 與 count
    pub metrics: Option<Vec<String>>,
    pub normalize_columns: bool,
    pub treat_blank_as_na: bool,
    pub outlier_strategy: OutlierStrategy,
}

impl Default for AnalyzeParams {
    fn default() -> Self {
        Self {
            date_column: None,
            amount_column: None,
            drop_duplicates: true,
            fill_missing: Some(FillMissing::Median),
            group_by: None,
            date_granularity: None,
            metrics: None,
            normalize_columns: true,
            treat_blank_as_na: true,
            outlier_strategy: OutlierStrategy::None,
        }
    }
}

impl AnalyzeParams {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| EtlError::InvalidParamsError {
            message: e.to_string(),
        })
    }

    pub fn cleaning_config(&self) -> CleaningConfig {
        CleaningConfig {
            date_column: self.date_column.clone(),
            amount_column: self.amount_column.clone(),
            drop_duplicates: self.drop_duplicates,
            fill_missing: self.fill_missing.unwrap_or(FillMissing::None),
            normalize_columns: self.normalize_columns,
            treat_blank_as_na: self.treat_blank_as_na,
            outlier_strategy: self.outlier_strategy,
        }
    }

    /// Column references are normalized the same way the cleaning stage
    /// renames the dataset's columns, so they resolve against cleaned data.
    pub fn aggregation_config(&self) -> AggregationConfig {
        let resolve = |name: &String| {
            if self.normalize_columns {
                normalize_column_name(name)
            } else {
                name.clone()
            }
        };

        AggregationConfig {
            group_by: self
                .group_by
                .as_ref()
                .map(|cols| cols.iter().map(resolve).collect()),
            amount_column: self.amount_column.as_ref().map(resolve),
            date_column: self.date_column.as_ref().map(resolve),
            date_granularity: self
                .date_granularity
                .as_deref()
                .and_then(Granularity::from_code),
            metrics: self.metrics.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewParams {
    #[serde(flatten)]
    pub analyze: AnalyzeParams,
    /// 預覽回傳的列數
    #[serde(default = "default_preview_limit")]
    pub limit: usize,
}

fn default_preview_limit() -> usize {
    DEFAULT_PREVIEW_LIMIT
}

impl Default for PreviewParams {
    fn default() -> Self {
        Self {
            analyze: AnalyzeParams::default(),
            limit: DEFAULT_PREVIEW_LIMIT,
        }
    }
}

impl PreviewParams {
    pub fn from_json(json: &str) -> Result<Self> {
        let params: Self = serde_json::from_str(json).map_err(|e| EtlError::InvalidParamsError {
            message: e.to_string(),
        })?;
        params.validate()?;
        Ok(params)
    }
}

impl Validate for PreviewParams {
    fn validate(&self) -> Result<()> {
        validate_range("limit", self.limit, 1, MAX_PREVIEW_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let params = AnalyzeParams::from_json("{}").unwrap();
        assert_eq!(params, AnalyzeParams::default());

        let config = params.cleaning_config();
        assert!(config.drop_duplicates);
        assert!(config.normalize_columns);
        assert!(config.treat_blank_as_na);
        assert_eq!(config.fill_missing, FillMissing::Median);
        assert_eq!(config.outlier_strategy, OutlierStrategy::None);
    }

    #[test]
    fn test_null_fill_missing_means_none() {
        let params = AnalyzeParams::from_json(r#"{"fill_missing": null}"#).unwrap();
        assert_eq!(params.cleaning_config().fill_missing, FillMissing::None);
    }

    #[test]
    fn test_invalid_enum_is_params_error() {
        let err = AnalyzeParams::from_json(r#"{"outlier_strategy": "zscore"}"#).unwrap_err();
        assert!(matches!(err, EtlError::InvalidParamsError { .. }));

        let err = AnalyzeParams::from_json("not json").unwrap_err();
        assert!(matches!(err, EtlError::InvalidParamsError { .. }));
    }

    #[test]
    fn test_unknown_granularity_is_ignored() {
        let params = AnalyzeParams::from_json(
            r#"{"date_column": "Date", "date_granularity": "H"}"#,
        )
        .unwrap();
        assert_eq!(params.aggregation_config().date_granularity, None);

        let params = AnalyzeParams::from_json(r#"{"date_granularity": "m"}"#).unwrap();
        assert_eq!(
            params.aggregation_config().date_granularity,
            Some(Granularity::Month)
        );
    }

    #[test]
    fn test_aggregation_config_normalizes_references() {
        let params = AnalyzeParams::from_json(
            r#"{"amount_column": " Amount ", "date_column": "Order Date", "group_by": ["Region"]}"#,
        )
        .unwrap();
        let config = params.aggregation_config();
        assert_eq!(config.amount_column.as_deref(), Some("amount"));
        assert_eq!(config.date_column.as_deref(), Some("order date"));
        assert_eq!(config.group_by, Some(vec!["region".to_string()]));

        let params = AnalyzeParams {
            normalize_columns: false,
            ..params
        };
        assert_eq!(
            params.aggregation_config().amount_column.as_deref(),
            Some(" Amount ")
        );
    }

    #[test]
    fn test_preview_limit_bounds() {
        assert_eq!(PreviewParams::from_json("{}").unwrap().limit, 20);
        assert_eq!(
            PreviewParams::from_json(r#"{"limit": 1000, "amount_column": "amount"}"#)
                .unwrap()
                .analyze
                .amount_column
                .as_deref(),
            Some("amount")
        );
        assert!(PreviewParams::from_json(r#"{"limit": 0}"#).is_err());
        assert!(PreviewParams::from_json(r#"{"limit": 1001}"#).is_err());
    }

    #[test]
    fn test_metric_names() {
        assert_eq!(Metric::parse("median"), Some(Metric::Median));
        assert_eq!(Metric::parse("variance"), None);
        assert_eq!(Metric::Count.as_str(), "count");
        assert_eq!(Granularity::Quarter.code(), "Q");
    }
}

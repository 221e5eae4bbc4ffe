use crate::domain::model::Record;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryStats {
    pub rows: usize,
    pub columns: usize,
    pub amount_sum: Option<f64>,
    pub amount_mean: Option<f64>,
    pub amount_median: Option<f64>,
}

/// 單一分組的統計；未要求的指標維持 null
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupedStat {
    pub keys: Record,
    /// sum
    pub total_amount: Option<f64>,
    pub amount_mean: Option<f64>,
    pub amount_median: Option<f64>,
    pub amount_max: Option<f64>,
    pub amount_min: Option<f64>,
    pub count: Option<usize>,
}

impl GroupedStat {
    pub fn new(keys: Record) -> Self {
        Self {
            keys,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalyzeResult {
    pub summary: SummaryStats,
    pub groups: Option<Vec<GroupedStat>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PreviewResult {
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
}

//! Entry points that wire request parameters to the cleaning and
//! aggregation stages.

use crate::core::aggregate::Aggregator;
use crate::core::cleaning::CleaningPipeline;
use crate::domain::model::Dataset;
use crate::domain::params::{AnalyzeParams, PreviewParams, MAX_PREVIEW_LIMIT};
use crate::domain::report::{AnalyzeResult, PreviewResult};
use crate::utils::error::Result;
use crate::utils::validation::validate_range;

pub fn clean_dataset(dataset: Dataset, params: &AnalyzeParams) -> Dataset {
    CleaningPipeline::new(params.cleaning_config()).run(dataset)
}

/// Cleans the dataset, then aggregates it. Returns the cleaned dataset too,
/// for callers that also write it out.
pub fn analyze_dataset(dataset: Dataset, params: &AnalyzeParams) -> (Dataset, AnalyzeResult) {
    let cleaned = clean_dataset(dataset, params);
    let result = Aggregator::new(params.aggregation_config()).analyze(cleaned.clone());
    (cleaned, result)
}

/// 取前 `limit` 列，limit 需介於 1 到 1000
pub fn preview(dataset: &Dataset, limit: usize) -> Result<PreviewResult> {
    validate_range("limit", limit, 1, MAX_PREVIEW_LIMIT)?;

    let head = dataset.head(limit);
    Ok(PreviewResult {
        columns: head.columns().to_vec(),
        rows: (0..head.len()).filter_map(|i| head.record(i)).collect(),
    })
}

pub fn preview_dataset(dataset: Dataset, params: &PreviewParams) -> Result<PreviewResult> {
    let cleaned = clean_dataset(dataset, &params.analyze);
    preview(&cleaned, params.limit)
}

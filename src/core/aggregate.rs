use crate::core::resample::resample_by_date;
use crate::core::stats;
use crate::domain::model::{Dataset, Record, Value};
use crate::domain::params::{AggregationConfig, Metric};
use crate::domain::report::{AnalyzeResult, GroupedStat, SummaryStats};
use std::collections::BTreeMap;

const DEFAULT_METRICS: [Metric; 2] = [Metric::Sum, Metric::Count];

/// 統計彙總：整體摘要，以及（可選的）分組指標
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    config: AggregationConfig,
}

impl Aggregator {
    pub fn new(config: AggregationConfig) -> Self {
        Self { config }
    }

    pub fn analyze(&self, dataset: Dataset) -> AnalyzeResult {
        if dataset.is_empty() {
            return AnalyzeResult {
                summary: SummaryStats::default(),
                groups: Some(Vec::new()),
            };
        }

        let dataset = if self.config.date_column.is_some() && self.config.date_granularity.is_some() {
            resample_by_date(dataset, &self.config).into_dataset()
        } else {
            dataset
        };

        let amount_column = self
            .config
            .amount_column
            .as_deref()
            .filter(|name| dataset.has_column(name));

        let summary = summarize(&dataset, amount_column);
        let groups = self.config.group_by.as_deref().and_then(|group_by| {
            group_stats(
                &dataset,
                group_by,
                amount_column,
                &select_metrics(self.config.metrics.as_deref()),
            )
        });

        AnalyzeResult { summary, groups }
    }
}

/// Requested metrics filtered to the supported set, first occurrence order.
/// Nothing requested, or nothing supported, falls back to `sum` + `count`.
pub fn select_metrics(requested: Option<&[String]>) -> Vec<Metric> {
    let mut selected: Vec<Metric> = Vec::new();
    for metric in requested.unwrap_or_default().iter().filter_map(|m| Metric::parse(m)) {
        if !selected.contains(&metric) {
            selected.push(metric);
        }
    }
    if selected.is_empty() {
        DEFAULT_METRICS.to_vec()
    } else {
        selected
    }
}

pub fn summarize(dataset: &Dataset, amount_column: Option<&str>) -> SummaryStats {
    let mut summary = SummaryStats {
        rows: dataset.len(),
        columns: dataset.width(),
        ..Default::default()
    };

    if let Some(idx) = amount_column.and_then(|name| dataset.column_index(name)) {
        let values = stats::present(&dataset.numeric_column(idx));
        summary.amount_sum = Some(stats::sum(&values));
        summary.amount_mean = stats::mean(&values);
        summary.amount_median = stats::median(&values);
    }
    summary
}

/// Per-group statistics. Returns `None` when any group column is missing.
/// Null is a group key of its own; groups come out sorted by key.
pub fn group_stats(
    dataset: &Dataset,
    group_by: &[String],
    amount_column: Option<&str>,
    metrics: &[Metric],
) -> Option<Vec<GroupedStat>> {
    if group_by.is_empty() {
        return None;
    }
    let key_indices: Vec<usize> = match group_by
        .iter()
        .map(|name| dataset.column_index(name))
        .collect::<Option<Vec<_>>>()
    {
        Some(indices) => indices,
        None => {
            tracing::debug!("Grouping skipped, missing group column among {:?}", group_by);
            return None;
        }
    };

    let amount_idx = amount_column.and_then(|name| dataset.column_index(name));
    let metrics: &[Metric] = if amount_idx.is_some() {
        metrics
    } else {
        &[Metric::Count]
    };

    let mut groups: BTreeMap<Vec<&Value>, Vec<usize>> = BTreeMap::new();
    for (i, row) in dataset.rows().iter().enumerate() {
        let key: Vec<&Value> = key_indices.iter().map(|&k| &row[k]).collect();
        groups.entry(key).or_default().push(i);
    }

    let stats = groups
        .into_iter()
        .map(|(key, members)| {
            let keys = Record::new(
                group_by
                    .iter()
                    .cloned()
                    .zip(key.into_iter().cloned())
                    .collect(),
            );
            let amounts: Vec<f64> = match amount_idx {
                Some(idx) => members
                    .iter()
                    .filter_map(|&i| dataset.rows()[i][idx].as_f64())
                    .collect(),
                None => Vec::new(),
            };

            let mut stat = GroupedStat::new(keys);
            for metric in metrics {
                match metric {
                    Metric::Sum => stat.total_amount = Some(stats::sum(&amounts)),
                    Metric::Mean => stat.amount_mean = stats::mean(&amounts),
                    Metric::Median => stat.amount_median = stats::median(&amounts),
                    Metric::Max => stat.amount_max = stats::max(&amounts),
                    Metric::Min => stat.amount_min = stats::min(&amounts),
                    Metric::Count => stat.count = Some(members.len()),
                }
            }
            stat
        })
        .collect();

    Some(stats)
}

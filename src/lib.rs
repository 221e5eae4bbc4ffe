pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::cli::LocalStorage;
#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::toml_config::TomlConfig;

pub use core::{etl::EtlEngine, pipeline::SalesPipeline};
pub use domain::model::{Dataset, Record, Value};
pub use domain::params::{AnalyzeParams, FillMissing, Granularity, OutlierStrategy, PreviewParams};
pub use domain::report::{AnalyzeResult, GroupedStat, PreviewResult, SummaryStats};
pub use utils::error::{EtlError, Result};

pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::domain::params::{AnalyzeParams, MAX_PREVIEW_LIMIT};
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{
    validate_file_extension, validate_one_of, validate_path, validate_range, Validate,
};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

pub const SUPPORTED_FORMATS: [&str; 2] = ["csv", "json"];
pub const INPUT_EXTENSIONS: [&str; 2] = ["csv", "txt"];
pub const DEFAULT_ARCHIVE_NAME: &str = "sales_report.zip";

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "sales-etl")]
#[command(about = "Clean an uploaded sales CSV and compute summary statistics")]
pub struct CliConfig {
    #[arg(long, help = "Path to the sales CSV file")]
    pub input: String,

    #[arg(long, help = "Analysis parameters as a JSON object")]
    pub params_json: Option<String>,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, value_delimiter = ',', default_value = "csv,json")]
    pub formats: Vec<String>,

    #[arg(long, help = "Bundle all outputs into a single zip archive")]
    pub compress: bool,

    #[arg(long, help = "Also write the first N cleaned rows to preview.json")]
    pub preview: Option<usize>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[arg(skip)]
    #[serde(skip)]
    pub params: AnalyzeParams,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 解析 `--params-json`，未提供時使用預設參數
    pub fn with_parsed_params(mut self) -> Result<Self> {
        self.params = match &self.params_json {
            Some(json) => AnalyzeParams::from_json(json)?,
            None => AnalyzeParams::default(),
        };
        Ok(self)
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("input", &self.input)?;
        validate_file_extension("input", &self.input, &INPUT_EXTENSIONS)?;
        validate_path("output_path", &self.output_path)?;
        validate_one_of("formats", &self.formats, &SUPPORTED_FORMATS)?;
        if let Some(limit) = self.preview {
            validate_range("preview", limit, 1, MAX_PREVIEW_LIMIT)?;
        }
        Ok(())
    }
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn input_path(&self) -> &str {
        &self.input
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn params(&self) -> &AnalyzeParams {
        &self.params
    }

    fn output_formats(&self) -> &[String] {
        &self.formats
    }

    fn archive_name(&self) -> Option<&str> {
        self.compress.then_some(DEFAULT_ARCHIVE_NAME)
    }

    fn preview_limit(&self) -> Option<usize> {
        self.preview
    }
}

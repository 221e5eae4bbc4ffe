use crate::adapters::csv_io::{read_dataset, write_dataset};
use crate::core::analysis::{analyze_dataset, preview};
use crate::core::{ConfigProvider, Dataset, Pipeline, Storage, TransformResult};
use crate::utils::error::Result;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub const CLEANED_FILE: &str = "cleaned.csv";
pub const ANALYSIS_FILE: &str = "analysis.json";
pub const PREVIEW_FILE: &str = "preview.json";

/// 銷售資料管道：讀 CSV → 清洗 + 統計 → 寫出結果
pub struct SalesPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
}

impl<S: Storage, C: ConfigProvider> SalesPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    fn render_outputs(&self, result: &TransformResult) -> Result<Vec<(&'static str, Vec<u8>)>> {
        let mut files = Vec::new();
        for format in self.config.output_formats() {
            match format.as_str() {
                "csv" => files.push((CLEANED_FILE, write_dataset(&result.cleaned)?)),
                "json" => {
                    files.push((ANALYSIS_FILE, serde_json::to_vec_pretty(&result.analysis)?));
                    if let Some(preview) = &result.preview {
                        files.push((PREVIEW_FILE, serde_json::to_vec_pretty(preview)?));
                    }
                }
                other => tracing::warn!("Ignoring unsupported output format '{}'", other),
            }
        }
        Ok(files)
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for SalesPipeline<S, C> {
    async fn extract(&self) -> Result<Dataset> {
        tracing::debug!("Reading input file: {}", self.config.input_path());
        let bytes = self.storage.read_file(self.config.input_path()).await?;
        tracing::debug!("Read {} bytes", bytes.len());

        read_dataset(&bytes)
    }

    async fn transform(&self, data: Dataset) -> Result<TransformResult> {
        let params = self.config.params();
        let (cleaned, analysis) = analyze_dataset(data, params);

        let preview = match self.config.preview_limit() {
            Some(limit) => Some(preview(&cleaned, limit)?),
            None => None,
        };

        Ok(TransformResult {
            cleaned,
            analysis,
            preview,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let files = self.render_outputs(&result)?;

        let Some(archive_name) = self.config.archive_name() else {
            for (name, data) in &files {
                tracing::debug!("Writing {} ({} bytes)", name, data.len());
                self.storage.write_file(name, data).await?;
            }
            return Ok(self.config.output_path().to_string());
        };

        tracing::debug!("Creating ZIP file with {} files", files.len());
        let zip_data = {
            let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
            for (name, data) in &files {
                zip.start_file::<_, ()>(*name, FileOptions::default())?;
                zip.write_all(data)?;
            }
            zip.finish()?.into_inner()
        };

        tracing::debug!("Writing ZIP file ({} bytes) to storage", zip_data.len());
        self.storage.write_file(archive_name, &zip_data).await?;
        Ok(format!("{}/{}", self.config.output_path(), archive_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::params::AnalyzeParams;
    use crate::utils::error::EtlError;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    const SALES_CSV: &str = "Region,Amount\nN,10\nN,\nS,20\nS,20\n";

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn with_input(name: &str, data: &str) -> Self {
            let mut files = HashMap::new();
            files.insert(name.to_string(), data.as_bytes().to_vec());
            Self {
                files: Arc::new(Mutex::new(files)),
            }
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                EtlError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct MockConfig {
        input_path: String,
        output_path: String,
        params: AnalyzeParams,
        formats: Vec<String>,
        archive: Option<String>,
        preview_limit: Option<usize>,
    }

    impl MockConfig {
        fn new(params: AnalyzeParams) -> Self {
            Self {
                input_path: "sales.csv".to_string(),
                output_path: "test_output".to_string(),
                params,
                formats: vec!["csv".to_string(), "json".to_string()],
                archive: None,
                preview_limit: None,
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn input_path(&self) -> &str {
            &self.input_path
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
            self.archive.as_deref()
        }

        fn preview_limit(&self) -> Option<usize> {
            self.preview_limit
        }
    }

    fn zero_fill_params() -> AnalyzeParams {
        AnalyzeParams::from_json(
            r#"{"amount_column": "amount", "fill_missing": "zero", "group_by": ["region"]}"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_extract_reads_csv_from_storage() {
        let storage = MockStorage::with_input("sales.csv", SALES_CSV);
        let pipeline = SalesPipeline::new(storage, MockConfig::new(AnalyzeParams::default()));

        let dataset = pipeline.extract().await.unwrap();
        assert_eq!(dataset.columns(), ["Region", "Amount"]);
        assert_eq!(dataset.len(), 4);
    }

    #[tokio::test]
    async fn test_extract_missing_input_is_io_error() {
        let storage = MockStorage::with_input("other.csv", SALES_CSV);
        let pipeline = SalesPipeline::new(storage, MockConfig::new(AnalyzeParams::default()));

        let err = pipeline.extract().await.unwrap_err();
        assert!(matches!(err, EtlError::IoError(_)));
    }

    #[tokio::test]
    async fn test_transform_cleans_and_aggregates() {
        let storage = MockStorage::with_input("sales.csv", SALES_CSV);
        let mut config = MockConfig::new(zero_fill_params());
        config.preview_limit = Some(2);
        let pipeline = SalesPipeline::new(storage, config);

        let dataset = pipeline.extract().await.unwrap();
        let result = pipeline.transform(dataset).await.unwrap();

        // the duplicate S row is dropped
        assert_eq!(result.cleaned.len(), 3);
        assert_eq!(result.analysis.summary.amount_sum, Some(30.0));

        let groups = result.analysis.groups.unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].count, Some(2));
        assert_eq!(groups[0].total_amount, Some(10.0));

        let preview = result.preview.unwrap();
        assert_eq!(preview.rows.len(), 2);
    }

    #[tokio::test]
    async fn test_transform_rejects_bad_preview_limit() {
        let storage = MockStorage::with_input("sales.csv", SALES_CSV);
        let mut config = MockConfig::new(AnalyzeParams::default());
        config.preview_limit = Some(0);
        let pipeline = SalesPipeline::new(storage, config);

        let dataset = pipeline.extract().await.unwrap();
        assert!(pipeline.transform(dataset).await.is_err());
    }

    #[tokio::test]
    async fn test_load_writes_separate_files() {
        let storage = MockStorage::with_input("sales.csv", SALES_CSV);
        let pipeline = SalesPipeline::new(storage.clone(), MockConfig::new(zero_fill_params()));

        let dataset = pipeline.extract().await.unwrap();
        let result = pipeline.transform(dataset).await.unwrap();
        let output_path = pipeline.load(result).await.unwrap();

        assert_eq!(output_path, "test_output");

        let csv = String::from_utf8(storage.get_file(CLEANED_FILE).await.unwrap()).unwrap();
        assert_eq!(csv, "region,amount\nN,10\nN,0\nS,20\n");

        let analysis: serde_json::Value =
            serde_json::from_slice(&storage.get_file(ANALYSIS_FILE).await.unwrap()).unwrap();
        assert_eq!(analysis["summary"]["rows"], 3);
        assert_eq!(analysis["groups"][1]["keys"]["region"], "S");
        assert!(storage.get_file(PREVIEW_FILE).await.is_none());
    }

    #[tokio::test]
    async fn test_load_bundles_zip() {
        let storage = MockStorage::with_input("sales.csv", SALES_CSV);
        let mut config = MockConfig::new(zero_fill_params());
        config.archive = Some("report.zip".to_string());
        config.preview_limit = Some(5);
        let pipeline = SalesPipeline::new(storage.clone(), config);

        let dataset = pipeline.extract().await.unwrap();
        let result = pipeline.transform(dataset).await.unwrap();
        let output_path = pipeline.load(result).await.unwrap();

        assert_eq!(output_path, "test_output/report.zip");
        assert!(storage.get_file(CLEANED_FILE).await.is_none());

        let zip_bytes = storage.get_file("report.zip").await.unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_bytes)).unwrap();
        let mut file_names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        file_names.sort();

        assert_eq!(file_names, vec![ANALYSIS_FILE, CLEANED_FILE, PREVIEW_FILE]);
    }

    #[tokio::test]
    async fn test_load_csv_only() {
        let storage = MockStorage::with_input("sales.csv", SALES_CSV);
        let mut config = MockConfig::new(AnalyzeParams::default());
        config.formats = vec!["csv".to_string()];
        let pipeline = SalesPipeline::new(storage.clone(), config);

        let dataset = pipeline.extract().await.unwrap();
        let result = pipeline.transform(dataset).await.unwrap();
        pipeline.load(result).await.unwrap();

        assert!(storage.get_file(CLEANED_FILE).await.is_some());
        assert!(storage.get_file(ANALYSIS_FILE).await.is_none());
    }
}

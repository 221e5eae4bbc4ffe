use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("🚀 Starting ETL process...");
        self.monitor.log_stats("Start");

        // Extract
        tracing::info!("📥 Extracting data...");
        let raw_data = self.pipeline.extract().await?;
        tracing::info!(
            "Extracted {} rows x {} columns",
            raw_data.len(),
            raw_data.width()
        );
        self.monitor.log_stats("Extract");

        // Transform
        tracing::info!("🧹 Cleaning and aggregating data...");
        let transformed = self.pipeline.transform(raw_data).await?;
        tracing::info!(
            "Cleaned dataset has {} rows; {} group(s) computed",
            transformed.cleaned.len(),
            transformed
                .analysis
                .groups
                .as_ref()
                .map(Vec::len)
                .unwrap_or(0)
        );
        self.monitor.log_stats("Transform");

        // Load
        tracing::info!("💾 Loading results...");
        let output_path = self.pipeline.load(transformed).await?;
        tracing::info!("Output saved to: {}", output_path);
        self.monitor.log_stats("Load");

        self.monitor.log_final_stats();
        Ok(output_path)
    }
}

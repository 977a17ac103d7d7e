use crate::domain::model::{TransformResult, UploadReport};
use crate::domain::ports::Pipeline;
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

    pub async fn run(&self) -> Result<UploadReport> {
        tracing::info!("🚀 Starting ETL process");

        let transformed = self.extract_and_transform().await?;

        tracing::info!("📤 Loading {} records", transformed.selected_count());
        let report = self.pipeline.load(transformed).await?;
        self.monitor.log_stats("Load");
        self.monitor.log_final_stats();

        tracing::info!(
            "✅ Uploaded {}/{} products, {} failures",
            report.succeeded,
            report.attempted,
            report.failures.len()
        );
        Ok(report)
    }

    /// Runs extract and transform only; nothing is sent anywhere.
    pub async fn dry_run(&self) -> Result<TransformResult> {
        tracing::info!("🔍 Dry run: extract and transform only");
        let transformed = self.extract_and_transform().await?;
        self.monitor.log_final_stats();
        Ok(transformed)
    }

    async fn extract_and_transform(&self) -> Result<TransformResult> {
        tracing::info!("📥 Extracting data");
        let extracted = self.pipeline.extract().await?;
        tracing::info!(
            "Extracted {} price/stock rows and {} products",
            extracted.prices.len(),
            extracted.products.len()
        );
        self.monitor.log_stats("Extract");

        tracing::info!("🔄 Transforming data");
        let transformed = self.pipeline.transform(extracted).await?;
        tracing::info!(
            "Merged {} records, selected {} for upload",
            transformed.merged_count,
            transformed.selected_count()
        );
        self.monitor.log_stats("Transform");

        Ok(transformed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{BranchBatch, ExtractedData, MergedRecord, PriceStockRow};
    use std::sync::atomic::{AtomicBool, Ordering};

    struct StubPipeline {
        loaded: AtomicBool,
    }

    #[async_trait::async_trait]
    impl Pipeline for StubPipeline {
        async fn extract(&self) -> Result<ExtractedData> {
            Ok(ExtractedData {
                prices: vec![PriceStockRow {
                    sku: "1".to_string(),
                    branch: "MM".to_string(),
                    price: Some(1.0),
                    stock: Some(1.0),
                }],
                products: Vec::new(),
            })
        }

        async fn transform(&self, data: ExtractedData) -> Result<TransformResult> {
            let records: Vec<MergedRecord> =
                data.prices.iter().map(|row| MergedRecord::new(row, None)).collect();
            Ok(TransformResult {
                merged_count: records.len(),
                batches: vec![BranchBatch {
                    label: "MM".to_string(),
                    partition_size: records.len(),
                    records,
                }],
                snapshot_csv: String::new(),
            })
        }

        async fn load(&self, result: TransformResult) -> Result<UploadReport> {
            self.loaded.store(true, Ordering::SeqCst);
            Ok(UploadReport {
                merchant_id: "m".to_string(),
                attempted: result.selected_count(),
                succeeded: result.selected_count(),
                failures: Vec::new(),
                generated_at: chrono::Utc::now(),
            })
        }
    }

    #[tokio::test]
    async fn test_run_goes_through_all_phases() {
        let engine = EtlEngine::new(StubPipeline {
            loaded: AtomicBool::new(false),
        });

        let report = engine.run().await.unwrap();
        assert_eq!(report.attempted, 1);
        assert!(engine.pipeline.loaded.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_dry_run_skips_load() {
        let engine = EtlEngine::new_with_monitoring(
            StubPipeline {
                loaded: AtomicBool::new(false),
            },
            true,
        );

        let transformed = engine.dry_run().await.unwrap();
        assert_eq!(transformed.selected_count(), 1);
        assert!(!engine.pipeline.loaded.load(Ordering::SeqCst));
    }
}

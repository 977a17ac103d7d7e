use crate::config::credentials::Credentials;
use crate::config::toml_config::IntegrationConfig;
use crate::core::cleaning::{prepare_prices_stock, prepare_products, CsvSource};
use crate::core::selection::{merge_on_sku, render_snapshot, select_batches};
use crate::domain::model::{
    ApiResponse, ExtractedData, MerchantUpdate, ProductFailure, ProductPayload, TransformResult,
    UploadReport,
};
use crate::domain::ports::{MerchantApi, Pipeline, Storage};
use crate::utils::error::{EtlError, Result};
use std::time::Duration;

/// Status recorded for an upload that never got an HTTP response.
pub const TRANSPORT_FAILURE_STATUS: u16 = 0;

/// Cleans the Richart's exports and uploads the top-priced products per branch.
pub struct RichartPipeline<S: Storage, A: MerchantApi> {
    pub(crate) storage: S,
    pub(crate) config: IntegrationConfig,
    pub(crate) api: A,
    pub(crate) credentials: Option<Credentials>,
}

impl<S: Storage, A: MerchantApi> RichartPipeline<S, A> {
    pub fn new(storage: S, config: IntegrationConfig, api: A) -> Self {
        Self {
            storage,
            config,
            api,
            credentials: None,
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Token, merchant lookup, activation and store cleanup; returns the
    /// token and the merchant id products are uploaded under.
    async fn prepare_merchant(&self) -> Result<(String, String)> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| EtlError::MissingConfigError {
                field: "credentials".to_string(),
            })?;

        tracing::info!("🔑 Requesting access token from {}", self.config.api.base_url);
        let token = self.api.fetch_token(credentials).await?;
        if self.config.api.token_settle_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.api.token_settle_ms)).await;
        }

        let merchant = &self.config.merchant;
        let merchant_id = self.api.merchant_id(&merchant.name, &token).await?;
        tracing::info!("🏪 Merchant '{}' resolved to {}", merchant.name, merchant_id);

        let update = MerchantUpdate {
            id: merchant_id.clone(),
            name: merchant.display_name.clone(),
            can_be_deleted: merchant.can_be_deleted,
            can_be_updated: merchant.can_be_updated,
            is_active: true,
        };
        let response = self.api.update_merchant(&update, &token).await?;
        if response.is_success() {
            tracing::info!("Merchant {} activated as '{}'", merchant_id, update.name);
        } else {
            tracing::warn!(
                "⚠️ Merchant update returned HTTP {}: {}",
                response.status,
                response.body
            );
        }

        if let Some(store) = self.config.store_to_delete() {
            let store_id = self.api.merchant_id(store, &token).await?;
            let response = self.api.delete_merchant(&store_id, &token).await?;
            if response.is_success() {
                tracing::info!("🗑️ Store '{}' ({}) deleted", store, store_id);
            } else {
                tracing::warn!(
                    "⚠️ Deleting store '{}' returned HTTP {}: {}",
                    store,
                    response.status,
                    response.body
                );
            }
        }

        Ok((token, merchant_id))
    }
}

#[async_trait::async_trait]
impl<S: Storage, A: MerchantApi> Pipeline for RichartPipeline<S, A> {
    async fn extract(&self) -> Result<ExtractedData> {
        let source = &self.config.source;
        let delimiter = self.config.delimiter_byte()?;

        tracing::info!("📄 Reading {} and {}", source.prices_file, source.products_file);
        let prices_data = self.storage.read_file(&source.prices_file).await?;
        let products_data = self.storage.read_file(&source.products_file).await?;

        let prices = prepare_prices_stock(
            CsvSource::new(&source.prices_file, &prices_data).with_delimiter(delimiter),
            &self.config.selection.branches,
        )?;
        let products = prepare_products(
            CsvSource::new(&source.products_file, &products_data).with_delimiter(delimiter),
        )?;

        Ok(ExtractedData { prices, products })
    }

    async fn transform(&self, data: ExtractedData) -> Result<TransformResult> {
        let selection = &self.config.selection;

        let merged = merge_on_sku(&data.prices, &data.products);
        let merged_count = merged.len();
        let batches = select_batches(merged, &selection.partition_branch, selection.top_n);

        for batch in &batches {
            tracing::info!(
                "🏷️ {}: {} records, top {} selected",
                batch.label,
                batch.partition_size,
                batch.records.len()
            );
        }

        let snapshot_csv = render_snapshot(&batches, self.config.delimiter_byte()?)?;

        Ok(TransformResult {
            merged_count,
            batches,
            snapshot_csv,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<UploadReport> {
        if let Some(snapshot_file) = &self.config.load.snapshot_file {
            self.storage
                .write_file(snapshot_file, result.snapshot_csv.as_bytes())
                .await?;
            tracing::info!("📁 Selection snapshot saved to {}", snapshot_file);
        }

        let (token, merchant_id) = self.prepare_merchant().await?;

        let mut attempted = 0usize;
        let mut succeeded = 0usize;
        let mut failures: Vec<ProductFailure> = Vec::new();

        for batch in &result.batches {
            tracing::info!("📦 Uploading {} products for {}", batch.records.len(), batch.label);

            for record in &batch.records {
                let Some(payload) = ProductPayload::from_record(&merchant_id, record) else {
                    tracing::debug!("Skipping SKU {} without a price", record.sku);
                    continue;
                };

                attempted += 1;
                let response = match self.api.send_product(&payload, &token).await {
                    Ok(response) => response,
                    Err(e) => {
                        tracing::warn!(
                            "⚠️ SKU {} ({}) was not delivered: {}",
                            payload.sku,
                            record.branch,
                            e
                        );
                        ApiResponse {
                            status: TRANSPORT_FAILURE_STATUS,
                            body: serde_json::Value::String(e.to_string()),
                        }
                    }
                };
                if response.status == 200 {
                    succeeded += 1;
                    continue;
                }

                if response.status != TRANSPORT_FAILURE_STATUS {
                    tracing::warn!(
                        "⚠️ SKU {} ({}) rejected with HTTP {}",
                        payload.sku,
                        record.branch,
                        response.status
                    );
                }
                failures.push(ProductFailure {
                    error_id: failures.len() + 1,
                    status: response.status,
                    payload,
                    response: response.body,
                });
            }
        }

        let report = UploadReport {
            merchant_id,
            attempted,
            succeeded,
            failures,
            generated_at: chrono::Utc::now(),
        };

        if let Some(report_file) = &self.config.load.report_file {
            let json = serde_json::to_vec_pretty(&report)?;
            self.storage.write_file(report_file, &json).await?;
            tracing::info!("📁 Upload report saved to {}", report_file);
        }

        Ok(report)
    }
}

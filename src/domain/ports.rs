use crate::config::credentials::Credentials;
use crate::domain::model::{
    ApiResponse, ExtractedData, MerchantUpdate, ProductPayload, TransformResult, UploadReport,
};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// The merchant-management endpoints the upload talks to.
#[async_trait]
pub trait MerchantApi: Send + Sync {
    async fn fetch_token(&self, credentials: &Credentials) -> Result<String>;
    async fn merchant_id(&self, name: &str, token: &str) -> Result<String>;
    async fn update_merchant(&self, update: &MerchantUpdate, token: &str) -> Result<ApiResponse>;
    async fn delete_merchant(&self, id: &str, token: &str) -> Result<ApiResponse>;
    async fn send_product(&self, payload: &ProductPayload, token: &str) -> Result<ApiResponse>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<ExtractedData>;
    async fn transform(&self, data: ExtractedData) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<UploadReport>;
}

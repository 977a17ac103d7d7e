use crate::config::credentials::Credentials;
use crate::config::toml_config::ApiConfig;
use crate::domain::model::{ApiResponse, MerchantList, MerchantUpdate, ProductPayload};
use crate::domain::ports::MerchantApi;
use crate::utils::error::{EtlError, Result};
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;

/// reqwest-backed client for the merchant-management API.
pub struct MerchantClient {
    client: Client,
    base_url: String,
    token_header: String,
}

impl MerchantClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(timeout));
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token_header: config.token_header.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder, token: &str) -> RequestBuilder {
        request.header(self.token_header.as_str(), format!("Bearer {}", token))
    }

    /// Reads the body as JSON, falling back to the raw text.
    async fn into_api_response(response: Response) -> Result<ApiResponse> {
        let status = response.status().as_u16();
        let text = response.text().await?;

        let body = if text.trim().is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text))
        };

        Ok(ApiResponse { status, body })
    }
}

#[async_trait::async_trait]
impl MerchantApi for MerchantClient {
    async fn fetch_token(&self, credentials: &Credentials) -> Result<String> {
        tracing::debug!("POST {}/oauth/token", self.base_url);

        let response = self
            .client
            .post(self.url("/oauth/token"))
            .query(&[
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
                ("grant_type", credentials.grant_type.as_str()),
            ])
            .send()
            .await?;
        let response = Self::into_api_response(response).await?;

        response
            .body
            .get("access_token")
            .and_then(|token| token.as_str())
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .ok_or_else(|| EtlError::AuthError {
                message: format!("no access_token in token response (HTTP {})", response.status),
            })
    }

    async fn merchant_id(&self, name: &str, token: &str) -> Result<String> {
        tracing::debug!("GET {}/api/merchants", self.base_url);

        let request = self.client.get(self.url("/api/merchants"));
        let response = self.authorized(request, token).send().await?;
        let response = Self::into_api_response(response).await?;

        if !response.is_success() {
            return Err(EtlError::RemoteError {
                endpoint: "GET /api/merchants".to_string(),
                status: response.status,
            });
        }

        let list: MerchantList = serde_json::from_value(response.body)?;
        list.id_of(name)
            .map(str::to_string)
            .ok_or_else(|| EtlError::MerchantNotFound {
                name: name.to_string(),
            })
    }

    async fn update_merchant(&self, update: &MerchantUpdate, token: &str) -> Result<ApiResponse> {
        tracing::debug!("PUT {}/api/merchants/{}", self.base_url, update.id);

        let request = self
            .client
            .put(self.url(&format!("/api/merchants/{}", update.id)))
            .json(update);
        let response = self.authorized(request, token).send().await?;
        Self::into_api_response(response).await
    }

    async fn delete_merchant(&self, id: &str, token: &str) -> Result<ApiResponse> {
        tracing::debug!("DELETE {}/api/merchants/{}", self.base_url, id);

        let request = self.client.delete(self.url(&format!("/api/merchants/{}", id)));
        let response = self.authorized(request, token).send().await?;
        Self::into_api_response(response).await
    }

    async fn send_product(&self, payload: &ProductPayload, token: &str) -> Result<ApiResponse> {
        tracing::debug!("POST {}/api/products sku={}", self.base_url, payload.sku);

        let request = self.client.post(self.url("/api/products")).json(payload);
        let response = self.authorized(request, token).send().await?;
        Self::into_api_response(response).await
    }
}

use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::GatewayConfig,
    data_objects::{ChargeRequest, ChargeResponse, GatewayBeneficiary, NewGatewayBeneficiary},
    GatewayApiError,
};

#[derive(Clone)]
pub struct GatewayApi {
    config: GatewayConfig,
    client: Arc<Client>,
}

impl GatewayApi {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let val = HeaderValue::from_str(&format!("Bearer {}", config.api_key.reveal()))
            .map_err(|e| GatewayApiError::Initialization(e.to_string()))?;
        headers.insert("Authorization", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, GatewayApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {url}");
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| GatewayApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| GatewayApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| GatewayApiError::RestResponseError(e.to_string()))?;
            Err(GatewayApiError::QueryError { status, message })
        }
    }

    /// `rest_query` with the configured bounded retry policy: transport failures and 5xx responses are
    /// retried with doubling backoff, 4xx rejections surface immediately. The request body must be cloneable
    /// since each attempt re-serializes it.
    pub async fn rest_query_with_retry<T: DeserializeOwned, B: Serialize + Clone>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, GatewayApiError> {
        let mut backoff = std::time::Duration::from_millis(250);
        let mut attempt = 0u32;
        loop {
            match self.rest_query(method.clone(), path, body.clone()).await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    warn!("Gateway call {path} failed (attempt {attempt}/{}): {e}. Retrying.", self.config.max_retries);
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                },
                Err(e) => return Err(e),
            }
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    pub async fn create_charge(&self, charge: ChargeRequest) -> Result<ChargeResponse, GatewayApiError> {
        if charge.amount <= 0 {
            return Err(GatewayApiError::InvalidCurrencyAmount(format!(
                "Charge amounts must be positive, not {}",
                charge.amount
            )));
        }
        debug!("Creating {} {} charge on the gateway", charge.amount, charge.currency);
        let response: ChargeResponse =
            self.rest_query_with_retry(Method::POST, "/v1/charges", Some(charge)).await?;
        info!("Charge [{}] created on the gateway", response.reference);
        Ok(response)
    }

    pub async fn create_beneficiary(
        &self,
        beneficiary: NewGatewayBeneficiary,
    ) -> Result<GatewayBeneficiary, GatewayApiError> {
        debug!("Registering beneficiary {} with the gateway", beneficiary.name);
        let result: GatewayBeneficiary =
            self.rest_query_with_retry(Method::POST, "/v1/beneficiaries", Some(beneficiary)).await?;
        info!("Beneficiary [{}] registered with the gateway", result.id);
        Ok(result)
    }

    pub async fn delete_beneficiary(&self, gateway_id: &str) -> Result<(), GatewayApiError> {
        let path = format!("/v1/beneficiaries/{gateway_id}");
        debug!("Removing beneficiary [{gateway_id}] from the gateway");
        self.rest_query_with_retry::<serde_json::Value, ()>(Method::DELETE, &path, None).await?;
        info!("Beneficiary [{gateway_id}] removed from the gateway");
        Ok(())
    }

    pub async fn fetch_beneficiaries(&self) -> Result<Vec<GatewayBeneficiary>, GatewayApiError> {
        debug!("Fetching beneficiary list from the gateway");
        let result: Vec<GatewayBeneficiary> =
            self.rest_query_with_retry(Method::GET, "/v1/beneficiaries", None::<()>).await?;
        debug!("Gateway reports {} beneficiaries", result.len());
        Ok(result)
    }
}

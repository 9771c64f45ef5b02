use std::time::Duration;

use cpg_common::Secret;
use log::*;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAX_RETRIES: u32 = 3;

#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    /// Base URL of the gateway API, e.g. "https://api.gateway.example".
    pub base_url: String,
    pub api_key: Secret<String>,
    /// Per-request timeout. Gateway calls suspend the calling request; they must never hang it.
    pub timeout: Duration,
    /// Bounded retry count for transport failures and 5xx responses, with doubling backoff.
    pub max_retries: u32,
}

impl GatewayConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("CPG_GATEWAY_URL").unwrap_or_else(|_| {
            warn!("CPG_GATEWAY_URL not set, using a (probably useless) default");
            "https://api.gateway.example".to_string()
        });
        let api_key = Secret::new(std::env::var("CPG_GATEWAY_API_KEY").unwrap_or_else(|_| {
            warn!("CPG_GATEWAY_API_KEY not set, using a (probably useless) default");
            "gw_test_00000000".to_string()
        }));
        let timeout = std::env::var("CPG_GATEWAY_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        let max_retries = std::env::var("CPG_GATEWAY_MAX_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_MAX_RETRIES);
        Self { base_url, api_key, timeout, max_retries }
    }
}

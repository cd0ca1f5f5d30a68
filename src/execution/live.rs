//! Live venue adapters. Illustrative implementations of the `Executor`
//! contract shaped after the host project's `PolymarketClobAdapter`: a
//! `reqwest::Client`, credentials pulled from the environment, HMAC
//! request signing where the venue demands it, and a `Debug` impl that
//! redacts secrets. These model the request/response shape and error
//! surface a real integration would have without depending on network
//! reachability in tests.

use super::{Executor, ExecutionError, OrderAck};
use crate::models::{Position, Side};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::Duration;

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct HyperliquidExecutor {
    client: Client,
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for HyperliquidExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperliquidExecutor")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct HyperliquidOrderPayload {
    coin: String,
    is_buy: bool,
    sz: f64,
    limit_px: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct HyperliquidOrderResponse {
    #[serde(default)]
    oid: Option<String>,
    #[serde(default)]
    avg_px: Option<f64>,
    #[serde(default)]
    err: Option<String>,
}

impl HyperliquidExecutor {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.hyperliquid.xyz";

    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("failed to build HTTP client");
        Self { client, api_key, base_url: Self::DEFAULT_BASE_URL.to_string() }
    }

    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("HYPERLIQUID_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        Some(Self::new(api_key))
    }

    fn sign_request(&self, body: &str, timestamp: i64) -> Result<String, ExecutionError> {
        let message = format!("{timestamp}{body}");
        let mut mac = HmacSha256::new_from_slice(self.api_key.as_bytes())
            .map_err(|e| ExecutionError::Venue(format!("HMAC key error: {e}")))?;
        mac.update(message.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

#[async_trait]
impl Executor for HyperliquidExecutor {
    fn name(&self) -> &str {
        "hyperliquid"
    }

    async fn place_order(&self, market: &str, side: Side, size: f64, price: Option<f64>) -> Result<OrderAck, ExecutionError> {
        let payload = HyperliquidOrderPayload {
            coin: market.to_string(),
            is_buy: side == Side::Buy,
            sz: size,
            limit_px: price,
        };
        let body = serde_json::to_string(&payload).map_err(|e| ExecutionError::Venue(e.to_string()))?;
        let timestamp = crate::time::now().timestamp();
        let signature = self.sign_request(&body, timestamp)?;

        let response = self
            .client
            .post(format!("{}/exchange", self.base_url))
            .header("HL-SIGNATURE", signature)
            .header("HL-TIMESTAMP", timestamp.to_string())
            .body(body)
            .send()
            .await
            .map_err(|e| ExecutionError::Venue(e.to_string()))?
            .json::<HyperliquidOrderResponse>()
            .await
            .map_err(|e| ExecutionError::Venue(e.to_string()))?;

        if let Some(err) = response.err {
            return Err(ExecutionError::Venue(err));
        }
        Ok(OrderAck {
            order_id: response.oid.ok_or_else(|| ExecutionError::Venue("missing order id in response".to_string()))?,
            filled_price: response.avg_px.or(price).unwrap_or(0.0),
            filled_size: size,
        })
    }

    async fn cancel_order(&self, id: &str) -> Result<(), ExecutionError> {
        let timestamp = crate::time::now().timestamp();
        let signature = self.sign_request(id, timestamp)?;
        self.client
            .post(format!("{}/cancel", self.base_url))
            .header("HL-SIGNATURE", signature)
            .header("HL-TIMESTAMP", timestamp.to_string())
            .body(id.to_string())
            .send()
            .await
            .map_err(|e| ExecutionError::Venue(e.to_string()))?;
        Ok(())
    }

    fn get_positions(&self) -> Vec<Position> {
        // A real integration would query the venue's account-state
        // endpoint; this adapter is illustrative and carries no local
        // position cache.
        Vec::new()
    }
}

#[derive(Clone)]
pub struct DriftExecutor {
    client: Client,
    rpc_url: String,
}

impl std::fmt::Debug for DriftExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriftExecutor")
            .field("rpc_url", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct DriftOrderPayload {
    market: String,
    direction: String,
    base_asset_amount: f64,
    price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct DriftOrderResponse {
    #[serde(default)]
    signature: Option<String>,
    #[serde(default)]
    fill_price: Option<f64>,
    #[serde(default)]
    error: Option<String>,
}

impl DriftExecutor {
    pub fn new(rpc_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("failed to build HTTP client");
        Self { client, rpc_url }
    }

    pub fn from_env() -> Option<Self> {
        let rpc_url = std::env::var("DRIFT_RPC_URL").ok()?;
        if rpc_url.trim().is_empty() {
            return None;
        }
        Some(Self::new(rpc_url))
    }
}

#[async_trait]
impl Executor for DriftExecutor {
    fn name(&self) -> &str {
        "drift"
    }

    async fn place_order(&self, market: &str, side: Side, size: f64, price: Option<f64>) -> Result<OrderAck, ExecutionError> {
        let payload = DriftOrderPayload {
            market: market.to_string(),
            direction: if side == Side::Buy { "long".to_string() } else { "short".to_string() },
            base_asset_amount: size,
            price,
        };
        let response = self
            .client
            .post(&self.rpc_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ExecutionError::Venue(e.to_string()))?
            .json::<DriftOrderResponse>()
            .await
            .map_err(|e| ExecutionError::Venue(e.to_string()))?;

        if let Some(error) = response.error {
            return Err(ExecutionError::Venue(error));
        }
        Ok(OrderAck {
            order_id: response.signature.ok_or_else(|| ExecutionError::Venue("missing signature in response".to_string()))?,
            filled_price: response.fill_price.or(price).unwrap_or(0.0),
            filled_size: size,
        })
    }

    async fn cancel_order(&self, _id: &str) -> Result<(), ExecutionError> {
        Err(ExecutionError::Venue("drift cancel-by-id is not supported by this adapter".to_string()))
    }

    fn get_positions(&self) -> Vec<Position> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_impls_redact_credentials() {
        let executor = HyperliquidExecutor::new("super-secret-key".to_string());
        let debug = format!("{executor:?}");
        assert!(!debug.contains("super-secret-key"));
        assert!(debug.contains("REDACTED"));

        let drift = DriftExecutor::new("https://rpc.example.com/secret-token".to_string());
        let debug = format!("{drift:?}");
        assert!(!debug.contains("secret-token"));
    }

    #[test]
    fn from_env_is_none_without_credentials() {
        std::env::remove_var("HYPERLIQUID_API_KEY");
        assert!(HyperliquidExecutor::from_env().is_none());
    }
}

//! JSON-RPC over HTTP to a wallet-capable node.
//!
//! One round trip per call: no caching, batching or retries.

use crate::config::CoreConfig;
use crate::constants::RPC_METHOD_NOT_FOUND;
use crate::error::TransportError;
use crate::wallet::{
    CallRequest, LedgerTransport, TransactionReceipt, TransactionRequest, WalletAgent,
    WalletProvider,
};
use async_trait::async_trait;
use hcr_types::{Address, TxHash};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub struct JsonRpcClient {
    http: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(url: impl Into<String>) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self::with_http(http, url))
    }

    /// Use a preconfigured HTTP client (proxy, timeouts, TLS roots).
    pub fn with_http(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send one request and deserialize its `result`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, TransportError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(method, id, "json-rpc request");

        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response = self.http.post(&self.url).json(&body).send().await?;
        let status = response.status();
        let envelope = serde_json::from_slice::<RpcResponse>(&response.bytes().await?)
            .map_err(|e| TransportError::Decode(e.to_string()));

        // Nodes may pair an error object with a non-2xx status; the error object decides.
        if !status.is_success() {
            return match envelope {
                Ok(envelope) if envelope.error.is_some() => envelope.into_result(),
                _ => Err(TransportError::Status(status.as_u16())),
            };
        }
        envelope?.into_result()
    }
}

/// Build the injected wallet capability from configuration.
///
/// Returns `None` when no endpoint is configured or the HTTP client cannot be built; the
/// connection attempt then fails as "agent unavailable" instead of aborting the process.
pub fn detect_agent(config: &CoreConfig) -> Option<Arc<dyn WalletProvider>> {
    let url = config.rpc_url()?;
    match JsonRpcClient::new(url) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            tracing::error!("failed to build JSON-RPC client for {}: {}", url, e);
            None
        }
    }
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

impl RpcResponse {
    fn into_result<T: DeserializeOwned>(self) -> Result<T, TransportError> {
        if let Some(error) = self.error {
            return Err(TransportError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        serde_json::from_value(self.result).map_err(|e| TransportError::Decode(e.to_string()))
    }
}

fn strip_hex_prefix(value: &str) -> Result<&str, TransportError> {
    value
        .strip_prefix("0x")
        .ok_or_else(|| TransportError::Decode(format!("expected 0x-prefixed hex, got {value:?}")))
}

fn hex_data(value: &str) -> Result<Vec<u8>, TransportError> {
    hex::decode(strip_hex_prefix(value)?).map_err(|e| TransportError::Decode(e.to_string()))
}

fn hex_quantity(value: &str) -> Result<u64, TransportError> {
    u64::from_str_radix(strip_hex_prefix(value)?, 16)
        .map_err(|e| TransportError::Decode(e.to_string()))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    transaction_hash: TxHash,
    #[serde(default)]
    block_number: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

impl TryFrom<RawReceipt> for TransactionReceipt {
    type Error = TransportError;

    fn try_from(raw: RawReceipt) -> Result<Self, Self::Error> {
        let block_number = raw.block_number.as_deref().map(hex_quantity).transpose()?;
        // Receipts without a status field predate status codes and only exist for
        // transactions that were included, so they count as successful.
        let succeeded = match raw.status.as_deref() {
            None => true,
            Some(status) => hex_quantity(status)? == 1,
        };

        Ok(TransactionReceipt {
            transaction_hash: raw.transaction_hash,
            block_number,
            succeeded,
        })
    }
}

fn hex_string(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

#[async_trait]
impl WalletAgent for JsonRpcClient {
    async fn request_accounts(&self) -> Result<Vec<Address>, TransportError> {
        match self
            .request::<Vec<Address>>("eth_requestAccounts", json!([]))
            .await
        {
            Err(TransportError::Rpc { code, .. }) if code == RPC_METHOD_NOT_FOUND => {
                tracing::debug!("eth_requestAccounts unsupported, falling back to eth_accounts");
                self.request("eth_accounts", json!([])).await
            }
            other => other,
        }
    }

    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<TxHash, TransportError> {
        let params = json!([{
            "from": tx.from,
            "to": tx.to,
            "data": hex_string(&tx.data),
        }]);
        self.request("eth_sendTransaction", params).await
    }
}

#[async_trait]
impl LedgerTransport for JsonRpcClient {
    async fn call(&self, call: &CallRequest) -> Result<Vec<u8>, TransportError> {
        let mut object = json!({
            "to": call.to,
            "data": hex_string(&call.data),
        });
        if let Some(from) = call.from {
            object["from"] = json!(from);
        }

        let result: String = self.request("eth_call", json!([object, "latest"])).await?;
        hex_data(&result)
    }

    async fn transaction_receipt(
        &self,
        hash: &TxHash,
    ) -> Result<Option<TransactionReceipt>, TransportError> {
        let raw: Option<RawReceipt> = self
            .request("eth_getTransactionReceipt", json!([hash]))
            .await?;
        raw.map(TransactionReceipt::try_from).transpose()
    }
}

use alloy_primitives::U256;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{RpcError, SystemError};
use crate::logging::{LogContext, MetricsLogger, PerformanceMonitor};
use crate::models::units::{parse_hex_u64, parse_quantity, to_hex_quantity};
use crate::models::{Block, Receipt};

#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: Vec<Value>,
    id: u64,
}

impl JsonRpcRequest {
    fn new(method: &str, params: Vec<Value>, id: u64) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
            id,
        }
    }
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
    #[serde(default)]
    id: Option<u64>,
}

impl JsonRpcResponse {
    /// A missing or null `result` without an error is a valid "not found"
    fn into_result(self) -> Result<Value, RpcError> {
        if let Some(error) = self.error {
            return Err(RpcError::Method {
                code: error.code,
                message: error.message,
            });
        }
        Ok(self.result.unwrap_or(Value::Null))
    }
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// JSON-RPC client bound to a single endpoint
#[derive(Clone)]
pub struct RpcClient {
    client: Client,
    endpoint: String,
    timeout_seconds: u64,
}

/// Shared HTTP client with a per-request deadline
pub fn build_http_client(timeout_seconds: u64) -> Result<Client, SystemError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| SystemError::HttpClient(e.to_string()))
}

impl RpcClient {
    pub fn new(endpoint: String, timeout_seconds: u64) -> Result<Self, SystemError> {
        let client = build_http_client(timeout_seconds)?;
        Ok(Self::with_client(client, endpoint, timeout_seconds))
    }

    /// Bind an existing HTTP client (and its connection pool) to an endpoint
    pub fn with_client(client: Client, endpoint: String, timeout_seconds: u64) -> Self {
        let context = LogContext::new("rpc_client", "initialization")
            .with_endpoint(&endpoint)
            .with_metadata("timeout_seconds", json!(timeout_seconds));
        context.debug("Binding RPC client to endpoint");

        Self {
            client,
            endpoint,
            timeout_seconds,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post(&self, body: &impl Serialize) -> Result<Value, RpcError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(body)
            .send()
            .await
            .map_err(|e| RpcError::from_transport(e, self.timeout_seconds))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(RpcError::RateLimit);
        }
        if !status.is_success() {
            return Err(RpcError::Status {
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RpcError::from_transport(e, self.timeout_seconds))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn make_request(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError> {
        let monitor = PerformanceMonitor::new("rpc_request")
            .with_metadata("method", json!(method))
            .with_metadata("endpoint", json!(self.endpoint));

        let request = JsonRpcRequest::new(method, params, 1);
        let result = match self.post(&request).await {
            Ok(body) => serde_json::from_value::<JsonRpcResponse>(body)
                .map_err(RpcError::from)
                .and_then(JsonRpcResponse::into_result),
            Err(e) => Err(e),
        };

        let duration = monitor.finish_with_result(&result);
        MetricsLogger::log_rpc_call(method, duration, result.is_ok());
        result
    }

    /// One HTTP round trip carrying several calls; results come back in
    /// request order regardless of the order the node answers in
    async fn make_batch_request(&self, method: &str, params: Vec<Vec<Value>>) -> Result<Vec<Value>, RpcError> {
        if params.is_empty() {
            return Ok(Vec::new());
        }

        let monitor = PerformanceMonitor::new("rpc_batch_request")
            .with_metadata("method", json!(method))
            .with_metadata("batch_size", json!(params.len()))
            .with_metadata("endpoint", json!(self.endpoint));

        let requests: Vec<JsonRpcRequest> = params
            .into_iter()
            .enumerate()
            .map(|(i, p)| JsonRpcRequest::new(method, p, i as u64 + 1))
            .collect();
        let expected = requests.len();

        let result = match self.post(&requests).await {
            Ok(body) => parse_batch(body, expected),
            Err(e) => Err(e),
        };

        let duration = monitor.finish_with_result(&result);
        MetricsLogger::log_rpc_call(method, duration, result.is_ok());
        result
    }

    pub async fn get_latest_block_number(&self) -> Result<u64, RpcError> {
        let result = self.make_request("eth_blockNumber", vec![]).await?;

        let hex_string = result
            .as_str()
            .ok_or_else(|| RpcError::InvalidResponse("Block number is not a string".to_string()))?;

        parse_hex_u64(hex_string)
            .map_err(|e| RpcError::InvalidResponse(format!("Failed to parse block number: {}", e)))
    }

    /// `None` when the node does not know the block yet
    pub async fn get_block_with_transactions(&self, block_number: u64) -> Result<Option<Block>, RpcError> {
        let params = vec![
            Value::String(to_hex_quantity(block_number)),
            Value::Bool(true), // Include full transaction objects
        ];

        let result = self.make_request("eth_getBlockByNumber", params).await?;
        if result.is_null() {
            return Ok(None);
        }

        let block: Block = serde_json::from_value(result)?;

        let context = LogContext::new("rpc_client", "get_block")
            .with_block_number(block_number)
            .with_metadata("transaction_count", json!(block.transactions.len()));
        context.debug(&format!(
            "Retrieved block {} with {} transactions",
            block_number,
            block.transactions.len()
        ));

        Ok(Some(block))
    }

    pub async fn get_transaction_receipt(&self, tx_hash: &str) -> Result<Option<Receipt>, RpcError> {
        let result = self
            .make_request("eth_getTransactionReceipt", vec![json!(tx_hash)])
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(result)?))
    }

    /// Batched `eth_getTransactionReceipt`, one entry per hash in input order
    pub async fn get_transaction_receipts(&self, tx_hashes: &[String]) -> Result<Vec<Option<Receipt>>, RpcError> {
        let params = tx_hashes.iter().map(|hash| vec![json!(hash)]).collect();
        let results = self.make_batch_request("eth_getTransactionReceipt", params).await?;

        results
            .into_iter()
            .map(|value| {
                if value.is_null() {
                    Ok(None)
                } else {
                    serde_json::from_value(value).map(Some).map_err(RpcError::from)
                }
            })
            .collect()
    }

    /// `eth_call` against the latest state; returns the raw hex output
    pub async fn call(&self, to: &str, data: &str) -> Result<String, RpcError> {
        let params = vec![json!({ "to": to, "data": data }), json!("latest")];
        let result = self.make_request("eth_call", params).await?;

        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| RpcError::InvalidResponse("eth_call result is not a string".to_string()))
    }

    /// Native balance in base units
    pub async fn get_balance(&self, address: &str) -> Result<U256, RpcError> {
        let result = self
            .make_request("eth_getBalance", vec![json!(address), json!("latest")])
            .await?;

        let hex_string = result
            .as_str()
            .ok_or_else(|| RpcError::InvalidResponse("Balance is not a string".to_string()))?;

        parse_quantity(hex_string)
            .map_err(|e| RpcError::InvalidResponse(format!("Failed to parse balance: {}", e)))
    }
}

fn parse_batch(body: Value, expected: usize) -> Result<Vec<Value>, RpcError> {
    let responses: Vec<JsonRpcResponse> = match body {
        Value::Array(_) => serde_json::from_value(body)?,
        // Nodes without batch support answer with a single error object
        Value::Object(_) => {
            let single: JsonRpcResponse = serde_json::from_value(body)?;
            single.into_result()?;
            return Err(RpcError::InvalidResponse(
                "Expected a batch response array".to_string(),
            ));
        }
        _ => {
            return Err(RpcError::InvalidResponse(
                "Batch response is not an array".to_string(),
            ))
        }
    };

    if responses.len() != expected {
        return Err(RpcError::BatchMismatch {
            expected,
            got: responses.len(),
        });
    }

    let mut by_id = HashMap::with_capacity(expected);
    for response in responses {
        let id = response
            .id
            .ok_or_else(|| RpcError::InvalidResponse("Batch item without id".to_string()))?;
        by_id.insert(id, response);
    }

    (1..=expected as u64)
        .map(|id| {
            by_id
                .remove(&id)
                .ok_or_else(|| RpcError::InvalidResponse(format!("Missing batch item {}", id)))
                .and_then(JsonRpcResponse::into_result)
        })
        .collect()
}

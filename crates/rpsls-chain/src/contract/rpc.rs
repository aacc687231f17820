//! JSON-RPC client for an Ethereum node.
//!
//! Writes go through `eth_sendTransaction`, so the node (or the wallet in
//! front of it) holds the signing key for `from`.

use super::traits::{ChainError, ChainValue, ContractClient, Receipt, TxHash};
use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use reqwest::Client;
use rpsls_core::{ContractCall, DeployArgs, ReadField};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// Sepolia
pub const DEFAULT_CHAIN_ID: u64 = 11_155_111;

/// RPC client for the game contract
pub struct RpcContractClient {
    /// HTTP client
    client: Client,
    /// Node RPC URL
    rpc_url: String,
    /// Chain id attached to every transaction
    chain_id: u64,
    /// Creation bytecode of the game contract, needed only to deploy
    bytecode: Option<Vec<u8>>,
    receipt_poll: Duration,
    receipt_attempts: u32,
}

impl RpcContractClient {
    /// Create a new RPC client
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            rpc_url: rpc_url.into(),
            chain_id: DEFAULT_CHAIN_ID,
            bytecode: None,
            receipt_poll: Duration::from_secs(2),
            receipt_attempts: 90,
        }
    }

    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    pub fn with_bytecode(mut self, bytecode: Vec<u8>) -> Self {
        self.bytecode = Some(bytecode);
        self
    }

    pub fn with_receipt_polling(mut self, interval: Duration, attempts: u32) -> Self {
        self.receipt_poll = interval;
        self.receipt_attempts = attempts;
        self
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Make a JSON-RPC call
    async fn call(&self, method: &str, params: Value) -> Result<Value, ChainError> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params
        });

        debug!(method, request = %request, "rpc request");

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChainError::Network(e.to_string()))?;

        let result: Value = response
            .json()
            .await
            .map_err(|e| ChainError::Network(e.to_string()))?;

        debug!(method, response = %result, "rpc response");

        if let Some(error) = result.get("error") {
            return Err(classify_rpc_error(error));
        }

        result
            .get("result")
            .cloned()
            .ok_or_else(|| ChainError::Network("No result in response".to_string()))
    }

    async fn send_transaction(&self, tx: Value) -> Result<TxHash, ChainError> {
        let result = self.call("eth_sendTransaction", json!([tx])).await?;
        result
            .as_str()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| ChainError::Network(format!("Bad transaction hash: {result}")))
    }
}

fn quantity(value: U256) -> String {
    format!("0x{:x}", value)
}

fn hex_data(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Map a JSON-RPC error object onto the transaction error taxonomy.
fn classify_rpc_error(error: &Value) -> ChainError {
    let code = error.get("code").and_then(|c| c.as_i64()).unwrap_or_default();
    let msg = error
        .get("message")
        .and_then(|m| m.as_str())
        .unwrap_or("Unknown error")
        .to_string();
    let lower = msg.to_ascii_lowercase();

    // EIP-1193 user rejection
    if code == 4001 || lower.contains("denied") || lower.contains("rejected") {
        ChainError::Rejected(msg)
    } else if code == 3 || lower.contains("revert") {
        ChainError::Reverted(msg)
    } else if lower.contains("insufficient funds") {
        ChainError::Rejected(msg)
    } else {
        ChainError::Network(msg)
    }
}

/// Decode the single 32-byte word a getter returns.
fn decode_word(field: ReadField, raw: &str) -> Result<Option<ChainValue>, ChainError> {
    let bytes = hex::decode(raw.trim_start_matches("0x")).map_err(|e| ChainError::Read {
        field: field.function_name(),
        reason: e.to_string(),
    })?;
    if bytes.is_empty() {
        // no code at the address
        return Ok(None);
    }
    if bytes.len() != 32 {
        return Err(ChainError::Read {
            field: field.function_name(),
            reason: format!("expected 32 bytes, got {}", bytes.len()),
        });
    }

    let mut word = [0u8; 32];
    word.copy_from_slice(&bytes);
    Ok(Some(match field {
        ReadField::J1 | ReadField::J2 => ChainValue::Address(Address::from_slice(&word[12..])),
        ReadField::C1Hash => ChainValue::Bytes32(word),
        ReadField::C2 | ReadField::Stake | ReadField::LastAction => {
            ChainValue::Uint(U256::from_be_bytes(word))
        }
    }))
}

#[async_trait]
impl ContractClient for RpcContractClient {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    async fn read(&self, contract: Address, field: ReadField) -> Result<ChainValue, ChainError> {
        let params = json!([
            {
                "to": contract,
                "data": hex_data(&field.selector()),
            },
            "latest"
        ]);

        let result = self.call("eth_call", params).await.map_err(|e| match e {
            ChainError::Network(reason) | ChainError::Reverted(reason) => ChainError::Read {
                field: field.function_name(),
                reason,
            },
            other => other,
        })?;
        let raw = result.as_str().ok_or_else(|| ChainError::Read {
            field: field.function_name(),
            reason: format!("unexpected result {result}"),
        })?;

        decode_word(field, raw)?.ok_or(ChainError::ContractNotFound(contract))
    }

    async fn write(
        &self,
        from: Address,
        contract: Address,
        call: &ContractCall,
        value: U256,
    ) -> Result<TxHash, ChainError> {
        let tx = json!({
            "from": from,
            "to": contract,
            "data": hex_data(&call.calldata()),
            "value": quantity(value),
            "chainId": format!("0x{:x}", self.chain_id),
        });
        self.send_transaction(tx).await
    }

    async fn deploy(&self, from: Address, args: &DeployArgs) -> Result<TxHash, ChainError> {
        let bytecode = self.bytecode.as_ref().ok_or(ChainError::NoBytecode)?;
        let tx = json!({
            "from": from,
            "data": hex_data(&args.creation_code(bytecode)),
            "value": quantity(args.stake),
            "chainId": format!("0x{:x}", self.chain_id),
        });
        self.send_transaction(tx).await
    }

    async fn wait_for_receipt(&self, tx: &TxHash) -> Result<Receipt, ChainError> {
        for _ in 0..self.receipt_attempts {
            let result = self
                .call("eth_getTransactionReceipt", json!([tx.to_hex()]))
                .await?;

            if !result.is_null() {
                let success = result.get("status").and_then(|s| s.as_str()) == Some("0x1");
                let contract_address = result
                    .get("contractAddress")
                    .and_then(|a| a.as_str())
                    .and_then(|a| a.parse::<Address>().ok());
                return Ok(Receipt {
                    tx_hash: *tx,
                    success,
                    contract_address,
                });
            }

            tokio::time::sleep(self.receipt_poll).await;
        }

        Err(ChainError::Network(format!(
            "No receipt for {tx} after {} attempts",
            self.receipt_attempts
        )))
    }
}

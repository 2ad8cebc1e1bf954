//! Shared utilities for integration tests: a programmable mock JSON-RPC node.

#![allow(dead_code)]

use alloy::consensus::{Transaction, TxEnvelope};
use alloy::eips::eip2718::Decodable2718;
use alloy::primitives::{keccak256, Address, Bytes};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use wallet_session::adapters::{
    AdapterRegistry, ChainGuardPlugin, LocalKeyAdapter, NodeAccountsAdapter,
};
use wallet_session::chain::ChainConfig;
use wallet_session::config::AppConfig;
use wallet_session::session::SessionStore;
use wallet_session::AuthSessionManager;

/// First Anvil development account.
pub const DEV_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const DEV_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";
pub const CONTRACT_ADDRESS: &str = "0x5fbdb2315678afecb367f032d93f642f64180aa3";
pub const ONE_ETHER_HEX: &str = "0xde0b6b3a7640000";

pub fn dev_signer() -> PrivateKeySigner {
    DEV_KEY.parse().unwrap()
}

pub fn dev_address() -> Address {
    DEV_ADDRESS.parse().unwrap()
}

struct NodeState {
    chain_id: u64,
    revert: AtomicBool,
    call_result: Mutex<Bytes>,
    calls: Mutex<Vec<String>>,
    /// Submitted tx hash → whether it created a contract.
    submitted: Mutex<HashMap<String, bool>>,
}

/// Mock Ethereum node speaking JSON-RPC over plain HTTP/1.1.
pub struct MockNode {
    pub url: String,
    state: Arc<NodeState>,
}

impl MockNode {
    /// Start a node reporting chain id 31337 (0x7a69).
    pub async fn start() -> Self {
        Self::start_with_chain_id(31337).await
    }

    pub async fn start_with_chain_id(chain_id: u64) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(NodeState {
            chain_id,
            revert: AtomicBool::new(false),
            call_result: Mutex::new(Bytes::new()),
            calls: Mutex::new(Vec::new()),
            submitted: Mutex::new(HashMap::new()),
        });

        let shared = state.clone();
        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((socket, _)) => {
                        let state = shared.clone();
                        tokio::spawn(async move {
                            let _ = serve_connection(socket, state).await;
                        });
                    }
                    Err(_) => break,
                }
            }
        });

        Self {
            url: format!("http://{}", addr),
            state,
        }
    }

    /// Make every following receipt report a reverted transaction.
    pub fn set_revert(&self, revert: bool) {
        self.state.revert.store(revert, Ordering::SeqCst);
    }

    /// Raw return data for `eth_call`.
    pub fn set_call_result(&self, data: impl Into<Bytes>) {
        *self.state.call_result.lock().unwrap() = data.into();
    }

    /// Methods received so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.state.calls.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls().iter().filter(|m| m.as_str() == method).count()
    }
}

async fn serve_connection(mut socket: TcpStream, state: Arc<NodeState>) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let end = (header_end + content_length).min(buf.len());
    let request: Value = serde_json::from_slice(&buf[header_end..end]).unwrap_or(Value::Null);
    let body = dispatch(&state, &request).to_string();

    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    socket.write_all(response.as_bytes()).await?;
    socket.shutdown().await
}

fn dispatch(state: &NodeState, request: &Value) -> Value {
    let id = request.get("id").cloned().unwrap_or(Value::Null);
    let method = request.get("method").and_then(Value::as_str).unwrap_or_default();
    let params = request.get("params").cloned().unwrap_or(Value::Null);
    state.calls.lock().unwrap().push(method.to_string());

    let result = match method {
        "eth_chainId" => json!(format!("{:#x}", state.chain_id)),
        "eth_accounts" => json!([DEV_ADDRESS]),
        "eth_getBalance" => json!(ONE_ETHER_HEX),
        "eth_blockNumber" => json!("0x1"),
        "eth_getTransactionCount" => json!("0x0"),
        "eth_gasPrice" => json!("0x3b9aca00"),
        "eth_estimateGas" => json!("0x5208"),
        "eth_call" => json!(alloy::hex::encode_prefixed(
            state.call_result.lock().unwrap().as_ref()
        )),
        "personal_sign" => {
            let data = params[0].as_str().unwrap_or_default();
            let message = alloy::hex::decode(data).unwrap_or_default();
            let signature = dev_signer().sign_message_sync(&message).unwrap();
            json!(alloy::hex::encode_prefixed(signature.as_bytes()))
        }
        "eth_sendRawTransaction" => {
            let raw = alloy::hex::decode(params[0].as_str().unwrap_or_default()).unwrap_or_default();
            let creates = TxEnvelope::decode_2718(&mut raw.as_slice())
                .map(|tx| tx.to().is_none())
                .unwrap_or(false);
            submit(state, alloy::hex::encode_prefixed(keccak256(&raw)), creates)
        }
        "eth_sendTransaction" => {
            let tx = &params[0];
            let creates = tx.get("to").map_or(true, Value::is_null);
            submit(state, alloy::hex::encode_prefixed(keccak256(tx.to_string().as_bytes())), creates)
        }
        "eth_getTransactionReceipt" => {
            let hash = params[0].as_str().unwrap_or_default().to_lowercase();
            let creates = state.submitted.lock().unwrap().get(&hash).copied();
            match creates {
                Some(creates) => receipt(&hash, creates, state.revert.load(Ordering::SeqCst)),
                None => Value::Null,
            }
        }
        other => {
            return json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": { "code": -32601, "message": format!("method {} not supported", other) }
            })
        }
    };

    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn submit(state: &NodeState, hash: String, creates: bool) -> Value {
    let hash = hash.to_lowercase();
    state.submitted.lock().unwrap().insert(hash.clone(), creates);
    json!(hash)
}

fn receipt(hash: &str, creates: bool, reverted: bool) -> Value {
    json!({
        "transactionHash": hash,
        "transactionIndex": "0x0",
        "blockHash": format!("0x{}", "11".repeat(32)),
        "blockNumber": "0x1",
        "from": DEV_ADDRESS,
        "to": if creates { Value::Null } else { json!("0x70997970c51812dc3a010c7d01b50e0d17dc79c8") },
        "cumulativeGasUsed": "0x5208",
        "gasUsed": "0x5208",
        "effectiveGasPrice": "0x3b9aca00",
        "contractAddress": if creates { json!(CONTRACT_ADDRESS) } else { Value::Null },
        "logs": [],
        "logsBloom": format!("0x{}", "00".repeat(256)),
        "type": "0x0",
        "status": if reverted { "0x0" } else { "0x1" },
    })
}

/// Configuration pointing at `node` with fast receipt polling.
pub fn test_config(node: &MockNode) -> AppConfig {
    let mut config = AppConfig::default();
    config.client_id = "test-client".to_string();
    config.chain = ChainConfig::local(node.url.clone());
    config.rpc.timeout_secs = 5;
    config.rpc.receipt_timeout_secs = 5;
    config.rpc.poll_interval_ms = 20;
    config
}

/// Manager with a local-key "openlogin" adapter (default), a node-accounts
/// "injected" adapter and a strict chain guard.
pub fn test_manager(config: &AppConfig, store: SessionStore) -> AuthSessionManager {
    let registry = AdapterRegistry::builder()
        .with_instance(Arc::new(LocalKeyAdapter::with_signer("openlogin", dev_signer())), 10)
        .with_instance(Arc::new(NodeAccountsAdapter::new("injected")), 0)
        .with_plugin(Arc::new(ChainGuardPlugin::new("chain-guard", true)))
        .build()
        .unwrap();
    AuthSessionManager::new(config, registry, store)
}

//! ABI-driven contract deployment, reads and writes.

use alloy::dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt, Specifier};
use alloy::json_abi::{Function, JsonAbi, Param};
use alloy::network::TransactionBuilder;
use alloy::primitives::Bytes;
use alloy::providers::Provider;
use alloy::rpc::types::TransactionRequest;
use rand::Rng;
use serde_json::Value;

use crate::error::{WalletError, WalletResult};
use crate::rpc::facade::{parse_address, ChainRpcFacade};
use crate::rpc::types::{DeployedContract, TxReceiptSummary};

/// ABI of the demo greeter contract: a stored `message` with an `update` setter.
pub const GREETER_ABI: &str = r#"[
  {"inputs":[{"internalType":"string","name":"initMessage","type":"string"}],"stateMutability":"nonpayable","type":"constructor"},
  {"inputs":[],"name":"message","outputs":[{"internalType":"string","name":"","type":"string"}],"stateMutability":"view","type":"function"},
  {"inputs":[{"internalType":"string","name":"newMessage","type":"string"}],"name":"update","outputs":[],"stateMutability":"nonpayable","type":"function"}
]"#;

pub fn parse_abi(json: &str) -> WalletResult<JsonAbi> {
    serde_json::from_str(json).map_err(|e| WalletError::InvalidInput(format!("invalid ABI: {}", e)))
}

pub fn greeter_abi() -> WalletResult<JsonAbi> {
    parse_abi(GREETER_ABI)
}

/// Message used by the greeter demo's `update` call.
pub fn demo_update_message() -> String {
    let n: u32 = rand::thread_rng().gen_range(1000..=9999);
    format!("Web3Auth is awesome {} times!", n)
}

fn coerce_args(params: &[Param], args: &[String]) -> WalletResult<Vec<DynSolValue>> {
    if params.len() != args.len() {
        return Err(WalletError::InvalidInput(format!(
            "expected {} arguments, got {}",
            params.len(),
            args.len()
        )));
    }

    params
        .iter()
        .zip(args)
        .map(|(param, arg)| {
            let ty = param.resolve().map_err(|e| {
                WalletError::InvalidInput(format!("unsupported ABI type '{}': {}", param.ty, e))
            })?;
            ty.coerce_str(arg).map_err(|e| {
                WalletError::InvalidInput(format!(
                    "argument '{}' is not a valid {}: {}",
                    param.name, param.ty, e
                ))
            })
        })
        .collect()
}

fn select_function<'a>(abi: &'a JsonAbi, name: &str, argc: usize) -> WalletResult<&'a Function> {
    let overloads = abi
        .function(name)
        .ok_or_else(|| WalletError::InvalidInput(format!("ABI has no function '{}'", name)))?;
    overloads
        .iter()
        .find(|f| f.inputs.len() == argc)
        .ok_or_else(|| {
            WalletError::InvalidInput(format!(
                "function '{}' does not take {} arguments",
                name, argc
            ))
        })
}

fn encode_call(function: &Function, args: &[String]) -> WalletResult<Vec<u8>> {
    let values = coerce_args(&function.inputs, args)?;
    function
        .abi_encode_input(&values)
        .map_err(|e| WalletError::InvalidInput(format!("cannot encode '{}': {}", function.name, e)))
}

/// Render a decoded ABI value as JSON. Integers become decimal strings.
pub fn dyn_value_to_json(value: &DynSolValue) -> Value {
    match value {
        DynSolValue::Bool(b) => Value::Bool(*b),
        DynSolValue::Int(i, _) => Value::String(i.to_string()),
        DynSolValue::Uint(u, _) => Value::String(u.to_string()),
        DynSolValue::FixedBytes(word, size) => {
            Value::String(alloy::hex::encode_prefixed(&word[..*size]))
        }
        DynSolValue::Address(a) => Value::String(a.to_string()),
        DynSolValue::Function(f) => Value::String(f.to_string()),
        DynSolValue::Bytes(b) => Value::String(alloy::hex::encode_prefixed(b)),
        DynSolValue::String(s) => Value::String(s.clone()),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) | DynSolValue::Tuple(items) => {
            Value::Array(items.iter().map(dyn_value_to_json).collect())
        }
        #[allow(unreachable_patterns)]
        other => debug_json(other),
    }
}

/// Fallback for variants without a JSON shape of their own.
fn debug_json(value: &DynSolValue) -> Value {
    Value::String(format!("{:?}", value))
}

impl ChainRpcFacade {
    /// Deploy `bytecode` with constructor `args` and wait for the receipt.
    pub async fn deploy_contract(
        &self,
        abi: &JsonAbi,
        bytecode: &str,
        args: &[String],
    ) -> WalletResult<DeployedContract> {
        self.handle()?;

        let mut data = alloy::hex::decode(bytecode.trim())
            .map_err(|e| WalletError::InvalidInput(format!("bytecode is not hex: {}", e)))?;
        if data.is_empty() {
            return Err(WalletError::InvalidInput("bytecode is empty".to_string()));
        }
        match abi.constructor() {
            Some(constructor) => {
                let values = coerce_args(&constructor.inputs, args)?;
                let encoded = constructor.abi_encode_input(&values).map_err(|e| {
                    WalletError::InvalidInput(format!("cannot encode constructor: {}", e))
                })?;
                data.extend_from_slice(&encoded);
            }
            None if !args.is_empty() => {
                return Err(WalletError::InvalidInput(
                    "ABI has no constructor but arguments were given".to_string(),
                ))
            }
            None => {}
        }

        let tx = TransactionRequest::default().with_deploy_code(Bytes::from(data));
        let receipt = self.submit(tx).await?;
        let address = receipt.contract_address.ok_or_else(|| {
            WalletError::Transaction("deployment receipt has no contract address".to_string())
        })?;

        tracing::info!(contract = %address, tx_hash = %receipt.transaction_hash, "Contract deployed");
        Ok(DeployedContract {
            address,
            transaction_hash: receipt.transaction_hash,
        })
    }

    /// Call a read-only function and decode its outputs.
    ///
    /// A single output is returned as-is; several come back as an array.
    pub async fn read_contract(
        &self,
        address: &str,
        abi: &JsonAbi,
        function: &str,
        args: &[String],
    ) -> WalletResult<Value> {
        let handle = self.handle()?;
        let to = parse_address(address)?;
        let func = select_function(abi, function, args.len())?;
        let input = encode_call(func, args)?;

        let tx = TransactionRequest::default()
            .with_from(handle.primary_account()?)
            .with_to(to)
            .with_input(input);
        let client = handle.client();
        let raw: Bytes = self.call("eth_call", client.call(tx)).await?;

        let outputs = func.abi_decode_output(&raw).map_err(|e| {
            WalletError::Sdk(format!("cannot decode '{}' output: {}", function, e))
        })?;
        Ok(match outputs.as_slice() {
            [] => Value::Null,
            [single] => dyn_value_to_json(single),
            many => Value::Array(many.iter().map(dyn_value_to_json).collect()),
        })
    }

    /// Send a state-changing call and wait for the receipt.
    pub async fn write_contract(
        &self,
        address: &str,
        abi: &JsonAbi,
        function: &str,
        args: &[String],
    ) -> WalletResult<TxReceiptSummary> {
        self.handle()?;
        let to = parse_address(address)?;
        let func = select_function(abi, function, args.len())?;
        let input = encode_call(func, args)?;

        let tx = TransactionRequest::default().with_to(to).with_input(input);
        self.submit(tx).await
    }
}

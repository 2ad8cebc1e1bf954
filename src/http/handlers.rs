//! Console endpoint handlers.
//!
//! Every handler mirrors one console action: it runs the operation, renders
//! the outcome into the console buffer and returns it as JSON.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::adapters::LoginOptions;
use crate::console::ConsoleSink;
use crate::error::{WalletError, WalletResult};
use crate::http::response::ApiResult;
use crate::http::server::ConsoleState;
use crate::rpc::{demo_update_message, greeter_abi, parse_abi, ChainRpcFacade};

const DEFAULT_SIGN_MESSAGE: &str = "YOUR_MESSAGE";
const DEFAULT_SEND_AMOUNT: &str = "0.0001";

fn respond<T: Serialize>(state: &ConsoleState, result: WalletResult<T>) -> ApiResult<Json<Value>> {
    state.console.log_result(&result);
    let value = result?;
    serde_json::to_value(value)
        .map(Json)
        .map_err(|e| WalletError::Sdk(format!("cannot serialize response: {}", e)).into())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    /// Adapter name; the highest priority adapter when omitted.
    pub adapter: Option<String>,
    #[serde(flatten)]
    pub options: LoginOptions,
}

pub async fn login(
    State(state): State<ConsoleState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<Value>> {
    let mut options = request.options;
    if options.login_provider.is_empty() {
        options.login_provider = if options.id_token.is_some() { "jwt" } else { "google" }.to_string();
    }
    let result = match state.manager.connect(request.adapter.as_deref(), options).await {
        Ok(_) => Ok(state.manager.snapshot().await),
        Err(e) => Err(e),
    };
    respond(&state, result)
}

pub async fn user_info(State(state): State<ConsoleState>) -> ApiResult<Json<Value>> {
    let result = state.manager.user_info().await;
    respond(&state, result)
}

pub async fn authenticate(State(state): State<ConsoleState>) -> ApiResult<Json<Value>> {
    let result = state.manager.authenticate_user().await;
    respond(&state, result)
}

pub async fn chain_id(State(state): State<ConsoleState>) -> ApiResult<Json<Value>> {
    let result = state
        .manager
        .rpc()
        .await
        .get_chain_id()
        .await
        .map(|id| json!({ "chainId": id.to_string(), "decimal": id.0 }));
    respond(&state, result)
}

pub async fn accounts(State(state): State<ConsoleState>) -> ApiResult<Json<Value>> {
    let result = state.manager.rpc().await.get_accounts().await;
    respond(&state, result)
}

pub async fn balance(State(state): State<ConsoleState>) -> ApiResult<Json<Value>> {
    let result = state.manager.rpc().await.get_balance().await;
    respond(&state, result)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignRequest {
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
struct SignedMessage {
    message: String,
    signature: String,
    signer: alloy::primitives::Address,
}

pub async fn sign(
    State(state): State<ConsoleState>,
    Json(request): Json<SignRequest>,
) -> ApiResult<Json<Value>> {
    let message = request
        .message
        .unwrap_or_else(|| DEFAULT_SIGN_MESSAGE.to_string());
    let rpc = state.manager.rpc().await;
    let result: WalletResult<_> = async {
        let signature = rpc.sign_message(&message).await?;
        let signer = ChainRpcFacade::verify_message(&message, &signature)?;
        Ok(SignedMessage {
            signature: alloy::hex::encode_prefixed(signature.as_bytes()),
            message,
            signer,
        })
    }
    .await;
    respond(&state, result)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SendRequest {
    pub amount: Option<String>,
    /// Defaults to the sender (a self-transfer).
    pub destination: Option<String>,
}

pub async fn send(
    State(state): State<ConsoleState>,
    Json(request): Json<SendRequest>,
) -> ApiResult<Json<Value>> {
    let rpc = state.manager.rpc().await;
    let result: WalletResult<_> = async {
        let destination = match request.destination {
            Some(destination) => destination,
            None => rpc.primary_account()?.to_string(),
        };
        let amount = request
            .amount
            .unwrap_or_else(|| DEFAULT_SEND_AMOUNT.to_string());
        rpc.send_transaction(&amount, &destination).await
    }
    .await;
    respond(&state, result)
}

pub async fn private_key(State(state): State<ConsoleState>) -> ApiResult<Json<Value>> {
    let result = state
        .manager
        .rpc()
        .await
        .get_private_key()
        .map(|key| json!({ "privateKey": key }));
    respond(&state, result)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DeployRequest {
    /// JSON ABI; the greeter ABI when omitted.
    pub abi: Option<Value>,
    pub bytecode: String,
    pub args: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ContractCallRequest {
    pub address: String,
    pub abi: Option<Value>,
    pub function: Option<String>,
    pub args: Vec<String>,
}

fn resolve_abi(abi: Option<Value>) -> WalletResult<alloy::json_abi::JsonAbi> {
    match abi {
        Some(Value::String(json)) => parse_abi(&json),
        Some(value) => parse_abi(&value.to_string()),
        None => greeter_abi(),
    }
}

pub async fn deploy_contract(
    State(state): State<ConsoleState>,
    Json(request): Json<DeployRequest>,
) -> ApiResult<Json<Value>> {
    let rpc = state.manager.rpc().await;
    let result: WalletResult<_> = async {
        let abi = resolve_abi(request.abi)?;
        rpc.deploy_contract(&abi, &request.bytecode, &request.args).await
    }
    .await;
    respond(&state, result)
}

pub async fn read_contract(
    State(state): State<ConsoleState>,
    Json(request): Json<ContractCallRequest>,
) -> ApiResult<Json<Value>> {
    let rpc = state.manager.rpc().await;
    let result: WalletResult<_> = async {
        let abi = resolve_abi(request.abi)?;
        let function = request.function.as_deref().unwrap_or("message");
        rpc.read_contract(&request.address, &abi, function, &request.args)
            .await
    }
    .await;
    respond(&state, result)
}

pub async fn write_contract(
    State(state): State<ConsoleState>,
    Json(request): Json<ContractCallRequest>,
) -> ApiResult<Json<Value>> {
    let rpc = state.manager.rpc().await;
    let result: WalletResult<_> = async {
        let abi = resolve_abi(request.abi)?;
        let function = request.function.as_deref().unwrap_or("update");
        let args = if function == "update" && request.args.is_empty() {
            vec![demo_update_message()]
        } else {
            request.args
        };
        rpc.write_contract(&request.address, &abi, function, &args)
            .await
    }
    .await;
    respond(&state, result)
}

pub async fn logout(State(state): State<ConsoleState>) -> ApiResult<Json<Value>> {
    let result = match state.manager.disconnect().await {
        Ok(()) => Ok(state.manager.snapshot().await),
        Err(e) => Err(e),
    };
    respond(&state, result)
}

pub async fn status(State(state): State<ConsoleState>) -> Json<Value> {
    let snapshot = state.manager.snapshot().await;
    Json(serde_json::to_value(snapshot).unwrap_or(Value::Null))
}

pub async fn console(State(state): State<ConsoleState>) -> Json<Value> {
    Json(json!({ "entries": state.console.entries() }))
}

pub async fn metrics(State(state): State<ConsoleState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}

//! HTTP transport — REST endpoints and a JSON-RPC 2.0 tool protocol endpoint
//!
//! REST:
//!   GET  /api/health
//!   GET  /api/tools[?namespace=]
//!   GET  /api/tools/:name
//!   POST /api/tools/:name        (body: tool arguments)
//!
//! JSON-RPC (`POST /mcp`): initialize, ping, tools/list, tools/call

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::error::DispatchError;
use crate::executor::Executor;
use crate::registry::{Registry, ToolDefinition};
use crate::schema;

const JSONRPC_VERSION: &str = "2.0";
const PROTOCOL_VERSION: &str = "2024-11-05";

// JSON-RPC error codes
const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

/// Shared, read-only server state
pub struct ToolServerState {
    pub registry: Registry,
    pub executor: Executor,
}

pub type SharedState = Arc<ToolServerState>;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/tools", get(list_tools))
        .route("/api/tools/:name", get(get_tool).post(execute_tool))
        .route("/mcp", post(rpc_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until `shutdown` resolves
pub async fn serve(
    state: SharedState,
    bind_address: &str,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    info!("Tool server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

// --- REST ---

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    tools: usize,
}

#[derive(Deserialize)]
struct ListToolsQuery {
    #[serde(default)]
    namespace: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(ErrorBody { error: message })).into_response()
}

fn dispatch_status(err: &DispatchError) -> StatusCode {
    match err {
        DispatchError::UnknownTool(_) => StatusCode::NOT_FOUND,
        DispatchError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
    }
}

async fn health_check(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        tools: state.registry.tool_count(),
    })
}

async fn list_tools(
    State(state): State<SharedState>,
    Query(query): Query<ListToolsQuery>,
) -> Json<Vec<ToolDefinition>> {
    Json(state.registry.list_tools(&query.namespace))
}

async fn get_tool(State(state): State<SharedState>, Path(name): Path<String>) -> Response {
    match state.registry.get_tool(&name) {
        Some(tool) => Json(tool).into_response(),
        None => error_response(StatusCode::NOT_FOUND, format!("Tool not found: {name}")),
    }
}

async fn execute_tool(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Response {
    let input = match schema::parse_input(&body) {
        Ok(input) => input,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    match state.executor.execute(&state.registry, &name, input).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => error_response(dispatch_status(&e), e.to_string()),
    }
}

// --- JSON-RPC ---

#[derive(Deserialize)]
struct RpcRequest {
    jsonrpc: String,
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Serialize)]
struct RpcResponse {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcError>,
}

#[derive(Serialize)]
struct RpcError {
    code: i64,
    message: String,
}

impl RpcResponse {
    fn ok(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: Some(result),
            error: None,
        }
    }

    fn err(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

async fn rpc_handler(State(state): State<SharedState>, body: Bytes) -> Response {
    let raw: Value = match serde_json::from_slice(&body) {
        Ok(raw) => raw,
        Err(e) => {
            return Json(RpcResponse::err(Value::Null, PARSE_ERROR, format!("Parse error: {e}")))
                .into_response()
        }
    };

    let request: RpcRequest = match serde_json::from_value(raw) {
        Ok(req) => req,
        Err(e) => {
            return Json(RpcResponse::err(
                Value::Null,
                INVALID_REQUEST,
                format!("Invalid request: {e}"),
            ))
            .into_response()
        }
    };

    let Some(id) = request.id else {
        debug!("Notification received: {}", request.method);
        return StatusCode::ACCEPTED.into_response();
    };

    if request.jsonrpc != JSONRPC_VERSION {
        return Json(RpcResponse::err(id, INVALID_REQUEST, "jsonrpc must be \"2.0\""))
            .into_response();
    }

    let response = match request.method.as_str() {
        "initialize" => RpcResponse::ok(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {"tools": {"listChanged": false}},
                "serverInfo": {
                    "name": env!("CARGO_PKG_NAME"),
                    "version": env!("CARGO_PKG_VERSION")
                }
            }),
        ),
        "ping" => RpcResponse::ok(id, json!({})),
        "tools/list" => {
            let tools: Vec<Value> = state
                .registry
                .list_tools("")
                .into_iter()
                .map(|t| {
                    json!({
                        "name": t.name,
                        "description": t.description,
                        "inputSchema": t.input_schema,
                    })
                })
                .collect();
            RpcResponse::ok(id, json!({ "tools": tools }))
        }
        "tools/call" => call_tool(&state, id, request.params).await,
        other => RpcResponse::err(id, METHOD_NOT_FOUND, format!("Method not found: {other}")),
    };

    Json(response).into_response()
}

async fn call_tool(state: &ToolServerState, id: Value, params: Value) -> RpcResponse {
    let params: CallParams = match serde_json::from_value(params) {
        Ok(p) => p,
        Err(e) => return RpcResponse::err(id, INVALID_PARAMS, format!("Invalid params: {e}")),
    };

    match state
        .executor
        .execute(&state.registry, &params.name, params.arguments)
        .await
    {
        Ok(response) if response.success => {
            let text = response.output.to_string();
            let mut result = json!({
                "content": [{"type": "text", "text": text}],
                "isError": false,
            });
            if response.output.is_object() {
                result["structuredContent"] = response.output;
            }
            RpcResponse::ok(id, result)
        }
        Ok(response) => RpcResponse::ok(
            id,
            json!({
                "content": [{"type": "text", "text": response.error.unwrap_or_default()}],
                "isError": true,
            }),
        ),
        Err(e) => RpcResponse::err(id, INVALID_PARAMS, e.to_string()),
    }
}

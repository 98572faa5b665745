//! Tool execution pipeline
//!
//! Pipeline: look up tool → validate input → run on the blocking pool under
//! the tool's timeout → respond

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::InspectorConfig;
use crate::error::DispatchError;
use crate::process::ProcessTable;
use crate::registry::Registry;
use crate::schema;

/// Outcome of one tool call. Tool failures are reported here, not as errors.
#[derive(Debug, Clone, Serialize)]
pub struct ExecuteResponse {
    pub success: bool,
    pub output: serde_json::Value,
    pub error: Option<String>,
    pub execution_id: String,
    pub duration_ms: u64,
}

/// A tool handler function: JSON input bytes in, JSON output bytes out
type ToolHandler = Arc<dyn Fn(&[u8]) -> Result<Vec<u8>> + Send + Sync>;

/// Executes tools through the pipeline
pub struct Executor {
    /// Map of tool name → handler function
    handlers: HashMap<String, ToolHandler>,
}

impl Executor {
    pub fn new(config: &InspectorConfig) -> Self {
        let mut executor = Self {
            handlers: HashMap::new(),
        };
        executor.register_handlers(config);
        executor
    }

    /// Register all built-in tool handlers
    fn register_handlers(&mut self, config: &InspectorConfig) {
        // Monitor tools
        let metrics = config.metrics.clone();
        self.handlers.insert(
            "get_system_metrics".into(),
            Arc::new(move |input: &[u8]| crate::monitor::metrics::execute(input, &metrics)),
        );
        let logs = config.logs.clone();
        self.handlers.insert(
            "analyze_log_file".into(),
            Arc::new(move |input: &[u8]| crate::monitor::logs::execute(input, &logs)),
        );

        // Process tools share one table so CPU deltas span consecutive calls
        let table = Arc::new(ProcessTable::new());
        let status_table = Arc::clone(&table);
        self.handlers.insert(
            "check_process_status".into(),
            Arc::new(move |input: &[u8]| crate::process::status::execute(input, &status_table)),
        );
        self.handlers.insert(
            "list_running_services".into(),
            Arc::new(move |input: &[u8]| crate::process::services::execute(input, &table)),
        );

        // Network tools
        let probes = config.probes.clone();
        self.handlers.insert(
            "check_network_connectivity".into(),
            Arc::new(move |input: &[u8]| crate::net::connectivity::execute(input, &probes)),
        );
        let probes = config.probes.clone();
        self.handlers.insert(
            "check_port_status".into(),
            Arc::new(move |input: &[u8]| crate::net::port_status::execute(input, &probes)),
        );

        // System tools
        self.handlers.insert(
            "get_system_info".into(),
            Arc::new(|input: &[u8]| crate::system::info::execute(input)),
        );
    }

    /// Whether a handler exists for `tool_name`
    pub fn has_handler(&self, tool_name: &str) -> bool {
        self.handlers.contains_key(tool_name)
    }

    /// Execute a tool through the pipeline
    pub async fn execute(
        &self,
        registry: &Registry,
        tool_name: &str,
        input: serde_json::Value,
    ) -> Result<ExecuteResponse, DispatchError> {
        let execution_id = Uuid::new_v4().to_string();
        let start = Instant::now();

        // 1. Look up the tool definition
        let tool_def = registry
            .get_tool(tool_name)
            .ok_or_else(|| DispatchError::UnknownTool(tool_name.to_string()))?;

        // 2. Validate input against the declared schema
        let input = if input.is_null() {
            serde_json::Value::Object(serde_json::Map::new())
        } else {
            input
        };
        let invalid = |e: anyhow::Error| DispatchError::InvalidInput {
            tool: tool_name.to_string(),
            reason: e.to_string(),
        };
        schema::validate_input(&input, &tool_def.input_schema).map_err(invalid)?;
        let input_bytes = schema::serialize_output(&input).map_err(invalid)?;

        let Some(handler) = self.handlers.get(tool_name).cloned() else {
            warn!("No handler registered for tool: {tool_name}");
            return Ok(ExecuteResponse {
                success: false,
                output: serde_json::Value::Null,
                error: Some(format!("No handler registered for tool: {tool_name}")),
                execution_id,
                duration_ms: elapsed_ms(start),
            });
        };

        info!("Executing: tool={} execution_id={}", tool_name, execution_id);

        // 3. Run off the async workers; the tools block on sleeps and sockets
        let timeout = Duration::from_millis(tool_def.timeout_ms);
        let task = tokio::task::spawn_blocking(move || handler(&input_bytes));

        let outcome = match tokio::time::timeout(timeout, task).await {
            Ok(Ok(Ok(bytes))) => serde_json::from_slice::<serde_json::Value>(&bytes)
                .map_err(|e| anyhow::anyhow!("Tool produced invalid JSON: {e}")),
            Ok(Ok(Err(e))) => Err(e),
            Ok(Err(join_err)) => Err(anyhow::anyhow!("Tool task failed: {join_err}")),
            Err(_) => Err(anyhow::anyhow!(
                "Tool timed out after {} ms",
                tool_def.timeout_ms
            )),
        };

        // 4. Respond
        let duration_ms = elapsed_ms(start);
        let response = match outcome {
            Ok(output) => {
                info!("Completed: tool={} duration_ms={}", tool_name, duration_ms);
                ExecuteResponse {
                    success: true,
                    output,
                    error: None,
                    execution_id,
                    duration_ms,
                }
            }
            Err(e) => {
                warn!("Failed: tool={} duration_ms={} error={:#}", tool_name, duration_ms, e);
                ExecuteResponse {
                    success: false,
                    output: serde_json::Value::Null,
                    error: Some(format!("{e:#}")),
                    execution_id,
                    duration_ms,
                }
            }
        };

        Ok(response)
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

//! Tool Registry — stores and retrieves diagnostic tool definitions

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

/// Description of a single invokable diagnostic tool
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub namespace: String,
    pub version: String,
    pub description: String,
    /// JSON Schema for the tool arguments; `null` accepts anything
    pub input_schema: serde_json::Value,
    pub risk_level: String,
    pub idempotent: bool,
    pub timeout_ms: u64,
}

impl ToolDefinition {
    pub fn with_input_schema(mut self, schema: serde_json::Value) -> Self {
        self.input_schema = schema;
        self
    }
}

/// In-memory tool registry, ordered by tool name
pub struct Registry {
    tools: BTreeMap<String, ToolDefinition>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Register a tool definition
    pub fn register_tool(&mut self, tool: ToolDefinition) {
        info!("Registered tool: {} (ns: {})", tool.name, tool.namespace);
        self.tools.insert(tool.name.clone(), tool);
    }

    /// Get a tool by name
    pub fn get_tool(&self, name: &str) -> Option<ToolDefinition> {
        self.tools.get(name).cloned()
    }

    /// List tools, optionally filtered by namespace
    pub fn list_tools(&self, namespace: &str) -> Vec<ToolDefinition> {
        if namespace.is_empty() {
            self.tools.values().cloned().collect()
        } else {
            self.tools
                .values()
                .filter(|t| t.namespace == namespace)
                .cloned()
                .collect()
        }
    }

    /// Deregister a tool
    pub fn deregister_tool(&mut self, name: &str) {
        self.tools.remove(name);
    }

    /// Get total tool count
    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper to create a ToolDefinition with an open input schema
pub fn make_tool(
    name: &str,
    namespace: &str,
    description: &str,
    risk_level: &str,
    idempotent: bool,
    timeout_ms: u64,
) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        namespace: namespace.to_string(),
        version: "1.0.0".to_string(),
        description: description.to_string(),
        input_schema: serde_json::Value::Null,
        risk_level: risk_level.to_string(),
        idempotent,
        timeout_ms,
    }
}

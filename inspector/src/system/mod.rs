//! Static host identity tools.

pub mod info;

use serde_json::json;

use crate::registry::{make_tool, Registry};

/// Register every system tool with the registry.
pub fn register_tools(reg: &mut Registry) {
    reg.register_tool(
        make_tool(
            "get_system_info",
            "system",
            "Get basic system information: hostname, platform, kernel release and version, architecture, processor and boot time",
            "low",
            true,
            5000,
        )
        .with_input_schema(json!({
            "type": "object",
            "properties": {}
        })),
    );
}

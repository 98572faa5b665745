//! Process inspection tools — name lookup and busiest-process listing.
//!
//! Both tools read the shared [`ProcessTable`] so CPU percentages are measured
//! between consecutive scans.

pub mod services;
pub mod status;
pub mod table;

pub use table::ProcessTable;

use serde_json::json;

use crate::registry::{make_tool, Registry};

/// Register every process tool with the registry.
pub fn register_tools(reg: &mut Registry) {
    reg.register_tool(
        make_tool(
            "check_process_status",
            "process",
            "Check whether processes whose name contains the given text are running",
            "low",
            true,
            10000,
        )
        .with_input_schema(json!({
            "type": "object",
            "properties": {
                "process_name": {
                    "type": "string",
                    "description": "Case-insensitive substring of the process name"
                }
            },
            "required": ["process_name"]
        })),
    );

    reg.register_tool(
        make_tool(
            "list_running_services",
            "process",
            "List up to 20 non-idle processes ordered by CPU usage",
            "low",
            true,
            10000,
        )
        .with_input_schema(json!({
            "type": "object",
            "properties": {}
        })),
    );
}

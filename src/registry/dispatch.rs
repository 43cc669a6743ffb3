use serde_json::Value;
use tracing::debug;

use crate::registry::Registry;
use crate::registry::args::ToolArgs;
use crate::registry::failure::Failure;
use crate::registry::validate::validate;

/// Single entry point translating a tool name plus argument payload into a
/// result. Unknown names and invalid payloads are rejected before any
/// adapter code runs; every call terminates in a well-formed result, never
/// an unhandled fault. No retries and no timeout at this layer.
pub fn invoke(registry: &Registry, name: &str, arguments: &Value) -> Result<Value, Failure> {
    let Some(descriptor) = registry.lookup(name) else {
        return Err(Failure::unknown_tool(name));
    };

    let validated = validate(&descriptor.schema, arguments)?;
    debug!(tool = name, "invoking handler");

    let args = ToolArgs::new(validated);
    (descriptor.handler)(&args)
}

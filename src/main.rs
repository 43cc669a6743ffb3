use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use std::io::{self, BufRead, Write};
use std::process;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod mcp;
mod office;
mod registry;
mod tools;

#[derive(Parser)]
#[command(name = "mcp-office")]
#[command(version, about = "Office document tools behind an MCP stdio server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP stdio server
    Serve {
        /// Serve MCP over stdio (NDJSON)
        #[arg(long)]
        stdio: bool,
    },
    /// List the registered tools
    ListTools {
        /// Emit the full catalog as JSON
        #[arg(long)]
        json: bool,
    },
    /// Invoke one tool directly
    Call {
        /// Tool name, as shown by list-tools
        name: String,
        /// Tool arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
        /// Output JSON structuredContent
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let registry = tools::build_registry();

    match cli.command {
        Commands::Serve { stdio } => {
            if stdio {
                run_stdio_server(&registry)
            } else {
                anyhow::bail!("only --stdio transport is supported")
            }
        }
        Commands::ListTools { json } => run_list_tools(&registry, json),
        Commands::Call { name, args, json } => run_call(&registry, &name, &args, json),
    }
}

fn run_list_tools(registry: &registry::Registry, json_output: bool) -> Result<()> {
    if json_output {
        let catalog = serde_json::to_string_pretty(&mcp::tool_definitions(registry))?;
        println!("{catalog}");
        return Ok(());
    }
    for descriptor in registry.list() {
        println!("{:<24} {}", descriptor.name, descriptor.description);
    }
    Ok(())
}

fn run_call(registry: &registry::Registry, name: &str, args: &str, json_output: bool) -> Result<()> {
    let arguments: Value = serde_json::from_str(args).context("--args must be a JSON object")?;
    let result = mcp::call_result(registry::dispatch::invoke(registry, name, &arguments));
    print_tool_result(result, json_output)
}

fn print_tool_result(result: Value, json_output: bool) -> Result<()> {
    let is_error = result
        .get("isError")
        .and_then(|value| value.as_bool())
        .unwrap_or(false);

    if is_error {
        let message = result
            .get("structuredContent")
            .and_then(|value| value.get("error"))
            .and_then(|value| value.get("message"))
            .and_then(|value| value.as_str())
            .unwrap_or("tool error");
        eprintln!("{message}");
        process::exit(1);
    }

    if json_output {
        let structured = result
            .get("structuredContent")
            .cloned()
            .unwrap_or_else(|| json!({}));
        let output = serde_json::to_string_pretty(&structured)?;
        println!("{output}");
        return Ok(());
    }

    let text = result
        .get("content")
        .and_then(|value| value.as_array())
        .and_then(|arr| arr.first())
        .and_then(|value| value.get("text"))
        .and_then(|value| value.as_str())
        .unwrap_or("");
    println!("{text}");
    Ok(())
}

fn run_stdio_server(registry: &registry::Registry) -> Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let reader = stdin.lock().lines();
    let mut writer = io::BufWriter::new(stdout.lock());

    for line in reader {
        let line = line.context("failed to read stdin")?;
        if line.trim().is_empty() {
            continue;
        }

        let request: Value = match serde_json::from_str(&line) {
            Ok(value) => value,
            Err(_) => continue,
        };

        let method = request.get("method").and_then(|value| value.as_str());
        let id = request.get("id").cloned();
        let response = match (method, id) {
            (Some("initialize"), Some(id)) => Some(json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": {
                    "protocolVersion": "2025-11-25",
                    "capabilities": {
                        "tools": {}
                    },
                    "serverInfo": {
                        "name": env!("CARGO_PKG_NAME"),
                        "version": env!("CARGO_PKG_VERSION")
                    }
                }
            })),
            (Some("tools/list"), Some(id)) => Some(json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": {
                    "tools": mcp::tool_definitions(registry)
                }
            })),
            (Some("tools/call"), Some(id)) => {
                let result = handle_tool_call(registry, &request);
                Some(json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "result": result
                }))
            }
            _ => None,
        };

        if let Some(response) = response {
            let serialized =
                serde_json::to_string(&response).context("failed to serialize response")?;
            writeln!(writer, "{serialized}").context("failed to write response")?;
            writer.flush().context("failed to flush response")?;
        }
    }

    Ok(())
}

fn handle_tool_call(registry: &registry::Registry, request: &Value) -> Value {
    let Some(params) = request.get("params").and_then(|value| value.as_object()) else {
        return mcp::call_result(Err(registry::failure::Failure::invalid_arguments(
            "params must be an object",
        )));
    };

    let Some(name) = params.get("name").and_then(|value| value.as_str()) else {
        return mcp::call_result(Err(registry::failure::Failure::invalid_arguments(
            "params.name must be a string",
        )));
    };

    let arguments = params
        .get("arguments")
        .cloned()
        .unwrap_or_else(|| json!({}));

    debug!(tool = name, "tools/call");
    mcp::call_result(registry::dispatch::invoke(registry, name, &arguments))
}

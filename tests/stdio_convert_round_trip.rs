use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::process::{Command, Stdio};

fn send_request(
    stdin: &mut std::process::ChildStdin,
    stdout: &mut BufReader<std::process::ChildStdout>,
    request: serde_json::Value,
) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let serialized = serde_json::to_string(&request)?;
    writeln!(stdin, "{serialized}")?;
    stdin.flush()?;

    let mut line = String::new();
    stdout.read_line(&mut line)?;
    let response: serde_json::Value = serde_json::from_str(line.trim())?;
    Ok(response)
}

#[test]
fn csv_survives_a_trip_through_xlsx() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let source = dir.path().join("input.csv");
    fs::write(&source, "name,note\nAda,\"loves, commas\"\nGrace,plain\n")?;

    let mut child = Command::new(env!("CARGO_BIN_EXE_mcp-office"))
        .args(["serve", "--stdio"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()?;

    let mut stdin = child.stdin.take().expect("stdin available");
    let mut stdout = BufReader::new(child.stdout.take().expect("stdout available"));

    let workbook = dir.path().join("table.xlsx");
    let response = send_request(
        &mut stdin,
        &mut stdout,
        serde_json::json!({
            "jsonrpc": "2.0",
            "id": 20,
            "method": "tools/call",
            "params": {
                "name": "csv_to_xlsx",
                "arguments": {
                    "file_path": source.to_string_lossy(),
                    "output_path": workbook.to_string_lossy()
                }
            }
        }),
    )?;
    let result = response.get("result").expect("result present");
    assert_eq!(result.get("isError").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(
        result
            .get("structuredContent")
            .and_then(|v| v.get("rows"))
            .and_then(|v| v.as_u64()),
        Some(3)
    );

    let back = dir.path().join("back.csv");
    let response = send_request(
        &mut stdin,
        &mut stdout,
        serde_json::json!({
            "jsonrpc": "2.0",
            "id": 21,
            "method": "tools/call",
            "params": {
                "name": "xlsx_to_csv",
                "arguments": {
                    "file_path": workbook.to_string_lossy(),
                    "output_path": back.to_string_lossy()
                }
            }
        }),
    )?;
    let result = response.get("result").expect("result present");
    assert_eq!(result.get("isError").and_then(|v| v.as_bool()), Some(false));

    let text = fs::read_to_string(&back)?;
    assert!(text.contains("\"loves, commas\""));
    assert!(text.contains("Grace,plain"));

    let _ = child.kill();
    Ok(())
}

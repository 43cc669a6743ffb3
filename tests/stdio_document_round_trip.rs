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
fn create_analyze_and_extract_docx() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("memo.docx");

    let mut child = Command::new(env!("CARGO_BIN_EXE_mcp-office"))
        .args(["serve", "--stdio"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()?;

    let mut stdin = child.stdin.take().expect("stdin available");
    let mut stdout = BufReader::new(child.stdout.take().expect("stdout available"));

    let response = send_request(
        &mut stdin,
        &mut stdout,
        serde_json::json!({
            "jsonrpc": "2.0",
            "id": 40,
            "method": "tools/call",
            "params": {
                "name": "docx_create",
                "arguments": {
                    "output_path": path.to_string_lossy(),
                    "content": [
                        {"type": "heading", "text": "Quarterly Memo", "level": 1},
                        {"type": "paragraph", "text": "Numbers are up."},
                        {"type": "bullet", "text": "ship it"},
                        {"type": "table", "rows": [["Q", "Revenue"], ["Q1", "10"]]}
                    ]
                }
            }
        }),
    )?;
    assert_eq!(
        response
            .get("result")
            .and_then(|r| r.get("isError"))
            .and_then(|v| v.as_bool()),
        Some(false)
    );

    let response = send_request(
        &mut stdin,
        &mut stdout,
        serde_json::json!({
            "jsonrpc": "2.0",
            "id": 41,
            "method": "tools/call",
            "params": {
                "name": "docx_analyze_structure",
                "arguments": {"file_path": path.to_string_lossy()}
            }
        }),
    )?;
    let structured = response
        .get("result")
        .and_then(|r| r.get("structuredContent"))
        .expect("structured present");
    assert_eq!(structured["headings"], serde_json::json!(1));
    assert_eq!(structured["paragraphs"], serde_json::json!(1));
    assert_eq!(structured["bullets"], serde_json::json!(1));
    assert_eq!(structured["tables"], serde_json::json!(1));
    assert_eq!(
        structured["outline"][0]["text"],
        serde_json::json!("Quarterly Memo")
    );

    let response = send_request(
        &mut stdin,
        &mut stdout,
        serde_json::json!({
            "jsonrpc": "2.0",
            "id": 42,
            "method": "tools/call",
            "params": {
                "name": "docx_extract_text",
                "arguments": {"file_path": path.to_string_lossy()}
            }
        }),
    )?;
    let text = response
        .get("result")
        .and_then(|r| r.get("structuredContent"))
        .and_then(|v| v.get("text"))
        .and_then(|v| v.as_str())
        .expect("text present");
    assert!(text.contains("Quarterly Memo"));
    assert!(text.contains("Numbers are up."));
    assert!(text.contains("Q1\t10"));

    let _ = child.kill();
    Ok(())
}

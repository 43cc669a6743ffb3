use std::fs;
use std::process::Command;

#[test]
fn list_tools_prints_the_catalog() -> Result<(), Box<dyn std::error::Error>> {
    let output = Command::new(env!("CARGO_BIN_EXE_mcp-office"))
        .arg("list-tools")
        .output()?;
    assert!(output.status.success());

    let text = String::from_utf8(output.stdout)?;
    assert!(text.contains("batch_convert"));
    assert!(text.contains("docx_extract_text"));
    Ok(())
}

#[test]
fn call_emits_structured_json() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let source = dir.path().join("table.csv");
    fs::write(&source, "a,b\n1,2\n")?;
    let workbook = dir.path().join("table.xlsx");

    let args = serde_json::json!({
        "file_path": source.to_string_lossy(),
        "output_path": workbook.to_string_lossy(),
    });
    let output = Command::new(env!("CARGO_BIN_EXE_mcp-office"))
        .args(["call", "csv_to_xlsx", "--args", &args.to_string(), "--json"])
        .output()?;
    assert!(output.status.success());

    let structured: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(structured["rows"], serde_json::json!(2));
    assert!(workbook.exists());
    Ok(())
}

#[test]
fn call_with_unknown_tool_fails() -> Result<(), Box<dyn std::error::Error>> {
    let output = Command::new(env!("CARGO_BIN_EXE_mcp-office"))
        .args(["call", "no_such_tool"])
        .output()?;
    assert!(!output.status.success());

    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("unknown tool"));
    Ok(())
}

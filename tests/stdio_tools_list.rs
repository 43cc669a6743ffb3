use std::collections::HashSet;
use std::io::{BufRead, BufReader, Write};
use std::process::{Command, Stdio};

#[test]
fn tools_list_includes_expected_tools() -> Result<(), Box<dyn std::error::Error>> {
    let mut child = Command::new(env!("CARGO_BIN_EXE_mcp-office"))
        .args(["serve", "--stdio"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()?;

    let mut stdin = child.stdin.take().expect("stdin available");
    let mut stdout = BufReader::new(child.stdout.take().expect("stdout available"));

    let request = serde_json::json!({
        "jsonrpc": "2.0",
        "id": 2,
        "method": "tools/list",
        "params": {}
    });
    let serialized = serde_json::to_string(&request)?;
    writeln!(stdin, "{serialized}")?;
    stdin.flush()?;

    let mut line = String::new();
    stdout.read_line(&mut line)?;

    let response: serde_json::Value = serde_json::from_str(line.trim())?;
    let tools = response
        .get("result")
        .and_then(|value| value.get("tools"))
        .and_then(|value| value.as_array())
        .expect("tools array present");

    let names: HashSet<&str> = tools
        .iter()
        .filter_map(|tool| tool.get("name").and_then(|value| value.as_str()))
        .collect();

    let expected: HashSet<&str> = [
        "docx_extract_text",
        "docx_create",
        "docx_fill_template",
        "docx_analyze_structure",
        "docx_insert_table",
        "docx_merge",
        "xlsx_read",
        "xlsx_create",
        "xlsx_analyze",
        "xlsx_apply_formulas",
        "xlsx_to_json",
        "pptx_create",
        "pptx_extract",
        "pptx_to_html",
        "pdf_extract_text",
        "pdf_merge",
        "pdf_split",
        "pdf_add_watermark",
        "pdf_fill_form",
        "pdf_metadata",
        "ocr",
        "xlsx_to_csv",
        "csv_to_xlsx",
        "docx_to_markdown",
        "markdown_to_docx",
        "markdown_to_html",
        "batch_convert",
    ]
    .into_iter()
    .collect();

    assert_eq!(names, expected);

    for tool in tools {
        let schema = tool.get("inputSchema").expect("schema present");
        assert_eq!(schema.get("type").and_then(|v| v.as_str()), Some("object"));
    }

    let _ = child.kill();
    Ok(())
}

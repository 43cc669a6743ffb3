//! Format conversion tools and the directory batch orchestrator.

use regex::Regex;
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::office::xlsx::{CellValue, Sheet};
use crate::office::{csv, docx, markdown, xlsx};
use crate::registry::ToolDescriptor;
use crate::registry::args::ToolArgs;
use crate::registry::failure::Failure;
use crate::registry::schema::{PropertySpec, ToolSchema};

pub fn descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "xlsx_to_csv",
            "Export one worksheet as CSV text.",
            ToolSchema::new()
                .required("file_path", PropertySpec::string("Path to the .xlsx file"))
                .required("output_path", PropertySpec::string("Path for the .csv file"))
                .optional("sheet", PropertySpec::string("Worksheet name; defaults to the first"))
                .optional(
                    "delimiter",
                    PropertySpec::string("Field delimiter, one character").default_value(json!(",")),
                ),
            xlsx_to_csv,
        ),
        ToolDescriptor::new(
            "csv_to_xlsx",
            "Build a workbook from CSV text.",
            ToolSchema::new()
                .required("file_path", PropertySpec::string("Path to the .csv file"))
                .required("output_path", PropertySpec::string("Path for the .xlsx file"))
                .optional(
                    "delimiter",
                    PropertySpec::string("Field delimiter, one character").default_value(json!(",")),
                )
                .optional(
                    "sheet_name",
                    PropertySpec::string("Worksheet name").default_value(json!("Sheet1")),
                ),
            csv_to_xlsx,
        ),
        ToolDescriptor::new(
            "docx_to_markdown",
            "Render a Word document as Markdown.",
            ToolSchema::new()
                .required("file_path", PropertySpec::string("Path to the .docx file"))
                .required("output_path", PropertySpec::string("Path for the .md file")),
            docx_to_markdown,
        ),
        ToolDescriptor::new(
            "markdown_to_docx",
            "Build a Word document from a Markdown file.",
            ToolSchema::new()
                .required("file_path", PropertySpec::string("Path to the .md file"))
                .required("output_path", PropertySpec::string("Path for the .docx file")),
            markdown_to_docx,
        ),
        ToolDescriptor::new(
            "markdown_to_html",
            "Render a Markdown file as a standalone HTML page.",
            ToolSchema::new()
                .required("file_path", PropertySpec::string("Path to the .md file"))
                .required("output_path", PropertySpec::string("Path for the .html file")),
            markdown_to_html,
        ),
        ToolDescriptor::new(
            "batch_convert",
            "Convert every matching file in a directory between two formats.",
            ToolSchema::new()
                .required("input_dir", PropertySpec::string("Directory holding the source files"))
                .required("output_dir", PropertySpec::string("Directory for the converted files"))
                .required(
                    "from_format",
                    PropertySpec::string("Source format").one_of(&["docx", "md", "xlsx", "csv"]),
                )
                .required(
                    "to_format",
                    PropertySpec::string("Target format")
                        .one_of(&["md", "txt", "docx", "html", "csv", "xlsx"]),
                )
                .optional(
                    "pattern",
                    PropertySpec::string("Filename glob, e.g. report_*.docx; defaults to *.<from_format>"),
                ),
            batch_convert,
        ),
    ]
}

fn parse_delimiter(args: &ToolArgs) -> Result<char, Failure> {
    let text = args.opt_str("delimiter").unwrap_or(",");
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Ok(ch),
        _ => Err(Failure::invalid_arguments(format!(
            "delimiter must be a single character, got {text:?}"
        ))),
    }
}

fn read_text(path: &Path) -> Result<String, Failure> {
    fs::read_to_string(path)
        .map_err(|err| Failure::handler_error(format!("failed to read {}: {err}", path.display())))
}

fn write_text(path: &Path, text: &str) -> Result<(), Failure> {
    fs::write(path, text)
        .map_err(|err| Failure::handler_error(format!("failed to write {}: {err}", path.display())))
}

/// Numbers and booleans in CSV input become typed cells, everything else
/// stays text.
fn cell_from_csv(field: &str) -> CellValue {
    if field.is_empty() {
        return CellValue::Empty;
    }
    if let Ok(number) = field.parse::<f64>()
        && number.is_finite()
    {
        return CellValue::Number(number);
    }
    match field {
        "true" | "TRUE" => CellValue::Bool(true),
        "false" | "FALSE" => CellValue::Bool(false),
        _ => CellValue::Text(field.to_string()),
    }
}

fn sheet_to_rows(sheet: &Sheet) -> Vec<Vec<String>> {
    sheet
        .rows
        .iter()
        .map(|row| row.iter().map(CellValue::to_display).collect())
        .collect()
}

fn xlsx_to_csv(args: &ToolArgs) -> Result<Value, Failure> {
    let path = args.req_existing_path("file_path")?;
    let output = args.req_path("output_path")?;
    let delimiter = parse_delimiter(args)?;
    let sheet = xlsx::read_sheet(&path, args.opt_str("sheet"))?;
    let rows = sheet_to_rows(&sheet);
    write_text(&output, &csv::write(&rows, delimiter))?;
    Ok(json!({
        "message": format!(
            "exported sheet {} ({} rows) into {}",
            sheet.name,
            rows.len(),
            output.display()
        ),
        "output_path": output.display().to_string(),
        "sheet": sheet.name,
        "rows": rows.len(),
    }))
}

fn csv_to_xlsx(args: &ToolArgs) -> Result<Value, Failure> {
    let path = args.req_existing_path("file_path")?;
    let output = args.req_path("output_path")?;
    let delimiter = parse_delimiter(args)?;
    let sheet_name = args.opt_str("sheet_name").unwrap_or("Sheet1");

    let rows: Vec<Vec<CellValue>> = csv::parse(&read_text(&path)?, delimiter)
        .iter()
        .map(|row| row.iter().map(|field| cell_from_csv(field)).collect())
        .collect();
    let row_count = rows.len();
    xlsx::write(
        &output,
        &[Sheet {
            name: sheet_name.to_string(),
            rows,
        }],
    )?;
    Ok(json!({
        "message": format!("wrote {row_count} rows into {}", output.display()),
        "output_path": output.display().to_string(),
        "sheet": sheet_name,
        "rows": row_count,
    }))
}

fn docx_to_markdown(args: &ToolArgs) -> Result<Value, Failure> {
    let path = args.req_existing_path("file_path")?;
    let output = args.req_path("output_path")?;
    let blocks = docx::read(&path)?;
    write_text(&output, &markdown::from_blocks(&blocks))?;
    Ok(json!({
        "message": format!("rendered {} blocks into {}", blocks.len(), output.display()),
        "output_path": output.display().to_string(),
        "blocks": blocks.len(),
    }))
}

fn markdown_to_docx(args: &ToolArgs) -> Result<Value, Failure> {
    let path = args.req_existing_path("file_path")?;
    let output = args.req_path("output_path")?;
    let blocks = markdown::to_blocks(&read_text(&path)?);
    docx::write(&output, &blocks)?;
    Ok(json!({
        "message": format!("created {} with {} blocks", output.display(), blocks.len()),
        "output_path": output.display().to_string(),
        "blocks": blocks.len(),
    }))
}

fn markdown_to_html(args: &ToolArgs) -> Result<Value, Failure> {
    let path = args.req_existing_path("file_path")?;
    let output = args.req_path("output_path")?;
    let html = markdown::to_html(&read_text(&path)?);
    write_text(&output, &html)?;
    Ok(json!({
        "message": format!("rendered {} into {}", path.display(), output.display()),
        "output_path": output.display().to_string(),
    }))
}

type FileConversion = fn(&Path, &Path) -> Result<(), Failure>;

/// Every (from, to) pair the batch orchestrator knows how to run. Single-file
/// tools cover more pairs; this matrix is what directory batches support.
const SUPPORT_MATRIX: &[(&str, &str, FileConversion)] = &[
    ("docx", "md", file_docx_to_md),
    ("docx", "txt", file_docx_to_txt),
    ("md", "docx", file_md_to_docx),
    ("md", "html", file_md_to_html),
    ("xlsx", "csv", file_xlsx_to_csv),
    ("csv", "xlsx", file_csv_to_xlsx),
];

fn file_docx_to_md(input: &Path, output: &Path) -> Result<(), Failure> {
    write_text(output, &markdown::from_blocks(&docx::read(input)?))
}

fn file_docx_to_txt(input: &Path, output: &Path) -> Result<(), Failure> {
    write_text(output, &docx::blocks_to_text(&docx::read(input)?))
}

fn file_md_to_docx(input: &Path, output: &Path) -> Result<(), Failure> {
    docx::write(output, &markdown::to_blocks(&read_text(input)?))
}

fn file_md_to_html(input: &Path, output: &Path) -> Result<(), Failure> {
    write_text(output, &markdown::to_html(&read_text(input)?))
}

fn file_xlsx_to_csv(input: &Path, output: &Path) -> Result<(), Failure> {
    let sheet = xlsx::read_sheet(input, None)?;
    write_text(output, &csv::write(&sheet_to_rows(&sheet), ','))
}

fn file_csv_to_xlsx(input: &Path, output: &Path) -> Result<(), Failure> {
    let rows = csv::parse(&read_text(input)?, ',')
        .iter()
        .map(|row| row.iter().map(|field| cell_from_csv(field)).collect())
        .collect();
    xlsx::write(
        output,
        &[Sheet {
            name: "Sheet1".to_string(),
            rows,
        }],
    )
}

/// Compiles a filename glob (`*` wildcards only) into a case-insensitive
/// whole-name matcher.
fn glob_matcher(pattern: &str) -> Result<Regex, Failure> {
    let escaped: Vec<String> = pattern.split('*').map(regex::escape).collect();
    let expr = format!("(?i)^{}$", escaped.join(".*"));
    Regex::new(&expr)
        .map_err(|_| Failure::invalid_arguments(format!("invalid pattern: {pattern}")))
}

/// Files in the input directory matching the glob, sorted by name so
/// results are deterministic.
fn matching_files(input_dir: &Path, matcher: &Regex) -> Result<Vec<PathBuf>, Failure> {
    let entries = fs::read_dir(input_dir).map_err(|err| {
        Failure::handler_error(format!("failed to list {}: {err}", input_dir.display()))
    })?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| {
            Failure::handler_error(format!("failed to list {}: {err}", input_dir.display()))
        })?;
        let path = entry.path();
        let matches = path.is_file()
            && path
                .file_name()
                .map(|name| matcher.is_match(&name.to_string_lossy()))
                .unwrap_or(false);
        if matches {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn batch_convert(args: &ToolArgs) -> Result<Value, Failure> {
    let input_dir = args.req_path("input_dir")?;
    if !input_dir.is_dir() {
        return Err(Failure::not_found(&input_dir));
    }
    let output_dir = args.req_path("output_dir")?;
    let from = args.req_str("from_format")?;
    let to = args.req_str("to_format")?;

    // An unsupported pair is a per-file failure, not a whole-batch one: the
    // directory is still scanned and every match is counted against it.
    let convert = SUPPORT_MATRIX
        .iter()
        .find(|(source, target, _)| *source == from && *target == to)
        .map(|(_, _, convert)| *convert);

    let default_pattern = format!("*.{from}");
    let matcher = glob_matcher(args.opt_str("pattern").unwrap_or(&default_pattern))?;

    fs::create_dir_all(&output_dir).map_err(|err| {
        Failure::handler_error(format!("failed to create {}: {err}", output_dir.display()))
    })?;

    let files = matching_files(&input_dir, &matcher)?;
    let mut converted = Vec::new();
    let mut errors = Vec::new();
    for input in &files {
        let stem = input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let output = output_dir.join(format!("{stem}.{to}"));
        let outcome = match convert {
            Some(convert) => convert(input, &output),
            None => Err(Failure::unsupported(format!(
                "conversion {from} -> {to} is not supported"
            ))),
        };
        match outcome {
            Ok(()) => {
                debug!(input = %input.display(), output = %output.display(), "converted");
                converted.push(output.display().to_string());
            }
            Err(failure) => {
                warn!(input = %input.display(), error = %failure, "conversion failed");
                errors.push(json!({
                    "file": input.display().to_string(),
                    "error": failure.message,
                }));
            }
        }
    }

    let files_found = files.len();
    let successful = converted.len();
    let failed = errors.len();
    Ok(json!({
        "message": format!(
            "converted {successful} of {files_found} {from} files into {}",
            output_dir.display()
        ),
        "files_found": files_found,
        "successful": successful,
        "failed": failed,
        "converted_files": converted,
        "errors": errors,
        "output_dir": output_dir.display().to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::office::docx::DocBlock;
    use crate::registry::failure::FailureKind;
    use tempfile::tempdir;

    fn args(value: Value) -> ToolArgs {
        match value {
            Value::Object(map) => ToolArgs::new(map),
            _ => panic!("args must be an object"),
        }
    }

    #[test]
    fn csv_import_shapes_the_grid() {
        let dir = tempdir().expect("tempdir");
        let source = dir.path().join("table.csv");
        fs::write(&source, "a,b\n1,2\n3,4\n").expect("write csv");

        let output = dir.path().join("table.xlsx");
        let result = csv_to_xlsx(&args(json!({
            "file_path": source.to_string_lossy(),
            "output_path": output.to_string_lossy(),
        })))
        .expect("convert");
        assert_eq!(result["rows"], 3);

        let sheet = xlsx::read_sheet(&output, None).expect("read back");
        assert_eq!(sheet.rows.len(), 3);
        assert_eq!(sheet.rows[0].len(), 2);
        assert_eq!(sheet.rows[1][1], CellValue::Number(2.0));
        assert_eq!(sheet.rows[0][0], CellValue::Text("a".to_string()));
    }

    #[test]
    fn csv_round_trip_keeps_quoted_delimiters() {
        let dir = tempdir().expect("tempdir");
        let source = dir.path().join("quoted.csv");
        fs::write(&source, "name,note\nAda,\"loves, commas\"\n").expect("write csv");

        let workbook = dir.path().join("quoted.xlsx");
        csv_to_xlsx(&args(json!({
            "file_path": source.to_string_lossy(),
            "output_path": workbook.to_string_lossy(),
        })))
        .expect("to xlsx");

        let back = dir.path().join("back.csv");
        xlsx_to_csv(&args(json!({
            "file_path": workbook.to_string_lossy(),
            "output_path": back.to_string_lossy(),
        })))
        .expect("to csv");

        let text = fs::read_to_string(&back).expect("read back");
        let rows = csv::parse(&text, ',');
        assert_eq!(rows[1][1], "loves, commas");
    }

    #[test]
    fn delimiter_must_be_one_character() {
        let dir = tempdir().expect("tempdir");
        let source = dir.path().join("table.csv");
        fs::write(&source, "a;b\n").expect("write csv");
        let err = csv_to_xlsx(&args(json!({
            "file_path": source.to_string_lossy(),
            "output_path": dir.path().join("out.xlsx").to_string_lossy(),
            "delimiter": ";;",
        })))
        .expect_err("two characters");
        assert_eq!(err.kind, FailureKind::InvalidArguments);
    }

    #[test]
    fn batch_counts_only_matching_extensions() {
        let dir = tempdir().expect("tempdir");
        let input = dir.path().join("in");
        fs::create_dir(&input).expect("mkdir");
        docx::write(
            &input.join("a.docx"),
            &[DocBlock::Paragraph { text: "one".to_string() }],
        )
        .expect("write docx");
        docx::write(
            &input.join("b.docx"),
            &[DocBlock::Heading { level: 1, text: "two".to_string() }],
        )
        .expect("write docx");
        fs::write(input.join("notes.txt"), "ignored").expect("write txt");

        let output = dir.path().join("out");
        let result = batch_convert(&args(json!({
            "input_dir": input.to_string_lossy(),
            "output_dir": output.to_string_lossy(),
            "from_format": "docx",
            "to_format": "md",
        })))
        .expect("batch");

        assert_eq!(result["files_found"], 2);
        assert_eq!(result["successful"], 2);
        assert_eq!(result["failed"], 0);
        assert!(output.join("a.md").exists());
        assert_eq!(
            fs::read_to_string(output.join("b.md")).expect("read md").trim(),
            "# two"
        );
    }

    #[test]
    fn batch_isolates_per_file_failures() {
        let dir = tempdir().expect("tempdir");
        let input = dir.path().join("in");
        fs::create_dir(&input).expect("mkdir");
        docx::write(
            &input.join("good.docx"),
            &[DocBlock::Paragraph { text: "fine".to_string() }],
        )
        .expect("write docx");
        fs::write(input.join("broken.docx"), "not a zip archive").expect("write junk");

        let output = dir.path().join("out");
        let result = batch_convert(&args(json!({
            "input_dir": input.to_string_lossy(),
            "output_dir": output.to_string_lossy(),
            "from_format": "docx",
            "to_format": "txt",
        })))
        .expect("batch");

        assert_eq!(result["files_found"], 2);
        assert_eq!(result["successful"], 1);
        assert_eq!(result["failed"], 1);
        let errors = result["errors"].as_array().expect("errors");
        assert!(errors[0]["file"].as_str().expect("file").contains("broken.docx"));
        assert!(output.join("good.txt").exists());
        assert!(!output.join("broken.txt").exists());
    }

    #[test]
    fn batch_honors_a_custom_pattern() {
        let dir = tempdir().expect("tempdir");
        let input = dir.path().join("in");
        fs::create_dir(&input).expect("mkdir");
        for name in ["report_q1.docx", "report_q2.docx", "scratch.docx"] {
            docx::write(
                &input.join(name),
                &[DocBlock::Paragraph { text: "x".to_string() }],
            )
            .expect("write docx");
        }

        let output = dir.path().join("out");
        let result = batch_convert(&args(json!({
            "input_dir": input.to_string_lossy(),
            "output_dir": output.to_string_lossy(),
            "from_format": "docx",
            "to_format": "txt",
            "pattern": "report_*.docx",
        })))
        .expect("batch");

        assert_eq!(result["files_found"], 2);
        assert!(output.join("report_q1.txt").exists());
        assert!(!output.join("scratch.txt").exists());
    }

    #[test]
    fn batch_unsupported_pair_fails_each_file() {
        let dir = tempdir().expect("tempdir");
        let input = dir.path().join("in");
        fs::create_dir(&input).expect("mkdir");
        for name in ["a.docx", "b.docx"] {
            docx::write(
                &input.join(name),
                &[DocBlock::Paragraph { text: "x".to_string() }],
            )
            .expect("write docx");
        }

        let output = dir.path().join("out");
        let result = batch_convert(&args(json!({
            "input_dir": input.to_string_lossy(),
            "output_dir": output.to_string_lossy(),
            "from_format": "docx",
            "to_format": "csv",
        })))
        .expect("batch completes");

        assert_eq!(result["files_found"], 2);
        assert_eq!(result["successful"], 0);
        assert_eq!(result["failed"], 2);
        let errors = result["errors"].as_array().expect("errors");
        assert_eq!(errors.len(), 2);
        assert!(errors[0]["error"].as_str().expect("error").contains("not supported"));
        assert!(errors[0]["file"].as_str().expect("file").contains("a.docx"));
    }

    #[test]
    fn batch_missing_input_dir_is_not_found() {
        let err = batch_convert(&args(json!({
            "input_dir": "/tmp/definitely-missing-dir",
            "output_dir": "/tmp/out",
            "from_format": "md",
            "to_format": "html",
        })))
        .expect_err("missing");
        assert_eq!(err.kind, FailureKind::NotFound);
    }

    #[test]
    fn markdown_docx_round_trip() {
        let dir = tempdir().expect("tempdir");
        let source = dir.path().join("doc.md");
        fs::write(&source, "# Title\n\nBody text.\n\n- point\n").expect("write md");

        let document = dir.path().join("doc.docx");
        markdown_to_docx(&args(json!({
            "file_path": source.to_string_lossy(),
            "output_path": document.to_string_lossy(),
        })))
        .expect("to docx");

        let back = dir.path().join("back.md");
        docx_to_markdown(&args(json!({
            "file_path": document.to_string_lossy(),
            "output_path": back.to_string_lossy(),
        })))
        .expect("to md");

        let text = fs::read_to_string(&back).expect("read back");
        assert!(text.contains("# Title"));
        assert!(text.contains("- point"));
    }
}

//! Word-document tools over the DOCX adapter.

use serde_json::{Value, json};

use crate::office::docx::{self, DocBlock};
use crate::registry::args::ToolArgs;
use crate::registry::failure::Failure;
use crate::registry::schema::{PropertySpec, ToolSchema};
use crate::registry::ToolDescriptor;
use crate::tools::rows_from_json;

pub fn descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "docx_extract_text",
            "Extract plain text from a Word document.",
            ToolSchema::new().required("file_path", PropertySpec::string("Path to the .docx file")),
            extract_text,
        ),
        ToolDescriptor::new(
            "docx_create",
            "Create a Word document from content blocks.",
            ToolSchema::new()
                .required("output_path", PropertySpec::string("Path for the new .docx file"))
                .required(
                    "content",
                    PropertySpec::array(
                        "Blocks: {type: heading|paragraph|bullet|table, text?, level?, rows?}",
                    ),
                ),
            create,
        ),
        ToolDescriptor::new(
            "docx_fill_template",
            "Fill {{placeholder}} markers in a template document.",
            ToolSchema::new()
                .required("template_path", PropertySpec::string("Path to the template .docx"))
                .required("output_path", PropertySpec::string("Path for the filled .docx"))
                .required("data", PropertySpec::object("Placeholder name to replacement value")),
            fill_template,
        ),
        ToolDescriptor::new(
            "docx_analyze_structure",
            "Summarize the heading outline and block counts of a document.",
            ToolSchema::new().required("file_path", PropertySpec::string("Path to the .docx file")),
            analyze_structure,
        ),
        ToolDescriptor::new(
            "docx_insert_table",
            "Insert a table of string rows into a document.",
            ToolSchema::new()
                .required("file_path", PropertySpec::string("Path to the source .docx"))
                .required("output_path", PropertySpec::string("Path for the modified .docx"))
                .required("rows", PropertySpec::array("Table rows, each an array of cells"))
                .optional(
                    "position",
                    PropertySpec::integer("Block index to insert at; defaults to the end"),
                ),
            insert_table,
        ),
        ToolDescriptor::new(
            "docx_merge",
            "Concatenate several documents into one.",
            ToolSchema::new()
                .required("file_paths", PropertySpec::array("Source .docx paths, in order"))
                .required("output_path", PropertySpec::string("Path for the merged .docx")),
            merge,
        ),
    ]
}

fn extract_text(args: &ToolArgs) -> Result<Value, Failure> {
    let path = args.req_existing_path("file_path")?;
    let blocks = docx::read(&path)?;
    let text = docx::blocks_to_text(&blocks);
    Ok(json!({
        "message": format!("extracted {} characters from {}", text.chars().count(), path.display()),
        "text": text,
    }))
}

fn blocks_from_json(content: &[Value]) -> Result<Vec<DocBlock>, Failure> {
    let mut blocks = Vec::new();
    for entry in content {
        let Some(object) = entry.as_object() else {
            return Err(Failure::invalid_arguments(
                "content entries must be objects with a type field",
            ));
        };
        let kind = object
            .get("type")
            .and_then(|value| value.as_str())
            .unwrap_or("paragraph");
        let text = object
            .get("text")
            .and_then(|value| value.as_str())
            .unwrap_or_default()
            .to_string();
        let block = match kind {
            "heading" => {
                let level = object
                    .get("level")
                    .and_then(|value| value.as_u64())
                    .unwrap_or(1)
                    .clamp(1, 9) as u8;
                DocBlock::Heading { level, text }
            }
            "paragraph" => DocBlock::Paragraph { text },
            "bullet" => DocBlock::Bullet { text },
            "table" => {
                let rows = object
                    .get("rows")
                    .and_then(|value| value.as_array())
                    .ok_or_else(|| {
                        Failure::invalid_arguments("table blocks require a rows array")
                    })?;
                DocBlock::Table {
                    rows: rows_from_json("rows", rows)?,
                }
            }
            other => {
                return Err(Failure::invalid_arguments(format!(
                    "unknown block type: {other}"
                )));
            }
        };
        blocks.push(block);
    }
    Ok(blocks)
}

fn create(args: &ToolArgs) -> Result<Value, Failure> {
    let output = args.req_path("output_path")?;
    let blocks = blocks_from_json(args.req_array("content")?)?;
    docx::write(&output, &blocks)?;
    Ok(json!({
        "message": format!("created {} with {} blocks", output.display(), blocks.len()),
        "output_path": output.display().to_string(),
        "blocks": blocks.len(),
    }))
}

fn fill_template(args: &ToolArgs) -> Result<Value, Failure> {
    let template = args.req_existing_path("template_path")?;
    let output = args.req_path("output_path")?;
    let data = args.req_object("data")?;

    let mut blocks = docx::read(&template)?;
    let mut replaced = 0usize;
    let mut substitute = |text: &mut String| {
        for (key, value) in data {
            let marker = format!("{{{{{key}}}}}");
            if text.contains(&marker) {
                let replacement = super::cell_string(value);
                replaced += text.matches(&marker).count();
                *text = text.replace(&marker, &replacement);
            }
        }
    };
    for block in &mut blocks {
        match block {
            DocBlock::Heading { text, .. }
            | DocBlock::Paragraph { text }
            | DocBlock::Bullet { text } => substitute(text),
            DocBlock::Table { rows } => {
                for row in rows {
                    for cell in row {
                        substitute(cell);
                    }
                }
            }
        }
    }

    docx::write(&output, &blocks)?;
    Ok(json!({
        "message": format!("filled {replaced} placeholders into {}", output.display()),
        "output_path": output.display().to_string(),
        "replacements": replaced,
    }))
}

fn analyze_structure(args: &ToolArgs) -> Result<Value, Failure> {
    let path = args.req_existing_path("file_path")?;
    let blocks = docx::read(&path)?;

    let mut outline = Vec::new();
    let mut paragraphs = 0usize;
    let mut bullets = 0usize;
    let mut tables = 0usize;
    let mut words = 0usize;
    for block in &blocks {
        if let Some(text) = block.text() {
            words += text.split_whitespace().count();
        }
        match block {
            DocBlock::Heading { level, text } => {
                outline.push(json!({"level": level, "text": text}));
            }
            DocBlock::Paragraph { .. } => paragraphs += 1,
            DocBlock::Bullet { .. } => bullets += 1,
            DocBlock::Table { rows } => {
                tables += 1;
                for row in rows {
                    for cell in row {
                        words += cell.split_whitespace().count();
                    }
                }
            }
        }
    }

    let headings = outline.len();
    Ok(json!({
        "message": format!(
            "{}: {headings} headings, {paragraphs} paragraphs, {tables} tables",
            path.display()
        ),
        "outline": outline,
        "headings": headings,
        "paragraphs": paragraphs,
        "bullets": bullets,
        "tables": tables,
        "word_count": words,
    }))
}

fn insert_table(args: &ToolArgs) -> Result<Value, Failure> {
    let path = args.req_existing_path("file_path")?;
    let output = args.req_path("output_path")?;
    let rows = rows_from_json("rows", args.req_array("rows")?)?;
    if rows.is_empty() {
        return Err(Failure::invalid_arguments("rows must not be empty"));
    }

    let mut blocks = docx::read(&path)?;
    let position = args
        .opt_u64("position")
        .map(|index| (index as usize).min(blocks.len()))
        .unwrap_or(blocks.len());
    blocks.insert(position, DocBlock::Table { rows });
    docx::write(&output, &blocks)?;

    Ok(json!({
        "message": format!("inserted table at block {position} into {}", output.display()),
        "output_path": output.display().to_string(),
        "position": position,
    }))
}

fn merge(args: &ToolArgs) -> Result<Value, Failure> {
    let inputs = args.req_existing_paths("file_paths")?;
    if inputs.is_empty() {
        return Err(Failure::invalid_arguments("file_paths must not be empty"));
    }
    let output = args.req_path("output_path")?;

    let mut merged = Vec::new();
    for path in &inputs {
        merged.extend(docx::read(path)?);
    }
    docx::write(&output, &merged)?;

    Ok(json!({
        "message": format!("merged {} documents into {}", inputs.len(), output.display()),
        "output_path": output.display().to_string(),
        "documents": inputs.len(),
        "blocks": merged.len(),
    }))
}

//! PDF tools over the lopdf adapter, plus OCR via the external engine.

use serde_json::{Value, json};
use std::fs;
use std::path::Path;

use crate::office::{ocr, pdf};
use crate::registry::ToolDescriptor;
use crate::registry::args::ToolArgs;
use crate::registry::failure::Failure;
use crate::registry::schema::{PropertySpec, ToolSchema};

pub fn descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "pdf_extract_text",
            "Extract text from a PDF.",
            ToolSchema::new()
                .required("file_path", PropertySpec::string("Path to the .pdf file"))
                .optional("pages", PropertySpec::string("Page selection, e.g. 1-3,7")),
            extract_text,
        ),
        ToolDescriptor::new(
            "pdf_merge",
            "Concatenate several PDFs into one.",
            ToolSchema::new()
                .required("file_paths", PropertySpec::array("Source .pdf paths, in order"))
                .required("output_path", PropertySpec::string("Path for the merged .pdf")),
            merge,
        ),
        ToolDescriptor::new(
            "pdf_split",
            "Split a PDF into per-page files or one page-range file.",
            ToolSchema::new()
                .required("file_path", PropertySpec::string("Path to the .pdf file"))
                .required("output_dir", PropertySpec::string("Directory for the output files"))
                .optional(
                    "mode",
                    PropertySpec::string("Split mode")
                        .one_of(&["pages", "range"])
                        .default_value(json!("pages")),
                )
                .optional("range", PropertySpec::string("Inclusive page range for range mode, e.g. 2-5")),
            split,
        ),
        ToolDescriptor::new(
            "pdf_add_watermark",
            "Stamp watermark text across every page.",
            ToolSchema::new()
                .required("file_path", PropertySpec::string("Path to the source .pdf"))
                .required("output_path", PropertySpec::string("Path for the stamped .pdf"))
                .required("text", PropertySpec::string("Watermark text")),
            add_watermark,
        ),
        ToolDescriptor::new(
            "pdf_fill_form",
            "Fill AcroForm text fields by name.",
            ToolSchema::new()
                .required("file_path", PropertySpec::string("Path to the form .pdf"))
                .required("output_path", PropertySpec::string("Path for the filled .pdf"))
                .required("data", PropertySpec::object("Field name to value")),
            fill_form,
        ),
        ToolDescriptor::new(
            "pdf_metadata",
            "Document information, page count, and encryption flag.",
            ToolSchema::new().required("file_path", PropertySpec::string("Path to the .pdf file")),
            metadata,
        ),
        ToolDescriptor::new(
            "ocr",
            "Recognize text in an image, or in a PDF's existing text layer.",
            ToolSchema::new()
                .required("file_path", PropertySpec::string("Path to the image or .pdf file"))
                .optional(
                    "language",
                    PropertySpec::string("Tesseract language code").default_value(json!("eng")),
                ),
            run_ocr,
        ),
    ]
}

/// Parses "1-3,7" into 1-based page numbers, preserving order.
fn parse_page_selection(selection: &str) -> Result<Vec<u32>, Failure> {
    let mut pages = Vec::new();
    for part in selection.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        if let Some((start, end)) = part.split_once('-') {
            let start: u32 = start.trim().parse().map_err(|_| bad_selection(selection))?;
            let end: u32 = end.trim().parse().map_err(|_| bad_selection(selection))?;
            if start == 0 || start > end {
                return Err(bad_selection(selection));
            }
            pages.extend(start..=end);
        } else {
            let page: u32 = part.parse().map_err(|_| bad_selection(selection))?;
            if page == 0 {
                return Err(bad_selection(selection));
            }
            pages.push(page);
        }
    }
    if pages.is_empty() {
        return Err(bad_selection(selection));
    }
    Ok(pages)
}

fn bad_selection(selection: &str) -> Failure {
    Failure::invalid_arguments(format!("pages must look like 1-3,7, got {selection}"))
}

fn extract_text(args: &ToolArgs) -> Result<Value, Failure> {
    let path = args.req_existing_path("file_path")?;
    let pages = args
        .opt_str("pages")
        .map(parse_page_selection)
        .transpose()?;
    let text = pdf::extract_text(&path, pages.as_deref())?;
    Ok(json!({
        "message": format!("extracted {} characters from {}", text.chars().count(), path.display()),
        "text": text,
    }))
}

fn merge(args: &ToolArgs) -> Result<Value, Failure> {
    let inputs = args.req_existing_paths("file_paths")?;
    if inputs.len() < 2 {
        return Err(Failure::invalid_arguments(
            "file_paths must name at least two documents",
        ));
    }
    let output = args.req_path("output_path")?;
    let pages = pdf::merge(&inputs, &output)?;
    Ok(json!({
        "message": format!(
            "merged {} documents ({pages} pages) into {}",
            inputs.len(),
            output.display()
        ),
        "output_path": output.display().to_string(),
        "documents": inputs.len(),
        "page_count": pages,
    }))
}

fn split(args: &ToolArgs) -> Result<Value, Failure> {
    let path = args.req_existing_path("file_path")?;
    let output_dir = args.req_path("output_dir")?;
    if !output_dir.is_dir() {
        return Err(Failure::not_found(&output_dir));
    }

    let written = match args.opt_str("mode").unwrap_or("pages") {
        "range" => {
            let range = args.opt_str("range").ok_or_else(|| {
                Failure::invalid_arguments("range mode requires a range, e.g. 2-5")
            })?;
            let (start, end) = range
                .split_once('-')
                .and_then(|(start, end)| {
                    Some((start.trim().parse().ok()?, end.trim().parse().ok()?))
                })
                .ok_or_else(|| {
                    Failure::invalid_arguments(format!("range must look like 2-5, got {range}"))
                })?;
            vec![pdf::split_range(&path, &output_dir, start, end)?]
        }
        _ => pdf::split_pages(&path, &output_dir)?,
    };

    let files: Vec<String> = written
        .iter()
        .map(|file| file.display().to_string())
        .collect();
    Ok(json!({
        "message": format!("wrote {} files into {}", files.len(), output_dir.display()),
        "file_count": files.len(),
        "files": files,
    }))
}

fn add_watermark(args: &ToolArgs) -> Result<Value, Failure> {
    let path = args.req_existing_path("file_path")?;
    let output = args.req_path("output_path")?;
    let text = args.req_str("text")?;
    let pages = pdf::add_watermark(&path, &output, text)?;
    Ok(json!({
        "message": format!("stamped {pages} pages into {}", output.display()),
        "output_path": output.display().to_string(),
        "page_count": pages,
    }))
}

fn fill_form(args: &ToolArgs) -> Result<Value, Failure> {
    let path = args.req_existing_path("file_path")?;
    let output = args.req_path("output_path")?;
    let data = args.req_object("data")?;
    let filled = pdf::fill_form(&path, &output, data)?;
    Ok(json!({
        "message": format!("filled {filled} fields into {}", output.display()),
        "output_path": output.display().to_string(),
        "fields_filled": filled,
    }))
}

fn metadata(args: &ToolArgs) -> Result<Value, Failure> {
    let path = args.req_existing_path("file_path")?;
    let mut summary = pdf::metadata(&path)?;
    if let Some(object) = summary.as_object_mut() {
        object.insert(
            "message".to_string(),
            json!(format!(
                "{}: {} pages",
                path.display(),
                object.get("page_count").cloned().unwrap_or(json!(0))
            )),
        );
        object.insert("file_path".to_string(), json!(path.display().to_string()));
    }
    Ok(summary)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
        || fs::read(path)
            .map(|bytes| bytes.starts_with(b"%PDF"))
            .unwrap_or(false)
}

fn run_ocr(args: &ToolArgs) -> Result<Value, Failure> {
    let path = args.req_existing_path("file_path")?;
    let language = args.opt_str("language").unwrap_or("eng");

    // A PDF with an extractable text layer short-circuits OCR; the result
    // says so explicitly rather than pretending recognition ran.
    if is_pdf(&path) {
        let text = pdf::extract_text(&path, None)?;
        if !text.trim().is_empty() {
            return Ok(json!({
                "message": format!(
                    "{} already has a text layer; OCR was skipped",
                    path.display()
                ),
                "text": text,
                "engine": "text-layer",
                "ocr_performed": false,
            }));
        }
        return Err(Failure::unsupported(
            "scanned PDFs require an external rasterizer, which is not bundled; \
             OCR accepts image files directly",
        ));
    }

    let output = ocr::run(&path, language)?;
    Ok(json!({
        "message": format!("recognized {} characters", output.text.chars().count()),
        "text": output.text,
        "confidence": output.confidence,
        "engine": "tesseract",
        "ocr_performed": true,
        "language": language,
    }))
}

//! Presentation tools over the PPTX adapter.

use serde_json::{Value, json};
use std::fs;

use crate::office::pptx::{self, SlideContent};
use crate::registry::ToolDescriptor;
use crate::registry::args::ToolArgs;
use crate::registry::failure::Failure;
use crate::registry::schema::{PropertySpec, ToolSchema};

pub fn descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "pptx_create",
            "Create a presentation from title-and-bullets slides.",
            ToolSchema::new()
                .required("output_path", PropertySpec::string("Path for the new .pptx file"))
                .required("slides", PropertySpec::array("Slides: {title, bullets?: [string]}")),
            create,
        ),
        ToolDescriptor::new(
            "pptx_extract",
            "Extract slide titles and body text from a presentation.",
            ToolSchema::new().required("file_path", PropertySpec::string("Path to the .pptx file")),
            extract,
        ),
        ToolDescriptor::new(
            "pptx_to_html",
            "Render a presentation as a standalone HTML page.",
            ToolSchema::new()
                .required("file_path", PropertySpec::string("Path to the .pptx file"))
                .required("output_path", PropertySpec::string("Path for the .html file")),
            to_html,
        ),
    ]
}

fn slides_from_json(entries: &[Value]) -> Result<Vec<SlideContent>, Failure> {
    let mut slides = Vec::new();
    for entry in entries {
        let Some(object) = entry.as_object() else {
            return Err(Failure::invalid_arguments(
                "slides entries must be objects with a title",
            ));
        };
        let title = object
            .get("title")
            .and_then(|value| value.as_str())
            .unwrap_or_default()
            .to_string();
        let bullets = object
            .get("bullets")
            .and_then(|value| value.as_array())
            .map(|items| items.iter().map(super::cell_string).collect())
            .unwrap_or_default();
        slides.push(SlideContent { title, bullets });
    }
    Ok(slides)
}

fn create(args: &ToolArgs) -> Result<Value, Failure> {
    let output = args.req_path("output_path")?;
    let slides = slides_from_json(args.req_array("slides")?)?;
    pptx::write(&output, &slides)?;
    Ok(json!({
        "message": format!("created {} with {} slides", output.display(), slides.len()),
        "output_path": output.display().to_string(),
        "slides": slides.len(),
    }))
}

fn extract(args: &ToolArgs) -> Result<Value, Failure> {
    let path = args.req_existing_path("file_path")?;
    let slides = pptx::read(&path)?;
    let rendered: Vec<Value> = slides
        .iter()
        .enumerate()
        .map(|(index, slide)| {
            json!({
                "slide": index + 1,
                "title": slide.title,
                "bullets": slide.bullets,
            })
        })
        .collect();
    Ok(json!({
        "message": format!("extracted {} slides from {}", slides.len(), path.display()),
        "slides": rendered,
        "slide_count": slides.len(),
    }))
}

fn to_html(args: &ToolArgs) -> Result<Value, Failure> {
    let path = args.req_existing_path("file_path")?;
    let output = args.req_path("output_path")?;
    let slides = pptx::read(&path)?;
    let html = pptx::slides_to_html(&slides);
    fs::write(&output, html).map_err(|err| {
        Failure::handler_error(format!("failed to write {}: {err}", output.display()))
    })?;
    Ok(json!({
        "message": format!("rendered {} slides into {}", slides.len(), output.display()),
        "output_path": output.display().to_string(),
        "slides": slides.len(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn args(value: Value) -> ToolArgs {
        match value {
            Value::Object(map) => ToolArgs::new(map),
            _ => panic!("args must be an object"),
        }
    }

    #[test]
    fn create_extract_round_trip() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("deck.pptx");
        create(&args(json!({
            "output_path": path.to_string_lossy(),
            "slides": [
                {"title": "Intro", "bullets": ["who", "why"]},
                {"title": "Close"},
            ],
        })))
        .expect("create");

        let extracted = extract(&args(json!({"file_path": path.to_string_lossy()})))
            .expect("extract");
        assert_eq!(extracted["slide_count"], 2);
        assert_eq!(extracted["slides"][0]["title"], json!("Intro"));
        assert_eq!(extracted["slides"][0]["bullets"][1], json!("why"));
    }

    #[test]
    fn html_conversion_writes_file() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("deck.pptx");
        pptx::write(
            &path,
            &[SlideContent {
                title: "Only".to_string(),
                bullets: vec!["point".to_string()],
            }],
        )
        .expect("write");

        let html_path = dir.path().join("deck.html");
        to_html(&args(json!({
            "file_path": path.to_string_lossy(),
            "output_path": html_path.to_string_lossy(),
        })))
        .expect("convert");

        let html = std::fs::read_to_string(&html_path).expect("read html");
        assert!(html.contains("<h1>Only</h1>"));
    }
}

//! DOCX adapter: reads and writes WordprocessingML packages over `zip` +
//! `quick-xml`. Documents are modeled as a flat list of blocks, which is
//! what the manipulation tools (merge, template fill, table insert) operate
//! on. Run-level formatting is not preserved.

use quick_xml::Reader;
use quick_xml::events::Event;
use std::fmt::Write as _;
use std::path::Path;

use crate::office::{escape_xml, read_zip_part, write_zip_package};
use crate::registry::failure::Failure;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocBlock {
    Heading { level: u8, text: String },
    Paragraph { text: String },
    Bullet { text: String },
    Table { rows: Vec<Vec<String>> },
}

impl DocBlock {
    pub fn text(&self) -> Option<&str> {
        match self {
            DocBlock::Heading { text, .. }
            | DocBlock::Paragraph { text }
            | DocBlock::Bullet { text } => Some(text),
            DocBlock::Table { .. } => None,
        }
    }
}

pub fn read(path: &Path) -> Result<Vec<DocBlock>, Failure> {
    let xml = read_zip_part(path, "word/document.xml")?;
    parse_document_xml(&xml)
}

pub fn write(path: &Path, blocks: &[DocBlock]) -> Result<(), Failure> {
    let document = render_document_xml(blocks);
    write_zip_package(
        path,
        &[
            ("[Content_Types].xml", CONTENT_TYPES),
            ("_rels/.rels", ROOT_RELS),
            ("word/document.xml", &document),
        ],
    )
}

/// Plain-text view of a document: one line per block, table cells joined
/// with tabs.
pub fn blocks_to_text(blocks: &[DocBlock]) -> String {
    let mut lines = Vec::new();
    for block in blocks {
        match block {
            DocBlock::Heading { text, .. }
            | DocBlock::Paragraph { text }
            | DocBlock::Bullet { text } => lines.push(text.clone()),
            DocBlock::Table { rows } => {
                for row in rows {
                    lines.push(row.join("\t"));
                }
            }
        }
    }
    lines.join("\n")
}

fn parse_document_xml(xml: &str) -> Result<Vec<DocBlock>, Failure> {
    let mut reader = Reader::from_str(xml);

    let mut blocks = Vec::new();
    let mut in_text = false;
    let mut in_table = false;
    let mut para_text = String::new();
    let mut para_style: Option<String> = None;
    let mut table_rows: Vec<Vec<String>> = Vec::new();
    let mut current_row: Vec<String> = Vec::new();
    let mut cell_text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => match element.name().as_ref() {
                b"w:p" => {
                    para_text.clear();
                    para_style = None;
                }
                b"w:t" => in_text = true,
                b"w:tbl" => {
                    in_table = true;
                    table_rows.clear();
                }
                b"w:tr" => current_row.clear(),
                b"w:tc" => cell_text.clear(),
                _ => {}
            },
            Ok(Event::Empty(element)) => {
                if element.name().as_ref() == b"w:pStyle"
                    && let Ok(Some(attr)) = element.try_get_attribute("w:val")
                    && let Ok(value) = attr.unescape_value()
                {
                    para_style = Some(value.into_owned());
                }
            }
            Ok(Event::Text(text)) => {
                if in_text {
                    let fragment = text
                        .unescape()
                        .map_err(|err| Failure::handler_error(format!("malformed docx: {err}")))?;
                    para_text.push_str(&fragment);
                }
            }
            Ok(Event::End(element)) => match element.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => {
                    if in_table {
                        if !cell_text.is_empty() && !para_text.is_empty() {
                            cell_text.push('\n');
                        }
                        cell_text.push_str(&para_text);
                        para_text.clear();
                    } else if !para_text.is_empty() {
                        blocks.push(classify(para_style.take(), std::mem::take(&mut para_text)));
                    }
                }
                b"w:tc" => current_row.push(std::mem::take(&mut cell_text)),
                b"w:tr" => table_rows.push(std::mem::take(&mut current_row)),
                b"w:tbl" => {
                    in_table = false;
                    blocks.push(DocBlock::Table {
                        rows: std::mem::take(&mut table_rows),
                    });
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                return Err(Failure::handler_error(format!("malformed docx: {err}")));
            }
        }
    }

    Ok(blocks)
}

fn classify(style: Option<String>, text: String) -> DocBlock {
    match style.as_deref() {
        Some(style) if style.starts_with("Heading") => {
            let level = style
                .trim_start_matches("Heading")
                .parse::<u8>()
                .unwrap_or(1)
                .clamp(1, 9);
            DocBlock::Heading { level, text }
        }
        Some("ListParagraph") | Some("ListBullet") => DocBlock::Bullet { text },
        _ => DocBlock::Paragraph { text },
    }
}

fn render_document_xml(blocks: &[DocBlock]) -> String {
    let mut body = String::new();
    for block in blocks {
        match block {
            DocBlock::Heading { level, text } => {
                render_paragraph(&mut body, Some(&format!("Heading{level}")), text);
            }
            DocBlock::Paragraph { text } => render_paragraph(&mut body, None, text),
            DocBlock::Bullet { text } => render_paragraph(&mut body, Some("ListParagraph"), text),
            DocBlock::Table { rows } => render_table(&mut body, rows),
        }
    }

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
         <w:body>{body}</w:body></w:document>"
    )
}

fn render_paragraph(out: &mut String, style: Option<&str>, text: &str) {
    out.push_str("<w:p>");
    if let Some(style) = style {
        let _ = write!(out, "<w:pPr><w:pStyle w:val=\"{style}\"/></w:pPr>");
    }
    let _ = write!(
        out,
        "<w:r><w:t xml:space=\"preserve\">{}</w:t></w:r>",
        escape_xml(text)
    );
    out.push_str("</w:p>");
}

fn render_table(out: &mut String, rows: &[Vec<String>]) {
    out.push_str(
        "<w:tbl><w:tblPr><w:tblBorders>\
         <w:top w:val=\"single\" w:sz=\"4\"/><w:bottom w:val=\"single\" w:sz=\"4\"/>\
         <w:left w:val=\"single\" w:sz=\"4\"/><w:right w:val=\"single\" w:sz=\"4\"/>\
         <w:insideH w:val=\"single\" w:sz=\"4\"/><w:insideV w:val=\"single\" w:sz=\"4\"/>\
         </w:tblBorders></w:tblPr>",
    );
    for row in rows {
        out.push_str("<w:tr>");
        for cell in row {
            let _ = write!(
                out,
                "<w:tc><w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p></w:tc>",
                escape_xml(cell)
            );
        }
        out.push_str("</w:tr>");
    }
    out.push_str("</w:tbl>");
}

const CONTENT_TYPES: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
<Default Extension=\"xml\" ContentType=\"application/xml\"/>\
<Override PartName=\"/word/document.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml\"/>\
</Types>";

const ROOT_RELS: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"word/document.xml\"/>\
</Relationships>";

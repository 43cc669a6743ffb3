//! PPTX adapter: title-and-bullets slide decks over `zip` + `quick-xml`.
//! The packages written here are deliberately minimal (no master/theme
//! parts); the consumers are text extraction and HTML conversion.

use quick_xml::Reader;
use quick_xml::events::Event;
use std::fmt::Write as _;
use std::path::Path;

use crate::office::{escape_xml, list_zip_parts, read_zip_part, write_zip_package};
use crate::registry::failure::Failure;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SlideContent {
    pub title: String,
    pub bullets: Vec<String>,
}

pub fn write(path: &Path, slides: &[SlideContent]) -> Result<(), Failure> {
    if slides.is_empty() {
        return Err(Failure::handler_error("presentation must have at least one slide"));
    }

    let mut content_types = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
         <Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
         <Default Extension=\"xml\" ContentType=\"application/xml\"/>\
         <Override PartName=\"/ppt/presentation.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml\"/>",
    );
    let mut slide_ids = String::new();
    let mut rels = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
    );
    let mut parts: Vec<(String, String)> = Vec::new();

    for (index, slide) in slides.iter().enumerate() {
        let number = index + 1;
        let _ = write!(
            content_types,
            "<Override PartName=\"/ppt/slides/slide{number}.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.slide+xml\"/>"
        );
        let _ = write!(
            slide_ids,
            "<p:sldId id=\"{}\" r:id=\"rId{number}\"/>",
            255 + number
        );
        let _ = write!(
            rels,
            "<Relationship Id=\"rId{number}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide\" Target=\"slides/slide{number}.xml\"/>"
        );
        parts.push((format!("ppt/slides/slide{number}.xml"), render_slide(slide)));
    }
    content_types.push_str("</Types>");
    rels.push_str("</Relationships>");

    let presentation = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <p:presentation xmlns:p=\"http://schemas.openxmlformats.org/presentationml/2006/main\" \
         xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\">\
         <p:sldIdLst>{slide_ids}</p:sldIdLst></p:presentation>"
    );

    let mut package: Vec<(&str, &str)> = vec![
        ("[Content_Types].xml", content_types.as_str()),
        ("_rels/.rels", ROOT_RELS),
        ("ppt/presentation.xml", presentation.as_str()),
        ("ppt/_rels/presentation.xml.rels", rels.as_str()),
    ];
    for (name, contents) in &parts {
        package.push((name.as_str(), contents.as_str()));
    }
    write_zip_package(path, &package)
}

const ROOT_RELS: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"ppt/presentation.xml\"/>\
</Relationships>";

fn render_slide(slide: &SlideContent) -> String {
    let mut body_paragraphs = String::new();
    for bullet in &slide.bullets {
        let _ = write!(
            body_paragraphs,
            "<a:p><a:r><a:t>{}</a:t></a:r></a:p>",
            escape_xml(bullet)
        );
    }
    if body_paragraphs.is_empty() {
        body_paragraphs.push_str("<a:p/>");
    }

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <p:sld xmlns:p=\"http://schemas.openxmlformats.org/presentationml/2006/main\" \
         xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\">\
         <p:cSld><p:spTree>\
         <p:sp><p:nvSpPr><p:nvPr><p:ph type=\"title\"/></p:nvPr></p:nvSpPr>\
         <p:txBody><a:bodyPr/><a:p><a:r><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp>\
         <p:sp><p:nvSpPr><p:nvPr><p:ph type=\"body\"/></p:nvPr></p:nvSpPr>\
         <p:txBody><a:bodyPr/>{body_paragraphs}</p:txBody></p:sp>\
         </p:spTree></p:cSld></p:sld>",
        escape_xml(&slide.title)
    )
}

pub fn read(path: &Path) -> Result<Vec<SlideContent>, Failure> {
    let mut slide_parts: Vec<(usize, String)> = Vec::new();
    for name in list_zip_parts(path)? {
        if let Some(rest) = name.strip_prefix("ppt/slides/slide")
            && let Some(digits) = rest.strip_suffix(".xml")
            && let Ok(number) = digits.parse::<usize>()
        {
            slide_parts.push((number, name));
        }
    }
    slide_parts.sort();

    if slide_parts.is_empty() {
        return Err(Failure::handler_error(format!(
            "{} contains no slides",
            path.display()
        )));
    }

    let mut slides = Vec::new();
    for (_, part) in slide_parts {
        let xml = read_zip_part(path, &part)?;
        slides.push(parse_slide_xml(&xml)?);
    }
    Ok(slides)
}

fn parse_slide_xml(xml: &str) -> Result<SlideContent, Failure> {
    let mut reader = Reader::from_str(xml);
    let mut slide = SlideContent::default();
    let mut placeholder = String::new();
    let mut line = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) | Ok(Event::Empty(element)) => {
                match element.local_name().as_ref() {
                    b"sp" => placeholder.clear(),
                    b"ph" => {
                        if let Ok(Some(attr)) = element.try_get_attribute("type")
                            && let Ok(value) = attr.unescape_value()
                        {
                            placeholder = value.into_owned();
                        }
                    }
                    b"p" => line.clear(),
                    b"t" => in_text = true,
                    _ => {}
                }
            }
            Ok(Event::Text(text)) if in_text => {
                let fragment = text
                    .unescape()
                    .map_err(|err| Failure::handler_error(format!("malformed slide: {err}")))?;
                line.push_str(&fragment);
            }
            Ok(Event::End(element)) => match element.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    if !line.is_empty() {
                        if placeholder == "title" || placeholder == "ctrTitle" {
                            if slide.title.is_empty() {
                                slide.title = std::mem::take(&mut line);
                            }
                        } else {
                            slide.bullets.push(std::mem::take(&mut line));
                        }
                    }
                    line.clear();
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                return Err(Failure::handler_error(format!("malformed slide: {err}")));
            }
        }
    }
    Ok(slide)
}

/// Standalone HTML rendering of a deck, one section per slide.
pub fn slides_to_html(slides: &[SlideContent]) -> String {
    let mut body = String::new();
    for slide in slides {
        body.push_str("  <section class=\"slide\">\n");
        let _ = write!(body, "    <h1>{}</h1>\n", escape_xml(&slide.title));
        if !slide.bullets.is_empty() {
            body.push_str("    <ul>\n");
            for bullet in &slide.bullets {
                let _ = write!(body, "      <li>{}</li>\n", escape_xml(bullet));
            }
            body.push_str("    </ul>\n");
        }
        body.push_str("  </section>\n");
    }

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <style>.slide {{ page-break-after: always; margin: 2em; }}</style>\n\
         </head>\n<body>\n{body}</body>\n</html>\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn deck() -> Vec<SlideContent> {
        vec![
            SlideContent {
                title: "Roadmap".to_string(),
                bullets: vec!["Q1: ship".to_string(), "Q2: scale".to_string()],
            },
            SlideContent {
                title: "Risks & Costs".to_string(),
                bullets: vec![],
            },
        ]
    }

    #[test]
    fn write_then_read_round_trips_slides() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("deck.pptx");
        write(&path, &deck()).expect("write");
        assert_eq!(read(&path).expect("read"), deck());
    }

    #[test]
    fn html_contains_titles_and_bullets() {
        let html = slides_to_html(&deck());
        assert!(html.contains("<h1>Roadmap</h1>"));
        assert!(html.contains("<li>Q1: ship</li>"));
        assert!(html.contains("Risks &amp; Costs"));
    }
}

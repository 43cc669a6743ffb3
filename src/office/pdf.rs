//! PDF adapter over `lopdf`: text extraction, merge, split, document-info
//! metadata, watermark stamping, and AcroForm text-field fill.

use lopdf::{Dictionary, Document, Object, ObjectId, dictionary};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::registry::failure::Failure;

fn load(path: &Path) -> Result<Document, Failure> {
    Document::load(path)
        .map_err(|err| Failure::handler_error(format!("failed to parse {}: {err}", path.display())))
}

pub fn page_count(path: &Path) -> Result<usize, Failure> {
    Ok(load(path)?.get_pages().len())
}

/// Extracts text from the given 1-based pages, or from every page.
pub fn extract_text(path: &Path, pages: Option<&[u32]>) -> Result<String, Failure> {
    let doc = load(path)?;
    let all: Vec<u32> = doc.get_pages().keys().copied().collect();
    let selected: Vec<u32> = match pages {
        Some(wanted) => {
            for number in wanted {
                if !all.contains(number) {
                    return Err(Failure::handler_error(format!(
                        "{} has no page {number}",
                        path.display()
                    )));
                }
            }
            wanted.to_vec()
        }
        None => all,
    };
    doc.extract_text(&selected)
        .map_err(|err| Failure::handler_error(format!("text extraction failed: {err}")))
}

/// Concatenates documents in argument order. Returns the total page count.
pub fn merge(inputs: &[PathBuf], output: &Path) -> Result<usize, Failure> {
    let mut max_id = 1;
    let mut page_objects: Vec<(ObjectId, Object)> = Vec::new();
    let mut all_objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for path in inputs {
        let mut doc = load(path)?;
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        for (_, object_id) in doc.get_pages() {
            let object = doc
                .get_object(object_id)
                .map_err(|err| {
                    Failure::handler_error(format!("broken page tree in {}: {err}", path.display()))
                })?
                .to_owned();
            page_objects.push((object_id, object));
        }
        all_objects.extend(doc.objects);
    }

    let mut merged = Document::with_version("1.5");
    let mut pages_entry: Option<(ObjectId, Dictionary)> = None;
    let mut catalog_entry: Option<(ObjectId, Dictionary)> = None;

    for (object_id, object) in &all_objects {
        let Ok(dict) = object.as_dict() else {
            merged.objects.insert(*object_id, object.clone());
            continue;
        };
        let type_name = dict.get(b"Type").ok().and_then(|obj| obj.as_name().ok());
        match type_name {
            Some(b"Catalog") => {
                if catalog_entry.is_none() {
                    catalog_entry = Some((*object_id, dict.clone()));
                }
            }
            Some(b"Pages") => {
                if pages_entry.is_none() {
                    pages_entry = Some((*object_id, dict.clone()));
                }
            }
            Some(b"Page") | Some(b"Outlines") | Some(b"Outline") => {}
            _ => {
                merged.objects.insert(*object_id, object.clone());
            }
        }
    }

    let (pages_id, mut pages_dict) =
        pages_entry.ok_or_else(|| Failure::handler_error("no page tree found in inputs"))?;
    let (catalog_id, mut catalog_dict) =
        catalog_entry.ok_or_else(|| Failure::handler_error("no catalog found in inputs"))?;

    for (object_id, object) in &page_objects {
        if let Ok(dict) = object.as_dict() {
            let mut page = dict.clone();
            page.set("Parent", pages_id);
            merged.objects.insert(*object_id, Object::Dictionary(page));
        }
    }

    pages_dict.set("Count", page_objects.len() as u32);
    pages_dict.set(
        "Kids",
        page_objects
            .iter()
            .map(|(id, _)| Object::Reference(*id))
            .collect::<Vec<Object>>(),
    );
    merged.objects.insert(pages_id, Object::Dictionary(pages_dict));

    catalog_dict.set("Pages", pages_id);
    catalog_dict.remove(b"Outlines");
    merged
        .objects
        .insert(catalog_id, Object::Dictionary(catalog_dict));

    merged.trailer.set("Root", catalog_id);
    merged.max_id = max_id;
    merged.renumber_objects();
    merged.compress();
    merged
        .save(output)
        .map_err(|err| Failure::handler_error(format!("failed to write merged pdf: {err}")))?;
    Ok(page_objects.len())
}

/// Writes one file per page into `output_dir`. Returns the paths written.
pub fn split_pages(path: &Path, output_dir: &Path) -> Result<Vec<PathBuf>, Failure> {
    let total = page_count(path)? as u32;
    let stem = file_stem(path);
    let mut written = Vec::new();
    for page in 1..=total {
        let drop: Vec<u32> = (1..=total).filter(|&number| number != page).collect();
        let target = output_dir.join(format!("{stem}_page_{page}.pdf"));
        save_without_pages(path, &drop, &target)?;
        written.push(target);
    }
    Ok(written)
}

/// Writes one file holding the inclusive 1-based `start..=end` page range.
pub fn split_range(path: &Path, output_dir: &Path, start: u32, end: u32) -> Result<PathBuf, Failure> {
    let total = page_count(path)? as u32;
    if start == 0 || start > end || end > total {
        return Err(Failure::handler_error(format!(
            "invalid page range {start}-{end} for a {total}-page document"
        )));
    }
    let drop: Vec<u32> = (1..=total)
        .filter(|&number| number < start || number > end)
        .collect();
    let stem = file_stem(path);
    let target = output_dir.join(format!("{stem}_pages_{start}-{end}.pdf"));
    save_without_pages(path, &drop, &target)?;
    Ok(target)
}

fn save_without_pages(path: &Path, drop: &[u32], target: &Path) -> Result<(), Failure> {
    let mut doc = load(path)?;
    if !drop.is_empty() {
        doc.delete_pages(drop);
    }
    doc.prune_objects();
    doc.renumber_objects();
    doc.save(target)
        .map_err(|err| Failure::handler_error(format!("failed to write {}: {err}", target.display())))?;
    Ok(())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}

/// Document information dictionary plus page count and encryption flag.
pub fn metadata(path: &Path) -> Result<Value, Failure> {
    let doc = load(path)?;
    let pages = doc.get_pages().len();
    let encrypted = doc.trailer.get(b"Encrypt").is_ok();

    let mut info_fields = Map::new();
    let info_dict = match doc.trailer.get(b"Info") {
        Ok(Object::Reference(id)) => doc
            .get_object(*id)
            .ok()
            .and_then(|obj| obj.as_dict().ok().cloned()),
        Ok(Object::Dictionary(dict)) => Some(dict.clone()),
        _ => None,
    };
    if let Some(dict) = info_dict {
        for (key, value) in dict.iter() {
            let name = String::from_utf8_lossy(key).to_string();
            if let Object::String(bytes, _) = value {
                info_fields.insert(name, json!(decode_pdf_string(bytes)));
            }
        }
    }

    Ok(json!({
        "page_count": pages,
        "encrypted": encrypted,
        "info": info_fields,
    }))
}

fn decode_pdf_string(bytes: &[u8]) -> String {
    // UTF-16BE with BOM, otherwise treated as Latin-1.
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        bytes.iter().map(|&byte| byte as char).collect()
    }
}

/// Stamps `text` across every page in light gray. The built-in Helvetica
/// font is registered in each page's resources under a private name.
pub fn add_watermark(path: &Path, output: &Path, text: &str) -> Result<usize, Failure> {
    let mut doc = load(path)?;
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let pages: Vec<ObjectId> = doc.get_pages().values().copied().collect();
    let stamp = format!(
        "\nq BT /WmF0 42 Tf 0.82 0.82 0.82 rg 0.7071 0.7071 -0.7071 0.7071 140 240 Tm ({}) Tj ET Q",
        escape_pdf_text(text)
    );
    for page_id in &pages {
        add_page_font(&mut doc, *page_id, "WmF0", font_id)?;
        let mut content = doc.get_page_content(*page_id).map_err(|err| {
            Failure::handler_error(format!("failed to read page content: {err}"))
        })?;
        content.extend_from_slice(stamp.as_bytes());
        doc.change_page_content(*page_id, content).map_err(|err| {
            Failure::handler_error(format!("failed to update page content: {err}"))
        })?;
    }

    doc.save(output)
        .map_err(|err| Failure::handler_error(format!("failed to write {}: {err}", output.display())))?;
    Ok(pages.len())
}

fn escape_pdf_text(text: &str) -> String {
    text.chars()
        .filter(|ch| ch.is_ascii() && !ch.is_ascii_control())
        .map(|ch| match ch {
            '(' => "\\(".to_string(),
            ')' => "\\)".to_string(),
            '\\' => "\\\\".to_string(),
            other => other.to_string(),
        })
        .collect()
}

fn add_page_font(
    doc: &mut Document,
    page_id: ObjectId,
    name: &str,
    font_id: ObjectId,
) -> Result<(), Failure> {
    let resources = doc
        .get_dictionary(page_id)
        .ok()
        .and_then(|page| page.get(b"Resources").ok().cloned());

    match resources {
        Some(Object::Reference(resources_id)) => {
            let dict = doc
                .get_object_mut(resources_id)
                .and_then(|obj| obj.as_dict_mut())
                .map_err(|err| Failure::handler_error(format!("broken resources: {err}")))?;
            insert_font(dict, name, font_id);
        }
        Some(Object::Dictionary(mut dict)) => {
            insert_font(&mut dict, name, font_id);
            set_page_resources(doc, page_id, dict)?;
        }
        _ => {
            let mut dict = Dictionary::new();
            insert_font(&mut dict, name, font_id);
            set_page_resources(doc, page_id, dict)?;
        }
    }
    Ok(())
}

fn insert_font(resources: &mut Dictionary, name: &str, font_id: ObjectId) {
    let mut fonts = match resources.get(b"Font") {
        Ok(Object::Dictionary(existing)) => existing.clone(),
        _ => Dictionary::new(),
    };
    fonts.set(name.as_bytes(), font_id);
    resources.set("Font", Object::Dictionary(fonts));
}

fn set_page_resources(
    doc: &mut Document,
    page_id: ObjectId,
    resources: Dictionary,
) -> Result<(), Failure> {
    let page = doc
        .get_object_mut(page_id)
        .and_then(|obj| obj.as_dict_mut())
        .map_err(|err| Failure::handler_error(format!("broken page object: {err}")))?;
    page.set("Resources", Object::Dictionary(resources));
    Ok(())
}

/// Fills AcroForm text fields from `data`. Returns the number of fields
/// filled; a matched field of any non-text type is an error naming it.
pub fn fill_form(
    path: &Path,
    output: &Path,
    data: &Map<String, Value>,
) -> Result<usize, Failure> {
    let mut doc = load(path)?;

    let root_id = doc
        .trailer
        .get(b"Root")
        .and_then(|obj| obj.as_reference())
        .map_err(|err| Failure::handler_error(format!("broken catalog: {err}")))?;
    let acroform = doc
        .get_dictionary(root_id)
        .ok()
        .and_then(|catalog| catalog.get(b"AcroForm").ok().cloned());
    let (acroform_id, acroform_dict) = match acroform {
        Some(Object::Reference(id)) => {
            let dict = doc
                .get_dictionary(id)
                .map_err(|err| Failure::handler_error(format!("broken AcroForm: {err}")))?
                .clone();
            (Some(id), dict)
        }
        Some(Object::Dictionary(dict)) => (None, dict),
        _ => return Err(Failure::handler_error("document has no AcroForm")),
    };

    let field_ids: Vec<ObjectId> = acroform_dict
        .get(b"Fields")
        .and_then(|obj| obj.as_array())
        .map(|fields| {
            fields
                .iter()
                .filter_map(|entry| entry.as_reference().ok())
                .collect()
        })
        .unwrap_or_default();

    let mut filled = 0usize;
    for field_id in field_ids {
        let (field_name, field_type) = {
            let field = doc
                .get_dictionary(field_id)
                .map_err(|err| Failure::handler_error(format!("broken form field: {err}")))?;
            let name = field
                .get(b"T")
                .ok()
                .and_then(|obj| match obj {
                    Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
                    _ => None,
                });
            let field_type = field
                .get(b"FT")
                .ok()
                .and_then(|obj| obj.as_name().ok())
                .map(|name| String::from_utf8_lossy(name).to_string());
            (name, field_type)
        };

        let Some(name) = field_name else { continue };
        let Some(value) = data.get(&name) else { continue };

        match field_type.as_deref() {
            Some("Tx") => {
                let text = match value {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                };
                let field = doc
                    .get_object_mut(field_id)
                    .and_then(|obj| obj.as_dict_mut())
                    .map_err(|err| Failure::handler_error(format!("broken form field: {err}")))?;
                field.set("V", Object::string_literal(text));
                field.remove(b"AP");
                filled += 1;
            }
            other => {
                return Err(Failure::handler_error(format!(
                    "unsupported field type {} for field {name}",
                    other.unwrap_or("(none)")
                )));
            }
        }
    }

    // Viewers regenerate appearances for the filled values.
    match acroform_id {
        Some(id) => {
            if let Ok(dict) = doc.get_object_mut(id).and_then(|obj| obj.as_dict_mut()) {
                dict.set("NeedAppearances", true);
            }
        }
        None => {
            let mut updated = acroform_dict;
            updated.set("NeedAppearances", true);
            if let Ok(catalog) = doc.get_object_mut(root_id).and_then(|obj| obj.as_dict_mut()) {
                catalog.set("AcroForm", Object::Dictionary(updated));
            }
        }
    }

    doc.save(output)
        .map_err(|err| Failure::handler_error(format!("failed to write {}: {err}", output.display())))?;
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::Stream;
    use lopdf::content::{Content, Operation};
    use tempfile::tempdir;

    fn sample_pdf(path: &Path, lines: &[&str]) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids = Vec::new();
        for line in lines {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![100.into(), 700.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*line)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                content.encode().expect("encode content"),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            });
            kids.push(page_id.into());
        }

        let count = lines.len() as u32;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).expect("save sample pdf");
    }

    #[test]
    fn extract_text_reads_back_page_text() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("sample.pdf");
        sample_pdf(&path, &["hello pdf world"]);

        let text = extract_text(&path, None).expect("extract");
        assert!(text.contains("hello pdf world"));
    }

    #[test]
    fn extract_text_rejects_bad_page_number() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("sample.pdf");
        sample_pdf(&path, &["only page"]);
        assert!(extract_text(&path, Some(&[9])).is_err());
    }

    #[test]
    fn merge_concatenates_page_counts() {
        let dir = tempdir().expect("tempdir");
        let first = dir.path().join("a.pdf");
        let second = dir.path().join("b.pdf");
        sample_pdf(&first, &["alpha"]);
        sample_pdf(&second, &["beta", "gamma"]);

        let out = dir.path().join("merged.pdf");
        let pages = merge(&[first, second], &out).expect("merge");
        assert_eq!(pages, 3);
        assert_eq!(page_count(&out).expect("count"), 3);
        let text = extract_text(&out, None).expect("extract");
        assert!(text.contains("alpha"));
        assert!(text.contains("gamma"));
    }

    #[test]
    fn split_writes_one_file_per_page() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("multi.pdf");
        sample_pdf(&path, &["one", "two", "three"]);

        let out_dir = dir.path().join("parts");
        std::fs::create_dir_all(&out_dir).expect("mkdir");
        let written = split_pages(&path, &out_dir).expect("split");
        assert_eq!(written.len(), 3);
        for file in &written {
            assert_eq!(page_count(file).expect("count"), 1);
        }
    }

    #[test]
    fn split_range_validates_bounds() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("multi.pdf");
        sample_pdf(&path, &["one", "two"]);
        assert!(split_range(&path, dir.path(), 2, 9).is_err());
        let out = split_range(&path, dir.path(), 1, 2).expect("range");
        assert_eq!(page_count(&out).expect("count"), 2);
    }

    #[test]
    fn metadata_reports_page_count() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("meta.pdf");
        sample_pdf(&path, &["page"]);
        let info = metadata(&path).expect("metadata");
        assert_eq!(info["page_count"], 1);
        assert_eq!(info["encrypted"], false);
    }

    #[test]
    fn watermark_keeps_original_text() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("orig.pdf");
        sample_pdf(&path, &["body text"]);
        let out = dir.path().join("stamped.pdf");
        let pages = add_watermark(&path, &out, "DRAFT (internal)").expect("watermark");
        assert_eq!(pages, 1);
        let text = extract_text(&out, None).expect("extract");
        assert!(text.contains("body text"));
    }
}

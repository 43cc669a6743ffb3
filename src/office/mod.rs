//! Capability adapters wrapping the format-level work: OOXML containers
//! over `zip` + `quick-xml`, PDF over `lopdf`, Markdown over
//! `pulldown-cmark`, OCR via a system tesseract binary, and a hand-rolled
//! CSV codec.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::registry::failure::Failure;

pub mod csv;
pub mod docx;
pub mod markdown;
pub mod ocr;
pub mod pdf;
pub mod pptx;
pub mod xlsx;

pub fn escape_xml(text: &str) -> String {
    quick_xml::escape::escape(text).into_owned()
}

/// Reads one named part out of an OOXML package.
pub fn read_zip_part(path: &Path, part: &str) -> Result<String, Failure> {
    let file = File::open(path)
        .map_err(|err| Failure::handler_error(format!("cannot open {}: {err}", path.display())))?;
    let mut archive = ZipArchive::new(file).map_err(|err| {
        Failure::handler_error(format!("{} is not a valid package: {err}", path.display()))
    })?;
    let mut entry = archive.by_name(part).map_err(|err| {
        Failure::handler_error(format!("{} has no part {part}: {err}", path.display()))
    })?;
    let mut contents = String::new();
    entry
        .read_to_string(&mut contents)
        .map_err(|err| Failure::handler_error(format!("failed to read {part}: {err}")))?;
    Ok(contents)
}

/// Reads a named part if present.
pub fn read_zip_part_opt(path: &Path, part: &str) -> Result<Option<String>, Failure> {
    let file = File::open(path)
        .map_err(|err| Failure::handler_error(format!("cannot open {}: {err}", path.display())))?;
    let mut archive = ZipArchive::new(file).map_err(|err| {
        Failure::handler_error(format!("{} is not a valid package: {err}", path.display()))
    })?;
    let Ok(mut entry) = archive.by_name(part) else {
        return Ok(None);
    };
    let mut contents = String::new();
    entry
        .read_to_string(&mut contents)
        .map_err(|err| Failure::handler_error(format!("failed to read {part}: {err}")))?;
    Ok(Some(contents))
}

/// Lists the entry names in a package.
pub fn list_zip_parts(path: &Path) -> Result<Vec<String>, Failure> {
    let file = File::open(path)
        .map_err(|err| Failure::handler_error(format!("cannot open {}: {err}", path.display())))?;
    let archive = ZipArchive::new(file).map_err(|err| {
        Failure::handler_error(format!("{} is not a valid package: {err}", path.display()))
    })?;
    Ok(archive.file_names().map(str::to_string).collect())
}

/// Writes a complete OOXML package in one pass.
pub fn write_zip_package(path: &Path, parts: &[(&str, &str)]) -> Result<(), Failure> {
    let file = File::create(path).map_err(|err| {
        Failure::handler_error(format!("cannot create {}: {err}", path.display()))
    })?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default();
    for (name, contents) in parts {
        zip.start_file(name.to_string(), options)
            .map_err(|err| Failure::handler_error(format!("failed to add {name}: {err}")))?;
        zip.write_all(contents.as_bytes())
            .map_err(|err| Failure::handler_error(format!("failed to write {name}: {err}")))?;
    }
    zip.finish()
        .map_err(|err| Failure::handler_error(format!("failed to finish package: {err}")))?;
    Ok(())
}

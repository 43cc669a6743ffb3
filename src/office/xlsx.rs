//! XLSX adapter: worksheet grids over `zip` + `quick-xml`. Reading handles
//! inline strings, shared strings, numbers, booleans, and cached formula
//! values; writing emits inline strings so text survives byte-exact.

use quick_xml::Reader;
use quick_xml::events::Event;
use std::fmt::Write as _;
use std::path::Path;

use crate::office::{escape_xml, read_zip_part, read_zip_part_opt, write_zip_package};
use crate::registry::failure::Failure;

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Formula(String),
}

impl CellValue {
    pub fn to_display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(text) => text.clone(),
            CellValue::Number(value) => format_number(*value),
            CellValue::Bool(value) => value.to_string(),
            CellValue::Formula(formula) => format!("={formula}"),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(value) => Some(*value),
            CellValue::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<CellValue>>,
}

/// Zero-based (row, column) from an A1-style reference.
pub fn parse_cell_ref(reference: &str) -> Option<(usize, usize)> {
    let split = reference.find(|ch: char| ch.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    if letters.is_empty() || digits.is_empty() {
        return None;
    }
    let mut column = 0usize;
    for ch in letters.chars() {
        let upper = ch.to_ascii_uppercase();
        if !upper.is_ascii_uppercase() {
            return None;
        }
        column = column * 26 + (upper as usize - 'A' as usize + 1);
    }
    let row: usize = digits.parse().ok()?;
    if row == 0 {
        return None;
    }
    Some((row - 1, column - 1))
}

/// A1-style column letters for a zero-based column index.
pub fn column_letters(mut column: usize) -> String {
    let mut letters = Vec::new();
    column += 1;
    while column > 0 {
        let rem = (column - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        column = (column - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Inclusive zero-based bounds from an "A1:C5" range.
pub fn parse_range(range: &str) -> Option<((usize, usize), (usize, usize))> {
    let (start, end) = range.split_once(':')?;
    Some((parse_cell_ref(start.trim())?, parse_cell_ref(end.trim())?))
}

pub fn read_sheets(path: &Path) -> Result<Vec<Sheet>, Failure> {
    let workbook = read_zip_part(path, "xl/workbook.xml")?;
    let names = parse_sheet_names(&workbook)?;
    let shared = match read_zip_part_opt(path, "xl/sharedStrings.xml")? {
        Some(xml) => parse_shared_strings(&xml)?,
        None => Vec::new(),
    };

    let mut sheets = Vec::new();
    for (index, name) in names.into_iter().enumerate() {
        let part = format!("xl/worksheets/sheet{}.xml", index + 1);
        let Some(xml) = read_zip_part_opt(path, &part)? else {
            return Err(Failure::handler_error(format!(
                "{} is missing worksheet part {part}",
                path.display()
            )));
        };
        sheets.push(Sheet {
            name,
            rows: parse_worksheet(&xml, &shared)?,
        });
    }
    Ok(sheets)
}

/// Reads one sheet by name, or the first sheet when no name is given.
pub fn read_sheet(path: &Path, name: Option<&str>) -> Result<Sheet, Failure> {
    let sheets = read_sheets(path)?;
    match name {
        None => sheets
            .into_iter()
            .next()
            .ok_or_else(|| Failure::handler_error("workbook has no sheets")),
        Some(wanted) => sheets
            .into_iter()
            .find(|sheet| sheet.name == wanted)
            .ok_or_else(|| Failure::handler_error(format!("no such sheet: {wanted}"))),
    }
}

pub fn write(path: &Path, sheets: &[Sheet]) -> Result<(), Failure> {
    if sheets.is_empty() {
        return Err(Failure::handler_error("workbook must have at least one sheet"));
    }

    let mut content_types = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
         <Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
         <Default Extension=\"xml\" ContentType=\"application/xml\"/>\
         <Override PartName=\"/xl/workbook.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml\"/>",
    );
    let mut workbook_sheets = String::new();
    let mut rels = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
    );
    let mut parts: Vec<(String, String)> = Vec::new();

    for (index, sheet) in sheets.iter().enumerate() {
        let number = index + 1;
        let _ = write!(
            content_types,
            "<Override PartName=\"/xl/worksheets/sheet{number}.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml\"/>"
        );
        let _ = write!(
            workbook_sheets,
            "<sheet name=\"{}\" sheetId=\"{number}\" r:id=\"rId{number}\"/>",
            escape_xml(&sheet.name)
        );
        let _ = write!(
            rels,
            "<Relationship Id=\"rId{number}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet\" Target=\"worksheets/sheet{number}.xml\"/>"
        );
        parts.push((
            format!("xl/worksheets/sheet{number}.xml"),
            render_worksheet(&sheet.rows),
        ));
    }
    content_types.push_str("</Types>");
    rels.push_str("</Relationships>");

    let workbook = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <workbook xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\" \
         xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\">\
         <sheets>{workbook_sheets}</sheets></workbook>"
    );

    let mut package: Vec<(&str, &str)> = vec![
        ("[Content_Types].xml", content_types.as_str()),
        ("_rels/.rels", ROOT_RELS),
        ("xl/workbook.xml", workbook.as_str()),
        ("xl/_rels/workbook.xml.rels", rels.as_str()),
    ];
    for (name, contents) in &parts {
        package.push((name.as_str(), contents.as_str()));
    }
    write_zip_package(path, &package)
}

const ROOT_RELS: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"xl/workbook.xml\"/>\
</Relationships>";

fn render_worksheet(rows: &[Vec<CellValue>]) -> String {
    let mut data = String::new();
    for (row_index, row) in rows.iter().enumerate() {
        let _ = write!(data, "<row r=\"{}\">", row_index + 1);
        for (col_index, cell) in row.iter().enumerate() {
            let reference = format!("{}{}", column_letters(col_index), row_index + 1);
            match cell {
                CellValue::Empty => {}
                CellValue::Text(text) => {
                    let _ = write!(
                        data,
                        "<c r=\"{reference}\" t=\"inlineStr\"><is><t xml:space=\"preserve\">{}</t></is></c>",
                        escape_xml(text)
                    );
                }
                CellValue::Number(value) => {
                    let _ = write!(
                        data,
                        "<c r=\"{reference}\"><v>{}</v></c>",
                        format_number(*value)
                    );
                }
                CellValue::Bool(value) => {
                    let _ = write!(
                        data,
                        "<c r=\"{reference}\" t=\"b\"><v>{}</v></c>",
                        if *value { 1 } else { 0 }
                    );
                }
                CellValue::Formula(formula) => {
                    let _ = write!(
                        data,
                        "<c r=\"{reference}\"><f>{}</f></c>",
                        escape_xml(formula)
                    );
                }
            }
        }
        data.push_str("</row>");
    }

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <worksheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\">\
         <sheetData>{data}</sheetData></worksheet>"
    )
}

fn parse_sheet_names(workbook_xml: &str) -> Result<Vec<String>, Failure> {
    let mut reader = Reader::from_str(workbook_xml);
    let mut names = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) | Ok(Event::Empty(element)) => {
                if element.local_name().as_ref() == b"sheet"
                    && let Ok(Some(attr)) = element.try_get_attribute("name")
                    && let Ok(value) = attr.unescape_value()
                {
                    names.push(value.into_owned());
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                return Err(Failure::handler_error(format!("malformed workbook: {err}")));
            }
        }
    }
    Ok(names)
}

fn parse_shared_strings(xml: &str) -> Result<Vec<String>, Failure> {
    let mut reader = Reader::from_str(xml);
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_item = false;
    let mut in_text = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => match element.local_name().as_ref() {
                b"si" => {
                    in_item = true;
                    current.clear();
                }
                b"t" if in_item => in_text = true,
                _ => {}
            },
            Ok(Event::Text(text)) if in_text => {
                let fragment = text.unescape().map_err(|err| {
                    Failure::handler_error(format!("malformed shared strings: {err}"))
                })?;
                current.push_str(&fragment);
            }
            Ok(Event::End(element)) => match element.local_name().as_ref() {
                b"t" => in_text = false,
                b"si" => {
                    in_item = false;
                    strings.push(std::mem::take(&mut current));
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                return Err(Failure::handler_error(format!(
                    "malformed shared strings: {err}"
                )));
            }
        }
    }
    Ok(strings)
}

#[derive(Default)]
struct CellState {
    reference: Option<(usize, usize)>,
    cell_type: String,
    value: String,
    formula: String,
    in_value: bool,
    in_formula: bool,
    in_inline_text: bool,
    inline: String,
}

fn parse_worksheet(xml: &str, shared: &[String]) -> Result<Vec<Vec<CellValue>>, Failure> {
    let mut reader = Reader::from_str(xml);
    let mut cells: Vec<((usize, usize), CellValue)> = Vec::new();
    let mut state = CellState::default();
    let mut next_row = 0usize;
    let mut next_col = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) | Ok(Event::Empty(element)) => {
                match element.local_name().as_ref() {
                    b"row" => {
                        if let Ok(Some(attr)) = element.try_get_attribute("r")
                            && let Ok(value) = attr.unescape_value()
                            && let Ok(number) = value.parse::<usize>()
                            && number > 0
                        {
                            next_row = number - 1;
                        }
                        next_col = 0;
                    }
                    b"c" => {
                        state = CellState::default();
                        if let Ok(Some(attr)) = element.try_get_attribute("r")
                            && let Ok(value) = attr.unescape_value()
                        {
                            state.reference = parse_cell_ref(&value);
                        }
                        if let Ok(Some(attr)) = element.try_get_attribute("t")
                            && let Ok(value) = attr.unescape_value()
                        {
                            state.cell_type = value.into_owned();
                        }
                    }
                    b"v" => state.in_value = true,
                    b"f" => state.in_formula = true,
                    b"t" => state.in_inline_text = true,
                    _ => {}
                }
            }
            Ok(Event::Text(text)) => {
                let fragment = text
                    .unescape()
                    .map_err(|err| Failure::handler_error(format!("malformed worksheet: {err}")))?;
                if state.in_value {
                    state.value.push_str(&fragment);
                } else if state.in_formula {
                    state.formula.push_str(&fragment);
                } else if state.in_inline_text {
                    state.inline.push_str(&fragment);
                }
            }
            Ok(Event::End(element)) => match element.local_name().as_ref() {
                b"v" => state.in_value = false,
                b"f" => state.in_formula = false,
                b"t" => state.in_inline_text = false,
                // Fallback cursor for rows that omit the `r` attribute; rows
                // that carry one overwrite this at their start tag.
                b"row" => next_row += 1,
                b"c" => {
                    let position = state.reference.unwrap_or((next_row, next_col));
                    next_col = position.1 + 1;
                    cells.push((position, finish_cell(&state, shared)));
                    state = CellState::default();
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                return Err(Failure::handler_error(format!("malformed worksheet: {err}")));
            }
        }
    }

    let mut rows: Vec<Vec<CellValue>> = Vec::new();
    for ((row, col), value) in cells {
        if rows.len() <= row {
            rows.resize_with(row + 1, Vec::new);
        }
        let line = &mut rows[row];
        if line.len() <= col {
            line.resize(col + 1, CellValue::Empty);
        }
        line[col] = value;
    }
    Ok(rows)
}

fn finish_cell(state: &CellState, shared: &[String]) -> CellValue {
    match state.cell_type.as_str() {
        "inlineStr" => CellValue::Text(state.inline.clone()),
        "s" => {
            let index: usize = state.value.trim().parse().unwrap_or(usize::MAX);
            shared
                .get(index)
                .map(|text| CellValue::Text(text.clone()))
                .unwrap_or(CellValue::Empty)
        }
        "b" => CellValue::Bool(state.value.trim() == "1"),
        "str" => CellValue::Text(state.value.clone()),
        _ => {
            if !state.value.is_empty() {
                match state.value.trim().parse::<f64>() {
                    Ok(number) => CellValue::Number(number),
                    Err(_) => CellValue::Text(state.value.clone()),
                }
            } else if !state.formula.is_empty() {
                CellValue::Formula(state.formula.clone())
            } else {
                CellValue::Empty
            }
        }
    }
}

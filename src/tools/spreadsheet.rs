//! Spreadsheet tools over the XLSX adapter.

use serde_json::{Map, Value, json};

use crate::office::xlsx::{self, CellValue, Sheet};
use crate::registry::ToolDescriptor;
use crate::registry::args::ToolArgs;
use crate::registry::failure::Failure;
use crate::registry::schema::{PropertySpec, ToolSchema};

pub fn descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "xlsx_read",
            "Read cell values from a spreadsheet.",
            ToolSchema::new()
                .required("file_path", PropertySpec::string("Path to the .xlsx file"))
                .optional("sheet", PropertySpec::string("Sheet name; defaults to the first sheet"))
                .optional("range", PropertySpec::string("A1-style range, e.g. A1:C10")),
            read,
        ),
        ToolDescriptor::new(
            "xlsx_create",
            "Create a spreadsheet from sheets of rows.",
            ToolSchema::new()
                .required("output_path", PropertySpec::string("Path for the new .xlsx file"))
                .required("sheets", PropertySpec::array("Sheets: {name, rows: [[cell]]}")),
            create,
        ),
        ToolDescriptor::new(
            "xlsx_analyze",
            "Summary statistics for each numeric column.",
            ToolSchema::new()
                .required("file_path", PropertySpec::string("Path to the .xlsx file"))
                .optional("sheet", PropertySpec::string("Sheet name; defaults to the first sheet")),
            analyze,
        ),
        ToolDescriptor::new(
            "xlsx_apply_formulas",
            "Write formulas into cells of an existing spreadsheet.",
            ToolSchema::new()
                .required("file_path", PropertySpec::string("Path to the source .xlsx"))
                .required("output_path", PropertySpec::string("Path for the modified .xlsx"))
                .required("formulas", PropertySpec::array("Entries: {cell: \"B2\", formula: \"SUM(B1:B9)\"}"))
                .optional("sheet", PropertySpec::string("Sheet name; defaults to the first sheet")),
            apply_formulas,
        ),
        ToolDescriptor::new(
            "xlsx_to_json",
            "Convert a sheet to records keyed by its header row.",
            ToolSchema::new()
                .required("file_path", PropertySpec::string("Path to the .xlsx file"))
                .optional("sheet", PropertySpec::string("Sheet name; defaults to the first sheet")),
            to_json,
        ),
    ]
}

fn rows_to_json(rows: &[Vec<CellValue>]) -> Vec<Value> {
    rows.iter()
        .map(|row| {
            Value::Array(
                row.iter()
                    .map(|cell| match cell {
                        CellValue::Empty => Value::Null,
                        CellValue::Text(text) => json!(text),
                        CellValue::Number(value) => json!(value),
                        CellValue::Bool(value) => json!(value),
                        CellValue::Formula(formula) => json!(format!("={formula}")),
                    })
                    .collect(),
            )
        })
        .collect()
}

fn read(args: &ToolArgs) -> Result<Value, Failure> {
    let path = args.req_existing_path("file_path")?;
    let sheet = xlsx::read_sheet(&path, args.opt_str("sheet"))?;

    let rows = match args.opt_str("range") {
        None => sheet.rows,
        Some(range) => {
            let ((start_row, start_col), (end_row, end_col)) = xlsx::parse_range(range)
                .ok_or_else(|| {
                    Failure::invalid_arguments(format!("range must look like A1:C10, got {range}"))
                })?;
            sheet
                .rows
                .iter()
                .skip(start_row)
                .take(end_row.saturating_sub(start_row) + 1)
                .map(|row| {
                    row.iter()
                        .skip(start_col)
                        .take(end_col.saturating_sub(start_col) + 1)
                        .cloned()
                        .collect()
                })
                .collect()
        }
    };

    Ok(json!({
        "message": format!("read {} rows from sheet {}", rows.len(), sheet.name),
        "sheet": sheet.name,
        "rows": rows_to_json(&rows),
        "row_count": rows.len(),
    }))
}

fn create(args: &ToolArgs) -> Result<Value, Failure> {
    let output = args.req_path("output_path")?;
    let mut sheets = Vec::new();
    for (index, entry) in args.req_array("sheets")?.iter().enumerate() {
        let Some(object) = entry.as_object() else {
            return Err(Failure::invalid_arguments(
                "sheets entries must be objects with name and rows",
            ));
        };
        let name = object
            .get("name")
            .and_then(|value| value.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Sheet{}", index + 1));
        let rows_json = object
            .get("rows")
            .and_then(|value| value.as_array())
            .ok_or_else(|| Failure::invalid_arguments("each sheet requires a rows array"))?;
        let mut rows = Vec::new();
        for row in rows_json {
            let Some(cells) = row.as_array() else {
                return Err(Failure::invalid_arguments("rows must be arrays of cells"));
            };
            rows.push(cells.iter().map(json_to_cell).collect::<Vec<CellValue>>());
        }
        sheets.push(Sheet { name, rows });
    }

    xlsx::write(&output, &sheets)?;
    Ok(json!({
        "message": format!("created {} with {} sheets", output.display(), sheets.len()),
        "output_path": output.display().to_string(),
        "sheets": sheets.len(),
    }))
}

fn json_to_cell(value: &Value) -> CellValue {
    match value {
        Value::Null => CellValue::Empty,
        Value::Bool(flag) => CellValue::Bool(*flag),
        Value::Number(number) => CellValue::Number(number.as_f64().unwrap_or(0.0)),
        Value::String(text) => CellValue::Text(text.clone()),
        other => CellValue::Text(other.to_string()),
    }
}

fn analyze(args: &ToolArgs) -> Result<Value, Failure> {
    let path = args.req_existing_path("file_path")?;
    let sheet = xlsx::read_sheet(&path, args.opt_str("sheet"))?;

    let header: Vec<String> = sheet
        .rows
        .first()
        .map(|row| row.iter().map(CellValue::to_display).collect())
        .unwrap_or_default();
    let body: &[Vec<CellValue>] = sheet.rows.get(1..).unwrap_or(&[]);

    let column_count = sheet.rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut columns = Vec::new();
    for col in 0..column_count {
        let numbers: Vec<f64> = body
            .iter()
            .filter_map(|row| row.get(col))
            .filter_map(CellValue::as_number)
            .collect();
        if numbers.is_empty() {
            continue;
        }
        let sum: f64 = numbers.iter().sum();
        let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
        let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let name = header
            .get(col)
            .filter(|text| !text.is_empty())
            .cloned()
            .unwrap_or_else(|| xlsx::column_letters(col));
        columns.push(json!({
            "column": name,
            "count": numbers.len(),
            "min": min,
            "max": max,
            "sum": sum,
            "mean": sum / numbers.len() as f64,
        }));
    }

    Ok(json!({
        "message": format!(
            "sheet {}: {} data rows, {} numeric columns",
            sheet.name,
            body.len(),
            columns.len()
        ),
        "sheet": sheet.name,
        "row_count": body.len(),
        "numeric_columns": columns,
    }))
}

fn apply_formulas(args: &ToolArgs) -> Result<Value, Failure> {
    let path = args.req_existing_path("file_path")?;
    let output = args.req_path("output_path")?;

    let mut sheet = xlsx::read_sheet(&path, args.opt_str("sheet"))?;
    let mut applied = 0usize;
    for entry in args.req_array("formulas")? {
        let Some(object) = entry.as_object() else {
            return Err(Failure::invalid_arguments(
                "formulas entries must be objects with cell and formula",
            ));
        };
        let reference = object
            .get("cell")
            .and_then(|value| value.as_str())
            .ok_or_else(|| Failure::invalid_arguments("formula entry is missing cell"))?;
        let formula = object
            .get("formula")
            .and_then(|value| value.as_str())
            .ok_or_else(|| Failure::invalid_arguments("formula entry is missing formula"))?;
        let (row, col) = xlsx::parse_cell_ref(reference).ok_or_else(|| {
            Failure::invalid_arguments(format!("invalid cell reference: {reference}"))
        })?;

        if sheet.rows.len() <= row {
            sheet.rows.resize_with(row + 1, Vec::new);
        }
        let line = &mut sheet.rows[row];
        if line.len() <= col {
            line.resize(col + 1, CellValue::Empty);
        }
        line[col] = CellValue::Formula(formula.trim_start_matches('=').to_string());
        applied += 1;
    }

    xlsx::write(&output, &[sheet])?;
    Ok(json!({
        "message": format!("applied {applied} formulas into {}", output.display()),
        "output_path": output.display().to_string(),
        "formulas_applied": applied,
    }))
}

fn to_json(args: &ToolArgs) -> Result<Value, Failure> {
    let path = args.req_existing_path("file_path")?;
    let sheet = xlsx::read_sheet(&path, args.opt_str("sheet"))?;

    let Some(header_row) = sheet.rows.first() else {
        return Ok(json!({
            "message": format!("sheet {} is empty", sheet.name),
            "records": [],
        }));
    };
    let header: Vec<String> = header_row.iter().map(CellValue::to_display).collect();

    let mut records = Vec::new();
    for row in &sheet.rows[1..] {
        let mut record = Map::new();
        for (col, name) in header.iter().enumerate() {
            if name.is_empty() {
                continue;
            }
            let value = match row.get(col) {
                None | Some(CellValue::Empty) => Value::Null,
                Some(CellValue::Text(text)) => json!(text),
                Some(CellValue::Number(number)) => json!(number),
                Some(CellValue::Bool(flag)) => json!(flag),
                Some(CellValue::Formula(formula)) => json!(format!("={formula}")),
            };
            record.insert(name.clone(), value);
        }
        records.push(Value::Object(record));
    }

    let count = records.len();
    Ok(json!({
        "message": format!("converted sheet {} into {count} records", sheet.name),
        "sheet": sheet.name,
        "records": records,
        "record_count": count,
    }))
}

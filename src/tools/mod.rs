use serde_json::Value;

use crate::registry::Registry;
use crate::registry::failure::Failure;

pub mod convert;
pub mod document;
pub mod pdf;
pub mod presentation;
pub mod spreadsheet;

/// Builds the full tool catalog, one batch per adapter group. Runs once at
/// startup; a duplicate name anywhere is process-fatal.
pub fn build_registry() -> Registry {
    let mut registry = Registry::new();
    registry.register(document::descriptors());
    registry.register(spreadsheet::descriptors());
    registry.register(presentation::descriptors());
    registry.register(pdf::descriptors());
    registry.register(convert::descriptors());
    registry
}

/// Scalar JSON value rendered as cell text.
pub(crate) fn cell_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Converts a JSON array-of-arrays into a grid of cell strings.
pub(crate) fn rows_from_json(name: &str, values: &[Value]) -> Result<Vec<Vec<String>>, Failure> {
    let mut rows = Vec::new();
    for entry in values {
        let Some(cells) = entry.as_array() else {
            return Err(Failure::invalid_arguments(format!(
                "property {name} must be an array of arrays"
            )));
        };
        rows.push(cells.iter().map(cell_string).collect());
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn registry_builds_with_unique_names() {
        let registry = build_registry();
        assert!(registry.len() > 20);
        assert!(registry.lookup("xlsx_to_csv").is_some());
        assert!(registry.lookup("csv_to_xlsx").is_some());
        assert!(registry.lookup("batch_convert").is_some());
    }

    #[test]
    fn rows_from_json_renders_scalars() {
        let values = vec![json!(["a", 1, true, null])];
        let rows = rows_from_json("rows", &values).expect("grid");
        assert_eq!(rows[0], vec!["a", "1", "true", ""]);
    }

    #[test]
    fn rows_from_json_rejects_non_arrays() {
        let values = vec![json!("flat")];
        assert!(rows_from_json("rows", &values).is_err());
    }
}

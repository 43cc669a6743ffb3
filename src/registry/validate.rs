use serde_json::{Map, Value};

use crate::registry::failure::Failure;
use crate::registry::schema::ToolSchema;

/// Checks an incoming payload against a declared schema and returns the
/// payload the handler will actually see (declared defaults substituted).
///
/// Rules, in order: every required name must be present and non-null; every
/// present declared property must match its declared type; enum values must
/// be one of the enumerated literals. Unknown properties are tolerated so
/// callers can pass extra metadata. Values are never coerced; only true
/// absence triggers default substitution.
pub fn validate(schema: &ToolSchema, args: &Value) -> Result<Map<String, Value>, Failure> {
    let Some(args) = args.as_object() else {
        return Err(Failure::invalid_arguments("arguments must be an object"));
    };

    for name in schema.required_names() {
        match args.get(*name) {
            None => {
                return Err(Failure::invalid_arguments(format!(
                    "missing required property: {name}"
                )));
            }
            Some(Value::Null) => {
                return Err(Failure::invalid_arguments(format!(
                    "required property must not be null: {name}"
                )));
            }
            Some(_) => {}
        }
    }

    for (name, value) in args {
        let Some(spec) = schema.property(name) else {
            continue;
        };
        if value.is_null() {
            // Optional property explicitly set to null: treated as present,
            // so no default substitution, but no type check either.
            continue;
        }
        if !spec.kind.matches(value) {
            return Err(Failure::invalid_arguments(format!(
                "property {name} must be of type {}",
                spec.kind.as_str()
            )));
        }
        if let Some(allowed) = &spec.enum_values {
            let matched = value
                .as_str()
                .map(|text| allowed.contains(&text))
                .unwrap_or(false);
            if !matched {
                return Err(Failure::invalid_arguments(format!(
                    "property {name} must be one of: {}",
                    allowed.join(", ")
                )));
            }
        }
    }

    let mut validated = args.clone();
    for (name, spec) in schema.properties() {
        if let Some(default) = &spec.default
            && !validated.contains_key(name)
        {
            validated.insert(name.to_string(), default.clone());
        }
    }

    Ok(validated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::failure::FailureKind;
    use crate::registry::schema::PropertySpec;
    use serde_json::json;

    fn schema() -> ToolSchema {
        ToolSchema::new()
            .required("file_path", PropertySpec::string("input path"))
            .optional("sheet", PropertySpec::string("sheet name"))
            .optional(
                "delimiter",
                PropertySpec::string("field separator").default_value(json!(",")),
            )
            .optional("mode", PropertySpec::string("").one_of(&["pages", "range"]))
            .optional("rows", PropertySpec::array("table rows"))
    }

    #[test]
    fn accepts_well_formed_payload() {
        let args = json!({"file_path": "/tmp/in.xlsx", "sheet": "Data"});
        let validated = validate(&schema(), &args).expect("valid");
        assert_eq!(validated["file_path"], json!("/tmp/in.xlsx"));
    }

    #[test]
    fn missing_required_names_the_property() {
        let err = validate(&schema(), &json!({"sheet": "Data"})).expect_err("invalid");
        assert_eq!(err.kind, FailureKind::InvalidArguments);
        assert!(err.message.contains("file_path"));
    }

    #[test]
    fn null_required_is_rejected() {
        let err = validate(&schema(), &json!({"file_path": null})).expect_err("invalid");
        assert_eq!(err.kind, FailureKind::InvalidArguments);
        assert!(err.message.contains("file_path"));
    }

    #[test]
    fn wrong_type_is_reported_not_coerced() {
        let err = validate(&schema(), &json!({"file_path": 7})).expect_err("invalid");
        assert_eq!(err.kind, FailureKind::InvalidArguments);
        assert!(err.message.contains("string"));
    }

    #[test]
    fn enum_violation_is_rejected() {
        let args = json!({"file_path": "/tmp/in.pdf", "mode": "shred"});
        let err = validate(&schema(), &args).expect_err("invalid");
        assert_eq!(err.kind, FailureKind::InvalidArguments);
        assert!(err.message.contains("mode"));
    }

    #[test]
    fn unknown_properties_are_tolerated() {
        let args = json!({"file_path": "/tmp/in.xlsx", "trace_id": "abc"});
        let validated = validate(&schema(), &args).expect("valid");
        assert_eq!(validated["trace_id"], json!("abc"));
    }

    #[test]
    fn default_substituted_only_on_absence() {
        let validated = validate(&schema(), &json!({"file_path": "a"})).expect("valid");
        assert_eq!(validated["delimiter"], json!(","));

        let explicit_empty = json!({"file_path": "a", "delimiter": ""});
        let validated = validate(&schema(), &explicit_empty).expect("valid");
        assert_eq!(validated["delimiter"], json!(""));
    }
}

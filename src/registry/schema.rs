use serde_json::{Map, Value, json};

/// Declared type of one schema property. Mirrors the JSON Schema scalar and
/// container types the tool contracts use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
}

impl PropertyType {
    pub fn as_str(self) -> &'static str {
        match self {
            PropertyType::String => "string",
            PropertyType::Number => "number",
            PropertyType::Integer => "integer",
            PropertyType::Boolean => "boolean",
            PropertyType::Object => "object",
            PropertyType::Array => "array",
        }
    }

    pub fn matches(self, value: &Value) -> bool {
        match self {
            PropertyType::String => value.is_string(),
            PropertyType::Number => value.is_number(),
            PropertyType::Integer => value.is_i64() || value.is_u64(),
            PropertyType::Boolean => value.is_boolean(),
            PropertyType::Object => value.is_object(),
            PropertyType::Array => value.is_array(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PropertySpec {
    pub kind: PropertyType,
    pub description: &'static str,
    pub enum_values: Option<Vec<&'static str>>,
    pub default: Option<Value>,
}

impl PropertySpec {
    fn new(kind: PropertyType, description: &'static str) -> Self {
        Self {
            kind,
            description,
            enum_values: None,
            default: None,
        }
    }

    pub fn string(description: &'static str) -> Self {
        Self::new(PropertyType::String, description)
    }

    pub fn integer(description: &'static str) -> Self {
        Self::new(PropertyType::Integer, description)
    }

    pub fn number(description: &'static str) -> Self {
        Self::new(PropertyType::Number, description)
    }

    pub fn boolean(description: &'static str) -> Self {
        Self::new(PropertyType::Boolean, description)
    }

    pub fn object(description: &'static str) -> Self {
        Self::new(PropertyType::Object, description)
    }

    pub fn array(description: &'static str) -> Self {
        Self::new(PropertyType::Array, description)
    }

    pub fn one_of(mut self, values: &[&'static str]) -> Self {
        self.enum_values = Some(values.to_vec());
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }
}

/// Declared argument shape for one tool: named properties plus the set of
/// required names. Insertion order is preserved for stable listings.
#[derive(Debug, Clone, Default)]
pub struct ToolSchema {
    properties: Vec<(&'static str, PropertySpec)>,
    required: Vec<&'static str>,
}

impl ToolSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, name: &'static str, spec: PropertySpec) -> Self {
        self.properties.push((name, spec));
        self.required.push(name);
        self
    }

    pub fn optional(mut self, name: &'static str, spec: PropertySpec) -> Self {
        self.properties.push((name, spec));
        self
    }

    pub fn property(&self, name: &str) -> Option<&PropertySpec> {
        self.properties
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, spec)| spec)
    }

    pub fn properties(&self) -> impl Iterator<Item = (&'static str, &PropertySpec)> {
        self.properties.iter().map(|(name, spec)| (*name, spec))
    }

    pub fn required_names(&self) -> &[&'static str] {
        &self.required
    }

    /// JSON Schema rendering for tools/list.
    pub fn to_json(&self) -> Value {
        let mut properties = Map::new();
        for (name, spec) in &self.properties {
            let mut entry = Map::new();
            entry.insert("type".to_string(), json!(spec.kind.as_str()));
            if !spec.description.is_empty() {
                entry.insert("description".to_string(), json!(spec.description));
            }
            if let Some(values) = &spec.enum_values {
                entry.insert("enum".to_string(), json!(values));
            }
            if let Some(default) = &spec.default {
                entry.insert("default".to_string(), default.clone());
            }
            properties.insert((*name).to_string(), Value::Object(entry));
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": self.required,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_matching() {
        assert!(PropertyType::String.matches(&json!("x")));
        assert!(!PropertyType::String.matches(&json!(1)));
        assert!(PropertyType::Integer.matches(&json!(3)));
        assert!(!PropertyType::Integer.matches(&json!(3.5)));
        assert!(PropertyType::Number.matches(&json!(3.5)));
        assert!(PropertyType::Array.matches(&json!([1, 2])));
        assert!(PropertyType::Object.matches(&json!({})));
    }

    #[test]
    fn schema_json_shape() {
        let schema = ToolSchema::new()
            .required("file_path", PropertySpec::string("input path"))
            .optional(
                "delimiter",
                PropertySpec::string("field separator").default_value(json!(",")),
            )
            .optional("mode", PropertySpec::string("").one_of(&["pages", "range"]));

        let rendered = schema.to_json();
        assert_eq!(rendered["type"], "object");
        assert_eq!(rendered["required"], json!(["file_path"]));
        assert_eq!(rendered["properties"]["delimiter"]["default"], json!(","));
        assert_eq!(
            rendered["properties"]["mode"]["enum"],
            json!(["pages", "range"])
        );
    }
}

//! Output-shape declarations for schema-constrained generation.
//!
//! A [`ResponseSchema`] is sent to the generative service so it constrains its
//! JSON reply, and is walked again on receipt to validate what came back.

use serde_json::{json, Map, Number, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseSchema {
    String,
    Integer,
    Enum(Vec<String>),
    Array {
        items: Box<ResponseSchema>,
        min_items: Option<usize>,
        max_items: Option<usize>,
    },
    Object {
        properties: Vec<(String, ResponseSchema)>,
        required: Vec<String>,
    },
}

impl ResponseSchema {
    pub fn array(items: ResponseSchema) -> Self {
        Self::Array {
            items: Box::new(items),
            min_items: None,
            max_items: None,
        }
    }

    pub fn array_of_exactly(items: ResponseSchema, count: usize) -> Self {
        Self::Array {
            items: Box::new(items),
            min_items: Some(count),
            max_items: Some(count),
        }
    }

    /// Object whose listed properties are all required.
    pub fn object(properties: Vec<(&str, ResponseSchema)>) -> Self {
        let required = properties
            .iter()
            .map(|(name, _)| (*name).to_string())
            .collect();
        Self::Object {
            properties: properties
                .into_iter()
                .map(|(name, schema)| (name.to_string(), schema))
                .collect(),
            required,
        }
    }

    /// Serializes into the service's OpenAPI-subset schema payload.
    pub fn to_wire(&self) -> Value {
        match self {
            Self::String => json!({ "type": "STRING" }),
            Self::Integer => json!({ "type": "INTEGER" }),
            Self::Enum(values) => json!({
                "type": "STRING",
                "format": "enum",
                "enum": values,
            }),
            Self::Array {
                items,
                min_items,
                max_items,
            } => {
                let mut out = Map::new();
                out.insert("type".to_string(), json!("ARRAY"));
                out.insert("items".to_string(), items.to_wire());
                if let Some(min) = min_items {
                    out.insert("minItems".to_string(), json!(min.to_string()));
                }
                if let Some(max) = max_items {
                    out.insert("maxItems".to_string(), json!(max.to_string()));
                }
                Value::Object(out)
            }
            Self::Object {
                properties,
                required,
            } => {
                let mut props = Map::new();
                for (name, schema) in properties {
                    props.insert(name.clone(), schema.to_wire());
                }
                json!({
                    "type": "OBJECT",
                    "properties": props,
                    "required": required,
                    "propertyOrdering": properties.iter().map(|(name, _)| name.clone()).collect::<Vec<String>>(),
                })
            }
        }
    }

    /// Checks `value` against the schema and reports the first violation.
    pub fn validate(&self, value: &Value) -> Result<(), SchemaViolation> {
        self.validate_at(value, "$")
    }

    fn validate_at(&self, value: &Value, path: &str) -> Result<(), SchemaViolation> {
        match self {
            Self::String => {
                if !value.is_string() {
                    return Err(SchemaViolation::new(path, "expected string", value));
                }
            }
            Self::Integer => {
                // Segment and variation numbers are read back as u32.
                let counter = value
                    .as_u64()
                    .map(|number| u32::try_from(number).is_ok())
                    .unwrap_or(false);
                if !counter {
                    return Err(SchemaViolation::new(
                        path,
                        "expected a non-negative integer",
                        value,
                    ));
                }
            }
            Self::Enum(values) => {
                let Some(text) = value.as_str() else {
                    return Err(SchemaViolation::new(path, "expected enum string", value));
                };
                if !values.iter().any(|allowed| allowed == text) {
                    return Err(SchemaViolation::new(
                        path,
                        &format!("expected one of [{}]", values.join(", ")),
                        value,
                    ));
                }
            }
            Self::Array {
                items,
                min_items,
                max_items,
            } => {
                let Some(rows) = value.as_array() else {
                    return Err(SchemaViolation::new(path, "expected array", value));
                };
                if let Some(min) = min_items {
                    if rows.len() < *min {
                        return Err(SchemaViolation::new(
                            path,
                            &format!("expected at least {min} items, got {}", rows.len()),
                            value,
                        ));
                    }
                }
                if let Some(max) = max_items {
                    if rows.len() > *max {
                        return Err(SchemaViolation::new(
                            path,
                            &format!("expected at most {max} items, got {}", rows.len()),
                            value,
                        ));
                    }
                }
                for (idx, row) in rows.iter().enumerate() {
                    items.validate_at(row, &format!("{path}[{idx}]"))?;
                }
            }
            Self::Object {
                properties,
                required,
            } => {
                let Some(object) = value.as_object() else {
                    return Err(SchemaViolation::new(path, "expected object", value));
                };
                for name in required {
                    if !object.contains_key(name) {
                        return Err(SchemaViolation::new(
                            path,
                            &format!("missing required field '{name}'"),
                            value,
                        ));
                    }
                }
                for (name, schema) in properties {
                    match object.get(name) {
                        Some(Value::Null) | None if !required.contains(name) => {}
                        Some(field) => schema.validate_at(field, &format!("{path}.{name}"))?,
                        None => {}
                    }
                }
            }
        }
        Ok(())
    }

    /// Smallest value that satisfies the schema. Used by the dryrun service.
    pub fn placeholder(&self) -> Value {
        match self {
            Self::String => Value::String("placeholder".to_string()),
            Self::Integer => Value::Number(Number::from(1)),
            Self::Enum(values) => values
                .first()
                .cloned()
                .map(Value::String)
                .unwrap_or(Value::Null),
            Self::Array {
                items, min_items, ..
            } => {
                let count = min_items.unwrap_or(1).max(1);
                Value::Array((0..count).map(|_| items.placeholder()).collect())
            }
            Self::Object { properties, .. } => {
                let mut out = Map::new();
                for (name, schema) in properties {
                    out.insert(name.clone(), schema.placeholder());
                }
                Value::Object(out)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    pub path: String,
    pub message: String,
}

impl SchemaViolation {
    fn new(path: &str, message: &str, value: &Value) -> Self {
        let kind = match value {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        };
        Self {
            path: path.to_string(),
            message: format!("{message} (found {kind})"),
        }
    }
}

impl std::fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

impl std::error::Error for SchemaViolation {}

pub fn video_segments_schema() -> ResponseSchema {
    ResponseSchema::array(ResponseSchema::object(vec![
        ("segment", ResponseSchema::Integer),
        ("prompt", ResponseSchema::String),
    ]))
}

pub fn captions_schema() -> ResponseSchema {
    ResponseSchema::array_of_exactly(
        ResponseSchema::object(vec![
            ("variation", ResponseSchema::Integer),
            ("hook", ResponseSchema::String),
            ("body", ResponseSchema::String),
            ("cta", ResponseSchema::String),
            ("hashtags", ResponseSchema::String),
        ]),
        3,
    )
}

pub fn remix_script_schema() -> ResponseSchema {
    ResponseSchema::object(vec![
        ("narration_script", ResponseSchema::String),
        ("remix_instructions", ResponseSchema::String),
    ])
}

pub fn profile_analysis_schema() -> ResponseSchema {
    ResponseSchema::object(vec![
        ("evidence_quote", ResponseSchema::String),
        ("strengths", ResponseSchema::array(ResponseSchema::String)),
        ("weaknesses", ResponseSchema::array(ResponseSchema::String)),
    ])
}

pub fn action_plan_schema() -> ResponseSchema {
    ResponseSchema::object(vec![
        (
            "action_plan",
            ResponseSchema::array(ResponseSchema::object(vec![
                ("step", ResponseSchema::Integer),
                ("action", ResponseSchema::String),
            ])),
        ),
        (
            "viral_content_suggestion",
            ResponseSchema::object(vec![
                ("idea", ResponseSchema::String),
                ("format", ResponseSchema::String),
                ("suggested_script", ResponseSchema::String),
            ]),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{
        action_plan_schema, captions_schema, profile_analysis_schema, remix_script_schema,
        video_segments_schema, ResponseSchema,
    };

    #[test]
    fn wire_format_uses_upper_case_types_and_required() {
        let wire = video_segments_schema().to_wire();
        assert_eq!(wire["type"], json!("ARRAY"));
        assert_eq!(wire["items"]["type"], json!("OBJECT"));
        assert_eq!(wire["items"]["properties"]["segment"]["type"], json!("INTEGER"));
        assert_eq!(wire["items"]["properties"]["prompt"]["type"], json!("STRING"));
        assert_eq!(wire["items"]["required"], json!(["segment", "prompt"]));
        assert!(wire.get("minItems").is_none());
    }

    #[test]
    fn wire_format_carries_item_bounds_and_enums() {
        let wire = captions_schema().to_wire();
        assert_eq!(wire["minItems"], json!("3"));
        assert_eq!(wire["maxItems"], json!("3"));

        let goal = ResponseSchema::Enum(vec!["views".to_string(), "followers".to_string()]);
        let wire = goal.to_wire();
        assert_eq!(wire["format"], json!("enum"));
        assert_eq!(wire["enum"], json!(["views", "followers"]));
    }

    #[test]
    fn validate_reports_missing_field_with_path() {
        let err = video_segments_schema()
            .validate(&json!([{"segment": 1, "prompt": "a"}, {"segment": 2}]))
            .unwrap_err();
        assert_eq!(err.path, "$[1]");
        assert!(err.message.contains("missing required field 'prompt'"));
    }

    #[test]
    fn validate_rejects_wrong_scalar_types() {
        let err = remix_script_schema()
            .validate(&json!({"narration_script": 4, "remix_instructions": "x"}))
            .unwrap_err();
        assert_eq!(err.path, "$.narration_script");

        assert!(ResponseSchema::Integer.validate(&json!(2)).is_ok());
        assert!(ResponseSchema::Integer.validate(&json!(2.5)).is_err());
        assert!(ResponseSchema::Integer.validate(&json!("2")).is_err());
    }

    #[test]
    fn integers_must_fit_a_segment_number() {
        for rejected in [json!(1.0), json!(-1), json!(u64::from(u32::MAX) + 1)] {
            let err = ResponseSchema::Integer.validate(&rejected).unwrap_err();
            assert!(err.message.contains("non-negative integer"), "{rejected}");
        }
        let err = video_segments_schema()
            .validate(&json!([{"segment": -3, "prompt": "wide"}]))
            .unwrap_err();
        assert_eq!(err.path, "$[0].segment");
        assert!(ResponseSchema::Integer
            .validate(&json!(u32::MAX))
            .is_ok());
    }

    #[test]
    fn validate_enforces_item_count() {
        let row = json!({"variation": 1, "hook": "h", "body": "b", "cta": "c", "hashtags": "#a"});
        assert!(captions_schema()
            .validate(&json!([row.clone(), row.clone()]))
            .is_err());
        assert!(captions_schema()
            .validate(&json!([row.clone(), row.clone(), row]))
            .is_ok());
    }

    #[test]
    fn validate_enum_membership() {
        let schema = ResponseSchema::Enum(vec!["a".to_string(), "b".to_string()]);
        assert!(schema.validate(&json!("a")).is_ok());
        assert!(schema.validate(&json!("c")).is_err());
    }

    #[test]
    fn placeholders_satisfy_their_own_schema() {
        for schema in [
            video_segments_schema(),
            captions_schema(),
            remix_script_schema(),
            profile_analysis_schema(),
            action_plan_schema(),
        ] {
            assert!(schema.validate(&schema.placeholder()).is_ok());
        }
        assert_eq!(
            captions_schema().placeholder().as_array().map(Vec::len),
            Some(3)
        );
    }
}

//! Required-output schemas for structured generation, mirroring the
//! backend's `responseSchema` wire format.

use std::collections::BTreeMap;

use serde::Serialize;

/// Value type of a schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SchemaType {
    Object,
    Array,
    String,
}

/// A required-output schema sent alongside a structured-generation prompt.
/// The backend constrains its response to JSON conforming to this shape.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseSchema {
    #[serde(rename = "type")]
    pub schema_type: SchemaType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, ResponseSchema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<ResponseSchema>>,
}

impl ResponseSchema {
    pub fn string() -> Self {
        Self {
            schema_type: SchemaType::String,
            properties: None,
            required: None,
            items: None,
        }
    }

    pub fn array(items: ResponseSchema) -> Self {
        Self {
            schema_type: SchemaType::Array,
            properties: None,
            required: None,
            items: Some(Box::new(items)),
        }
    }

    /// An object schema with the given named properties, all required.
    pub fn object(properties: Vec<(&str, ResponseSchema)>) -> Self {
        let required = properties.iter().map(|(name, _)| name.to_string()).collect();
        let properties = properties
            .into_iter()
            .map(|(name, schema)| (name.to_string(), schema))
            .collect();
        Self {
            schema_type: SchemaType::Object,
            properties: Some(properties),
            required: Some(required),
            items: None,
        }
    }
}

//! Function declarations and the JSON-Schema subset passed to adapters.
//!
//! ```rust
//! use pprovider::{FunctionCallingMode, FunctionDeclaration, Schema};
//!
//! let lookup = FunctionDeclaration::new(
//!     "lookup",
//!     "Find a record by key",
//!     Schema::object()
//!         .property("key", Schema::string())
//!         .required(["key"]),
//! );
//!
//! assert_eq!(lookup.parameters.required, vec!["key".to_string()]);
//! assert_eq!("ANY".parse::<FunctionCallingMode>(), Ok(FunctionCallingMode::Any));
//! ```

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Schema {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Schema>,
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

impl Schema {
    pub fn of_type(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    pub fn object() -> Self {
        Self::of_type("object")
    }

    pub fn string() -> Self {
        Self::of_type("string")
    }

    pub fn number() -> Self {
        Self::of_type("number")
    }

    pub fn integer() -> Self {
        Self::of_type("integer")
    }

    pub fn boolean() -> Self {
        Self::of_type("boolean")
    }

    pub fn array(items: Schema) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::of_type("array")
        }
    }

    pub fn property(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.properties.insert(name.into(), schema);
        self
    }

    pub fn required<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_enum<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Schema,
}

impl FunctionDeclaration {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Schema) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FunctionCallingMode {
    /// Leave the choice to the vendor default.
    #[default]
    Unspecified,
    Auto,
    Any,
    None,
}

impl FunctionCallingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unspecified => "",
            Self::Auto => "auto",
            Self::Any => "any",
            Self::None => "none",
        }
    }
}

impl Display for FunctionCallingMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lenient: unrecognized text parses as `Unspecified`.
impl FromStr for FunctionCallingMode {
    type Err = Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mode = match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Self::Auto,
            "any" => Self::Any,
            "none" => Self::None,
            _ => Self::Unspecified,
        };

        Ok(mode)
    }
}

impl Serialize for FunctionCallingMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FunctionCallingMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let Ok(mode) = raw.parse::<FunctionCallingMode>();
        Ok(mode)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonSchema {
    pub name: String,
    pub description: String,
    pub schema: Schema,
}

impl JsonSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema,
        }
    }
}

/// JSON output mode. Without a schema the vendor is only asked for valid JSON.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JsonResponse {
    pub schema: Option<JsonSchema>,
}

impl JsonResponse {
    pub fn plain() -> Self {
        Self { schema: None }
    }

    pub fn with_schema(schema: JsonSchema) -> Self {
        Self {
            schema: Some(schema),
        }
    }
}

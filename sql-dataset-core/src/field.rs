use crate::SchemaError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    fmt::{self, Display},
    str::FromStr,
    sync::LazyLock,
};

static FIELD_KEY_STRIP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9_ ]+").expect("The field key pattern is a valid regex"));

/// Derives the wire key of a display name.
///
/// The name is lowercased, every character outside `[a-z0-9_ ]` is removed, anything that is not
/// a letter or a digit is trimmed from both ends and the remaining spaces become underscores.
/// Internal runs are kept, so `"  extra  whitespace  "` becomes `"extra__whitespace"` and
/// `"_id_"` becomes `"id"`.
pub fn field_key(name: &str) -> String {
    FIELD_KEY_STRIP
        .replace_all(&name.to_lowercase(), "")
        .trim_matches(|c: char| !c.is_ascii_alphanumeric())
        .replace(' ', "_")
}

/// Semantic type of a field, as understood by the remote dataset API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum FieldType {
    Number,
    Date,
    Datetime,
    Money,
    Percentage,
    String,
}

impl FieldType {
    pub const ALL: [FieldType; 6] = [
        FieldType::Number,
        FieldType::Date,
        FieldType::Datetime,
        FieldType::Money,
        FieldType::Percentage,
        FieldType::String,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Datetime => "datetime",
            FieldType::Money => "money",
            FieldType::Percentage => "percentage",
            FieldType::String => "string",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            FieldType::Number | FieldType::Money | FieldType::Percentage
        )
    }

    pub(crate) fn supported() -> String {
        format!(
            "[{}]",
            Self::ALL.map(|v| v.as_str()).join(" ")
        )
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = SchemaError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == value)
            .ok_or_else(|| SchemaError::UnsupportedFieldType(value.to_string()))
    }
}

impl TryFrom<String> for FieldType {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Floating point width used when emitting fractional numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    Float32,
    Float64,
}

/// Declared metadata for one output column.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Field {
    /// Display name, also the source of the derived key.
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Explicit key, used verbatim instead of the derived one.
    #[serde(default)]
    pub key: Option<String>,
    /// ISO 4217 code, required by money fields.
    #[serde(default)]
    pub currency_code: Option<String>,
    /// Whether the remote side accepts nulls for this field.
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub precision: Option<Precision>,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            key: None,
            currency_code: None,
            optional: false,
            precision: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_currency(mut self, currency_code: impl Into<String>) -> Self {
        self.currency_code = Some(currency_code.into());
        self
    }

    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = Some(precision);
        self
    }

    /// The explicit key when present, otherwise the key derived from the name.
    pub fn key_value(&self) -> String {
        match self.key.as_deref() {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => field_key(&self.name),
        }
    }

    pub fn currency_code(&self) -> Option<&str> {
        self.currency_code.as_deref().filter(|v| !v.is_empty())
    }

    pub fn validate(&self) -> Vec<SchemaError> {
        let mut errors = Vec::new();
        if self.name.is_empty() {
            errors.push(SchemaError::MissingFieldName);
        }
        if self.field_type == FieldType::Money && self.currency_code().is_none() {
            errors.push(SchemaError::MissingCurrency(self.name.clone()));
        }
        errors
    }
}

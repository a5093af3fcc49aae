use crate::{Field, SchemaError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    fmt::{self, Display},
    str::FromStr,
    sync::LazyLock,
};

static DATASET_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-z][0-9a-z._\-]+[0-9a-z]$").expect("The dataset name pattern is a valid regex")
});

/// How the rows of a run are applied to the remote dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum UpdateType {
    /// Rows are added to the existing data, in chunks.
    Append,
    /// The whole remote data is overwritten by a single request.
    Replace,
}

impl UpdateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateType::Append => "append",
            UpdateType::Replace => "replace",
        }
    }
}

impl Display for UpdateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpdateType {
    type Err = SchemaError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "append" => Ok(UpdateType::Append),
            "replace" => Ok(UpdateType::Replace),
            _ => Err(SchemaError::InvalidUpdateType(value.to_string())),
        }
    }
}

impl TryFrom<String> for UpdateType {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A named, query backed collection of fields.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Dataset {
    /// Remote dataset identifier.
    #[serde(default)]
    pub name: String,
    pub update_type: UpdateType,
    #[serde(default)]
    pub unique_by: Vec<String>,
    #[serde(default)]
    pub sql: String,
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl Dataset {
    pub fn new(
        name: impl Into<String>,
        update_type: UpdateType,
        sql: impl Into<String>,
        fields: Vec<Field>,
    ) -> Self {
        Self {
            name: name.into(),
            update_type,
            unique_by: Vec::new(),
            sql: sql.into(),
            fields,
        }
    }

    pub fn with_unique_by<I, S>(mut self, unique_by: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unique_by = unique_by.into_iter().map(Into::into).collect();
        self
    }

    /// Every problem found in the dataset declaration, in a stable order.
    pub fn validate(&self) -> Vec<SchemaError> {
        let mut errors = Vec::new();
        if self.name.is_empty() {
            errors.push(SchemaError::MissingDatasetName);
        } else if !DATASET_NAME.is_match(&self.name) {
            errors.push(SchemaError::InvalidDatasetName(self.name.clone()));
        }
        if self.sql.trim().is_empty() {
            errors.push(SchemaError::MissingSql);
        }
        if self.fields.is_empty() {
            errors.push(SchemaError::MissingFields);
        }
        errors.extend(self.fields.iter().flat_map(Field::validate));
        let duplicates = self.duplicate_key_names();
        if !duplicates.is_empty() {
            errors.push(SchemaError::DuplicateKeys(duplicates));
        }
        errors
    }

    /// Display names of all the fields sharing their key with another field, in declaration order.
    pub fn duplicate_key_names(&self) -> Vec<String> {
        let keys: Vec<String> = self.fields.iter().map(Field::key_value).collect();
        self.fields
            .iter()
            .zip(&keys)
            .filter(|(_, key)| keys.iter().filter(|k| k == key).count() > 1)
            .map(|(field, _)| field.name.clone())
            .collect()
    }
}

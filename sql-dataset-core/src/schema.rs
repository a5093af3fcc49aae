use crate::{Dataset, Field, FieldType, RowNames, field_key};
use serde::{
    Serialize, Serializer,
    ser::{SerializeMap, SerializeStruct},
};
use thiserror::Error;

/// Declaration problems, terminal for the dataset they belong to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("No dataset name provided")]
    MissingDatasetName,
    #[error(
        "Invalid dataset name \"{0}\". Dataset names must be at least 3 characters long, start and end with a letter or a number, and use only lowercase letters, numbers, dots, hyphens and underscores"
    )]
    InvalidDatasetName(String),
    #[error("\"{0}\" is not a valid update type. Supported update types are [append replace]")]
    InvalidUpdateType(String),
    #[error("No SQL query provided")]
    MissingSql,
    #[error("No fields provided")]
    MissingFields,
    #[error("A field is missing its name")]
    MissingFieldName,
    #[error("\"{0}\" is not a valid field type. Supported field types are {types}", types = FieldType::supported())]
    UnsupportedFieldType(String),
    #[error("The money field \"{0}\" requires a currency_code, an ISO 4217 code like USD")]
    MissingCurrency(String),
    #[error(
        "The field names \"{}\" will create duplicate keys. Please revise using a unique combination of letters and numbers",
        .0.join("\", \"")
    )]
    DuplicateKeys(Vec<String>),
    #[error("Following unique by '{unique_by}' for dataset '{dataset}' has no matching field")]
    UnmatchedUniqueBy { unique_by: String, dataset: String },
    #[error("{}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "))]
    Invalid(Vec<SchemaError>),
}

/// A field together with its resolved key.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaField {
    pub key: String,
    pub field: Field,
}

/// Immutable wire schema of a dataset.
///
/// Fields keep their declaration order, which is also the positional order of the query columns
/// and the order in which they are rendered in every payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    id: String,
    fields: Vec<SchemaField>,
    keys: RowNames,
    unique_by: Vec<String>,
}

impl Schema {
    /// Validates the dataset, derives the field keys and resolves the unique by references.
    pub fn build(dataset: &Dataset) -> Result<Self, SchemaError> {
        let mut errors = dataset.validate();
        if let Some(error) = errors.pop() {
            return Err(if errors.is_empty() {
                error
            } else {
                errors.push(error);
                SchemaError::Invalid(errors)
            });
        }
        let fields: Vec<_> = dataset
            .fields
            .iter()
            .map(|field| SchemaField {
                key: field.key_value(),
                field: field.clone(),
            })
            .collect();
        let keys: RowNames = fields.iter().map(|f| f.key.clone()).collect();
        let unique_by = dataset
            .unique_by
            .iter()
            .map(|unique_by| {
                if keys.iter().any(|k| k == unique_by) {
                    return Ok(unique_by.clone());
                }
                let key = field_key(unique_by);
                if keys.contains(&key) {
                    Ok(key)
                } else {
                    Err(SchemaError::UnmatchedUniqueBy {
                        unique_by: unique_by.clone(),
                        dataset: dataset.name.clone(),
                    })
                }
            })
            .collect::<Result<_, _>>()?;
        Ok(Self {
            id: dataset.name.clone(),
            fields,
            keys,
            unique_by,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    /// Keys in declaration order, shared with every row built from this schema.
    pub fn keys(&self) -> &RowNames {
        &self.keys
    }

    pub fn unique_by(&self) -> &[String] {
        &self.unique_by
    }

    pub fn get(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.key == key).map(|f| &f.field)
    }
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.unique_by.is_empty() { 2 } else { 3 };
        let mut state = serializer.serialize_struct("Schema", len)?;
        state.serialize_field("id", &self.id)?;
        if self.unique_by.is_empty() {
            state.skip_field("unique_by")?;
        } else {
            state.serialize_field("unique_by", &self.unique_by)?;
        }
        state.serialize_field("fields", &FieldsPayload(&self.fields))?;
        state.end()
    }
}

struct FieldsPayload<'a>(&'a [SchemaField]);

impl Serialize for FieldsPayload<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for SchemaField { key, field } in self.0 {
            map.serialize_entry(
                key,
                &FieldPayload {
                    field_type: field.field_type,
                    name: &field.name,
                    currency_code: field.currency_code(),
                    optional: field.optional,
                },
            )?;
        }
        map.end()
    }
}

#[derive(Serialize)]
struct FieldPayload<'a> {
    #[serde(rename = "type")]
    field_type: FieldType,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    currency_code: Option<&'a str>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    optional: bool,
}

use crate::Value;
use std::sync::Arc;

/// Column labels of a result set, shared by all of its rows.
pub type RowNames = Arc<[String]>;
pub type Row = Box<[Value]>;

/// One row returned by a query, values in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct RowLabeled {
    pub labels: RowNames,
    pub values: Row,
}

impl RowLabeled {
    pub fn new(labels: RowNames, values: Row) -> Self {
        Self { labels, values }
    }

    pub fn names(&self) -> &[String] {
        &self.labels
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Value of the first column labeled `name`.
    pub fn get_column(&self, name: &str) -> Option<&Value> {
        let index = self.labels.iter().position(|v| v == name)?;
        self.values.get(index)
    }
}

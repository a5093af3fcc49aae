use serde_json::{Value as JsonValue, json};
use sql_dataset_core::{DatasetClient, DatasetRow, Result, Schema};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub path: String,
    pub body: JsonValue,
}

/// Dataset client that keeps every request in memory instead of sending it.
#[derive(Debug, Default)]
pub struct RecordingClient {
    requests: Mutex<Vec<RecordedRequest>>,
}

impl RecordingClient {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|v| v.clone())
            .unwrap_or_default()
    }

    fn record(&self, method: &'static str, path: String, body: JsonValue) -> Result<()> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(RecordedRequest { method, path, body });
        }
        Ok(())
    }
}

impl DatasetClient for RecordingClient {
    async fn upsert_schema(&self, schema: &Schema) -> Result<()> {
        self.record(
            "PUT",
            format!("/datasets/{}", schema.id()),
            serde_json::to_value(schema)?,
        )
    }

    async fn replace_data(&self, dataset: &str, rows: &[DatasetRow]) -> Result<()> {
        self.record(
            "PUT",
            format!("/datasets/{dataset}/data"),
            json!({ "data": rows }),
        )
    }

    async fn append_data(&self, dataset: &str, rows: &[DatasetRow]) -> Result<()> {
        self.record(
            "POST",
            format!("/datasets/{dataset}/data"),
            json!({ "data": rows }),
        )
    }

    async fn delete_dataset(&self, dataset: &str) -> Result<()> {
        self.record("DELETE", format!("/datasets/{dataset}"), JsonValue::Null)
    }
}

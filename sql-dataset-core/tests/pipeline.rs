#[cfg(test)]
mod tests {
    use sql_dataset_core::{
        Connection, Dataset, DatasetClient, DatasetRow, Driver, Error, Executor, Field, FieldType,
        Result, RowLabeled, RowNames, Schema, SchemaError, UpdateType, Value, fetch_dataset_rows,
        stream::{self, Stream},
        sync_all, sync_dataset,
    };
    use std::{borrow::Cow, collections::HashMap, num::NonZeroUsize, sync::Mutex};

    #[derive(Default)]
    struct FakeDriver;

    impl Driver for FakeDriver {
        type Connection = FakeConnection;
        const NAME: &'static str = "fake";
    }

    /// Serves canned rows by query text, `None` entries yield an error at that position.
    #[derive(Default)]
    struct FakeConnection {
        driver: FakeDriver,
        tables: HashMap<String, Vec<Option<Vec<Value>>>>,
        queries: Vec<String>,
    }

    impl FakeConnection {
        fn with(mut self, sql: &str, rows: Vec<Option<Vec<Value>>>) -> Self {
            self.tables.insert(sql.into(), rows);
            self
        }
    }

    impl Executor for FakeConnection {
        type Driver = FakeDriver;

        fn driver(&self) -> &Self::Driver {
            &self.driver
        }

        fn fetch<'s>(
            &'s mut self,
            sql: String,
        ) -> impl Stream<Item = Result<RowLabeled>> + Send + 's {
            self.queries.push(sql.clone());
            let rows: Vec<Result<RowLabeled>> = match self.tables.get(&sql) {
                Some(rows) => rows
                    .iter()
                    .map(|row| match row {
                        Some(values) => {
                            let labels: RowNames =
                                (0..values.len()).map(|i| format!("c{i}")).collect();
                            Ok(RowLabeled::new(labels, values.clone().into()))
                        }
                        None => Err(Error::msg("connection reset")),
                    })
                    .collect(),
                None => vec![Err(Error::msg(format!("relation does not exist: {sql}")))],
            };
            stream::iter(rows)
        }
    }

    impl Connection for FakeConnection {
        async fn connect(_url: Cow<'static, str>) -> Result<Self> {
            Ok(Self::default())
        }
    }

    #[derive(Default)]
    struct JsonClient {
        requests: Mutex<Vec<(String, String)>>,
    }

    impl JsonClient {
        fn push(&self, what: String, body: String) -> Result<()> {
            self.requests.lock().unwrap().push((what, body));
            Ok(())
        }
    }

    impl DatasetClient for JsonClient {
        async fn upsert_schema(&self, schema: &Schema) -> Result<()> {
            self.push(format!("PUT {}", schema.id()), serde_json::to_string(schema)?)
        }
        async fn replace_data(&self, dataset: &str, rows: &[DatasetRow]) -> Result<()> {
            self.push(
                format!("PUT {dataset}/data"),
                serde_json::to_string(&serde_json::json!({ "data": rows }))?,
            )
        }
        async fn append_data(&self, dataset: &str, rows: &[DatasetRow]) -> Result<()> {
            self.push(
                format!("POST {dataset}/data"),
                serde_json::to_string(&serde_json::json!({ "data": rows }))?,
            )
        }
        async fn delete_dataset(&self, dataset: &str) -> Result<()> {
            self.push(format!("DELETE {dataset}"), String::new())
        }
    }

    fn users() -> Dataset {
        Dataset::new(
            "active.users",
            UpdateType::Replace,
            "SELECT app, count FROM users",
            vec![
                Field::new("App", FieldType::String),
                Field::new("Count", FieldType::Number),
            ],
        )
    }

    fn limit() -> NonZeroUsize {
        NonZeroUsize::new(500).unwrap()
    }

    #[tokio::test]
    async fn sync_single_dataset() {
        let mut connection = FakeConnection::default().with(
            "SELECT app, count FROM users",
            vec![
                Some(vec!["ios".into(), 3i64.into()]),
                Some(vec!["android".into(), Value::Int64(None)]),
            ],
        );
        let client = JsonClient::default();
        let rows = sync_dataset(&mut connection, &client, &users(), limit())
            .await
            .unwrap();
        assert_eq!(rows, 2);
        assert_eq!(
            *client.requests.lock().unwrap(),
            [
                (
                    "PUT active.users".to_string(),
                    r#"{"id":"active.users","fields":{"app":{"type":"string","name":"App"},"count":{"type":"number","name":"Count"}}}"#.to_string()
                ),
                (
                    "PUT active.users/data".to_string(),
                    r#"{"data":[{"app":"ios","count":3},{"app":"android","count":0}]}"#.to_string()
                ),
            ]
        );
    }

    #[tokio::test]
    async fn rows_are_all_or_nothing() {
        let mut connection = FakeConnection::default().with(
            "SELECT app, count FROM users",
            vec![Some(vec!["ios".into(), 3i64.into()]), None],
        );
        let dataset = users();
        let schema = Schema::build(&dataset).unwrap();
        let error = fetch_dataset_rows(&mut connection, &dataset, &schema)
            .await
            .unwrap_err();
        let message = format!("{error:#}");
        assert!(
            message.starts_with(
                "Query failed for dataset `active.users`:\nSELECT app, count FROM users"
            ),
            "{message}"
        );
        assert!(message.ends_with("connection reset"), "{message}");
    }

    #[tokio::test]
    async fn coercion_failure_has_context() {
        let mut connection = FakeConnection::default().with(
            "SELECT app, count FROM users",
            vec![Some(vec!["ios".into(), "three".into()])],
        );
        let client = JsonClient::default();
        let error = sync_dataset(&mut connection, &client, &users(), limit())
            .await
            .unwrap_err();
        let message = format!("{error:#}");
        assert!(
            message.contains("Parsing the results of the query failed for dataset `active.users`"),
            "{message}"
        );
        assert!(message.contains("Cannot parse `three` as a number"), "{message}");
        assert!(client.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failures_do_not_stop_other_datasets() {
        let mut broken_schema = users();
        broken_schema.name = "broken.schema".into();
        broken_schema.fields.push(Field::new("count!", FieldType::Number));
        let mut missing_table = users();
        missing_table.name = "missing.table".into();
        missing_table.sql = "SELECT * FROM nowhere".into();
        let mut appended = users();
        appended.name = "appended".into();
        appended.update_type = UpdateType::Append;

        let mut connection = FakeConnection::default().with(
            "SELECT app, count FROM users",
            vec![Some(vec!["ios".into(), 1i32.into()])],
        );
        let client = JsonClient::default();
        let report = sync_all(
            &mut connection,
            &client,
            &[broken_schema, missing_table, users(), appended],
            limit(),
        )
        .await;

        assert!(report.has_errored());
        assert_eq!(
            report.failed().map(|v| v.dataset.as_str()).collect::<Vec<_>>(),
            ["broken.schema", "missing.table"]
        );
        let schema_error = report.outcomes[0].result.as_ref().unwrap_err();
        assert_eq!(
            schema_error.downcast_ref::<SchemaError>(),
            Some(&SchemaError::DuplicateKeys(vec![
                "Count".into(),
                "count!".into()
            ]))
        );
        assert_eq!(report.outcomes[2].result.as_ref().unwrap(), &1);
        assert_eq!(
            connection.queries,
            [
                "SELECT * FROM nowhere",
                "SELECT app, count FROM users",
                "SELECT app, count FROM users",
            ]
        );
        let requests: Vec<String> = client
            .requests
            .lock()
            .unwrap()
            .iter()
            .map(|(what, _)| what.clone())
            .collect();
        assert_eq!(
            requests,
            [
                "PUT active.users",
                "PUT active.users/data",
                "PUT appended",
                "POST appended/data",
            ]
        );
    }

    #[tokio::test]
    async fn report_without_errors() {
        let mut connection = FakeConnection::connect("fake://".into()).await.unwrap().with(
            "SELECT app, count FROM users",
            vec![],
        );
        assert_eq!(FakeDriver::NAME, "fake");
        let client = JsonClient::default();
        let report = sync_all(&mut connection, &client, &[users()], limit()).await;
        assert!(!report.has_errored());
        assert_eq!(report.failed().count(), 0);
        connection.execute("SELECT app, count FROM users".into()).await.unwrap();
        assert!(connection.execute("DELETE FROM users".into()).await.is_err());
        connection.disconnect().await.unwrap();
    }
}

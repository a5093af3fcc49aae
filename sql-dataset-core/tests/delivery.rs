#[cfg(test)]
mod tests {
    use sql_dataset_core::{
        DEFAULT_MAX_ROWS_PER_REQUEST, Dataset, DatasetClient, DatasetRow, DeliveryError, Error,
        RecordValue, Result, RowNames, Schema, UpdateType, deliver,
    };
    use std::{num::NonZeroUsize, sync::Mutex};

    #[derive(Debug, Clone, PartialEq)]
    enum Request {
        Schema(String),
        Replace(String, Vec<i64>),
        Append(String, Vec<i64>),
        Delete(String),
    }

    /// Records every request, failing the one at `fail_at` if set.
    #[derive(Default)]
    struct RecordingClient {
        requests: Mutex<Vec<Request>>,
        fail_at: Option<usize>,
    }

    impl RecordingClient {
        fn failing_at(index: usize) -> Self {
            Self {
                fail_at: Some(index),
                ..Default::default()
            }
        }

        fn record(&self, request: Request) -> Result<()> {
            let mut requests = self.requests.lock().unwrap();
            let index = requests.len();
            requests.push(request);
            if self.fail_at == Some(index) {
                return Err(Error::msg(format!("request {index} failed")));
            }
            Ok(())
        }

        fn requests(&self) -> Vec<Request> {
            self.requests.lock().unwrap().clone()
        }
    }

    fn ids(rows: &[DatasetRow]) -> Vec<i64> {
        rows.iter()
            .map(|row| match row.get("id") {
                Some(RecordValue::Integer(v)) => *v,
                other => panic!("Unexpected id {other:?}"),
            })
            .collect()
    }

    impl DatasetClient for RecordingClient {
        async fn upsert_schema(&self, schema: &Schema) -> Result<()> {
            self.record(Request::Schema(schema.id().into()))
        }
        async fn replace_data(&self, dataset: &str, rows: &[DatasetRow]) -> Result<()> {
            self.record(Request::Replace(dataset.into(), ids(rows)))
        }
        async fn append_data(&self, dataset: &str, rows: &[DatasetRow]) -> Result<()> {
            self.record(Request::Append(dataset.into(), ids(rows)))
        }
        async fn delete_dataset(&self, dataset: &str) -> Result<()> {
            self.record(Request::Delete(dataset.into()))
        }
    }

    fn rows(count: i64) -> Vec<DatasetRow> {
        let keys: RowNames = ["id".to_string()].into();
        (0..count)
            .map(|i| DatasetRow::new(keys.clone(), [RecordValue::Integer(i)].into()))
            .collect()
    }

    fn dataset(update_type: UpdateType) -> Dataset {
        Dataset::new("events", update_type, "SELECT id FROM events", vec![])
    }

    fn limit(value: usize) -> NonZeroUsize {
        NonZeroUsize::new(value).unwrap()
    }

    #[test]
    fn default_limit() {
        assert_eq!(DEFAULT_MAX_ROWS_PER_REQUEST.get(), 500);
    }

    #[tokio::test]
    async fn replace_within_limit() {
        let client = RecordingClient::default();
        deliver(&client, &dataset(UpdateType::Replace), &rows(3), limit(3))
            .await
            .unwrap();
        assert_eq!(
            client.requests(),
            [Request::Replace("events".into(), vec![0, 1, 2])]
        );
    }

    #[tokio::test]
    async fn replace_empty_still_sends() {
        let client = RecordingClient::default();
        deliver(&client, &dataset(UpdateType::Replace), &[], limit(3))
            .await
            .unwrap();
        assert_eq!(client.requests(), [Request::Replace("events".into(), vec![])]);
    }

    #[tokio::test]
    async fn replace_overflow_sends_first_rows() {
        let client = RecordingClient::default();
        let error = deliver(&client, &dataset(UpdateType::Replace), &rows(4), limit(3))
            .await
            .unwrap_err();
        assert_eq!(
            client.requests(),
            [Request::Replace("events".into(), vec![0, 1, 2])]
        );
        assert_eq!(
            error.downcast_ref::<DeliveryError>(),
            Some(&DeliveryError::TooManyRows { limit: 3, total: 4 })
        );
        let message = error.to_string();
        assert!(message.contains("Sent the first 3 rows, 4 rows existed against a limit of 3"));
        assert!(message.contains("'append'"));
    }

    #[tokio::test]
    async fn replace_overflow_with_failed_send() {
        let client = RecordingClient::failing_at(0);
        let error = deliver(&client, &dataset(UpdateType::Replace), &rows(5), limit(2))
            .await
            .unwrap_err();
        assert_eq!(client.requests().len(), 1);
        assert_eq!(
            error.downcast_ref::<DeliveryError>(),
            Some(&DeliveryError::TooManyRows { limit: 2, total: 5 })
        );
        assert!(format!("{error:#}").contains("request 0 failed"));
    }

    #[tokio::test]
    async fn append_in_chunks() {
        let client = RecordingClient::default();
        deliver(&client, &dataset(UpdateType::Append), &rows(7), limit(3))
            .await
            .unwrap();
        assert_eq!(
            client.requests(),
            [
                Request::Append("events".into(), vec![0, 1, 2]),
                Request::Append("events".into(), vec![3, 4, 5]),
                Request::Append("events".into(), vec![6]),
            ]
        );
    }

    #[tokio::test]
    async fn append_exact_multiple() {
        let client = RecordingClient::default();
        deliver(&client, &dataset(UpdateType::Append), &rows(6), limit(3))
            .await
            .unwrap();
        assert_eq!(client.requests().len(), 2);
    }

    #[tokio::test]
    async fn append_empty_is_noop() {
        let client = RecordingClient::default();
        deliver(&client, &dataset(UpdateType::Append), &[], limit(3))
            .await
            .unwrap();
        assert!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn append_stops_at_first_failure() {
        let client = RecordingClient::failing_at(1);
        let error = deliver(&client, &dataset(UpdateType::Append), &rows(10), limit(3))
            .await
            .unwrap_err();
        assert_eq!(
            client.requests(),
            [
                Request::Append("events".into(), vec![0, 1, 2]),
                Request::Append("events".into(), vec![3, 4, 5]),
            ]
        );
        let message = format!("{error:#}");
        assert!(message.contains("While appending rows 3..6 of 10"), "{message}");
        assert!(message.contains("request 1 failed"), "{message}");
    }

    #[tokio::test]
    async fn delete_goes_through_client() {
        let client = RecordingClient::default();
        client.delete_dataset("events").await.unwrap();
        assert_eq!(client.requests(), [Request::Delete("events".into())]);
    }
}

use crate::{RecordingClient, SELECT_APP_INSTALLS};
use serde_json::json;
use sql_dataset_core::{
    DEFAULT_MAX_ROWS_PER_REQUEST, Dataset, Executor, Field, FieldType, UpdateType, sync_dataset,
};
use std::num::NonZeroUsize;

pub(crate) fn app_installs(update_type: UpdateType) -> Dataset {
    Dataset::new(
        "app.installs",
        update_type,
        SELECT_APP_INSTALLS,
        vec![
            Field::new("App", FieldType::String),
            Field::new("Installs", FieldType::Number),
            Field::new("Revenue", FieldType::Money).with_currency("USD"),
            Field::new("Day", FieldType::Date),
            Field::new("Updated At", FieldType::Datetime).with_optional(true),
        ],
    )
}

pub(crate) fn expected_rows() -> [serde_json::Value; 3] {
    [
        json!({
            "app": "ios",
            "installs": 120,
            "revenue": 1999.99,
            "day": "2017-03-23",
            "updated_at": "2017-03-23T10:11:12Z",
        }),
        json!({
            "app": "android",
            "installs": 80,
            "revenue": 12.5,
            "day": "2017-03-24",
            "updated_at": null,
        }),
        json!({
            "app": "web",
            "installs": 0,
            "revenue": 0,
            "day": null,
            "updated_at": null,
        }),
    ]
}

pub async fn replace<E: Executor>(executor: &mut E) {
    let client = RecordingClient::default();
    let dataset = app_installs(UpdateType::Replace);
    let rows = sync_dataset(executor, &client, &dataset, DEFAULT_MAX_ROWS_PER_REQUEST)
        .await
        .expect("Could not synchronize the replace dataset");
    assert_eq!(rows, 3);

    let requests = client.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].method, "PUT");
    assert_eq!(requests[0].path, "/datasets/app.installs");
    assert_eq!(
        requests[0].body,
        json!({
            "id": "app.installs",
            "fields": {
                "app": { "type": "string", "name": "App" },
                "installs": { "type": "number", "name": "Installs" },
                "revenue": { "type": "money", "name": "Revenue", "currency_code": "USD" },
                "day": { "type": "date", "name": "Day" },
                "updated_at": { "type": "datetime", "name": "Updated At", "optional": true },
            }
        })
    );
    assert_eq!(requests[1].method, "PUT");
    assert_eq!(requests[1].path, "/datasets/app.installs/data");
    assert_eq!(requests[1].body, json!({ "data": expected_rows() }));

    // Over the limit only the first rows go out
    let client = RecordingClient::default();
    let error = sync_dataset(executor, &client, &dataset, NonZeroUsize::new(2).unwrap())
        .await
        .expect_err("Three rows do not fit a limit of two");
    assert!(error.to_string().contains("Sent the first 2 rows, 3 rows existed"));
    let requests = client.requests();
    assert_eq!(requests.len(), 2);
    let [first, second, _] = expected_rows();
    assert_eq!(requests[1].body, json!({ "data": [first, second] }));
}

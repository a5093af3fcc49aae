use crate::{
    RecordingClient,
    replace::{app_installs, expected_rows},
};
use serde_json::json;
use sql_dataset_core::{Executor, UpdateType, sync_all};
use std::num::NonZeroUsize;

pub async fn append<E: Executor>(executor: &mut E) {
    let client = RecordingClient::default();
    let dataset = app_installs(UpdateType::Append).with_unique_by(["App"]);
    let report = sync_all(
        executor,
        &client,
        &[dataset],
        NonZeroUsize::new(2).unwrap(),
    )
    .await;
    assert!(!report.has_errored());

    let requests = client.requests();
    assert_eq!(
        requests.iter().map(|v| v.method).collect::<Vec<_>>(),
        ["PUT", "POST", "POST"]
    );
    assert_eq!(requests[0].body["unique_by"], json!(["app"]));
    let [first, second, third] = expected_rows();
    assert_eq!(requests[1].body, json!({ "data": [first, second] }));
    assert_eq!(requests[2].body, json!({ "data": [third] }));
}

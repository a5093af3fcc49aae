use crate::{RecordingClient, replace::app_installs};
use sql_dataset_core::{
    CoercionError, DEFAULT_MAX_ROWS_PER_REQUEST, Executor, UpdateType, sync_all,
};

pub async fn failures<E: Executor>(executor: &mut E) {
    let mut missing_table = app_installs(UpdateType::Replace);
    missing_table.name = "missing.table".into();
    missing_table.sql = "SELECT app, installs, revenue, day, updated_at FROM no_such_table".into();
    let mut fewer_columns = app_installs(UpdateType::Replace);
    fewer_columns.name = "fewer.columns".into();
    fewer_columns.sql = "SELECT app, installs FROM app_installs".into();
    let client = RecordingClient::default();

    let level = log::max_level();
    log::set_max_level(log::LevelFilter::Off);
    let report = sync_all(
        executor,
        &client,
        &[
            missing_table,
            fewer_columns,
            app_installs(UpdateType::Replace),
        ],
        DEFAULT_MAX_ROWS_PER_REQUEST,
    )
    .await;
    log::set_max_level(level);

    assert!(report.has_errored());
    assert_eq!(
        report.failed().map(|v| v.dataset.as_str()).collect::<Vec<_>>(),
        ["missing.table", "fewer.columns"]
    );
    let error = report.outcomes[0].result.as_ref().unwrap_err();
    assert!(
        format!("{error:#}").contains("Query failed for dataset `missing.table`"),
        "{error:#}"
    );
    let error = report.outcomes[1].result.as_ref().unwrap_err();
    assert!(
        error.chain().any(|e| matches!(
            e.downcast_ref::<CoercionError>(),
            Some(CoercionError::ColumnCount {
                columns: 2,
                fields: 5
            })
        )),
        "{error:#}"
    );
    assert_eq!(report.outcomes[2].result.as_ref().ok(), Some(&3));
    assert_eq!(client.requests().len(), 2);
}

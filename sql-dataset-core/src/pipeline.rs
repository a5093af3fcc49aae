use crate::{
    Context, Dataset, DatasetClient, DatasetRow, Executor, Result, Schema, coerce_row, deliver,
    stream::StreamExt, truncate_long,
};
use std::{num::NonZeroUsize, pin::pin};

/// Runs the dataset query and coerces every row, all or nothing.
pub async fn fetch_dataset_rows<E: Executor>(
    executor: &mut E,
    dataset: &Dataset,
    schema: &Schema,
) -> Result<Vec<DatasetRow>> {
    let mut stream = pin!(executor.fetch(dataset.sql.clone()));
    let mut rows = Vec::new();
    while let Some(row) = stream.next().await {
        let row = row.with_context(|| {
            format!(
                "Query failed for dataset `{}`:\n{}",
                dataset.name,
                truncate_long!(dataset.sql)
            )
        })?;
        let row = coerce_row(schema, row.values()).with_context(|| {
            format!(
                "Parsing the results of the query failed for dataset `{}`:\n{}",
                dataset.name,
                truncate_long!(dataset.sql)
            )
        })?;
        rows.push(row);
    }
    Ok(rows)
}

/// Query, coerce, upsert the schema and deliver the rows of one dataset.
///
/// Returns the number of rows produced by the query.
pub async fn sync_dataset<E: Executor, C: DatasetClient>(
    executor: &mut E,
    client: &C,
    dataset: &Dataset,
    max_rows: NonZeroUsize,
) -> Result<usize> {
    let schema = Schema::build(dataset)?;
    let rows = fetch_dataset_rows(executor, dataset, &schema).await?;
    client
        .upsert_schema(&schema)
        .await
        .with_context(|| format!("While updating the schema of `{}`", dataset.name))?;
    deliver(client, dataset, &rows, max_rows).await?;
    Ok(rows.len())
}

#[derive(Debug)]
pub struct SyncOutcome {
    pub dataset: String,
    /// Rows produced by the query, or the error that stopped the dataset.
    pub result: Result<usize>,
}

/// Outcome of a full pass over the configured datasets.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub outcomes: Vec<SyncOutcome>,
}

impl SyncReport {
    pub fn has_errored(&self) -> bool {
        self.outcomes.iter().any(|v| v.result.is_err())
    }

    pub fn failed(&self) -> impl Iterator<Item = &SyncOutcome> {
        self.outcomes.iter().filter(|v| v.result.is_err())
    }
}

/// Synchronizes every dataset in order, a failing dataset does not stop the others.
pub async fn sync_all<E: Executor, C: DatasetClient>(
    executor: &mut E,
    client: &C,
    datasets: &[Dataset],
    max_rows: NonZeroUsize,
) -> SyncReport {
    let mut report = SyncReport::default();
    for dataset in datasets {
        let result = sync_dataset(executor, client, dataset, max_rows).await;
        match &result {
            Ok(rows) => log::info!("Successfully updated \"{}\" ({} rows)", dataset.name, rows),
            Err(e) => log::error!(
                "There was an error while trying to update {}: {:#}",
                dataset.name,
                e
            ),
        }
        report.outcomes.push(SyncOutcome {
            dataset: dataset.name.clone(),
            result,
        });
    }
    report
}

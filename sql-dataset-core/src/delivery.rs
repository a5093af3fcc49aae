use crate::{Context, Dataset, DatasetRow, Result, Schema, UpdateType};
use std::{future::Future, num::NonZeroUsize};
use thiserror::Error;

/// Rows carried by a single data request unless configured otherwise.
pub const DEFAULT_MAX_ROWS_PER_REQUEST: NonZeroUsize = NonZeroUsize::new(500).unwrap();

/// Remote side of a dataset: schema and data requests.
///
/// Every error returned is terminal for the request that produced it, nothing is retried.
pub trait DatasetClient {
    /// Creates the dataset or updates its schema.
    fn upsert_schema(&self, schema: &Schema) -> impl Future<Output = Result<()>> + Send;
    /// Overwrites the whole data of the dataset with `rows`.
    fn replace_data(&self, dataset: &str, rows: &[DatasetRow]) -> impl Future<Output = Result<()>> + Send;
    /// Adds `rows` to the data of the dataset.
    fn append_data(&self, dataset: &str, rows: &[DatasetRow]) -> impl Future<Output = Result<()>> + Send;
    fn delete_dataset(&self, dataset: &str) -> impl Future<Output = Result<()>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error(
        "Sent the first {limit} rows, {total} rows existed against a limit of {limit}. Change the dataset update type from 'replace' to 'append' to send all of them"
    )]
    TooManyRows { limit: usize, total: usize },
}

/// Sends the rows of a run according to the dataset update type.
///
/// Replace issues exactly one request, even for zero rows. When the rows exceed `max_rows` only
/// the first `max_rows` are sent and `DeliveryError::TooManyRows` is returned anyway, carrying the
/// send failure as its cause when the request failed too.
///
/// Append sends consecutive chunks of at most `max_rows` rows, one request each, and stops at the
/// first failing chunk. Zero rows means zero requests.
pub async fn deliver<C: DatasetClient>(
    client: &C,
    dataset: &Dataset,
    rows: &[DatasetRow],
    max_rows: NonZeroUsize,
) -> Result<()> {
    let limit = max_rows.get();
    match dataset.update_type {
        UpdateType::Replace => {
            if rows.len() <= limit {
                log::debug!("Replacing the data of `{}` with {} rows", dataset.name, rows.len());
                return client.replace_data(&dataset.name, rows).await;
            }
            let overflow = DeliveryError::TooManyRows {
                limit,
                total: rows.len(),
            };
            log::warn!("Dataset `{}`: {}", dataset.name, overflow);
            match client.replace_data(&dataset.name, &rows[..limit]).await {
                Ok(()) => Err(overflow.into()),
                Err(e) => Err(e.context(overflow)),
            }
        }
        UpdateType::Append => {
            for (i, chunk) in rows.chunks(limit).enumerate() {
                let start = i * limit;
                log::debug!(
                    "Appending rows {}..{} of {} to `{}`",
                    start,
                    start + chunk.len(),
                    rows.len(),
                    dataset.name
                );
                client
                    .append_data(&dataset.name, chunk)
                    .await
                    .with_context(|| {
                        format!(
                            "While appending rows {}..{} of {}",
                            start,
                            start + chunk.len(),
                            rows.len()
                        )
                    })?;
            }
            Ok(())
        }
    }
}

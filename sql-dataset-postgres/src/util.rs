use crate::ValueHolder;
use async_stream::try_stream;
use sql_dataset_core::{
    Error, Row, RowLabeled, RowNames,
    stream::{Stream, StreamExt},
};
use std::pin::pin;

pub(crate) fn row_to_dataset_row(row: tokio_postgres::Row) -> sql_dataset_core::Result<Row> {
    (0..row.len())
        .map(|i| match row.try_get::<_, ValueHolder>(i) {
            Ok(v) => Ok(v.0),
            Err(e) => {
                let col = &row.columns()[i];
                Err(Error::new(e).context(format!(
                    "Could not decode column {} `{}` of type {}",
                    i,
                    col.name(),
                    col.type_()
                )))
            }
        })
        .collect()
}

/// Labels every row with the column names of the result set, computed once.
pub(crate) fn stream_postgres_rows<V>(
    stream: impl AsyncFnOnce() -> sql_dataset_core::Result<V>,
) -> impl Stream<Item = sql_dataset_core::Result<RowLabeled>>
where
    V: Stream<Item = Result<tokio_postgres::Row, tokio_postgres::Error>>,
{
    try_stream! {
        let stream = stream().await?;
        let mut stream = pin!(stream);
        let mut labels: Option<RowNames> = None;
        while let Some(row) = stream.next().await.transpose()? {
            let labels = labels.get_or_insert_with(|| {
                row.columns().iter().map(|c| c.name().to_string()).collect()
            });
            yield RowLabeled::new(labels.clone(), row_to_dataset_row(row)?);
        }
    }
}

use crate::ValueWrap;
use mysql_async::FromRowError;
use sql_dataset_core::{Row, RowLabeled, RowNames};

pub(crate) struct RowWrap(pub(crate) RowLabeled);

impl mysql_async::prelude::FromRow for RowWrap {
    fn from_row_opt(mut row: mysql_async::Row) -> Result<Self, mysql_async::FromRowError>
    where
        Self: Sized,
    {
        let names: RowNames = row
            .columns()
            .iter()
            .map(|v| v.name_str().into_owned())
            .collect();
        let values: Row = (0..row.len())
            .map(|i| match row.take_opt::<ValueWrap, _>(i) {
                Some(Ok(v)) => Ok(v.0),
                _ => Err(()),
            })
            .collect::<Result<_, _>>()
            .map_err(|_| FromRowError(row))?;
        Ok(RowWrap(RowLabeled::new(names, values)))
    }
}

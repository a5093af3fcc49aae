use crate::{MySQLDriver, RowWrap};
use async_stream::try_stream;
use mysql_async::{Conn, Opts, prelude::Queryable};
use sql_dataset_core::{
    Connection, Context, Driver, Error, Executor, Result, RowLabeled,
    stream::{Stream, StreamExt, TryStreamExt},
    truncate_long,
};
use std::{borrow::Cow, sync::Arc};
use url::Url;

/// A session on a MySQL server.
///
/// Queries go through the text protocol, a script with several statements yields the rows of
/// every result set one after the other.
pub struct MySQLConnection {
    pub(crate) connection: Conn,
}

impl Executor for MySQLConnection {
    type Driver = MySQLDriver;

    fn driver(&self) -> &Self::Driver {
        &MySQLDriver {}
    }

    fn fetch<'s>(&'s mut self, sql: String) -> impl Stream<Item = Result<RowLabeled>> + Send + 's {
        let context = Arc::new(format!("While fetching the query:\n{}", truncate_long!(sql)));
        try_stream! {
            let mut sets = self.connection.query_iter(sql).await?;
            while let Some(mut rows) = sets.stream::<RowWrap>().await? {
                while let Some(RowWrap(row)) = rows.next().await.transpose()? {
                    yield row;
                }
            }
        }
        .map_err(move |e: Error| {
            let e = e.context(context.clone());
            log::error!("{:#}", e);
            e
        })
    }
}

impl Connection for MySQLConnection {
    async fn connect(url: Cow<'static, str>) -> Result<MySQLConnection> {
        let context = || format!("While trying to connect to `{}`", truncate_long!(url));
        let parsed = Url::parse(&url).with_context(context)?;
        if parsed.scheme() != <Self::Driver as Driver>::NAME {
            let error = Error::msg(format!(
                "Cannot open a `{}` url with the {} executor",
                parsed.scheme(),
                <Self::Driver as Driver>::NAME
            ))
            .context(context());
            log::error!("{:#}", error);
            return Err(error);
        }
        let options = Opts::from_url(parsed.as_str()).with_context(context)?;
        let connection = Conn::new(options).await.with_context(context)?;
        log::debug!("Connected to the mysql server at `{}`", parsed.host_str().unwrap_or_default());
        Ok(MySQLConnection { connection })
    }

    async fn disconnect(self) -> Result<()> {
        self.connection
            .disconnect()
            .await
            .context("While closing the mysql connection")
    }
}

use crate::{
    Driver, Result, RowLabeled, future,
    stream::{Stream, TryStreamExt},
};
use std::future::Future;

pub trait Executor: Send {
    type Driver: Driver;

    fn driver(&self) -> &Self::Driver;

    /// Execute the query and return the rows in the order the database produces them.
    fn fetch<'s>(&'s mut self, sql: String) -> impl Stream<Item = Result<RowLabeled>> + Send + 's;

    /// Execute the statement discarding any row it produces.
    fn execute(&mut self, sql: String) -> impl Future<Output = Result<()>> + Send {
        self.fetch(sql).try_for_each(|_| future::ready(Ok(())))
    }
}

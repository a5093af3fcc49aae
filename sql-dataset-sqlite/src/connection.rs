use crate::{
    CBox, SqliteDriver, error_message_from_ptr,
    extract::{extract_name, extract_value},
};
use async_stream::try_stream;
use libsqlite3_sys::{
    SQLITE_BUSY, SQLITE_DONE, SQLITE_OK, SQLITE_OPEN_CREATE, SQLITE_OPEN_READWRITE,
    SQLITE_OPEN_URI, SQLITE_ROW, sqlite3, sqlite3_close, sqlite3_column_count, sqlite3_errmsg,
    sqlite3_finalize, sqlite3_open_v2, sqlite3_prepare_v2, sqlite3_step,
};
use sql_dataset_core::{
    Connection, Context, Driver, Error, Executor, Result, RowLabeled, RowNames,
    stream::{Stream, TryStreamExt},
    truncate_long,
};
use std::{
    borrow::Cow,
    ffi::{CStr, CString, c_char},
    ptr,
    sync::Arc,
};
use tokio::task::spawn_blocking;

/// A SQLite database file opened through a `file:` URI.
///
/// The C api blocks, so every query runs to completion on the blocking pool and the rows are
/// streamed afterwards.
pub struct SqliteConnection {
    pub(crate) connection: CBox<sqlite3>,
}

impl SqliteConnection {
    fn error_message(connection: *mut sqlite3) -> String {
        unsafe { error_message_from_ptr(&sqlite3_errmsg(connection)).to_string() }
    }

    /// Runs every statement in `sql` and returns the rows of the last one that has result columns.
    ///
    /// Earlier statements are still executed, so a script can create and fill a table before
    /// selecting from it.
    fn fetch_all(connection: *mut sqlite3, sql: &str) -> Result<Vec<RowLabeled>> {
        let sql = CString::new(sql).context("The query contains a nul byte")?;
        let mut rows = Vec::new();
        let mut tail: *const c_char = sql.as_ptr();
        unsafe {
            while !CStr::from_ptr(tail)
                .to_bytes()
                .iter()
                .all(u8::is_ascii_whitespace)
            {
                let mut statement = CBox::new(ptr::null_mut(), |p| {
                    sqlite3_finalize(p);
                });
                let rc = sqlite3_prepare_v2(connection, tail, -1, &mut *statement, &mut tail);
                if rc != SQLITE_OK {
                    return Err(Error::msg(Self::error_message(connection)));
                }
                if statement.is_null() {
                    continue;
                }
                let count = sqlite3_column_count(*statement);
                if count > 0 {
                    rows.clear();
                }
                let labels = (0..count)
                    .map(|i| extract_name(*statement, i))
                    .collect::<Result<RowNames>>()?;
                loop {
                    match sqlite3_step(*statement) {
                        SQLITE_BUSY => continue,
                        SQLITE_DONE => break,
                        SQLITE_ROW => rows.push(RowLabeled::new(
                            labels.clone(),
                            (0..count)
                                .map(|i| extract_value(*statement, i))
                                .collect::<Result<_>>()?,
                        )),
                        _ => return Err(Error::msg(Self::error_message(connection))),
                    }
                }
            }
        }
        Ok(rows)
    }
}

impl Executor for SqliteConnection {
    type Driver = SqliteDriver;

    fn driver(&self) -> &Self::Driver {
        &SqliteDriver {}
    }

    fn fetch<'s>(&'s mut self, sql: String) -> impl Stream<Item = Result<RowLabeled>> + Send + 's {
        let context = Arc::new(format!("While fetching the query:\n{}", truncate_long!(sql)));
        let connection = CBox::new(*self.connection, |_| {});
        try_stream! {
            let rows = spawn_blocking(move || Self::fetch_all(*connection, &sql)).await??;
            for row in rows {
                yield row;
            }
        }
        .map_err(move |e: Error| {
            let e = e.context(context.clone());
            log::error!("{:#}", e);
            e
        })
    }
}

impl Connection for SqliteConnection {
    #[allow(refining_impl_trait)]
    async fn connect(url: Cow<'static, str>) -> Result<SqliteConnection> {
        let prefix = format!("{}://", <Self::Driver as Driver>::NAME);
        if !url.starts_with(&prefix) {
            let error = Error::msg(format!(
                "Expected sqlite connection url to start with `{}`",
                &prefix
            ));
            log::error!("{:#}", error);
            return Err(error);
        }
        let context = || format!("While trying to open `{}`", url);
        let path = CString::new(format!("file:{}", url.trim_start_matches(&prefix)))
            .with_context(context)?;
        let mut connection = CBox::new(ptr::null_mut(), |p| unsafe {
            sqlite3_close(p);
        });
        let rc = unsafe {
            sqlite3_open_v2(
                path.as_ptr(),
                &mut *connection,
                SQLITE_OPEN_URI | SQLITE_OPEN_READWRITE | SQLITE_OPEN_CREATE,
                ptr::null(),
            )
        };
        if rc != SQLITE_OK {
            let error = Error::msg(Self::error_message(*connection)).context(context());
            log::error!("{:#}", error);
            return Err(error);
        }
        Ok(Self { connection })
    }
}

use crate::{Config, DatabaseConfig, DriverKind};
use sql_dataset_core::{
    Connection, Context, DatasetClient, Result, SyncReport, sync_all, truncate_long,
};
use sql_dataset_mysql::MySQLConnection;
use sql_dataset_postgres::PostgresConnection;
use sql_dataset_sqlite::SqliteConnection;
use std::{borrow::Cow, time::Duration};

/// Open connection to the configured database, whatever its driver.
pub enum Session {
    Postgres(PostgresConnection),
    MySQL(MySQLConnection),
    Sqlite(SqliteConnection),
}

impl Session {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let kind = config.driver_kind()?;
        let url: Cow<'static, str> = config.connection_url()?.into();
        log::debug!("Connecting to {}", truncate_long!(url));
        Ok(match kind {
            DriverKind::Postgres => Session::Postgres(PostgresConnection::connect(url).await?),
            DriverKind::MySQL => Session::MySQL(MySQLConnection::connect(url).await?),
            DriverKind::Sqlite => Session::Sqlite(SqliteConnection::connect(url).await?),
        })
    }

    /// One full pass over `config.datasets`.
    pub async fn sync_all<C: DatasetClient>(&mut self, config: &Config, client: &C) -> SyncReport {
        let max_rows = config.max_rows_per_request();
        match self {
            Session::Postgres(connection) => {
                sync_all(connection, client, &config.datasets, max_rows).await
            }
            Session::MySQL(connection) => {
                sync_all(connection, client, &config.datasets, max_rows).await
            }
            Session::Sqlite(connection) => {
                sync_all(connection, client, &config.datasets, max_rows).await
            }
        }
    }

    pub async fn disconnect(self) -> Result<()> {
        match self {
            Session::Postgres(connection) => connection.disconnect().await,
            Session::MySQL(connection) => connection.disconnect().await,
            Session::Sqlite(connection) => connection.disconnect().await,
        }
    }
}

/// Connects and runs the datasets once, or every `refresh_time_sec` seconds forever.
///
/// Returns whether any dataset failed, only reachable in one-shot mode.
pub async fn run<C: DatasetClient>(config: &Config, client: &C) -> Result<bool> {
    let database = config
        .database
        .as_ref()
        .context("Database config is required")?;
    let mut session = Session::connect(database)
        .await
        .context("Failed to open database connection")?;
    if config.refresh_time_sec == 0 {
        let report = session.sync_all(config, client).await;
        session.disconnect().await?;
        return Ok(report.has_errored());
    }
    log::info!(
        "Running every {} seconds, until interrupted",
        config.refresh_time_sec
    );
    loop {
        session.sync_all(config, client).await;
        tokio::time::sleep(Duration::from_secs(config.refresh_time_sec)).await;
    }
}

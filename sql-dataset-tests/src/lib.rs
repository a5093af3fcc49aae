mod append;
mod client;
mod failures;
mod replace;

pub use client::*;

use append::append;
use failures::failures;
use log::LevelFilter;
use replace::replace;
use sql_dataset_core::{Connection, Executor};
use std::env;

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Runs the whole pipeline against a live connection, from the query to the recorded requests.
pub async fn execute_tests<C: Connection>(mut connection: C) {
    setup(&mut connection).await;
    replace(&mut connection).await;
    append(&mut connection).await;
    failures(&mut connection).await;
    connection
        .disconnect()
        .await
        .expect("Could not disconnect");
}

pub(crate) const SELECT_APP_INSTALLS: &str =
    "SELECT app, installs, revenue, day, updated_at FROM app_installs ORDER BY id";

async fn setup<E: Executor>(executor: &mut E) {
    executor
        .execute("DROP TABLE IF EXISTS app_installs".into())
        .await
        .expect("Failed to drop the app_installs table");
    executor
        .execute(
            indoc::indoc! {"
                CREATE TABLE app_installs (
                    id INTEGER,
                    app VARCHAR(64),
                    installs INTEGER,
                    revenue DECIMAL(10, 2),
                    day DATE,
                    updated_at TIMESTAMP NULL
                )
            "}
            .into(),
        )
        .await
        .expect("Failed to create the app_installs table");
    executor
        .execute(
            indoc::indoc! {"
                INSERT INTO app_installs (id, app, installs, revenue, day, updated_at) VALUES
                    (1, 'ios', 120, 1999.99, '2017-03-23', '2017-03-23 10:11:12'),
                    (2, 'android', 80, 12.50, '2017-03-24', NULL),
                    (3, 'web', NULL, NULL, NULL, NULL)
            "}
            .into(),
        )
        .await
        .expect("Failed to insert the app_installs rows");
}

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        $($code)+
        log::set_max_level(level);
    }};
}

#[cfg(test)]
mod tests {
    use sql_dataset_core::{Connection, Executor, Value, stream::TryStreamExt};
    use sql_dataset_sqlite::SqliteConnection;
    use sql_dataset_tests::{init_logs, silent_logs};
    use std::{path::Path, sync::Mutex};
    use tokio::fs;

    static MUTEX: Mutex<()> = Mutex::new(());

    #[tokio::test]
    async fn create_database() {
        init_logs();
        const DB_PATH: &'static str = "../target/debug/creation.sqlite";
        let _guard = MUTEX.lock().unwrap();
        if Path::new(DB_PATH).exists() {
            fs::remove_file(DB_PATH)
                .await
                .expect(format!("Failed to remove test database file {}", DB_PATH).as_str());
        }
        SqliteConnection::connect(format!("sqlite://{}?mode=rwc", DB_PATH).into())
            .await
            .expect("Could not open the database");
        assert!(
            Path::new(DB_PATH).exists(),
            "Database file should be created after connection"
        );
        SqliteConnection::connect(format!("sqlite://{}?mode=ro", DB_PATH).into())
            .await
            .expect("Could not open the database");
        fs::remove_file(DB_PATH)
            .await
            .expect(format!("Failed to remove existing test database file {}", DB_PATH).as_str());
        silent_logs! {
            assert!(
                SqliteConnection::connect(format!("sqlite://{}?mode=ro", DB_PATH).into())
                    .await
                    .is_err(),
                "Should not be able to open in read only unexisting database"
            );
        }
    }

    #[tokio::test]
    async fn storage_classes() {
        init_logs();
        let mut connection = SqliteConnection::connect("sqlite://:memory:".into())
            .await
            .expect("Could not open the database");
        connection
            .execute(
                "CREATE TABLE t (a INTEGER, b REAL, c TEXT, d BLOB, e);
                 INSERT INTO t VALUES (1, 1.5, 'x', x'0102', NULL);"
                    .into(),
            )
            .await
            .expect("Could not create the table");
        let rows: Vec<_> = connection
            .fetch("SELECT a, b, c, d, e FROM t".into())
            .try_collect()
            .await
            .expect("Query failed");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].names(), ["a", "b", "c", "d", "e"]);
        assert_eq!(
            rows[0].values(),
            [
                Value::Int64(Some(1)),
                Value::Float64(Some(1.5)),
                Value::Varchar(Some("x".into())),
                Value::Blob(Some([1u8, 2].into())),
                Value::Null,
            ]
        );
        silent_logs! {
            let error = connection
                .fetch("SELECT * FROM missing".into())
                .try_collect::<Vec<_>>()
                .await
                .expect_err("The table does not exist");
            assert!(format!("{error:#}").contains("no such table: missing"));
        }
    }

    #[tokio::test]
    async fn script_returns_last_result_set() {
        init_logs();
        let mut connection = SqliteConnection::connect("sqlite://:memory:".into())
            .await
            .expect("Could not open the database");
        let rows: Vec<_> = connection
            .fetch(
                "SELECT 1 AS a, 2 AS b;
                 CREATE TABLE u (name TEXT);
                 INSERT INTO u VALUES ('ann'), ('bob');
                 SELECT name FROM u ORDER BY name;
                 DELETE FROM u WHERE name = 'zed';"
                    .into(),
            )
            .try_collect()
            .await
            .expect("Script failed");
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|v| v.names() == ["name"]));
        assert_eq!(rows[0].values(), [Value::Varchar(Some("ann".into()))]);
        assert_eq!(rows[1].values(), [Value::Varchar(Some("bob".into()))]);

        let rows: Vec<_> = connection
            .fetch("SELECT name FROM u; SELECT name FROM u WHERE name = 'zed'".into())
            .try_collect()
            .await
            .expect("Query failed");
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn wrong_url() {
        silent_logs! {
            assert!(
                SqliteConnection::connect("postgres://some_value".into())
                    .await
                    .is_err()
            );
        };
    }
}

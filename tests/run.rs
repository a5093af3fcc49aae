#[cfg(test)]
mod tests {
    use indoc::indoc;
    use mockito::{Matcher, Server};
    use sql_dataset::{Config, HttpDatasetClient, Session, run};

    fn config(api_url: &str) -> Config {
        let mut config = Config::from_yaml(indoc! {r#"
            api_key: api-key-123
            database:
              driver: sqlite3
              database: ":memory:"
            datasets:
              - name: app.installs
                update_type: replace
                sql: SELECT 'ios' AS app, 3 AS installs UNION ALL SELECT 'web', NULL
                fields:
                  - { name: App, type: string }
                  - { name: Installs, type: number, optional: true }
              - name: broken
                update_type: append
                sql: SELECT 'only one column'
                fields:
                  - { name: App, type: string }
                  - { name: Installs, type: number }
        "#})
        .unwrap();
        config.api_url = Some(api_url.into());
        config
    }

    #[tokio::test]
    async fn one_shot_run_against_sqlite() {
        //* Given
        let mut server = Server::new_async().await;
        let schema = server
            .mock("PUT", "/datasets/app.installs")
            .match_body(Matcher::JsonString(
                r#"{"id":"app.installs","fields":{"app":{"type":"string","name":"App"},"installs":{"type":"number","name":"Installs","optional":true}}}"#.into(),
            ))
            .with_status(200)
            .expect(1)
            .create_async()
            .await;
        let data = server
            .mock("PUT", "/datasets/app.installs/data")
            .match_body(Matcher::JsonString(
                r#"{"data":[{"app":"ios","installs":3},{"app":"web","installs":null}]}"#.into(),
            ))
            .with_status(200)
            .expect(1)
            .create_async()
            .await;
        let untouched = server
            .mock("PUT", "/datasets/broken")
            .expect(0)
            .create_async()
            .await;
        let config = config(&server.url());
        assert!(config.validate().is_empty(), "{:?}", config.validate());
        let client = HttpDatasetClient::with_api_url(&config.api_key, config.api_url()).unwrap();

        //* When
        let has_errored = run(&config, &client).await.unwrap();

        //* Then
        schema.assert_async().await;
        data.assert_async().await;
        untouched.assert_async().await;
        assert!(has_errored);
    }

    #[tokio::test]
    async fn session_report() {
        //* Given
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("PUT", Matcher::Any)
            .with_status(200)
            .create_async()
            .await;
        let config = config(&server.url());
        let client = HttpDatasetClient::with_api_url(&config.api_key, config.api_url()).unwrap();
        let mut session = Session::connect(config.database.as_ref().unwrap())
            .await
            .unwrap();

        //* When
        let report = session.sync_all(&config, &client).await;

        //* Then
        assert!(matches!(session, Session::Sqlite(..)));
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.outcomes[0].result.as_ref().unwrap(), &2);
        let failed: Vec<_> = report.failed().map(|v| v.dataset.as_str()).collect();
        assert_eq!(failed, ["broken"]);
        let message = format!("{:#}", report.outcomes[1].result.as_ref().unwrap_err());
        assert!(
            message.contains("The query returned 1 columns but the dataset declares 2 fields"),
            "{message}"
        );
        session.disconnect().await.unwrap();
    }

    #[tokio::test]
    async fn connection_failure() {
        let mut config = config("http://127.0.0.1:1");
        config.database.as_mut().unwrap().driver = "postgres".into();
        config.database.as_mut().unwrap().url = Some("mysql://wrong/scheme".into());
        let client = HttpDatasetClient::with_api_url(&config.api_key, config.api_url()).unwrap();
        let error = run(&config, &client).await.unwrap_err();
        assert_eq!(error.to_string(), "Failed to open database connection");
    }
}

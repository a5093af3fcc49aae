use crate::{PostgresDriver, util::stream_postgres_rows};
use openssl::ssl::{SslConnector, SslFiletype, SslMethod, SslVerifyMode};
use postgres_openssl::MakeTlsConnector;
use sql_dataset_core::{
    Connection, Context, Driver, Error, Executor, Result, RowLabeled,
    stream::{Stream, TryStreamExt},
    truncate_long,
};
use std::{borrow::Cow, env, path::Path, sync::Arc};
use tokio::spawn;
use tokio_postgres::NoTls;
use url::Url;
use urlencoding::decode;

/// A session on a Postgres server.
///
/// Queries go through the extended protocol so every column arrives in binary form. TLS is
/// driven by the `sslmode`, `sslrootcert`, `sslcert` and `sslkey` url parameters, falling back to
/// the matching `PG*` environment variables.
pub struct PostgresConnection {
    pub(crate) client: tokio_postgres::Client,
}

impl Executor for PostgresConnection {
    type Driver = PostgresDriver;

    fn driver(&self) -> &Self::Driver {
        &PostgresDriver {}
    }

    fn fetch<'s>(&'s mut self, sql: String) -> impl Stream<Item = Result<RowLabeled>> + Send + 's {
        let context = Arc::new(format!("While fetching the query:\n{}", truncate_long!(sql)));
        stream_postgres_rows(async move || {
            self.client
                .query_raw(sql.as_str(), Vec::<String>::new())
                .await
                .map_err(Error::new)
        })
        .map_err(move |e: Error| {
            let e = e.context(context.clone());
            log::error!("{:#}", e);
            e
        })
    }
}

impl Connection for PostgresConnection {
    #[allow(refining_impl_trait)]
    async fn connect(url: Cow<'static, str>) -> Result<PostgresConnection> {
        let context = || format!("While trying to connect to `{}`", url);
        let url = decode(&url).with_context(context)?;
        let prefix = format!("{}://", <Self::Driver as Driver>::NAME);
        if !url.starts_with(&prefix) {
            let error = Error::msg(format!(
                "Postgres connection url must start with `{}`",
                &prefix
            ))
            .context(context());
            log::error!("{:#}", error);
            return Err(error);
        }
        let mut url = Url::parse(&url).with_context(context)?;
        let mut take_url_param = |key: &str, env_var: &str| {
            let mut pairs: Vec<(String, String)> = url
                .query_pairs()
                .map(|(k, v)| (k.into(), v.into()))
                .collect();
            let value = pairs
                .iter()
                .position(|(k, _)| k == key)
                .map(|pos| pairs.remove(pos).1);
            if pairs.is_empty() {
                url.set_query(None);
            } else {
                url.query_pairs_mut()
                    .clear()
                    .extend_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
            }
            value.or_else(|| env::var(env_var).ok())
        };
        let sslmode = take_url_param("sslmode", "PGSSLMODE").unwrap_or("disable".into());
        let client = if sslmode == "disable" {
            let (client, connection) = tokio_postgres::connect(url.as_str(), NoTls)
                .await
                .with_context(context)?;
            spawn(async move {
                if let Err(e) = connection.await
                    && !e.is_closed()
                {
                    log::error!("Postgres connection error: {:#}", e);
                }
            });
            client
        } else {
            let mut builder = SslConnector::builder(SslMethod::tls())?;
            if let Some(path) = take_url_param("sslrootcert", "PGSSLROOTCERT")
                .as_deref()
                .map(Path::new)
                && path.exists()
            {
                builder.set_ca_file(path)?;
            }
            if let Some(path) = take_url_param("sslcert", "PGSSLCERT")
                .as_deref()
                .map(Path::new)
                && path.exists()
            {
                builder.set_certificate_chain_file(path)?;
            }
            if let Some(path) = take_url_param("sslkey", "PGSSLKEY")
                .as_deref()
                .map(Path::new)
                && path.exists()
            {
                builder.set_private_key_file(path, SslFiletype::PEM)?;
            }
            match &*sslmode {
                "require" | "prefer" | "allow" => builder.set_verify(SslVerifyMode::NONE),
                "verify-ca" | "verify-full" => builder.set_verify(SslVerifyMode::PEER),
                other => {
                    let error = Error::msg(format!("Unsupported sslmode `{}`", other))
                        .context(context());
                    log::error!("{:#}", error);
                    return Err(error);
                }
            }
            let mut connector = MakeTlsConnector::new(builder.build());
            if sslmode != "verify-full" {
                connector.set_callback(|config, _| {
                    config.set_verify_hostname(false);
                    Ok(())
                });
            }
            let (client, connection) = tokio_postgres::connect(url.as_str(), connector)
                .await
                .with_context(context)?;
            spawn(async move {
                if let Err(e) = connection.await
                    && !e.is_closed()
                {
                    log::error!("Postgres connection error: {:#}", e);
                }
            });
            client
        };
        Ok(Self { client })
    }
}

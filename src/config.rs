use crate::DEFAULT_API_URL;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use sql_dataset_core::{
    Context, DEFAULT_MAX_ROWS_PER_REQUEST, Dataset, Driver, Error, Result, Schema, SchemaError,
};
use sql_dataset_mysql::MySQLDriver;
use sql_dataset_postgres::PostgresDriver;
use sql_dataset_sqlite::SqliteDriver;
use std::{
    collections::BTreeMap, env, fmt, fs, num::NonZeroUsize, path::Path, str::FromStr,
    sync::LazyLock,
};
use url::{Url, form_urlencoded};

pub const DEFAULT_CONFIG_FILE: &str = "sql-dataset.yml";

static ENV_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}$").expect("Valid placeholder regex")
});

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default, alias = "geckoboard_api_key")]
    pub api_key: String,
    #[serde(default)]
    pub api_url: Option<String>,
    /// Seconds between two runs, zero runs once.
    #[serde(default)]
    pub refresh_time_sec: u64,
    #[serde(default)]
    pub max_rows_per_request: Option<usize>,
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub datasets: Vec<Dataset>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub driver: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub port: Option<String>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    #[serde(default)]
    pub tls_config: Option<TlsConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TlsConfig {
    #[serde(default)]
    pub ssl_mode: Option<String>,
    #[serde(default)]
    pub ca_file: Option<String>,
    #[serde(default)]
    pub key_file: Option<String>,
    #[serde(default)]
    pub cert_file: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverKind {
    Postgres,
    MySQL,
    Sqlite,
}

impl DriverKind {
    pub const ALL: [DriverKind; 3] = [DriverKind::Postgres, DriverKind::MySQL, DriverKind::Sqlite];

    /// Url scheme accepted by the executor of this driver.
    pub fn scheme(&self) -> &'static str {
        match self {
            DriverKind::Postgres => PostgresDriver::NAME,
            DriverKind::MySQL => MySQLDriver::NAME,
            DriverKind::Sqlite => SqliteDriver::NAME,
        }
    }

    fn default_port(&self) -> Option<u16> {
        match self {
            DriverKind::Postgres => Some(5432),
            DriverKind::MySQL => Some(3306),
            DriverKind::Sqlite => None,
        }
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}

impl FromStr for DriverKind {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "postgres" | "postgresql" => Ok(DriverKind::Postgres),
            "mysql" => Ok(DriverKind::MySQL),
            "sqlite" | "sqlite3" => Ok(DriverKind::Sqlite),
            _ => Err(Error::msg(format!(
                "Unsupported driver '{}' only [{}] are supported",
                value,
                DriverKind::ALL.map(|v| v.scheme()).join(" ")
            ))),
        }
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    Ok(
        match Option::<serde_yaml::Value>::deserialize(deserializer)? {
            Some(serde_yaml::Value::String(v)) => Some(v),
            Some(serde_yaml::Value::Number(v)) => Some(v.to_string()),
            Some(serde_yaml::Value::Null) | None => None,
            Some(other) => {
                return Err(serde::de::Error::custom(format!(
                    "expected a port number, found {:?}",
                    other
                )));
            }
        },
    )
}

/// Replaces a value that is exactly `{{ NAME }}` with the variable `NAME`, when `lookup` knows it.
pub fn interpolate(value: &mut String, lookup: &impl Fn(&str) -> Option<String>) {
    let Some(name) = ENV_PLACEHOLDER
        .captures(value)
        .and_then(|v| v.get(1))
        .map(|v| v.as_str().to_string())
    else {
        return;
    };
    if let Some(resolved) = lookup(&name) {
        *value = resolved;
    }
}

impl Config {
    /// Reads the yaml file at `path` and resolves environment placeholders.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("While reading the config file `{}`", path.display()))?;
        let mut config = Self::from_yaml(&content)
            .with_context(|| format!("While parsing the config file `{}`", path.display()))?;
        config.interpolate_with(&|name: &str| env::var(name).ok());
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn interpolate_with(&mut self, lookup: &impl Fn(&str) -> Option<String>) {
        interpolate(&mut self.api_key, lookup);
        if let Some(api_url) = &mut self.api_url {
            interpolate(api_url, lookup);
        }
        if let Some(database) = &mut self.database {
            for value in [
                &mut database.url,
                &mut database.host,
                &mut database.port,
                &mut database.username,
                &mut database.password,
                &mut database.database,
            ]
            .into_iter()
            .flatten()
            {
                interpolate(value, lookup);
            }
        }
    }

    pub fn api_url(&self) -> &str {
        self.api_url
            .as_deref()
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_API_URL)
    }

    pub fn max_rows_per_request(&self) -> NonZeroUsize {
        self.max_rows_per_request
            .and_then(NonZeroUsize::new)
            .unwrap_or(DEFAULT_MAX_ROWS_PER_REQUEST)
    }

    /// Every problem found in the configuration, empty when it can be run.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.api_key.is_empty() {
            errors.push("API key is required".to_string());
        }
        match &self.database {
            Some(database) => errors.extend(database.validate()),
            None => errors.push("Database config is required".to_string()),
        }
        if self.max_rows_per_request == Some(0) {
            errors.push("Max rows per request must be at least 1".to_string());
        }
        if self.datasets.is_empty() {
            errors.push("At least one dataset is required".to_string());
        }
        for dataset in &self.datasets {
            match Schema::build(dataset) {
                Ok(..) => {}
                Err(SchemaError::Invalid(list)) => {
                    errors.extend(list.iter().map(ToString::to_string))
                }
                Err(e) => errors.push(e.to_string()),
            }
        }
        errors
    }
}

impl DatabaseConfig {
    pub fn driver_kind(&self) -> Result<DriverKind> {
        self.driver.parse()
    }

    fn url(&self) -> Option<&str> {
        self.url.as_deref().filter(|v| !v.is_empty())
    }

    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let kind = if self.driver.is_empty() {
            errors.push("Database driver is required".to_string());
            None
        } else {
            match self.driver_kind() {
                Ok(kind) => Some(kind),
                Err(e) => {
                    errors.push(e.to_string());
                    None
                }
            }
        };
        if self.url().is_none() {
            if self.database.as_deref().is_none_or(str::is_empty) {
                errors.push("Database name is required when no url is given".to_string());
            }
            if let Some(protocol) = &self.protocol
                && !matches!(protocol.as_str(), "" | "tcp" | "unix")
            {
                errors.push(format!(
                    "Unsupported protocol '{}' only [tcp unix] are supported",
                    protocol
                ));
            }
        }
        if self.tls_config.is_some() && kind.is_some_and(|v| v != DriverKind::Postgres) {
            errors.push("TLS config is only supported by the postgres driver".to_string());
        }
        errors
    }

    /// The url handed to the executor, either the configured one or one built from the parts.
    pub fn connection_url(&self) -> Result<String> {
        if let Some(url) = self.url() {
            return Ok(url.to_string());
        }
        let kind = self.driver_kind()?;
        let database = self
            .database
            .as_deref()
            .filter(|v| !v.is_empty())
            .context("Database name is required when no url is given")?;
        let mut params = self.params.clone();
        if kind == DriverKind::Sqlite {
            let mut url = format!("{}://{}", kind.scheme(), database);
            if !params.is_empty() {
                let query = form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(&params)
                    .finish();
                url.push('?');
                url.push_str(&query);
            }
            return Ok(url);
        }
        let host = self.host.as_deref().filter(|v| !v.is_empty());
        let port = match self.port.as_deref().filter(|v| !v.is_empty()) {
            Some(port) => Some(
                port.parse::<u16>()
                    .with_context(|| format!("Invalid database port `{}`", port))?,
            ),
            None => None,
        };
        let username = self.username.as_deref().filter(|v| !v.is_empty());
        let password = self.password.as_deref().filter(|v| !v.is_empty());
        let unix = self.protocol.as_deref() == Some("unix");
        // Postgres sockets go without authority, the directory travels in `host`
        let postgres_socket = unix && kind == DriverKind::Postgres;
        let authority = if postgres_socket { "" } else { "localhost" };
        let mut url = Url::parse(&format!("{}://{}", kind.scheme(), authority))
            .with_context(|| format!("While building the {} connection url", kind))?;
        if postgres_socket {
            for (key, value) in [
                ("host", host),
                ("user", username),
                ("password", password),
            ] {
                if let Some(value) = value {
                    params.insert(key.into(), value.into());
                }
            }
            if let Some(port) = port {
                params.insert("port".into(), port.to_string());
            }
        } else {
            if unix {
                if let Some(socket) = host {
                    params.insert("socket".into(), socket.into());
                }
            } else if let Some(host) = host {
                url.set_host(Some(host))
                    .with_context(|| format!("Invalid database host `{}`", host))?;
            }
            url.set_port(port.or(kind.default_port()))
                .map_err(|_| Error::msg("Cannot set the database port"))?;
            if let Some(username) = username {
                url.set_username(username).map_err(|_| {
                    Error::msg(format!("Invalid database username `{}`", username))
                })?;
                url.set_password(password)
                    .map_err(|_| Error::msg("Invalid database password"))?;
            }
        }
        url.set_path(database);
        if let Some(tls) = &self.tls_config {
            for (key, value) in [
                ("sslmode", &tls.ssl_mode),
                ("sslrootcert", &tls.ca_file),
                ("sslkey", &tls.key_file),
                ("sslcert", &tls.cert_file),
            ] {
                if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                    params.insert(key.into(), value.into());
                }
            }
        }
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(&params);
        }
        Ok(url.into())
    }
}

// crates/rule-store-rqlite/src/client.rs
// ============================================================================
// Module: rqlite Statement Client
// Description: SqlClient implementation over the rqlite HTTP API.
// Purpose: Send parameterized rule table statements to an rqlite node.
// Dependencies: rule-store-core, reqwest, serde, serde_json, url
// ============================================================================

//! ## Overview
//! [`RqliteClient`] speaks the rqlite data API: `GET /status` to verify the
//! node on connect, `POST /db/execute` for writes, and `POST /db/query` for
//! reads. Each statement is sent as `[["SQL", param, ...]]` so values never
//! appear in SQL text. Credentials embedded in the address are removed from
//! the URL and sent as basic auth. Redirects are not followed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::blocking::RequestBuilder;
use reqwest::redirect::Policy;
use rule_store_core::SqlClient;
use rule_store_core::SqlClientError;
use rule_store_core::SqlRow;
use rule_store_core::Statement;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::config::RqliteConfig;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// User agent sent with every request.
const USER_AGENT: &str = concat!("rule-store-rqlite/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// Top-level rqlite response envelope.
#[derive(Debug, Deserialize)]
struct RqliteResponse {
    /// One result per submitted statement.
    #[serde(default)]
    results: Vec<StatementResult>,
    /// Request-level failure reported by the node.
    #[serde(default)]
    error: Option<String>,
}

/// Result for a single statement.
#[derive(Debug, Deserialize)]
struct StatementResult {
    /// Statement-level failure.
    #[serde(default)]
    error: Option<String>,
    /// Rows changed by a write.
    #[serde(default)]
    rows_affected: u64,
    /// Row values for a read.
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Basic-auth credentials taken from the address userinfo.
#[derive(Clone)]
struct Credentials {
    /// Username.
    username: String,
    /// Optional password.
    password: Option<String>,
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// Statement client for one rqlite node.
///
/// # Invariants
/// - Endpoint URLs carry no userinfo.
/// - `closed` only moves from false to true.
pub struct RqliteClient {
    /// Blocking HTTP client.
    http: Client,
    /// `/status` endpoint.
    status_url: Url,
    /// `/db/execute` endpoint.
    execute_url: Url,
    /// `/db/query` endpoint including the consistency level.
    query_url: Url,
    /// Basic-auth credentials, when the address embeds them.
    credentials: Option<Credentials>,
    /// Set once the client has been closed.
    closed: AtomicBool,
}

impl RqliteClient {
    /// Builds a client for `config.address` and checks the node responds.
    ///
    /// # Errors
    ///
    /// Returns [`SqlClientError::Transport`] when the address is malformed or
    /// the node cannot be reached, and [`SqlClientError::Status`] when the
    /// status endpoint answers with a non-success code.
    pub fn connect(config: &RqliteConfig) -> Result<Self, SqlClientError> {
        let client = Self::new(config)?;
        let response = client
            .authorize(client.http.get(client.status_url.as_str()))
            .send()
            .map_err(|err| SqlClientError::Transport(format!("rqlite status request: {err}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(SqlClientError::Status(format!("rqlite status check returned {status}")));
        }
        Ok(client)
    }

    /// Builds a client without contacting the node.
    ///
    /// # Errors
    ///
    /// Returns [`SqlClientError::Transport`] when the address is malformed or
    /// the HTTP client cannot be built.
    pub fn new(config: &RqliteConfig) -> Result<Self, SqlClientError> {
        let (base, credentials) = parse_address(&config.address)?;
        let mut query_url = join(&base, "db/query")?;
        query_url.query_pairs_mut().append_pair("level", config.read_consistency.as_str());
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(USER_AGENT)
            .redirect(Policy::none())
            .build()
            .map_err(|err| SqlClientError::Transport(format!("http client build failed: {err}")))?;
        Ok(Self {
            http,
            status_url: join(&base, "status")?,
            execute_url: join(&base, "db/execute")?,
            query_url,
            credentials,
            closed: AtomicBool::new(false),
        })
    }

    /// Attaches credentials to a request when configured.
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some(credentials) => {
                request.basic_auth(&credentials.username, credentials.password.as_deref())
            }
            None => request,
        }
    }

    /// Posts one statement and returns its result.
    fn post(&self, url: &Url, statement: &Statement) -> Result<StatementResult, SqlClientError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(SqlClientError::Closed);
        }
        let response = self
            .authorize(self.http.post(url.as_str()))
            .json(&statement_body(statement))
            .send()
            .map_err(|err| SqlClientError::Transport(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(SqlClientError::Status(status.to_string()));
        }
        let envelope: RqliteResponse =
            response.json().map_err(|err| SqlClientError::Decode(err.to_string()))?;
        if let Some(error) = envelope.error {
            return Err(SqlClientError::Statement(error));
        }
        let result = envelope
            .results
            .into_iter()
            .next()
            .ok_or_else(|| SqlClientError::Decode("rqlite response has no results".to_string()))?;
        if let Some(error) = result.error {
            return Err(SqlClientError::Statement(error));
        }
        Ok(result)
    }
}

impl SqlClient for RqliteClient {
    fn execute(&self, statement: &Statement) -> Result<u64, SqlClientError> {
        self.post(&self.execute_url, statement).map(|result| result.rows_affected)
    }

    fn query(&self, statement: &Statement) -> Result<Vec<SqlRow>, SqlClientError> {
        let result = self.post(&self.query_url, statement)?;
        result
            .values
            .into_iter()
            .map(|row| row.into_iter().map(json_text).collect::<Result<SqlRow, _>>())
            .collect()
    }

    fn close(&self) -> Result<(), SqlClientError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses the node address, splitting off any userinfo.
fn parse_address(address: &str) -> Result<(Url, Option<Credentials>), SqlClientError> {
    let mut url = Url::parse(address.trim())
        .map_err(|err| SqlClientError::Transport(format!("invalid rqlite address: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(SqlClientError::Transport(
            "rqlite address must be an http or https URL with a host".to_string(),
        ));
    }
    let credentials = (!url.username().is_empty()).then(|| Credentials {
        username: url.username().to_string(),
        password: url.password().map(str::to_string),
    });
    url.set_username("")
        .and_then(|()| url.set_password(None))
        .map_err(|()| SqlClientError::Transport("rqlite address userinfo rejected".to_string()))?;
    url.set_query(None);
    url.set_fragment(None);
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok((url, credentials))
}

/// Joins a relative endpoint path onto the base URL.
fn join(base: &Url, path: &str) -> Result<Url, SqlClientError> {
    base.join(path).map_err(|err| SqlClientError::Transport(format!("invalid endpoint: {err}")))
}

/// Builds the `[["SQL", params...]]` request body.
fn statement_body(statement: &Statement) -> [Vec<&str>; 1] {
    let mut entry = Vec::with_capacity(statement.params.len() + 1);
    entry.push(statement.sql.as_str());
    entry.extend(statement.params.iter().map(String::as_str));
    [entry]
}

/// Converts a JSON column value to optional text.
fn json_text(value: Value) -> Result<Option<String>, SqlClientError> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) => Ok(Some(text)),
        Value::Number(number) => Ok(Some(number.to_string())),
        Value::Bool(flag) => Ok(Some(flag.to_string())),
        Value::Array(_) | Value::Object(_) => {
            Err(SqlClientError::Decode("rqlite column value is not a scalar".to_string()))
        }
    }
}

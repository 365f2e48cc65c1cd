//! HTTP clients for the SW360 REST API and the `CouchDB` document store.
//!
//! Both clients carry fixed JSON headers, Basic credentials and one request timeout. Transport
//! errors pass through [`sanitize_reqwest_error`] so the password-grant query never reaches logs.

use crate::config::{BasicCredentials, Settings};
use crate::error::{Error, Result};
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// REST path under which API client records are created, listed and deleted.
pub const CLIENT_MANAGEMENT: &str = "authorization/client-management";
/// OAuth2 token endpoint used for the password grant.
pub const TOKEN_ENDPOINT: &str = "authorization/oauth/token";
/// Single ceiling for every request; SW360 instances can be very slow to answer.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(3600);

/// Basic-authenticated client for the SW360 REST API.
///
/// Holding one proves the admin credentials were present: construction fails otherwise, so no
/// request can go out without them.
#[derive(Clone)]
pub struct Sw360Client {
    host: String,
    credentials: BasicCredentials,
    http: reqwest::Client,
}

impl Sw360Client {
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the admin user or password is missing, or if the host is not a
    /// valid URL.
    pub fn new(settings: &Settings) -> Result<Self> {
        let credentials = settings.admin_credentials()?;
        Ok(Self {
            host: normalize_host(&settings.host)?,
            credentials,
            http: build_http()?,
        })
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Admin credentials used for every call without an explicit override.
    #[must_use]
    pub fn credentials(&self) -> &BasicCredentials {
        &self.credentials
    }

    fn url(&self, endpoint: &str) -> Result<Url> {
        endpoint_url(&self.host, endpoint)
    }

    /// GET `endpoint` (client-management when `None`).
    ///
    /// `auth` replaces the admin pair; only the token exchange authenticates as someone else.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the request could not be completed.
    pub async fn get(
        &self,
        endpoint: Option<&str>,
        query: &[(&str, &str)],
        auth: Option<&BasicCredentials>,
    ) -> Result<reqwest::Response> {
        let endpoint = endpoint.unwrap_or(CLIENT_MANAGEMENT);
        let auth = auth.unwrap_or(&self.credentials);
        let mut req = self
            .http
            .get(self.url(endpoint)?)
            .basic_auth(&auth.username, Some(&auth.password));
        if !query.is_empty() {
            req = req.query(query);
        }
        let resp = req.send().await?;
        info!(method = "GET", endpoint, status = resp.status().as_u16());
        Ok(resp)
    }

    /// POST a JSON `body` to `endpoint` (client-management when `None`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the request could not be completed.
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        endpoint: Option<&str>,
        body: &B,
    ) -> Result<reqwest::Response> {
        let endpoint = endpoint.unwrap_or(CLIENT_MANAGEMENT);
        let resp = self
            .http
            .post(self.url(endpoint)?)
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .json(body)
            .send()
            .await?;
        info!(method = "POST", endpoint, status = resp.status().as_u16());
        Ok(resp)
    }

    /// DELETE `endpoint` (client-management when `None`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the request could not be completed.
    pub async fn delete(&self, endpoint: Option<&str>) -> Result<reqwest::Response> {
        let endpoint = endpoint.unwrap_or(CLIENT_MANAGEMENT);
        let resp = self.send_delete(self.url(endpoint)?).await?;
        info!(method = "DELETE", endpoint, status = resp.status().as_u16());
        Ok(resp)
    }

    /// DELETE one API client record. `client_id` always lands in a single, percent-encoded path
    /// segment below the client-management endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an id that cannot name a single segment (empty, `.`, `..`)
    /// and [`Error::Transport`] if the request could not be completed.
    pub async fn delete_record(&self, client_id: &str) -> Result<reqwest::Response> {
        let url = record_url(&self.host, CLIENT_MANAGEMENT, client_id)?;
        let resp = self.send_delete(url).await?;
        info!(
            method = "DELETE",
            endpoint = CLIENT_MANAGEMENT,
            client_id,
            status = resp.status().as_u16()
        );
        Ok(resp)
    }

    async fn send_delete(&self, url: Url) -> Result<reqwest::Response> {
        Ok(self
            .http
            .delete(url)
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .send()
            .await?)
    }
}

/// Client for the `CouchDB` document store, authenticated with the store's own credentials.
#[derive(Clone)]
pub struct DocumentStoreClient {
    host: String,
    credentials: BasicCredentials,
    http: reqwest::Client,
}

impl DocumentStoreClient {
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the `CouchDB` credentials are empty or the host is invalid.
    pub fn new(settings: &Settings) -> Result<Self> {
        let credentials = settings.couchdb_credentials()?;
        Ok(Self {
            host: normalize_host(&settings.couchdb_host)?,
            credentials,
            http: build_http()?,
        })
    }

    /// PUT a JSON document at `path` (`<database>/<doc id>`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the request could not be completed.
    pub async fn put<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response> {
        let resp = self
            .http
            .put(endpoint_url(&self.host, path)?)
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .json(body)
            .send()
            .await?;
        info!(method = "PUT", path, status = resp.status().as_u16());
        Ok(resp)
    }
}

fn build_http() -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(Error::from)
}

fn normalize_host(host: &str) -> Result<String> {
    let trimmed = host.trim_end_matches('/');
    Url::parse(trimmed).map_err(|e| Error::Config(format!("Invalid host '{host}': {e}")))?;
    Ok(trimmed.to_string())
}

fn endpoint_url(host: &str, endpoint: &str) -> Result<Url> {
    let raw = format!("{host}/{}", endpoint.trim_start_matches('/'));
    debug!(url = %raw, "resolved endpoint");
    Url::parse(&raw).map_err(|e| Error::Config(format!("Invalid endpoint URL '{raw}': {e}")))
}

fn record_url(host: &str, collection: &str, id: &str) -> Result<Url> {
    if matches!(id, "" | "." | "..") {
        return Err(Error::Config(format!("Invalid client id '{id}'")));
    }
    let mut url = endpoint_url(host, collection)?;
    url.path_segments_mut()
        .map_err(|()| Error::Config(format!("Host '{host}' cannot carry a path")))?
        .push(id);
    Ok(url)
}

#[must_use]
pub fn redact_url(url: &Url) -> String {
    let mut u = url.clone();
    // The token exchange carries the admin password in the query.
    let _ = u.set_username("");
    let _ = u.set_password(None);
    u.set_query(None);
    u.set_fragment(None);
    u.to_string()
}

#[must_use]
pub fn sanitize_reqwest_error(e: &reqwest::Error) -> String {
    let mut msg = e.to_string();
    if let Some(u) = e.url() {
        msg = msg.replace(u.as_str(), &redact_url(u));
    }
    msg
}

//! API client records under the SW360 client-management endpoint.

use crate::api::Sw360Client;
use crate::error::{Error, Result};
use reqwest::StatusCode;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::error;

/// One year, in seconds. Used for both token validities of new clients.
pub const TOKEN_VALIDITY_SECS: u64 = 31_536_000;

/// An OAuth2 client registered on the SW360 server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiClientRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub client_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub client_secret: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub authorities: BTreeSet<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub scope: BTreeSet<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub access_token_validity: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub refresh_token_validity: u64,
}

/// Missing and `null` both read as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Body submitted when creating an API client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewApiClient {
    pub description: String,
    pub authorities: Vec<String>,
    pub scope: Vec<String>,
    pub access_token_validity: u64,
    pub refresh_token_validity: u64,
}

impl NewApiClient {
    /// The fixed template: `BASIC` authority, `READ`/`WRITE` scope, one-year tokens.
    pub fn with_description(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            authorities: vec!["BASIC".to_string()],
            scope: vec!["READ".to_string(), "WRITE".to_string()],
            access_token_validity: TOKEN_VALIDITY_SECS,
            refresh_token_validity: TOKEN_VALIDITY_SECS,
        }
    }
}

/// What a delete command should remove.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    One(String),
    All,
}

impl DeleteTarget {
    /// `all` wins over an explicit id. `None` means nothing was asked for.
    #[must_use]
    pub fn from_args(client_id: Option<String>, all: bool) -> Option<Self> {
        if all {
            return Some(Self::All);
        }
        client_id.filter(|id| !id.is_empty()).map(Self::One)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub client_id: String,
    pub status: u16,
}

/// Fetch the client-management listing as the server sent it, failing with [`Error::Status`] on
/// anything but `200 OK`.
///
/// # Errors
///
/// Returns [`Error::Status`] on a non-200 answer, [`Error::Transport`] if the request fails and
/// [`Error::Json`] if the body is not a JSON list.
pub async fn try_list_raw(client: &Sw360Client) -> Result<Vec<Value>> {
    let resp = client.get(None, &[], None).await?;
    let status = resp.status();
    if status != StatusCode::OK {
        return Err(Error::Status(status.as_u16()));
    }
    let body = resp.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

/// List every API client as typed records, failing with [`Error::Status`] on anything but
/// `200 OK`.
///
/// # Errors
///
/// As [`try_list_raw`], plus [`Error::Json`] if an entry is not a record object.
pub async fn try_list_credentials(client: &Sw360Client) -> Result<Vec<ApiClientRecord>> {
    try_list_raw(client)
        .await?
        .into_iter()
        .map(|entry| serde_json::from_value(entry).map_err(Error::from))
        .collect()
}

/// The raw listing. A non-200 answer is logged and reads as an empty list.
///
/// # Errors
///
/// Returns [`Error::Transport`] or [`Error::Json`]; status failures are swallowed.
pub async fn list_raw(client: &Sw360Client) -> Result<Vec<Value>> {
    empty_on_status(try_list_raw(client).await)
}

/// List every API client. A non-200 answer is logged and reads as an empty list.
///
/// # Errors
///
/// Returns [`Error::Transport`] or [`Error::Json`]; status failures are swallowed.
pub async fn list_credentials(client: &Sw360Client) -> Result<Vec<ApiClientRecord>> {
    empty_on_status(try_list_credentials(client).await)
}

fn empty_on_status<T>(listed: Result<Vec<T>>) -> Result<Vec<T>> {
    match listed {
        Err(Error::Status(code)) => {
            error!("Error code: {code}");
            Ok(Vec::new())
        }
        other => other,
    }
}

/// Register a new API client described by `description`.
///
/// Returns the created record as the server sent it, or `None` if the server refused.
///
/// # Errors
///
/// Returns [`Error::Transport`] if the request fails and [`Error::Json`] if a `200` body is not
/// JSON.
pub async fn create_credentials(client: &Sw360Client, description: &str) -> Result<Option<Value>> {
    let resp = client
        .post(None, &NewApiClient::with_description(description))
        .await?;
    if resp.status() != StatusCode::OK {
        error!("Cant connect to SW360 instance.");
        return Ok(None);
    }
    let body = resp.bytes().await?;
    Ok(Some(serde_json::from_slice(&body)?))
}

/// Delete one API client, or every listed one.
///
/// Statuses are reported per id and never interpreted.
///
/// # Errors
///
/// Returns [`Error::Transport`] if any request fails; earlier deletions are not rolled back.
pub async fn delete_credentials(
    client: &Sw360Client,
    target: &DeleteTarget,
) -> Result<Vec<DeleteOutcome>> {
    let ids: Vec<String> = match target {
        DeleteTarget::One(id) => vec![id.clone()],
        DeleteTarget::All => list_credentials(client)
            .await?
            .into_iter()
            .map(|record| record.client_id)
            .collect(),
    };

    let mut outcomes = Vec::with_capacity(ids.len());
    for client_id in ids {
        let resp = client.delete_record(&client_id).await?;
        outcomes.push(DeleteOutcome {
            client_id,
            status: resp.status().as_u16(),
        });
    }
    Ok(outcomes)
}

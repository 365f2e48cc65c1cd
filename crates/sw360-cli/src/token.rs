//! Password-grant token exchange and ORT configuration minting.

use crate::api::{Sw360Client, TOKEN_ENDPOINT};
use crate::config::BasicCredentials;
use crate::credentials::{ApiClientRecord, list_credentials};
use crate::error::{Error, Result};
use crate::output::RenderedConfig;
use serde::{Deserialize, Serialize};
use clap::ValueEnum as _;
use serde_json::Value;
use std::fmt;
use tracing::debug;

/// Which record field a target identifier is compared against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum MatchField {
    /// The free-text description given at creation time.
    #[default]
    Description,
    /// The server-assigned client id.
    ClientId,
}

impl fmt::Display for MatchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_possible_value() {
            Some(value) => f.write_str(value.get_name()),
            None => Ok(()),
        }
    }
}

impl MatchField {
    fn value<'a>(self, record: &'a ApiClientRecord) -> &'a str {
        match self {
            Self::Description => &record.description,
            Self::ClientId => &record.client_id,
        }
    }
}

/// Token endpoint answer. Everything besides `access_token` is kept as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenResult {
    pub access_token: String,
    #[serde(flatten)]
    pub metadata: serde_json::Map<String, Value>,
}

impl AccessTokenResult {
    /// # Errors
    ///
    /// Returns [`Error::Shape`] unless `body` is an object with a string `access_token`.
    pub fn from_response(body: Value) -> Result<Self> {
        match body.get("access_token") {
            Some(Value::String(_)) => Ok(serde_json::from_value(body)?),
            _ => Err(Error::Shape(
                "token response has no access_token".to_string(),
            )),
        }
    }
}

/// First record whose `field` equals `target`.
#[must_use]
pub fn find_record<'a>(
    records: &'a [ApiClientRecord],
    target: &str,
    field: MatchField,
) -> Option<&'a ApiClientRecord> {
    records.iter().find(|record| field.value(record) == target)
}

/// Exchange `record`'s client credentials plus the admin's password for an access token.
///
/// # Errors
///
/// Returns [`Error::Transport`] if the request fails, [`Error::Json`] if the body is not JSON and
/// [`Error::Shape`] if it carries no access token.
pub async fn exchange_token(
    client: &Sw360Client,
    record: &ApiClientRecord,
) -> Result<AccessTokenResult> {
    let client_auth = BasicCredentials::new(&record.client_id, &record.client_secret);
    let admin = client.credentials();
    let query = [
        ("grant_type", "password"),
        ("username", admin.username.as_str()),
        ("password", admin.password.as_str()),
    ];
    debug!(client_id = %record.client_id, "requesting password grant");
    let resp = client
        .get(Some(TOKEN_ENDPOINT), &query, Some(&client_auth))
        .await?;
    let body = resp.bytes().await?;
    AccessTokenResult::from_response(serde_json::from_slice(&body)?)
}

/// How `mint_ort_config` picks its record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintRequest {
    pub target: String,
    pub match_field: MatchField,
    /// Fail instead of returning `None` when nothing matches.
    pub strict: bool,
}

/// Find the API client for `request`, mint a token for it and build the ORT configuration.
///
/// Without `strict`, no matching record yields `Ok(None)` and nothing is logged.
///
/// # Errors
///
/// Returns [`Error::NoMatch`] in strict mode when no record matches, plus any error of
/// [`exchange_token`].
pub async fn mint_ort_config(
    client: &Sw360Client,
    request: &MintRequest,
) -> Result<Option<RenderedConfig>> {
    let records = list_credentials(client).await?;
    let Some(record) = find_record(&records, &request.target, request.match_field) else {
        if request.strict {
            return Err(Error::NoMatch(format!(
                "no API client with {} '{}'",
                request.match_field, request.target
            )));
        }
        return Ok(None);
    };

    let token = exchange_token(client, record).await?;
    Ok(Some(RenderedConfig::new(
        client.host(),
        client.credentials(),
        record,
        &token,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(client_id: &str, description: &str) -> ApiClientRecord {
        ApiClientRecord {
            client_id: client_id.to_string(),
            client_secret: format!("{client_id}-secret"),
            description: description.to_string(),
            ..ApiClientRecord::default()
        }
    }

    #[test]
    fn find_record_matches_description_first_hit() {
        let records = vec![
            record("a", "OTHER"),
            record("b", "PLATOSS"),
            record("c", "PLATOSS"),
        ];
        let hit = find_record(&records, "PLATOSS", MatchField::Description).expect("match");
        assert_eq!(hit.client_id, "b");
        assert!(find_record(&records, "b", MatchField::Description).is_none());
    }

    #[test]
    fn find_record_by_client_id() {
        let records = vec![record("a", "PLATOSS"), record("b", "PLATOSS")];
        let hit = find_record(&records, "b", MatchField::ClientId).expect("match");
        assert_eq!(hit.client_id, "b");
    }

    #[test]
    fn match_field_displays_its_flag_value() {
        assert_eq!(MatchField::Description.to_string(), "description");
        assert_eq!(MatchField::ClientId.to_string(), "client-id");
    }

    #[test]
    fn token_response_keeps_metadata() {
        let token = AccessTokenResult::from_response(json!({
            "access_token": "T",
            "token_type": "bearer",
            "expires_in": 31_535_999,
        }))
        .expect("valid token");
        assert_eq!(token.access_token, "T");
        assert_eq!(token.metadata.get("token_type"), Some(&json!("bearer")));
    }

    #[test]
    fn token_response_without_access_token_is_a_shape_error() {
        for body in [
            json!({"error": "unauthorized"}),
            json!({"access_token": 42}),
            json!(["T"]),
        ] {
            let err = AccessTokenResult::from_response(body).unwrap_err();
            assert!(matches!(err, Error::Shape(_)));
        }
    }
}

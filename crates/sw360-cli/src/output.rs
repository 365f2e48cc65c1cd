//! Rendering of command results: pretty JSON for people, YAML for ORT.

use crate::config::BasicCredentials;
use crate::credentials::ApiClientRecord;
use crate::error::Result;
use crate::token::AccessTokenResult;
use owo_colors::OwoColorize;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Write as _;
use std::io::Write;

/// Connector tag ORT expects for SW360.
pub const CONNECTOR_TYPE: &str = "SW360";

/// ORT SW360 connector configuration. Field order is the serialized key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedConfig {
    #[serde(rename = "type")]
    pub connector_type: String,
    pub options: ConnectorOptions,
    pub secrets: ConnectorSecrets,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorOptions {
    pub rest_url: String,
    pub auth_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorSecrets {
    pub username: String,
    pub password: String,
    pub client_id: String,
    pub client_password: String,
    pub token: String,
}

impl RenderedConfig {
    #[must_use]
    pub fn new(
        host: &str,
        admin: &BasicCredentials,
        record: &ApiClientRecord,
        token: &AccessTokenResult,
    ) -> Self {
        Self {
            connector_type: CONNECTOR_TYPE.to_string(),
            options: ConnectorOptions {
                rest_url: format!("{host}/resource/api"),
                auth_url: format!("{host}/resource/api/authorization/client-management"),
            },
            secrets: ConnectorSecrets {
                username: admin.username.clone(),
                password: admin.password.clone(),
                client_id: record.client_id.clone(),
                client_password: record.client_secret.clone(),
                token: token.access_token.clone(),
            },
        }
    }

    /// # Errors
    ///
    /// Returns [`crate::Error::Yaml`] if serialization fails.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Destination for command results.
pub struct Output<W: Write> {
    writer: W,
    color: bool,
}

impl<W: Write> Output<W> {
    pub fn new(writer: W, color: bool) -> Self {
        Self { writer, color }
    }

    /// Uncoloured output, as used when stdout is not a terminal.
    pub fn plain(writer: W) -> Self {
        Self::new(writer, false)
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    /// # Errors
    ///
    /// Returns an error if `value` cannot be represented as JSON or the write fails.
    pub fn pretty<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        let rendered = pretty_json(&value, self.color)?;
        writeln!(self.writer, "{rendered}")?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if YAML serialization or the write fails.
    pub fn yaml(&mut self, config: &RenderedConfig) -> Result<()> {
        let rendered = config.to_yaml()?;
        write!(self.writer, "{rendered}")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Two-space indented JSON, optionally syntax-coloured.
///
/// # Errors
///
/// Returns [`crate::Error::Json`] if plain rendering fails.
pub fn pretty_json(value: &Value, color: bool) -> Result<String> {
    if !color {
        return Ok(serde_json::to_string_pretty(value)?);
    }
    let mut out = String::new();
    write_colored(&mut out, value, 0);
    Ok(out)
}

fn write_colored(out: &mut String, value: &Value, depth: usize) {
    let pad = "  ".repeat(depth + 1);
    let close_pad = "  ".repeat(depth);
    // Writes into a String cannot fail.
    match value {
        Value::Null => {
            let _ = write!(out, "{}", "null".magenta());
        }
        Value::Bool(b) => {
            let _ = write!(out, "{}", b.magenta());
        }
        Value::Number(n) => {
            let _ = write!(out, "{}", n.blue());
        }
        Value::String(_) => {
            let _ = write!(out, "{}", value.to_string().green());
        }
        Value::Array(items) if items.is_empty() => out.push_str("[]"),
        Value::Array(items) => {
            out.push_str("[\n");
            for (i, item) in items.iter().enumerate() {
                out.push_str(&pad);
                write_colored(out, item, depth + 1);
                out.push_str(if i + 1 < items.len() { ",\n" } else { "\n" });
            }
            out.push_str(&close_pad);
            out.push(']');
        }
        Value::Object(map) if map.is_empty() => out.push_str("{}"),
        Value::Object(map) => {
            out.push_str("{\n");
            for (i, (key, item)) in map.iter().enumerate() {
                out.push_str(&pad);
                let _ = write!(out, "{}: ", Value::String(key.clone()).to_string().cyan());
                write_colored(out, item, depth + 1);
                out.push_str(if i + 1 < map.len() { ",\n" } else { "\n" });
            }
            out.push_str(&close_pad);
            out.push('}');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_config(token: &str) -> RenderedConfig {
        let record = ApiClientRecord {
            client_id: "abc123".to_string(),
            client_secret: "s3cret".to_string(),
            description: "PLATOSS".to_string(),
            ..ApiClientRecord::default()
        };
        let token = AccessTokenResult {
            access_token: token.to_string(),
            metadata: serde_json::Map::new(),
        };
        RenderedConfig::new(
            "http://localhost:8080",
            &BasicCredentials::new("admin@sw360.org", "changeme"),
            &record,
            &token,
        )
    }

    #[test]
    fn yaml_keeps_declared_key_order() {
        let yaml = sample_config("T").to_yaml().expect("yaml");
        assert_eq!(
            yaml,
            "type: SW360\n\
             options:\n  \
               restUrl: http://localhost:8080/resource/api\n  \
               authUrl: http://localhost:8080/resource/api/authorization/client-management\n\
             secrets:\n  \
               username: admin@sw360.org\n  \
               password: changeme\n  \
               clientId: abc123\n  \
               clientPassword: s3cret\n  \
               token: T\n"
        );
    }

    #[test]
    fn yaml_round_trips_special_characters() {
        for token in [
            "a: b",
            "# not a comment",
            "'quoted' \"twice\"",
            "  leading space",
            "null",
            "true",
            "- dash",
            "multi\nline",
            "{braces}",
            "",
        ] {
            let config = sample_config(token);
            let yaml = config.to_yaml().expect("yaml");
            let parsed: RenderedConfig = serde_yaml::from_str(&yaml).expect("parse back");
            assert_eq!(parsed, config, "token {token:?} did not survive");
        }
    }

    #[test]
    fn plain_pretty_matches_serde_json() {
        let value = json!({"client_id": "a", "scope": ["READ", "WRITE"], "n": 1, "x": null});
        assert_eq!(
            pretty_json(&value, false).expect("render"),
            serde_json::to_string_pretty(&value).expect("render")
        );
    }

    #[test]
    fn coloured_pretty_keeps_the_text() {
        let value = json!({"client_id": "a", "scope": [], "ok": true});
        let coloured = pretty_json(&value, true).expect("render");
        assert!(coloured.contains("\u{1b}["));
        assert!(coloured.contains("client_id"));
        assert!(coloured.contains("[]"));
    }

    #[test]
    fn output_writes_to_the_given_writer() {
        let mut out = Output::plain(Vec::new());
        out.pretty(&json!([{"clientId": "a", "status": 200}]))
            .expect("pretty");
        let text = String::from_utf8(out.into_inner()).expect("utf8");
        assert!(text.ends_with("]\n"));
        assert!(text.contains("\"status\": 200"));
    }
}

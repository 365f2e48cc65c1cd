//! Administrative user documents written straight into `CouchDB`.

use crate::api::DocumentStoreClient;
use crate::error::Result;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info};

/// Database and document id the user document is written to.
pub const USER_DOCUMENT_PATH: &str = "sw360oauthclients/e82d846d5cf00995f944651c23001f91";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserGroup {
    User,
    Admin,
}

/// SW360 user document. Values are strings on the wire, flags included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDocument {
    #[serde(rename = "type")]
    pub doc_type: String,
    pub email: String,
    pub user_group: UserGroup,
    #[serde(rename = "externalid")]
    pub external_id: String,
    #[serde(rename = "fullname")]
    pub full_name: String,
    #[serde(rename = "givenname")]
    pub given_name: String,
    #[serde(rename = "lastname")]
    pub last_name: String,
    pub department: String,
    pub wants_mail_notification: String,
    pub deactivated: String,
    pub isset_bitfield: String,
}

impl Default for UserDocument {
    fn default() -> Self {
        Self {
            doc_type: "user".to_string(),
            email: "test.client@sw360.org".to_string(),
            user_group: UserGroup::User,
            external_id: "z1234567".to_string(),
            full_name: "Test Client".to_string(),
            given_name: "Test".to_string(),
            last_name: "Client".to_string(),
            department: "DEPARTMENT".to_string(),
            wants_mail_notification: "true".to_string(),
            deactivated: "false".to_string(),
            isset_bitfield: "1".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    /// Accepted for compatibility; the document has no login field.
    pub login: String,
    pub admin: bool,
}

impl UserDocument {
    /// The template with only `email` and `userGroup` replaced.
    #[must_use]
    pub fn for_user(user: &NewUser) -> Self {
        Self {
            email: user.email.clone(),
            user_group: if user.admin {
                UserGroup::Admin
            } else {
                UserGroup::User
            },
            ..Self::default()
        }
    }
}

/// PUT the user document for `user`.
///
/// # Errors
///
/// Returns [`crate::Error::Transport`] if the request fails. Refusals are logged, not returned.
pub async fn upsert_user(store: &DocumentStoreClient, user: &NewUser) -> Result<()> {
    let doc = UserDocument::for_user(user);
    debug!(login = %user.login, "login is not part of the user document");
    let rendered = serde_json::to_string(&doc)?;
    info!(document = %rendered, "user document");

    let resp = store.put(USER_DOCUMENT_PATH, &doc).await?;
    if resp.status() == StatusCode::OK {
        info!("Users created successfully.");
        return Ok(());
    }

    let body = resp.json::<Value>().await.ok();
    let reason = match body.as_ref().and_then(|b| b.get("error")) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "None".to_string(),
    };
    error!("Error occurred while creating Users: {reason}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn template_serializes_with_document_keys() {
        let doc = serde_json::to_value(UserDocument::default()).expect("json");
        assert_eq!(
            doc,
            json!({
                "type": "user",
                "email": "test.client@sw360.org",
                "userGroup": "USER",
                "externalid": "z1234567",
                "fullname": "Test Client",
                "givenname": "Test",
                "lastname": "Client",
                "department": "DEPARTMENT",
                "wantsMailNotification": "true",
                "deactivated": "false",
                "issetBitfield": "1",
            })
        );
    }

    #[test]
    fn for_user_overrides_only_email_and_group() {
        let doc = UserDocument::for_user(&NewUser {
            email: "boss@sw360.org".to_string(),
            login: "boss".to_string(),
            admin: true,
        });
        assert_eq!(doc.email, "boss@sw360.org");
        assert_eq!(doc.user_group, UserGroup::Admin);
        assert_eq!(
            UserDocument {
                email: UserDocument::default().email,
                user_group: UserGroup::User,
                ..doc
            },
            UserDocument::default()
        );
    }
}

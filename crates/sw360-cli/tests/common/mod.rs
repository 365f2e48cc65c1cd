#![allow(dead_code, unused_imports)]

use clap::Parser as _;
use serde_json::{Value, json};
use sw360_utils::cli::{self, Cli};
use sw360_utils::config::Settings;
use sw360_utils::output::Output;

pub use sw360_test_support::{LogCapture, RecordedRequest, StubServer};

pub const ADMIN_USER: &str = "setup@sw360.org";
pub const ADMIN_PASSWORD: &str = "sw360fossy";
pub const CLIENT_MANAGEMENT_PATH: &str = "/authorization/client-management";
pub const TOKEN_PATH: &str = "/authorization/oauth/token";

/// Settings pointing both SW360 and `CouchDB` at `server`, with admin credentials.
pub fn settings_for(server: &StubServer) -> Settings {
    Settings {
        host: server.base_url().to_string(),
        user: Some(ADMIN_USER.to_string()),
        password: Some(ADMIN_PASSWORD.to_string()),
        couchdb_host: server.base_url().to_string(),
        couchdb_user: "couch".to_string(),
        couchdb_password: "couchpass".to_string(),
    }
}

/// Settings without admin credentials.
pub fn settings_without_admin(server: &StubServer) -> Settings {
    Settings {
        user: None,
        password: None,
        ..settings_for(server)
    }
}

/// Parse `args` like the binary would and run the command, returning what it printed.
pub async fn run_cli(args: &[&str], settings: &Settings) -> sw360_utils::Result<String> {
    let argv = std::iter::once("sw360-utils").chain(args.iter().copied());
    let parsed = Cli::try_parse_from(argv).expect("valid command line");
    let mut out = Output::plain(Vec::new());
    cli::run(parsed.command, settings, &mut out).await?;
    Ok(String::from_utf8(out.into_inner()).expect("utf8 output"))
}

pub fn record_json(client_id: &str, description: &str) -> Value {
    json!({
        "client_id": client_id,
        "client_secret": format!("{client_id}-secret"),
        "description": description,
        "authorities": ["BASIC"],
        "scope": ["READ", "WRITE"],
        "access_token_validity": 31_536_000,
        "refresh_token_validity": 31_536_000,
    })
}

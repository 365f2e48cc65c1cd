//! Command-line surface and dispatch.

use crate::api::{DocumentStoreClient, Sw360Client};
use crate::config::Settings;
use crate::credentials::{DeleteTarget, create_credentials, delete_credentials, list_raw};
use crate::error::Result;
use crate::output::Output;
use crate::token::{MatchField, MintRequest, mint_ort_config};
use crate::user::{NewUser, upsert_user};
use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tracing::error;

/// Default description used for the API client of the ORT integration.
pub const DEFAULT_API_ID: &str = "PLATOSS";

#[derive(Debug, Parser)]
#[command(name = "sw360-utils", version, about = "SW360 API client and user administration")]
pub struct Cli {
    /// Dotenv file consulted for `SW360_*` keys missing from the environment.
    #[arg(long, env = "SW360_ENV_FILE", default_value = ".env", global = true)]
    pub env_file: PathBuf,

    /// Log filter (e.g. `info`, `debug`, `sw360_utils=trace`). `RUST_LOG` takes precedence.
    #[arg(long, env = "SW360_LOG", default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage API client records.
    #[command(subcommand)]
    ApiId(ApiIdCommand),

    /// Render connector configuration for downstream tools.
    #[command(subcommand)]
    Credentials(CredentialsCommand),

    /// Create or promote a user directly in `CouchDB`.
    CreateUser(CreateUserArgs),
}

#[derive(Debug, Subcommand)]
pub enum ApiIdCommand {
    /// Register a new API client.
    Create {
        #[arg(default_value = DEFAULT_API_ID)]
        description: String,
    },
    /// List registered API clients.
    List,
    /// Delete one API client, or all of them.
    Delete {
        client_id: Option<String>,
        /// Delete every listed client; the explicit id is ignored.
        #[arg(long)]
        all_ids: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum CredentialsCommand {
    /// Mint an access token and print an ORT SW360 connector block.
    Ort(OrtArgs),
}

#[derive(Debug, Args)]
pub struct OrtArgs {
    /// Value compared against the field chosen by `--match`.
    #[arg(default_value = DEFAULT_API_ID)]
    pub target: String,

    #[arg(long = "match", value_enum, default_value = "description")]
    pub match_field: MatchField,

    /// Fail when no API client matches instead of printing nothing.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Args)]
pub struct CreateUserArgs {
    #[arg(short, long, default_value = "user@sw360.org")]
    pub email: String,

    /// Currently not written to the user document.
    #[arg(short, long, default_value = "user")]
    pub login: String,

    /// Put the user in the ADMIN group.
    #[arg(short, long)]
    pub admin: bool,
}

/// Execute `command`, writing results to `out`.
///
/// Non-success HTTP statuses are logged and end the command normally; only configuration,
/// transport and response-shape problems come back as errors.
///
/// # Errors
///
/// Returns [`crate::Error::Config`] before any request when credentials are missing, and
/// propagates transport, shape and output errors.
pub async fn run<W: Write>(
    command: Command,
    settings: &Settings,
    out: &mut Output<W>,
) -> Result<()> {
    match command {
        Command::ApiId(cmd) => run_api_id(cmd, settings, out).await,
        Command::Credentials(CredentialsCommand::Ort(args)) => run_ort(args, settings, out).await,
        Command::CreateUser(args) => run_create_user(args, settings).await,
    }
}

async fn run_api_id<W: Write>(
    cmd: ApiIdCommand,
    settings: &Settings,
    out: &mut Output<W>,
) -> Result<()> {
    match cmd {
        ApiIdCommand::Create { description } => {
            let client = Sw360Client::new(settings)?;
            if let Some(created) = create_credentials(&client, &description).await? {
                out.pretty(&created)?;
            }
        }
        ApiIdCommand::List => {
            let client = Sw360Client::new(settings)?;
            let records = list_raw(&client).await?;
            out.pretty(&records)?;
        }
        ApiIdCommand::Delete { client_id, all_ids } => {
            let Some(target) = DeleteTarget::from_args(client_id, all_ids) else {
                error!("No Client ID defined.");
                return Ok(());
            };
            let client = Sw360Client::new(settings)?;
            let outcomes = delete_credentials(&client, &target).await?;
            out.pretty(&outcomes)?;
        }
    }
    Ok(())
}

async fn run_ort<W: Write>(args: OrtArgs, settings: &Settings, out: &mut Output<W>) -> Result<()> {
    let client = Sw360Client::new(settings)?;
    let request = MintRequest {
        target: args.target,
        match_field: args.match_field,
        strict: args.strict,
    };
    if let Some(config) = mint_ort_config(&client, &request).await? {
        out.yaml(&config)?;
    }
    Ok(())
}

async fn run_create_user(args: CreateUserArgs, settings: &Settings) -> Result<()> {
    let store = DocumentStoreClient::new(settings)?;
    let user = NewUser {
        email: args.email,
        login: args.login,
        admin: args.admin,
    };
    upsert_user(&store, &user).await
}

use anyhow::Context as _;
use clap::Parser;
use std::io::IsTerminal as _;
use std::process::ExitCode;
use sw360_utils::cli::{self, Cli};
use sw360_utils::config::Settings;
use sw360_utils::logging;
use sw360_utils::output::Output;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Cli::parse();
    logging::init(&args.log_level);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Cli) -> anyhow::Result<()> {
    let settings = Settings::load(&args.env_file)
        .with_context(|| format!("load settings ({})", args.env_file.display()))?;

    let stdout = std::io::stdout();
    let color = stdout.is_terminal();
    let mut out = Output::new(stdout, color);
    cli::run(args.command, &settings, &mut out).await?;
    Ok(())
}

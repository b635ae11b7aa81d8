use crate::browse::{run_listings, run_session, ListingsArgs, SessionCommand};
use crate::demo::{run_demo, DemoArgs};
use crate::server;
use bazaar::config::AppConfig;
use bazaar::error::AppError;
use bazaar::telemetry::{self, LogSink};
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "Bazaar",
    about = "Run and explore the Dari/Pashto classifieds marketplace from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Browse a listing feed using the saved session's user and bookmarks
    Listings(ListingsArgs),
    /// Inspect or change the saved session context
    Session {
        #[command(subcommand)]
        command: SessionCommand,
    },
    /// Walk a listing through submission, moderation and deletion on demo data
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Listings(args) => run_listings(command_config()?, args).await,
        Command::Session { command } => run_session(command_config()?, command),
        Command::Demo(args) => run_demo(command_config()?, args).await,
    }
}

fn command_config() -> Result<AppConfig, AppError> {
    let config = AppConfig::load()?;
    telemetry::init_with_sink(&config.telemetry, LogSink::Stderr)?;
    Ok(config)
}

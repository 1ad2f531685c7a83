use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "streamalert",
    version,
    about = "Alerting backend that keeps streamer platform credentials fresh"
)]
struct Cli {
    /// Path to the config file
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the backend: background routines plus the HTTP API
    Serve,

    /// Inspect or refresh the stored platform token
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Manage tracked broadcasters
    Broadcaster {
        #[command(subcommand)]
        action: BroadcasterAction,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Show the stored token's freshness
    Status,
    /// Run one freshness check right now
    Refresh,
}

#[derive(Subcommand)]
enum BroadcasterAction {
    /// Track a broadcaster by login
    Add { login: String },
    /// List tracked broadcasters
    List,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("STREAMALERT_LOG_LEVEL")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), streamalert::StreamalertError> {
    let config = cli.config.as_deref();
    match cli.command {
        Commands::Serve => streamalert::cli::serve::run_serve(config).await,
        Commands::Token { action } => match action {
            TokenAction::Status => streamalert::cli::token::run_status(config).await,
            TokenAction::Refresh => streamalert::cli::token::run_refresh(config).await,
        },
        Commands::Broadcaster { action } => match action {
            BroadcasterAction::Add { login } => {
                streamalert::cli::broadcaster::run_add(config, &login).await
            }
            BroadcasterAction::List => streamalert::cli::broadcaster::run_list(config).await,
        },
    }
}

use clap::{Parser, Subcommand};
use std::future::Future;
use std::path::Path;
use std::process::ExitCode;

use rtmbot::application::commands::register_builtins;
use rtmbot::application::errors::BotError;
use rtmbot::application::messaging::Dispatcher;
use rtmbot::domain::entities::{CommandRegistry, Session};
use rtmbot::domain::traits::{FrameSink, FrameSource};
use rtmbot::infrastructure::adapters::console::{console_session, ConsoleSink, ConsoleSource};
use rtmbot::infrastructure::adapters::slack::SlackConnector;
use rtmbot::infrastructure::config::Config;
use rtmbot::infrastructure::logging;
use rtmbot::infrastructure::tmux::TmuxSession;

#[derive(Parser)]
#[command(name = "rtmbot")]
#[command(about = "A Slack real-time messaging bot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Slack API token (overrides config and SLACK_API_TOKEN)
    #[arg(short, long)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to Slack and run until interrupted
    Run,
    /// Run the bot against stdin/stdout (dev mode)
    Console,
    /// Run one line in the configured tmux session and print its output
    Exec {
        #[arg(required = true, trailing_var_arg = true)]
        keys: Vec<String>,
    },
    /// Show version
    Version,
    /// Print a default config
    InitConfig,
}

/// Subcommands that need config, logging and the async runtime
enum Job {
    Run,
    Console,
    Exec(String),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let job = match cli.command {
        Commands::Version => {
            println!("rtmbot v{}", env!("CARGO_PKG_VERSION"));
            return ExitCode::SUCCESS;
        }
        Commands::InitConfig => return init_config(),
        Commands::Run => Job::Run,
        Commands::Console => Job::Console,
        Commands::Exec { keys } => Job::Exec(keys.join(" ")),
    };

    let (config, load_warning) = load_config(&cli.config, cli.token);
    if let Err(e) = logging::init(&config.logging) {
        eprintln!("Failed to initialise logging: {}", e);
        return ExitCode::FAILURE;
    }
    if let Some(warning) = load_warning {
        tracing::warn!("{}", warning);
    }

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to start async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = rt.block_on(async move {
        match job {
            Job::Run => run_bot(config).await,
            Job::Console => run_console(config).await,
            Job::Exec(keys) => exec(config, keys).await,
        }
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: &str, token_override: Option<String>) -> (Config, Option<String>) {
    let (mut config, warning) = if Path::new(path).exists() {
        match Config::load(path) {
            Ok(config) => (config, None),
            Err(e) => (Config::default(), Some(format!("Failed to load config: {}, using defaults", e))),
        }
    } else {
        (Config::default(), None)
    };

    config.apply_env();
    if let Some(token) = token_override {
        config.slack.token = Some(token);
    }
    (config, warning)
}

fn build_registry(config: &Config) -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    register_builtins(&mut registry, &config.tmux);
    registry
}

async fn run_bot(config: Config) -> Result<(), BotError> {
    tracing::info!("Hello! Starting up {}...", config.bot.name);
    let token = config.token()?;

    let connector = SlackConnector::new(config.slack.api_endpoint.as_str());
    let session = connector.start(token).await?;
    tracing::info!("Handshake complete: {}", session);

    let (source, sink) = connector.connect(&session).await?;
    serve(config, session, Box::new(source), Box::new(sink), interrupt()).await;
    Ok(())
}

async fn run_console(config: Config) -> Result<(), BotError> {
    let session = console_session(&config.bot.name)?;
    tracing::info!("Starting console bot (dev mode), type `help` to list commands");
    serve(config, session, Box::new(ConsoleSource::new()), Box::new(ConsoleSink::new()), interrupt()).await;
    Ok(())
}

async fn serve<F>(config: Config, session: Session, source: Box<dyn FrameSource>, sink: Box<dyn FrameSink>, shutdown: F)
where
    F: Future<Output = ()> + Send,
{
    let registry = build_registry(&config);
    let dispatcher = Dispatcher::new(session, registry, config.runtime.clone());
    let state = dispatcher.run(source, sink, shutdown).await;
    tracing::info!("Bot finished in state {:?}", state);
}

async fn exec(config: Config, keys: String) -> Result<(), BotError> {
    let session = TmuxSession::new(config.tmux.server.as_str());
    let output = session.send_keys_and_capture(&keys).await?;
    println!("{}", output);
    Ok(())
}

async fn interrupt() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Interrupt received"),
        Err(e) => {
            tracing::error!("Unable to listen for interrupt: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

fn init_config() -> ExitCode {
    let config = Config::default();
    match serde_yaml::to_string(&config) {
        Ok(yaml) => {
            println!("{}", yaml);
            println!("\nSave this to config.yaml and adjust as needed.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to render config: {}", e);
            ExitCode::FAILURE
        }
    }
}

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dbot::{commands, ChatSession, Config};
use std::fs;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dbot")]
#[command(version)]
#[command(about = "Chat with D-Bot, the event assistant", long_about = None)]
struct Cli {
    /// Base url of the QA service (overrides config and DBOT_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive chat (default)
    Chat,
    /// Ask a single question and print the answer
    Ask {
        /// The question, e.g. "When is the concert?"
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// Show the effective configuration
    Config {
        /// Write the configuration file if it does not exist yet
        #[arg(long)]
        init: bool,
    },
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// While the chat screen owns the terminal, logs go to `~/.dbot/dbot.log`
fn init_file_logging() -> Result<()> {
    let dir = Config::home_dir()?;
    fs::create_dir_all(&dir).context("Failed to create .dbot directory")?;
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("dbot.log"))
        .context("Failed to open log file")?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Chat);

    match command {
        Commands::Chat => init_file_logging()?,
        _ => init_stderr_logging(),
    }

    let mut config = Config::load()?;
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }

    match command {
        Commands::Chat => {
            let session = ChatSession::from_config(&config).context("Failed to set up chat session")?;
            dbot::ui::run_chat(session).await
        }
        Commands::Ask { question } => commands::ask(&config, &question.join(" ")).await,
        Commands::Config { init: true } => commands::init_config(&config),
        Commands::Config { init: false } => commands::show_config(&config),
    }
}

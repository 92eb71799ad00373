use crate::config::Config;
use crate::dispatcher::{Rejection, Submission};
use crate::events::{Role, Turn};
use crate::session::ChatSession;
use anyhow::{bail, Context, Result};

/// Ask a single question and print the answer with its sources
pub async fn ask(config: &Config, question: &str) -> Result<()> {
    let mut config = config.clone();
    config.typing.enabled = false;

    let mut session = ChatSession::from_config(&config).context("Failed to set up chat session")?;
    session.start();

    let outcome = session.submit(question).await;
    if outcome == Submission::Rejected(Rejection::EmptyQuery) {
        bail!("Question is empty");
    }

    if let Some(turn) = session.snapshot().last().filter(|turn| turn.role == Role::Assistant) {
        println!("{}", format_turn(turn));
    }

    if outcome == Submission::FellBack {
        bail!("The QA service at {} did not answer", config.api_url);
    }
    Ok(())
}

/// Render a turn as plain text, sources listed underneath
pub fn format_turn(turn: &Turn) -> String {
    let mut out = format!("🤖 {}: {}", turn.role.display_name(), turn.content.trim_end());
    if !turn.sources.is_empty() {
        out.push_str("\n\n📅 Sources:");
        for source in &turn.sources {
            out.push_str(&format!("\n  • {}", source.summary()));
        }
    }
    out
}

/// Print the effective configuration
pub fn show_config(config: &Config) -> Result<()> {
    let path = Config::default_path()?;
    println!("📁 Config file: {}", path.display());
    if !path.exists() {
        println!("   (not created yet, run 'dbot config --init')");
    }
    println!("{}", "=".repeat(50));
    let rendered = toml::to_string_pretty(config).context("Failed to serialize config")?;
    println!("{}", rendered);
    Ok(())
}

/// Write the current configuration to disk unless a file already exists
pub fn init_config(config: &Config) -> Result<()> {
    let path = Config::default_path()?;
    if path.exists() {
        println!("✅ Config already exists at {}", path.display());
        return Ok(());
    }
    let path = config.save()?;
    println!("✨ Wrote {}", path.display());
    Ok(())
}

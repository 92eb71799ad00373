use crate::session::ChatSession;
use crate::ui::conversation::{ConversationAction, ConversationManager};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use tokio::time::Duration;

/// Delay between loop iterations; also bounds input latency
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

type ChatTerminal = Terminal<CrosstermBackend<Stdout>>;

/// Run the interactive chat screen until the user quits
pub async fn run_chat(session: ChatSession) -> Result<()> {
    let mut terminal = setup_terminal().context("Failed to initialise terminal")?;
    let mut manager = ConversationManager::new(session);
    manager.start_conversation();

    let result = event_loop(&mut terminal, &mut manager).await;

    manager.shutdown();
    restore_terminal(&mut terminal);
    result
}

async fn event_loop(terminal: &mut ChatTerminal, manager: &mut ConversationManager) -> Result<()> {
    let mut log_changes = manager.session().subscribe_log();
    let mut dirty = true;

    loop {
        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(key) => {
                    if manager.handle_key(key) == ConversationAction::Exit {
                        return Ok(());
                    }
                    dirty = true;
                }
                Event::Resize(_, _) | Event::Paste(_) => dirty = true,
                _ => {}
            }
        }

        let animating = manager.tick();
        if log_changes.has_changed().unwrap_or(false) {
            log_changes.borrow_and_update();
            dirty = true;
        }

        if dirty || animating {
            terminal.draw(|frame| manager.render(frame))?;
            dirty = false;
        }

        tokio::time::sleep(FRAME_INTERVAL).await;
    }
}

fn setup_terminal() -> Result<ChatTerminal> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

fn restore_terminal(terminal: &mut ChatTerminal) {
    let _ = disable_raw_mode();
    let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
    let _ = terminal.show_cursor();
}

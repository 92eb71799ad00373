use crate::dispatcher::Submission;
use crate::session::ChatSession;
use crate::ui::conversation::{
    get_help_text, ComposerResult, ConversationComposer, ConversationHistory, ParsedCommand,
    RecentSearches, SlashCommand, ThinkingIndicator,
};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tokio::task::JoinHandle;

/// Actions that can be requested by the conversation view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationAction {
    None,
    Exit,
}

/// Wires a chat session to the terminal widgets
pub struct ConversationManager {
    session: ChatSession,
    composer: ConversationComposer,
    thinking: ThinkingIndicator,
    notice: Option<String>,
    in_flight: Option<JoinHandle<Submission>>,
}

impl ConversationManager {
    pub fn new(session: ChatSession) -> Self {
        Self {
            session,
            composer: ConversationComposer::new(),
            thinking: ThinkingIndicator::new(),
            notice: Some(get_help_text()),
            in_flight: None,
        }
    }

    /// Start the greeting animation
    pub fn start_conversation(&mut self) {
        self.session.start();
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    /// Refresh state that changes without user input. Returns whether the
    /// screen should be redrawn for the thinking animation.
    pub fn tick(&mut self) -> bool {
        let busy = self.session.is_busy();
        self.thinking.update(busy);
        self.composer.set_enabled(!busy);

        if self.in_flight.as_ref().is_some_and(JoinHandle::is_finished) {
            self.in_flight = None;
        }
        self.thinking.is_active()
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ConversationAction {
        if key.kind != KeyEventKind::Press {
            return ConversationAction::None;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return ConversationAction::Exit;
        }

        if key.modifiers.contains(KeyModifiers::ALT) {
            if let KeyCode::Char(c @ '1'..='5') = key.code {
                let index = c as usize - '1' as usize;
                self.stage_recent(index);
                return ConversationAction::None;
            }
        }

        match self.composer.handle_key(key) {
            ComposerResult::Submitted(input) => {
                self.session.set_pending(input);
                self.submit_pending();
                ConversationAction::None
            }
            ComposerResult::Command(command) => self.handle_slash_command(command),
            ComposerResult::Edited => {
                self.session.set_pending(self.composer.content().to_string());
                ConversationAction::None
            }
            ComposerResult::None => ConversationAction::None,
        }
    }

    fn submit_pending(&mut self) {
        if self.session.is_busy() {
            return;
        }
        let query = self.session.take_pending();
        self.notice = None;
        self.in_flight = Some(self.session.spawn_submit(query));
        self.thinking.update(true);
        self.composer.set_enabled(false);
    }

    fn stage_recent(&mut self, index: usize) {
        let staged = self.session.select_recent(index).map(str::to_string);
        match staged {
            Some(query) => {
                self.composer.set_content(&query);
                self.notice = None;
            }
            None => self.notice = Some(format!("No recent search #{}", index + 1)),
        }
    }

    /// Handle slash commands
    fn handle_slash_command(&mut self, command: ParsedCommand) -> ConversationAction {
        match command.command {
            SlashCommand::Quit => ConversationAction::Exit,
            SlashCommand::Help => {
                self.notice = Some(get_help_text());
                ConversationAction::None
            }
            SlashCommand::Recent => {
                match command.recent_index() {
                    Some(index) => self.stage_recent(index),
                    None => self.notice = Some("Usage: /recent N (1 = most recent)".to_string()),
                }
                ConversationAction::None
            }
        }
    }

    /// Render the conversation UI components
    pub fn render(&self, frame: &mut Frame) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(30), Constraint::Length(32)])
            .split(frame.size());

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(5),    // History
                Constraint::Length(1), // Notice
                Constraint::Length(3), // Composer
            ])
            .split(columns[0]);

        let turns = self.session.snapshot();
        let thinking = self.thinking.text();
        frame.render_widget(
            ConversationHistory::new(&turns).thinking(thinking.as_deref()),
            rows[0],
        );

        if let Some(notice) = &self.notice {
            let line = Line::from(vec![Span::styled(
                notice.clone(),
                Style::default().fg(Color::DarkGray),
            )]);
            frame.render_widget(Paragraph::new(line), rows[1]);
        }

        frame.render_widget(&self.composer, rows[2]);

        let recent = self.session.recent_queries();
        frame.render_widget(RecentSearches::new(&recent), columns[1]);
    }

    /// Stop background work before the view goes away
    pub fn shutdown(&mut self) {
        self.session.shutdown();
    }
}

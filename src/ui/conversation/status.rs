use tokio::time::Instant;

/// "D-Bot is thinking..." line shown while a query is in flight
#[derive(Debug, Clone)]
pub struct ThinkingIndicator {
    started: Option<Instant>,
}

impl ThinkingIndicator {
    pub fn new() -> Self {
        Self { started: None }
    }

    /// Track the busy flag; the dot animation restarts with each query
    pub fn update(&mut self, busy: bool) {
        match (busy, self.started) {
            (true, None) => self.started = Some(Instant::now()),
            (false, Some(_)) => self.started = None,
            _ => {}
        }
    }

    pub fn is_active(&self) -> bool {
        self.started.is_some()
    }

    /// Current text, or `None` when idle
    pub fn text(&self) -> Option<String> {
        let started = self.started?;
        Some(Self::frame(started.elapsed().as_millis()))
    }

    fn frame(elapsed_ms: u128) -> String {
        let dots = match (elapsed_ms / 300) % 4 {
            0 => ".",
            1 => "..",
            2 => "...",
            _ => "",
        };
        format!("🤖 D-Bot is thinking{}", dots)
    }
}

impl Default for ThinkingIndicator {
    fn default() -> Self {
        Self::new()
    }
}

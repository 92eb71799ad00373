use serde::{Deserialize, Serialize};

/// Author of a turn in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "ai")]
    Assistant,
}

impl Role {
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::User => "You",
            Role::Assistant => "D-Bot",
        }
    }
}

/// Values the QA service uses to say "we don't know" for an optional event field.
/// They are kept verbatim on the source but never shown.
const UNKNOWN_SENTINELS: &[&str] = &["n/a", "na", "unknown", "tba", "tbd", "none", "null"];

/// A structured citation attached to an assistant turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSource {
    pub name: String,
    pub date: Option<String>,
    pub time: Option<String>,
    pub location: Option<String>,
}

impl EventSource {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            date: None,
            time: None,
            location: None,
        }
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn shown_date(&self) -> Option<&str> {
        shown(self.date.as_deref())
    }

    pub fn shown_time(&self) -> Option<&str> {
        shown(self.time.as_deref())
    }

    pub fn shown_location(&self) -> Option<&str> {
        shown(self.location.as_deref())
    }

    /// One-line summary, e.g. `Fall Concert · Friday · 7pm · Main Hall`.
    /// Missing and unknown details are left out.
    pub fn summary(&self) -> String {
        let mut parts = vec![self.name.as_str()];
        parts.extend(self.shown_date());
        parts.extend(self.shown_time());
        parts.extend(self.shown_location());
        parts.join(" · ")
    }
}

fn shown(value: Option<&str>) -> Option<&str> {
    let value = value?.trim();
    if value.is_empty() || UNKNOWN_SENTINELS.contains(&value.to_lowercase().as_str()) {
        None
    } else {
        Some(value)
    }
}

/// A single message in the conversation log
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub sources: Vec<EventSource>,
    pub animating: bool,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            sources: Vec::new(),
            animating: false,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>, sources: Vec<EventSource>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            sources,
            animating: false,
            timestamp: chrono::Utc::now(),
        }
    }

    /// The greeting placeholder every log starts with, waiting to be revealed.
    pub fn pending_greeting() -> Self {
        Self {
            role: Role::Assistant,
            content: String::new(),
            sources: Vec::new(),
            animating: true,
            timestamp: chrono::Utc::now(),
        }
    }
}

/// Identity of the signed-in user, forwarded verbatim to the QA service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

//! Terminal front end for a chat session

pub mod conversation;
pub mod terminal;

pub use terminal::run_chat;

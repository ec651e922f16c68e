//! Slash-command parsing for the interactive `chat` loop.
//!
//! Anything that is not a recognised `/command` is a chat message, including
//! text that merely starts with a slash followed by a space.

#[cfg(test)]
#[path = "repl_test.rs"]
mod repl_test;

use toolchat::Action;

pub const HELP: &str = "\
Commands:
  /reset    start a new conversation
  /theme    toggle light/dark colours
  /tools    show or hide the tool list
  /reload   fetch the tool list again
  /health   probe the assistant service
  /help     show this help
  /quit     leave the chat
Anything else is sent to the assistant.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// Blank input; nothing to do.
    Empty,
    /// Chat text for the assistant.
    Message(String),
    /// A controller action.
    Action(Action),
    ReloadTools,
    Health,
    Help,
    Quit,
    Unknown(String),
}

pub fn parse_line(raw: &str) -> Line {
    let text = raw.trim();
    if text.is_empty() {
        return Line::Empty;
    }
    let Some(command) = text.strip_prefix('/') else {
        return Line::Message(text.to_owned());
    };
    if command.is_empty() || command.starts_with(char::is_whitespace) {
        return Line::Message(text.to_owned());
    }

    match command.to_ascii_lowercase().as_str() {
        "reset" | "new" => Line::Action(Action::Reset),
        "theme" => Line::Action(Action::ToggleTheme),
        "tools" | "sidebar" => Line::Action(Action::ToggleSidebar),
        "reload" => Line::ReloadTools,
        "health" => Line::Health,
        "help" | "?" => Line::Help,
        "quit" | "exit" | "q" => Line::Quit,
        _ => Line::Unknown(text.to_owned()),
    }
}

//! Line-oriented [`ChatView`] for a terminal.
//!
//! DESIGN
//! ======
//! Everything is appended to one writer, newest at the bottom, so there is no
//! scrolling to do. The typing indicator is a single status line erased in
//! place, drawn only when colour is on. The tool "sidebar" is the cached tool
//! list, reprinted when it is toggled open.

#[cfg(test)]
#[path = "terminal_test.rs"]
mod terminal_test;

use std::cell::{Cell, RefCell};
use std::io::Write;

use toolchat::format::format_ansi;
use toolchat::view::{NO_TOOLS_PLACEHOLDER, RESET_NOTICE, TYPING_LABEL, pretty_arguments, tool_call_header};
use toolchat::{ChatView, Message, Role, Theme, ToolDescriptor};

const RESET: &str = "\u{1b}[0m";
const ERASE_LINE: &str = "\r\u{1b}[2K";

/// Role label colours for one theme.
struct Palette {
    user: &'static str,
    assistant: &'static str,
    system: &'static str,
}

fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Light => Palette { user: "\u{1b}[34m", assistant: "\u{1b}[32m", system: "\u{1b}[33m" },
        Theme::Dark => Palette { user: "\u{1b}[94m", assistant: "\u{1b}[92m", system: "\u{1b}[93m" },
    }
}

pub struct TerminalView<W: Write> {
    out: RefCell<W>,
    color: bool,
    theme: Cell<Theme>,
    typing: Cell<bool>,
    sidebar_open: Cell<bool>,
    tools: RefCell<Vec<ToolDescriptor>>,
    input: RefCell<String>,
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self {
            out: RefCell::new(out),
            color,
            theme: Cell::new(Theme::default()),
            typing: Cell::new(false),
            sidebar_open: Cell::new(true),
            tools: RefCell::new(Vec::new()),
            input: RefCell::new(String::new()),
        }
    }

    /// Stage a line typed at the prompt for the next submit.
    pub fn set_input(&self, line: &str) {
        *self.input.borrow_mut() = line.to_owned();
    }

    #[cfg(test)]
    pub fn writer(&self) -> std::cell::Ref<'_, W> {
        self.out.borrow()
    }

    fn write(&self, text: &str) {
        let mut out = self.out.borrow_mut();
        // Terminal output failures (closed pipe) leave nothing to report to.
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    }

    fn label(&self, role: Role) -> String {
        let name = match role {
            Role::User => "you",
            Role::Assistant => "assistant",
            Role::System => "system",
        };
        if !self.color {
            return format!("{name}>");
        }
        let colors = palette(self.theme.get());
        let color = match role {
            Role::User => colors.user,
            Role::Assistant => colors.assistant,
            Role::System => colors.system,
        };
        format!("{color}{name}>{RESET}")
    }

    fn render_tools(&self) {
        let tools = self.tools.borrow();
        let mut text = String::from("Available tools:\n");
        if tools.is_empty() {
            text.push_str(&format!("  {NO_TOOLS_PLACEHOLDER}\n"));
        }
        for tool in tools.iter() {
            text.push_str(&format!("  - {}: {}\n", tool.name, tool.description));
        }
        drop(tools);
        self.write(&text);
    }
}

impl<W: Write> ChatView for TerminalView<W> {
    fn add_message(&self, message: &Message) {
        let body = match message.role {
            Role::Assistant if self.color => format_ansi(&message.content),
            _ => message.content.clone(),
        };
        let mut text = format!("{} {body}\n", self.label(message.role));
        for call in &message.tool_calls {
            text.push_str(&format!("  {}\n", tool_call_header(call)));
            for line in pretty_arguments(call).lines() {
                text.push_str(&format!("    {line}\n"));
            }
        }
        self.write(&text);
    }

    // Without colour the line cannot be erased, so no indicator is drawn.
    fn show_typing_indicator(&self) {
        if self.color && !self.typing.replace(true) {
            self.write(&format!("{TYPING_LABEL}..."));
        }
    }

    fn hide_typing_indicator(&self) {
        if self.typing.replace(false) && self.color {
            self.write(ERASE_LINE);
        }
    }

    fn clear_messages(&self) {
        if self.color {
            // Clear screen, cursor home.
            self.write("\u{1b}[2J\u{1b}[H");
        }
        self.add_message(&Message::system(RESET_NOTICE));
    }

    fn display_tools(&self, tools: &[ToolDescriptor]) {
        *self.tools.borrow_mut() = tools.to_vec();
        if self.sidebar_open.get() {
            self.render_tools();
        }
    }

    fn set_connection_status(&self, connected: bool) {
        let status = if connected { "connected" } else { "disconnected" };
        self.write(&format!("[{status}]\n"));
    }

    fn apply_theme(&self, theme: Theme) {
        self.theme.set(theme);
    }

    fn set_sidebar_open(&self, open: bool) {
        let was_open = self.sidebar_open.replace(open);
        if open && !was_open {
            self.render_tools();
        }
    }

    fn read_input(&self) -> String {
        self.input.borrow().trim().to_owned()
    }

    fn clear_input(&self) {
        self.input.borrow_mut().clear();
    }

    // The prompt is not redrawn until the turn completes.
    fn set_input_enabled(&self, _enabled: bool) {}

    fn focus_input(&self) {}
}

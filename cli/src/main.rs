//! `toolchat` terminal client.
//!
//! One-shot commands (`health`, `tools`, `send`, `reset`, `debug`) print JSON
//! or plain text and exit. `chat` (the default) runs an interactive loop over
//! the same controller the browser client uses.

mod repl;
mod store;
mod terminal;

use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use toolchat::config::{DEFAULT_API_BASE_URL, DEFAULT_MAX_MESSAGE_LENGTH, DEFAULT_TYPING_DELAY_MS, parse_switch};
use toolchat::timer::TokioTimer;
use toolchat::transport::{NativeSocket, RestTransport, SocketTransport};
use toolchat::{Action, ChatError, ChatView, ClientConfig, Controller, Message, Transport, TransportMode};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::repl::{HELP, Line, parse_line};
use crate::store::FileThemeStore;
use crate::terminal::TerminalView;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Chat(#[from] ChatError),
    #[error("terminal i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),
    #[error("assistant service unhealthy: {0}")]
    Unhealthy(String),
}

#[derive(Parser, Debug)]
#[command(name = "toolchat", about = "Terminal client for a tool-augmented assistant")]
struct Cli {
    #[arg(long, env = "TOOLCHAT_API_URL", default_value = DEFAULT_API_BASE_URL)]
    api_url: String,

    /// WebSocket endpoint; derived from the API URL when omitted.
    #[arg(long, env = "TOOLCHAT_WS_URL")]
    ws_url: Option<String>,

    /// `rest` or `websocket`.
    #[arg(long, env = "TOOLCHAT_TRANSPORT", default_value = "rest", value_parser = TransportMode::parse)]
    transport: TransportMode,

    #[arg(long, env = "TOOLCHAT_MAX_MESSAGE_LENGTH", default_value_t = DEFAULT_MAX_MESSAGE_LENGTH, value_parser = parse_positive)]
    max_message_length: usize,

    /// Delay before the typing indicator appears.
    #[arg(long, env = "TOOLCHAT_TYPING_DELAY_MS", default_value_t = DEFAULT_TYPING_DELAY_MS)]
    typing_delay_ms: u64,

    #[arg(long, env = "TOOLCHAT_AUTO_SCROLL", default_value_t = true, action = clap::ArgAction::Set, value_parser = parse_auto_scroll)]
    auto_scroll: bool,

    /// Disable ANSI colours and inline formatting.
    #[arg(long, env = "NO_COLOR")]
    no_color: bool,

    /// Where the theme preference is stored.
    #[arg(long, env = "TOOLCHAT_THEME_FILE")]
    theme_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive chat (default).
    Chat,
    /// Probe the service health endpoint.
    Health,
    /// List the tools the assistant can call.
    Tools,
    /// Send one message and print the reply.
    Send {
        #[arg(required = true, num_args = 1.., trailing_var_arg = true)]
        text: Vec<String>,
        /// Print the raw reply as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Ask the service to forget the current conversation.
    Reset,
    /// Print the service's tool diagnostics.
    Debug,
}

impl Cli {
    fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::for_base_url(&self.api_url);
        if let Some(ws) = &self.ws_url {
            config.ws_url = ws.trim_end_matches('/').to_owned();
        }
        config.transport = self.transport;
        config.max_message_length = self.max_message_length;
        config.typing_delay = Duration::from_millis(self.typing_delay_ms);
        config.auto_scroll = self.auto_scroll;
        config
    }

    fn theme_store(&self) -> FileThemeStore {
        let store = self.theme_file.as_ref().map_or_else(FileThemeStore::user_default, FileThemeStore::at);
        tracing::debug!(path = ?store.path(), "theme store");
        store
    }

    fn color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

fn parse_positive(raw: &str) -> Result<usize, String> {
    match raw.trim().parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_owned()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

fn parse_auto_scroll(raw: &str) -> Result<bool, String> {
    parse_switch(raw).ok_or_else(|| format!("expected on/off, got '{raw}'"))
}

/// Trim a one-shot message and apply the same checks as the interactive
/// submit path.
fn outgoing_text(raw: &str, max: usize) -> Result<&str, ChatError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(ChatError::Validation("Message is empty".to_owned()));
    }
    if text.chars().count() > max {
        return Err(ChatError::Validation(format!("Message is too long (maximum {max} characters)")));
    }
    Ok(text)
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "error".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli.config();
    tracing::debug!(?config, "configuration loaded");

    match &cli.command {
        None | Some(Command::Chat) => run_chat(&cli, config).await,
        Some(Command::Health) => run_health(&config).await,
        Some(Command::Tools) => run_tools(&config).await,
        Some(Command::Send { text, json }) => run_send(&cli, &config, &text.join(" "), *json).await,
        Some(Command::Reset) => run_reset(&config).await,
        Some(Command::Debug) => run_debug(&config).await,
    }
}

fn build_transport(config: &ClientConfig) -> Box<dyn Transport> {
    let rest = RestTransport::new(&config.api_base_url);
    match config.transport {
        TransportMode::Rest => Box::new(rest),
        TransportMode::WebSocket => Box::new(SocketTransport::new(NativeSocket::new(&config.ws_url), rest)),
    }
}

async fn run_chat(cli: &Cli, config: ClientConfig) -> Result<(), CliError> {
    let view = TerminalView::new(std::io::stdout(), cli.color());
    let transport = build_transport(&config);
    let controller = Controller::new(transport, view, Box::new(cli.theme_store()), Box::new(TokioTimer), config);

    controller.initialize().await;
    println!("Type a message, or /help for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match parse_line(&line) {
            Line::Empty => {}
            Line::Message(text) => {
                controller.view().set_input(&text);
                controller.handle(Action::Submit).await;
            }
            Line::Action(action) => controller.handle(action).await,
            Line::ReloadTools => controller.load_tools().await,
            Line::Health => {
                controller.check_health().await;
            }
            Line::Help => println!("{HELP}"),
            Line::Quit => break,
            Line::Unknown(command) => eprintln!("unknown command {command}; try /help"),
        }
    }

    controller.shutdown().await;
    Ok(())
}

fn prompt() -> std::io::Result<()> {
    let mut out = std::io::stdout().lock();
    out.write_all(b"> ")?;
    out.flush()
}

async fn run_health(config: &ClientConfig) -> Result<(), CliError> {
    let health = RestTransport::new(&config.api_base_url).health_check().await;
    print_json(&health)?;
    if health.is_healthy() {
        Ok(())
    } else {
        Err(CliError::Unhealthy(health.reason().to_owned()))
    }
}

async fn run_tools(config: &ClientConfig) -> Result<(), CliError> {
    let tools = RestTransport::new(&config.api_base_url).list_tools().await?;
    print_json(&tools)
}

async fn run_send(cli: &Cli, config: &ClientConfig, text: &str, json: bool) -> Result<(), CliError> {
    let text = outgoing_text(text, config.max_message_length)?;
    let transport = build_transport(config);
    transport.connect().await?;
    let outcome = transport.send_message(text).await;
    transport.disconnect().await;
    let reply = outcome?;

    if json {
        return print_json(&reply);
    }
    let view = TerminalView::new(std::io::stdout(), cli.color());
    view.add_message(&Message::assistant(reply.response, reply.tool_calls));
    Ok(())
}

async fn run_reset(config: &ClientConfig) -> Result<(), CliError> {
    RestTransport::new(&config.api_base_url).reset_conversation().await?;
    println!("ok");
    Ok(())
}

async fn run_debug(config: &ClientConfig) -> Result<(), CliError> {
    let info = RestTransport::new(&config.api_base_url).debug_info().await?;
    print_json(&info)
}

fn print_json(value: &impl Serialize) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "toolchat",
            "--api-url",
            "https://bot.example.com/",
            "--transport",
            "ws",
            "--max-message-length",
            "10",
            "--typing-delay-ms",
            "0",
            "health",
        ])
        .unwrap();
        let config = cli.config();
        assert_eq!(config.api_base_url, "https://bot.example.com");
        assert_eq!(config.ws_url, "wss://bot.example.com/ws");
        assert_eq!(config.transport, TransportMode::WebSocket);
        assert_eq!(config.max_message_length, 10);
        assert_eq!(config.typing_delay, Duration::ZERO);
        assert!(matches!(cli.command, Some(Command::Health)));
    }

    #[test]
    fn zero_max_length_rejected() {
        assert!(Cli::try_parse_from(["toolchat", "--max-message-length", "0"]).is_err());
        assert!(Cli::try_parse_from(["toolchat", "--transport", "carrier-pigeon"]).is_err());
    }

    #[test]
    fn auto_scroll_accepts_switch_spellings() {
        let cli = Cli::try_parse_from(["toolchat", "--auto-scroll", "no"]).unwrap();
        assert!(!cli.config().auto_scroll);
        let cli = Cli::try_parse_from(["toolchat", "--auto-scroll", "yes"]).unwrap();
        assert!(cli.config().auto_scroll);
        assert!(Cli::try_parse_from(["toolchat", "--auto-scroll", "sometimes"]).is_err());
    }

    #[test]
    fn blank_send_rejected_locally() {
        assert!(matches!(outgoing_text("   \n", 10), Err(ChatError::Validation(_))));
    }

    #[tokio::test]
    async fn blank_send_never_reaches_transport() {
        // Nothing listens on the discard port; any request would fail as Network.
        let cli = Cli::try_parse_from(["toolchat", "--api-url", "http://127.0.0.1:9", "send", "   "]).unwrap();
        let err = run_send(&cli, &cli.config(), "   ", false).await.unwrap_err();
        assert!(matches!(err, CliError::Chat(ChatError::Validation(_))), "{err:?}");
    }

    #[test]
    fn outgoing_text_trims_and_bounds_length() {
        assert_eq!(outgoing_text("  hi  ", 2).unwrap(), "hi");
        assert!(matches!(outgoing_text("héllo", 4), Err(ChatError::Validation(_))));
        assert_eq!(outgoing_text("héllo", 5).unwrap(), "héllo");
    }

    #[test]
    fn send_joins_words() {
        let cli = Cli::try_parse_from(["toolchat", "send", "what", "is", "2+2"]).unwrap();
        match cli.command {
            Some(Command::Send { text, json }) => {
                assert_eq!(text.join(" "), "what is 2+2");
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}

//! `scoutline chat`: interactive research session.

use scoutline_agent::{DeepReadReport, ExchangeOutcome, Session, SummaryOutcome};
use scoutline_core::settings::SettingsUpdate;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{self, AsyncBufReadExt, BufReader};

use crate::terminal_ui::TerminalUi;

/// A line typed at the prompt.
#[derive(Debug, PartialEq)]
enum ChatCommand {
    Exit,
    Help,
    SearchSuggest,
    Read(String),
    Summarize,
    Reset,
    ShowSettings,
    Settings(SettingsUpdate),
    Tokens,
    Log,
    Unknown(String),
    Message(String),
}

impl ChatCommand {
    fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        if matches!(line, "exit" | "quit" | "/exit" | "/quit" | ":q") {
            return Some(Self::Exit);
        }
        if !line.starts_with('/') {
            return Some(Self::Message(line.to_string()));
        }

        let (name, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let command = match name {
            "/help" => Self::Help,
            "/search-suggest" => Self::SearchSuggest,
            "/read" if !rest.is_empty() => Self::Read(rest.to_string()),
            "/summarize" => Self::Summarize,
            "/reset" => Self::Reset,
            "/settings" if rest.is_empty() => Self::ShowSettings,
            "/settings" => match parse_settings(rest) {
                Ok(update) => Self::Settings(update),
                Err(reason) => Self::Unknown(reason),
            },
            "/tokens" => Self::Tokens,
            "/log" => Self::Log,
            _ => Self::Unknown(format!("Unknown command: {line}")),
        };
        Some(command)
    }
}

/// `streaming on`, `cot off`, `thinking on`.
fn parse_settings(args: &str) -> Result<SettingsUpdate, String> {
    let mut parts = args.split_whitespace();
    let (Some(key), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err("Usage: /settings <streaming|cot|thinking> <on|off>".into());
    };
    let value = match value {
        "on" | "true" => true,
        "off" | "false" => false,
        other => return Err(format!("Expected on or off, got '{other}'")),
    };

    let mut update = SettingsUpdate::default();
    match key {
        "streaming" => update.streaming = Some(value),
        "cot" => update.enable_cot = Some(value),
        "thinking" => update.show_thinking = Some(value),
        other => return Err(format!("Unknown setting '{other}'")),
    }
    Ok(update)
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let ui = Arc::new(TerminalUi::new());
    let mut session = super::build_session(&config, ui.clone())?;

    println!();
    println!("  Scoutline: interactive research");
    println!();
    println!("  Model:     {}", config.default_model);
    println!("  Endpoint:  {}", config.provider_url);
    println!("  Search:    {:?}", config.search.engine);
    println!();
    println!("  Ask a question and press Enter. Type /help for commands, 'exit' to quit.");
    println!();

    let mut lines = BufReader::new(io::stdin()).lines();
    prompt()?;

    while let Some(line) = lines.next_line().await? {
        let Some(command) = ChatCommand::parse(&line) else {
            prompt()?;
            continue;
        };

        match command {
            ChatCommand::Exit => break,
            ChatCommand::Help => print_help(),
            ChatCommand::Message(text) => {
                ui.set_input(&text);
                let outcome = session.send_message().await;
                ui.finish_stream();
                if let ExchangeOutcome::Failed(reason) = outcome {
                    tracing::debug!(%reason, "Exchange failed");
                }
            }
            ChatCommand::SearchSuggest => match session.suggest_results_to_read().await {
                Some(report) => {
                    for (url, read) in &report.reads {
                        print_deep_read(url, read);
                    }
                }
                None => println!("  No results to read. Run a search first.\n"),
            },
            ChatCommand::Read(url) => {
                let report = session.deep_read(&url).await;
                print_deep_read(&url, &report);
            }
            ChatCommand::Summarize => {
                if session.summarize_snippets().await == SummaryOutcome::Empty {
                    println!("  Nothing to summarize yet.\n");
                }
            }
            ChatCommand::Reset => {
                session.reset_conversation();
                println!("  Conversation reset.\n");
            }
            ChatCommand::ShowSettings => print_settings(&session),
            ChatCommand::Settings(update) => {
                session.update_settings(update);
                print_settings(&session);
            }
            ChatCommand::Tokens => {
                println!("  Tokens used: {}\n", session.total_token_count());
            }
            ChatCommand::Log => print_log(&session),
            ChatCommand::Unknown(message) => println!("  {message}\n"),
        }

        prompt()?;
    }

    println!();
    println!("  Goodbye!");
    println!();
    Ok(())
}

fn prompt() -> std::io::Result<()> {
    print!("  You > ");
    std::io::stdout().flush()
}

fn print_help() {
    println!("  /search-suggest    read the search results the model picks, then summarize");
    println!("  /read <url>        read a page chunk by chunk while the model wants more");
    println!("  /summarize         condense everything read so far");
    println!("  /reset             start a new conversation");
    println!("  /settings [k v]    show settings, or set streaming|cot|thinking on|off");
    println!("  /tokens            tokens used in this conversation");
    println!("  /log               every tool call requested so far");
    println!();
}

fn print_deep_read(url: &str, report: &DeepReadReport) {
    let chars: usize = report.chunks.iter().map(|c| c.chars().count()).sum();
    println!(
        "  {url}: {} chunk(s), {chars} chars, stopped: {:?}\n",
        report.chunks.len(),
        report.stop
    );
}

fn print_settings(session: &Session) {
    let settings = session.settings();
    println!("  streaming: {}", settings.streaming);
    println!("  cot:       {} (applies after /reset)", settings.enable_cot);
    println!("  thinking:  {}", settings.show_thinking);
    println!();
}

fn print_log(session: &Session) {
    let log = session.tool_call_audit_log();
    if log.is_empty() {
        println!("  No tool calls yet.\n");
        return;
    }
    for entry in log {
        println!(
            "  {} {} {}",
            entry.timestamp.format("%H:%M:%S"),
            entry.tool,
            serde_json::Value::Object(entry.args.clone())
        );
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_lines_are_messages() {
        assert_eq!(
            ChatCommand::parse("  what is tokio?  "),
            Some(ChatCommand::Message("what is tokio?".into()))
        );
        assert_eq!(ChatCommand::parse("   "), None);
        assert_eq!(ChatCommand::parse("quit"), Some(ChatCommand::Exit));
    }

    #[test]
    fn slash_commands() {
        assert_eq!(
            ChatCommand::parse("/read https://tokio.rs"),
            Some(ChatCommand::Read("https://tokio.rs".into()))
        );
        assert_eq!(ChatCommand::parse("/summarize"), Some(ChatCommand::Summarize));
        assert_eq!(ChatCommand::parse("/search-suggest"), Some(ChatCommand::SearchSuggest));
        assert_eq!(ChatCommand::parse("/settings"), Some(ChatCommand::ShowSettings));
        assert!(matches!(ChatCommand::parse("/read"), Some(ChatCommand::Unknown(_))));
        assert!(matches!(ChatCommand::parse("/frobnicate"), Some(ChatCommand::Unknown(_))));
    }

    #[test]
    fn settings_arguments() {
        let update = parse_settings("streaming off").unwrap();
        assert_eq!(update.streaming, Some(false));
        assert_eq!(update.enable_cot, None);

        assert_eq!(parse_settings("cot on").unwrap().enable_cot, Some(true));
        assert!(parse_settings("cot maybe").is_err());
        assert!(parse_settings("colour on").is_err());
        assert!(parse_settings("streaming").is_err());
    }
}

//! Slash command parsing for the chat application.
//!
//! Input starting with `/` controls the session and is never sent to the
//! model.

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Reset the conversation.
    Clear,

    /// Print the model-facing history with roles.
    History,

    /// Display session statistics.
    Stats,

    /// Show the current configuration.
    ShowConfig,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command, or `None` if it
/// should be submitted as a message.
///
/// # Examples
///
/// ```
/// # use bricktutor::chat::{ChatCommand, parse_command};
/// assert_eq!(parse_command("/clear"), Some(ChatCommand::Clear));
/// assert!(parse_command("How do I read the color sensor?").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let mut parts = rest.splitn(2, char::is_whitespace);
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(str::trim).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "clear" | "reset" => no_argument(ChatCommand::Clear, &command, argument),
        "history" => no_argument(ChatCommand::History, &command, argument),
        "stats" | "status" => no_argument(ChatCommand::Stats, &command, argument),
        "config" => no_argument(ChatCommand::ShowConfig, &command, argument),
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        "" => ChatCommand::Invalid("Empty command; try /help".to_string()),
        _ => ChatCommand::Invalid(format!("Unknown command: /{command}")),
    };

    Some(result)
}

fn no_argument(command: ChatCommand, name: &str, argument: Option<&str>) -> ChatCommand {
    match argument {
        Some(_) => ChatCommand::Invalid(format!("/{name} takes no arguments")),
        None => command,
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Commands:
  /clear, /reset     Start the conversation over
  /history           Show what the model sees, with roles
  /stats, /status    Show session statistics
  /config            Show the current configuration
  /help, /?          Show this help
  /quit, /exit, /q   Exit the chat

Anything else is sent to the tutor.  Press Enter to send.
Ctrl+C cancels a request in flight; Ctrl+D exits."#
}

//! Terminal front end for the Pybricks tutoring chat.
//!
//! # Usage
//!
//! ```bash
//! # Key from the environment
//! GEMINI_API_KEY=... bricktutor-chat
//!
//! # Key from a YAML secrets file, different model
//! bricktutor-chat --secrets-file secrets.yaml --model gemini-2.0-flash
//!
//! # Verbose logs on stderr
//! BRICKTUTOR_LOG=bricktutor=debug bricktutor-chat
//! ```
//!
//! Type a question and press Enter to send it.  `/clear` starts over and
//! `/help` lists the other commands.

use std::sync::Arc;

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use time::format_description::well_known::Rfc3339;
use tracing_subscriber::EnvFilter;

use bricktutor::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatController, Interrupt, PlainTextRenderer, Renderer,
    SessionRegistry, SubmitOutcome, TranscriptView, format_history, help_text, parse_command,
};
use bricktutor::{Gemini, ModelClient, TracingLogger, secrets};

/// Environment variable holding the log filter.
const LOG_ENV: &str = "BRICKTUTOR_LOG";

/// Session id used for the single terminal user.
const TERMINAL_SESSION: &str = "terminal";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let (args, _) = ChatArgs::from_command_line_relaxed("bricktutor-chat [OPTIONS]");
    let config = match ChatConfig::try_from(args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("bricktutor-chat: {err}");
            std::process::exit(1);
        }
    };
    let client = match build_client(&config) {
        Ok(client) => client,
        Err(err) => {
            eprintln!("bricktutor-chat: {err}");
            std::process::exit(1);
        }
    };

    let registry = SessionRegistry::new();
    let store = registry.get_or_init(TERMINAL_SESSION);
    let chat: ChatController = ChatController::new(store, client);
    let mut renderer = PlainTextRenderer::with_color(config.use_color);
    let mut view = TranscriptView::new();
    let mut rl = DefaultEditor::new()?;

    let interrupt = Arc::new(Interrupt::new());
    let handler_interrupt = Arc::clone(&interrupt);
    ctrlc::set_handler(move || {
        handler_interrupt.trigger();
    })?;

    println!("PyBricks Chatbot");
    println!("This chatbot helps you learn how to program LEGO robots with PyBricks.");
    println!("Model: {}. Type /help for commands, /quit to exit.\n", config.model);

    loop {
        let pending = chat.store().get_pending();
        let readline = rl.readline_with_initial("You: ", (pending.as_str(), ""));

        match readline {
            Ok(line) => {
                if line.trim().is_empty() {
                    chat.store().set_pending("");
                    continue;
                }
                let _ = rl.add_history_entry(line.as_str());

                if let Some(cmd) = parse_command(&line) {
                    chat.store().set_pending("");
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Clear => chat.reset(),
                        ChatCommand::History => {
                            renderer.print_info(&format_history(&chat.store().get_history()));
                        }
                        ChatCommand::Stats => print_stats(&chat, &mut renderer),
                        ChatCommand::ShowConfig => print_config(&config, &mut renderer),
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                renderer.print_info(&format!("    {line}"));
                            }
                        }
                        ChatCommand::Invalid(message) => {
                            renderer.print_error(&message);
                            chat.store().set_pending(line.trim());
                        }
                    }
                    view.render(&chat.store().snapshot(), &mut renderer);
                    continue;
                }

                chat.store().set_pending(line.as_str());
                interrupt.reset();
                match chat.submit_interruptible(&line, &interrupt).await {
                    SubmitOutcome::Failed { notice, .. } => {
                        view.render(&chat.store().snapshot(), &mut renderer);
                        renderer.print_error(&notice);
                    }
                    SubmitOutcome::Busy => {
                        renderer.print_error("A request is still running; try again shortly.");
                    }
                    SubmitOutcome::Ignored
                    | SubmitOutcome::Replied { .. }
                    | SubmitOutcome::Superseded => {}
                }
                view.render(&chat.store().snapshot(), &mut renderer);
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at the prompt.
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {err}"));
                break;
            }
        }
    }

    Ok(())
}

fn build_client(config: &ChatConfig) -> bricktutor::Result<Arc<dyn ModelClient>> {
    let api_key = secrets::resolve_api_key(config.secrets_file.as_deref())?;
    let client = Gemini::with_options(Some(api_key), config.base_url.clone(), Some(config.timeout))?
        .with_model(config.model.clone())
        .with_system_instruction(config.system_instruction.clone())
        .with_generation_config(config.generation.clone())
        .with_logger(Arc::new(TracingLogger));
    Ok(Arc::new(client))
}

fn print_stats(chat: &ChatController, renderer: &mut PlainTextRenderer) {
    let stats = chat.stats();
    let snapshot = chat.store().snapshot();
    let started = snapshot
        .created_at
        .format(&Rfc3339)
        .unwrap_or_else(|_| snapshot.created_at.to_string());
    renderer.print_info("    Session Statistics:");
    renderer.print_info(&format!("      Session: {}", chat.store().id()));
    renderer.print_info(&format!("      Started: {started}"));
    renderer.print_info(&format!("      Messages shown: {}", stats.display_len));
    renderer.print_info(&format!("      History entries: {}", stats.history_len));
    renderer.print_info(&format!(
        "      Unanswered questions: {}",
        stats.orphaned_user_entries
    ));
    renderer.print_info(&format!(
        "      Turns: {} attempted, {} answered, {} failed",
        stats.turns_attempted, stats.turns_succeeded, stats.turns_failed
    ));
}

fn print_config(config: &ChatConfig, renderer: &mut PlainTextRenderer) {
    let generation = &config.generation;
    renderer.print_info("    Current Configuration:");
    renderer.print_info(&format!("      Model: {}", config.model));
    renderer.print_info(&format!(
        "      Temperature: {}",
        describe(generation.temperature)
    ));
    renderer.print_info(&format!("      Top-p: {}", describe(generation.top_p)));
    renderer.print_info(&format!("      Top-k: {}", describe(generation.top_k)));
    renderer.print_info(&format!(
        "      Max output tokens: {}",
        describe(generation.max_output_tokens)
    ));
    renderer.print_info(&format!("      Timeout: {}s", config.timeout.as_secs()));
    match config.system_instruction.as_deref() {
        Some(text) => renderer.print_info(&format!(
            "      System instructions: {} characters",
            text.chars().count()
        )),
        None => renderer.print_info("      System instructions: (none)"),
    }
}

fn describe<T: std::fmt::Display>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "default".to_string())
}

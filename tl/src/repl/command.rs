//! Slash command parsing

use tracing::debug;

/// A parsed REPL command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Start { model: Option<String>, prompt: String },
    Add { id: Option<String>, content: String },
    Run,
    Status,
    Auto { model: Option<String>, prompt: String },
    Hints,
    Help,
    Quit,
}

/// Parse one input line
///
/// The error is a message for the user.
pub fn parse_command(input: &str) -> Result<ReplCommand, String> {
    debug!(%input, "parse_command: called");
    let input = input.trim();
    if !input.starts_with('/') {
        return Err("Commands start with '/'. Type /help for the list.".to_string());
    }

    let (cmd, rest) = match input.split_once(char::is_whitespace) {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (input, ""),
    };

    match cmd {
        "/start" | "/s" => {
            let (model, prompt) = split_model_flag(rest);
            if prompt.is_empty() {
                return Err("Usage: /start [-m provider/model] <prompt>".to_string());
            }
            Ok(ReplCommand::Start { model, prompt })
        }
        "/auto" => {
            let (model, prompt) = split_model_flag(rest);
            if prompt.is_empty() {
                return Err("Usage: /auto [-m provider/model] <prompt>".to_string());
            }
            Ok(ReplCommand::Auto { model, prompt })
        }
        "/add" | "/a" => {
            if rest.is_empty() {
                return Err("Usage: /add [id:] <task content>".to_string());
            }
            Ok(split_task_id(rest))
        }
        "/run" | "/r" => Ok(ReplCommand::Run),
        "/status" | "/st" => Ok(ReplCommand::Status),
        "/hints" => Ok(ReplCommand::Hints),
        "/help" | "/h" => Ok(ReplCommand::Help),
        "/quit" | "/q" | "/exit" => Ok(ReplCommand::Quit),
        _ => Err(format!("Unknown command: {}. Type /help for the list.", cmd)),
    }
}

/// Split a leading `-m <model>` / `--model <model>` off the arguments
fn split_model_flag(rest: &str) -> (Option<String>, String) {
    let mut words = rest.splitn(3, char::is_whitespace);
    match words.next() {
        Some("-m") | Some("--model") => {
            let model = words.next().map(str::to_string);
            let prompt = words.next().unwrap_or_default().trim().to_string();
            (model, prompt)
        }
        _ => (None, rest.to_string()),
    }
}

/// `t1: do it` has id `t1`; anything else has no id
fn split_task_id(rest: &str) -> ReplCommand {
    if let Some((head, tail)) = rest.split_once(char::is_whitespace)
        && let Some(id) = head.strip_suffix(':')
        && !id.is_empty()
        && !tail.trim().is_empty()
    {
        return ReplCommand::Add {
            id: Some(id.to_string()),
            content: tail.trim().to_string(),
        };
    }
    ReplCommand::Add {
        id: None,
        content: rest.to_string(),
    }
}

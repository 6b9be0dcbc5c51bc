use std::num::ParseIntError;

use drill_core::{ActionId, FaultId, UnknownAction};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Begin,
    Select(FaultId),
    /// `fault: None` targets the current selection.
    Act {
        fault: Option<FaultId>,
        action: ActionId,
    },
    Status,
    Actions,
    Debug,
    Retry,
    Accept,
    Exit,
    Help,
}

#[derive(Debug, Error)]
pub enum CommandParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),
    #[error("unexpected argument '{0}'")]
    UnexpectedArgument(String),
    #[error("invalid fault id '{value}': {source}")]
    InvalidFault {
        value: String,
        source: ParseIntError,
    },
    #[error(transparent)]
    InvalidAction(#[from] UnknownAction),
}

pub fn parse_command_line(input: &str) -> Result<ConsoleCommand, CommandParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CommandParseError::Empty);
    }

    let mut parts = trimmed.split_whitespace();
    let verb = parts
        .next()
        .map(|v| v.to_ascii_lowercase())
        .ok_or(CommandParseError::Empty)?;

    let command = match verb.as_str() {
        "begin" | "start" => ConsoleCommand::Begin,
        "select" | "sel" => {
            let fault_str = parts
                .next()
                .ok_or(CommandParseError::MissingArgument("fault"))?;
            ConsoleCommand::Select(parse_fault(fault_str)?)
        }
        "act" | "do" => {
            let first = parts
                .next()
                .ok_or(CommandParseError::MissingArgument("action"))?;
            match parts.next() {
                Some(action_str) => ConsoleCommand::Act {
                    fault: Some(parse_fault(first)?),
                    action: action_str.parse()?,
                },
                None => ConsoleCommand::Act {
                    fault: None,
                    action: first.parse()?,
                },
            }
        }
        "status" | "s" => ConsoleCommand::Status,
        "actions" | "palette" => ConsoleCommand::Actions,
        "debug" => ConsoleCommand::Debug,
        "retry" => ConsoleCommand::Retry,
        "accept" => ConsoleCommand::Accept,
        "exit" | "quit" | "q" => ConsoleCommand::Exit,
        "help" | "?" => ConsoleCommand::Help,
        other if looks_like_fault(other) => {
            let action_str = parts
                .next()
                .ok_or(CommandParseError::MissingArgument("action"))?;
            ConsoleCommand::Act {
                fault: Some(parse_fault(other)?),
                action: action_str.parse()?,
            }
        }
        other => return Err(CommandParseError::UnknownCommand(other.to_string())),
    };

    if let Some(extra) = parts.next() {
        return Err(CommandParseError::UnexpectedArgument(extra.to_string()));
    }
    Ok(command)
}

pub const HELP_TEXT: &[&str] = &[
    "begin                     start the countdown",
    "select <id>               target a threat (evt-0001, #1 or 1)",
    "act <ACTION>              apply an action to the selected threat",
    "act <id> <ACTION>         apply an action to a specific threat",
    "<id> <ACTION>             shorthand for the above",
    "status                    uptime, clock and active threats",
    "actions                   list the command palette",
    "debug                     decay totals and first remedies (--debug only)",
    "accept                    accept the result of a finished drill",
    "retry                     restart a failed drill",
    "exit | quit               leave the console (settle a failed drill first)",
];

fn looks_like_fault(token: &str) -> bool {
    token.starts_with("evt-") || token.starts_with('#')
}

fn parse_fault(value: &str) -> Result<FaultId, CommandParseError> {
    value
        .parse()
        .map_err(|source| CommandParseError::InvalidFault {
            value: value.to_string(),
            source,
        })
}

use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

pub const USAGE: &str = "/check year filename text\nExample:\n/check 2022 diplom.txt Hello Exa";

const COMMAND_START: &str = "/start";
const COMMAND_HELP: &str = "/help";
const COMMAND_CHECK: &str = "/check";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Check {
        year: Option<i32>,
        filename: Option<String>,
        /// Base64 encoded document text.
        content: Vec<u8>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("incorrect command")]
    UnknownCommand,
    #[error("year must be a number, e.g. /check 2022 diplom.txt Hello Exa")]
    InvalidYear,
    #[error("not enough arguments, usage: /check year filename text")]
    MissingArguments,
}

pub fn parse_command(text: &str) -> Result<Command, ParseError> {
    let mut tokens = text.split_whitespace();
    let head = tokens.next().ok_or(ParseError::UnknownCommand)?;

    match strip_bot_mention(head) {
        COMMAND_START | COMMAND_HELP => Ok(Command::Start),
        COMMAND_CHECK => parse_check(tokens),
        _ => Err(ParseError::UnknownCommand),
    }
}

fn parse_check<'a>(mut tokens: impl Iterator<Item = &'a str>) -> Result<Command, ParseError> {
    let year = tokens
        .next()
        .ok_or(ParseError::MissingArguments)?
        .parse::<i32>()
        .map_err(|_| ParseError::InvalidYear)?;
    let filename = tokens.next().ok_or(ParseError::MissingArguments)?;

    let text = tokens.collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        return Err(ParseError::MissingArguments);
    }

    Ok(Command::Check {
        year: Some(year),
        filename: Some(filename.to_string()),
        content: STANDARD.encode(text.as_bytes()).into_bytes(),
    })
}

/// `/check@some_bot` is how Telegram addresses commands in group chats.
fn strip_bot_mention(token: &str) -> &str {
    token.split_once('@').map_or(token, |(command, _)| command)
}

//! Line-command grammar for the emulator session.
//!
//! Commands are a keyword followed by optional `key=value` fields. Numeric
//! values accept decimal or `0x`-prefixed hex. The field grammar is composed
//! from `winnow` combinators over the raw line.

use std::fmt;

use winnow::ascii::{Caseless, digit1, hex_digit1, space0, space1};
use winnow::combinator::{alt, preceded, separated};
use winnow::error::ModalResult;
use winnow::prelude::*;

/// Parsed session command.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Command {
    Send(SendArgs),
    Noise,
    Idle { ticks: u32 },
    Status,
    Help,
}

/// Arguments accepted by `send`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SendArgs {
    /// Transmitted address; defaults to the session's expected address.
    pub address: Option<u8>,
    /// Transmitted data nibble.
    pub data: u8,
    /// Number of complete three-frame transmissions.
    pub repeat: u8,
    /// Waveform skew in percent of nominal (100 = unchanged).
    pub skew_percent: Option<u32>,
}

impl Default for SendArgs {
    fn default() -> Self {
        Self {
            address: None,
            data: 0,
            repeat: 1,
            skew_percent: None,
        }
    }
}

/// Errors surfaced while interpreting a command line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CommandError {
    UnknownCommand(String),
    Syntax(String),
    OutOfRange {
        field: &'static str,
        min: u32,
        max: u32,
    },
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::UnknownCommand(keyword) => {
                write!(f, "unknown command `{keyword}`, try `help`")
            }
            CommandError::Syntax(detail) => write!(f, "syntax: {detail}"),
            CommandError::OutOfRange { field, min, max } => {
                write!(f, "{field} must be in {min}..={max}")
            }
        }
    }
}

/// Parses one command line.
pub fn parse(line: &str) -> Result<Command, CommandError> {
    let trimmed = line.trim();
    let (keyword, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword, rest.trim()),
        None => (trimmed, ""),
    };

    match keyword.to_ascii_lowercase().as_str() {
        "send" => parse_send(rest),
        "noise" => expect_no_args("noise", rest).map(|()| Command::Noise),
        "idle" => parse_idle(rest),
        "status" => expect_no_args("status", rest).map(|()| Command::Status),
        "help" => expect_no_args("help", rest).map(|()| Command::Help),
        other => Err(CommandError::UnknownCommand(other.to_string())),
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum SendField {
    Address(u32),
    Data(u32),
    Repeat(u32),
    Skew(u32),
}

fn number(input: &mut &str) -> ModalResult<u32> {
    alt((
        preceded(
            "0x",
            hex_digit1.try_map(|digits: &str| u32::from_str_radix(digits, 16)),
        ),
        digit1.try_map(str::parse::<u32>),
    ))
    .parse_next(input)
}

fn send_field(input: &mut &str) -> ModalResult<SendField> {
    alt((
        preceded((Caseless("address"), space0, '=', space0), number).map(SendField::Address),
        preceded((Caseless("data"), space0, '=', space0), number).map(SendField::Data),
        preceded((Caseless("repeat"), space0, '=', space0), number).map(SendField::Repeat),
        preceded((Caseless("skew"), space0, '=', space0), number).map(SendField::Skew),
    ))
    .parse_next(input)
}

fn send_fields(input: &mut &str) -> ModalResult<Vec<SendField>> {
    separated(1.., send_field, space1).parse_next(input)
}

fn parse_send(rest: &str) -> Result<Command, CommandError> {
    let mut args = SendArgs::default();
    if rest.is_empty() {
        return Ok(Command::Send(args));
    }

    let fields = send_fields
        .parse(rest)
        .map_err(|err| CommandError::Syntax(err.to_string()))?;
    for field in fields {
        match field {
            SendField::Address(value) => {
                args.address = Some(narrow("address", value, 0, 255)?);
            }
            SendField::Data(value) => args.data = narrow("data", value, 0, 15)?,
            SendField::Repeat(value) => args.repeat = narrow("repeat", value, 1, 8)?,
            SendField::Skew(value) => {
                args.skew_percent = Some(in_range("skew", value, 50, 150)?);
            }
        }
    }
    Ok(Command::Send(args))
}

fn parse_idle(rest: &str) -> Result<Command, CommandError> {
    let ticks = number
        .parse(rest)
        .map_err(|err| CommandError::Syntax(err.to_string()))?;
    let ticks = in_range("ticks", ticks, 1, 100_000)?;
    Ok(Command::Idle { ticks })
}

fn expect_no_args(command: &'static str, rest: &str) -> Result<(), CommandError> {
    if rest.is_empty() {
        Ok(())
    } else {
        Err(CommandError::Syntax(format!(
            "`{command}` takes no arguments"
        )))
    }
}

fn in_range(field: &'static str, value: u32, min: u32, max: u32) -> Result<u32, CommandError> {
    if value < min || value > max {
        return Err(CommandError::OutOfRange { field, min, max });
    }
    Ok(value)
}

fn narrow(field: &'static str, value: u32, min: u32, max: u32) -> Result<u8, CommandError> {
    let value = in_range(field, value, min, max)?;
    Ok(u8::try_from(value).expect("range already checked"))
}

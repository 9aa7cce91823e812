//! Command grammar for the host-side camera console.
//!
//! The emulator drives the control loop interactively; this module parses its
//! command lines into structured values with `winnow` combinators. Keywords
//! are case-insensitive. The grammar lives in the core crate so it is unit
//! tested on the host alongside the logic it exercises.
//!
//! This is an input channel for tooling only — the camera's own diagnostic
//! output remains write-only and is never parsed.

use core::fmt;
use core::time::Duration;

use winnow::ascii::{Caseless, digit1, space1};
use winnow::combinator::{alt, opt, preceded};
use winnow::error::{EmptyError, ErrMode};
use winnow::prelude::*;
use winnow::token::take_while;

type ParseOut<T> = winnow::error::ModalResult<T, EmptyError>;

/// Structured console commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command<'a> {
    /// Press the shutter once on the next tick.
    Press,
    /// Advance the simulated clock, running idle ticks.
    Advance(Duration),
    /// Show device state, counter, and saved files.
    Status,
    /// Arm a fault injection.
    Fail(FaultTarget),
    /// Inspect or maintenance-reset the persistent counter.
    Counter(CounterCommand),
    /// Power-cycle the device, rerunning the boot sequence.
    Reset,
    /// Show help, optionally for one topic.
    Help(Option<&'a str>),
    /// End the session.
    Exit,
}

/// Injectable faults.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FaultTarget {
    /// Next frame acquisition fails.
    Capture,
    /// Next file write fails.
    Write,
    /// Storage mount fails on the next boot.
    Mount,
    /// Sensor initialization fails on the next boot.
    Sensor,
    /// Media reads as absent on the next boot.
    Media,
}

/// Subcommands of `counter`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CounterCommand {
    Show,
    Reset,
}

/// Why a line failed to parse.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// Nothing but whitespace.
    Empty,
    /// No command matched the line.
    Unrecognized,
    /// A command matched but left unconsumed input behind.
    TrailingInput,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Empty => f.write_str("empty command"),
            ParseError::Unrecognized => f.write_str("unrecognized command"),
            ParseError::TrailingInput => f.write_str("unexpected trailing input"),
        }
    }
}

/// Parses one console line.
///
/// # Errors
/// Reports empty, unrecognized, and partially matched lines distinctly.
pub fn parse(line: &str) -> Result<Command<'_>, ParseError> {
    let mut input = line.trim();
    if input.is_empty() {
        return Err(ParseError::Empty);
    }
    match command(&mut input) {
        Ok(cmd) if input.trim_start().is_empty() => Ok(cmd),
        Ok(_) => Err(ParseError::TrailingInput),
        Err(_) => Err(ParseError::Unrecognized),
    }
}

fn command<'a>(input: &mut &'a str) -> ParseOut<Command<'a>> {
    alt((
        keyword("press").value(Command::Press),
        advance,
        keyword("status").value(Command::Status),
        fail,
        counter,
        keyword("reset").value(Command::Reset),
        help,
        alt((keyword("exit"), keyword("quit"))).value(Command::Exit),
    ))
    .parse_next(input)
}

fn advance<'a>(input: &mut &'a str) -> ParseOut<Command<'a>> {
    preceded((keyword("advance"), space1), duration)
        .map(Command::Advance)
        .parse_next(input)
}

fn fail<'a>(input: &mut &'a str) -> ParseOut<Command<'a>> {
    preceded(
        (keyword("fail"), space1),
        alt((
            keyword("capture").value(FaultTarget::Capture),
            keyword("write").value(FaultTarget::Write),
            keyword("mount").value(FaultTarget::Mount),
            keyword("sensor").value(FaultTarget::Sensor),
            keyword("media").value(FaultTarget::Media),
        )),
    )
    .map(Command::Fail)
    .parse_next(input)
}

fn counter<'a>(input: &mut &'a str) -> ParseOut<Command<'a>> {
    preceded(
        keyword("counter"),
        opt(preceded(
            space1,
            alt((
                keyword("show").value(CounterCommand::Show),
                keyword("reset").value(CounterCommand::Reset),
            )),
        )),
    )
    .map(|sub| Command::Counter(sub.unwrap_or(CounterCommand::Show)))
    .parse_next(input)
}

fn help<'a>(input: &mut &'a str) -> ParseOut<Command<'a>> {
    preceded(keyword("help"), opt(preceded(space1, word)))
        .map(Command::Help)
        .parse_next(input)
}

/// Duration literal: digits with an optional `ms`, `s`, or `m` suffix.
/// A bare integer means milliseconds.
fn duration(input: &mut &str) -> ParseOut<Duration> {
    let digits = digit1.parse_next(input)?;
    let value: u64 = digits
        .parse()
        .map_err(|_| ErrMode::Backtrack(EmptyError))?;
    let unit = opt(alt((Caseless("ms"), Caseless("s"), Caseless("m")))).parse_next(input)?;
    let duration = match unit {
        Some(unit) if unit.eq_ignore_ascii_case("ms") => Duration::from_millis(value),
        Some(unit) if unit.eq_ignore_ascii_case("s") => Duration::from_secs(value),
        Some(_) => Duration::from_secs(value.saturating_mul(60)),
        None => Duration::from_millis(value),
    };
    Ok(duration)
}

fn word<'a>(input: &mut &'a str) -> ParseOut<&'a str> {
    take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '-').parse_next(input)
}

fn keyword<'a>(expected: &'static str) -> impl Parser<&'a str, &'a str, ErrMode<EmptyError>> {
    word.verify(move |candidate: &&str| candidate.eq_ignore_ascii_case(expected))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_commands_parse() {
        assert_eq!(parse("press"), Ok(Command::Press));
        assert_eq!(parse("status"), Ok(Command::Status));
        assert_eq!(parse("reset"), Ok(Command::Reset));
        assert_eq!(parse("exit"), Ok(Command::Exit));
        assert_eq!(parse("quit"), Ok(Command::Exit));
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!(parse("PRESS"), Ok(Command::Press));
        assert_eq!(parse("Fail Capture"), Ok(Command::Fail(FaultTarget::Capture)));
    }

    #[test]
    fn advance_accepts_unit_suffixes() {
        assert_eq!(
            parse("advance 500ms"),
            Ok(Command::Advance(Duration::from_millis(500)))
        );
        assert_eq!(
            parse("advance 5s"),
            Ok(Command::Advance(Duration::from_secs(5)))
        );
        assert_eq!(
            parse("advance 5m"),
            Ok(Command::Advance(Duration::from_secs(300)))
        );
        assert_eq!(
            parse("advance 250"),
            Ok(Command::Advance(Duration::from_millis(250)))
        );
    }

    #[test]
    fn fail_targets_parse() {
        assert_eq!(parse("fail write"), Ok(Command::Fail(FaultTarget::Write)));
        assert_eq!(parse("fail mount"), Ok(Command::Fail(FaultTarget::Mount)));
        assert_eq!(parse("fail sensor"), Ok(Command::Fail(FaultTarget::Sensor)));
        assert_eq!(parse("fail media"), Ok(Command::Fail(FaultTarget::Media)));
    }

    #[test]
    fn counter_defaults_to_show() {
        assert_eq!(parse("counter"), Ok(Command::Counter(CounterCommand::Show)));
        assert_eq!(
            parse("counter show"),
            Ok(Command::Counter(CounterCommand::Show))
        );
        assert_eq!(
            parse("counter reset"),
            Ok(Command::Counter(CounterCommand::Reset))
        );
    }

    #[test]
    fn help_takes_an_optional_topic() {
        assert_eq!(parse("help"), Ok(Command::Help(None)));
        assert_eq!(parse("help advance"), Ok(Command::Help(Some("advance"))));
    }

    #[test]
    fn junk_is_rejected() {
        assert_eq!(parse("   "), Err(ParseError::Empty));
        assert_eq!(parse("selfie"), Err(ParseError::Unrecognized));
        assert_eq!(parse("fail everything"), Err(ParseError::Unrecognized));
        assert_eq!(parse("press harder"), Err(ParseError::TrailingInput));
    }
}

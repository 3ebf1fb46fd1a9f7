//! Inbound command parsing.

/// A parsed inbound command.
///
/// Only the verb is case-folded; the argument keeps its original spelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `Execute`: start a background task.
    Execute,
    /// `Check <id>`: query a task.
    Check(String),
    /// `Cancel <id>`: request cancellation of a task.
    Cancel(String),
    /// A known verb that needs an argument but got none.
    MissingArgument(Verb),
    /// Anything else.
    Unrecognized,
}

/// Verbs that take a task id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Check,
    Cancel,
}

impl Command {
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        let (verb, arg) = match input.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (input, ""),
        };

        match (verb.to_ascii_lowercase().as_str(), arg) {
            ("execute", "") => Command::Execute,
            ("check", "") => Command::MissingArgument(Verb::Check),
            ("check", id) => Command::Check(id.to_string()),
            ("cancel", "") => Command::MissingArgument(Verb::Cancel),
            ("cancel", id) => Command::Cancel(id.to_string()),
            _ => Command::Unrecognized,
        }
    }
}

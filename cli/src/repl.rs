//! Line commands understood by the interactive prompt.

use std::fmt;

pub const HELP: &str = "\
commands:
  name <text>          set the draft name
  description <text>   set the draft description
  submit               create a todo from the draft
  refresh              reload the list from the server
  show                 print the page
  sign-out             end the session and exit
  help                 print this message
  quit                 exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Name(String),
    Description(String),
    Submit,
    Refresh,
    Show,
    SignOut,
    Help,
    Quit,
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCommand(pub String);

impl fmt::Display for UnknownCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown command `{}` (try `help`)", self.0)
    }
}

impl std::error::Error for UnknownCommand {}

/// Parse one prompt line. Field text is kept as typed after the first space,
/// so `name` alone clears the field.
pub fn parse(line: &str) -> Result<Input, UnknownCommand> {
    let line = line.trim_end_matches(['\r', '\n']);
    let trimmed = line.trim_start();
    let (word, rest) = match trimmed.split_once(' ') {
        Some((word, rest)) => (word, rest),
        None => (trimmed.trim_end(), ""),
    };

    Ok(match word {
        "" => Input::Empty,
        "name" => Input::Name(rest.to_string()),
        "description" | "desc" => Input::Description(rest.to_string()),
        "submit" => Input::Submit,
        "refresh" => Input::Refresh,
        "show" | "ls" => Input::Show,
        "sign-out" | "signout" => Input::SignOut,
        "help" | "?" => Input::Help,
        "quit" | "exit" => Input::Quit,
        other => return Err(UnknownCommand(other.to_string())),
    })
}

//! Line-based user intents for the interactive console.

pub const HELP: &str = "\
Commands:
  id <patient id>          set the Patient ID
  diagnosis <text>         set the diagnosis
  treatment <text>         set the treatment
  provider <address>       set the Provider Address
  fetch                    fetch records for the Patient ID
  add                      add a record for the Patient ID
  authorize                authorize the Provider Address (owner only)
  show                     redraw the current state
  help                     show this help
  quit                     exit";

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    SubjectId(String),
    Diagnosis(String),
    Treatment(String),
    ProviderAddress(String),
    Fetch,
    Add,
    Authorize,
    Show,
    Help,
    Quit,
}

/// Parse one input line. `None` for a blank line; `Err` carries the unknown word.
///
/// Field values are taken verbatim after the keyword so that validation sees exactly
/// what was typed, including an empty value.
pub fn parse(line: &str) -> Option<Result<Command, String>> {
    let line = line.trim_start();
    if line.trim().is_empty() {
        return None;
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim_end_matches(['\r', '\n']).to_string()),
        None => (line.trim_end(), String::new()),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "id" | "patient" => Command::SubjectId(rest),
        "diagnosis" => Command::Diagnosis(rest),
        "treatment" => Command::Treatment(rest),
        "provider" => Command::ProviderAddress(rest),
        "fetch" => Command::Fetch,
        "add" => Command::Add,
        "authorize" | "authorise" => Command::Authorize,
        "show" => Command::Show,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ => return Some(Err(word.to_string())),
    };
    Some(Ok(command))
}

//! Shell command parsing

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Load(PathBuf),
    Warnings(Option<String>),
    Suggestions(Option<String>),
    Apply(String),
    Skip(String),
    ApplyAll,
    Export(PathBuf),
    Review,
    ReviewApply { file: String, line: i64 },
    ReviewSkip { file: String, line: i64 },
    Write,
    Help,
    Exit,
}

/// Command keywords with their help text, in display order
pub const HELP: &[(&str, &str)] = &[
    ("load <path>", "Load an annotation file, replacing the current set"),
    ("warnings [file]", "List errors and warnings"),
    ("suggestions [file]", "List suggestions and their status"),
    ("apply <id>", "Apply one suggestion"),
    ("skip <id>", "Mark a suggestion as skipped"),
    ("apply-all", "Apply every pending suggestion"),
    ("export <path>", "Write the applied suggestions to a JSON file"),
    ("review", "Summarize pending, applied, and skipped suggestions"),
    ("review-apply <file> <line>", "Apply the suggestion under a cursor position"),
    ("review-skip <file> <line>", "Skip the suggestion under a cursor position"),
    ("write", "Save edited files to disk"),
    ("help", "Show available commands"),
    ("exit", "Leave margin"),
];

/// Parse one input line. `Ok(None)` for a blank line.
pub fn parse(input: &str) -> Result<Option<Command>, String> {
    let mut words = input.split_whitespace();
    let Some(keyword) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let command = match (keyword.to_lowercase().as_str(), args.as_slice()) {
        ("load", [path]) => Command::Load(PathBuf::from(path)),
        ("warnings", []) => Command::Warnings(None),
        ("warnings", [file]) => Command::Warnings(Some(file.to_string())),
        ("suggestions", []) => Command::Suggestions(None),
        ("suggestions", [file]) => Command::Suggestions(Some(file.to_string())),
        ("apply", [id]) => Command::Apply(id.to_string()),
        ("skip", [id]) => Command::Skip(id.to_string()),
        ("apply-all", []) => Command::ApplyAll,
        ("export", [path]) => Command::Export(PathBuf::from(path)),
        ("review", []) => Command::Review,
        ("review-apply", [file, line]) => Command::ReviewApply {
            file: file.to_string(),
            line: parse_line(line)?,
        },
        ("review-skip", [file, line]) => Command::ReviewSkip {
            file: file.to_string(),
            line: parse_line(line)?,
        },
        ("write", []) => Command::Write,
        ("help" | "h" | "?", []) => Command::Help,
        ("exit" | "quit", []) => Command::Exit,
        (word, _) => return Err(usage(word)),
    };
    Ok(Some(command))
}

fn parse_line(raw: &str) -> Result<i64, String> {
    raw.parse()
        .map_err(|_| format!("Invalid line number: {raw}"))
}

fn usage(word: &str) -> String {
    match HELP.iter().find(|(syntax, _)| syntax.split(' ').next() == Some(word)) {
        Some((syntax, _)) => format!("Usage: {syntax}"),
        None => format!("Unknown command: {word}. Type 'help' for list."),
    }
}

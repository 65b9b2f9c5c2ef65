use crate::core::shell::{parse_date, COMMANDS};
use once_cell::sync::Lazy;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::FileHistory;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{
    CompletionType, Config as RustylineConfig, Context, EditMode, Editor, Helper, Result,
};
use std::env;
use std::path::PathBuf;

static HISTORY_PATH: Lazy<PathBuf> = Lazy::new(|| {
    env::var("HOME")
        .map(|home| PathBuf::from(home).join(".formd.history"))
        .unwrap_or_else(|_| PathBuf::from(".formd.history"))
});

pub struct ReplHelper;

impl Completer for ReplHelper {
    type Candidate = Pair;

    fn complete(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Result<(usize, Vec<Pair>)> {
        let prefix = &line[..pos];
        if prefix.contains(char::is_whitespace) {
            return Ok((pos, vec![]));
        }

        let candidates = COMMANDS
            .iter()
            .filter(|cmd| cmd.starts_with(prefix))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();

        Ok((0, candidates))
    }
}

impl Highlighter for ReplHelper {}

impl Validator for ReplHelper {
    fn validate(&self, ctx: &mut ValidationContext) -> Result<ValidationResult> {
        Ok(validate_line(ctx.input()))
    }
}

/// Rejects `/filings` lines whose dates would not parse, before they are
/// submitted.
fn validate_line(input: &str) -> ValidationResult {
    let words: Vec<&str> = input.split_whitespace().collect();
    if words.first() != Some(&"/filings") {
        return ValidationResult::Valid(None);
    }

    for word in words.iter().skip(1) {
        if let Err(e) = parse_date(word) {
            return ValidationResult::Invalid(Some(format!("  {}", e)));
        }
    }

    ValidationResult::Valid(None)
}

impl Hinter for ReplHelper {
    type Hint = String;

    fn hint(&self, _line: &str, _pos: usize, _ctx: &Context<'_>) -> Option<Self::Hint> {
        None
    }
}

impl Helper for ReplHelper {}

pub fn create_editor() -> Result<Editor<ReplHelper, FileHistory>> {
    log::debug!("Creating rustyline editor configuration");
    let rustyline_config = RustylineConfig::builder()
        .completion_type(CompletionType::List)
        .edit_mode(EditMode::Emacs)
        .build();

    let mut rl = Editor::<ReplHelper, FileHistory>::with_config(rustyline_config)?;

    if rl.load_history(&*HISTORY_PATH).is_err() {
        log::debug!("No previous history file found");
    } else {
        log::debug!("History loaded successfully");
    }

    rl.set_helper(Some(ReplHelper));
    Ok(rl)
}

pub fn save_history(rl: &mut Editor<ReplHelper, FileHistory>) -> Result<()> {
    rl.save_history(&*HISTORY_PATH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_filings_dates() {
        assert!(matches!(
            validate_line("/filings 2024-01-01 2024-01-31"),
            ValidationResult::Valid(None)
        ));
        assert!(matches!(
            validate_line("/filings 2024-13-01 2024-01-31"),
            ValidationResult::Invalid(Some(_))
        ));
        assert!(matches!(
            validate_line("what is a Form D?"),
            ValidationResult::Valid(None)
        ));
    }
}

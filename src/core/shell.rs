use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use std::path::PathBuf;
use std::str::FromStr;

use super::session::Session;
use super::types::FilingsBackend;
use crate::chat::{require_credential, MISSING_CREDENTIAL};
use crate::edgar::filing::FilingRecord;
use crate::edgar::query::SearchQuery;
use crate::render::{self, ExportFormat};

pub const NO_FILINGS: &str = "No filings found or an error occurred.";

pub const COMMANDS: &[&str] = &[
    "/filings", "/show", "/key", "/export", "/clear", "/help", "quit",
];

pub const HELP: &str = "\
/filings <start> <end>      fetch Form D filings between two dates (YYYY-MM-DD)
/show                       show the last results again
/export <csv|html> <path>   write the last results to a file
/key <api key>              set the OpenAI API key used by the chat
/clear                      reset the chat conversation
/help                       show this help
quit                        leave
Anything else is sent to the chat assistant.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Filings(SearchQuery),
    Show,
    Export(ExportFormat, PathBuf),
    Key(String),
    Clear,
    Help,
    Quit,
    Chat(String),
}

pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| anyhow!("Invalid date {}: expected YYYY-MM-DD", value))
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        if line.is_empty() {
            return Err(anyhow!("Empty input"));
        }
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            return Ok(Command::Quit);
        }
        if !line.starts_with('/') {
            return Ok(Command::Chat(line.to_string()));
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            ["/filings", start, end] => Ok(Command::Filings(SearchQuery::new(
                parse_date(start)?,
                parse_date(end)?,
            ))),
            ["/filings", ..] => Err(anyhow!("Usage: /filings <start> <end>")),
            ["/show"] => Ok(Command::Show),
            ["/export", format, path] => {
                let format = ExportFormat::from_str(&format.to_lowercase())
                    .map_err(|_| anyhow!("Unknown export format {}: use csv or html", format))?;
                Ok(Command::Export(format, PathBuf::from(path)))
            }
            ["/export", ..] => Err(anyhow!("Usage: /export <csv|html> <path>")),
            ["/key", key] => Ok(Command::Key(key.to_string())),
            ["/key", ..] => Err(anyhow!("Usage: /key <api key>")),
            ["/clear"] => Ok(Command::Clear),
            ["/help"] => Ok(Command::Help),
            [other, ..] => Err(anyhow!("Unknown command: {}", other)),
            [] => Err(anyhow!("Empty input")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Table(Vec<FilingRecord>),
    Message(String),
    Error(String),
    Assistant(String),
    Quit,
}

pub struct Shell<B> {
    backend: B,
    session: Session,
}

impl<B: FilingsBackend> Shell<B> {
    pub fn new(backend: B, session: Session) -> Self {
        Self { backend, session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Call once the replies of a command have been shown.
    pub fn rendered(&mut self) {
        self.session.finish_render();
    }

    pub async fn dispatch(&mut self, line: &str) -> Vec<Reply> {
        match Command::from_str(line) {
            Ok(command) => self.handle(command).await,
            Err(e) => vec![Reply::Error(e.to_string())],
        }
    }

    pub async fn handle(&mut self, command: Command) -> Vec<Reply> {
        log::debug!("Handling {:?} in phase {}", command, self.session.phase());
        match command {
            Command::Filings(query) => self.run_query(query).await,
            Command::Show => match self.session.results() {
                Some(records) => vec![Reply::Table(records.to_vec())],
                None => vec![Reply::Message("No filings loaded yet.".to_string())],
            },
            Command::Export(format, path) => vec![self.export(format, &path)],
            Command::Key(key) => {
                self.session.set_credential(key);
                vec![Reply::Message("API key set for this session.".to_string())]
            }
            Command::Clear => {
                self.session.chat_mut().clear();
                vec![Reply::Message("Chat history cleared.".to_string())]
            }
            Command::Help => vec![Reply::Message(HELP.to_string())],
            Command::Quit => vec![Reply::Quit],
            Command::Chat(prompt) => vec![self.chat(&prompt).await],
        }
    }

    async fn run_query(&mut self, query: SearchQuery) -> Vec<Reply> {
        if let Err(e) = self.session.begin_query(query.clone()) {
            return vec![Reply::Error(e.to_string())];
        }

        match self.backend.run_query(&query).await {
            Ok(records) if !records.is_empty() => match self.session.complete_query(records) {
                Ok(stored) => vec![Reply::Table(stored.to_vec())],
                Err(e) => vec![Reply::Error(e.to_string())],
            },
            Ok(_) => {
                self.session.abandon_query();
                vec![Reply::Message(NO_FILINGS.to_string())]
            }
            Err(failure) => {
                log::error!("{}", failure);
                self.session.abandon_query();
                vec![
                    Reply::Error(failure.to_string()),
                    Reply::Message(NO_FILINGS.to_string()),
                ]
            }
        }
    }

    fn export(&self, format: ExportFormat, path: &std::path::Path) -> Reply {
        let Some(records) = self.session.results() else {
            return Reply::Message("No filings to export. Run /filings first.".to_string());
        };
        match render::export(format, path, records) {
            Ok(()) => Reply::Message(format!(
                "Exported {} filings to {}",
                records.len(),
                path.display()
            )),
            Err(e) => Reply::Error(format!("Export failed: {}", e)),
        }
    }

    async fn chat(&mut self, prompt: &str) -> Reply {
        // Chat needs a key; the filings side never does.
        let api_key = match require_credential(self.session.credential()) {
            Ok(key) => key.to_string(),
            Err(_) => return Reply::Message(MISSING_CREDENTIAL.to_string()),
        };

        let messages = self.session.chat().with_prompt(prompt);
        match self.backend.chat(&api_key, &messages).await {
            Ok(reply) => {
                self.session.chat_mut().record_exchange(prompt, &reply);
                Reply::Assistant(reply)
            }
            Err(e) => Reply::Error(format!("Chat failed: {}", e)),
        }
    }
}

use anyhow::{anyhow, Result};
use strum::Display;

use crate::chat::ChatHistory;
use crate::edgar::filing::FilingRecord;
use crate::edgar::query::SearchQuery;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Phase {
    Idle,
    AwaitingQuery,
    Rendering,
}

/// Everything the shell remembers between commands. Created once at startup;
/// the result set is replaced, never merged, by each successful query.
#[derive(Debug)]
pub struct Session {
    phase: Phase,
    pending: Option<SearchQuery>,
    results: Option<Vec<FilingRecord>>,
    chat: ChatHistory,
    credential: Option<String>,
}

impl Session {
    pub fn new(credential: Option<String>) -> Self {
        Session {
            phase: Phase::Idle,
            pending: None,
            results: None,
            chat: ChatHistory::new(),
            credential,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn pending_query(&self) -> Option<&SearchQuery> {
        self.pending.as_ref()
    }

    pub fn begin_query(&mut self, query: SearchQuery) -> Result<()> {
        if self.phase == Phase::AwaitingQuery {
            return Err(anyhow!("A query is already running"));
        }
        self.pending = Some(query);
        self.phase = Phase::AwaitingQuery;
        Ok(())
    }

    pub fn complete_query(&mut self, records: Vec<FilingRecord>) -> Result<&[FilingRecord]> {
        if self.phase != Phase::AwaitingQuery {
            return Err(anyhow!("No query is running (phase: {})", self.phase));
        }
        self.pending = None;
        self.phase = Phase::Rendering;
        Ok(self.results.insert(records).as_slice())
    }

    /// A failed or empty query leaves the previous results in place.
    pub fn abandon_query(&mut self) {
        self.pending = None;
        self.phase = Phase::Idle;
    }

    pub fn finish_render(&mut self) {
        if self.phase == Phase::Rendering {
            self.phase = Phase::Idle;
        }
    }

    pub fn results(&self) -> Option<&[FilingRecord]> {
        self.results.as_deref()
    }

    pub fn chat(&self) -> &ChatHistory {
        &self.chat
    }

    pub fn chat_mut(&mut self) -> &mut ChatHistory {
        &mut self.chat
    }

    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    pub fn set_credential(&mut self, credential: String) {
        self.credential = Some(credential);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(None)
    }
}

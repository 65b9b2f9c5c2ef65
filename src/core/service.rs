use super::config::FormDConfig;
use super::types::FilingsBackend;
use crate::chat::{ChatClient, ChatMessage};
use crate::edgar::{
    self,
    client::{EdgarClient, FilingSource, RequestFailure},
    filing::FilingRecord,
    query::SearchQuery,
};
use crate::utils::progress::ProgressTracker;
use anyhow::Result;

pub struct FormDService<S = EdgarClient> {
    source: S,
    chat_client: ChatClient,
    show_progress: bool,
}

impl FormDService<EdgarClient> {
    pub fn from_config(config: &FormDConfig, show_progress: bool) -> Result<Self> {
        Ok(Self::new(
            EdgarClient::new(config)?,
            ChatClient::new(config)?,
            show_progress,
        ))
    }
}

impl<S: FilingSource> FormDService<S> {
    pub fn new(source: S, chat_client: ChatClient, show_progress: bool) -> Self {
        Self {
            source,
            chat_client,
            show_progress,
        }
    }
}

#[async_trait::async_trait]
impl<S: FilingSource> FilingsBackend for FormDService<S> {
    async fn run_query(&self, query: &SearchQuery) -> Result<Vec<FilingRecord>, RequestFailure> {
        let tracker = if self.show_progress {
            ProgressTracker::new()
        } else {
            ProgressTracker::hidden()
        };
        edgar::fetch_form_d_filings(&self.source, query, Some(&tracker)).await
    }

    async fn chat(&self, api_key: &str, messages: &[ChatMessage]) -> Result<String> {
        self.chat_client.complete(api_key, messages).await
    }
}

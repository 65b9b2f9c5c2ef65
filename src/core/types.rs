use anyhow::Result;

use crate::chat::ChatMessage;
use crate::edgar::client::RequestFailure;
use crate::edgar::filing::FilingRecord;
use crate::edgar::query::SearchQuery;

#[async_trait::async_trait]
pub trait FilingsBackend: Send + Sync {
    async fn run_query(&self, query: &SearchQuery) -> Result<Vec<FilingRecord>, RequestFailure>;

    async fn chat(&self, api_key: &str, messages: &[ChatMessage]) -> Result<String>;
}

use serde::{Deserialize, Serialize};

use super::client::{FilingSource, RequestFailure};
use super::query::SearchQuery;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchResponse {
    pub hits: HitsEnvelope,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HitsEnvelope {
    pub hits: Vec<RawHit>,
}

/// One search result item. Everything is optional: the index omits fields
/// freely and a missing value must never fail the whole response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawHit {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    #[serde(rename = "_source")]
    pub source: HitSource,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HitSource {
    pub ciks: Option<Vec<String>>,
    pub display_names: Option<Vec<String>>,
    pub file_date: Option<String>,
    pub biz_locations: Option<Vec<String>>,
    pub adsh: Option<String>,
    pub form: Option<String>,
}

pub fn parse_search_response(body: &str) -> Result<Vec<RawHit>, RequestFailure> {
    let response: SearchResponse = serde_json::from_str(body)
        .map_err(|e| RequestFailure::new(format!("Failed to parse search JSON: {}", e)))?;
    Ok(response.hits.hits)
}

pub async fn fetch<S>(source: &S, query: &SearchQuery) -> Result<Vec<RawHit>, RequestFailure>
where
    S: FilingSource + ?Sized,
{
    log::info!(
        "Searching Form {} filings from {} to {}",
        query.form_type,
        query.start_date,
        query.end_date
    );

    let body = source.search(query).await?;
    let hits = parse_search_response(&body)?;

    log::info!("Search returned {} hits", hits.len());
    Ok(hits)
}

pub mod client;
pub mod detail;
pub mod filing;
pub mod query;
pub mod search;

use client::{FilingSource, RequestFailure};
use filing::FilingRecord;
use query::SearchQuery;

use crate::utils::progress::ProgressTracker;

/// Searches, enriches and filters Form D filings for the query's date range.
pub async fn fetch_form_d_filings<S>(
    source: &S,
    query: &SearchQuery,
    progress: Option<&ProgressTracker>,
) -> Result<Vec<FilingRecord>, RequestFailure>
where
    S: FilingSource + ?Sized,
{
    let hits = search::fetch(source, query).await?;
    let records = filing::normalize(source, &hits, progress).await;
    log::info!(
        "{} of {} filings list related persons",
        records.len(),
        hits.len()
    );
    Ok(records)
}

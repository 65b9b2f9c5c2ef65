use itertools::Itertools;
use serde::{Deserialize, Serialize};

use super::client::FilingSource;
use super::detail::{self, Enrichment};
use super::search::RawHit;
use crate::utils::progress::ProgressTracker;

pub const NO_LINKS: &str = "No links available";
pub const UNKNOWN_FILE_DATE: &str = "Unknown";
pub const MISSING_ADSH: &str = "N/A";
pub const PRIMARY_DOC_PATH: &str = "xslFormDX01/primary_doc.xml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingRecord {
    pub company_name: String,
    pub file_date: String,
    pub business_locations: String,
    pub detail_link: String,
    pub related_persons: String,
    pub phone_number: String,
    pub total_offering_amount: String,
    pub total_amount_sold: String,
}

impl FilingRecord {
    pub fn amounts(&self) -> String {
        format!("{} / {}", self.total_offering_amount, self.total_amount_sold)
    }

    pub fn detail_urls(&self) -> Vec<&str> {
        if self.detail_link == NO_LINKS {
            return Vec::new();
        }
        self.detail_link
            .split(", ")
            .filter(|url| !url.is_empty())
            .collect()
    }
}

/// A hit flattened for display, still carrying the identifiers needed to
/// fetch its detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFiling {
    pub cik: String,
    pub adsh: String,
    pub company_name: String,
    pub file_date: String,
    pub business_locations: String,
    pub detail_link: String,
    pub fetch_url: Option<String>,
}

impl PendingFiling {
    pub fn from_hit(hit: &RawHit, archives_url: &str) -> Self {
        let source = &hit.source;
        let ciks = source.ciks.clone().unwrap_or_default();
        let adsh = source.adsh.clone().unwrap_or_default();

        let urls: Vec<String> = if ciks.is_empty() || adsh.is_empty() {
            Vec::new()
        } else {
            ciks.iter()
                .map(|cik| detail_url(archives_url, cik, &adsh))
                .collect()
        };

        let detail_link = if urls.is_empty() {
            NO_LINKS.to_string()
        } else {
            urls.join(", ")
        };

        PendingFiling {
            cik: ciks.iter().map(|cik| strip_leading_zeros(cik)).join(", "),
            adsh: source
                .adsh
                .as_deref()
                .unwrap_or(MISSING_ADSH)
                .replace('-', ""),
            company_name: source.display_names.clone().unwrap_or_default().join(", "),
            file_date: source
                .file_date
                .clone()
                .unwrap_or_else(|| UNKNOWN_FILE_DATE.to_string()),
            business_locations: source.biz_locations.clone().unwrap_or_default().join(", "),
            detail_link,
            fetch_url: urls.into_iter().next(),
        }
    }

    pub fn into_record(self, enrichment: Enrichment) -> FilingRecord {
        FilingRecord {
            company_name: self.company_name,
            file_date: self.file_date,
            business_locations: self.business_locations,
            detail_link: self.detail_link,
            related_persons: enrichment.related_persons.join(", "),
            phone_number: enrichment.phone_number,
            total_offering_amount: enrichment.total_offering_amount,
            total_amount_sold: enrichment.total_amount_sold,
        }
    }
}

pub fn strip_leading_zeros(cik: &str) -> &str {
    cik.trim_start_matches('0')
}

pub fn detail_url(archives_url: &str, cik: &str, adsh: &str) -> String {
    format!(
        "{}/{}/{}/{}",
        archives_url.trim_end_matches('/'),
        strip_leading_zeros(cik),
        adsh.replace('-', ""),
        PRIMARY_DOC_PATH
    )
}

/// Flattens and enriches the hits in order, one detail request at a time,
/// then keeps the filings that name at least one related person.
pub async fn normalize<S>(
    source: &S,
    hits: &[RawHit],
    progress: Option<&ProgressTracker>,
) -> Vec<FilingRecord>
where
    S: FilingSource + ?Sized,
{
    if let Some(tracker) = progress {
        tracker.start_progress(hits.len() as u64, "Fetching detail pages");
    }

    let mut records = Vec::with_capacity(hits.len());
    for hit in hits {
        let pending = PendingFiling::from_hit(hit, source.archives_url());

        if let Some(tracker) = progress {
            tracker.update_message(&pending.company_name);
        }

        let enrichment = match pending.fetch_url.as_deref() {
            Some(url) => match detail::fetch_enrichment(source, url).await {
                Ok(enrichment) => enrichment,
                Err(e) => {
                    log::warn!(
                        "Skipping detail page for {} (CIK {}): {}",
                        pending.company_name,
                        pending.cik,
                        e
                    );
                    Enrichment::not_found()
                }
            },
            None => {
                log::debug!("No detail link for {}", pending.company_name);
                Enrichment::not_found()
            }
        };

        records.push(pending.into_record(enrichment));

        if let Some(tracker) = progress {
            tracker.increment(1);
        }
    }

    if let Some(tracker) = progress {
        log::debug!("Fetched {} of {} detail pages", tracker.position(), hits.len());
        tracker.finish();
    }

    retain_with_related_persons(records)
}

pub fn retain_with_related_persons(mut records: Vec<FilingRecord>) -> Vec<FilingRecord> {
    records.retain(|record| !record.related_persons.is_empty());
    records
}

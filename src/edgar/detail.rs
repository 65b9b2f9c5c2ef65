use anyhow::Result;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use super::client::FilingSource;

pub const NOT_FOUND: &str = "Not Found";
pub const INDEFINITE: &str = "Indefinite";
// Blank offering amount without an "X" in the indefinite checkbox
pub const INDEFINITE_FALLBACK: &str = "Unknown";

pub const RELATED_PERSONS_LABEL: &str = "Related Persons";
pub const PHONE_HEADER: &str = "Phone Number of Issuer";
pub const TOTAL_OFFERING_LABEL: &str = "Total Offering Amount";
pub const TOTAL_SOLD_LABEL: &str = "Total Amount Sold";

pub const RELATED_PERSON_ROWS: usize = 2;
// Name cells run last-name first
pub const REVERSE_NAME_COLUMNS: bool = true;

static TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table").expect("valid selector"));
static CAPTION: Lazy<Selector> = Lazy::new(|| Selector::parse("caption").expect("valid selector"));
static TR: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("valid selector"));
static TD: Lazy<Selector> = Lazy::new(|| Selector::parse("td").expect("valid selector"));
static TH: Lazy<Selector> = Lazy::new(|| Selector::parse("th").expect("valid selector"));
static FORM_DATA: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span.FormData").expect("valid selector"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrichment {
    pub related_persons: Vec<String>,
    pub phone_number: String,
    pub total_offering_amount: String,
    pub total_amount_sold: String,
}

impl Enrichment {
    pub fn not_found() -> Self {
        Enrichment {
            related_persons: Vec::new(),
            phone_number: NOT_FOUND.to_string(),
            total_offering_amount: NOT_FOUND.to_string(),
            total_amount_sold: NOT_FOUND.to_string(),
        }
    }
}

pub async fn fetch_enrichment<S>(source: &S, url: &str) -> Result<Enrichment>
where
    S: FilingSource + ?Sized,
{
    let content = source.fetch_document(url).await?;
    Ok(extract_from_str(&content))
}

pub fn extract_from_str(raw_html: &str) -> Enrichment {
    let document = Html::parse_document(raw_html);
    extract(&document)
}

pub fn extract(document: &Html) -> Enrichment {
    let (total_offering_amount, total_amount_sold) = extract_offering_amounts(document);
    Enrichment {
        related_persons: extract_related_persons(document),
        phone_number: extract_phone_number(document),
        total_offering_amount,
        total_amount_sold,
    }
}

pub fn extract_related_persons(document: &Html) -> Vec<String> {
    let mut related_persons = Vec::new();

    for table in document.select(&TABLE).filter(|t| is_related_persons_table(*t)) {
        // Skip header row
        for row in table.select(&TR).skip(1).take(RELATED_PERSON_ROWS) {
            // Blank cells are dropped so names carry no stray spaces
            let mut cols: Vec<String> = row
                .select(&TD)
                .map(cell_text)
                .filter(|text| !text.is_empty())
                .collect();
            if cols.is_empty() {
                continue;
            }
            if REVERSE_NAME_COLUMNS {
                cols.reverse();
            }
            related_persons.push(cols.join(" "));
        }
    }

    related_persons
}

fn is_related_persons_table(table: ElementRef) -> bool {
    if table.value().attr("summary") == Some(RELATED_PERSONS_LABEL) {
        return true;
    }
    table
        .select(&CAPTION)
        .next()
        .map(|caption| cell_text(caption) == RELATED_PERSONS_LABEL)
        .unwrap_or(false)
}

pub fn extract_phone_number(document: &Html) -> String {
    let Some(header) = document
        .select(&TH)
        .find(|th| cell_text(*th) == PHONE_HEADER)
    else {
        return NOT_FOUND.to_string();
    };

    // Headers and data cells line up across the rows of the enclosing table
    // body, so the header's column picks the data cell.
    let Some(scope) = header
        .parent()
        .and_then(|row| row.parent())
        .and_then(ElementRef::wrap)
    else {
        return NOT_FOUND.to_string();
    };

    let index = scope
        .select(&TH)
        .position(|th| th.id() == header.id())
        .unwrap_or(0);
    let cells: Vec<ElementRef> = scope.select(&TD).collect();

    cells
        .get(index)
        .or_else(|| cells.last())
        .map(|td| cell_text(*td))
        .unwrap_or_else(|| NOT_FOUND.to_string())
}

/// Returns `(total offering amount, total amount sold)`.
pub fn extract_offering_amounts(document: &Html) -> (String, String) {
    let offering_label = find_label_cell(document, TOTAL_OFFERING_LABEL);
    let sold_label = find_label_cell(document, TOTAL_SOLD_LABEL);

    let (Some(offering_label), Some(sold_label)) = (offering_label, sold_label) else {
        return (NOT_FOUND.to_string(), NOT_FOUND.to_string());
    };

    let offering_cell = next_matching(document, offering_label, &TD);
    let offering_text = offering_cell.map(cell_text).unwrap_or_default();

    let total_offering_amount = if offering_text.is_empty() {
        // Blank amount: the form ticked "Indefinite" instead.
        let anchor = offering_label
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "td")
            .or(offering_cell)
            .unwrap_or(offering_label);
        match next_matching(document, anchor, &FORM_DATA) {
            Some(marker) if cell_text(marker) == "X" => INDEFINITE.to_string(),
            _ => INDEFINITE_FALLBACK.to_string(),
        }
    } else {
        offering_text
    };

    let total_amount_sold = next_matching(document, sold_label, &TD)
        .map(cell_text)
        .unwrap_or_else(|| NOT_FOUND.to_string());

    (total_offering_amount, total_amount_sold)
}

fn find_label_cell<'a>(document: &'a Html, label: &str) -> Option<ElementRef<'a>> {
    document.select(&TD).find(|td| cell_text(*td) == label)
}

/// First element after `anchor` in document order (descendants of `anchor`
/// included) that matches `selector`.
fn next_matching<'a>(
    document: &'a Html,
    anchor: ElementRef<'a>,
    selector: &Selector,
) -> Option<ElementRef<'a>> {
    document
        .tree
        .root()
        .descendants()
        .skip_while(|node| node.id() != anchor.id())
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(|el| selector.matches(el))
}

pub fn cell_text(element: ElementRef) -> String {
    element.text().map(str::trim).collect()
}

use chrono::NaiveDate;
use url::Url;

pub const FORM_D: &str = "D";
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub form_type: String,
}

impl SearchQuery {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        SearchQuery {
            start_date,
            end_date,
            form_type: FORM_D.to_string(),
        }
    }

    pub fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("dateRange", "custom".to_string()),
            ("startdt", self.start_date.format(DATE_FORMAT).to_string()),
            ("enddt", self.end_date.format(DATE_FORMAT).to_string()),
            ("forms", self.form_type.clone()),
        ]
    }

    pub fn to_url(&self, base: &Url) -> Url {
        let mut url = base.clone();
        url.query_pairs_mut().extend_pairs(self.params());
        url
    }
}

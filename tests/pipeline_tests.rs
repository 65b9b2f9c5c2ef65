use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use formd::chat::{ChatClient, ChatMessage, MessageRole, MISSING_CREDENTIAL};
use formd::core::config::FormDConfig;
use formd::core::service::FormDService;
use formd::core::session::{Phase, Session};
use formd::core::shell::{Command, Reply, Shell, NO_FILINGS};
use formd::core::types::FilingsBackend;
use formd::edgar::client::{FilingSource, RequestFailure};
use formd::edgar::fetch_form_d_filings;
use formd::edgar::filing::FilingRecord;
use formd::edgar::query::SearchQuery;
use std::collections::HashMap;
use std::sync::Mutex;

const SEARCH_BODY: &str = r#"{
  "hits": {
    "total": {"value": 4, "relation": "eq"},
    "hits": [
      {"_id": "0001234567-24-000001:primary_doc.xml",
       "_source": {"ciks": ["0001234567"], "display_names": ["Acme Ventures LLC  (CIK 0001234567)"],
                   "file_date": "2024-03-01", "biz_locations": ["Austin, TX"],
                   "adsh": "0001234567-24-000001", "form": "D"}},
      {"_id": "0007654321-24-000002:primary_doc.xml",
       "_source": {"ciks": ["0007654321"], "display_names": ["Quiet Fund LP  (CIK 0007654321)"],
                   "file_date": "2024-03-01", "biz_locations": ["New York, NY"],
                   "adsh": "0007654321-24-000002", "form": "D"}},
      {"_id": "orphan",
       "_source": {"display_names": ["Orphan Inc"], "form": "D"}},
      {"_id": "0000000042-24-000003:primary_doc.xml",
       "_source": {"ciks": ["0000000042"], "display_names": ["Broken Page Corp"],
                   "file_date": "2024-03-02", "biz_locations": ["Denver, CO"],
                   "adsh": "0000000042-24-000003", "form": "D"}}
    ]
  }
}"#;

const ACME_PAGE: &str = r#"<html><body>
<table summary="Issuer Identity Information"><tr><th>Name of Issuer</th></tr><tr><td>ACME VENTURES LLC</td></tr></table>
<table summary="Principal Place of Business and Contact Information">
  <tr><th>Street Address 1</th><th>City</th><th>State/Province/Country</th><th>ZIP/PostalCode</th><th>Phone Number of Issuer</th></tr>
  <tr><td>1 MAIN ST</td><td>AUSTIN</td><td>TEXAS</td><td>78701</td><td>512-555-0100</td></tr>
</table>
<table summary="Related Persons">
  <tr><th>Last Name</th><th>First Name</th></tr>
  <tr><td class="FormData">Smith</td><td class="FormData">Jane</td></tr>
  <tr><td class="FormData">Doe</td><td class="FormData">John</td></tr>
  <tr><td class="FormData">Roe</td><td class="FormData">Richard</td></tr>
</table>
<table summary="Offering and Sales Amounts">
  <tr><td>Total Offering Amount</td><td></td><td><span class="FormData">X</span> Indefinite</td></tr>
  <tr><td>Total Amount Sold</td><td>$750,000</td></tr>
</table>
</body></html>"#;

const QUIET_PAGE: &str = r#"<html><body>
<table summary="Offering and Sales Amounts">
  <tr><td>Total Offering Amount</td><td>$1,000,000</td></tr>
</table>
</body></html>"#;

struct FakeEdgar {
    search: std::result::Result<String, RequestFailure>,
    pages: HashMap<String, String>,
    requested: Mutex<Vec<String>>,
}

impl FakeEdgar {
    fn new(search: std::result::Result<&str, RequestFailure>) -> Self {
        let mut pages = HashMap::new();
        pages.insert(
            "https://www.sec.gov/Archives/edgar/data/1234567/000123456724000001/xslFormDX01/primary_doc.xml"
                .to_string(),
            ACME_PAGE.to_string(),
        );
        pages.insert(
            "https://www.sec.gov/Archives/edgar/data/7654321/000765432124000002/xslFormDX01/primary_doc.xml"
                .to_string(),
            QUIET_PAGE.to_string(),
        );
        FakeEdgar {
            search: search.map(str::to_string),
            pages,
            requested: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl FilingSource for FakeEdgar {
    async fn search(&self, _query: &SearchQuery) -> std::result::Result<String, RequestFailure> {
        self.search.clone()
    }

    async fn fetch_document(&self, url: &str) -> Result<String> {
        self.requested.lock().unwrap().push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("HTTP request failed with status: 500 Internal Server Error"))
    }
}

fn march() -> SearchQuery {
    SearchQuery::new(
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
    )
}

#[tokio::test]
async fn test_pipeline_end_to_end() {
    let source = FakeEdgar::new(Ok(SEARCH_BODY));

    let records = fetch_form_d_filings(&source, &march(), None).await.unwrap();

    assert_eq!(
        records,
        vec![FilingRecord {
            company_name: "Acme Ventures LLC  (CIK 0001234567)".to_string(),
            file_date: "2024-03-01".to_string(),
            business_locations: "Austin, TX".to_string(),
            detail_link: "https://www.sec.gov/Archives/edgar/data/1234567/000123456724000001/xslFormDX01/primary_doc.xml".to_string(),
            related_persons: "Jane Smith, John Doe".to_string(),
            phone_number: "512-555-0100".to_string(),
            total_offering_amount: "Indefinite".to_string(),
            total_amount_sold: "$750,000".to_string(),
        }]
    );

    // The orphan hit has no link and is never fetched; the broken page does
    // not stop the pipeline.
    let requested = source.requested.lock().unwrap();
    assert_eq!(requested.len(), 3);
    assert!(requested[2].contains("/42/000000004224000003/"));
}

#[tokio::test]
async fn test_search_failure_is_surfaced() {
    let source = FakeEdgar::new(Err(RequestFailure::with_status(403, "HTTP request failed with status: 403 Forbidden")));

    let failure = fetch_form_d_filings(&source, &march(), None).await.unwrap_err();

    assert_eq!(failure.status, Some(403));
    assert!(source.requested.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_search() {
    let source = FakeEdgar::new(Ok(r#"{"hits": {"hits": []}}"#));
    assert!(fetch_form_d_filings(&source, &march(), None).await.unwrap().is_empty());
}

fn service(source: FakeEdgar) -> FormDService<FakeEdgar> {
    let config = FormDConfig::from_vars(|_| None).unwrap();
    FormDService::new(source, ChatClient::new(&config).unwrap(), false)
}

#[tokio::test]
async fn test_shell_query_and_show() {
    let mut shell = Shell::new(service(FakeEdgar::new(Ok(SEARCH_BODY))), Session::default());

    let replies = shell.dispatch("/filings 2024-03-01 2024-03-02").await;
    assert!(matches!(replies.as_slice(), [Reply::Table(records)] if records.len() == 1));
    assert_eq!(shell.session().phase(), Phase::Rendering);

    shell.rendered();
    assert_eq!(shell.session().phase(), Phase::Idle);

    let replies = shell.handle(Command::Show).await;
    assert!(matches!(replies.as_slice(), [Reply::Table(records)] if records[0].phone_number == "512-555-0100"));
}

#[tokio::test]
async fn test_shell_reports_search_failure() {
    let failing = FakeEdgar::new(Err(RequestFailure::new("connection refused")));
    let mut shell = Shell::new(service(failing), Session::default());

    let replies = shell.dispatch("/filings 2024-03-01 2024-03-02").await;

    assert_eq!(
        replies,
        vec![
            Reply::Error("Request failed: connection refused".to_string()),
            Reply::Message(NO_FILINGS.to_string()),
        ]
    );
    assert_eq!(shell.session().phase(), Phase::Idle);
    assert!(shell.session().results().is_none());
}

struct EchoBackend {
    seen: Mutex<Vec<Vec<ChatMessage>>>,
}

#[async_trait]
impl FilingsBackend for EchoBackend {
    async fn run_query(&self, _query: &SearchQuery) -> std::result::Result<Vec<FilingRecord>, RequestFailure> {
        Ok(Vec::new())
    }

    async fn chat(&self, api_key: &str, messages: &[ChatMessage]) -> Result<String> {
        self.seen.lock().unwrap().push(messages.to_vec());
        if api_key == "bad" {
            return Err(anyhow!("401 Unauthorized"));
        }
        Ok(format!("echo: {}", messages.last().map(|m| m.content.as_str()).unwrap_or("")))
    }
}

#[tokio::test]
async fn test_chat_requires_credential() {
    let backend = EchoBackend { seen: Mutex::new(Vec::new()) };
    let mut shell = Shell::new(backend, Session::default());

    let replies = shell.dispatch("hello").await;
    assert_eq!(replies, vec![Reply::Message(MISSING_CREDENTIAL.to_string())]);
    assert_eq!(shell.session().chat().messages().len(), 1);

    // Filings still work without a key.
    let replies = shell.dispatch("/filings 2024-03-01 2024-03-02").await;
    assert_eq!(replies, vec![Reply::Message(NO_FILINGS.to_string())]);
}

#[tokio::test]
async fn test_chat_sends_full_history() {
    let backend = EchoBackend { seen: Mutex::new(Vec::new()) };
    let mut shell = Shell::new(backend, Session::new(Some("sk-test".to_string())));

    assert_eq!(shell.dispatch("first").await, vec![Reply::Assistant("echo: first".to_string())]);
    assert_eq!(shell.dispatch("second").await, vec![Reply::Assistant("echo: second".to_string())]);

    let history = shell.session().chat().messages();
    assert_eq!(history.len(), 5);
    assert_eq!(history[0].role, MessageRole::Assistant);
    assert_eq!(history[4].content, "echo: second");

    shell.dispatch("/key bad").await;
    let replies = shell.dispatch("third").await;
    assert!(matches!(replies.as_slice(), [Reply::Error(msg)] if msg.contains("401")));
    assert_eq!(shell.session().chat().messages().len(), 5);
}

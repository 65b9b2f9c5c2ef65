use anyhow::{anyhow, Result};
use std::time::Duration;
use url::Url;

use crate::chat::{DEFAULT_CHAT_MODEL, OPENAI_CHAT_URL};
use crate::edgar::client::{BROWSER_USER_AGENT, EDGAR_ARCHIVES_URL, SEARCH_URL};

#[derive(Clone, Debug)]
pub struct FormDConfig {
    pub user_agent: String,
    pub search_url: Url,
    pub archives_url: String,
    pub timeout: Duration,
    pub chat_timeout: Option<Duration>,
    pub openai_key: Option<String>,
    pub openai_api_url: Url,
    pub chat_model: String,
}

impl FormDConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let user_agent = var("FORMD_USER_AGENT").unwrap_or_else(|| BROWSER_USER_AGENT.to_string());

        let search_url = var("FORMD_SEARCH_URL").unwrap_or_else(|| SEARCH_URL.to_string());
        let search_url = Url::parse(&search_url)
            .map_err(|e| anyhow!("Invalid FORMD_SEARCH_URL {}: {}", search_url, e))?;

        let archives_url =
            var("FORMD_ARCHIVES_URL").unwrap_or_else(|| EDGAR_ARCHIVES_URL.to_string());
        Url::parse(&archives_url)
            .map_err(|e| anyhow!("Invalid FORMD_ARCHIVES_URL {}: {}", archives_url, e))?;

        let timeout = parse_secs(&var, "FORMD_TIMEOUT_SECS")?.unwrap_or(Duration::from_secs(30));
        let chat_timeout = parse_secs(&var, "FORMD_CHAT_TIMEOUT_SECS")?;

        let openai_key = var("OPENAI_KEY").filter(|key| !key.trim().is_empty());

        let openai_api_url = var("OPENAI_API_URL").unwrap_or_else(|| OPENAI_CHAT_URL.to_string());
        let openai_api_url = Url::parse(&openai_api_url)
            .map_err(|e| anyhow!("Invalid OPENAI_API_URL {}: {}", openai_api_url, e))?;

        let chat_model = var("FORMD_CHAT_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string());

        Ok(Self {
            user_agent,
            search_url,
            archives_url,
            timeout,
            chat_timeout,
            openai_key,
            openai_api_url,
            chat_model,
        })
    }
}

fn parse_secs<F>(var: &F, key: &str) -> Result<Option<Duration>>
where
    F: Fn(&str) -> Option<String>,
{
    var(key)
        .map(|secs| {
            secs.parse()
                .map(Duration::from_secs)
                .map_err(|_| anyhow!("{} must be a number of seconds, got {}", key, secs))
        })
        .transpose()
}

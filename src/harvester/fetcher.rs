use crate::model::HarvestError;
use reqwest::Client;
use std::time::Duration;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";
const ACCEPT_LANGUAGE: &str = "pt-BR,pt;q=0.9,en-US;q=0.8,en;q=0.7";

/// Shared HTTP client for all harvesters. Presents a desktop browser and
/// asks for pt-BR content; every request is bounded by a 15s timeout.
#[derive(Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(15))
            .build()
            .expect("failed to build HTTP client");
        Self { client }
    }

    pub async fn fetch_page(&self, url: &str) -> Result<String, HarvestError> {
        let response = self
            .client
            .get(url)
            .header("accept-language", ACCEPT_LANGUAGE)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::BadStatus {
                status,
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }
}

use log::debug;
use reqwest::{Client, ClientBuilder, Response};

use crate::error::ScrapeError;

/// Anything the scrapers can pull pages and images from.
#[allow(async_fn_in_trait)]
pub trait PageSource {
    async fn fetch_text(&self, url: &str) -> Result<String, ScrapeError>;
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ScrapeError>;
}

pub struct RequestClient {
    client: Client,
}

impl RequestClient {
    pub fn new() -> anyhow::Result<Self> {
        let client = ClientBuilder::new()
            .danger_accept_invalid_certs(true)
            .build()?;
        Ok(Self { client })
    }

    pub async fn fetch_url_response(&self, url: &str) -> Result<Response, ScrapeError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ScrapeError::connection(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::connection(url, format!("status {status}")));
        }
        Ok(response)
    }

    pub async fn fetch_url_body(&self, url: &str) -> Result<String, ScrapeError> {
        let response = self.fetch_url_response(url).await?;
        let body = response
            .text()
            .await
            .map_err(|e| ScrapeError::connection(url, e))?;
        Ok(body)
    }
}

impl PageSource for RequestClient {
    async fn fetch_text(&self, url: &str) -> Result<String, ScrapeError> {
        self.fetch_url_body(url).await
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ScrapeError> {
        let response = self.fetch_url_response(url).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ScrapeError::connection(url, e))?;
        Ok(bytes.to_vec())
    }
}

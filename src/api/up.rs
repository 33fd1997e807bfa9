//! Implements the `Bank` trait with `reqwest` against the Up Bank REST API.

use crate::api::{Bank, Page};
use crate::{utils, Result};
use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use tracing::{trace, warn};
use url::Url;

pub(crate) struct UpBank {
    client: reqwest::Client,
    transactions_url: String,
    token: String,
    page_size: u32,
}

impl UpBank {
    pub(crate) fn new(api_url: &str, token: &str, page_size: u32) -> Result<Self> {
        anyhow::ensure!(!token.is_empty(), "The API token is empty");
        let client = reqwest::Client::builder()
            .user_agent(concat!("pennypal/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Unable to build the HTTP client")?;
        Ok(Self {
            client,
            transactions_url: format!("{}/transactions", api_url.trim_end_matches('/')),
            token: token.to_string(),
            page_size,
        })
    }

    fn first_page_url(&self, since: Option<DateTime<Utc>>) -> Result<Url> {
        let mut params = vec![("page[size]", self.page_size.to_string())];
        if let Some(since) = since {
            params.push(("filter[since]", utils::format_timestamp(&since)));
        }
        Url::parse_with_params(&self.transactions_url, &params)
            .with_context(|| format!("Invalid API URL '{}'", self.transactions_url))
    }

    async fn send(&self, url: &Url) -> Result<reqwest::Response> {
        trace!("GET {url}");
        self.client
            .get(url.clone())
            .bearer_auth(&self.token)
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))
    }

    async fn parse(response: reqwest::Response, url: &Url) -> Result<Page> {
        response
            .json::<Page>()
            .await
            .with_context(|| format!("Unable to parse the response from {url}"))
    }
}

#[async_trait::async_trait]
impl Bank for UpBank {
    /// A non-200 status on the first request is logged and treated as an empty listing.
    async fn first_page(&mut self, since: Option<DateTime<Utc>>) -> Result<Page> {
        let url = self.first_page_url(since)?;
        let response = self.send(&url).await?;
        let status = response.status();
        if status != StatusCode::OK {
            warn!("The bank API returned {status} for {url}, treating it as an empty page");
            return Ok(Page::default());
        }
        Self::parse(response, &url).await
    }

    /// A non-200 status here is an error. Newer pages have already been fetched, so storing
    /// them would move the cursor past the pages that were never read.
    async fn next_page(&mut self, url: &str) -> Result<Page> {
        let url = Url::parse(url).with_context(|| format!("Invalid next link '{url}'"))?;
        let response = self.send(&url).await?;
        let status = response.status();
        if status != StatusCode::OK {
            bail!("The bank API returned {status} for {url}");
        }
        Self::parse(response, &url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fetch_all;
    use crate::db::Db;
    use crate::error::{error_type, ErrorType};
    use crate::ingest::ingest;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    type Route = (&'static str, u16, String);

    /// Serves canned HTTP responses on a local port. Each request gets the first route whose key
    /// appears in its request line. `routes` receives the base URL so bodies can link back.
    async fn serve(routes: impl FnOnce(&str) -> Vec<Route>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let routes = routes(&base);
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let text = String::from_utf8_lossy(&request);
                let line = text.lines().next().unwrap_or_default();
                let (status, body) = routes
                    .iter()
                    .find(|(key, _, _)| line.contains(key))
                    .map(|(_, status, body)| (*status, body.as_str()))
                    .unwrap_or((404, ""));
                let response = format!(
                    "HTTP/1.1 {status} Canned\r\nContent-Type: application/json\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        base
    }

    fn page_json(id: &str, created_at: &str, next: Option<String>) -> String {
        serde_json::json!({
            "data": [{
                "id": id,
                "attributes": {
                    "description": "Coffee",
                    "amount": { "currencyCode": "AUD", "value": "-4.50", "valueInBaseUnits": -450 },
                    "createdAt": created_at,
                    "transactionType": "Purchase"
                },
                "relationships": { "category": { "data": null } }
            }],
            "links": { "prev": null, "next": next }
        })
        .to_string()
    }

    /// Page one holds the newer transaction and links to page two, which answers with
    /// `second_status`.
    async fn serve_two_pages(second_status: u16) -> String {
        serve(|base| {
            let next = format!("{base}/transactions?page=2");
            vec![
                (
                    "page=2",
                    second_status,
                    page_json("older", "2025-01-10T08:00:00+11:00", None),
                ),
                (
                    "/transactions",
                    200,
                    page_json("newer", "2025-01-20T08:00:00+11:00", Some(next)),
                ),
            ]
        })
        .await
    }

    #[tokio::test]
    async fn test_follows_next_page() {
        let base = serve_two_pages(200).await;
        let mut bank = UpBank::new(&base, "up:yeah:token", 1).unwrap();
        let all = fetch_all(&mut bank, None).await.unwrap();
        let ids: Vec<&str> = all.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["newer", "older"]);
    }

    #[tokio::test]
    async fn test_failed_next_page_is_an_error() {
        let base = serve_two_pages(500).await;
        let mut bank = UpBank::new(&base, "up:yeah:token", 1).unwrap();
        let err = fetch_all(&mut bank, None).await.unwrap_err();
        assert!(format!("{err:#}").contains("500"), "{err:#}");
    }

    #[tokio::test]
    async fn test_failed_next_page_stores_nothing() {
        let dir = TempDir::new().unwrap();
        let db = Db::init(dir.path().join("pennypal.sqlite")).await.unwrap();
        let base = serve_two_pages(500).await;
        let mut bank = UpBank::new(&base, "up:yeah:token", 1).unwrap();

        let err = ingest(&db, &mut bank).await.unwrap_err();
        assert_eq!(error_type(&err), Some(ErrorType::Request));
        assert_eq!(db.count_transactions().await.unwrap(), 0);
        assert_eq!(db.last_ingested_date().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_failed_first_page_is_empty() {
        let base = serve(|_| vec![("/transactions", 503, String::new())]).await;
        let mut bank = UpBank::new(&base, "up:yeah:token", 1).unwrap();
        let all = fetch_all(&mut bank, None).await.unwrap();
        assert!(all.is_empty());
    }

    #[test]
    fn test_first_page_url() {
        let bank = UpBank::new("https://api.up.com.au/api/v1/", "up:yeah:token", 100).unwrap();
        let url = bank.first_page_url(None).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.up.com.au/api/v1/transactions?page%5Bsize%5D=100"
        );

        let since = utils::parse_stored_timestamp("2025-01-14T08:00:01Z").unwrap();
        let url = bank.first_page_url(Some(since)).unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("page[size]".to_string(), "100".to_string()),
                ("filter[since]".to_string(), "2025-01-14T08:00:01Z".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_token_is_rejected() {
        assert!(UpBank::new("https://api.up.com.au/api/v1", "", 100).is_err());
    }
}

use futures::stream::{self, StreamExt};
use std::time::Duration;
use thiserror::Error;

use crate::config::FetchConfig;
use crate::feed::parser::FeedParser;
use crate::feed::types::{Feed, FeedItem};

const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors that can occur while fetching one feed.
///
/// None of these abort a batch: [`fetch_all`] logs them and moves on.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, timeout, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
}

/// Outcome of fetching a single feed URL.
#[derive(Debug)]
pub struct FetchResult {
    /// URL that was requested
    pub url: String,
    /// The parsed feed, or the error that occurred
    pub result: Result<Feed, FetchError>,
}

/// Builds the HTTP client used for feed requests.
///
/// The client carries the configured user agent and request timeout; no other
/// deadline is applied to a run.
pub fn build_client(config: &FetchConfig) -> Result<reqwest::Client, FetchError> {
    let client = reqwest::Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Fetches and parses every URL concurrently.
///
/// All requests are in flight at once and the call returns after every one of them
/// has settled. Results keep the order of `urls`, so items stay grouped by source.
/// Failures are logged here and returned in their [`FetchResult`]; they never cancel
/// the other requests.
pub async fn fetch_all(
    client: &reqwest::Client,
    parser: &FeedParser,
    urls: &[String],
) -> Vec<FetchResult> {
    if urls.is_empty() {
        return Vec::new();
    }

    let results: Vec<FetchResult> = stream::iter(urls.iter())
        .map(|url| async move {
            let result = fetch_feed(client, parser, url).await;
            match &result {
                Ok(feed) => tracing::debug!(
                    url = %url,
                    title = %feed.title,
                    items = feed.items.len(),
                    "Fetched feed"
                ),
                Err(e) => tracing::warn!(url = %url, error = %e, "Failed to fetch feed"),
            }
            FetchResult {
                url: url.clone(),
                result,
            }
        })
        .buffered(urls.len())
        .collect()
        .await;

    let failed = results.iter().filter(|r| r.result.is_err()).count();
    tracing::info!(
        total = results.len(),
        failed = failed,
        "Feed fetch batch complete"
    );

    results
}

/// Fetches one feed URL and parses it.
///
/// # Errors
///
/// - [`FetchError::Network`] - connection, TLS or timeout errors
/// - [`FetchError::HttpStatus`] - non-2xx response
/// - [`FetchError::ResponseTooLarge`] - body over 10MB
pub async fn fetch_feed(
    client: &reqwest::Client,
    parser: &FeedParser,
    url: &str,
) -> Result<Feed, FetchError> {
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        return Err(FetchError::HttpStatus(response.status().as_u16()));
    }

    let bytes = read_limited_bytes(response, MAX_FEED_SIZE).await?;
    let text = String::from_utf8_lossy(&bytes);

    Ok(parser.parse(&text))
}

/// Flattens successful fetches into one item list, dropping failures.
pub fn collect_items(results: Vec<FetchResult>) -> Vec<FeedItem> {
    results
        .into_iter()
        .filter_map(|r| r.result.ok())
        .flat_map(|feed| feed.items)
        .collect()
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const VALID_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <title>Test Feed</title>
    <item><title>One</title><pubDate>Mon, 19 Oct 2026 08:00:00 +0000</pubDate></item>
    <item><title>Two</title><pubDate>Mon, 19 Oct 2026 07:00:00 +0000</pubDate></item>
</channel></rss>"#;

    fn client() -> reqwest::Client {
        build_client(&FetchConfig::default()).unwrap()
    }

    fn parser() -> FeedParser {
        FeedParser::new().unwrap()
    }

    #[tokio::test]
    async fn test_fetch_success_sends_user_agent() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed"))
            .and(header(
                "User-Agent",
                "Mozilla/5.0 (compatible; DailyNewsBot/1.0)",
            ))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(VALID_RSS)
                    .insert_header("Content-Type", "application/xml"),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let url = format!("{}/feed", mock_server.uri());
        let feed = fetch_feed(&client(), &parser(), &url).await.unwrap();
        assert_eq!(feed.title, "Test Feed");
        assert_eq!(feed.items.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_404_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let url = format!("{}/feed", mock_server.uri());
        match fetch_feed(&client(), &parser(), &url).await {
            Err(FetchError::HttpStatus(404)) => {}
            other => panic!("Expected HttpStatus(404), got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_not_retried() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&mock_server)
            .await;

        let url = format!("{}/feed", mock_server.uri());
        let result = fetch_feed(&client(), &parser(), &url).await;
        assert!(matches!(result, Err(FetchError::HttpStatus(500))));
    }

    #[tokio::test]
    async fn test_too_large_response() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_bytes(vec![b'a'; MAX_FEED_SIZE + 1]),
            )
            .mount(&mock_server)
            .await;

        let url = format!("{}/feed", mock_server.uri());
        let result = fetch_feed(&client(), &parser(), &url).await;
        assert!(matches!(result, Err(FetchError::ResponseTooLarge)));
    }

    #[tokio::test]
    async fn test_fetch_all_tolerates_partial_failure() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/good"))
            .respond_with(ResponseTemplate::new(200).set_body_string(VALID_RSS))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/bad"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let urls = vec![
            format!("{}/bad", mock_server.uri()),
            format!("{}/good", mock_server.uri()),
        ];
        let results = fetch_all(&client(), &parser(), &urls).await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].url, urls[0]);
        assert!(results[0].result.is_err());
        assert!(results[1].result.is_ok());

        let items = collect_items(results);
        let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["One", "Two"]);
    }

    #[tokio::test]
    async fn test_fetch_all_requests_run_concurrently() {
        let mock_server = MockServer::start().await;
        for (route, title) in [("/slow-a", "Slow A"), ("/slow-b", "Slow B")] {
            let body = VALID_RSS.replace("Test Feed", title);
            Mock::given(method("GET"))
                .and(path(route))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_string(body)
                        .set_delay(Duration::from_millis(500)),
                )
                .mount(&mock_server)
                .await;
        }

        let urls = vec![
            format!("{}/slow-a", mock_server.uri()),
            format!("{}/slow-b", mock_server.uri()),
        ];
        let started = std::time::Instant::now();
        let results = fetch_all(&client(), &parser(), &urls).await;
        let elapsed = started.elapsed();

        // Sequential fetching would need at least 1s
        assert!(
            elapsed < Duration::from_millis(900),
            "fetch_all took {:?}",
            elapsed
        );
        let titles: Vec<_> = results
            .iter()
            .map(|r| r.result.as_ref().unwrap().title.as_str())
            .collect();
        assert_eq!(titles, vec!["Slow A", "Slow B"]);
    }

    #[tokio::test]
    async fn test_fetch_all_empty() {
        let results = fetch_all(&client(), &parser(), &[]).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_non_feed_body_yields_empty_feed() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("<html>not a feed</html>"),
            )
            .mount(&mock_server)
            .await;

        let url = format!("{}/feed", mock_server.uri());
        let feed = fetch_feed(&client(), &parser(), &url).await.unwrap();
        assert!(feed.items.is_empty());
    }
}

//! PirateBay-style JSON search backend (apibay-compatible `q.php`).

use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::PirateBayConfig;

use super::{
    Candidate, DateGranularity, Published, SearchError, Searcher, SourceCapabilities, TrustFlags,
};

/// Info hash the API returns for its "No results returned" placeholder row.
const EMPTY_HASH: &str = "0000000000000000000000000000000000000000";

/// PirateBay search backend implementation.
pub struct PirateBaySearcher {
    client: Client,
    config: PirateBayConfig,
}

impl PirateBaySearcher {
    /// Create a new PirateBaySearcher with the given configuration.
    pub fn new(config: PirateBayConfig) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| SearchError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn search_url(&self) -> String {
        format!("{}/q.php", self.config.url.trim_end_matches('/'))
    }

    /// Build a magnet URI from an info hash, display name and tracker list.
    fn magnet_uri(&self, info_hash: &str, name: &str) -> String {
        let mut uri = format!(
            "magnet:?xt=urn:btih:{}&dn={}",
            info_hash,
            urlencoding::encode(name)
        );
        for tracker in &self.config.trackers {
            uri.push_str("&tr=");
            uri.push_str(&urlencoding::encode(tracker));
        }
        uri
    }

    fn into_candidate(&self, r: PirateBayResult) -> Option<Candidate> {
        let info_hash = r.info_hash.trim().to_lowercase();
        if info_hash.is_empty() || info_hash == EMPTY_HASH || r.name.trim().is_empty() {
            return None;
        }

        let status = r.status.to_lowercase();
        Some(Candidate {
            locator: self.magnet_uri(&info_hash, &r.name),
            published: parse_added(&r.added),
            trust: TrustFlags {
                trusted: status == "trusted",
                vip: status == "vip",
            },
            category: Some(r.category).filter(|c| !c.is_empty()),
            title: r.name,
            source: self.name().to_string(),
        })
    }
}

#[async_trait]
impl Searcher for PirateBaySearcher {
    fn name(&self) -> &str {
        "piratebay"
    }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities {
            dates: DateGranularity::DateTime,
            trust_signals: true,
            categories: true,
        }
    }

    async fn search(&self, query: &str) -> Result<Vec<Candidate>, SearchError> {
        debug!(query = %query, "Searching PirateBay");

        let response = self
            .client
            .get(self.search_url())
            .query(&[("q", query), ("cat", "0")])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::ApiError(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let body = response.text().await?;
        let candidates = self.parse_response(&body)?;

        debug!(
            query = %query,
            results = candidates.len(),
            "PirateBay search complete"
        );

        Ok(candidates)
    }
}

impl PirateBaySearcher {
    /// Parse a `q.php` response body. Rows that cannot become a candidate
    /// are dropped individually.
    fn parse_response(&self, body: &str) -> Result<Vec<Candidate>, SearchError> {
        let rows: Vec<PirateBayResult> = serde_json::from_str(body)
            .map_err(|e| SearchError::ParseError(format!("Invalid PirateBay response: {}", e)))?;

        Ok(rows
            .into_iter()
            .filter_map(|r| self.into_candidate(r))
            .collect())
    }
}

/// `added` is a unix timestamp in seconds, sent as a string.
fn parse_added(added: &str) -> Published {
    added
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|ts| *ts > 0)
        .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
        .map(Published::DateTime)
        .unwrap_or_else(|| Published::Malformed(added.to_string()))
}

// PirateBay API response types
#[derive(Debug, Deserialize)]
struct PirateBayResult {
    #[serde(default)]
    name: String,
    #[serde(default)]
    info_hash: String,
    #[serde(default)]
    added: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    category: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn searcher() -> PirateBaySearcher {
        PirateBaySearcher::new(PirateBayConfig {
            url: "https://apibay.example/".to_string(),
            trackers: vec!["udp://tracker.example:1337/announce".to_string()],
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_search_url_trims_slash() {
        assert_eq!(searcher().search_url(), "https://apibay.example/q.php");
    }

    #[test]
    fn test_parse_response() {
        let body = r#"[
            {"id":"1","name":"Alpha S02E05 1080p WEB","info_hash":"ABCDEF0123456789ABCDEF0123456789ABCDEF01",
             "leechers":"3","seeders":"40","num_files":"1","size":"1000","username":"up",
             "added":"1718000000","status":"vip","category":"208","imdb":""},
            {"id":"2","name":"Alpha S02E05 720p","info_hash":"1111111111111111111111111111111111111111",
             "added":"not-a-number","status":"member","category":"205"}
        ]"#;

        let candidates = searcher().parse_response(body).unwrap();
        assert_eq!(candidates.len(), 2);

        let first = &candidates[0];
        assert_eq!(first.title, "Alpha S02E05 1080p WEB");
        assert!(first.trust.vip);
        assert!(!first.trust.trusted);
        assert_eq!(first.category.as_deref(), Some("208"));
        assert_eq!(first.source, "piratebay");
        assert!(first
            .locator
            .starts_with("magnet:?xt=urn:btih:abcdef0123456789abcdef0123456789abcdef01&dn=Alpha%20S02E05"));
        assert!(first
            .locator
            .ends_with("&tr=udp%3A%2F%2Ftracker.example%3A1337%2Fannounce"));
        match first.published {
            Published::DateTime(dt) => assert_eq!(dt.year(), 2024),
            ref other => panic!("Expected DateTime, got {:?}", other),
        }

        let second = &candidates[1];
        assert!(!second.trust.is_trusted_or_vip());
        assert!(matches!(second.published, Published::Malformed(_)));
    }

    #[test]
    fn test_parse_response_drops_no_results_placeholder() {
        let body = r#"[{"id":"0","name":"No results returned","info_hash":"0000000000000000000000000000000000000000",
            "leechers":"0","seeders":"0","num_files":"0","size":"0","username":"","added":"0",
            "status":"member","category":"0","imdb":""}]"#;

        let candidates = searcher().parse_response(body).unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_parse_response_invalid_json() {
        let result = searcher().parse_response("<html>blocked</html>");
        assert!(matches!(result, Err(SearchError::ParseError(_))));
    }

    #[test]
    fn test_capabilities() {
        let caps = searcher().capabilities();
        assert_eq!(caps.dates, DateGranularity::DateTime);
        assert!(caps.trust_signals);
        assert!(caps.categories);
    }
}

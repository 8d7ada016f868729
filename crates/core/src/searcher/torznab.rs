//! Torznab feed backend (Jackett, Prowlarr and other RSS-speaking indexers).

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use reqwest::Client;
use tracing::debug;

use crate::config::TorznabConfig;

use super::{Candidate, DateGranularity, Published, SearchError, Searcher, SourceCapabilities};

/// Torznab search backend implementation.
pub struct TorznabSearcher {
    client: Client,
    config: TorznabConfig,
}

impl TorznabSearcher {
    /// Create a new TorznabSearcher with the given configuration.
    pub fn new(config: TorznabConfig) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| SearchError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Build the Torznab API URL for a search.
    fn build_search_url(&self, query: &str) -> String {
        let mut url = format!(
            "{}?t=search&apikey={}&q={}",
            self.config.url.trim_end_matches('/'),
            urlencoding::encode(&self.config.api_key),
            urlencoding::encode(query)
        );

        if !self.config.categories.is_empty() {
            let cats: Vec<String> = self.config.categories.iter().map(|c| c.to_string()).collect();
            url.push_str(&format!("&cat={}", cats.join(",")));
        }

        url
    }
}

#[async_trait]
impl Searcher for TorznabSearcher {
    fn name(&self) -> &str {
        "torznab"
    }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities {
            dates: DateGranularity::DateTime,
            trust_signals: false,
            categories: true,
        }
    }

    async fn search(&self, query: &str) -> Result<Vec<Candidate>, SearchError> {
        let url = self.build_search_url(query);
        debug!(query = %query, "Searching Torznab feed");

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::ApiError(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let xml = response.text().await?;
        let candidates = parse_feed(&xml, self.name())?;

        debug!(
            query = %query,
            results = candidates.len(),
            "Torznab search complete"
        );

        Ok(candidates)
    }
}

/// Fields collected for one `<item>` while walking the feed.
#[derive(Debug, Default)]
struct ItemBuilder {
    title: Option<String>,
    link: Option<String>,
    enclosure: Option<String>,
    magnet: Option<String>,
    pub_date: Option<String>,
    category: Option<String>,
}

impl ItemBuilder {
    /// Pick up attribute-carried values (`<enclosure>`, `<torznab:attr>`).
    fn apply_attributes(&mut self, e: &BytesStart<'_>) {
        let tag = e.name();
        let tag = tag.as_ref();

        let mut name = None;
        let mut value = None;
        let mut url = None;
        for attr in e.attributes().flatten() {
            let Ok(v) = attr.unescape_value() else { continue };
            match attr.key.as_ref() {
                b"name" => name = Some(v.to_string()),
                b"value" => value = Some(v.to_string()),
                b"url" => url = Some(v.to_string()),
                _ => {}
            }
        }

        match tag {
            b"enclosure" => {
                if self.enclosure.is_none() {
                    self.enclosure = url;
                }
            }
            b"torznab:attr" | b"newznab:attr" => match (name.as_deref(), value) {
                (Some("magneturl"), Some(v)) => self.magnet = Some(v),
                (Some("category"), Some(v)) if self.category.is_none() => self.category = Some(v),
                _ => {}
            },
            _ => {}
        }
    }

    fn set_text(&mut self, element: &str, text: String) {
        match element {
            "title" => self.title = Some(text),
            "link" => self.link = Some(text),
            "pubDate" => self.pub_date = Some(text),
            "category" if self.category.is_none() => self.category = Some(text),
            _ => {}
        }
    }

    /// Items without a title or any locator are dropped.
    fn build(self, source: &str) -> Option<Candidate> {
        let title = self.title.filter(|t| !t.trim().is_empty())?;
        let locator = self
            .magnet
            .or(self.enclosure)
            .or(self.link)
            .filter(|l| !l.trim().is_empty())?;

        Some(Candidate {
            title,
            locator,
            published: self
                .pub_date
                .as_deref()
                .map(parse_pub_date)
                .unwrap_or(Published::NotExposed),
            trust: Default::default(),
            category: self.category,
            source: source.to_string(),
        })
    }
}

/// Parse a Torznab RSS document into candidates, in feed order.
pub(crate) fn parse_feed(xml: &str, source: &str) -> Result<Vec<Candidate>, SearchError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut candidates = Vec::new();
    let mut current_item: Option<ItemBuilder> = None;
    let mut current_element: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if name == "item" {
                    current_item = Some(ItemBuilder::default());
                } else {
                    if let Some(item) = current_item.as_mut() {
                        item.apply_attributes(e);
                    }
                    current_element = Some(name);
                }
            }
            Ok(Event::Empty(ref e)) => {
                if let Some(item) = current_item.as_mut() {
                    item.apply_attributes(e);
                }
            }
            Ok(Event::Text(ref e)) => {
                if let (Some(item), Some(element)) = (current_item.as_mut(), &current_element) {
                    let text = e.unescape().unwrap_or_default().to_string();
                    if !text.is_empty() {
                        item.set_text(element, text);
                    }
                }
            }
            Ok(Event::CData(e)) => {
                if let (Some(item), Some(element)) = (current_item.as_mut(), &current_element) {
                    let text = String::from_utf8_lossy(&e.into_inner()).trim().to_string();
                    if !text.is_empty() {
                        item.set_text(element, text);
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                if e.name().as_ref() == b"item" {
                    if let Some(candidate) = current_item.take().and_then(|b| b.build(source)) {
                        candidates.push(candidate);
                    }
                }
                current_element = None;
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(SearchError::ParseError(format!(
                    "Invalid feed at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(candidates)
}

/// RSS dates are RFC 2822. Anything else is kept as malformed.
fn parse_pub_date(date_str: &str) -> Published {
    DateTime::parse_from_rfc2822(date_str.trim())
        .map(|dt| Published::DateTime(dt.with_timezone(&Utc)))
        .unwrap_or_else(|_| Published::Malformed(date_str.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:torznab="http://torznab.com/schemas/2015/feed">
  <channel>
    <title>Indexer</title>
    <item>
      <title>Alpha.S02E05.1080p.WEB.h264</title>
      <guid>https://indexer.example/details/1</guid>
      <link>https://indexer.example/dl/1.torrent</link>
      <pubDate>Thu, 13 Jun 2024 21:04:00 +0000</pubDate>
      <category>5040</category>
      <enclosure url="https://indexer.example/dl/1.torrent" length="1000" type="application/x-bittorrent" />
      <torznab:attr name="category" value="5000" />
      <torznab:attr name="magneturl" value="magnet:?xt=urn:btih:abc&amp;dn=Alpha" />
    </item>
    <item>
      <title><![CDATA[Alpha S02E05 720p]]></title>
      <link>https://indexer.example/dl/2.torrent</link>
      <pubDate>sometime last week</pubDate>
    </item>
    <item>
      <title>Missing locator</title>
    </item>
  </channel>
</rss>"#;

    fn searcher() -> TorznabSearcher {
        TorznabSearcher::new(TorznabConfig {
            url: "http://localhost:9117/api/v2.0/indexers/all/results/torznab/api".to_string(),
            api_key: "key with space".to_string(),
            categories: vec![5000, 5040],
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_build_search_url() {
        let url = searcher().build_search_url("Foos Bar S01E02 2160p");
        assert_eq!(
            url,
            "http://localhost:9117/api/v2.0/indexers/all/results/torznab/api\
             ?t=search&apikey=key%20with%20space&q=Foos%20Bar%20S01E02%202160p&cat=5000,5040"
        );
    }

    #[test]
    fn test_parse_feed() {
        let candidates = parse_feed(FEED, "torznab").unwrap();
        assert_eq!(candidates.len(), 2);

        let first = &candidates[0];
        assert_eq!(first.title, "Alpha.S02E05.1080p.WEB.h264");
        assert_eq!(first.locator, "magnet:?xt=urn:btih:abc&dn=Alpha");
        assert_eq!(first.category.as_deref(), Some("5040"));
        assert!(!first.trust.is_trusted_or_vip());
        match first.published {
            Published::DateTime(dt) => {
                assert_eq!((dt.year(), dt.month(), dt.day()), (2024, 6, 13));
                assert_eq!(dt.hour(), 21);
            }
            ref other => panic!("Expected DateTime, got {:?}", other),
        }

        let second = &candidates[1];
        assert_eq!(second.title, "Alpha S02E05 720p");
        assert_eq!(second.locator, "https://indexer.example/dl/2.torrent");
        assert!(matches!(second.published, Published::Malformed(_)));
        assert!(second.category.is_none());
    }

    #[test]
    fn test_parse_empty_channel() {
        let xml = r#"<rss><channel><title>Empty</title></channel></rss>"#;
        assert!(parse_feed(xml, "torznab").unwrap().is_empty());
    }

    #[test]
    fn test_parse_invalid_feed() {
        let xml = "<rss><channel><item><title>x</item></channel></rss>";
        assert!(matches!(
            parse_feed(xml, "torznab"),
            Err(SearchError::ParseError(_))
        ));
    }

    #[test]
    fn test_parse_pub_date_missing_time_is_malformed() {
        assert!(matches!(
            parse_pub_date("2024-06-13"),
            Published::Malformed(_)
        ));
    }
}

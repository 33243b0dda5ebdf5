//! Test doubles and common utilities for engine contract tests
//!
//! This module provides a scripted fetcher that replays canned responses and
//! records every page it was asked for, plus Atom fixture builders.

#![allow(dead_code)]

use arxiv_core::error::{Error, Result};
use arxiv_core::{FeedFetcher, PageQuery, PollingEngine, Position, SourceConfig};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub const TEST_ENDPOINT: &str = "http://arxiv.test/api/query";

/// A FeedFetcher that replays scripted responses
///
/// Clones share the script and the call log, so a test can keep one handle
/// while the engine owns another. Once the script runs out, every call
/// returns an empty feed.
#[derive(Clone, Default)]
pub struct ScriptedFetcher {
    responses: Arc<Mutex<VecDeque<Result<Vec<u8>>>>>,
    calls: Arc<Mutex<Vec<(String, PageQuery)>>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response
    pub fn push_feed(&self, body: impl Into<String>) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(body.into().into_bytes()));
        self
    }

    /// Queue a failure
    pub fn push_error(&self, error: Error) -> &Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    /// Every page requested so far, in call order
    pub fn queries(&self) -> Vec<PageQuery> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, q)| q.clone())
            .collect()
    }

    /// `start` of every page requested so far
    pub fn starts(&self) -> Vec<u64> {
        self.queries().iter().map(|q| q.start).collect()
    }

    /// Endpoints passed to the fetcher
    pub fn endpoints(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(e, _)| e.clone())
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl FeedFetcher for ScriptedFetcher {
    async fn fetch(&self, endpoint: &str, query: &PageQuery) -> Result<Vec<u8>> {
        self.calls
            .lock()
            .unwrap()
            .push((endpoint.to_string(), query.clone()));

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(atom_feed(&[]).into_bytes()))
    }

    fn fetcher_name(&self) -> &'static str {
        "scripted"
    }
}

/// One `<entry>` of a fixture feed
#[derive(Debug, Clone)]
pub struct EntryFixture {
    pub id: String,
    pub title: String,
    pub published: DateTime<Utc>,
    pub pdf_href: Option<String>,
}

impl EntryFixture {
    /// Entry `http://arxiv.org/abs/{arxiv_id}` published on 2025-06-01
    pub fn new(arxiv_id: &str, title: &str) -> Self {
        Self {
            id: format!("http://arxiv.org/abs/{arxiv_id}"),
            title: title.to_string(),
            published: DateTime::parse_from_rfc3339("2025-06-01T00:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            pdf_href: None,
        }
    }

    pub fn published_ago(mut self, age: Duration) -> Self {
        self.published = Utc::now() - age;
        self
    }

    pub fn with_pdf(mut self, href: &str) -> Self {
        self.pdf_href = Some(href.to_string());
        self
    }

    fn to_xml(&self) -> String {
        let published = self.published.to_rfc3339_opts(SecondsFormat::Secs, true);
        let pdf = self
            .pdf_href
            .as_ref()
            .map(|href| format!(r#"<link href="{href}" rel="related" type="application/pdf"/>"#))
            .unwrap_or_default();
        format!(
            r#"  <entry>
    <id>{id}</id>
    <title>{title}</title>
    <summary>Summary of {title}</summary>
    <author><name>Author One</name></author>
    <published>{published}</published>
    <updated>{published}</updated>
    <link href="{id}" rel="alternate" type="text/html"/>
    {pdf}
    <category term="cs.AI" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
"#,
            id = self.id,
            title = self.title,
        )
    }
}

/// Render an Atom feed containing `entries` in order
pub fn atom_feed(entries: &[EntryFixture]) -> String {
    let body: String = entries.iter().map(EntryFixture::to_xml).collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>ArXiv Query</title>
{body}</feed>"#
    )
}

/// Feed with `n` sequential entries `2401.0000{i}v1`
pub fn numbered_feed(first: usize, n: usize) -> String {
    let entries: Vec<EntryFixture> = (first..first + n)
        .map(|i| EntryFixture::new(&format!("2401.{i:05}v1"), &format!("Paper {i}")))
        .collect();
    atom_feed(&entries)
}

/// Minimal configuration for tests: no rate wait, test endpoint
pub fn test_config() -> SourceConfig {
    SourceConfig::new("cat:cs.AI")
        .with_api_url(TEST_ENDPOINT)
        .with_polling_period_secs(0)
}

/// Open an engine at the start of the stream, discarding events
pub fn open_engine(config: SourceConfig, fetcher: &ScriptedFetcher) -> PollingEngine {
    open_engine_at(config, fetcher, &Position::default())
}

/// Open an engine at `position`, discarding events
pub fn open_engine_at(
    config: SourceConfig,
    fetcher: &ScriptedFetcher,
    position: &Position,
) -> PollingEngine {
    let (engine, _events) = PollingEngine::open(config, Box::new(fetcher.clone()), position)
        .expect("engine opens");
    engine
}

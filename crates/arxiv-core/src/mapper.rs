//! Record mapping
//!
//! Converts a parsed [`FeedEntry`] plus its stream position into the
//! [`ChangeRecord`] handed to consumers. The record shape is the contract
//! downstream consumers depend on:
//!
//! | payload field | source |
//! |---------------|--------|
//! | `arxiv_id`    | last path segment of the entry id |
//! | `title`       | entry title |
//! | `abstract`    | entry summary |
//! | `authors`     | author names, in order |
//! | `published`   | RFC3339 |
//! | `updated`     | RFC3339 |
//! | `categories`  | category terms, in order |
//! | `entry_url`   | entry id, verbatim |
//! | `pdf_url`     | only when PDF links are enabled and one is found |

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::feed::FeedEntry;
use crate::position::Position;

/// Metadata key holding the capture timestamp (Unix nanoseconds)
pub const METADATA_READ_AT: &str = "arxiv.read_at";
/// Metadata key holding the arXiv id
pub const METADATA_ID: &str = "arxiv.id";
/// Metadata key holding the paper title
pub const METADATA_TITLE: &str = "arxiv.title";
/// Metadata key holding the publication timestamp
pub const METADATA_PUBLISHED: &str = "arxiv.published";

/// Kind of change a record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// A new entry was observed (the only kind this feed produces)
    Create,
}

/// The unit emitted to consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub operation: Operation,
    /// Resumable position of this record
    pub position: Position,
    /// Record key (the arXiv id)
    pub key: String,
    /// Structured payload
    pub payload: Map<String, Value>,
    /// String metadata
    pub metadata: BTreeMap<String, String>,
}

/// Maps feed entries to change records
#[derive(Debug, Clone, Copy)]
pub struct RecordMapper {
    include_pdf: bool,
}

impl RecordMapper {
    /// Create a mapper
    ///
    /// # Parameters
    ///
    /// - `include_pdf`: attach `pdf_url` when the entry carries a PDF link
    pub fn new(include_pdf: bool) -> Self {
        Self { include_pdf }
    }

    /// Map an entry, stamping the record with the current time
    pub fn map(&self, entry: &FeedEntry, position: Position) -> ChangeRecord {
        self.map_at(entry, position, Utc::now())
    }

    /// Map an entry with an explicit capture timestamp
    pub fn map_at(
        &self,
        entry: &FeedEntry,
        position: Position,
        read_at: DateTime<Utc>,
    ) -> ChangeRecord {
        let arxiv_id = extract_arxiv_id(&entry.id).to_string();
        let published = format_timestamp(&entry.published);

        let authors: Vec<Value> = entry
            .authors
            .iter()
            .map(|a| Value::String(a.name.clone()))
            .collect();
        let categories: Vec<Value> = entry
            .categories
            .iter()
            .map(|c| Value::String(c.term.clone()))
            .collect();

        let mut payload = Map::new();
        payload.insert("arxiv_id".into(), Value::String(arxiv_id.clone()));
        payload.insert("title".into(), Value::String(entry.title.clone()));
        payload.insert("abstract".into(), Value::String(entry.summary.clone()));
        payload.insert("authors".into(), Value::Array(authors));
        payload.insert("published".into(), Value::String(published.clone()));
        payload.insert(
            "updated".into(),
            Value::String(format_timestamp(&entry.updated)),
        );
        payload.insert("categories".into(), Value::Array(categories));
        payload.insert("entry_url".into(), Value::String(entry.id.clone()));

        if let Some(pdf_url) = self.pdf_url(entry) {
            payload.insert("pdf_url".into(), Value::String(pdf_url.to_string()));
        }

        let mut metadata = BTreeMap::new();
        metadata.insert(
            METADATA_READ_AT.to_string(),
            read_at
                .timestamp_nanos_opt()
                .unwrap_or_else(|| read_at.timestamp_micros().saturating_mul(1000))
                .to_string(),
        );
        metadata.insert(METADATA_ID.to_string(), arxiv_id.clone());
        metadata.insert(METADATA_TITLE.to_string(), entry.title.clone());
        metadata.insert(METADATA_PUBLISHED.to_string(), published);

        ChangeRecord {
            operation: Operation::Create,
            position,
            key: arxiv_id,
            payload,
            metadata,
        }
    }

    /// First PDF-looking link in document order; an empty href counts as none
    fn pdf_url<'a>(&self, entry: &'a FeedEntry) -> Option<&'a str> {
        if !self.include_pdf {
            return None;
        }
        entry
            .links
            .iter()
            .find(|link| link.is_pdf())
            .map(|link| link.href.as_str())
            .filter(|href| !href.is_empty())
    }
}

/// Extract the arXiv id from an entry id URL
///
/// `http://arxiv.org/abs/1234.5678v1` → `1234.5678v1`. Ids without a `/` are
/// returned whole.
pub fn extract_arxiv_id(entry_id: &str) -> &str {
    entry_id.rsplit('/').next().unwrap_or(entry_id)
}

fn format_timestamp<Tz: TimeZone>(ts: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{Author, Category, Link};
    use chrono::FixedOffset;

    fn ts(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn sample_entry() -> FeedEntry {
        FeedEntry {
            id: "http://arxiv.org/abs/2401.12345v1".to_string(),
            title: "Sample Title".to_string(),
            summary: "Sample Summary".to_string(),
            authors: vec![
                Author { name: "Author One".to_string() },
                Author { name: "Author Two".to_string() },
            ],
            published: ts("2025-06-01T00:00:00Z"),
            updated: ts("2025-06-02T12:30:00+02:00"),
            categories: vec![Category {
                term: "cs.AI".to_string(),
                scheme: "http://arxiv.org/schemas/atom".to_string(),
            }],
            links: vec![
                Link {
                    href: "http://arxiv.org/abs/2401.12345v1".to_string(),
                    mime_type: "text/html".to_string(),
                    rel: "alternate".to_string(),
                },
                Link {
                    href: "http://arxiv.org/pdf/2401.12345v1.pdf".to_string(),
                    mime_type: "application/pdf".to_string(),
                    rel: "related".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_extract_arxiv_id() {
        assert_eq!(extract_arxiv_id("http://arxiv.org/abs/2401.12345v1"), "2401.12345v1");
        assert_eq!(extract_arxiv_id("http://arxiv.org/abs/hep-th/9901001v2"), "9901001v2");
        assert_eq!(extract_arxiv_id("2401.12345v1"), "2401.12345v1");
        assert_eq!(extract_arxiv_id("trailing/"), "");
    }

    #[test]
    fn test_map_payload_fields() {
        let mapper = RecordMapper::new(true);
        let record = mapper.map(&sample_entry(), Position::from_offset(7));

        assert_eq!(record.operation, Operation::Create);
        assert_eq!(record.position.as_str(), "7");
        assert_eq!(record.key, "2401.12345v1");
        assert_eq!(record.payload["arxiv_id"], "2401.12345v1");
        assert_eq!(record.payload["title"], "Sample Title");
        assert_eq!(record.payload["abstract"], "Sample Summary");
        assert_eq!(
            record.payload["authors"],
            serde_json::json!(["Author One", "Author Two"])
        );
        assert_eq!(record.payload["categories"], serde_json::json!(["cs.AI"]));
        assert_eq!(record.payload["published"], "2025-06-01T00:00:00Z");
        assert_eq!(record.payload["updated"], "2025-06-02T12:30:00+02:00");
        assert_eq!(
            record.payload["entry_url"],
            "http://arxiv.org/abs/2401.12345v1"
        );
        assert_eq!(
            record.payload["pdf_url"],
            "http://arxiv.org/pdf/2401.12345v1.pdf"
        );
    }

    #[test]
    fn test_map_metadata() {
        let read_at = Utc.with_ymd_and_hms(2025, 6, 3, 0, 0, 0).unwrap();
        let record = RecordMapper::new(true).map_at(&sample_entry(), Position::from_offset(0), read_at);

        assert_eq!(record.metadata[METADATA_ID], "2401.12345v1");
        assert_eq!(record.metadata[METADATA_TITLE], "Sample Title");
        assert_eq!(record.metadata[METADATA_PUBLISHED], "2025-06-01T00:00:00Z");
        assert_eq!(record.metadata[METADATA_READ_AT], "1748908800000000000");
    }

    #[test]
    fn test_pdf_omitted_when_disabled() {
        let record = RecordMapper::new(false).map(&sample_entry(), Position::from_offset(0));
        assert!(!record.payload.contains_key("pdf_url"));
    }

    #[test]
    fn test_pdf_falls_back_to_untyped_alternate() {
        let mut entry = sample_entry();
        entry.links = vec![
            Link {
                href: "http://example.org/related".to_string(),
                mime_type: "text/html".to_string(),
                rel: "related".to_string(),
            },
            Link {
                href: "http://arxiv.org/pdf/2401.12345v1".to_string(),
                mime_type: String::new(),
                rel: "alternate".to_string(),
            },
        ];
        let record = RecordMapper::new(true).map(&entry, Position::from_offset(0));
        assert_eq!(record.payload["pdf_url"], "http://arxiv.org/pdf/2401.12345v1");
    }

    #[test]
    fn test_pdf_omitted_when_href_empty() {
        let mut entry = sample_entry();
        entry.links[1].href = String::new();
        let record = RecordMapper::new(true).map(&entry, Position::from_offset(0));
        assert!(!record.payload.contains_key("pdf_url"));
    }

    #[test]
    fn test_pdf_first_match_wins() {
        let mut entry = sample_entry();
        entry.links.insert(
            0,
            Link {
                href: "http://arxiv.org/pdf/2401.12345v1".to_string(),
                mime_type: String::new(),
                rel: "alternate".to_string(),
            },
        );
        let record = RecordMapper::new(true).map(&entry, Position::from_offset(0));
        assert_eq!(record.payload["pdf_url"], "http://arxiv.org/pdf/2401.12345v1");
    }

    #[test]
    fn test_pdf_omitted_when_no_match() {
        let mut entry = sample_entry();
        entry.links.truncate(1);
        let record = RecordMapper::new(true).map(&entry, Position::from_offset(0));
        assert!(!record.payload.contains_key("pdf_url"));
        assert_eq!(record.payload.len(), 8);
    }
}

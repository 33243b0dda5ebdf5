// # Feed Parser
//
// Decodes an arXiv Atom document into `FeedEntry` values in document order.
//
// The document is deserialized with quick-xml's serde support into private
// wire structs, then each wire entry is normalized. Elements the poller does
// not use (opensearch counters, arxiv:comment, affiliations, ...) are ignored.
//
// ## Failure modes
//
// - Not well-formed / unexpected structure → `Error::MalformedFeed`
// - Root element other than `<feed>` (HTML error pages, error envelopes) → `Error::MalformedFeed`
// - A published/updated value matching no timestamp format → `Error::TimestampParse`
//
// Either failure aborts the whole parse; there are no partial results.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use quick_xml::Reader;
use quick_xml::events::Event;
use serde::Deserialize;

use super::entry::{Author, Category, FeedEntry, Link};
use crate::error::{Error, Result};

/// Local name the document root must carry
const ROOT_ELEMENT: &[u8] = b"feed";

/// Layout of the timezone-less fallback (arXiv occasionally omits the `Z`)
const NAIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

type TimestampStrategy = fn(&str) -> Option<DateTime<FixedOffset>>;

/// Timestamp formats, tried in order; first success wins
const TIMESTAMP_STRATEGIES: &[TimestampStrategy] = &[parse_rfc3339, parse_naive_utc];

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    summary: String,
    #[serde(rename = "author", default)]
    authors: Vec<AtomAuthor>,
    #[serde(default)]
    published: String,
    #[serde(default)]
    updated: String,
    #[serde(rename = "category", default)]
    categories: Vec<AtomCategory>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
}

#[derive(Debug, Deserialize)]
struct AtomAuthor {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct AtomCategory {
    #[serde(rename = "@term", default)]
    term: String,
    #[serde(rename = "@scheme", default)]
    scheme: String,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href", default)]
    href: String,
    #[serde(rename = "@type", default)]
    mime_type: String,
    #[serde(rename = "@rel", default)]
    rel: String,
}

impl TryFrom<AtomEntry> for FeedEntry {
    type Error = Error;

    fn try_from(raw: AtomEntry) -> Result<Self> {
        let published = parse_timestamp("published", &raw.published)?;
        let updated = parse_timestamp("updated", &raw.updated)?;

        Ok(FeedEntry {
            id: raw.id,
            title: raw.title,
            summary: raw.summary,
            authors: raw
                .authors
                .into_iter()
                .map(|a| Author { name: a.name })
                .collect(),
            published,
            updated,
            categories: raw
                .categories
                .into_iter()
                .map(|c| Category {
                    term: c.term,
                    scheme: c.scheme,
                })
                .collect(),
            links: raw
                .links
                .into_iter()
                .map(|l| Link {
                    href: l.href,
                    mime_type: l.mime_type,
                    rel: l.rel,
                })
                .collect(),
        })
    }
}

/// Parse a raw feed payload into entries
///
/// An empty feed (no `<entry>` elements) yields an empty vector.
pub fn parse(raw: &[u8]) -> Result<Vec<FeedEntry>> {
    check_root(raw)?;

    let feed: AtomFeed =
        quick_xml::de::from_reader(raw).map_err(|e| Error::malformed(e.to_string()))?;

    feed.entries.into_iter().map(FeedEntry::try_from).collect()
}

/// Reject documents whose root element is not `<feed>`
///
/// The serde decoder ignores the root name, so any well-formed document
/// would otherwise decode as a feed without entries.
fn check_root(raw: &[u8]) -> Result<()> {
    let mut reader = Reader::from_reader(raw);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == ROOT_ELEMENT {
                    return Ok(());
                }
                return Err(Error::malformed(format!(
                    "expected <feed> root element, found <{}>",
                    String::from_utf8_lossy(e.name().as_ref())
                )));
            }
            Ok(Event::Eof) => return Err(Error::malformed("document has no root element")),
            Ok(_) => {}
            Err(e) => return Err(Error::malformed(e.to_string())),
        }
    }
}

/// Parse one entry timestamp, trying every accepted format in order
///
/// # Parameters
///
/// - `field`: entry field name, reported in the error
/// - `value`: raw element text
pub fn parse_timestamp(field: &'static str, value: &str) -> Result<DateTime<FixedOffset>> {
    let trimmed = value.trim();
    TIMESTAMP_STRATEGIES
        .iter()
        .find_map(|strategy| strategy(trimmed))
        .ok_or_else(|| Error::TimestampParse {
            field,
            value: value.to_string(),
        })
}

fn parse_rfc3339(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value).ok()
}

fn parse_naive_utc(value: &str) -> Option<DateTime<FixedOffset>> {
    NaiveDateTime::parse_from_str(value, NAIVE_TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc().into())
}

// # Feed Entry
//
// One paper as returned by the arXiv API, after decoding. Entries are
// immutable once parsed; the record mapper only reads them.

use chrono::{DateTime, FixedOffset};

/// A normalized feed entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    /// Entry identifier, e.g. `http://arxiv.org/abs/2401.12345v1`
    pub id: String,
    /// Paper title
    pub title: String,
    /// Abstract text
    pub summary: String,
    /// Authors, in document order
    pub authors: Vec<Author>,
    /// First publication timestamp
    pub published: DateTime<FixedOffset>,
    /// Latest revision timestamp
    pub updated: DateTime<FixedOffset>,
    /// Category tags, in document order
    pub categories: Vec<Category>,
    /// Links, in document order
    pub links: Vec<Link>,
}

/// Entry author
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: String,
}

/// Category tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    /// Category term (e.g. `cs.AI`)
    pub term: String,
    /// Taxonomy scheme URI, empty when absent
    pub scheme: String,
}

/// Link attached to an entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub href: String,
    /// MIME type, empty when absent
    pub mime_type: String,
    /// Relation, empty when absent
    pub rel: String,
}

impl Link {
    /// Whether this link points at the PDF rendition
    ///
    /// Matches an explicit `application/pdf` type or an untyped `alternate`
    /// link. Callers take the first matching link in document order, so an
    /// untyped `alternate` listed earlier is chosen over a later typed one.
    pub fn is_pdf(&self) -> bool {
        self.mime_type == "application/pdf" || (self.rel == "alternate" && self.mime_type.is_empty())
    }
}

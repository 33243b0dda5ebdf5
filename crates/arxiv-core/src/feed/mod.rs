//! Feed decoding
//!
//! - [`entry`]: the normalized [`FeedEntry`] model
//! - [`parser`]: Atom document → entries, with tolerant timestamp parsing

pub mod entry;
pub mod parser;

pub use entry::{Author, Category, FeedEntry, Link};
pub use parser::{parse, parse_timestamp};

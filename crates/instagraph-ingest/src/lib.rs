//! InstaGraph Ingest — turns a URL into plain text for extraction.

pub mod scrape;

pub use scrape::{paragraph_text, HttpScraper, PageScraper};

//! UNIMARC record parsing
//!
//! The catalog answers with MarcXchange documents: each record is a list of
//! `datafield` elements identified by a three-character tag, each holding
//! `subfield` elements identified by a one-character code.
//!
//! Fields read:
//! - 010$a  ISBN
//! - 200$a  title
//! - 210$c  publisher, 210$d publication date (214$d as fallback)
//! - 215$a  extent ("312 p.")
//! - 330$a  summary
//! - 700$a / 700$b  family name / given name of the primary author

use lazy_static::lazy_static;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;

use super::{BookSuggestion, CatalogError, CatalogResult};
use crate::isbn::clean_isbn;

pub const UNKNOWN_TITLE: &str = "Unknown title";
pub const UNKNOWN_AUTHOR: &str = "Unknown author";
pub const NO_SUMMARY: &str = "No summary available";

lazy_static! {
    static ref YEAR: Regex = Regex::new(r"\d{4}").unwrap();
    static ref PAGES: Regex = Regex::new(r"(\d+)\s*p\.").unwrap();
}

/// One `datafield` of a record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataField {
    pub tag: String,
    pub subfields: Vec<(String, String)>,
}

/// A bibliographic record as a flat list of data fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarcRecord {
    pub fields: Vec<DataField>,
}

impl MarcRecord {
    /// First non-empty value of `tag$code`
    pub fn subfield(&self, tag: &str, code: &str) -> Option<&str> {
        self.fields
            .iter()
            .filter(|f| f.tag == tag)
            .flat_map(|f| f.subfields.iter())
            .find(|(c, v)| c == code && !v.trim().is_empty())
            .map(|(_, v)| v.trim())
    }

    /// First value `extract` finds, trying the subfields in order
    fn first_in<T>(&self, sources: &[(&str, &str)], extract: fn(&str) -> Option<T>) -> Option<T> {
        sources
            .iter()
            .find_map(|(tag, code)| self.subfield(tag, code).and_then(extract))
    }

    /// Flatten into a book suggestion, applying per-field defaults
    pub fn to_suggestion(&self) -> BookSuggestion {
        let title = self
            .subfield("200", "a")
            .unwrap_or(UNKNOWN_TITLE)
            .to_string();

        let author = format!(
            "{} {}",
            self.subfield("700", "b").unwrap_or_default(),
            self.subfield("700", "a").unwrap_or_default()
        )
        .trim()
        .to_string();
        let author = if author.is_empty() {
            UNKNOWN_AUTHOR.to_string()
        } else {
            author
        };

        let year = self.first_in(&[("210", "d"), ("214", "d")], first_year);
        let pages = self.first_in(&[("215", "a"), ("210", "d"), ("214", "d")], first_page_count);

        let summary = self
            .subfield("330", "a")
            .unwrap_or(NO_SUMMARY)
            .to_string();

        let publisher = self.subfield("210", "c").map(str::to_string);

        let isbn = self
            .subfield("010", "a")
            .map(clean_isbn)
            .filter(|isbn| !isbn.is_empty());

        BookSuggestion {
            title,
            author,
            year,
            pages,
            summary,
            publisher,
            isbn,
        }
    }
}

fn first_year(text: &str) -> Option<i32> {
    YEAR.find(text).and_then(|m| m.as_str().parse().ok())
}

fn first_page_count(text: &str) -> Option<u32> {
    PAGES
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Parse a catalog payload into suggestions, one per record
pub fn parse_response(xml: &str) -> CatalogResult<Vec<BookSuggestion>> {
    Ok(parse_records(xml)?
        .iter()
        .map(MarcRecord::to_suggestion)
        .collect())
}

/// Parse a catalog payload into raw records
///
/// Envelope elements are ignored; a record is any `record` element that
/// contains at least one data field.
pub fn parse_records(xml: &str) -> CatalogResult<Vec<MarcRecord>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut records = Vec::new();
    let mut buf = Vec::new();

    let mut current: Option<MarcRecord> = None;
    let mut field: Option<DataField> = None;
    let mut subfield: Option<(String, String)> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"record" => current = Some(MarcRecord::default()),
                b"datafield" if current.is_some() => {
                    let tag = attribute(e, b"tag").unwrap_or_default();
                    field = Some(DataField {
                        tag,
                        subfields: Vec::new(),
                    });
                }
                b"subfield" if field.is_some() => {
                    let code = attribute(e, b"code").unwrap_or_default();
                    subfield = Some((code, String::new()));
                }
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"subfield" => {
                    if let (Some(sub), Some(f)) = (subfield.take(), field.as_mut()) {
                        f.subfields.push(sub);
                    }
                }
                b"datafield" => {
                    if let (Some(f), Some(rec)) = (field.take(), current.as_mut()) {
                        rec.fields.push(f);
                    }
                }
                b"record" => {
                    if let Some(rec) = current.take() {
                        if !rec.fields.is_empty() {
                            records.push(rec);
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if let Some((_, value)) = subfield.as_mut() {
                    let text = e
                        .unescape()
                        .map_err(|err| CatalogError::Malformed(err.to_string()))?;
                    value.push_str(&text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some((_, value)) = subfield.as_mut() {
                    value.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(CatalogError::Malformed(format!("XML parse error: {}", e))),
            _ => {}
        }
        buf.clear();
    }

    Ok(records)
}

fn attribute(e: &quick_xml::events::BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == name)
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
}

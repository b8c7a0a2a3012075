//! Barcode normalization and ISBN conversion
//!
//! Scanned EAN-13 codes on books are ISBN-13s. Older catalog records are
//! sometimes indexed only by ISBN-10, so lookups fall back to the converted
//! form when a 13-digit code misses.

/// Book-industry EAN prefixes
const BOOKLAND_PREFIXES: [&str; 2] = ["978", "979"];

/// Kind of identifier a normalized code looks like
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    /// 13 digits with a 978/979 prefix
    Isbn13,
    /// 10 characters
    Isbn10,
    /// Anything else; passed through but expected to miss
    Unknown,
}

/// Convert a scanned code to its canonical identifier
///
/// Every character that is not an ASCII digit is stripped. The result is
/// passed through unchanged whatever its length.
pub fn normalize(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Classify a normalized identifier
pub fn classify(identifier: &str) -> IdentifierKind {
    match identifier.len() {
        13 if BOOKLAND_PREFIXES
            .iter()
            .any(|prefix| identifier.starts_with(prefix)) =>
        {
            IdentifierKind::Isbn13
        }
        10 => IdentifierKind::Isbn10,
        _ => IdentifierKind::Unknown,
    }
}

/// Convert an ISBN-13 to ISBN-10
///
/// Only defined for 13-digit input with the "978" prefix; 979 numbers have
/// no ISBN-10 equivalent. The check digit uses weights 10 down to 2 over the
/// nine core digits: `(11 - sum mod 11) mod 11`, written `X` for 10.
pub fn isbn13_to_isbn10(isbn13: &str) -> Option<String> {
    if isbn13.len() != 13 || !isbn13.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let core = isbn13.strip_prefix("978")?.get(..9)?;

    let sum: u32 = core
        .bytes()
        .zip((2..=10).rev())
        .map(|(b, weight)| u32::from(b - b'0') * weight)
        .sum();

    let check = (11 - sum % 11) % 11;
    let check_char = match check {
        10 => 'X',
        d => char::from(b'0' + d as u8),
    };

    let mut isbn10 = String::with_capacity(10);
    isbn10.push_str(core);
    isbn10.push(check_char);
    Some(isbn10)
}

/// Strip everything except digits and `X` from a catalog ISBN field
pub fn clean_isbn(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit() || *c == 'X')
        .collect()
}

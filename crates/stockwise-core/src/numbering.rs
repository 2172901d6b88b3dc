//! # Document Numbers
//!
//! Formatting and parsing of prefixed sequence numbers (`PO-00001`).
//!
//! Picking the next number needs to read the table, so that part lives in
//! `stockwise-db`; everything here is string work.

/// Formats `PREFIX-NNNNN`, zero-padded to `width` digits.
///
/// Sequences wider than `width` are printed in full rather than truncated.
///
/// ```rust
/// use stockwise_core::numbering::format_document_number;
///
/// assert_eq!(format_document_number("PO", 1, 5), "PO-00001");
/// assert_eq!(format_document_number("GRN", 123_456, 5), "GRN-123456");
/// ```
pub fn format_document_number(prefix: &str, sequence: u64, width: usize) -> String {
    format!("{}-{:0width$}", prefix, sequence, width = width)
}

/// Parses the sequence out of `PREFIX-NNNNN`.
///
/// Returns `None` for numbers with another prefix or a non-numeric tail.
///
/// ```rust
/// use stockwise_core::numbering::parse_sequence;
///
/// assert_eq!(parse_sequence("PO", "PO-00042"), Some(42));
/// assert_eq!(parse_sequence("PO", "GRN-00042"), None);
/// ```
pub fn parse_sequence(prefix: &str, number: &str) -> Option<u64> {
    let tail = number.strip_prefix(prefix)?.strip_prefix('-')?;
    if tail.is_empty() || !tail.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    tail.parse().ok()
}

/// Highest sequence among existing numbers with `prefix` (0 when none).
pub fn highest_sequence<'a, I>(prefix: &str, numbers: I) -> u64
where
    I: IntoIterator<Item = &'a str>,
{
    numbers
        .into_iter()
        .filter_map(|n| parse_sequence(prefix, n))
        .max()
        .unwrap_or(0)
}

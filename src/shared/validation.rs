use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for ISO calendar dates as stored on checkpoints
    /// Captures year, month and day; no time or offset suffix allowed
    /// - Valid: "2024-12-25", "2025-01-05"
    /// - Invalid: "2024-1-5", "2024-12-25T00:00:00Z", "12/25/2024"
    pub static ref DATE_REGEX: Regex = Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").unwrap();
}

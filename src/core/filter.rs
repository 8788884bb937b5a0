//! Purpose: Parse and apply list filters for the book collection.
//! Exports: `ListFilter`.
//! Role: Turns raw query values into one effective selection rule.
//! Invariants: Filters do not compose; the last supplied dimension wins
//! in the order name, reading, finished.
//! Invariants: Unparseable flag values are ignored rather than rejected.

use super::book::Book;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ListFilter {
    pub name: Option<String>,
    pub reading: Option<bool>,
    pub finished: Option<bool>,
}

#[derive(Debug, Eq, PartialEq)]
enum Selection {
    All,
    NameContains(String),
    Reading(bool),
    Finished(bool),
}

impl ListFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_reading(mut self, reading: bool) -> Self {
        self.reading = Some(reading);
        self
    }

    pub fn with_finished(mut self, finished: bool) -> Self {
        self.finished = Some(finished);
        self
    }

    /// Builds a filter from raw query-string values.
    pub fn from_query(name: Option<&str>, reading: Option<&str>, finished: Option<&str>) -> Self {
        Self {
            name: name.filter(|value| !value.is_empty()).map(str::to_string),
            reading: reading.and_then(parse_flag),
            finished: finished.and_then(parse_flag),
        }
    }

    fn selection(&self) -> Selection {
        if let Some(finished) = self.finished {
            return Selection::Finished(finished);
        }
        if let Some(reading) = self.reading {
            return Selection::Reading(reading);
        }
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => Selection::NameContains(name.to_lowercase()),
            _ => Selection::All,
        }
    }

    pub(crate) fn matcher(&self) -> impl Fn(&Book) -> bool {
        let selection = self.selection();
        move |book: &Book| match &selection {
            Selection::All => true,
            Selection::NameContains(needle) => book.name.to_lowercase().contains(needle.as_str()),
            Selection::Reading(reading) => book.reading == *reading,
            Selection::Finished(finished) => book.finished == *finished,
        }
    }
}

/// `0` and `1` (surrounding whitespace allowed) map to booleans. A blank value
/// counts as `0`.
fn parse_flag(value: &str) -> Option<bool> {
    let value = value.trim();
    if value.is_empty() {
        return Some(false);
    }
    match value.parse::<i64>() {
        Ok(0) => Some(false),
        Ok(1) => Some(true),
        _ => None,
    }
}

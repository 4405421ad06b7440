//! TOML input adapter.
//!
//! A timeline file is a list of `[[entry]]` tables:
//!
//! ```toml
//! [[entry]]
//! id = "latin"
//! name = "Latin"
//! start = -75
//! end = 600
//! become = "old-french"
//! ```
//!
//! [`parse`] turns the file into [`RawEntry`] records without interpreting
//! relations; the [`builder`](crate::model::builder) does that.

use std::ops::Range;

use log::{debug, trace};
use serde::Deserialize;
use toml::Spanned;

use crate::error::InputError;

/// One `[[entry]]` of a timeline file, as written.
///
/// Entries can also be constructed in code:
///
/// ```
/// # use strata::input::RawEntry;
/// let entry = RawEntry::new("latin", -75, 600)
///     .with_name("Latin")
///     .with_become("old-french")
///     .with_links(["greek"]);
/// assert_eq!(entry.id(), "latin");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub(crate) id: String,
    pub(crate) name: Option<String>,
    pub(crate) start: i32,
    pub(crate) end: i32,
    pub(crate) continues_as: Option<String>,
    pub(crate) merge: Option<String>,
    pub(crate) split: Option<String>,
    pub(crate) fork: Vec<String>,
    pub(crate) links: Vec<String>,
    pub(crate) row: Option<usize>,
    pub(crate) color: Option<String>,
    /// Byte range of the entry's `id` value in the source file.
    pub(crate) source_span: Option<Range<usize>>,
}

impl RawEntry {
    pub fn new(id: impl Into<String>, start: i32, end: i32) -> Self {
        Self {
            id: id.into(),
            name: None,
            start,
            end,
            continues_as: None,
            merge: None,
            split: None,
            fork: Vec::new(),
            links: Vec::new(),
            row: None,
            color: None,
            source_span: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the continuation successor (`become` in the file format).
    pub fn with_become(mut self, id: impl Into<String>) -> Self {
        self.continues_as = Some(id.into());
        self
    }

    pub fn with_merge(mut self, id: impl Into<String>) -> Self {
        self.merge = Some(id.into());
        self
    }

    pub fn with_split(mut self, id: impl Into<String>) -> Self {
        self.split = Some(id.into());
        self
    }

    pub fn with_fork(mut self, first: impl Into<String>, second: impl Into<String>) -> Self {
        self.fork = vec![first.into(), second.into()];
        self
    }

    pub fn with_links<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.links = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Pins the entry to a row.
    pub fn with_row(mut self, row: usize) -> Self {
        self.row = Some(row);
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn end(&self) -> i32 {
        self.end
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TimelineFile {
    #[serde(default)]
    entry: Vec<EntryRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EntryRecord {
    id: Spanned<String>,
    name: Option<String>,
    start: i32,
    end: i32,
    #[serde(rename = "become")]
    continues_as: Option<String>,
    merge: Option<String>,
    split: Option<String>,
    fork: Option<[String; 2]>,
    #[serde(default)]
    links: Vec<String>,
    row: Option<usize>,
    color: Option<String>,
}

impl From<EntryRecord> for RawEntry {
    fn from(record: EntryRecord) -> Self {
        let source_span = record.id.span();
        Self {
            id: record.id.into_inner(),
            name: record.name,
            start: record.start,
            end: record.end,
            continues_as: record.continues_as,
            merge: record.merge,
            split: record.split,
            fork: record.fork.map(Vec::from).unwrap_or_default(),
            links: record.links,
            row: record.row,
            color: record.color,
            source_span: Some(source_span),
        }
    }
}

/// Parses a timeline file.
///
/// # Errors
///
/// Returns [`InputError::Syntax`] for malformed TOML, unknown fields, missing
/// required fields and wrongly typed values such as a non-numeric year.
pub fn parse(source: &str) -> Result<Vec<RawEntry>, InputError> {
    let file: TimelineFile = toml::from_str(source).map_err(|err| InputError::Syntax {
        message: err.message().to_string(),
        span: err.span(),
    })?;

    let entries: Vec<RawEntry> = file.entry.into_iter().map(RawEntry::from).collect();
    debug!(entries = entries.len(); "Timeline file parsed");
    trace!(entries:?; "Raw entries");

    Ok(entries)
}

//! Error types for Strata operations.
//!
//! [`StrataError`] is the top-level error returned by the
//! [`TimelineBuilder`](crate::TimelineBuilder) facade. It wraps the stage
//! errors:
//!
//! - [`InputError`]: the timeline file is malformed or describes an
//!   impossible time axis. Carries a byte span into the source when known.
//! - [`LayoutError`]: an internal invariant of the row positioner was broken.
//!
//! Non-fatal conditions are not errors; they are recorded as
//! [`Warning`](crate::model::Warning)s on the timeline.

use std::{io, ops::Range};

use thiserror::Error;

/// The main error type for Strata operations.
///
/// # Diagnostic Variants
///
/// The `Input` variant keeps the source text next to the error so that
/// callers can render source snippets for the reported span.
#[derive(Debug, Error)]
pub enum StrataError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Input { err: InputError, src: String },

    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("Export error: {0}")]
    Export(Box<dyn std::error::Error>),
}

impl From<crate::export::Error> for StrataError {
    fn from(error: crate::export::Error) -> Self {
        Self::Export(Box::new(error))
    }
}

impl StrataError {
    /// Create a new `Input` error with the associated source text.
    pub fn new_input_error(err: InputError, src: impl Into<String>) -> Self {
        Self::Input {
            err,
            src: src.into(),
        }
    }
}

/// Fatal problems with the timeline input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// TOML syntax error, or a field of the wrong type (e.g. a non-numeric year).
    #[error("invalid timeline file: {message}")]
    Syntax {
        message: String,
        span: Option<Range<usize>>,
    },

    #[error("duplicate entry id `{id}`")]
    DuplicateId {
        id: String,
        span: Option<Range<usize>>,
    },

    #[error("entry `{id}` ends before it starts ({start}..{end})")]
    InvalidSpan {
        id: String,
        start: i32,
        end: i32,
        span: Option<Range<usize>>,
    },

    #[error("entry `{id}` uses year {year}, outside -{limit}..={limit}", limit = crate::model::YEAR_LIMIT)]
    YearOutOfRange {
        id: String,
        year: i32,
        span: Option<Range<usize>>,
    },

    #[error("entry `{id}` has an invalid color: {message}")]
    InvalidColor {
        id: String,
        message: String,
        span: Option<Range<usize>>,
    },

    #[error("`become` chain through `{id}` loops back on itself")]
    ContinuationCycle {
        id: String,
        span: Option<Range<usize>>,
    },

    #[error("`split` parents of `{id}` form a cycle")]
    SplitCycle {
        id: String,
        span: Option<Range<usize>>,
    },
}

impl InputError {
    /// Byte range in the source that the error points at, if known.
    pub fn span(&self) -> Option<Range<usize>> {
        match self {
            Self::Syntax { span, .. }
            | Self::DuplicateId { span, .. }
            | Self::InvalidSpan { span, .. }
            | Self::YearOutOfRange { span, .. }
            | Self::InvalidColor { span, .. }
            | Self::ContinuationCycle { span, .. }
            | Self::SplitCycle { span, .. } => span.clone(),
        }
    }

    /// Short label for the highlighted span.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Syntax { .. } => "here",
            Self::DuplicateId { .. } => "declared again here",
            Self::InvalidSpan { .. } => "this entry",
            Self::YearOutOfRange { .. } => "this entry",
            Self::InvalidColor { .. } => "this entry",
            Self::ContinuationCycle { .. } => "cycle starts here",
            Self::SplitCycle { .. } => "cycle starts here",
        }
    }

    /// Optional hint for fixing the input.
    pub fn help(&self) -> Option<&'static str> {
        match self {
            Self::Syntax { .. } => None,
            Self::DuplicateId { .. } => Some("every `[[entry]]` needs a unique `id`"),
            Self::InvalidSpan { .. } => Some("`end` must be greater than or equal to `start`"),
            Self::YearOutOfRange { .. } => Some("every year of the timeline gets a grid column; rescale very large years"),
            Self::InvalidColor { .. } => Some("use a CSS color such as `#885522` or `teal`"),
            Self::ContinuationCycle { .. } => {
                Some("a `become` chain must end in an entry without `become`")
            }
            Self::SplitCycle { .. } => Some("an entry cannot split from its own descendant"),
        }
    }
}

/// Broken invariants inside the row positioner.
///
/// These indicate a bookkeeping bug or an input structure the positioner
/// cannot recover from; they are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("row {row} is outside the grid ({rows} rows)")]
    RowOutOfBounds { row: usize, rows: usize },

    #[error("years {start}..{end} are outside the grid columns {first}..{last}")]
    ColumnOutOfBounds {
        start: i32,
        end: i32,
        first: i32,
        last: i32,
    },

    #[error("cannot force position without a row (cluster `{master}`)")]
    ForceWithoutAnchor { master: String },

    #[error("split parents of `{id}` form a cycle")]
    RelationCycle { id: String },

    #[error("entry `{id}` has no row; run the layout first")]
    UnplacedEntity { id: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_span_and_help() {
        let err = InputError::DuplicateId {
            id: "latin".to_string(),
            span: Some(10..17),
        };

        assert_eq!(err.span(), Some(10..17));
        assert_eq!(err.to_string(), "duplicate entry id `latin`");
        assert!(err.help().is_some());
    }

    #[test]
    fn test_force_without_anchor_message() {
        let err = LayoutError::ForceWithoutAnchor {
            master: "latin".to_string(),
        };
        assert!(err.to_string().contains("cannot force position without a row"));
    }

    #[test]
    fn test_strata_error_wraps_layout() {
        let err: StrataError = LayoutError::RowOutOfBounds { row: 4, rows: 2 }.into();
        assert!(matches!(err, StrataError::Layout(_)));
        assert_eq!(err.to_string(), "Layout error: row 4 is outside the grid (2 rows)");
    }
}

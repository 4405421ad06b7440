//! Error adapter for converting StrataError to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error types
//! and miette's rich diagnostic formatting used in the CLI. Input errors carry
//! the timeline source, so they are rendered with a labelled snippet.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, GraphicalReportHandler, LabeledSpan, SourceSpan};

use strata::{InputError, StrataError};

/// Adapter for an [`InputError`] together with the source it points into.
pub struct InputAdapter<'a> {
    err: &'a InputError,
    src: &'a str,
}

impl<'a> InputAdapter<'a> {
    pub fn new(err: &'a InputError, src: &'a str) -> Self {
        Self { err, src }
    }
}

impl fmt::Debug for InputAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputAdapter")
            .field("err", &self.err)
            .finish()
    }
}

impl fmt::Display for InputAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.err, f)
    }
}

impl std::error::Error for InputAdapter<'_> {}

impl MietteDiagnostic for InputAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new("strata::input"))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.err
            .help()
            .map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        if self.src.is_empty() {
            return None;
        }
        Some(&self.src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        if self.src.is_empty() {
            return None;
        }
        let span = self.err.span()?;
        let span = SourceSpan::new(span.start.into(), span.len());
        let label = LabeledSpan::new_primary_with_span(Some(self.err.label().to_string()), span);
        Some(Box::new(std::iter::once(label)))
    }
}

/// Adapter for [`StrataError`] variants without source information.
pub struct ErrorAdapter<'a>(pub &'a StrataError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            StrataError::Io(_) => "strata::io",
            StrataError::Input { .. } => "strata::input",
            StrataError::Layout(_) => "strata::layout",
            StrataError::Export(_) => "strata::export",
        };
        Some(Box::new(code))
    }
}

/// A reportable error that can be rendered by miette.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// An input error with a source snippet.
    Input(InputAdapter<'a>),
    /// A simple error without source location.
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Input(d) => fmt::Display::fmt(d, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Input(_) => None,
            Reportable::Error(e) => e.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Input(d) => d.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Input(d) => d.help(),
            Reportable::Error(e) => e.help(),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Input(d) => d.source_code(),
            Reportable::Error(e) => e.source_code(),
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Reportable::Input(d) => d.labels(),
            Reportable::Error(e) => e.labels(),
        }
    }
}

/// Convert a [`StrataError`] into the list of errors to report.
pub fn to_reportables(err: &StrataError) -> Vec<Reportable<'_>> {
    match err {
        StrataError::Input { err: input_err, src } => {
            vec![Reportable::Input(InputAdapter::new(input_err, src))]
        }
        _ => vec![Reportable::Error(ErrorAdapter(err))],
    }
}

/// Renders every diagnostic of `err` as one printable report.
///
/// Falls back to the plain message when miette cannot render a report.
pub fn render_reports(err: &StrataError) -> String {
    let handler = GraphicalReportHandler::new();

    to_reportables(err)
        .iter()
        .map(|reportable| {
            let mut rendered = String::new();
            if handler.render_report(&mut rendered, reportable).is_err() {
                rendered = reportable.to_string();
            }
            rendered
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use strata::LayoutError;

    use super::*;

    #[test]
    fn test_input_error_has_label_and_help() {
        let src = "[[entry]]\nid = \"latin\"\n";
        let err = StrataError::new_input_error(
            InputError::DuplicateId {
                id: "latin".to_string(),
                span: Some(15..22),
            },
            src,
        );

        let reportables = to_reportables(&err);
        assert_eq!(reportables.len(), 1);
        assert_eq!(reportables[0].to_string(), "duplicate entry id `latin`");

        let labels: Vec<_> = reportables[0].labels().unwrap().collect();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].offset(), 15);
        assert_eq!(labels[0].len(), 7);
        assert!(labels[0].primary());
        assert_eq!(labels[0].label(), Some("declared again here"));
        assert!(reportables[0].help().is_some());
    }

    #[test]
    fn test_input_error_without_source_has_no_labels() {
        let err = StrataError::new_input_error(
            InputError::InvalidSpan {
                id: "late".to_string(),
                start: 10,
                end: 5,
                span: None,
            },
            "",
        );

        let reportables = to_reportables(&err);
        assert!(reportables[0].labels().is_none());
        assert!(reportables[0].source_code().is_none());
    }

    #[test]
    fn test_layout_error_code() {
        let err = StrataError::Layout(LayoutError::UnplacedEntity {
            id: "x".to_string(),
        });

        let reportables = to_reportables(&err);

        match &reportables[0] {
            Reportable::Error(e) => {
                assert_eq!(e.code().unwrap().to_string(), "strata::layout");
                assert_eq!(e.to_string(), "Layout error: entry `x` has no row; run the layout first");
            }
            Reportable::Input(_) => panic!("Expected Error"),
        }
    }

    #[test]
    fn test_rendered_report_shows_snippet() {
        let src = "[[entry]]\nid = \"selfie\"\nstart = 1900\nend = 1950\nbecome = \"selfie\"\n";
        let err = StrataError::new_input_error(
            InputError::ContinuationCycle {
                id: "selfie".to_string(),
                span: Some(0..9),
            },
            src,
        );

        let rendered = render_reports(&err);

        assert!(rendered.contains("strata::input"));
        assert!(rendered.contains("selfie"));
        assert!(rendered.contains("cycle starts here"));
    }
}

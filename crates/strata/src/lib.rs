//! Strata - row layout and rendering for horizontal timeline diagrams.
//!
//! A timeline is a set of entries, each a span of years, related to each
//! other by continuation (`become`), `merge`, `split`, `fork` and `links`.
//! Strata collapses continuation chains, assigns every entry a row so that
//! nothing overlaps while related entries stay close, and renders the
//! result to SVG.
//!
//! The pipeline is exposed stage by stage:
//!
//! - [`input`]: TOML timeline files to [`input::RawEntry`] records;
//! - [`model`]: raw records to a [`model::Timeline`] of entities;
//! - [`layout`]: row assignment;
//! - [`scene`]: pixel geometry;
//! - [`export`]: SVG output.
//!
//! [`TimelineBuilder`] runs them with a shared [`config::AppConfig`].

pub mod config;
pub mod export;
pub mod input;
pub mod layout;
pub mod model;
pub mod scene;

mod error;

pub use strata_core::{color, draw, geometry, identifier};

pub use error::{InputError, LayoutError, StrataError};

use log::info;

use config::AppConfig;
use export::Exporter;
use input::RawEntry;
use layout::LayoutSummary;
use model::Timeline;
use scene::Scene;

/// Builder for parsing, laying out and rendering timelines.
///
/// # Examples
///
/// ```
/// use strata::{TimelineBuilder, config::AppConfig};
///
/// let source = r#"
/// [[entry]]
/// id = "latin"
/// start = -75
/// end = 600
///
/// [[entry]]
/// id = "old-french"
/// start = 600
/// end = 1400
/// split = "latin"
/// "#;
///
/// let builder = TimelineBuilder::new(AppConfig::default());
/// let mut timeline = builder.parse(source).unwrap();
/// builder.layout(&mut timeline).unwrap();
///
/// let svg = builder.render_svg(&timeline).unwrap();
/// assert!(svg.contains("old-french"));
/// ```
#[derive(Debug, Default)]
pub struct TimelineBuilder {
    config: AppConfig,
}

impl TimelineBuilder {
    /// Create a new timeline builder with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Parse a TOML timeline file and build its entity model.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::Input`] with the source attached for syntax
    /// errors and invalid entries.
    pub fn parse(&self, source: &str) -> Result<Timeline, StrataError> {
        info!("Parsing timeline");
        let entries =
            input::parse(source).map_err(|err| StrataError::new_input_error(err, source))?;

        model::build(entries).map_err(|err| StrataError::new_input_error(err, source))
    }

    /// Build the entity model from entries created in code.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::Input`] for invalid entries. There is no source
    /// text to attach, so the error carries an empty one.
    pub fn build(&self, entries: Vec<RawEntry>) -> Result<Timeline, StrataError> {
        model::build(entries).map_err(|err| StrataError::new_input_error(err, ""))
    }

    /// Assign a row to every entity of `timeline`.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::Layout`] if the positioner fails.
    pub fn layout(&self, timeline: &mut Timeline) -> Result<LayoutSummary, StrataError> {
        let summary = layout::layout(timeline, self.config.layout())?;
        Ok(summary)
    }

    /// Render a laid-out timeline to an SVG string.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::Layout`] if the timeline has not been laid out,
    /// or [`StrataError::Export`] for rendering errors such as an invalid
    /// color in the style configuration.
    pub fn render_svg(&self, timeline: &Timeline) -> Result<String, StrataError> {
        info!(entities = timeline.entities().len(); "Rendering timeline");
        let scene = Scene::new(timeline, self.config.style())?;

        let mut exporter = export::svg::SvgBuilder::new(Vec::new())
            .with_style(self.config.style())
            .build()?;
        exporter.export_scene(&scene)?;

        let svg = String::from_utf8(exporter.into_inner())
            .map_err(|err| StrataError::Export(Box::new(err)))?;

        info!(bytes = svg.len(); "SVG rendered successfully");
        Ok(svg)
    }
}

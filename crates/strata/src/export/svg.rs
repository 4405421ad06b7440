//! SVG export backend.
//!
//! [`SvgBuilder`] collects the style and the output writer, [`Svg`] renders
//! a [`Scene`] into an SVG document:
//!
//! - a background rectangle;
//! - a year axis with a tick every `axis_step` years;
//! - one bar per entity, filled with the entry color or the configured bar
//!   color;
//! - relation lines drawn through [`SvgLineDrawer`];
//! - the entity labels on top.

mod line;

pub use line::SvgLineDrawer;

use std::io::Write;

use log::{debug, info};
use svg::{self, node::element as svg_element};

use strata_core::{
    color::Color,
    draw::{LayeredOutput, RenderLayer, StrokeDefinition},
};

use super::{Error, Exporter};
use crate::{config::StyleConfig, scene::Scene};

/// Builder for [`Svg`].
///
/// ```
/// # use strata::{config::StyleConfig, export::{Exporter, svg::SvgBuilder}, scene::Scene};
/// # use strata::{input::RawEntry, layout, model};
/// let mut timeline = model::build(vec![RawEntry::new("latin", -75, 600)]).unwrap();
/// layout::layout(&mut timeline, &Default::default()).unwrap();
/// let scene = Scene::new(&timeline, &StyleConfig::default()).unwrap();
///
/// let mut exporter = SvgBuilder::new(Vec::new()).build().unwrap();
/// exporter.export_scene(&scene).unwrap();
///
/// let svg = String::from_utf8(exporter.into_inner()).unwrap();
/// assert!(svg.contains("latin"));
/// ```
#[derive(Debug)]
pub struct SvgBuilder<W> {
    writer: W,
    style: StyleConfig,
}

impl<W: Write> SvgBuilder<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            style: StyleConfig::default(),
        }
    }

    pub fn with_style(mut self, style: &StyleConfig) -> Self {
        self.style = style.clone();
        self
    }

    /// Resolves the style colors and creates the exporter.
    ///
    /// # Errors
    ///
    /// [`Error::Render`] if a configured color is invalid.
    pub fn build(self) -> Result<Svg<W>, Error> {
        let palette = Palette {
            background: self.style.background_color().map_err(Error::Render)?,
            bar: self.style.bar_color().map_err(Error::Render)?,
            line: self.style.line_color().map_err(Error::Render)?,
            text: self.style.text_color().map_err(Error::Render)?,
        };

        Ok(Svg {
            writer: self.writer,
            style: self.style,
            palette,
            line_drawer: SvgLineDrawer::new(),
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct Palette {
    background: Color,
    bar: Color,
    line: Color,
    text: Color,
}

/// SVG exporter writing to `W`.
#[derive(Debug)]
pub struct Svg<W> {
    writer: W,
    style: StyleConfig,
    palette: Palette,
    line_drawer: SvgLineDrawer,
}

impl<W> Svg<W> {
    /// Consumes the exporter and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Renders `scene` to an SVG document.
    pub fn render_scene(&mut self, scene: &Scene) -> svg::Document {
        let canvas = scene.canvas();

        let mut output = LayeredOutput::new();
        output.merge(self.render_background(scene));
        output.merge(self.render_axis(scene));
        output.merge(self.render_bars(scene));
        output.merge(self.render_relations(scene));
        output.merge(self.render_labels(scene));

        let mut doc = svg::Document::new()
            .set(
                "viewBox",
                format!(
                    "{} {} {} {}",
                    canvas.min_x(),
                    canvas.min_y(),
                    canvas.width(),
                    canvas.height()
                ),
            )
            .set("width", canvas.width())
            .set("height", canvas.height());

        if self.line_drawer.marker_count() > 0 {
            doc = doc.add(self.line_drawer.draw_marker_definitions());
        }
        for group in output.render() {
            doc = doc.add(group);
        }
        doc
    }

    fn render_background(&self, scene: &Scene) -> LayeredOutput {
        let canvas = scene.canvas();
        let mut output = LayeredOutput::new();

        let rect = svg_element::Rectangle::new()
            .set("x", canvas.min_x())
            .set("y", canvas.min_y())
            .set("width", canvas.width())
            .set("height", canvas.height())
            .set("fill", self.palette.background.to_string())
            .set("fill-opacity", self.palette.background.alpha());
        output.add_to_layer(RenderLayer::Background, Box::new(rect));
        output
    }

    fn render_axis(&self, scene: &Scene) -> LayeredOutput {
        let mut output = LayeredOutput::new();
        let step = self.style.axis_step() as i32;
        if step <= 0 || scene.boxes().is_empty() {
            return output;
        }

        let projection = scene.projection();
        let canvas = scene.canvas();
        let color = self.palette.line.with_alpha(0.25);
        let label_y = self.style.padding() + self.style.row_height() / 2.0;

        let mut year = projection.year_start().div_euclid(step) * step;
        if year < projection.year_start() {
            year += step;
        }

        while year <= scene.year_end() {
            let x = projection.year_to_x(year);
            let tick = svg_element::Line::new()
                .set("x1", x)
                .set("y1", label_y + 4.0)
                .set("x2", x)
                .set("y2", canvas.max_y() - self.style.padding())
                .set("stroke", color.to_string())
                .set("stroke-opacity", color.alpha())
                .set("stroke-width", 1);
            let label = svg_element::Text::new(year.to_string())
                .set("x", x)
                .set("y", label_y)
                .set("text-anchor", "middle")
                .set("font-size", 10)
                .set("fill", self.palette.text.to_string());

            output.add_to_layer(RenderLayer::Axis, Box::new(tick));
            output.add_to_layer(RenderLayer::Axis, Box::new(label));
            year += step;
        }

        output
    }

    fn render_bars(&self, scene: &Scene) -> LayeredOutput {
        let mut output = LayeredOutput::new();

        for entity_box in scene.boxes() {
            let bounds = entity_box.bounds();
            let fill = entity_box.color().unwrap_or(self.palette.bar);
            let rect = svg_element::Rectangle::new()
                .set("x", bounds.min_x())
                .set("y", bounds.min_y())
                .set("width", bounds.width())
                .set("height", bounds.height())
                .set("rx", 2)
                .set("fill", fill.to_string())
                .set("fill-opacity", fill.alpha())
                .set("data-id", entity_box.id().to_string());
            output.add_to_layer(RenderLayer::Bar, Box::new(rect));
        }

        output
    }

    fn render_relations(&mut self, scene: &Scene) -> LayeredOutput {
        let stroke = StrokeDefinition::solid(self.palette.line, self.style.stroke_width());
        let mut output = LayeredOutput::new();

        for node in scene.draw(&mut self.line_drawer, &stroke) {
            output.add_to_layer(RenderLayer::Relation, node);
        }
        output
    }

    fn render_labels(&self, scene: &Scene) -> LayeredOutput {
        let mut output = LayeredOutput::new();
        let font_size = (self.style.bar_height() - 4.0).max(6.0);

        for entity_box in scene.boxes() {
            let bounds = entity_box.bounds();
            let text = svg_element::Text::new(entity_box.label())
                .set("x", bounds.min_x() + 3.0)
                .set("y", bounds.center().y())
                .set("dominant-baseline", "central")
                .set("font-size", font_size)
                .set("fill", self.palette.text.to_string());
            output.add_to_layer(RenderLayer::Text, Box::new(text));
        }

        output
    }
}

impl<W: Write> Exporter for Svg<W> {
    fn export_scene(&mut self, scene: &Scene) -> Result<(), Error> {
        let doc = self.render_scene(scene);
        debug!(markers = self.line_drawer.marker_count(); "SVG document rendered");

        svg::write(&mut self.writer, &doc).map_err(Error::Io)?;
        info!(boxes = scene.boxes().len(), relations = scene.relations().len(); "SVG exported");
        Ok(())
    }
}

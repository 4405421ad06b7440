//! CLI logic for the Strata timeline tool.
//!
//! Reads a TOML timeline file, lays it out and writes either an SVG drawing
//! or the table of assigned rows.

pub mod error_adapter;

mod args;
mod config;

pub use args::{Args, OutputFormat};

use std::fs;

use indexmap::IndexMap;
use log::info;
use serde::Serialize;

use strata::{StrataError, TimelineBuilder, model::Timeline};

/// The `--format rows` output document.
#[derive(Debug, Serialize)]
struct RowTable {
    rows: IndexMap<String, usize>,
}

impl RowTable {
    fn from_timeline(timeline: &Timeline) -> Result<Self, StrataError> {
        let rows = timeline
            .row_assignments()?
            .into_iter()
            .map(|(id, row)| (id.to_string(), row))
            .collect();
        Ok(Self { rows })
    }
}

/// Run the Strata CLI application
///
/// This function processes the input file through the Strata pipeline
/// and writes the result to the output file.
///
/// # Errors
///
/// Returns `StrataError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Invalid timeline input
/// - Layout errors
/// - Rendering errors
pub fn run(args: &Args) -> Result<(), StrataError> {
    info!(
        input_path = args.input,
        output_path = args.output,
        format:? = args.format;
        "Processing timeline"
    );

    let app_config = config::load_config(args.config.as_ref())?;
    let source = fs::read_to_string(&args.input)?;

    let builder = TimelineBuilder::new(app_config);
    let mut timeline = builder.parse(&source)?;
    let summary = builder.layout(&mut timeline)?;
    info!(
        rows = summary.rows,
        warnings = timeline.warnings().len();
        "Timeline laid out"
    );

    let output = match args.format {
        OutputFormat::Svg => builder.render_svg(&timeline)?,
        OutputFormat::Rows => {
            let table = RowTable::from_timeline(&timeline)?;
            toml::to_string(&table).map_err(|err| StrataError::Export(Box::new(err)))?
        }
    };

    fs::write(&args.output, output)?;

    info!(output_file = args.output; "Output written successfully");

    Ok(())
}

//! Drawing definitions shared by timeline renderers.
//!
//! Nothing in this module decides *where* things go; the layout engine and
//! scene adapter compute coordinates and hand finished [`Line`]s to a
//! [`LineDrawer`], which owns the output format.

mod layer;
mod line;
mod stroke;

pub use layer::{LayeredOutput, RenderLayer, SvgNode};
pub use line::{Line, LineDrawer, LineMarkers, MarkerKind};
pub use stroke::{StrokeDefinition, StrokeStyle};

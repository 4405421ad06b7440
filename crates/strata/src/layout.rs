//! Row assignment.
//!
//! Every entity of a [`Timeline`](crate::model::Timeline) gets a row such
//! that no two entities on the same row overlap in time, while entities
//! related by `split` and `merge` stay close to each other. The entry point
//! is [`layout()`].

mod cluster;
pub mod grid;
mod placement;
mod positioner;

pub use grid::Grid;
pub use positioner::{LayoutSummary, layout};

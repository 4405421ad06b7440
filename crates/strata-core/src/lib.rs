//! Strata Core Types and Definitions
//!
//! This crate provides the foundational types shared by the Strata timeline
//! toolchain. It includes:
//!
//! - **Identifiers**: String-interned entry identifiers ([`identifier::Id`])
//! - **Colors**: Color handling with CSS color support ([`color::Color`])
//! - **Geometry**: Basic geometric types ([`geometry`] module)
//! - **Draw**: Strokes, render layers and the line-drawing interface ([`draw`] module)

pub mod color;
pub mod draw;
pub mod geometry;
pub mod identifier;

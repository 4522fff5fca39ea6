//! Rendering utilities for human review surfaces.

#![forbid(unsafe_code)]

mod markdown;

pub use markdown::render_markdown;

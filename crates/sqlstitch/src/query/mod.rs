//! Query composition: split-query fragments, markers, expansion,
//! dialect rendering and column projection.

pub mod expand;
pub mod fragment;
pub mod marker;
pub mod project;
pub mod render;

pub use expand::expand;
pub use fragment::SplitQuery;
pub use marker::{Builtin, Ident, QueryValue};
pub use project::project;
pub use render::{compile, render, Rendered};

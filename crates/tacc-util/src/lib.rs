//! tacc-util - Core utilities shared by every stage of the tacc pipeline.
//!
//! This crate has no dependency on any other `tacc-*` crate. It provides:
//!
//! - [`span`]: source-location tracking (`Span`, line/column).
//! - [`symbol`]: global string interning (`Symbol`).
//! - [`index_vec`]: typed-index arenas (`IndexVec<I, T>`, `Idx`).
//! - [`diagnostic`]: caret-style source-line rendering for the parser's
//!   single fatal error report.

pub mod diagnostic;
pub mod index_vec;
pub mod span;
pub mod symbol;

pub use index_vec::{Idx, IndexVec};
pub use span::Span;
pub use symbol::Symbol;

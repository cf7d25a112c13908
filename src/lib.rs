//! Core library for the xml2table command line application.
//!
//! The library turns XML documents without a fixed schema into flat tables.
//! The element tree lives in [`model`], the per-record flattening logic in
//! [`flatten`], record selection and column unification in [`table`], file
//! adapters under [`io`], and the end-to-end orchestration in [`convert`].

pub mod convert;
pub mod error;
pub mod flatten;
pub mod io;
pub mod model;
pub mod progress;
pub mod table;

pub use error::{Result, ToolError};

// Main library entry point for gccxml-dump.

pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod ports;

pub use error::{DumpError, Result};

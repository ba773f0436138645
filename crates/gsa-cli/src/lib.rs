//! Command-line surface of the GSA toolkit.

pub mod cli;

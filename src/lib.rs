//! Reading, checking and writing CIF 1.1 crystal structure files.
//!
//! See [`cif`] for the document model, typed extractors and writer, and
//! [`config`] for the optional JSON settings file used by the `cifkit` CLI.

pub mod cif;
pub mod config;

pub use cif::{parse, parse_file, write, CifParseError, Document, ParseOptions};
pub use config::Config;

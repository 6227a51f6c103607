//! CIF reader, typed extractors, writer and consistency checks.
//!
//! Two-layer design:
//! - **Layer 1 (DOM)**: [`parse`] any CIF 1.1 file into an untyped [`Document`] tree,
//!   and [`write`] it back out.
//! - **Layer 2 (Extractors)**: Pull typed data out via `TryFrom<&Block>`:
//!   [`UnitCell`], [`CellBlock`], [`GlobalInfo`], or auto-detect with [`CifContent`].
//!
//! ```ignore
//! let doc = cifkit::cif::parse(input)?;
//! let block = doc.block("standardized_unitcell").unwrap();
//!
//! // Caller knows what they have:
//! let cell = CellBlock::try_from(block)?;
//!
//! // Or auto-detect:
//! let content = CifContent::from(block.clone());
//! ```

pub mod dom;
pub mod extract;
pub mod parse;
pub mod validate;
pub mod write;

// DOM types
pub use dom::{Block, ColumnIter, Columns, Document, Loop, Measured, RowIter, Value};

// Reading and writing
pub use parse::{parse, parse_file, parse_with, CifParseError, ParseOptions};
pub use write::{write, write_to};

// Typed extractors
pub use extract::{
    AnisotropicDisplacement, AtomSite, AxialRatios, CellBlock, CellSetting, CifContent,
    CrystalRecord, Datum, ExtractionError, GlobalInfo, IsotropicDisplacement, PhaseInfo,
    Reference, UnitCell,
};

// Checks
pub use validate::{validate, Issue, ValidationOptions, ValidationReport};

//! Typed extractors for CIF data blocks.
//!
//! Each extractor implements `TryFrom<&Block>`, pulling typed data out of the
//! untyped DOM. Extraction fails gracefully when required categories or tags
//! are missing.
//!
//! Tag lookups accept the CIF 1.1 core spelling (`_cell_length_a`), the
//! dotted DDLm spelling (`_cell.length_a`) and the `_sm_*` extensions used by
//! Pauling-file exports.
//!
//! Values that may legitimately be `?` or `.` are carried as [`Datum`], and
//! columns that may be missing entirely are wrapped in `Option`, so "absent",
//! "unknown", "inapplicable" and "known" never collapse into each other.

use std::fmt;

use glam::DVec3;
use serde::Serialize;

use super::dom::{Block, Document, Loop, Measured, Value};

// ---------------------------------------------------------------------------
// Tag spellings
// ---------------------------------------------------------------------------

const CELL_A: &[&str] = &["_cell_length_a", "_cell.length_a"];
const CELL_B: &[&str] = &["_cell_length_b", "_cell.length_b"];
const CELL_C: &[&str] = &["_cell_length_c", "_cell.length_c"];
const CELL_ALPHA: &[&str] = &["_cell_angle_alpha", "_cell.angle_alpha"];
const CELL_BETA: &[&str] = &["_cell_angle_beta", "_cell.angle_beta"];
const CELL_GAMMA: &[&str] = &["_cell_angle_gamma", "_cell.angle_gamma"];
const CELL_VOLUME: &[&str] = &["_cell_volume", "_cell.volume"];
const CELL_Z: &[&str] = &["_cell_formula_units_Z", "_cell.formula_units_Z"];
const RATIO_AB: &[&str] = &["_sm_length_ratio_ab", "_cell_length_ratio_ab"];
const RATIO_BC: &[&str] = &["_sm_length_ratio_bc", "_cell_length_ratio_bc"];
const RATIO_CA: &[&str] = &["_sm_length_ratio_ca", "_cell_length_ratio_ca"];
const SG_SYMBOL: &[&str] = &[
    "_symmetry_space_group_name_H-M",
    "_space_group_name_H-M_alt",
    "_symmetry.space_group_name_H-M",
    "_space_group.name_H-M_alt",
];
const SG_NUMBER: &[&str] = &[
    "_symmetry_Int_Tables_number",
    "_space_group_IT_number",
    "_symmetry.Int_Tables_number",
    "_space_group.IT_number",
];
const TRANSFORMATION: &[&str] = &["_sm_cell_transformation", "_sm_transformation"];

const SITE_LABEL: &[&str] = &["_atom_site_label", "_atom_site.label"];
const SITE_TYPE: &[&str] = &["_atom_site_type_symbol", "_atom_site.type_symbol"];
const SITE_WYCKOFF: &[&str] = &["_atom_site_Wyckoff_symbol", "_atom_site.Wyckoff_symbol"];
const SITE_SYMMETRY: &[&str] = &["_sm_site_symmetry", "_atom_site_site_symmetry"];
const SITE_X: &[&str] = &["_atom_site_fract_x", "_atom_site.fract_x"];
const SITE_Y: &[&str] = &["_atom_site_fract_y", "_atom_site.fract_y"];
const SITE_Z: &[&str] = &["_atom_site_fract_z", "_atom_site.fract_z"];
const SITE_OCCUPANCY: &[&str] = &["_atom_site_occupancy", "_atom_site.occupancy"];
const SITE_COORDINATION: &[&str] = &[
    "_sm_coordination_number",
    "_atom_site_coordination_number",
];
const SITE_ENVIRONMENT: &[&str] = &[
    "_sm_atomic_environment_type",
    "_atom_site_atomic_environment_type",
];

const ISO_LABEL: &[&str] = &[
    "_atom_site_iso_label",
    "_sm_atom_site_iso_label",
    "_atom_site_label",
    "_atom_site.label",
];
const ISO_U: &[&str] = &[
    "_atom_site_iso_U_equiv",
    "_atom_site_U_iso_or_equiv",
    "_atom_site.U_iso_or_equiv",
];
const ISO_B: &[&str] = &[
    "_atom_site_iso_B_equiv",
    "_atom_site_B_iso_or_equiv",
    "_atom_site.B_iso_or_equiv",
];

const ANISO_LABEL: &[&str] = &["_atom_site_aniso_label", "_atom_site_aniso.label"];
const ANISO_U11: &[&str] = &["_atom_site_aniso_U_11", "_atom_site_aniso.U_11"];
const ANISO_U22: &[&str] = &["_atom_site_aniso_U_22", "_atom_site_aniso.U_22"];
const ANISO_U33: &[&str] = &["_atom_site_aniso_U_33", "_atom_site_aniso.U_33"];
const ANISO_U12: &[&str] = &["_atom_site_aniso_U_12", "_atom_site_aniso.U_12"];
const ANISO_U13: &[&str] = &["_atom_site_aniso_U_13", "_atom_site_aniso.U_13"];
const ANISO_U23: &[&str] = &["_atom_site_aniso_U_23", "_atom_site_aniso.U_23"];

const ATOM_TYPE: &[&str] = &["_atom_type_symbol", "_atom_type.symbol"];

const DICT_NAME: &[&str] = &["_audit_conform_dict_name", "_audit_conform.dict_name"];
const DICT_VERSION: &[&str] = &["_audit_conform_dict_version", "_audit_conform.dict_version"];
const DICT_LOCATION: &[&str] = &["_audit_conform_dict_location", "_audit_conform.dict_location"];
const CREATION_DATE: &[&str] = &["_audit_creation_date", "_audit.creation_date"];
const CREATION_METHOD: &[&str] = &["_audit_creation_method", "_audit.creation_method"];

const PHASE_LABEL: &[&str] = &["_sm_phase_label", "_pd_phase_name"];
const MINERAL: &[&str] = &["_chemical_name_mineral", "_chemical.name_mineral"];
const COMPOUND_CLASS: &[&str] = &["_sm_compound_class", "_chemical_compound_class"];
const PROTOTYPE: &[&str] = &[
    "_sm_structure_prototype",
    "_sm_structure_type",
    "_chemical_name_structure_type",
];
const PEARSON: &[&str] = &["_sm_pearson_symbol"];
const PHASE_SG_NUMBER: &[&str] = &[
    "_sm_space_group_number",
    "_space_group_IT_number",
    "_symmetry_Int_Tables_number",
];
const FORMULA_SUM: &[&str] = &["_chemical_formula_sum", "_chemical_formula.sum"];
const FORMULA_STRUCTURAL: &[&str] = &[
    "_chemical_formula_structural",
    "_chemical_formula.structural",
];
const FORMULA_WEIGHT: &[&str] = &["_chemical_formula_weight", "_chemical_formula.weight"];

const CREDIT_PREFIXES: &[&str] = &["_sm_credits", "_database_code"];
const NOTE_SUFFIXES: &[&str] = &["_details", "_remarks", "_notes", "_comment"];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A typed CIF value that may be the `?` or `.` marker instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Datum<T> {
    Known(T),
    /// `?`: not determined.
    Unknown,
    /// `.`: does not apply.
    Inapplicable,
}

impl<T> Datum<T> {
    pub fn known(&self) -> Option<&T> {
        match self {
            Datum::Known(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Datum::Known(_))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Datum::Unknown)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Datum<U> {
        match self {
            Datum::Known(v) => Datum::Known(f(v)),
            Datum::Unknown => Datum::Unknown,
            Datum::Inapplicable => Datum::Inapplicable,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Datum<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Known(v) => v.fmt(f),
            Datum::Unknown => f.write_str("?"),
            Datum::Inapplicable => f.write_str("."),
        }
    }
}

impl Datum<Measured> {
    /// The numeric value, ignoring its uncertainty.
    pub fn value(&self) -> Option<f64> {
        self.known().map(|m| m.value)
    }
}

impl Datum<String> {
    pub fn as_deref(&self) -> Option<&str> {
        self.known().map(String::as_str)
    }
}

/// Unit cell parameters (Å and degrees).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UnitCell {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

/// Axial ratios `a/b`, `b/c`, `c/a`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxialRatios {
    pub ab: f64,
    pub bc: f64,
    pub ca: f64,
}

/// Axial ratios as written in the file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatedRatios {
    pub ab: Datum<Measured>,
    pub bc: Datum<Measured>,
    pub ca: Datum<Measured>,
}

/// Which description of the cell a block holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellSetting {
    Standardized,
    Published,
    NiggliReduced,
    Other(String),
}

/// A single row of the atom-site table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtomSite {
    pub label: Datum<String>,
    pub type_symbol: Option<Datum<String>>,
    pub wyckoff: Option<Datum<String>>,
    pub site_symmetry: Option<Datum<String>>,
    pub x: Datum<Measured>,
    pub y: Datum<Measured>,
    pub z: Datum<Measured>,
    pub occupancy: Option<Datum<Measured>>,
    pub coordination: Option<Datum<u32>>,
    /// Atomic environment description (e.g. `tetrahedron`).
    pub environment: Option<Datum<String>>,
}

/// Equivalent isotropic displacement for one atom label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IsotropicDisplacement {
    pub label: Datum<String>,
    pub u_eq: Option<Datum<Measured>>,
    pub b_eq: Option<Datum<Measured>>,
}

/// Anisotropic displacement tensor components for one atom label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnisotropicDisplacement {
    pub label: Datum<String>,
    pub u11: Datum<Measured>,
    pub u22: Datum<Measured>,
    pub u33: Datum<Measured>,
    pub u12: Datum<Measured>,
    pub u13: Datum<Measured>,
    pub u23: Datum<Measured>,
}

/// One self-contained cell description with its site and displacement tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellBlock {
    pub name: String,
    pub setting: CellSetting,
    pub cell: UnitCell,
    /// `a, b, c, alpha, beta, gamma` as written, uncertainties included.
    pub parameters: [Measured; 6],
    pub stated_ratios: Option<StatedRatios>,
    pub stated_volume: Option<Datum<Measured>>,
    pub space_group: Option<Datum<String>>,
    pub space_group_number: Option<Datum<u32>>,
    pub formula_units: Option<Datum<u32>>,
    pub transformation: Option<Datum<String>>,
    pub atom_types: Vec<Datum<String>>,
    pub sites: Vec<AtomSite>,
    pub isotropic: Vec<IsotropicDisplacement>,
    pub anisotropic: Vec<AnisotropicDisplacement>,
}

/// A dictionary the file declares conformance to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DictionaryRef {
    pub name: Datum<String>,
    pub version: Option<Datum<String>>,
    pub location: Option<Datum<String>>,
}

/// A bibliographic reference.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Reference {
    pub id: Option<Datum<String>>,
    pub authors: Vec<Datum<String>>,
    pub title: Option<Datum<String>>,
    pub journal: Option<Datum<String>>,
    pub volume: Option<Datum<String>>,
    pub year: Option<Datum<i32>>,
    pub page_first: Option<Datum<String>>,
    pub page_last: Option<Datum<String>>,
}

/// Phase classification.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PhaseInfo {
    pub label: Option<Datum<String>>,
    pub mineral: Option<Datum<String>>,
    pub compound_class: Option<Datum<String>>,
    pub prototype: Option<Datum<String>>,
    pub pearson_symbol: Option<Datum<String>>,
    pub space_group_number: Option<Datum<u32>>,
    pub formula_sum: Option<Datum<String>>,
    pub formula_structural: Option<Datum<String>>,
    pub formula_weight: Option<Datum<Measured>>,
}

/// A free-text note, keyed by the tag it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Note {
    pub tag: String,
    pub text: Datum<String>,
}

/// Bibliographic and phase-level metadata of the global block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalInfo {
    pub name: String,
    pub dictionaries: Vec<DictionaryRef>,
    pub creation_date: Option<Datum<String>>,
    pub creation_method: Option<Datum<String>>,
    /// Copyright, credit and database-code entries, in file order.
    pub credits: Vec<Note>,
    pub references: Vec<Reference>,
    pub phase: PhaseInfo,
    pub notes: Vec<Note>,
}

/// Auto-detected content of a CIF data block.
#[derive(Debug)]
pub enum CifContent {
    Global(GlobalInfo),
    Cell(CellBlock),
    Unknown(Block),
}

/// Every typed record found in a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrystalRecord {
    pub global: Option<GlobalInfo>,
    pub cells: Vec<CellBlock>,
}

/// Errors from typed extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("missing category: {0}")]
    MissingCategory(String),
    #[error("missing required tag: {0}")]
    MissingTag(String),
    #[error("parse error in {tag} row {row}: {detail}")]
    ParseError {
        tag: String,
        row: usize,
        detail: String,
    },
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

impl UnitCell {
    /// Lattice vectors in Å, `a` along x and `b` in the xy plane.
    pub fn lattice_vectors(&self) -> [DVec3; 3] {
        let (alpha, beta, gamma) = (
            self.alpha.to_radians(),
            self.beta.to_radians(),
            self.gamma.to_radians(),
        );
        let va = DVec3::new(self.a, 0.0, 0.0);
        let vb = DVec3::new(self.b * gamma.cos(), self.b * gamma.sin(), 0.0);
        let cx = self.c * beta.cos();
        let cy = self.c * (alpha.cos() - beta.cos() * gamma.cos()) / gamma.sin();
        let cz = (self.c * self.c - cx * cx - cy * cy).max(0.0).sqrt();
        [va, vb, DVec3::new(cx, cy, cz)]
    }

    /// Why these parameters cannot describe a real cell, or `None` if they can.
    pub fn degeneracy(&self) -> Option<String> {
        for (name, length) in [("a", self.a), ("b", self.b), ("c", self.c)] {
            if !(length > 0.0 && length.is_finite()) {
                return Some(format!("cell length {name} = {length} is not positive"));
            }
        }
        for (name, angle) in [
            ("alpha", self.alpha),
            ("beta", self.beta),
            ("gamma", self.gamma),
        ] {
            if !(angle > 0.0 && angle < 180.0) {
                return Some(format!("cell angle {name} = {angle} is outside (0, 180)"));
            }
        }
        // Gram determinant over (abc)²
        let (ca, cb, cg) = (
            self.alpha.to_radians().cos(),
            self.beta.to_radians().cos(),
            self.gamma.to_radians().cos(),
        );
        let metric = 1.0 - ca * ca - cb * cb - cg * cg + 2.0 * ca * cb * cg;
        if !(metric > 0.0) {
            return Some(format!(
                "cell angles {}, {}, {} do not span three dimensions",
                self.alpha, self.beta, self.gamma
            ));
        }
        None
    }

    /// Cell volume in Å³, valid for any crystal system.
    pub fn volume(&self) -> f64 {
        let [a, b, c] = self.lattice_vectors();
        a.dot(b.cross(c)).abs()
    }

    pub fn axial_ratios(&self) -> AxialRatios {
        AxialRatios {
            ab: self.a / self.b,
            bc: self.b / self.c,
            ca: self.c / self.a,
        }
    }

    /// Convert fractional coordinates to Cartesian Å.
    pub fn to_cartesian(&self, frac: DVec3) -> DVec3 {
        let [a, b, c] = self.lattice_vectors();
        a * frac.x + b * frac.y + c * frac.z
    }
}

impl CellSetting {
    /// Classify a block by its name.
    pub fn from_block_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if lower.contains("niggli") {
            CellSetting::NiggliReduced
        } else if lower.contains("standard") {
            CellSetting::Standardized
        } else if lower.contains("publ") {
            CellSetting::Published
        } else {
            CellSetting::Other(name.to_string())
        }
    }
}

impl AtomSite {
    /// Fractional position, if all three coordinates are known.
    pub fn fract(&self) -> Option<DVec3> {
        Some(DVec3::new(self.x.value()?, self.y.value()?, self.z.value()?))
    }
}

impl CellBlock {
    /// Atom-site labels that are concrete (not `?` or `.`).
    pub fn site_labels(&self) -> impl Iterator<Item = &str> {
        self.sites.iter().filter_map(|s| s.label.as_deref())
    }

    pub fn site(&self, label: &str) -> Option<&AtomSite> {
        self.sites
            .iter()
            .find(|s| s.label.as_deref() == Some(label))
    }

    /// Cartesian positions of all sites with known coordinates.
    pub fn cartesian_sites(&self) -> Vec<(&AtomSite, DVec3)> {
        self.sites
            .iter()
            .filter_map(|s| Some((s, self.cell.to_cartesian(s.fract()?))))
            .collect()
    }
}

impl CrystalRecord {
    pub fn cell(&self, setting: &CellSetting) -> Option<&CellBlock> {
        self.cells.iter().find(|c| &c.setting == setting)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn column(lp: &Loop, names: &[&str]) -> Option<usize> {
    names.iter().find_map(|n| lp.column_index(n))
}

fn datum_text(v: &Value) -> Datum<String> {
    match v {
        Value::Str(s) => Datum::Known(s.clone()),
        Value::Unknown => Datum::Unknown,
        Value::Inapplicable => Datum::Inapplicable,
    }
}

fn datum_measured(v: &Value, tag: &str, row: usize) -> Result<Datum<Measured>, ExtractionError> {
    match v {
        Value::Str(s) => Measured::parse(s)
            .map(Datum::Known)
            .ok_or_else(|| ExtractionError::ParseError {
                tag: tag.into(),
                row,
                detail: format!("expected number, got {s:?}"),
            }),
        Value::Unknown => Ok(Datum::Unknown),
        Value::Inapplicable => Ok(Datum::Inapplicable),
    }
}

fn datum_u32(v: &Value, tag: &str, row: usize) -> Result<Datum<u32>, ExtractionError> {
    datum_parsed(v, tag, row, "non-negative integer")
}

fn datum_i32(v: &Value, tag: &str, row: usize) -> Result<Datum<i32>, ExtractionError> {
    datum_parsed(v, tag, row, "integer")
}

fn datum_parsed<T: std::str::FromStr>(
    v: &Value,
    tag: &str,
    row: usize,
    expected: &str,
) -> Result<Datum<T>, ExtractionError> {
    match v {
        Value::Str(s) => s
            .parse()
            .map(Datum::Known)
            .map_err(|_| ExtractionError::ParseError {
                tag: tag.into(),
                row,
                detail: format!("expected {expected}, got {s:?}"),
            }),
        Value::Unknown => Ok(Datum::Unknown),
        Value::Inapplicable => Ok(Datum::Inapplicable),
    }
}

fn scalar_text(block: &Block, tags: &[&str]) -> Option<Datum<String>> {
    block.get_any(tags).map(datum_text)
}

fn scalar_measured(
    block: &Block,
    tags: &[&str],
) -> Result<Option<Datum<Measured>>, ExtractionError> {
    block
        .get_any(tags)
        .map(|v| datum_measured(v, tags[0], 0))
        .transpose()
}

fn scalar_u32(block: &Block, tags: &[&str]) -> Result<Option<Datum<u32>>, ExtractionError> {
    block
        .get_any(tags)
        .map(|v| datum_u32(v, tags[0], 0))
        .transpose()
}

fn scalar_i32(block: &Block, tags: &[&str]) -> Result<Option<Datum<i32>>, ExtractionError> {
    block
        .get_any(tags)
        .map(|v| datum_i32(v, tags[0], 0))
        .transpose()
}

fn require_measured(block: &Block, tags: &[&str]) -> Result<Measured, ExtractionError> {
    let v = block
        .get_any(tags)
        .ok_or_else(|| ExtractionError::MissingTag(tags[0].into()))?;
    match datum_measured(v, tags[0], 0)? {
        Datum::Known(m) => Ok(m),
        _ => Err(ExtractionError::ParseError {
            tag: tags[0].into(),
            row: 0,
            detail: "cell parameter must be a number".into(),
        }),
    }
}

fn cell_parameters(block: &Block) -> Result<[Measured; 6], ExtractionError> {
    Ok([
        require_measured(block, CELL_A)?,
        require_measured(block, CELL_B)?,
        require_measured(block, CELL_C)?,
        require_measured(block, CELL_ALPHA)?,
        require_measured(block, CELL_BETA)?,
        require_measured(block, CELL_GAMMA)?,
    ])
}

/// Per-row accessor for optional columns of one loop.
struct Row<'a> {
    lp: &'a Loop,
    values: &'a [Value],
    index: usize,
}

impl<'a> Row<'a> {
    fn get(&self, names: &[&str]) -> Option<(&'a Value, &'a str)> {
        let col = column(self.lp, names)?;
        Some((&self.values[col], self.lp.tags[col].as_str()))
    }

    fn text(&self, names: &[&str]) -> Option<Datum<String>> {
        self.get(names).map(|(v, _)| datum_text(v))
    }

    fn measured(&self, names: &[&str]) -> Result<Option<Datum<Measured>>, ExtractionError> {
        self.get(names)
            .map(|(v, tag)| datum_measured(v, tag, self.index))
            .transpose()
    }

    fn require_measured(&self, names: &[&str]) -> Result<Datum<Measured>, ExtractionError> {
        self.measured(names)?
            .ok_or_else(|| ExtractionError::MissingTag(names[0].into()))
    }

    fn count(&self, names: &[&str]) -> Result<Option<Datum<u32>>, ExtractionError> {
        self.get(names)
            .map(|(v, tag)| datum_u32(v, tag, self.index))
            .transpose()
    }

    fn integer(&self, names: &[&str]) -> Result<Option<Datum<i32>>, ExtractionError> {
        self.get(names)
            .map(|(v, tag)| datum_i32(v, tag, self.index))
            .transpose()
    }
}

fn rows(lp: &Loop) -> impl Iterator<Item = Row<'_>> {
    lp.rows()
        .enumerate()
        .map(move |(index, values)| Row { lp, values, index })
}

// ---------------------------------------------------------------------------
// Table extraction
// ---------------------------------------------------------------------------

/// Rows of the atom-site table (the loop holding labels and fractional x).
pub fn atom_sites(block: &Block) -> Result<Vec<AtomSite>, ExtractionError> {
    let lp = block
        .loops
        .iter()
        .find(|lp| column(lp, SITE_LABEL).is_some() && column(lp, SITE_X).is_some())
        .ok_or_else(|| ExtractionError::MissingCategory("_atom_site".into()))?;

    rows(lp)
        .map(|row| {
            Ok(AtomSite {
                label: row
                    .text(SITE_LABEL)
                    .ok_or_else(|| ExtractionError::MissingTag(SITE_LABEL[0].into()))?,
                type_symbol: row.text(SITE_TYPE),
                wyckoff: row.text(SITE_WYCKOFF),
                site_symmetry: row.text(SITE_SYMMETRY),
                x: row.require_measured(SITE_X)?,
                y: row.require_measured(SITE_Y)?,
                z: row.require_measured(SITE_Z)?,
                occupancy: row.measured(SITE_OCCUPANCY)?,
                coordination: row.count(SITE_COORDINATION)?,
                environment: row.text(SITE_ENVIRONMENT),
            })
        })
        .collect()
}

/// Rows of the isotropic displacement table (U_eq and/or B_eq per label).
pub fn isotropic_displacements(
    block: &Block,
) -> Result<Vec<IsotropicDisplacement>, ExtractionError> {
    let lp = block
        .loops
        .iter()
        .find(|lp| {
            column(lp, ISO_LABEL).is_some()
                && (column(lp, ISO_U).is_some() || column(lp, ISO_B).is_some())
        })
        .ok_or_else(|| ExtractionError::MissingCategory("isotropic displacement".into()))?;

    rows(lp)
        .map(|row| {
            Ok(IsotropicDisplacement {
                label: row
                    .text(ISO_LABEL)
                    .ok_or_else(|| ExtractionError::MissingTag(ISO_LABEL[0].into()))?,
                u_eq: row.measured(ISO_U)?,
                b_eq: row.measured(ISO_B)?,
            })
        })
        .collect()
}

/// Rows of the anisotropic displacement table.
pub fn anisotropic_displacements(
    block: &Block,
) -> Result<Vec<AnisotropicDisplacement>, ExtractionError> {
    let lp = block
        .loops
        .iter()
        .find(|lp| column(lp, ANISO_LABEL).is_some())
        .ok_or_else(|| ExtractionError::MissingCategory("_atom_site_aniso".into()))?;

    rows(lp)
        .map(|row| {
            Ok(AnisotropicDisplacement {
                label: row
                    .text(ANISO_LABEL)
                    .ok_or_else(|| ExtractionError::MissingTag(ANISO_LABEL[0].into()))?,
                u11: row.require_measured(ANISO_U11)?,
                u22: row.require_measured(ANISO_U22)?,
                u33: row.require_measured(ANISO_U33)?,
                u12: row.require_measured(ANISO_U12)?,
                u13: row.require_measured(ANISO_U13)?,
                u23: row.require_measured(ANISO_U23)?,
            })
        })
        .collect()
}

/// Treats an absent table as empty; other failures propagate.
fn optional_table<T>(
    result: Result<Vec<T>, ExtractionError>,
) -> Result<Vec<T>, ExtractionError> {
    match result {
        Err(ExtractionError::MissingCategory(_)) => Ok(Vec::new()),
        other => other,
    }
}

fn atom_types(block: &Block) -> Vec<Datum<String>> {
    ATOM_TYPE
        .iter()
        .find_map(|t| block.column(t))
        .map(|col| col.map(datum_text).collect())
        .unwrap_or_default()
}

fn stated_ratios(block: &Block) -> Result<Option<StatedRatios>, ExtractionError> {
    let ab = scalar_measured(block, RATIO_AB)?;
    let bc = scalar_measured(block, RATIO_BC)?;
    let ca = scalar_measured(block, RATIO_CA)?;
    Ok(match (ab, bc, ca) {
        (Some(ab), Some(bc), Some(ca)) => Some(StatedRatios { ab, bc, ca }),
        _ => None,
    })
}

fn dictionaries(block: &Block) -> Vec<DictionaryRef> {
    if let Some(lp) = block.loops.iter().find(|lp| column(lp, DICT_NAME).is_some()) {
        return rows(lp)
            .filter_map(|row| {
                Some(DictionaryRef {
                    name: row.text(DICT_NAME)?,
                    version: row.text(DICT_VERSION),
                    location: row.text(DICT_LOCATION),
                })
            })
            .collect();
    }
    scalar_text(block, DICT_NAME)
        .map(|name| DictionaryRef {
            name,
            version: scalar_text(block, DICT_VERSION),
            location: scalar_text(block, DICT_LOCATION),
        })
        .into_iter()
        .collect()
}

fn references(block: &Block) -> Result<Vec<Reference>, ExtractionError> {
    let authors_for = |id: &str| -> Vec<Datum<String>> {
        block
            .columns(&["_citation_author_citation_id", "_citation_author_name"])
            .map(|cols| {
                cols.iter()
                    .filter(|row| row[0].as_str() == Some(id))
                    .map(|row| datum_text(row[1]))
                    .collect()
            })
            .unwrap_or_default()
    };

    if let Some(lp) = block.find_loop("_citation_id") {
        return rows(lp)
            .map(|row| -> Result<Reference, ExtractionError> {
                let id = row.text(&["_citation_id"]);
                Ok(Reference {
                    authors: id
                        .as_ref()
                        .and_then(|d| d.as_deref())
                        .map(&authors_for)
                        .unwrap_or_default(),
                    title: row.text(&["_citation_title"]),
                    journal: row.text(&["_citation_journal_full", "_citation_journal_abbrev"]),
                    volume: row.text(&["_citation_journal_volume"]),
                    year: row.integer(&["_citation_year"])?,
                    page_first: row.text(&["_citation_page_first"]),
                    page_last: row.text(&["_citation_page_last"]),
                    id,
                })
            })
            .collect();
    }

    // Single-reference layout of the core `_journal_*` / `_publ_*` tags
    let journal = scalar_text(block, &["_journal_name_full", "_journal_coden_ASTM"]);
    let title = scalar_text(block, &["_publ_section_title"]);
    if journal.is_none() && title.is_none() {
        return Ok(Vec::new());
    }
    Ok(vec![Reference {
        id: None,
        authors: block
            .column("_publ_author_name")
            .map(|col| col.map(datum_text).collect())
            .unwrap_or_default(),
        title,
        journal,
        volume: scalar_text(block, &["_journal_volume"]),
        year: scalar_i32(block, &["_journal_year"])?,
        page_first: scalar_text(block, &["_journal_page_first"]),
        page_last: scalar_text(block, &["_journal_page_last"]),
    }])
}

fn tagged_notes(block: &Block, keep: impl Fn(&str) -> bool) -> Vec<Note> {
    block
        .pairs
        .iter()
        .filter(|(tag, _)| keep(&tag.to_ascii_lowercase()))
        .map(|(tag, v)| Note {
            tag: tag.clone(),
            text: datum_text(v),
        })
        .collect()
}

fn is_global_block(block: &Block) -> bool {
    block.name.to_ascii_lowercase().contains("global")
        || [
            CREATION_METHOD,
            DICT_NAME,
            PEARSON,
            MINERAL,
            PHASE_LABEL,
            FORMULA_SUM,
        ]
        .iter()
        .any(|tags| tags.iter().any(|t| block.contains_tag(t)))
}

// ---------------------------------------------------------------------------
// TryFrom impls
// ---------------------------------------------------------------------------

impl From<&[Measured; 6]> for UnitCell {
    fn from(parameters: &[Measured; 6]) -> Self {
        let [a, b, c, alpha, beta, gamma] = parameters.map(|m| m.value);
        UnitCell {
            a,
            b,
            c,
            alpha,
            beta,
            gamma,
        }
    }
}

impl TryFrom<&Block> for UnitCell {
    type Error = ExtractionError;

    fn try_from(block: &Block) -> Result<Self, Self::Error> {
        Ok(UnitCell::from(&cell_parameters(block)?))
    }
}

impl TryFrom<&Block> for CellBlock {
    type Error = ExtractionError;

    fn try_from(block: &Block) -> Result<Self, Self::Error> {
        let parameters = cell_parameters(block)?;
        let cell = UnitCell::from(&parameters);

        Ok(CellBlock {
            name: block.name.clone(),
            setting: CellSetting::from_block_name(&block.name),
            cell,
            parameters,
            stated_ratios: stated_ratios(block)?,
            stated_volume: scalar_measured(block, CELL_VOLUME)?,
            space_group: scalar_text(block, SG_SYMBOL),
            space_group_number: scalar_u32(block, SG_NUMBER)?,
            formula_units: scalar_u32(block, CELL_Z)?,
            transformation: scalar_text(block, TRANSFORMATION),
            atom_types: atom_types(block),
            sites: optional_table(atom_sites(block))?,
            isotropic: optional_table(isotropic_displacements(block))?,
            anisotropic: optional_table(anisotropic_displacements(block))?,
        })
    }
}

impl TryFrom<&Block> for GlobalInfo {
    type Error = ExtractionError;

    fn try_from(block: &Block) -> Result<Self, Self::Error> {
        if !is_global_block(block) {
            return Err(ExtractionError::MissingCategory(
                "global metadata (_audit, _chemical, _sm phase tags)".into(),
            ));
        }

        let phase = PhaseInfo {
            label: scalar_text(block, PHASE_LABEL),
            mineral: scalar_text(block, MINERAL),
            compound_class: scalar_text(block, COMPOUND_CLASS),
            prototype: scalar_text(block, PROTOTYPE),
            pearson_symbol: scalar_text(block, PEARSON),
            space_group_number: scalar_u32(block, PHASE_SG_NUMBER)?,
            formula_sum: scalar_text(block, FORMULA_SUM),
            formula_structural: scalar_text(block, FORMULA_STRUCTURAL),
            formula_weight: scalar_measured(block, FORMULA_WEIGHT)?,
        };

        Ok(GlobalInfo {
            name: block.name.clone(),
            dictionaries: dictionaries(block),
            creation_date: scalar_text(block, CREATION_DATE),
            creation_method: scalar_text(block, CREATION_METHOD),
            credits: tagged_notes(block, |tag| {
                CREDIT_PREFIXES.iter().any(|p| tag.starts_with(p))
            }),
            references: references(block)?,
            phase,
            notes: tagged_notes(block, |tag| NOTE_SUFFIXES.iter().any(|s| tag.ends_with(s))),
        })
    }
}

impl From<Block> for CifContent {
    fn from(block: Block) -> Self {
        if UnitCell::try_from(&block).is_ok() {
            if let Ok(cell) = CellBlock::try_from(&block) {
                return CifContent::Cell(cell);
            }
        } else if let Ok(global) = GlobalInfo::try_from(&block) {
            return CifContent::Global(global);
        }
        CifContent::Unknown(block)
    }
}

impl TryFrom<&Document> for CrystalRecord {
    type Error = ExtractionError;

    fn try_from(doc: &Document) -> Result<Self, Self::Error> {
        let mut global = None;
        let mut cells = Vec::new();
        for block in &doc.blocks {
            if UnitCell::try_from(block).is_ok() {
                cells.push(CellBlock::try_from(block)?);
            } else if global.is_none() && is_global_block(block) {
                global = Some(GlobalInfo::try_from(block)?);
            } else {
                log::debug!("block `{}` holds no cell or global metadata", block.name);
            }
        }
        if global.is_none() && cells.is_empty() {
            return Err(ExtractionError::MissingCategory(
                "no global or cell block in document".into(),
            ));
        }
        Ok(CrystalRecord { global, cells })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cif::parse::parse;

    const CELL_SNIPPET: &str = r#"data_published_cell
_cell_length_a                     7.1183(1)
_cell_length_b                     7.1183(1)
_cell_length_c                     6.2893(1)
_cell_angle_alpha                  90
_cell_angle_beta                   90
_cell_angle_gamma                  90
_sm_length_ratio_ab                1.000
_sm_length_ratio_bc                1.132
_sm_length_ratio_ca                0.884
_cell_volume                       318.7
_symmetry_space_group_name_H-M     I41/amd
_symmetry_Int_Tables_number        141
_cell_formula_units_Z              4
_sm_cell_transformation
;
No transformation from published to standardized cell parameters necessary.
;

loop_
 _atom_site_label
 _atom_site_type_symbol
 _sm_site_symmetry
 _atom_site_Wyckoff_symbol
 _atom_site_fract_x
 _atom_site_fract_y
 _atom_site_fract_z
 _atom_site_occupancy
 _sm_coordination_number
 _sm_atomic_environment_type
 O1 O .m. 16h 0 0.4342(2) 0.2018(2) 1 3 'non-coplanar triangle'
 V1 V -4m2 4b 0 0.25 0.375 1 4 tetrahedron
 Y1 Y -4m2 4a 0 0.75 0.125 1 8 'snub disphenoid'

loop_
 _atom_site_iso_label
 _atom_site_iso_U_equiv
 _atom_site_iso_B_equiv
 O1 0.0079 0.62
 V1 0.0034 ?
 Y1 0.0043 0.34

loop_
 _atom_site_aniso_label
 _atom_site_aniso_U_11
 _atom_site_aniso_U_22
 _atom_site_aniso_U_33
 _atom_site_aniso_U_12
 _atom_site_aniso_U_13
 _atom_site_aniso_U_23
 V1 0.0036(1) 0.0036(1) 0.0030(2) 0 0 0
"#;

    fn cell_block() -> CellBlock {
        let doc = parse(CELL_SNIPPET).unwrap();
        CellBlock::try_from(&doc.blocks[0]).unwrap()
    }

    #[test]
    fn cell_parameters_keep_uncertainty() {
        let cell = cell_block();
        assert_eq!(cell.setting, CellSetting::Published);
        assert!((cell.cell.a - 7.1183).abs() < 1e-9);
        assert_eq!(cell.parameters[0].su_digits, Some(1));
        assert_eq!(cell.parameters[3].su_digits, None);
        assert_eq!(cell.space_group.as_ref().and_then(|d| d.as_deref()), Some("I41/amd"));
        assert_eq!(cell.space_group_number, Some(Datum::Known(141)));
        assert_eq!(cell.formula_units, Some(Datum::Known(4)));
        assert!(cell
            .transformation
            .as_ref()
            .and_then(|d| d.as_deref())
            .unwrap()
            .contains("No transformation"));
    }

    #[test]
    fn tetragonal_volume_and_ratios() {
        let cell = cell_block();
        let expected = 7.1183f64.powi(2) * 6.2893;
        assert!((cell.cell.volume() - expected).abs() < 1e-6);
        let ratios = cell.cell.axial_ratios();
        assert!((ratios.ab - 1.0).abs() < 1e-12);
        assert!((ratios.bc - 1.1318).abs() < 1e-4);
        assert!((ratios.ca - 0.8835).abs() < 1e-4);
        let stated = cell.stated_ratios.unwrap();
        assert_eq!(stated.bc.value(), Some(1.132));
    }

    #[test]
    fn atom_site_rows() {
        let cell = cell_block();
        assert_eq!(cell.sites.len(), 3);
        let o1 = cell.site("O1").unwrap();
        assert_eq!(o1.type_symbol.as_ref().and_then(|d| d.as_deref()), Some("O"));
        assert_eq!(o1.wyckoff.as_ref().and_then(|d| d.as_deref()), Some("16h"));
        assert_eq!(o1.site_symmetry.as_ref().and_then(|d| d.as_deref()), Some(".m."));
        assert_eq!(o1.y.value(), Some(0.4342));
        assert_eq!(o1.y.known().unwrap().su_digits, Some(2));
        assert_eq!(o1.coordination, Some(Datum::Known(3)));
        assert_eq!(
            o1.environment.as_ref().and_then(|d| d.as_deref()),
            Some("non-coplanar triangle")
        );
        assert_eq!(cell.site_labels().collect::<Vec<_>>(), vec!["O1", "V1", "Y1"]);
    }

    #[test]
    fn isotropic_table_keeps_unknown() {
        let cell = cell_block();
        assert_eq!(cell.isotropic.len(), 3);
        assert_eq!(cell.isotropic[1].label.as_deref(), Some("V1"));
        assert_eq!(cell.isotropic[1].b_eq, Some(Datum::Unknown));
        assert_eq!(cell.isotropic[0].u_eq.as_ref().and_then(|d| d.value()), Some(0.0079));
    }

    #[test]
    fn anisotropic_table_is_sparse() {
        let cell = cell_block();
        assert_eq!(cell.anisotropic.len(), 1);
        let v1 = &cell.anisotropic[0];
        assert_eq!(v1.label.as_deref(), Some("V1"));
        assert_eq!(v1.u33.known().unwrap().su_digits, Some(2));
        assert_eq!(v1.u12.value(), Some(0.0));
    }

    #[test]
    fn cartesian_positions() {
        let cell = cell_block();
        let carts = cell.cartesian_sites();
        assert_eq!(carts.len(), 3);
        let (site, pos) = carts[1];
        assert_eq!(site.label.as_deref(), Some("V1"));
        assert!((pos.x - 0.0).abs() < 1e-9);
        assert!((pos.y - 0.25 * 7.1183).abs() < 1e-9);
        assert!((pos.z - 0.375 * 6.2893).abs() < 1e-9);
    }

    #[test]
    fn unknown_row_placeholders() {
        let input = "data_niggli_reduced_cell\n_cell_length_a 5.935\n_cell_length_b 5.935\n_cell_length_c 5.935\n_cell_angle_alpha 106.304\n_cell_angle_beta 106.304\n_cell_angle_gamma 116.009\nloop_\n_atom_site_iso_label\n_atom_site_iso_U_equiv\n? ?\n";
        let doc = parse(input).unwrap();
        let cell = CellBlock::try_from(&doc.blocks[0]).unwrap();
        assert_eq!(cell.setting, CellSetting::NiggliReduced);
        assert!(cell.sites.is_empty());
        assert_eq!(cell.isotropic.len(), 1);
        assert!(cell.isotropic[0].label.is_unknown());
        assert_eq!(cell.isotropic[0].u_eq, Some(Datum::Unknown));
        assert!(cell.isotropic[0].b_eq.is_none());
    }

    #[test]
    fn cell_requires_all_parameters() {
        let doc = parse("data_x\n_cell_length_a 5\n_cell_length_b 5\n").unwrap();
        let err = UnitCell::try_from(&doc.blocks[0]).unwrap_err();
        assert!(matches!(err, ExtractionError::MissingTag(ref t) if t == "_cell_length_c"));
    }

    #[test]
    fn unknown_cell_parameter_is_an_error() {
        let doc = parse(
            "data_x\n_cell_length_a ?\n_cell_length_b 5\n_cell_length_c 5\n_cell_angle_alpha 90\n_cell_angle_beta 90\n_cell_angle_gamma 90\n",
        )
        .unwrap();
        let err = UnitCell::try_from(&doc.blocks[0]).unwrap_err();
        assert!(matches!(err, ExtractionError::ParseError { .. }));
    }

    #[test]
    fn bad_coordinate_reports_row() {
        let input = "data_x\n_cell_length_a 5\n_cell_length_b 5\n_cell_length_c 5\n_cell_angle_alpha 90\n_cell_angle_beta 90\n_cell_angle_gamma 90\nloop_\n_atom_site_label\n_atom_site_fract_x\n_atom_site_fract_y\n_atom_site_fract_z\nA 0 0 0\nB 0.5 half 0\n";
        let doc = parse(input).unwrap();
        let err = CellBlock::try_from(&doc.blocks[0]).unwrap_err();
        match err {
            ExtractionError::ParseError { tag, row, .. } => {
                assert_eq!(tag, "_atom_site_fract_y");
                assert_eq!(row, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn dotted_tags_are_accepted() {
        let input = "data_x\n_cell.length_a 10\n_cell.length_b 11\n_cell.length_c 12\n_cell.angle_alpha 90\n_cell.angle_beta 90\n_cell.angle_gamma 90\n_space_group.name_H-M_alt 'P 1'\n";
        let doc = parse(input).unwrap();
        let cell = CellBlock::try_from(&doc.blocks[0]).unwrap();
        assert!((cell.cell.volume() - 1320.0).abs() < 1e-6);
        assert_eq!(cell.space_group.as_ref().and_then(|d| d.as_deref()), Some("P 1"));
        assert_eq!(cell.setting, CellSetting::Other("x".into()));
    }

    #[test]
    fn triclinic_volume() {
        let cell = UnitCell {
            a: 5.935,
            b: 5.935,
            c: 5.935,
            alpha: 106.304,
            beta: 106.304,
            gamma: 116.009,
        };
        // Half the body-centred tetragonal cell it was reduced from
        assert!((cell.volume() - 159.34).abs() < 0.05);
    }

    #[test]
    fn global_block_metadata() {
        let input = r#"data_sm_global
_audit_creation_date               2016-05-24
_audit_creation_method
;
Pauling file data release
;
loop_
 _audit_conform_dict_name
 _audit_conform_dict_version
 cif_core.dic 2.4.2
 cif_pd.dic 1.0.1
_sm_credits_copyright              'Material Phases Data System (MPDS)'
_sm_phase_label                    'YVO4 ht'
_chemical_name_mineral             wakefieldite-(Y)
_sm_compound_class                 'oxide, vanadate'
_sm_structure_prototype            Zr[SiO4],tI24,141
_sm_pearson_symbol                 tI24
_sm_space_group_number             141
_chemical_formula_sum              'O4 V Y'
_sm_sample_details                 ?
_sm_interpretation_details         'powder, <i>Rietveld</i>'
_journal_name_full                 'Acta Crystallogr. C'
_journal_volume                    43
_journal_year                      1987
_journal_page_first                2044
loop_
 _publ_author_name
 'Baran E.J.'
 'Chopra S.'
"#;
        let doc = parse(input).unwrap();
        let content = CifContent::from(doc.blocks[0].clone());
        let global = match content {
            CifContent::Global(g) => g,
            other => panic!("expected global block, got {other:?}"),
        };
        assert_eq!(global.dictionaries.len(), 2);
        assert_eq!(global.dictionaries[1].name.as_deref(), Some("cif_pd.dic"));
        assert_eq!(
            global.creation_method.as_ref().and_then(|d| d.as_deref()),
            Some("\nPauling file data release")
        );
        assert_eq!(global.credits.len(), 1);
        assert_eq!(global.phase.pearson_symbol.as_ref().and_then(|d| d.as_deref()), Some("tI24"));
        assert_eq!(global.phase.space_group_number, Some(Datum::Known(141)));
        assert_eq!(
            global.phase.prototype.as_ref().and_then(|d| d.as_deref()),
            Some("Zr[SiO4],tI24,141")
        );
        assert_eq!(global.notes.len(), 2);
        assert_eq!(global.notes[0].text, Datum::Unknown);
        assert_eq!(global.notes[1].text.as_deref(), Some("powder, <i>Rietveld</i>"));

        assert_eq!(global.references.len(), 1);
        let reference = &global.references[0];
        assert_eq!(
            reference.authors,
            vec![
                Datum::Known("Baran E.J.".to_string()),
                Datum::Known("Chopra S.".to_string())
            ]
        );
        assert_eq!(reference.year, Some(Datum::Known(1987)));
        assert_eq!(reference.volume.as_ref().and_then(|d| d.as_deref()), Some("43"));
    }

    #[test]
    fn citation_loop_references() {
        let input = "data_sm_global\nloop_\n_citation_id\n_citation_journal_abbrev\n_citation_year\n_citation_title\nprimary 'Z. Kristallogr.' 1990 'Yttrium vanadate'\n2 ? ? ?\nloop_\n_citation_author_citation_id\n_citation_author_name\nprimary 'Author A.'\nprimary 'Author B.'\n";
        let doc = parse(input).unwrap();
        let global = GlobalInfo::try_from(&doc.blocks[0]).unwrap();
        assert_eq!(global.references.len(), 2);
        assert_eq!(global.references[0].authors.len(), 2);
        assert_eq!(global.references[0].year, Some(Datum::Known(1990)));
        let second = &global.references[1];
        assert_eq!(second.id.as_ref().and_then(|d| d.as_deref()), Some("2"));
        assert_eq!(second.title, Some(Datum::Unknown));
        assert_eq!(second.journal, Some(Datum::Unknown));
        assert_eq!(second.year, Some(Datum::Unknown));
        assert!(second.volume.is_none());
        assert!(second.authors.is_empty());
    }

    #[test]
    fn unknown_author_name_is_kept() {
        let input = "data_sm_global\n_journal_name_full 'Acta Cryst.'\nloop_\n_publ_author_name\n'Author A.'\n?\n";
        let doc = parse(input).unwrap();
        let global = GlobalInfo::try_from(&doc.blocks[0]).unwrap();
        assert_eq!(
            global.references[0].authors,
            vec![Datum::Known("Author A.".to_string()), Datum::Unknown]
        );
    }

    #[test]
    fn non_numeric_year_is_an_error() {
        let input = "data_sm_global\nloop_\n_citation_id\n_citation_year\n1 1990\n2 'in press'\n";
        let doc = parse(input).unwrap();
        match GlobalInfo::try_from(&doc.blocks[0]) {
            Err(ExtractionError::ParseError { tag, row, .. }) => {
                assert_eq!(tag, "_citation_year");
                assert_eq!(row, 1);
            }
            other => panic!("expected parse error, got {other:?}"),
        }

        let doc = parse("data_sm_global\n_journal_name_full X\n_journal_year 19x7\n").unwrap();
        assert!(matches!(
            GlobalInfo::try_from(&doc.blocks[0]),
            Err(ExtractionError::ParseError { .. })
        ));
    }

    #[test]
    fn autodetect_unknown() {
        let doc = parse("data_mystery\n_some_tag value\n").unwrap();
        let content = CifContent::from(doc.blocks.into_iter().next().unwrap());
        assert!(matches!(content, CifContent::Unknown(_)));
    }

    #[test]
    fn record_requires_some_content() {
        let doc = parse("data_mystery\n_some_tag value\n").unwrap();
        let err = CrystalRecord::try_from(&doc).unwrap_err();
        assert!(matches!(err, ExtractionError::MissingCategory(_)));
    }
}

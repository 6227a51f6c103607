//! Format-level consistency checks over a parsed document.
//!
//! None of these checks compute crystallography. They compare what a file
//! states (axial ratios, cell volume, table contents) with what its own
//! cell parameters and tables imply.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::dom::{Document, Measured};
use super::extract::{CellBlock, Datum, UnitCell};

/// Tolerances for the numeric checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationOptions {
    /// Absolute tolerance for axial ratios. `None` allows one unit in the
    /// last decimal place the file states.
    pub ratio_tolerance: Option<f64>,
    /// Relative tolerance between the stated and computed cell volume.
    pub volume_tolerance: f64,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            ratio_tolerance: None,
            volume_tolerance: 0.005,
        }
    }
}

/// A single failed check.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Issue {
    DuplicateBlock {
        name: String,
    },
    /// A cell block whose tables could not be read.
    Extraction {
        block: String,
        message: String,
    },
    /// Cell parameters that cannot describe a real lattice.
    DegenerateCell {
        block: String,
        detail: String,
    },
    /// A displacement-table label with no atom-site row.
    OrphanLabel {
        block: String,
        table: String,
        label: String,
    },
    RowCountMismatch {
        block: String,
        sites: usize,
        isotropic: usize,
    },
    AxialRatio {
        block: String,
        ratio: String,
        stated: f64,
        computed: f64,
    },
    Volume {
        block: String,
        stated: f64,
        computed: f64,
    },
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::DuplicateBlock { name } => write!(f, "data block `{name}` appears more than once"),
            Issue::Extraction { block, message } => write!(f, "{block}: {message}"),
            Issue::DegenerateCell { block, detail } => write!(f, "{block}: {detail}"),
            Issue::OrphanLabel {
                block,
                table,
                label,
            } => write!(f, "{block}: {table} label `{label}` has no atom site"),
            Issue::RowCountMismatch {
                block,
                sites,
                isotropic,
            } => write!(
                f,
                "{block}: {sites} atom sites but {isotropic} isotropic displacement rows"
            ),
            Issue::AxialRatio {
                block,
                ratio,
                stated,
                computed,
            } => write!(
                f,
                "{block}: stated ratio {ratio} = {stated} but cell gives {computed:.4}"
            ),
            Issue::Volume {
                block,
                stated,
                computed,
            } => write!(
                f,
                "{block}: stated volume {stated} but cell gives {computed:.2}"
            ),
        }
    }
}

/// Outcome of [`validate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub blocks_checked: usize,
    pub cell_blocks: usize,
    pub issues: Vec<Issue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CIF Consistency Report\n{}", "=".repeat(50))?;
        writeln!(f, "Data blocks: {}", self.blocks_checked)?;
        writeln!(f, "Cell blocks: {}", self.cell_blocks)?;
        writeln!(f, "Consistent: {}", if self.is_valid() { "YES" } else { "NO" })?;
        if !self.issues.is_empty() {
            writeln!(f, "\nIssues:")?;
            for issue in &self.issues {
                writeln!(f, "  {issue}")?;
            }
        }
        Ok(())
    }
}

/// Run every check over a document.
pub fn validate(doc: &Document, options: &ValidationOptions) -> ValidationReport {
    let mut report = ValidationReport {
        blocks_checked: doc.blocks.len(),
        ..ValidationReport::default()
    };

    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for name in doc.block_names() {
        let key = name.to_ascii_lowercase();
        if !seen.insert(key.clone()) && reported.insert(key) {
            report.issues.push(Issue::DuplicateBlock {
                name: name.to_string(),
            });
        }
    }

    for block in &doc.blocks {
        if UnitCell::try_from(block).is_err() {
            continue;
        }
        report.cell_blocks += 1;
        match CellBlock::try_from(block) {
            Ok(cell) => report.issues.extend(check_cell(&cell, options)),
            Err(e) => report.issues.push(Issue::Extraction {
                block: block.name.clone(),
                message: e.to_string(),
            }),
        }
    }

    log::debug!(
        "checked {} block(s), {} issue(s)",
        report.blocks_checked,
        report.issues.len()
    );
    report
}

/// Checks that apply to a single cell block.
pub fn check_cell(cell: &CellBlock, options: &ValidationOptions) -> Vec<Issue> {
    let mut issues = check_labels(cell);
    issues.extend(check_row_counts(cell));
    if let Some(detail) = cell.cell.degeneracy() {
        // Ratios and volume mean nothing without a real lattice
        issues.push(Issue::DegenerateCell {
            block: cell.name.clone(),
            detail,
        });
        return issues;
    }
    issues.extend(check_ratios(cell, options));
    issues.extend(check_volume(cell, options));
    issues
}

/// Concrete displacement labels must name an atom site. `?` rows are
/// placeholders and are skipped.
fn check_labels(cell: &CellBlock) -> Vec<Issue> {
    let sites: HashSet<&str> = cell.site_labels().collect();
    let iso = cell
        .isotropic
        .iter()
        .filter_map(|row| row.label.as_deref())
        .map(|label| ("isotropic displacement", label));
    let aniso = cell
        .anisotropic
        .iter()
        .filter_map(|row| row.label.as_deref())
        .map(|label| ("anisotropic displacement", label));

    iso.chain(aniso)
        .filter(|(_, label)| !sites.contains(label))
        .map(|(table, label)| Issue::OrphanLabel {
            block: cell.name.clone(),
            table: table.to_string(),
            label: label.to_string(),
        })
        .collect()
}

fn check_row_counts(cell: &CellBlock) -> Option<Issue> {
    let concrete = !cell.isotropic.is_empty()
        && cell.isotropic.iter().all(|row| row.label.is_known());
    if concrete && cell.sites.len() != cell.isotropic.len() {
        return Some(Issue::RowCountMismatch {
            block: cell.name.clone(),
            sites: cell.sites.len(),
            isotropic: cell.isotropic.len(),
        });
    }
    None
}

fn check_ratios(cell: &CellBlock, options: &ValidationOptions) -> Vec<Issue> {
    let Some(stated) = &cell.stated_ratios else {
        return Vec::new();
    };
    let computed = cell.cell.axial_ratios();

    [
        ("a/b", &stated.ab, computed.ab),
        ("b/c", &stated.bc, computed.bc),
        ("c/a", &stated.ca, computed.ca),
    ]
    .into_iter()
    .filter_map(|(ratio, stated, computed)| {
        let Datum::Known(m) = stated else {
            return None;
        };
        let tolerance = options.ratio_tolerance.unwrap_or_else(|| m.resolution());
        exceeds(m, computed, tolerance).then(|| Issue::AxialRatio {
            block: cell.name.clone(),
            ratio: ratio.to_string(),
            stated: m.value,
            computed,
        })
    })
    .collect()
}

fn check_volume(cell: &CellBlock, options: &ValidationOptions) -> Option<Issue> {
    let Some(Datum::Known(stated)) = &cell.stated_volume else {
        return None;
    };
    let computed = cell.cell.volume();
    let tolerance = (stated.value.abs() * options.volume_tolerance).max(stated.resolution());
    exceeds(stated, computed, tolerance).then(|| Issue::Volume {
        block: cell.name.clone(),
        stated: stated.value,
        computed,
    })
}

fn exceeds(stated: &Measured, computed: f64, tolerance: f64) -> bool {
    // Slack for binary rounding of values sitting exactly on the boundary.
    // Written so that a NaN difference counts as a mismatch.
    !((computed - stated.value).abs() <= tolerance + 1e-9)
}

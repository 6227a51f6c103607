//! Subcommand definitions and implementations.

use std::error::Error;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use clap::Subcommand;

use cifkit::cif::{
    self, CellBlock, CifContent, CrystalRecord, Datum, Document, GlobalInfo, ParseOptions,
};
use cifkit::Config;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List data blocks with what each one holds
    Blocks { file: PathBuf },

    /// Print the phase metadata and each cell setting
    Summary { file: PathBuf },

    /// Run consistency checks (exits with status 1 on any issue)
    Check { file: PathBuf },

    /// Re-emit the file in canonical layout
    Fmt {
        file: PathBuf,
        /// Write here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Dump typed records as JSON
    Json {
        file: PathBuf,
        /// Dump the untyped document tree instead
        #[arg(long)]
        raw: bool,
    },

    /// Print Cartesian site positions in Å
    Cartesian {
        file: PathBuf,
        /// Only this data block
        #[arg(long)]
        block: Option<String>,
    },
}

/// Text to print, and whether the command succeeded.
#[derive(Debug)]
pub struct Output {
    pub text: String,
    pub ok: bool,
}

impl From<String> for Output {
    fn from(text: String) -> Self {
        Self { text, ok: true }
    }
}

impl Command {
    pub fn run(self, config: &Config, options: &ParseOptions) -> Result<Output, Box<dyn Error>> {
        match self {
            Command::Blocks { file } => Ok(blocks(&load(&file, options)?).into()),
            Command::Summary { file } => {
                let doc = load(&file, options)?;
                Ok(summary(&CrystalRecord::try_from(&doc)?).into())
            }
            Command::Check { file } => {
                let report = cif::validate(&load(&file, options)?, &config.validation);
                Ok(Output {
                    text: report.to_string(),
                    ok: report.is_valid(),
                })
            }
            Command::Fmt { file, output } => {
                let text = cif::write(&load(&file, options)?);
                match output {
                    Some(path) => {
                        fs::write(&path, text)?;
                        log::info!("wrote {}", path.display());
                        Ok(String::new().into())
                    }
                    None => Ok(text.into()),
                }
            }
            Command::Json { file, raw } => {
                let doc = load(&file, options)?;
                let json = if raw {
                    serde_json::to_string_pretty(&doc)?
                } else {
                    serde_json::to_string_pretty(&CrystalRecord::try_from(&doc)?)?
                };
                Ok(format!("{json}\n").into())
            }
            Command::Cartesian { file, block } => {
                let record = CrystalRecord::try_from(&load(&file, options)?)?;
                let cells: Vec<&CellBlock> = record
                    .cells
                    .iter()
                    .filter(|c| block.as_deref().map_or(true, |b| c.name.eq_ignore_ascii_case(b)))
                    .collect();
                if cells.is_empty() {
                    return Err(format!(
                        "no cell block named `{}`",
                        block.unwrap_or_default()
                    )
                    .into());
                }
                Ok(cartesian(&cells).into())
            }
        }
    }
}

fn load(path: &Path, options: &ParseOptions) -> Result<Document, Box<dyn Error>> {
    Ok(cif::parse_file(path, options)?)
}

/// `-` for a column the file does not have.
fn show<T: Display>(datum: &Option<Datum<T>>) -> String {
    datum
        .as_ref()
        .map_or_else(|| "-".to_string(), ToString::to_string)
}

fn blocks(doc: &Document) -> String {
    let mut out = String::new();
    for block in &doc.blocks {
        let kind = match CifContent::from(block.clone()) {
            CifContent::Global(_) => "global".to_string(),
            CifContent::Cell(cell) => format!("cell ({:?})", cell.setting),
            CifContent::Unknown(_) => "other".to_string(),
        };
        let rows: Vec<String> = block.loops.iter().map(|l| l.nrows().to_string()).collect();
        out.push_str(&format!(
            "{:<28} {:<24} {} tags, {} loops [{}]\n",
            block.name,
            kind,
            block.tag_count(),
            block.loops.len(),
            rows.join(", ")
        ));
    }
    out
}

fn summary(record: &CrystalRecord) -> String {
    let mut out = String::new();
    if let Some(global) = &record.global {
        write_global(&mut out, global);
    }
    for cell in &record.cells {
        let p = &cell.parameters;
        out.push_str(&format!("\n{} ({:?})\n", cell.name, cell.setting));
        out.push_str(&format!(
            "  a={} b={} c={} alpha={} beta={} gamma={}\n",
            p[0], p[1], p[2], p[3], p[4], p[5]
        ));
        out.push_str(&format!(
            "  volume {:.3} (stated {})\n",
            cell.cell.volume(),
            show(&cell.stated_volume)
        ));
        let ratios = cell.cell.axial_ratios();
        out.push_str(&format!(
            "  a/b {:.4}  b/c {:.4}  c/a {:.4}\n",
            ratios.ab, ratios.bc, ratios.ca
        ));
        out.push_str(&format!(
            "  space group {} (#{}), Z = {}\n",
            show(&cell.space_group),
            show(&cell.space_group_number),
            show(&cell.formula_units)
        ));
        out.push_str(&format!(
            "  {} sites, {} isotropic rows, {} anisotropic rows\n",
            cell.sites.len(),
            cell.isotropic.len(),
            cell.anisotropic.len()
        ));
    }
    out
}

fn write_global(out: &mut String, global: &GlobalInfo) {
    let phase = &global.phase;
    out.push_str(&format!("{}\n", global.name));
    out.push_str(&format!("  phase       {}\n", show(&phase.label)));
    out.push_str(&format!("  mineral     {}\n", show(&phase.mineral)));
    out.push_str(&format!("  formula     {}\n", show(&phase.formula_sum)));
    out.push_str(&format!("  pearson     {}\n", show(&phase.pearson_symbol)));
    out.push_str(&format!("  prototype   {}\n", show(&phase.prototype)));
    for reference in &global.references {
        let authors: Vec<String> = reference.authors.iter().map(ToString::to_string).collect();
        out.push_str(&format!(
            "  reference   {} {} ({})\n",
            authors.join("; "),
            show(&reference.journal),
            show(&reference.year)
        ));
    }
}

fn cartesian(cells: &[&CellBlock]) -> String {
    let mut out = String::new();
    for cell in cells {
        out.push_str(&format!("data_{}\n", cell.name));
        for (site, pos) in cell.cartesian_sites() {
            out.push_str(&format!(
                "  {:<6} {:<4} {:>10.4} {:>10.4} {:>10.4}\n",
                site.label,
                show(&site.type_symbol),
                pos.x,
                pos.y,
                pos.z
            ));
        }
    }
    out
}

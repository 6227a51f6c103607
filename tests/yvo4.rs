//! Integration tests over the YVO4 reference record.

use std::fs;
use std::path::PathBuf;

use cifkit::cif::{
    self, CellBlock, CellSetting, CrystalRecord, Datum, Document, ParseOptions, ValidationOptions,
    Value,
};
use rstest::{fixture, rstest};
use tempfile::NamedTempFile;

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/yvo4.cif")
}

#[fixture]
fn doc() -> Document {
    cif::parse_file(fixture_path(), &ParseOptions::default()).unwrap()
}

#[fixture]
fn record(doc: Document) -> CrystalRecord {
    CrystalRecord::try_from(&doc).unwrap()
}

fn cell<'a>(record: &'a CrystalRecord, name: &str) -> &'a CellBlock {
    record
        .cells
        .iter()
        .find(|c| c.name == name)
        .unwrap_or_else(|| panic!("no cell block {name}"))
}

#[rstest]
fn blocks_are_unique_and_in_file_order(doc: Document) {
    let names: Vec<&str> = doc.block_names().collect();
    assert_eq!(
        names,
        [
            "sm_global",
            "standardized_unitcell",
            "published_cell",
            "niggli_reduced_cell"
        ]
    );
    let mut deduped = names.clone();
    deduped.sort_unstable();
    deduped.dedup();
    assert_eq!(deduped.len(), names.len());
}

#[rstest]
fn settings_are_recognised(record: CrystalRecord) {
    assert!(record.cell(&CellSetting::Standardized).is_some());
    assert!(record.cell(&CellSetting::Published).is_some());
    assert!(record.cell(&CellSetting::NiggliReduced).is_some());
    assert_eq!(record.cells.len(), 3);
}

#[rstest]
#[case("standardized_unitcell")]
#[case("published_cell")]
fn site_rows_match_isotropic_rows(record: CrystalRecord, #[case] name: &str) {
    let cell = cell(&record, name);
    assert_eq!(cell.sites.len(), 3);
    assert_eq!(cell.sites.len(), cell.isotropic.len());
    let labels: Vec<&str> = cell.site_labels().collect();
    assert_eq!(labels, ["O1", "V1", "Y1"]);
    for row in &cell.isotropic {
        assert!(cell.site(row.label.as_deref().unwrap()).is_some());
    }
    for row in &cell.anisotropic {
        assert!(cell.site(row.label.as_deref().unwrap()).is_some());
    }
}

#[rstest]
#[case("standardized_unitcell", 1.0, 1.1318, 0.8835)]
#[case("published_cell", 1.0, 1.1318, 0.8835)]
#[case("niggli_reduced_cell", 1.0, 1.0, 1.0)]
fn axial_ratios_match_stated(
    record: CrystalRecord,
    #[case] name: &str,
    #[case] ab: f64,
    #[case] bc: f64,
    #[case] ca: f64,
) {
    let cell = cell(&record, name);
    let computed = cell.cell.axial_ratios();
    assert!((computed.ab - ab).abs() < 1e-4, "{computed:?}");
    assert!((computed.bc - bc).abs() < 1e-4, "{computed:?}");
    assert!((computed.ca - ca).abs() < 1e-4, "{computed:?}");

    let stated = cell.stated_ratios.as_ref().unwrap();
    for (stated, computed) in [
        (&stated.ab, computed.ab),
        (&stated.bc, computed.bc),
        (&stated.ca, computed.ca),
    ] {
        let m = stated.known().unwrap();
        assert!((m.value - computed).abs() <= m.resolution());
    }
}

#[rstest]
#[case("standardized_unitcell")]
#[case("published_cell")]
fn tetragonal_volume(record: CrystalRecord, #[case] name: &str) {
    let cell = cell(&record, name);
    let a2c = cell.cell.a * cell.cell.a * cell.cell.c;
    assert!((cell.cell.volume() - a2c).abs() < 1e-9);
    assert!((a2c - 318.68).abs() < 0.01);
    let stated = cell.stated_volume.as_ref().and_then(|v| v.value()).unwrap();
    assert!((stated - a2c).abs() < 0.05);
}

#[rstest]
fn niggli_cell_is_primitive_half(record: CrystalRecord) {
    let niggli = cell(&record, "niggli_reduced_cell").cell.volume();
    let standard = cell(&record, "standardized_unitcell").cell.volume();
    assert!((niggli - 159.344).abs() < 0.005);
    assert!((niggli - standard / 2.0).abs() < 0.01);
}

#[rstest]
fn unknown_is_its_own_state(doc: Document, record: CrystalRecord) {
    let block = doc.block("niggli_reduced_cell").unwrap();
    let number = block.get("_symmetry_Int_Tables_number").unwrap();
    assert_eq!(number, &Value::Unknown);
    assert_ne!(number, &Value::Str("0".into()));
    assert_ne!(number, &Value::Str(String::new()));
    assert!(block.get("_chemical_formula_structural").is_none());

    let global = doc.block("sm_global").unwrap();
    assert_eq!(
        global.get("_chemical_formula_structural"),
        Some(&Value::Str(String::new()))
    );

    let niggli = cell(&record, "niggli_reduced_cell");
    assert_eq!(niggli.space_group_number, Some(Datum::Unknown));
    assert_eq!(niggli.formula_units, Some(Datum::Unknown));
    assert!(niggli.sites[0].label.is_unknown());
    assert!(niggli.sites[0].fract().is_none());
    assert!(niggli.isotropic[0].label.is_unknown());
    assert_eq!(niggli.isotropic[0].u_eq, Some(Datum::Unknown));
    assert_eq!(niggli.site_labels().count(), 0);
}

#[rstest]
fn uncertainties_are_kept(record: CrystalRecord) {
    let published = cell(&record, "published_cell");
    assert_eq!(published.parameters[0].to_string(), "7.1183(1)");
    assert!((published.parameters[2].su().unwrap() - 0.0001).abs() < 1e-12);

    let o1 = &published.anisotropic[0];
    assert_eq!(o1.u23.known().unwrap().to_string(), "-0.0012(3)");
    assert_eq!(o1.u12.known().unwrap().su_digits, None);

    let standardized = cell(&record, "standardized_unitcell");
    assert!(standardized.parameters[0].su().is_none());
}

#[rstest]
fn global_metadata(record: CrystalRecord) {
    let global = record.global.as_ref().unwrap();
    assert_eq!(global.name, "sm_global");
    assert_eq!(global.dictionaries.len(), 3);
    assert_eq!(global.dictionaries[2].location, Some(Datum::Unknown));
    assert_eq!(global.credits.len(), 1);
    assert_eq!(global.notes.len(), 3);

    let phase = &global.phase;
    assert_eq!(phase.label, Some(Datum::Known("YVO4 rt".into())));
    assert_eq!(phase.mineral, Some(Datum::Known("wakefieldite-(Y)".into())));
    assert_eq!(phase.pearson_symbol, Some(Datum::Known("tI24".into())));
    assert_eq!(phase.space_group_number, Some(Datum::Known(141)));

    let reference = &global.references[0];
    assert_eq!(reference.authors.len(), 3);
    assert_eq!(reference.year, Some(Datum::Known(1981)));
    assert!(reference
        .title
        .as_ref()
        .and_then(|t| t.as_deref())
        .unwrap()
        .contains("YVO<sub>4</sub>"));
}

#[rstest]
fn cartesian_positions(record: CrystalRecord) {
    let cell = cell(&record, "standardized_unitcell");
    let positions = cell.cartesian_sites();
    assert_eq!(positions.len(), 3);
    let (site, pos) = positions[2];
    assert_eq!(site.label.as_deref(), Some("Y1"));
    assert!(pos.x.abs() < 1e-9);
    assert!((pos.y - 5.338725).abs() < 1e-6);
    assert!((pos.z - 0.7861625).abs() < 1e-6);
}

#[rstest]
fn fixture_is_consistent(doc: Document) {
    let report = cif::validate(&doc, &ValidationOptions::default());
    assert!(report.is_valid(), "{report}");
    assert_eq!(report.blocks_checked, 4);
    assert_eq!(report.cell_blocks, 3);
}

#[rstest]
fn round_trip_preserves_document(doc: Document) {
    let text = cif::write(&doc);
    let reparsed = cif::parse(&text).unwrap();
    assert_eq!(reparsed, doc);
    // Canonical output is stable
    assert_eq!(cif::write(&reparsed), text);
}

#[rstest]
fn round_trip_through_file(doc: Document) {
    let file = NamedTempFile::new().unwrap();
    fs::write(file.path(), cif::write(&doc)).unwrap();
    let reread = cif::parse_file(file.path(), &ParseOptions::default()).unwrap();
    assert_eq!(reread, doc);
    assert_eq!(
        CrystalRecord::try_from(&reread).unwrap(),
        CrystalRecord::try_from(&doc).unwrap()
    );
}

#[rstest]
fn tampered_copy_fails_checks(doc: Document) {
    let text = cif::write(&doc).replacen("318.7", "330.0", 1);
    let tampered = cif::parse(&text).unwrap();
    let report = cif::validate(&tampered, &ValidationOptions::default());
    assert_eq!(report.issues.len(), 1);
    assert!(report.to_string().contains("standardized_unitcell"));
}

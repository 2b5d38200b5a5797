//! Contract Invariant Tests
//!
//! These tests verify the guarantees the form and report rely on.

use woodsurvey_core::{
    document::{Block, LayoutConfig, ReportStyle},
    evaluate_row,
    export::ExportPipeline,
    render::{JsonSink, TextSink},
    snapshot::Report,
    ApplianceSection, ApplianceType, Assembler, Classification, DocumentError, Edit,
    ExportError, FluePipeCategory, RowId, SectionId, SurveyForm,
};

const SECTION: SectionId = SectionId(1);

fn row_id(form: &SurveyForm, label: &str) -> RowId {
    form.sections[0]
        .find_row(label)
        .unwrap_or_else(|| panic!("no row labelled {label}"))
        .id
}

fn apply(form: SurveyForm, edits: &[Edit]) -> SurveyForm {
    edits
        .iter()
        .fold(form, |f, e| f.apply_edit(e).expect("edit applies"))
}

fn labels_and_visibility(section: &ApplianceSection) -> Vec<(String, bool)> {
    section.rows.iter().map(|r| (r.label.clone(), r.visible)).collect()
}

#[test]
fn invariant_pass_iff_actual_meets_required() {
    let values = ["0", "1", "5.5", "6", "8", "12", "18", "36", "-2"];
    for required in values {
        for actual in values {
            let req: f64 = required.parse().unwrap();
            let act: f64 = actual.parse().unwrap();
            for shielded in [false, true] {
                let class = evaluate_row(required, actual, shielded, false);
                assert_eq!(class == Classification::Pass, act >= req, "{required} vs {actual}");
            }
        }
    }
}

#[test]
fn invariant_shortfall_is_caution_iff_shielded() {
    assert_eq!(evaluate_row("18", "12", false, false), Classification::Fail);
    assert_eq!(evaluate_row("18", "12", true, false), Classification::Caution);
    assert_eq!(evaluate_row("36 in", "35.9", true, false), Classification::Caution);
    assert_eq!(evaluate_row("36 in", "35.9", false, false), Classification::Fail);
}

#[test]
fn invariant_non_numeric_is_unclassified() {
    for shielded in [false, true] {
        assert_eq!(evaluate_row("abc", "10", shielded, false), Classification::Unclassified);
        assert_eq!(evaluate_row("10", "", shielded, false), Classification::Unclassified);
        assert_eq!(evaluate_row("", "", shielded, false), Classification::Unclassified);
    }
    assert_eq!(evaluate_row("6", "8", true, false), Classification::Pass);
}

#[test]
fn invariant_type_rule_is_idempotent() {
    for appliance_type in ApplianceType::ALL {
        let mut once = ApplianceSection::new(SECTION);
        once.apply_type(appliance_type);

        let mut twice = once.clone();
        twice.apply_type(appliance_type);

        assert_eq!(labels_and_visibility(&once), labels_and_visibility(&twice));
        assert_eq!(once, twice, "{:?}", appliance_type);
    }
}

#[test]
fn invariant_any_path_converges_to_fresh_application() {
    for target in ApplianceType::ALL {
        let mut fresh = ApplianceSection::new(SECTION);
        fresh.apply_type(target);

        for previous in ApplianceType::ALL {
            let mut section = ApplianceSection::new(SECTION);
            section.apply_type(previous);
            section.apply_type(target);
            assert_eq!(section, fresh, "{:?} -> {:?}", previous, target);
        }
    }
}

#[test]
fn invariant_rename_round_trip_restores_labels() {
    let original = ApplianceSection::new(SECTION);
    let mut section = original.clone();

    section.apply_type(ApplianceType::OutdoorBoiler);
    let renamed: Vec<_> = section.rows.iter().map(|r| r.label.as_str()).collect();
    assert!(renamed.contains(&"Chimney back"));
    assert!(renamed.contains(&"Chimney side"));
    assert!(renamed.contains(&"Chimney ceiling"));

    section.apply_type(ApplianceType::Unknown);
    assert_eq!(section.rows, original.rows);
}

#[test]
fn invariant_facing_rows_never_duplicate() {
    let mut section = ApplianceSection::new(SECTION);
    section.apply_type(ApplianceType::Insert);
    section.insert_facing_rows();
    section.apply_type(ApplianceType::Insert);
    section.insert_facing_rows();

    let facing = section
        .rows
        .iter()
        .filter(|r| r.label == "Left facing" || r.label == "Right facing")
        .count();
    assert_eq!(facing, 2);
}

#[test]
fn invariant_flue_shielding_round_trip() {
    let form = SurveyForm::new();
    let flue = row_id(&form, "Flue pipe side");
    let form = apply(
        form,
        &[
            Edit::SetShielding { section: SECTION, shielding: true },
            Edit::SetRequired { section: SECTION, row: flue, value: "13.5".into() },
        ],
    );

    let toggled = apply(
        form.clone(),
        &[
            Edit::SetShielded { section: SECTION, row: flue, shielded: true },
            Edit::SetShielded { section: SECTION, row: flue, shielded: false },
        ],
    );

    let before: f64 = form.sections[0].row(flue).unwrap().required_value.parse().unwrap();
    let after: f64 = toggled.sections[0].row(flue).unwrap().required_value.parse().unwrap();
    assert!((before - after).abs() < 1e-9);
}

#[test]
fn invariant_notes_always_reach_the_document() {
    let mut form = SurveyForm::new();
    form.add_section();
    form.sections[1].notes = "Liner cracked at thimble; recommend sweep".into();
    let report = Report::from_form(&form);

    for inline_notes in [true, false] {
        let assembler = Assembler::new(
            LayoutConfig { inline_notes, ..LayoutConfig::default() },
            ReportStyle::default(),
        );
        let document = assembler.assemble(&report).unwrap();
        assert!(document
            .paragraph_text()
            .contains("Liner cracked at thimble; recommend sweep"));
        assert_eq!(document.notes_fallback, !inline_notes);
    }
}

#[test]
fn example_insert_hides_rows_and_adds_facing_after_right_side() {
    let form = SurveyForm::new();
    let form = apply(
        form,
        &[Edit::SetApplianceType { section: SECTION, value: "insert".into() }],
    );
    let section = &form.sections[0];

    for label in ["Plenum", "Flue pipe back"] {
        assert!(!section.find_row(label).unwrap().visible, "{label} visible");
    }
    let labels: Vec<_> = section.rows.iter().map(|r| r.label.as_str()).collect();
    let right = labels.iter().position(|l| *l == "Right side").unwrap();
    assert_eq!(&labels[right + 1..right + 3], &["Left facing", "Right facing"]);
}

#[test]
fn example_pipe_category_sets_flue_requirements() {
    let form = apply(
        SurveyForm::new(),
        &[Edit::SetPipeCategory { section: SECTION, category: Some(FluePipeCategory::SingleWall) }],
    );
    let section = &form.sections[0];
    for label in ["Flue pipe back", "Flue pipe side", "Flue pipe ceiling"] {
        assert_eq!(section.find_row(label).unwrap().required_value, "18");
    }
    assert_eq!(section.find_row("Front").unwrap().required_value, "");
}

#[test]
fn invariant_hidden_rows_never_exported() {
    let form = SurveyForm::new();
    let plenum = row_id(&form, "Plenum");
    let form = apply(
        form,
        &[
            Edit::SetActual { section: SECTION, row: plenum, value: "4".into() },
            Edit::SetApplianceType { section: SECTION, value: "stove".into() },
        ],
    );
    let report = Report::from_form(&form);
    assert!(report.entries[0].rows.iter().all(|r| r.label != "Plenum"));
}

#[test]
fn invariant_one_appliance_per_page_in_order() {
    let mut form = SurveyForm::new();
    form.add_section();
    form.add_section();
    let document = Assembler::default().assemble(&Report::from_form(&form)).unwrap();

    let firsts: Vec<_> = document
        .pages
        .iter()
        .filter_map(|p| p.entry)
        .fold(Vec::new(), |mut acc, e| {
            if acc.last() != Some(&e) {
                acc.push(e);
            }
            acc
        });
    assert_eq!(firsts, vec![1, 2, 3]);

    let header_tables = document
        .pages
        .iter()
        .flat_map(|p| p.blocks.iter())
        .filter(|b| matches!(b, Block::HeaderTable { .. }))
        .count();
    assert_eq!(header_tables, 1);
    assert!(matches!(document.pages[0].blocks[1], Block::HeaderTable { .. }));
}

#[test]
fn invariant_row_order_preserved_in_document() {
    let mut form = SurveyForm::new();
    form.apply_edit_mut(&Edit::SetApplianceType { section: SECTION, value: "fireplace".into() })
        .unwrap();
    let expected: Vec<_> = form.sections[0]
        .visible_rows()
        .map(|r| r.label.clone())
        .collect();

    let layout = LayoutConfig { page_height: 400.0, ..LayoutConfig::default() };
    let document = Assembler::new(layout, ReportStyle::default())
        .assemble(&Report::from_form(&form))
        .unwrap();
    let rendered: Vec<_> = document
        .pages
        .iter()
        .flat_map(|p| p.blocks.iter())
        .filter_map(|b| match b {
            Block::ClearanceTable { rows, .. } => Some(rows.iter().map(|r| r.label.clone())),
            _ => None,
        })
        .flatten()
        .collect();
    assert_eq!(rendered, expected);
    assert!(document.page_count() > 1);
}

#[test]
fn invariant_empty_report_is_nothing_to_export() {
    let mut report = Report::from_form(&SurveyForm::new());
    report.entries.clear();

    let pipeline = ExportPipeline::new(Assembler::default(), Box::new(JsonSink), "Wood app form");
    let err = pipeline.export_report(&report).unwrap_err();
    assert!(matches!(err, ExportError::Document(DocumentError::NothingToExport)));
    assert!(err.to_string().contains("Nothing to export"));
}

#[test]
fn invariant_export_content_hash_stable() {
    let mut form = SurveyForm::new();
    form.header.policy = "HX-1".into();
    let pipeline = ExportPipeline::new(Assembler::default(), Box::new(TextSink), "Wood app form");

    let a = pipeline.export(&form).unwrap();
    let b = pipeline.export(&form).unwrap();
    assert_eq!(a.content_hash, b.content_hash);
    assert_ne!(a.id, b.id);
    assert!(a.file_name.starts_with("HX-1 - "));
    assert!(a.file_name.ends_with(" - Wood app form.txt"));
    assert!(!a.bytes().unwrap().is_empty());
}

//! End-to-end lifecycle tests through the role-gated API object.

use udder_health_core::{
    new_core, FfiCompositionEntry, FfiFilterCriteria, FfiNewSubmission, UdderHealthError,
};

fn make_submission(farmer: &str, farm: &str, date: &str) -> FfiNewSubmission {
    FfiNewSubmission {
        date: date.into(),
        farmer: farmer.into(),
        farm: farm.into(),
        location: "Sirajganj".into(),
        mobile: "01711000000".into(),
        milk_today_litres: 120.5,
        lactating_total: 14,
        lactating_under_3m: 4,
        lactating_3_to_6m: 5,
        lactating_6_to_9m: 3,
        lactating_over_9m: 2,
        dry_cows: 3,
        heifers: 2,
        calves_under_1y: 5,
        mastitis_cases_now: 1,
        mastitis_cases_last_month: 0,
        breed: "Holstein Friesian".into(),
    }
}

fn full_composition() -> FfiCompositionEntry {
    FfiCompositionEntry {
        fat_percent: Some(4.0),
        protein_percent: Some(3.5),
        lactose_percent: Some(4.5),
        solids_not_fat: Some(8.5),
        freezing_point: Some(-0.55),
    }
}

#[test]
fn test_full_record_lifecycle() {
    let core = new_core();

    let id = core
        .submit("Farmer".into(), make_submission("Rahim Uddin", "Green Pastures", "2024-06-01"))
        .unwrap();
    assert_eq!(id, 1);

    // Fresh record: everything pending, nothing classified
    let view = core.get_record("Admin1".into(), id).unwrap();
    assert_eq!(view.pending, vec!["scc", "milk_composition", "tbc"]);
    assert_eq!(view.scc_grade, "Undetermined");
    assert_eq!(view.composition_status, "Undetermined");
    assert_eq!(view.tbc_status, "Undetermined");

    // SCC entry
    core.enter_scc("Admin1".into(), id, 150_000).unwrap();
    let view = core.get_record("Admin1".into(), id).unwrap();
    assert_eq!(view.scc_grade, "Super Quality");
    assert_eq!(view.scc_status, "Normal");
    assert_eq!(view.pending, vec!["milk_composition", "tbc"]);

    // Milk composition entry
    core.enter_milk_composition("Admin2".into(), id, full_composition())
        .unwrap();
    let view = core.get_record("Admin2".into(), id).unwrap();
    assert_eq!(view.composition_status, "Normal");
    assert_eq!(view.pending, vec!["tbc"]);

    // TBC entry completes the record
    core.enter_tbc("Admin3".into(), id, 50_000).unwrap();
    let view = core.get_record("Admin3".into(), id).unwrap();
    assert_eq!(view.tbc_status, "Normal");
    assert!(view.pending.is_empty());
    assert_eq!(view.pending_summary, "All tests complete");
    assert!(!view.overdue);
}

#[test]
fn test_partial_composition_keeps_stage_pending() {
    let core = new_core();
    let id = core
        .submit("Farmer".into(), make_submission("Karim", "Riverside", "2024-06-01"))
        .unwrap();

    core.enter_milk_composition(
        "Admin2".into(),
        id,
        FfiCompositionEntry {
            fat_percent: Some(4.0),
            protein_percent: None,
            lactose_percent: None,
            solids_not_fat: None,
            freezing_point: None,
        },
    )
    .unwrap();

    let view = core.get_record("Admin2".into(), id).unwrap();
    assert!(view.pending.contains(&"milk_composition".to_string()));
    // Partial panels classify as undetermined, never from partial data
    assert_eq!(view.composition_status, "Undetermined");
}

#[test]
fn test_role_gating() {
    let core = new_core();
    let id = core
        .submit("Farmer".into(), make_submission("Rahim", "Green Pastures", "2024-06-01"))
        .unwrap();

    // Farmers submit but never view
    assert!(matches!(
        core.get_record("Farmer".into(), id),
        Err(UdderHealthError::PermissionDenied(_))
    ));

    // Admins only touch their own category
    assert!(matches!(
        core.enter_tbc("Admin1".into(), id, 50_000),
        Err(UdderHealthError::PermissionDenied(_))
    ));
    assert!(matches!(
        core.enter_scc("Admin2".into(), id, 100_000),
        Err(UdderHealthError::PermissionDenied(_))
    ));

    // Exports and certificates are SuperAdmin only
    assert!(matches!(
        core.export_csv("Admin1".into()),
        Err(UdderHealthError::PermissionDenied(_))
    ));
    assert!(matches!(
        core.generate_certificate("Admin3".into(), id, "tbc".into()),
        Err(UdderHealthError::PermissionDenied(_))
    ));

    // Unknown roles are rejected as bad input, not as forbidden
    assert!(matches!(
        core.get_record("Admin9".into(), id),
        Err(UdderHealthError::InvalidInput(_))
    ));
}

#[test]
fn test_permitted_operations_table() {
    let core = new_core();
    assert_eq!(
        core.permitted_operations("Farmer".into()).unwrap(),
        vec!["submit_data"]
    );
    assert_eq!(
        core.permitted_operations("Admin2".into()).unwrap(),
        vec!["view_data", "add_milk_comp"]
    );
    assert_eq!(
        core.permitted_operations("SuperAdmin".into()).unwrap(),
        vec![
            "view_data",
            "add_scc",
            "add_milk_comp",
            "add_tbc",
            "download_data",
            "generate_cert"
        ]
    );
}

#[test]
fn test_certificate_insufficient_data_then_ready() {
    let core = new_core();
    let id = core
        .submit("Farmer".into(), make_submission("Rahim", "Green Pastures", "2024-06-01"))
        .unwrap();

    let cert = core
        .generate_certificate("SuperAdmin".into(), id, "tbc".into())
        .unwrap();
    assert_eq!(cert.status, "insufficient_data");
    assert_eq!(cert.missing, vec!["total_bacterial_count"]);
    assert!(cert.text.is_none());

    core.enter_tbc("SuperAdmin".into(), id, 80_000).unwrap();
    let cert = core
        .generate_certificate("SuperAdmin".into(), id, "tbc".into())
        .unwrap();
    assert_eq!(cert.status, "ready");
    let text = cert.text.unwrap();
    assert!(text.contains("Total bacterial count: 80,000 cfu/mL"));
    assert!(text.contains("Contamination status: Normal"));
}

#[test]
fn test_scc_certificate_text() {
    let core = new_core();
    let id = core
        .submit("Farmer".into(), make_submission("Rahim Uddin", "Green Pastures", "2024-06-01"))
        .unwrap();
    core.enter_scc("SuperAdmin".into(), id, 450_000).unwrap();

    let cert = core
        .generate_certificate("SuperAdmin".into(), id, "scc".into())
        .unwrap();
    let text = cert.text.unwrap();
    assert!(text.contains("Farmer: Rahim Uddin"));
    assert!(text.contains("Somatic cell count: 450,000 cells/mL"));
    assert!(text.contains("[x] Very Good"));
    assert!(text.contains("[ ] Super Quality"));
    assert!(text.contains("Next test suggested by:"));
}

#[test]
fn test_filtering_by_farm_preserves_order() {
    let core = new_core();
    core.submit("Farmer".into(), make_submission("A", "Farm X", "2024-06-01"))
        .unwrap();
    core.submit("Farmer".into(), make_submission("B", "Farm Y", "2024-06-02"))
        .unwrap();
    core.submit("Farmer".into(), make_submission("C", "Farm X", "2024-06-03"))
        .unwrap();

    let filter = FfiFilterCriteria {
        farm: Some("Farm X".into()),
        ..Default::default()
    };
    let views = core.list_records("Admin1".into(), filter).unwrap();
    assert_eq!(views.iter().map(|v| v.id).collect::<Vec<_>>(), vec![1, 3]);

    // No criteria: all records, original order
    let all = core
        .list_records("Admin1".into(), FfiFilterCriteria::default())
        .unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].farmer, "A");
}

#[test]
fn test_cohort_summary() {
    let core = new_core();
    let a = core
        .submit("Farmer".into(), make_submission("A", "Farm X", "2024-06-01"))
        .unwrap();
    core.submit("Farmer".into(), make_submission("B", "Farm Y", "2024-06-02"))
        .unwrap();
    core.enter_scc("Admin1".into(), a, 100_000).unwrap();

    let summary = core.cohort_summary("SuperAdmin".into()).unwrap();
    assert_eq!(summary.total, 2);
    assert_eq!(summary.pending_scc, 1);
    assert_eq!(summary.pending_milk_composition, 2);
    assert_eq!(summary.pending_tbc, 2);

    let scc = summary.somatic_cell_count.unwrap();
    assert_eq!(scc.count, 1);
    assert_eq!(scc.mean, 100_000.0);
    // Nothing entered for composition yet
    assert!(summary.fat_percent.is_none());
}

#[test]
fn test_export_round_trip() {
    let core = new_core();
    let id = core
        .submit("Farmer".into(), make_submission("Rahim, Sr.", "Green Pastures", "2024-06-01"))
        .unwrap();
    core.submit("Farmer".into(), make_submission("Karim", "Riverside", "2024-06-02"))
        .unwrap();
    core.enter_scc("Admin1".into(), id, 150_000).unwrap();
    core.enter_milk_composition("Admin2".into(), id, full_composition())
        .unwrap();

    let csv = core.export_csv("SuperAdmin".into()).unwrap();

    let restored = new_core();
    let count = restored.import_csv("SuperAdmin".into(), csv.clone()).unwrap();
    assert_eq!(count, 2);

    // Every raw field survives the round trip
    let again = restored.export_csv("SuperAdmin".into()).unwrap();
    assert_eq!(again, csv);

    let view = restored.get_record("Admin1".into(), id).unwrap();
    assert_eq!(view.farmer, "Rahim, Sr.");
    assert_eq!(view.somatic_cell_count, Some(150_000));
    assert_eq!(view.fat_percent, Some(4.0));
    // Derived values are recomputed, not imported
    assert_eq!(view.scc_grade, "Super Quality");
}

#[test]
fn test_submit_validation_surfaces_field() {
    let core = new_core();

    let mut bad = make_submission(" ", "Green Pastures", "2024-06-01");
    bad.farmer = "   ".into();
    let err = core.submit("Farmer".into(), bad).unwrap_err();
    match err {
        UdderHealthError::ValidationError(message) => assert!(message.contains("farmer")),
        other => panic!("expected a validation error, got {:?}", other),
    }

    let bad_date = make_submission("Rahim", "Green Pastures", "01/06/2024");
    assert!(matches!(
        core.submit("Farmer".into(), bad_date),
        Err(UdderHealthError::InvalidInput(_))
    ));
}

#[test]
fn test_lab_reentry_is_idempotent() {
    let core = new_core();
    let id = core
        .submit("Farmer".into(), make_submission("Rahim", "Green Pastures", "2024-06-01"))
        .unwrap();

    core.enter_scc("Admin1".into(), id, 900_000).unwrap();
    let view = core.get_record("Admin1".into(), id).unwrap();
    assert_eq!(view.scc_status, "High");

    // Corrected value replaces the first; no duplicate history anywhere
    core.enter_scc("Admin1".into(), id, 90_000).unwrap();
    let view = core.get_record("Admin1".into(), id).unwrap();
    assert_eq!(view.somatic_cell_count, Some(90_000));
    assert_eq!(view.scc_status, "Normal");
}

#[test]
fn test_unknown_record_is_not_found() {
    let core = new_core();
    assert!(matches!(
        core.get_record("Admin1".into(), 42),
        Err(UdderHealthError::NotFound(_))
    ));
    assert!(matches!(
        core.enter_scc("Admin1".into(), 42, 1),
        Err(UdderHealthError::NotFound(_))
    ));
}

use std::collections::BTreeSet;

use chrono::Utc;
use uuid::Uuid;
use vcode_core::{CodeframeStatus, QuestionType};

use super::*;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn brand(code: &str, numeric: u32, label: &str) -> CodeframeEntry {
    CodeframeEntry::new(code, numeric, label).with_category(BRAND_AWARENESS_CATEGORY)
}

fn codeframe(entries: Vec<CodeframeEntry>) -> Codeframe {
    Codeframe {
        run_id: Uuid::new_v4(),
        group_id: "q1".to_string(),
        group_name: "Unaided awareness".to_string(),
        question_type: QuestionType::UnaidedAwareness,
        column_indices: vec![1],
        entries,
        sample_size: 3,
        total_responses: 3,
        generated_at: Utc::now(),
        status: CodeframeStatus::Generated,
        finalized_at: None,
    }
}

fn coca_cola_manager() -> BrandHierarchyManager {
    let mut manager = BrandHierarchyManager::new(BrandRollupConfig::default());
    manager.add_hierarchy(
        "Coca-Cola Company",
        strings(&["Coca-Cola"]),
        strings(&["Coke"]),
    );
    manager
}

fn coded(codes: &[&str]) -> CodedResponse {
    CodedResponse {
        response_text: "text".to_string(),
        row_index: 1,
        column_name: "Q1".to_string(),
        codes_assigned: codes.iter().map(|c| (*c).to_string()).collect(),
    }
}

fn codes(cf: &Codeframe) -> Vec<&str> {
    cf.entries.iter().map(|e| e.code.as_str()).collect()
}

#[test]
fn process_emits_parent_child_alias_then_originals() {
    let input = codeframe(vec![
        brand("C001", 1, "Coca-Cola"),
        brand("C002", 2, "Pepsi"),
        CodeframeEntry::new("OTHER", 3, "Other").with_category("catch_all"),
    ]);

    let out = coca_cola_manager().process_codeframe(input);

    assert_eq!(
        codes(&out),
        vec![
            "BRAND_COCA_COLA_COMPANY",
            "BRAND_COCA_COLA",
            "BRAND_COKE",
            "C001",
            "C002",
            "OTHER"
        ]
    );

    let parent = &out.entries[0];
    assert!(parent.is_parent);
    assert_eq!(parent.label, "Coca-Cola Company");
    assert_eq!(parent.numeric, 1000);
    assert!(parent.definition.contains("Coca-Cola"));

    let child = &out.entries[1];
    assert_eq!(child.parent_code.as_deref(), Some("BRAND_COCA_COLA_COMPANY"));
    assert_eq!(child.numeric, 1010);
    assert!(!child.is_alias);

    let alias = &out.entries[2];
    assert!(alias.is_alias);
    assert_eq!(alias.numeric, 9000);
    assert_eq!(alias.parent_code.as_deref(), Some("BRAND_COCA_COLA_COMPANY"));
}

#[test]
fn disabled_rollup_passes_codeframe_through() {
    let mut manager = coca_cola_manager();
    let mut config = manager.export_config();
    config.rollup_enabled = false;
    manager.import_config(config);

    let input = codeframe(vec![brand("C001", 1, "Coca-Cola")]);
    assert_eq!(manager.process_codeframe(input.clone()), input);
}

#[test]
fn later_hierarchies_start_a_step_higher() {
    let mut manager = coca_cola_manager();
    manager.add_hierarchy("PepsiCo", strings(&["Pepsi", "Gatorade"]), Vec::new());

    let out = manager.process_codeframe(codeframe(Vec::new()));
    let pepsi_numerics: Vec<u32> = out
        .entries
        .iter()
        .filter(|e| e.code == "BRAND_PEPSICO" || e.parent_code.as_deref() == Some("BRAND_PEPSICO"))
        .map(|e| e.numeric)
        .collect();
    assert_eq!(pepsi_numerics, vec![1100, 1110, 1111]);
}

#[test]
fn synthesized_numerics_skip_taken_ids() {
    let input = codeframe(vec![
        CodeframeEntry::new("M1", 1000, "Taste"),
        CodeframeEntry::new("M2", 9000, "Price"),
    ]);

    let out = coca_cola_manager().process_codeframe(input);

    let numerics: Vec<u32> = out.entries.iter().map(|e| e.numeric).collect();
    let unique: BTreeSet<u32> = numerics.iter().copied().collect();
    assert_eq!(unique.len(), numerics.len(), "numerics must be unique: {numerics:?}");
    assert_eq!(out.entry("BRAND_COCA_COLA_COMPANY").map(|e| e.numeric), Some(1001));
    assert_eq!(out.entry("BRAND_COKE").map(|e| e.numeric), Some(9001));
}

#[test]
fn first_declared_role_wins() {
    let mut manager = BrandHierarchyManager::new(BrandRollupConfig::default());
    manager.add_hierarchy("PepsiCo", strings(&["Pepsi"]), strings(&["Pepsi", "Pepsi Cola"]));
    manager.add_hierarchy("Other Co", strings(&["Pepsi"]), Vec::new());

    let out = manager.process_codeframe(codeframe(Vec::new()));

    let pepsi: Vec<&CodeframeEntry> = out
        .entries
        .iter()
        .filter(|e| e.code == "BRAND_PEPSI")
        .collect();
    assert_eq!(pepsi.len(), 1);
    assert!(!pepsi[0].is_alias);
    assert_eq!(pepsi[0].parent_code.as_deref(), Some("BRAND_PEPSICO"));
    assert!(out.entry("BRAND_PEPSI_COLA").is_some_and(|e| e.is_alias));
}

#[test]
fn original_brand_entry_with_synthesized_code_is_replaced() {
    let input = codeframe(vec![brand("BRAND_COKE", 5, "Coke")]);
    let out = coca_cola_manager().process_codeframe(input);

    let cokes: Vec<&CodeframeEntry> = out
        .entries
        .iter()
        .filter(|e| e.code == "BRAND_COKE")
        .collect();
    assert_eq!(cokes.len(), 1);
    assert!(cokes[0].is_alias);
}

#[test]
fn without_preserved_sub_brands_only_parents_are_emitted() {
    let mut manager = coca_cola_manager();
    let mut config = manager.export_config();
    config.preserve_sub_brands = false;
    manager.import_config(config);

    let out = manager.process_codeframe(codeframe(vec![brand("C001", 1, "Coca-Cola")]));

    assert_eq!(codes(&out), vec!["BRAND_COCA_COLA_COMPANY", "C001"]);
    let definition = &out.entries[0].definition;
    assert!(definition.contains("Coca-Cola"));
    assert!(definition.contains("Coke"));
}

#[test]
fn roll_up_adds_parent_and_preserves_order() {
    let manager = coca_cola_manager();
    let input = vec![coded(&["BRAND_COKE"]), coded(&["C002"]), coded(&["BRAND_COCA_COLA"])];

    let out = manager.roll_up_responses(&input);

    assert_eq!(out.len(), 3);
    assert_eq!(
        out[0].codes_assigned,
        ["BRAND_COKE", "BRAND_COCA_COLA_COMPANY"]
            .iter()
            .map(|c| (*c).to_string())
            .collect::<BTreeSet<_>>()
    );
    assert_eq!(out[1], input[1], "no member code means no change");
    assert!(out[2].codes_assigned.contains("BRAND_COCA_COLA_COMPANY"));
    for (before, after) in input.iter().zip(&out) {
        assert!(after.codes_assigned.is_superset(&before.codes_assigned));
    }
}

#[test]
fn roll_up_adds_every_matching_parent() {
    let mut manager = BrandHierarchyManager::new(BrandRollupConfig::default());
    manager.add_hierarchy("Parent A", strings(&["Shared"]), Vec::new());
    manager.add_hierarchy("Parent B", Vec::new(), strings(&["Shared"]));

    let out = manager.roll_up_responses(&[coded(&["BRAND_SHARED"])]);

    assert!(out[0].codes_assigned.contains("BRAND_PARENT_A"));
    assert!(out[0].codes_assigned.contains("BRAND_PARENT_B"));
}

#[test]
fn suggests_families_with_two_matching_brands() {
    let manager = BrandHierarchyManager::new(BrandRollupConfig::default());
    let cf = codeframe(vec![
        brand("C001", 1, "Coca-Cola"),
        brand("C002", 2, "Sprite Zero"),
        brand("C003", 3, "Pepsi"),
        CodeframeEntry::new("M1", 4, "Fanta flavour"),
    ]);

    let suggestions = manager.suggest_hierarchies(&cf);

    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].parent_brand, "The Coca-Cola Company");
    assert_eq!(suggestions[0].sub_brands, strings(&["Coca-Cola", "Sprite Zero"]));
    assert!(manager.config().hierarchies.is_empty(), "suggestions do not mutate config");
}

#[test]
fn suggestions_skip_configured_parents_and_use_custom_families() {
    let families = vec![BrandFamily {
        parent: "Acme Beverages".to_string(),
        members: strings(&["fizz", "pop"]),
    }];
    let mut manager =
        BrandHierarchyManager::with_reference_families(BrandRollupConfig::default(), families);
    let cf = codeframe(vec![brand("C1", 1, "FizzCo"), brand("C2", 2, "Pop Star")]);

    assert_eq!(manager.suggest_hierarchies(&cf).len(), 1);

    manager.add_hierarchy("acme beverages", Vec::new(), Vec::new());
    assert!(manager.suggest_hierarchies(&cf).is_empty());
}

#[test]
fn from_rollup_file_falls_back_to_seed_families() {
    let manager = BrandHierarchyManager::from_rollup_file(RollupFile::default());
    assert_eq!(manager.reference_families(), seed_families().as_slice());
}

#[test]
fn summary_renders_tree_and_flags() {
    let summary = coca_cola_manager().generate_hierarchy_summary();
    assert_eq!(
        summary,
        "Brand hierarchies: 1\n\
         Roll-up enabled: yes\n\
         Preserve sub-brands: yes\n\
         \n\
         Coca-Cola Company [BRAND_COCA_COLA_COMPANY]\n  \
         sub-brand: Coca-Cola [BRAND_COCA_COLA]\n  \
         alias: Coke [BRAND_COKE]"
    );
}

#[test]
fn summary_of_empty_config() {
    let summary = BrandHierarchyManager::new(BrandRollupConfig::default()).generate_hierarchy_summary();
    assert!(summary.starts_with("Brand hierarchies: 0"));
    assert!(summary.ends_with("(no hierarchies configured)"));
}

#[test]
fn exported_config_reproduces_behaviour() {
    let original = coca_cola_manager();
    let mut restored = BrandHierarchyManager::new(BrandRollupConfig::default());
    restored.import_config(original.export_config());

    let cf = codeframe(vec![brand("C001", 1, "Coca-Cola"), brand("C002", 2, "Pepsi")]);
    assert_eq!(
        codes(&original.process_codeframe(cf.clone())),
        codes(&restored.process_codeframe(cf))
    );

    let responses = vec![coded(&["BRAND_COKE"]), coded(&["C002"])];
    assert_eq!(
        original.roll_up_responses(&responses),
        restored.roll_up_responses(&responses)
    );
}

#[test]
fn non_latin_sub_brands_keep_distinct_codes() {
    let mut manager = BrandHierarchyManager::new(BrandRollupConfig::default());
    manager.add_hierarchy("可口可乐公司", strings(&["可口可乐", "雪碧"]), Vec::new());

    let out = manager.process_codeframe(codeframe(Vec::new()));

    let summary: Vec<(&str, &str, Option<&str>)> = out
        .entries
        .iter()
        .map(|e| (e.code.as_str(), e.label.as_str(), e.parent_code.as_deref()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("BRAND_可口可乐公司", "可口可乐公司", None),
            ("BRAND_可口可乐", "可口可乐", Some("BRAND_可口可乐公司")),
            ("BRAND_雪碧", "雪碧", Some("BRAND_可口可乐公司")),
        ]
    );

    let rolled = manager.roll_up_responses(&[coded(&["BRAND_雪碧"])]);
    assert!(rolled[0].codes_assigned.contains("BRAND_可口可乐公司"));
    assert_eq!(rolled[0].codes_assigned.len(), 2);
}

#[test]
fn non_brand_code_clashing_with_synthesized_code_is_renamed() {
    let input = codeframe(vec![
        brand("C001", 1, "Coca-Cola"),
        CodeframeEntry::new("BRAND_COCA_COLA", 7, "Cola flavour").with_category("beverage"),
    ]);

    let out = coca_cola_manager().process_codeframe(input);

    assert_eq!(
        codes(&out),
        vec![
            "BRAND_COCA_COLA_COMPANY",
            "BRAND_COCA_COLA",
            "BRAND_COKE",
            "C001",
            "BRAND_COCA_COLA_2"
        ]
    );
    let renamed = out.entry("BRAND_COCA_COLA_2").unwrap();
    assert_eq!(renamed.label, "Cola flavour");
    assert_eq!(renamed.numeric, 7);
}

#[test]
fn processing_twice_keeps_codes_and_numerics() {
    let input = codeframe(vec![
        brand("C001", 1, "Coca-Cola"),
        brand("C002", 2, "Pepsi"),
        CodeframeEntry::new("OTHER", 3, "Other").with_category("catch_all"),
    ]);
    let manager = coca_cola_manager();

    let once = manager.process_codeframe(input);
    let twice = manager.process_codeframe(once.clone());

    assert_eq!(once.entry("BRAND_COCA_COLA_COMPANY").map(|e| e.numeric), Some(1000));
    assert_eq!(once.entry("BRAND_COCA_COLA").map(|e| e.numeric), Some(1010));
    assert_eq!(once.entry("BRAND_COKE").map(|e| e.numeric), Some(9000));
    assert_eq!(once, twice);
}

#[test]
fn maximum_existing_numeric_does_not_overflow() {
    let input = codeframe(vec![
        CodeframeEntry::new("M1", u32::MAX, "Taste"),
        brand("C001", 9000, "Coca-Cola"),
    ]);

    let out = coca_cola_manager().process_codeframe(input);

    let numerics: Vec<u32> = out.entries.iter().map(|e| e.numeric).collect();
    let unique: BTreeSet<u32> = numerics.iter().copied().collect();
    assert_eq!(unique.len(), numerics.len(), "numerics must be unique: {numerics:?}");
    assert_eq!(out.entry("BRAND_COKE").map(|e| e.numeric), Some(9001));
}

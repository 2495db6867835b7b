//! Integration tests for merging documents.

use rstest::rstest;

use ymlmerge::domain::{merge, parse_str, DomainError, MergeOptions, Merger, NodeKind, YamlTree};

fn parse(input: &str) -> YamlTree {
    parse_str(input).expect("valid document")
}

fn merge_str(inputs: &[&str], options: &MergeOptions) -> Result<String, DomainError> {
    let trees: Vec<YamlTree> = inputs.iter().map(|s| parse(s)).collect();
    merge(&trees, options).map(|t| t.to_string())
}

fn with_delimiters(pairs: &[(&str, &str)]) -> MergeOptions {
    let mut options = MergeOptions::default();
    for (name, delim) in pairs {
        options.delimiters.insert(name.to_string(), delim.to_string());
    }
    options
}

// ============================================================
// Mappings and scalars
// ============================================================

#[test]
fn given_single_document_when_merging_then_result_equals_input() {
    // Arrange
    let base = parse("a:\n  b: 1\n  c:\n    - x\nd: 2\n");

    // Act
    let merged = merge(std::slice::from_ref(&base), &MergeOptions::default()).unwrap();

    // Assert
    assert_eq!(merged, base);
}

#[test]
fn given_document_merged_with_itself_then_result_is_unchanged() {
    let doc = "a:\n  b: 1\n  l:\n    - x\n    - y\nenv:\n  - k=v\n";
    let options = with_delimiters(&[("env", "=")]);

    let merged = merge(&[parse(doc), parse(doc)], &options).unwrap();

    assert_eq!(merged, parse(doc));
}

#[test]
fn given_override_scalar_when_merging_then_override_wins_and_order_is_kept() {
    let out = merge_str(&["a: 1\nb: 2\nc: 3\n", "b: 20\nd: 4\n"], &MergeOptions::default());
    assert_eq!(out.unwrap(), "a: 1\nb: 20\nc: 3\nd: 4\n");
}

#[test]
fn given_nested_override_when_merging_then_siblings_are_preserved() {
    let base = "db:\n  host: localhost\n  port: 5432\napp:\n  name: web\n";
    let over = "db:\n  host: db.internal\n  pool:\n    size: 10\n";
    let out = merge_str(&[base, over], &MergeOptions::default()).unwrap();
    assert_eq!(
        out,
        "db:\n  host: db.internal\n  port: 5432\n  pool:\n    size: 10\napp:\n  name: web\n"
    );
}

#[test]
fn given_deletion_token_when_merging_then_key_and_subtree_are_removed() {
    let base = "a:\n  b: 1\n  c: 2\nd:\n  e: 1\n";
    let over = "a:\n  b: nil\nd: nil\n";
    let out = merge_str(&[base, over], &MergeOptions::default()).unwrap();
    assert_eq!(out, "a:\n  c: 2\n");
}

#[test]
fn given_deletion_token_for_missing_key_then_it_is_added_verbatim() {
    let out = merge_str(&["a: 1\n", "b: nil\n"], &MergeOptions::default()).unwrap();
    assert_eq!(out, "a: 1\nb: nil\n");
}

#[test]
fn given_custom_deletion_token_then_default_token_is_a_plain_value() {
    let options = MergeOptions {
        deletion_token: "~".to_string(),
        ..MergeOptions::default()
    };
    let out = merge_str(&["a: 1\nb: 2\n", "a: nil\nb: ~\n"], &options).unwrap();
    assert_eq!(out, "a: nil\n");
}

#[test]
fn given_empty_deletion_token_then_nothing_is_deleted() {
    let options = MergeOptions {
        deletion_token: String::new(),
        ..MergeOptions::default()
    };
    let out = merge_str(&["a: 1\n", "a: nil\n"], &options).unwrap();
    assert_eq!(out, "a: nil\n");
}

// ============================================================
// Type conflicts
// ============================================================

#[test]
fn given_strict_mode_and_kind_mismatch_when_merging_then_fails_naming_both_nodes() {
    let err = merge_str(&["a:\n  b: 1\n", "a: 1\n"], &MergeOptions::default()).unwrap_err();
    match &err {
        DomainError::TypeConflict {
            base_key,
            base_kind,
            override_key,
            override_kind,
        } => {
            assert_eq!(base_key, "a");
            assert_eq!(*base_kind, NodeKind::Mapping);
            assert_eq!(override_key, "a");
            assert_eq!(*override_kind, NodeKind::Scalar);
        }
        other => panic!("expected type conflict, got {other}"),
    }
    assert!(err.to_string().starts_with("[strict mode]"));
}

#[rstest]
#[case::mapping_by_scalar("a:\n  b: 1\nz: 0\n", "a: 1\n", "a: 1\nz: 0\n")]
#[case::scalar_by_mapping("a: 1\n", "a:\n  b: 2\n", "a:\n  b: 2\n")]
#[case::list_by_scalar("a:\n  - x\n", "a: 1\n", "a: 1\n")]
#[case::mapping_by_list("a:\n  b: 1\n", "a:\n  - x\n", "a:\n  - x\n")]
fn given_lenient_mode_and_kind_mismatch_when_merging_then_override_replaces_node(
    #[case] base: &str,
    #[case] over: &str,
    #[case] expected: &str,
) {
    let options = MergeOptions {
        strict: false,
        ..MergeOptions::default()
    };
    assert_eq!(merge_str(&[base, over], &options).unwrap(), expected);
}

// ============================================================
// Lists
// ============================================================

#[test]
fn given_basic_lists_when_merging_then_union_with_suffix_deletion() {
    let out = merge_str(
        &["l:\n  - a\n  - b\n", "l:\n  - c\n  - a:nil\n"],
        &MergeOptions::default(),
    )
    .unwrap();
    assert_eq!(out, "l:\n  - b\n  - c\n");
}

#[test]
fn given_delimited_list_when_merging_then_keys_are_overridden_or_deleted() {
    let options = with_delimiters(&[("env", "=")]);
    let out = merge_str(&["env:\n  - a=1\n  - b=2\n", "env:\n  - a=nil\n  - b=3\n"], &options);
    assert_eq!(out.unwrap(), "env:\n  - b=3\n");
}

#[test]
fn given_delimited_list_over_three_documents_then_only_surviving_key_remains() {
    let options = with_delimiters(&[("env", "=")]);
    let out = merge_str(
        &[
            "env:\n  - a=1\n  - b=2\n",
            "env:\n  - b=3\n  - c=nil\n",
            "env:\n  - a=nil\n",
        ],
        &options,
    );
    assert_eq!(out.unwrap(), "env:\n  - b=3\n");
}

#[test]
fn given_merger_when_folding_overlays_then_matches_merge_function() {
    let base = parse("a: 1\n");
    let overlays = [parse("b: 2\n"), parse("a: nil\n")];

    let merged = Merger::new(&base, MergeOptions::default())
        .merge(&overlays)
        .unwrap();

    assert_eq!(merged.to_string(), "b: 2\n");
}

#[test]
fn given_conflict_in_later_document_when_folding_then_only_error_is_returned() {
    let base = parse("a: 1\nb:\n  c: 1\n");

    let result = Merger::new(&base, MergeOptions::default()).merge(&[parse("a: 2\nb: 3\n")]);

    assert!(matches!(result, Err(DomainError::TypeConflict { .. })));
    assert_eq!(base.to_string(), "a: 1\nb:\n  c: 1\n");
}

#[test]
fn given_delimited_list_item_without_delimiter_then_merge_fails() {
    let options = with_delimiters(&[("env", "=")]);
    let err = merge_str(&["env:\n  - a=1\n", "env:\n  - broken\n"], &options).unwrap_err();
    assert!(matches!(err, DomainError::MalformedListItem { ref item, .. } if item == "broken"));
}

#[test]
fn given_list_merged_across_three_documents_then_all_overrides_apply_in_order() {
    let options = with_delimiters(&[("env", "=")]);
    let out = merge_str(
        &[
            "env:\n  - a=1\n  - b=2\n",
            "env:\n  - c=3\n  - a=10\n",
            "env:\n  - b=nil\n  - d=4\n",
        ],
        &options,
    )
    .unwrap();
    assert_eq!(out, "env:\n  - a=10\n  - c=3\n  - d=4\n");
}

// ============================================================
// Folding
// ============================================================

#[test]
fn given_three_documents_then_fold_matches_stepwise_merge() {
    // Arrange
    let docs = [
        "a:\n  b: 1\n  l:\n    - x\nc: 1\n",
        "a:\n  b: 2\n  l:\n    - y\nd: 1\n",
        "a:\n  l:\n    - x:nil\nc: nil\n",
    ];
    let options = MergeOptions::default();

    // Act
    let all_at_once = merge_str(&docs, &options).unwrap();
    let first_two = merge(&[parse(docs[0]), parse(docs[1])], &options).unwrap();
    let stepwise = merge(&[first_two, parse(docs[2])], &options).unwrap();

    // Assert
    assert_eq!(all_at_once, stepwise.to_string());
    assert_eq!(all_at_once, "a:\n  b: 2\n  l:\n    - y\nd: 1\n");
}

#[test]
fn given_merge_then_inputs_are_not_modified() {
    let base = parse("a: 1\n");
    let over = parse("a: nil\n");
    let before = base.clone();

    let merged = merge(&[base.clone(), over], &MergeOptions::default()).unwrap();

    assert!(merged.is_empty());
    assert_eq!(base, before);
}

use std::cmp::Ordering;

use super::*;

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|arg| arg.to_string()).collect()
}

#[test]
fn compare_trailing_zero_tokens_are_equal() {
    assert_eq!(compare_versions("1.2", "1.2.0"), Ordering::Equal);
    assert_eq!(compare_versions("1.2.0.0", "1.2"), Ordering::Equal);
    assert_eq!(compare_versions("1", "1.0.0.0"), Ordering::Equal);
}

#[test]
fn compare_empty_suffix_outranks_non_empty() {
    assert_eq!(compare_versions("1.2", "1.2b"), Ordering::Greater);
    assert_eq!(compare_versions("1.2a", "1.2"), Ordering::Less);
}

#[test]
fn compare_suffixes_lexically() {
    assert_eq!(compare_versions("1.2b", "1.2a"), Ordering::Greater);
    assert_eq!(compare_versions("1.2.alpha", "1.2.beta"), Ordering::Less);
}

#[test]
fn compare_longer_significant_version_is_greater() {
    assert_eq!(compare_versions("1.0.1", "1.0"), Ordering::Greater);
    assert_eq!(compare_versions("5.0", "5.1"), Ordering::Less);
    assert_eq!(compare_versions("5.1.0.24", "5.1"), Ordering::Greater);
}

#[test]
fn compare_is_antisymmetric() {
    let samples = ["1.2", "1.2.0", "1.2b", "1.10", "2.0.alpha", "0.0.0", ""];
    for left in samples {
        for right in samples {
            assert_eq!(
                compare_versions(left, right),
                compare_versions(right, left).reverse(),
                "antisymmetry violated for {left:?} vs {right:?}"
            );
        }
    }
}

#[test]
fn compare_is_transitive_on_sorted_chain() {
    let chain = ["1.2a", "1.2b", "1.2", "1.2.1", "1.10", "2.0"];
    for window in chain.windows(2) {
        assert_eq!(
            compare_versions(window[0], window[1]),
            Ordering::Less,
            "chain out of order at {window:?}"
        );
    }
    assert_eq!(compare_versions(chain[0], chain[chain.len() - 1]), Ordering::Less);
}

#[test]
fn parse_malformed_token_reads_as_zero_with_suffix() {
    // No leading digits: number 0, whole token becomes the suffix.
    assert_eq!(compare_versions("1.beta", "1.0beta"), Ordering::Equal);
    assert_eq!(compare_versions("x", "0x"), Ordering::Equal);
}

#[test]
fn version_equality_follows_ordering() {
    assert_eq!(Version::parse("1.2"), Version::parse("1.2.0"));
    assert_ne!(Version::parse("1.2"), Version::parse("1.2b"));
    assert_eq!(Version::parse(" 5.1 ").as_str(), "5.1");
}

#[test]
fn to_map_last_duplicate_wins_case_insensitive() {
    let map = to_map(&args(&["-name=foo", "-Name=bar"]));
    assert_eq!(map.len(), 1);
    assert_eq!(map.get("name").map(String::as_str), Some("bar"));
}

#[test]
fn to_map_flag_without_value_and_blanks() {
    let map = to_map(&args(&["-update", "   ", "lib=/opt/libs"]));
    assert_eq!(map.get("update").map(String::as_str), Some(""));
    assert_eq!(map.get("lib").map(String::as_str), Some("/opt/libs"));
    assert_eq!(map.len(), 2);
}

#[test]
fn list_lookup_matches_by_prefix_with_or_without_dash() {
    let list = args(&["-shellbox_home=/opt/box", "run", "-Debug"]);
    assert!(list_contains(&list, "shellbox_home"));
    assert!(list_contains(&list, "debug"));
    assert_eq!(list_index_of(&list, "debug"), Some(2));
    assert_eq!(list_index_of(&list, "missing"), None);
}

#[test]
fn remove_containing_drops_both_spellings() {
    let mut list = args(&["-update", "update=now", "keep"]);
    remove_containing(&mut list, "update");
    assert_eq!(list, args(&["keep"]));
}

#[test]
fn remove_element_is_prefix_based() {
    let list = args(&["-lib=/opt/libs", "-libother", "run"]);
    let removed = remove_element(&list, "-lib");
    assert_eq!(removed, args(&["run"]));
}

#[test]
fn map_get_no_case_tolerates_leading_dash() {
    let map = to_map(&args(&["-shellbox_home=/opt/box"]));
    assert_eq!(map_get_no_case(&map, "shellbox_home"), Some("/opt/box"));
    assert_eq!(map_get_no_case(&map, "SHELLBOX_HOME"), Some("/opt/box"));
    assert_eq!(map_get_no_case(&map, "other"), None);
}

#[test]
fn properties_parse_skips_comments_and_tolerates_bom() {
    let plain = Properties::parse("name=shellbox\n# comment\n! also comment\nshell=/shell/cli/shell.sbx\n");
    let bom = Properties::parse("\u{feff}name=shellbox\n# comment\n! also comment\nshell=/shell/cli/shell.sbx\n");
    assert_eq!(plain, bom);
    assert_eq!(plain.get("name"), Some("shellbox"));
    assert_eq!(plain.get("shell"), Some("/shell/cli/shell.sbx"));
}

#[test]
fn properties_merge_last_loaded_wins() {
    let mut base = Properties::parse("name=shellbox\nautoupdate=false\n");
    let overrides = Properties::parse("autoupdate=true\nextra=1\n");
    base.merge(&overrides);
    assert_eq!(base.get("autoupdate"), Some("true"));
    assert_eq!(base.get("name"), Some("shellbox"));
    assert_eq!(base.get("extra"), Some("1"));
}

#[test]
fn properties_get_bool_parses_true_only() {
    let props = Properties::parse("autoupdate=TRUE\nother=yes\n");
    assert!(props.get_bool("autoupdate"));
    assert!(!props.get_bool("other"));
    assert!(!props.get_bool("missing"));
}

#[test]
fn properties_from_delimited_splits_on_semicolons() {
    let props = Properties::from_delimited("A=1;;B=two ; C=3;broken");
    assert_eq!(props.get("A"), Some("1"));
    assert_eq!(props.get("B"), Some("two"));
    assert_eq!(props.get("C"), Some("3"));
    assert_eq!(props.get("broken"), None);
}

// Property tests for the pure text helpers

use proptest::prelude::*;

use coursekit::hashing::git_blob_hash_bytes;
use coursekit::roster::short_names;
use coursekit::similarity::levenshtein;
use coursekit::text::{increment_headings, longest_common_prefix, natural_sort_key};

proptest! {
    #[test]
    fn lcp_is_a_prefix_of_every_input(names in proptest::collection::vec("[a-z]{0,12}", 1..8)) {
        let prefix = longest_common_prefix(&names);
        for name in &names {
            prop_assert!(name.starts_with(&prefix));
        }
    }

    #[test]
    fn lcp_is_maximal(names in proptest::collection::vec("[a-z]{0,12}", 1..8)) {
        let prefix = longest_common_prefix(&names);
        // Extending the prefix by one character must break the prefix
        // property for at least one input, unless every input IS the prefix
        let next_chars: Vec<Option<char>> = names
            .iter()
            .map(|name| name[prefix.len()..].chars().next())
            .collect();
        if next_chars.iter().all(|c| c.is_some()) {
            let first = next_chars[0];
            prop_assert!(
                !next_chars.iter().all(|&c| c == first),
                "prefix {:?} of {:?} is extensible",
                prefix,
                names
            );
        }
    }

    #[test]
    fn lcp_of_shared_prefix_inputs_contains_it(suffixes in proptest::collection::vec("[a-z]{1,6}", 2..6)) {
        let names: Vec<String> = suffixes.iter().map(|s| format!("1-WELCOME-{}", s)).collect();
        let prefix = longest_common_prefix(&names);
        prop_assert!(prefix.starts_with("1-WELCOME-"));
    }

    #[test]
    fn heading_increment_is_idempotent_without_h1(body in "([a-z ]{0,20}\n)*") {
        // Bodies with no headings at all: increment is the identity once
        // spacing is normalized, so applying it twice changes nothing
        let once = increment_headings(&body);
        let twice = increment_headings(&once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn levenshtein_is_symmetric(a in "[a-z]{0,10}", b in "[a-z]{0,10}") {
        prop_assert_eq!(levenshtein(&a, &b), levenshtein(&b, &a));
    }

    #[test]
    fn levenshtein_zero_iff_equal(a in "[a-z]{0,10}", b in "[a-z]{0,10}") {
        prop_assert_eq!(levenshtein(&a, &b) == 0, a == b);
    }

    #[test]
    fn levenshtein_bounded_by_longer_input(a in "[a-z]{0,10}", b in "[a-z]{0,10}") {
        prop_assert!(levenshtein(&a, &b) <= a.chars().count().max(b.chars().count()));
    }

    #[test]
    fn short_names_are_injective(pairs in proptest::collection::vec(("[A-Z][a-z]{1,6}", "[A-Z][a-z]{1,6}"), 1..10)) {
        let pairs: Vec<(String, String)> = pairs;
        let names = short_names(&pairs);
        let mut distinct_pairs: Vec<&(String, String)> = names.keys().collect();
        distinct_pairs.sort();
        distinct_pairs.dedup();
        let mut values: Vec<&String> = names.values().collect();
        values.sort();
        values.dedup();
        prop_assert_eq!(distinct_pairs.len(), values.len());
    }

    #[test]
    fn git_blob_hash_is_deterministic(data in proptest::collection::vec(any::<u8>(), 0..512)) {
        prop_assert_eq!(git_blob_hash_bytes(&data), git_blob_hash_bytes(&data));
        prop_assert_eq!(git_blob_hash_bytes(&data).len(), 40);
    }
}

#[test]
fn heading_increment_shifts_only_with_h1() {
    assert_eq!(increment_headings("# A\n## B"), "## A\n### B");
    assert_eq!(increment_headings("## B\n### C"), "## B\n### C");
}

#[test]
fn natural_sort_orders_digit_runs_numerically() {
    let mut files = vec!["file10.txt", "file2.txt", "file1.txt"];
    files.sort_by_key(|f| natural_sort_key(f));
    assert_eq!(files, vec!["file1.txt", "file2.txt", "file10.txt"]);
}

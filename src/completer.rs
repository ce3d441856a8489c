//! Prefix completion against a [`TagCatalog`].
//!
//! Matching is plain text: the completer knows nothing about XML structure
//! and will happily offer `</item>` inside an attribute value.

use serde::Serialize;

use crate::catalog::TagCatalog;

/// Return every catalog entry that starts with `prefix`, ignoring case.
///
/// Results keep catalog order. An empty prefix yields no suggestions.
pub fn complete(catalog: &TagCatalog, prefix: &str) -> Vec<String> {
    if prefix.is_empty() {
        return Vec::new();
    }

    let needle = prefix.to_lowercase();
    catalog
        .iter()
        .filter(|entry| entry.to_lowercase().starts_with(&needle))
        .map(str::to_string)
        .collect()
}

/// The part of `chosen` that still has to be typed after `prefix`.
///
/// Lengths are counted in characters. When `chosen` is shorter than
/// `prefix` the delta is empty.
pub fn insertion_delta<'a>(chosen: &'a str, prefix: &str) -> &'a str {
    let skip = prefix.chars().count();
    match chosen.char_indices().nth(skip) {
        Some((start, _)) => &chosen[start..],
        None => "",
    }
}

/// The whitespace-delimited word that ends at `caret`.
///
/// `caret` is a byte offset; it is clamped to the text and moved back to
/// the nearest character boundary.
pub fn current_word(text: &str, caret: usize) -> &str {
    let caret = snap_to_boundary(text, caret);
    let before = &text[..caret];
    let start = before
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace())
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    &before[start..]
}

pub(crate) fn snap_to_boundary(text: &str, offset: usize) -> usize {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

/// Completion suggestions for the word currently being typed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompletionState {
    pub prefix: String,
    pub matches: Vec<String>,
}

impl CompletionState {
    pub fn compute(completer: &PrefixCompleter, text: &str, caret: usize) -> Self {
        let prefix = current_word(text, caret);
        Self {
            prefix: prefix.to_string(),
            matches: completer.complete(prefix),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// Completer bound to a fixed catalog
#[derive(Debug, Clone, Default)]
pub struct PrefixCompleter {
    catalog: TagCatalog,
}

impl PrefixCompleter {
    pub fn new(catalog: TagCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &TagCatalog {
        &self.catalog
    }

    pub fn complete(&self, prefix: &str) -> Vec<String> {
        complete(&self.catalog, prefix)
    }

    pub fn insertion_delta<'a>(&self, chosen: &'a str, prefix: &str) -> &'a str {
        insertion_delta(chosen, prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> TagCatalog {
        TagCatalog::default()
    }

    #[test]
    fn test_complete_keeps_catalog_order() {
        let matches = complete(&catalog(), "<");
        assert_eq!(matches.len(), 9);
        assert_eq!(matches[0], "<?xml version='1.0' encoding='UTF-8'?>");

        let closing = complete(&catalog(), "</");
        assert_eq!(closing, vec!["</root>", "</item>", "</name>", "</id>"]);

        let i = complete(&catalog(), "<i");
        assert_eq!(i, vec!["<item>", "<id>"]);
    }

    #[test]
    fn test_complete_is_case_insensitive() {
        let matches = complete(&catalog(), "<ROO");
        assert_eq!(matches, vec!["<root>".to_string()]);

        let upper = TagCatalog::new(vec!["<Item>".to_string(), "<other>".to_string()]);
        assert_eq!(complete(&upper, "<it"), vec!["<Item>".to_string()]);
    }

    #[test]
    fn test_complete_empty_prefix() {
        assert!(complete(&catalog(), "").is_empty());
    }

    #[test]
    fn test_complete_no_match() {
        assert!(complete(&catalog(), "<zzz").is_empty());
        assert!(complete(&catalog(), "root").is_empty());
    }

    #[test]
    fn test_insertion_delta() {
        assert_eq!(insertion_delta("<root>", "<ro"), "ot>");
        assert_eq!(insertion_delta("<root>", ""), "<root>");
        assert_eq!(insertion_delta("<root>", "<root>"), "");
    }

    #[test]
    fn test_insertion_delta_prefix_longer_than_choice() {
        assert_eq!(insertion_delta("<id>", "<identifier"), "");
    }

    #[test]
    fn test_insertion_delta_counts_characters() {
        assert_eq!(insertion_delta("<été>", "<ét"), "é>");
    }

    #[test]
    fn test_current_word() {
        let text = "<root>\n  <it";
        assert_eq!(current_word(text, text.len()), "<it");
        assert_eq!(current_word(text, 4), "<roo");
        assert_eq!(current_word(text, 0), "");
        assert_eq!(current_word("a b ", 4), "");
        assert_eq!(current_word("<a", 99), "<a");
    }

    #[test]
    fn test_current_word_snaps_to_char_boundary() {
        let text = "x <é";
        // caret in the middle of 'é' falls back to before it
        assert_eq!(current_word(text, 4), "<");
    }

    #[test]
    fn test_completion_state_compute() {
        let completer = PrefixCompleter::default();
        let text = "<root>\n  </r";
        let state = CompletionState::compute(&completer, text, text.len());
        assert_eq!(state.prefix, "</r");
        assert_eq!(state.matches, vec!["</root>".to_string()]);
        assert!(!state.is_empty());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_catalog() -> impl Strategy<Value = TagCatalog> {
            prop::collection::vec("<?/?[a-zA-Z]{0,6}>?", 0..12).prop_map(TagCatalog::new)
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(200))]

            /// Every returned entry matches, and none of the matching entries is dropped
            #[test]
            fn complete_returns_exactly_the_matches(catalog in arb_catalog(), prefix in "<?/?[a-zA-Z]{0,3}") {
                let matches = complete(&catalog, &prefix);
                if prefix.is_empty() {
                    prop_assert!(matches.is_empty());
                } else {
                    let expected: Vec<String> = catalog
                        .iter()
                        .filter(|e| e.to_lowercase().starts_with(&prefix.to_lowercase()))
                        .map(str::to_string)
                        .collect();
                    prop_assert_eq!(matches, expected);
                }
            }

            /// prefix + delta reconstructs the chosen entry
            #[test]
            fn delta_reconstructs_choice(chosen in "[a-z<>/]{0,10}", cut in 0usize..12) {
                let prefix: String = chosen.chars().take(cut).collect();
                let delta = insertion_delta(&chosen, &prefix);
                prop_assert_eq!(format!("{}{}", prefix, delta), chosen);
            }
        }
    }
}

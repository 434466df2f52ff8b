//! Keyword matcher.
//!
//! Evaluates keyword-subscription rules against a status's normalized
//! searchable text. Rules arrive ordered by owner; each owner gets at most
//! one accepted match so a single post never produces two insertions for
//! the same feed even when several of their rules match.

use aho_corasick::AhoCorasick;
use petrel_db::entities::keyword_subscribe;

/// Stateless keyword rule evaluator.
pub struct KeywordMatcher;

impl KeywordMatcher {
    /// Whether a single rule matches the given normalized text.
    ///
    /// A rule that cannot be evaluated (empty keyword, pattern build
    /// failure) is logged and treated as a non-match; it must never abort
    /// evaluation of other rules.
    #[must_use]
    pub fn rule_matches(rule: &keyword_subscribe::Model, text: &str) -> bool {
        if rule.keyword.is_empty() {
            tracing::warn!(rule_id = %rule.id, "Skipping keyword rule with empty keyword");
            return false;
        }

        let haystack = text.to_lowercase();

        if !Self::contains(&rule.id, &rule.keyword, &haystack) {
            return false;
        }

        // A matching exclude keyword vetoes the rule.
        if let Some(ref exclude) = rule.exclude_keyword {
            if !exclude.is_empty() && Self::contains(&rule.id, exclude, &haystack) {
                return false;
            }
        }

        true
    }

    fn contains(rule_id: &str, keyword: &str, haystack: &str) -> bool {
        match AhoCorasick::new([keyword.to_lowercase()]) {
            Ok(ac) => ac.is_match(haystack),
            Err(e) => {
                tracing::warn!(rule_id = %rule_id, error = %e, "Skipping malformed keyword rule");
                false
            }
        }
    }

    /// Evaluate rules ordered by owner and return each owner key at most
    /// once, accepting the first rule that matches.
    ///
    /// `key` extracts the dedup key (account id for home rules, list id
    /// for list rules); rules without a key are skipped.
    #[must_use]
    pub fn first_match_per_owner<'a, F>(
        rules: &'a [keyword_subscribe::Model],
        text: &str,
        key: F,
    ) -> Vec<String>
    where
        F: Fn(&'a keyword_subscribe::Model) -> Option<&'a str>,
    {
        let mut matched: Vec<String> = Vec::new();

        for rule in rules {
            let Some(owner) = key(rule) else { continue };

            if matched.last().is_some_and(|last| last == owner) {
                continue;
            }

            if Self::rule_matches(rule, text) {
                matched.push(owner.to_string());
            }
        }

        matched
    }
}

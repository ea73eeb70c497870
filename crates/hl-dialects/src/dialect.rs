use std::cmp::Reverse;
use std::collections::BTreeSet;

use hl_core::{DialectSpec, HerlangError, PostProcessorKind};
use regex::Regex;

#[derive(Debug, Clone)]
pub struct SubstitutionRule {
    phrase: String,
    token: String,
    pattern: Regex,
    priority: usize,
    bounded_left: bool,
    bounded_right: bool,
}

impl SubstitutionRule {
    fn new(phrase: String, token: String, word_boundaries: bool) -> Result<Self, HerlangError> {
        let pattern = Regex::new(&regex::escape(&phrase)).map_err(|error| {
            HerlangError::new(
                "DIALECT_INVALID",
                format!("Phrase \"{}\" cannot be matched: {}", phrase, error),
            )
        })?;
        let priority = phrase.chars().count();
        let bounded_left = word_boundaries && phrase.chars().next().is_some_and(is_ascii_word_char);
        let bounded_right =
            word_boundaries && phrase.chars().next_back().is_some_and(is_ascii_word_char);
        Ok(Self {
            phrase,
            token,
            pattern,
            priority,
            bounded_left,
            bounded_right,
        })
    }

    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Length in characters; longer phrases are applied first.
    pub fn priority(&self) -> usize {
        self.priority
    }

    /// Byte ranges of every non-overlapping occurrence in `haystack`.
    ///
    /// `before` and `after` are the characters surrounding `haystack` in the
    /// full text, used for word boundary checks at the edges.
    pub fn find_in(
        &self,
        haystack: &str,
        before: Option<char>,
        after: Option<char>,
    ) -> Vec<(usize, usize)> {
        let mut found = Vec::new();
        let mut cursor = 0usize;
        while let Some(hit) = self.pattern.find_at(haystack, cursor) {
            let (start, end) = (hit.start(), hit.end());
            let left = if start == 0 {
                before
            } else {
                haystack[..start].chars().next_back()
            };
            let right = if end == haystack.len() {
                after
            } else {
                haystack[end..].chars().next()
            };
            let left_ok = !self.bounded_left || !left.is_some_and(is_word_char);
            let right_ok = !self.bounded_right || !right.is_some_and(is_word_char);
            if left_ok && right_ok {
                found.push((start, end));
                cursor = end;
            } else {
                let step = haystack[start..].chars().next().map_or(1, char::len_utf8);
                cursor = start + step;
            }
            if cursor > haystack.len() {
                break;
            }
        }
        found
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

fn is_ascii_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

#[derive(Debug, Clone)]
pub struct Dialect {
    id: String,
    display_name: String,
    aliases: Vec<String>,
    post_processor: PostProcessorKind,
    rules: Vec<SubstitutionRule>,
}

impl Dialect {
    pub fn from_spec(spec: DialectSpec) -> Result<Self, HerlangError> {
        if spec.id.trim().is_empty() {
            return Err(HerlangError::new(
                "DIALECT_INVALID",
                "Dialect id must not be empty.",
            ));
        }

        let mut seen = BTreeSet::new();
        let mut rules = Vec::with_capacity(spec.rules.len());
        for (phrase, token) in spec.rules {
            if phrase.is_empty() {
                return Err(HerlangError::new(
                    "DIALECT_INVALID",
                    format!("Dialect \"{}\" declares an empty phrase.", spec.id),
                ));
            }
            if !seen.insert(phrase.clone()) {
                return Err(HerlangError::new(
                    "DIALECT_DUPLICATE",
                    format!(
                        "Dialect \"{}\" declares phrase \"{}\" more than once.",
                        spec.id, phrase
                    ),
                ));
            }
            rules.push(SubstitutionRule::new(phrase, token, spec.word_boundaries)?);
        }

        // Stable sort: equal-length phrases keep declaration order.
        rules.sort_by_key(|rule| Reverse(rule.priority));

        Ok(Self {
            display_name: spec.display_name.unwrap_or_else(|| spec.id.clone()),
            id: spec.id,
            aliases: spec.aliases,
            post_processor: spec.post_processor,
            rules,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn post_processor(&self) -> PostProcessorKind {
        self.post_processor
    }

    /// Rules in application order.
    pub fn rules(&self) -> &[SubstitutionRule] {
        &self.rules
    }

    pub fn token_for(&self, phrase: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|rule| rule.phrase == phrase)
            .map(|rule| rule.token.as_str())
    }
}

#[cfg(test)]
mod dialect_tests {
    use super::*;

    fn spec(rules: &[(&str, &str)], word_boundaries: bool) -> DialectSpec {
        DialectSpec {
            id: "test".to_string(),
            display_name: None,
            aliases: Vec::new(),
            post_processor: PostProcessorKind::Passthrough,
            word_boundaries,
            rules: rules
                .iter()
                .map(|(phrase, token)| ((*phrase).to_string(), (*token).to_string()))
                .collect(),
        }
    }

    #[test]
    fn rules_are_ordered_by_descending_length_then_declaration() {
        let dialect = Dialect::from_spec(spec(
            &[("ab", "1"), ("abcd", "2"), ("cd", "3"), ("xyz", "4")],
            false,
        ))
        .expect("dialect should build");
        let phrases = dialect
            .rules()
            .iter()
            .map(SubstitutionRule::phrase)
            .collect::<Vec<_>>();
        assert_eq!(phrases, vec!["abcd", "xyz", "ab", "cd"]);
    }

    #[test]
    fn priority_counts_characters_not_bytes() {
        let dialect = Dialect::from_spec(spec(&[("ab", "1"), ("如果说", "2")], false))
            .expect("dialect should build");
        assert_eq!(dialect.rules()[0].phrase(), "如果说");
        assert_eq!(dialect.rules()[0].priority(), 3);
    }

    #[test]
    fn duplicate_and_empty_phrases_are_rejected() {
        let duplicate = Dialect::from_spec(spec(&[("a", "1"), ("a", "2")], false))
            .expect_err("duplicate should fail");
        assert_eq!(duplicate.code, "DIALECT_DUPLICATE");

        let empty = Dialect::from_spec(spec(&[("", "1")], false)).expect_err("empty should fail");
        assert_eq!(empty.code, "DIALECT_INVALID");

        let mut no_id = spec(&[("a", "1")], false);
        no_id.id = " ".to_string();
        assert_eq!(
            Dialect::from_spec(no_id).expect_err("blank id").code,
            "DIALECT_INVALID"
        );
    }

    #[test]
    fn regex_metacharacters_match_literally() {
        let dialect =
            Dialect::from_spec(spec(&[("a.b(c)*", "x")], false)).expect("dialect should build");
        let rule = &dialect.rules()[0];
        assert_eq!(rule.find_in("a.b(c)* and axb(c)", None, None), vec![(0, 7)]);
    }

    #[test]
    fn word_boundaries_skip_matches_inside_words() {
        let dialect = Dialect::from_spec(spec(&[("is", "==")], true)).expect("dialect should build");
        let rule = &dialect.rules()[0];
        assert_eq!(rule.find_in("wish is this", None, None), vec![(5, 7)]);
        assert!(rule.find_in("is", Some('h'), None).is_empty());
        assert_eq!(rule.find_in("is", Some(' '), Some('(')), vec![(0, 2)]);
    }

    #[test]
    fn boundaries_ignore_non_word_phrase_edges() {
        let dialect =
            Dialect::from_spec(spec(&[("小仙女", "let")], true)).expect("dialect should build");
        let rule = &dialect.rules()[0];
        assert_eq!(rule.find_in("a小仙女b", None, None).len(), 1);
    }

    #[test]
    fn token_for_finds_declared_token() {
        let dialect = Dialect::from_spec(spec(&[("贴贴", "+")], false)).expect("dialect");
        assert_eq!(dialect.token_for("贴贴"), Some("+"));
        assert_eq!(dialect.token_for("missing"), None);
        assert_eq!(dialect.display_name(), "test");
    }
}

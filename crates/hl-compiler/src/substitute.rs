use hl_dialects::Dialect;

#[derive(Debug)]
enum Segment<'a> {
    Raw(String),
    Token(&'a str),
}

impl Segment<'_> {
    fn first_char(&self) -> Option<char> {
        match self {
            Segment::Raw(text) => text.chars().next(),
            Segment::Token(text) => text.chars().next(),
        }
    }

    fn last_char(&self) -> Option<char> {
        match self {
            Segment::Raw(text) => text.chars().next_back(),
            Segment::Token(text) => text.chars().next_back(),
        }
    }
}

/// Rewrites every dialect phrase to its token, longest phrases first.
///
/// Text produced by a replacement is sealed: later (shorter) rules only see
/// the raw spans between tokens.
pub fn substitute(text: &str, dialect: &Dialect) -> String {
    let mut segments = vec![Segment::Raw(text.to_string())];

    for rule in dialect.rules() {
        let mut next = Vec::with_capacity(segments.len());
        for index in 0..segments.len() {
            let Segment::Raw(raw) = &segments[index] else {
                continue;
            };
            let before = index.checked_sub(1).and_then(|i| segments[i].last_char());
            let after = segments.get(index + 1).and_then(Segment::first_char);
            let hits = rule.find_in(raw, before, after);
            if hits.is_empty() {
                continue;
            }
            next.push((index, split_raw(raw, &hits, rule.token())));
        }

        for (index, replacement) in next.into_iter().rev() {
            segments.splice(index..=index, replacement);
        }
    }

    let mut out = String::with_capacity(text.len());
    for segment in &segments {
        match segment {
            Segment::Raw(text) => out.push_str(text),
            Segment::Token(token) => out.push_str(token),
        }
    }
    out
}

fn split_raw<'a>(raw: &str, hits: &[(usize, usize)], token: &'a str) -> Vec<Segment<'a>> {
    let mut parts = Vec::with_capacity(hits.len() * 2 + 1);
    let mut cursor = 0usize;
    for (start, end) in hits {
        if *start > cursor {
            parts.push(Segment::Raw(raw[cursor..*start].to_string()));
        }
        parts.push(Segment::Token(token));
        cursor = *end;
    }
    if cursor < raw.len() {
        parts.push(Segment::Raw(raw[cursor..].to_string()));
    }
    parts
}

#[cfg(test)]
mod substitute_tests {
    use super::*;
    use hl_core::{DialectSpec, PostProcessorKind};
    use hl_dialects::DialectStore;

    fn dialect(rules: &[(&str, &str)], word_boundaries: bool) -> Dialect {
        Dialect::from_spec(DialectSpec {
            id: "test".to_string(),
            display_name: None,
            aliases: Vec::new(),
            post_processor: PostProcessorKind::Passthrough,
            word_boundaries,
            rules: rules
                .iter()
                .map(|(phrase, token)| ((*phrase).to_string(), (*token).to_string()))
                .collect(),
        })
        .expect("dialect should build")
    }

    #[test]
    fn text_without_phrases_is_unchanged() {
        let store = DialectStore::builtin().expect("store");
        for id in ["chinese", "english", "python", "rust"] {
            let dialect = store.get(id).expect("dialect");
            let text = "let x = 5;\nconsole.log(x * 2);\n";
            assert_eq!(substitute(text, dialect), text, "dialect {}", id);
        }
    }

    #[test]
    fn longer_phrase_wins_over_embedded_shorter_phrase() {
        let store = DialectStore::builtin().expect("store");
        let chinese = store.get("chinese").expect("chinese");
        let out = substitute("} 我接受不等于我同意 (a) {", chinese);
        assert_eq!(out, "} else if (a) {");
        assert!(!out.contains('='));
    }

    #[test]
    fn long_english_phrase_resolves_to_single_token() {
        let store = DialectStore::builtin().expect("store");
        let english = store.get("english").expect("english");
        let out = substitute("} I accept not equal I agree (x > 1) {", english);
        assert_eq!(out, "} else if (x > 1) {");
    }

    #[test]
    fn replacement_tokens_are_not_rescanned() {
        let dialect = dialect(&[("abcdefghijkl", "xy"), ("xy", "BAD"), ("abcd", "WRONG")], false);
        assert_eq!(substitute("abcdefghijkl abcd", &dialect), "xy WRONG");
    }

    #[test]
    fn adjacent_tokens_do_not_merge_into_shorter_phrase() {
        let dialect = dialect(&[("ab", "c"), ("cc", "BAD")], false);
        assert_eq!(substitute("abab", &dialect), "cc");
    }

    #[test]
    fn scenario_declaration_translates_to_let() {
        let store = DialectStore::builtin().expect("store");
        let chinese = store.get("chinese").expect("chinese");
        assert_eq!(substitute("小仙女 x 我接受 5", chinese), "let x = 5");
        assert_eq!(substitute("输出(\"hi\")", chinese), "console.log(\"hi\")");
    }

    #[test]
    fn word_boundaries_consider_neighbouring_tokens() {
        let dialect = dialect(&[("output", "console.log"), ("is", "==")], true);
        assert_eq!(
            substitute("output(\"wish\"); a is b", &dialect),
            "console.log(\"wish\"); a == b"
        );
    }

    #[test]
    fn every_occurrence_is_replaced() {
        let store = DialectStore::builtin().expect("store");
        let chinese = store.get("chinese").expect("chinese");
        assert_eq!(substitute("贴贴贴贴贴贴", chinese), "+++");
    }
}

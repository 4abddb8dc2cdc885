use regex::RegexBuilder;
use serde::Serialize;

/// Case-insensitive substring match over a view's whitelist of derived
/// display fields. The fields are tested as one concatenation, so a
/// term may span adjacent fields. An empty or whitespace-only term
/// matches everything.
pub fn matches(fields: &[&str], term: &str) -> bool {
    let term = term.trim();
    if term.is_empty() {
        return true;
    }
    fields
        .join(" ")
        .to_lowercase()
        .contains(&term.to_lowercase())
}

/// One span of highlighted output; concatenating all segments in order
/// reproduces the input text exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub text: String,
    pub matched: bool,
}

/// Split `text` into matched/unmatched segments for the given term.
/// The term is escaped before the pattern is built, so regex
/// metacharacters are matched literally and never fail.
pub fn highlight(text: &str, term: &str) -> Vec<Segment> {
    let term = term.trim();
    if text.is_empty() {
        return Vec::new();
    }
    if term.is_empty() {
        return vec![unmatched(text)];
    }

    let pattern = match RegexBuilder::new(&regex::escape(term))
        .case_insensitive(true)
        .build()
    {
        Ok(pattern) => pattern,
        // Escaped input cannot produce an invalid pattern; degrade to a
        // single unmatched span rather than panic if it ever does.
        Err(_) => return vec![unmatched(text)],
    };

    let mut segments = Vec::new();
    let mut cursor = 0;
    for found in pattern.find_iter(text) {
        if found.start() > cursor {
            segments.push(unmatched(&text[cursor..found.start()]));
        }
        segments.push(Segment {
            text: found.as_str().to_string(),
            matched: true,
        });
        cursor = found.end();
    }
    if cursor < text.len() {
        segments.push(unmatched(&text[cursor..]));
    }

    segments
}

fn unmatched(text: &str) -> Segment {
    Segment {
        text: text.to_string(),
        matched: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_term_matches_everything() {
        assert!(matches(&["Acme Traders", "Asha"], ""));
        assert!(matches(&[], "  "));
    }

    #[test]
    fn matching_is_case_insensitive_and_spans_fields() {
        assert!(matches(&["Acme", "Traders"], "acme"));
        assert!(matches(&["Acme", "Traders"], "ACME TRAD"));
        assert!(!matches(&["Acme", "Traders"], "globex"));
    }

    #[test]
    fn highlight_tags_every_occurrence() {
        let segments = highlight("Call Acme, then acme again", "acme");
        assert_eq!(
            segments,
            vec![
                Segment { text: "Call ".into(), matched: false },
                Segment { text: "Acme".into(), matched: true },
                Segment { text: ", then ".into(), matched: false },
                Segment { text: "acme".into(), matched: true },
                Segment { text: " again".into(), matched: false },
            ]
        );
    }

    #[test]
    fn highlight_round_trips_for_metacharacter_terms() {
        for term in [".*+?()[]", "a.b", "(call)", "50 %", "c++"] {
            for text in ["notes (call) 50 % done c++ a.b", "", "plain"] {
                let rebuilt: String = highlight(text, term)
                    .into_iter()
                    .map(|segment| segment.text)
                    .collect();
                assert_eq!(rebuilt, text, "term {term:?}");
            }
        }
    }

    #[test]
    fn metacharacters_match_literally() {
        let segments = highlight("progress (call) logged", "(call)");
        assert!(segments.iter().any(|s| s.matched && s.text == "(call)"));

        // `.` must not act as a wildcard once escaped.
        let segments = highlight("axb", "a.b");
        assert!(segments.iter().all(|s| !s.matched));
    }
}

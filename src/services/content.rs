use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

pub(crate) const MAX_CONTENT_CHARS: usize = 200_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum ContentError {
    #[error("Content must be at most {MAX_CONTENT_CHARS} characters")]
    TooLong,
    #[error("Content contains a forbidden element: {0}")]
    Forbidden(&'static str),
}

struct Rule {
    label: &'static str,
    pattern: Regex,
}

fn rules() -> &'static [Rule] {
    static RULES: OnceLock<Vec<Rule>> = OnceLock::new();
    RULES.get_or_init(|| {
        [
            ("<script>", r"(?i)<\s*script\b"),
            ("<iframe>", r"(?i)<\s*iframe\b"),
            ("<object>", r"(?i)<\s*object\b"),
            ("<embed>", r"(?i)<\s*embed\b"),
            ("javascript: URL", r"(?i)javascript\s*:"),
            ("inline event handler", r#"(?i)<[^>]*[\s"'/]on[a-z]+\s*="#),
        ]
        .into_iter()
        .filter_map(|(label, source)| match Regex::new(source) {
            Ok(pattern) => Some(Rule { label, pattern }),
            Err(err) => {
                tracing::error!(error = %err, rule = label, "Invalid content rule");
                None
            }
        })
        .collect()
    })
}

/// Checks submitted rich-text HTML. The markup is stored as sent; this only refuses active content.
pub(crate) fn validate_content(content: &str) -> Result<(), ContentError> {
    if content.chars().count() > MAX_CONTENT_CHARS {
        return Err(ContentError::TooLong);
    }

    match rules().iter().find(|rule| rule.pattern.is_match(content)) {
        Some(rule) => Err(ContentError::Forbidden(rule.label)),
        None => Ok(()),
    }
}

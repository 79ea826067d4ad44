use std::sync::LazyLock;

use regex::Regex;

/// Terms that block publication of a text.
const BLOCKED_TERMS: &[&str] = &["palavrãoteste", "outroexemplo"];

static BLOCKLIST: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = BLOCKED_TERMS
        .iter()
        .map(|term| regex::escape(term))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!("(?i)(?:{})", alternation)).expect("blocklist pattern is valid")
});

/// Content-moderation predicate: `false` when the text contains a blocked
/// term (case-insensitive). Empty text is always approved.
pub fn is_content_approved(text: &str) -> bool {
    text.is_empty() || !BLOCKLIST.is_match(text)
}

/// Strips unsafe HTML from user text with ammonia's whitelist, keeping
/// harmless formatting tags.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

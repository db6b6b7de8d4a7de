//! Cleanup applied to every generated text field.

/// Removes one pair of matching outer quotes (`"..."` or `'...'`).
///
/// Whitespace around the pair is ignored when matching and dropped with it.
/// A string whose inner text still contains the quote character is returned
/// unchanged, so `'it's'` keeps its quotes.
pub fn strip_outer_quotes(text: &str) -> &str {
    let trimmed = text.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = trimmed
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            if !inner.contains(quote) {
                return inner;
            }
        }
    }
    text
}

/// Trim, then strip one outer quote pair.
pub fn clean_generated(raw: &str) -> String {
    strip_outer_quotes(raw.trim()).to_string()
}

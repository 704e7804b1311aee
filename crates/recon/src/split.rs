//! Splitting of multi-valued text fields.
//!
//! Airtable packs linked records into one comma-delimited cell. Host lists
//! are plain; citation lists quote any title that itself contains a comma.

/// Split a plain comma list into trimmed, non-empty, distinct tokens.
/// Order of first appearance is kept.
pub fn split_list(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for token in raw.split(',') {
        push_unique(&mut out, token);
    }
    out
}

/// Split a citation list, honouring double quotes.
///
/// A token wrapped in `"` may contain commas, and `""` inside quotes is a
/// literal quote. Whitespace between a delimiter and an opening quote is
/// ignored, so `Smith 2001, "Jones, 2003"` yields two tokens.
pub fn split_citations(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    current.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => current.push(c),
            }
            continue;
        }

        match c {
            ',' => {
                push_unique(&mut out, &current);
                current.clear();
            }
            '"' if current.trim().is_empty() => {
                current.clear();
                in_quotes = true;
            }
            _ => current.push(c),
        }
    }
    push_unique(&mut out, &current);

    out
}

fn push_unique(out: &mut Vec<String>, token: &str) {
    let token = token.trim();
    if !token.is_empty() && !out.iter().any(|t| t == token) {
        out.push(token.to_string());
    }
}

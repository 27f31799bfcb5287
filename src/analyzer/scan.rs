//! Quote-aware scanning over raw expression text.
//!
//! Used wherever a balanced region has to be cut out of a larger string
//! before it is tokenized: reference calls, `$(..)` segments, control keys.
//! Both quote styles are recognised and a backslash escapes the next
//! character inside a quoted run.

/// Byte index of the `)` that closes the `(` at `open`.
///
/// Returns `None` if `open` is not a `(` or the group never closes.
pub fn find_closing(text: &str, open: usize) -> Option<usize> {
    if text.as_bytes().get(open) != Some(&b'(') {
        return None;
    }

    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (idx, c) in text[open..].char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// Splits `text` on `separator` occurrences that sit outside quotes,
/// parentheses and brackets.
pub fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;

    for (idx, c) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            c if c == separator && depth == 0 => {
                parts.push(&text[start..idx]);
                start = idx + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Byte index of the first top-level occurrence of `word` that stands alone
/// (whitespace or text boundary on both sides).
pub fn find_top_level_word(text: &str, word: &str) -> Option<usize> {
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut previous: Option<char> = None;

    for (idx, c) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            previous = Some(c);
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            _ if depth == 0 && text[idx..].starts_with(word) => {
                let before_ok = previous.map_or(true, char::is_whitespace);
                let after_ok = text[idx + word.len()..]
                    .chars()
                    .next()
                    .map_or(true, char::is_whitespace);
                if before_ok && after_ok {
                    return Some(idx);
                }
            }
            _ => {}
        }
        previous = Some(c);
    }
    None
}

/// Start offsets of every `token` occurrence outside quoted runs.
pub fn find_unquoted(text: &str, token: &str) -> Vec<usize> {
    let mut found = Vec::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (idx, c) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            _ if text[idx..].starts_with(token) => found.push(idx),
            _ => {}
        }
    }
    found
}

/// Strips one pair of matching surrounding quotes, if present.
pub fn unquote(text: &str) -> &str {
    let text = text.trim();
    let mut chars = text.chars();
    match (chars.next(), chars.next_back()) {
        (Some(first @ ('"' | '\'')), Some(last)) if first == last && text.len() >= 2 => {
            &text[1..text.len() - 1]
        }
        _ => text,
    }
}

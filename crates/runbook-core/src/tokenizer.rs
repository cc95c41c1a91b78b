//! Shell-like tokenizer for fence annotations.
//!
//! Splits on spaces outside double quotes. Quotes stay in the token text;
//! stripping them is left to the option parser, which only unquotes values.
//! A backslash escapes the next character and is itself dropped.

/// Split `input` into tokens.
pub fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape_next = false;

    for ch in input.chars() {
        if escape_next {
            current.push(ch);
            escape_next = false;
            continue;
        }

        match ch {
            '\\' => escape_next = true,
            '"' => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            ' ' if !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(ch),
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

/// Rebuild a raw annotation string that tokenizes back to `tokens`.
///
/// Double quotes are kept as-is when they pair up inside a token, so
/// `--name="John Doe"` round-trips untouched. Spaces outside a quoted span
/// and backslashes are escaped.
pub fn join_tokens<S: AsRef<str>>(tokens: &[S]) -> String {
    tokens
        .iter()
        .map(|t| escape_token(t.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn escape_token(token: &str) -> String {
    let balanced = token.chars().filter(|c| *c == '"').count() % 2 == 0;
    let mut out = String::with_capacity(token.len());
    let mut in_quotes = false;

    for ch in token.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' if balanced => {
                in_quotes = !in_quotes;
                out.push(ch);
            }
            '"' => out.push_str("\\\""),
            ' ' if !in_quotes => out.push_str("\\ "),
            _ => out.push(ch),
        }
    }
    out
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tokenization for the analyzed index fields.
//!
//! Names split on spaces, dots and camel-case boundaries; the token stream
//! is the original lowercased string followed by each split token that is
//! not already a word of the output. The function is idempotent on its own
//! output, which keeps re-analyzed fields stable.

/// Split a name at camel-case boundaries.
///
/// A boundary sits before every uppercase character that has any
/// predecessor, so `"URLParser"` splits to `["U", "R", "L", "Parser"]`.
pub fn split_type_name(name: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for ch in name.chars() {
        if ch.is_uppercase() && !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
        current.push(ch);
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Produce the analyzed text for a symbol name.
///
/// `tokenize("Foo.Bar BazQux") == "foo.bar bazqux foo bar baz qux"`.
pub fn tokenize(input: &str) -> String {
    let lowered = input.to_lowercase();
    let mut out = lowered.clone();
    let mut seen: std::collections::HashSet<String> =
        lowered.split_whitespace().map(str::to_string).collect();

    // One token per dot/space/camel split, skipping words the output
    // already carries.
    for word in input.split([' ', '.']) {
        for token in split_type_name(word) {
            let token = token.to_lowercase();
            if token.is_empty() || !seen.insert(token.clone()) {
                continue;
            }
            out.push(' ');
            out.push_str(&token);
        }
    }
    out
}

#[cfg(test)]
#[path = "tokenizer_tests.rs"]
mod tests;

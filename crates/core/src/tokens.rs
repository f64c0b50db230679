//! Identifier subtokenization and name/body splitting.
//!
//! Both functions are pure and total over their inputs.

use thiserror::Error;

/// Split an identifier into lower-cased sub-word tokens.
///
/// At each position the first matching alternative wins:
/// 1. an uppercase run directly followed by an uppercase letter and a lowercase letter
///    (`HTTP` in `HTTPServer`),
/// 2. an optional uppercase letter followed by lowercase letters,
/// 3. an uppercase run,
/// 4. a digit run,
/// 5. any single other character.
///
/// Underscores and whitespace-only matches are dropped.
pub fn subtokenize(identifier: &str) -> Vec<String> {
    let chars: Vec<char> = identifier.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let end = match_word(&chars, i);
        let word: String = chars[i..end].iter().collect();
        let word = word.trim().to_lowercase();
        if !word.is_empty() && word != "_" {
            out.push(word);
        }
        i = end;
    }

    out
}

/// Return the exclusive end of the token starting at `start`.
fn match_word(chars: &[char], start: usize) -> usize {
    let upper_end = run_end(chars, start, char::is_ascii_uppercase);
    let upper_len = upper_end - start;

    // Acronym before a capitalized word: leave the last capital for the next word.
    if upper_len >= 2 && chars.get(upper_end).is_some_and(char::is_ascii_lowercase) {
        return upper_end - 1;
    }

    let lower_start = if upper_len >= 1 { start + 1 } else { start };
    let lower_end = run_end(chars, lower_start, char::is_ascii_lowercase);
    if lower_end > lower_start {
        return lower_end;
    }

    if upper_len > 0 {
        return upper_end;
    }

    let digit_end = run_end(chars, start, char::is_ascii_digit);
    if digit_end > start {
        return digit_end;
    }

    start + 1
}

fn run_end(chars: &[char], start: usize, pred: fn(&char) -> bool) -> usize {
    let mut end = start;
    while end < chars.len() && pred(&chars[end]) {
        end += 1;
    }
    end
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SplitError {
    #[error("no `{name}` token immediately followed by `(`")]
    BoundaryNotFound { name: String },
}

/// Partition a function's tokens at the first `name (` pair.
///
/// The elided prefix runs up to and including that opening parenthesis; the
/// source suffix is everything after it.
pub fn split_name_body(
    name: &str,
    tokens: &[String],
) -> Result<(Vec<String>, Vec<String>), SplitError> {
    tokens
        .windows(2)
        .position(|pair| pair[0] == name && pair[1] == "(")
        .map(|idx| (tokens[..idx + 2].to_vec(), tokens[idx + 2..].to_vec()))
        .ok_or_else(|| SplitError::BoundaryNotFound { name: name.to_string() })
}

/// Like [`split_name_body`], but falls back to `([], tokens)` when no boundary exists.
pub fn split_or_degrade(name: &str, tokens: &[String]) -> (Vec<String>, Vec<String>) {
    match split_name_body(name, tokens) {
        Ok(parts) => parts,
        Err(err) => {
            tracing::debug!("keeping full token stream: {}", err);
            (Vec::new(), tokens.to_vec())
        }
    }
}

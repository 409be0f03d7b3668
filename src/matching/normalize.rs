//! Canonicalization of titles, artist names and guesses.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// An opening annotation or dash suffix cuts the string: everything from
/// `" (Remix)"`, `" [Live]"` or `" - Radio Edit"` onwards is noise.
const TERMINATORS: [&str; 3] = [" (", " [", " - "];

/// Tokens replaced by a single space (not deleted, so adjacent words do not
/// glue together).
const NOISE: [&str; 8] = [" - ", " & ", ".", "!", "remix", "/", "edit", "from"];

/// Canonicalize a free-text string so titles and guesses compare fairly.
///
/// Decomposes (NFKD), drops combining marks, recomposes (NFC) and
/// lowercases, then truncates at the first terminator and spaces out the
/// noise tokens. Deterministic and idempotent; empty in, empty out.
pub fn normalize(s: &str) -> String {
    let folded: String = s
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .nfc()
        .collect();
    let mut out = folded.to_lowercase();

    for terminator in TERMINATORS {
        if let Some(at) = out.find(terminator) {
            out.truncate(at);
        }
    }

    for noise in NOISE {
        out = out.replace(noise, " ");
    }

    out
}

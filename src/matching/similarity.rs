//! Normalized edit-distance similarity.

/// Similarity between two strings as a percentage in `[0, 100]`.
///
/// Levenshtein distance (insert/delete/substitute, unit cost) counted in
/// Unicode code points, scaled by the longer input:
/// `100 * (max_len - distance) / max_len`. Symmetric; 100 means identical,
/// and two empty strings are defined as identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 100.0;
    }

    let distance = strsim::levenshtein(a, b).min(longest);
    100.0 * (longest - distance) as f64 / longest as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_score_100() {
        assert_eq!(similarity("believer", "believer"), 100.0);
        assert_eq!(similarity("", ""), 100.0);
    }

    #[test]
    fn similarity_is_symmetric() {
        // given:
        let pairs = [
            ("hello", "hallo"),
            ("daft punk", "daft pank"),
            ("a", "completely different"),
            ("", "nonempty"),
        ];

        for (a, b) in pairs {
            // then:
            assert_eq!(similarity(a, b), similarity(b, a), "({a:?}, {b:?})");
        }
    }

    #[test]
    fn score_decreases_as_edit_distance_grows() {
        // given: fixed-length references, increasingly corrupted
        let reference = "abcdefgh";

        // when:
        let close = similarity(reference, "abcdefgx");
        let further = similarity(reference, "abcdefxx");
        let far = similarity(reference, "abcdxxxx");

        // then:
        assert!(close > further);
        assert!(further > far);
        assert!(far > similarity(reference, "xxxxxxxx"));
    }

    #[test]
    fn distance_counts_code_points_not_bytes() {
        // given: one multi-byte substitution out of five characters
        let got = similarity("h\u{e9}llo", "hallo");

        // then:
        assert_eq!(got, 80.0);
    }

    #[test]
    fn totally_different_strings_score_zero() {
        assert_eq!(similarity("abc", "xyz"), 0.0);
    }
}

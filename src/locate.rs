//! Best-effort substring location for passage highlighting.
//!
//! Saved passage text and live document text can drift apart: upstream
//! transcription cleanup rewrites whitespace, and long passages sometimes
//! lose their tail. The locator tries an exact match first, then a
//! whitespace-normalized match mapped back to original-text offsets, then a
//! short prefix probe for long needles. A miss is `None`, never an error;
//! callers render the document unmodified when a passage cannot be placed.
//!
//! All returned offsets are byte offsets on `char` boundaries, so slicing
//! the haystack with them is always safe.

/// Prefix length used for the long-needle fallback probe.
pub const PROBE_LEN: usize = 20;

/// Find a best-effort byte offset of `needle` within `haystack`.
///
/// Uses [`PROBE_LEN`] for the long-needle fallback; see
/// [`locate_with_probe`] for a configurable probe length.
pub fn locate(needle: &str, haystack: &str) -> Option<usize> {
    locate_with_probe(needle, haystack, PROBE_LEN)
}

/// Find a best-effort byte offset of `needle` within `haystack`, probing
/// with the needle's first `probe_len` characters when the full needle
/// cannot be found.
///
/// Resolution order:
/// 1. Exact substring match.
/// 2. Whitespace-normalized match (runs collapsed to one space, ends
///    trimmed), mapped back to an original-text offset.
/// 3. For needles longer than `probe_len` characters, an exact match of the
///    needle's prefix; the caller treats the hit as covering the full
///    needle length, clamped to the haystack.
pub fn locate_with_probe(needle: &str, haystack: &str, probe_len: usize) -> Option<usize> {
    if needle.trim().is_empty() || probe_len == 0 {
        return None;
    }

    if let Some(pos) = haystack.find(needle) {
        return Some(pos);
    }

    let norm_needle = normalize_whitespace(needle);
    let norm_haystack = normalize_whitespace(haystack);
    if let Some(k) = norm_haystack.find(&norm_needle) {
        return Some(map_normalized_offset(haystack, k));
    }

    if needle.chars().count() > probe_len {
        let probe: String = needle.chars().take(probe_len).collect();
        if let Some(pos) = haystack.find(&probe) {
            return Some(pos);
        }
    }

    None
}

/// Clamp an end offset derived from a located needle to the haystack,
/// landing on a `char` boundary.
pub fn clamp_span_end(haystack: &str, end: usize) -> usize {
    let mut end = end.min(haystack.len());
    while end > 0 && !haystack.is_char_boundary(end) {
        end -= 1;
    }
    end
}

/// Collapse every whitespace run to a single space and trim both ends.
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Map a byte offset in the normalized form of `original` back to a byte
/// offset in `original` itself.
///
/// Walks the original text advancing a normalized-byte counter once per
/// counted character; a whitespace character immediately followed by more
/// whitespace is part of a collapsed run and does not advance the counter.
/// The mapping is approximate: the contract is a usable offset for visual
/// highlighting, not byte-exact equivalence.
fn map_normalized_offset(original: &str, normalized_offset: usize) -> usize {
    let chars: Vec<(usize, char)> = original.char_indices().collect();
    let mut i = 0;

    // Leading whitespace is trimmed away during normalization.
    while i < chars.len() && chars[i].1.is_whitespace() {
        i += 1;
    }

    let mut counted = 0;
    while i < chars.len() {
        if counted >= normalized_offset {
            return chars[i].0;
        }
        let c = chars[i].1;
        let next_is_ws = chars
            .get(i + 1)
            .map(|(_, next)| next.is_whitespace())
            .unwrap_or(false);
        if c.is_whitespace() && next_is_ws {
            // Collapsed-run filler: occupies no normalized position.
        } else if c.is_whitespace() {
            counted += 1;
        } else {
            counted += c.len_utf8();
        }
        i += 1;
    }

    original.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        let haystack = "The quick brown fox jumps over the lazy dog";
        assert_eq!(locate("brown fox", haystack), Some(10));
    }

    #[test]
    fn test_exact_match_at_start() {
        assert_eq!(locate("The", "The quick brown fox"), Some(0));
    }

    #[test]
    fn test_not_found_short_needle() {
        assert_eq!(locate("zebra", "The quick brown fox"), None);
    }

    #[test]
    fn test_empty_needle_is_none() {
        assert_eq!(locate("", "The quick brown fox"), None);
        assert_eq!(locate("   \n ", "The quick brown fox"), None);
    }

    #[test]
    fn test_whitespace_tolerant_match() {
        // Stored passage has single spaces; document has a line break and
        // doubled spacing.
        let haystack = "Ordered, that the  committee\ndo meet on Tuesday next";
        let offset = locate("committee do meet", haystack).expect("should locate");
        // The usable offset must point at (or into) the matched region.
        assert!(haystack[offset..].starts_with("committee"));
    }

    #[test]
    fn test_whitespace_tolerant_with_leading_ws_haystack() {
        let haystack = "   Resolved,  that supplies be granted";
        let offset = locate("Resolved, that", haystack).expect("should locate");
        assert!(haystack[offset..].starts_with("Resolved"));
    }

    #[test]
    fn test_normalized_match_long_run() {
        // Runs longer than two whitespace characters: pins the current
        // best-effort mapping so behavior changes are visible.
        let haystack = "tax upon     malt and cyder";
        let offset = locate("upon malt", haystack).expect("should locate");
        assert_eq!(offset, 4);
        assert!(haystack[offset..].starts_with("upon"));
    }

    #[test]
    fn test_prefix_probe_for_long_needle() {
        // The needle's tail has drifted; only the head survives in the
        // document.
        let haystack = "An act for granting an aid to his Majesty by a land tax";
        let needle = "An act for granting relief to the counties aforesaid";
        assert!(needle.chars().count() > PROBE_LEN);
        assert_eq!(locate(needle, haystack), Some(0));
    }

    #[test]
    fn test_no_probe_for_short_needle() {
        // Short needles must not fall back to a prefix probe.
        let haystack = "An act for granting an aid";
        assert_eq!(locate("An act fox", haystack), None);
    }

    #[test]
    fn test_probe_miss_is_none() {
        let haystack = "completely unrelated page text";
        let needle = "a rather long passage that appears nowhere in this page";
        assert_eq!(locate(needle, haystack), None);
    }

    #[test]
    fn test_multibyte_text() {
        let haystack = "Décret du roi — année 1789";
        let offset = locate("année 1789", haystack).expect("should locate");
        assert!(haystack.is_char_boundary(offset));
        assert!(haystack[offset..].starts_with("année"));
    }

    #[test]
    fn test_clamp_span_end() {
        let haystack = "année";
        // One past the end and mid-codepoint positions both clamp to a
        // boundary.
        assert_eq!(clamp_span_end(haystack, 100), haystack.len());
        assert!(haystack.is_char_boundary(clamp_span_end(haystack, 2)));
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(
            normalize_whitespace("  a\t\tb \n c  "),
            "a b c".to_string()
        );
    }
}

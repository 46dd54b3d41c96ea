//! Highlight compositor: interval resolution, priority merge, rendering.
//!
//! Given a document's text and the current set of highlight requests
//! (saved passages, keywords, live-search matches), the compositor produces
//! a non-overlapping, ascending sequence of [`HighlightInterval`]s and
//! renders it as alternating plain and highlighted [`Segment`]s.
//!
//! # Pipeline
//!
//! 1. Resolve each request to zero or more raw intervals: passages through
//!    the span locator, keywords through a repeated case-insensitive scan,
//!    live-search requests pass through pre-resolved.
//! 2. Drop malformed intervals (empty span, out of range).
//! 3. Sort by start and merge overlapping/adjacent intervals: the union
//!    span is kept under the highest-priority styling
//!    (`Passage > Keyword > Search`), with `content` recomputed from the
//!    text so coverage is never lost.
//! 4. Render: plain text between intervals, styled segments for intervals.
//!
//! Everything here is pure and deterministic; a passage the locator cannot
//! place simply contributes no interval.

use sha2::{Digest, Sha256};

use crate::locate;
use crate::models::{HighlightInterval, HighlightKind, HighlightRequest, Segment};

/// Resolve requests and merge them into non-overlapping intervals, using
/// the default [`locate::PROBE_LEN`] for long-passage fallback location.
pub fn composite(text: &str, requests: &[HighlightRequest]) -> Vec<HighlightInterval> {
    composite_with_probe(text, requests, locate::PROBE_LEN)
}

/// [`composite`] with a configurable locator probe length.
pub fn composite_with_probe(
    text: &str,
    requests: &[HighlightRequest],
    probe_len: usize,
) -> Vec<HighlightInterval> {
    let raw = resolve_requests(text, requests, probe_len);
    merge_intervals(text, raw)
}

/// Resolve requests to raw (possibly overlapping) intervals over `text`.
/// Passage requests go through the span locator with `probe_len`.
pub fn resolve_requests(
    text: &str,
    requests: &[HighlightRequest],
    probe_len: usize,
) -> Vec<HighlightInterval> {
    let mut intervals = Vec::new();

    for request in requests {
        match request.kind {
            HighlightKind::Passage => {
                if request.source_text.trim().is_empty() {
                    continue;
                }
                if let Some(start) = locate::locate_with_probe(&request.source_text, text, probe_len)
                {
                    let end = locate::clamp_span_end(text, start + request.source_text.len());
                    push_interval(&mut intervals, text, start, end, request);
                }
            }
            HighlightKind::Keyword => {
                for (start, end) in keyword_spans(text, &request.source_text) {
                    push_interval(&mut intervals, text, start, end, request);
                }
            }
            HighlightKind::Search => {
                if let Some((start, end)) = request.span {
                    let start = clamp_to_boundary(text, start);
                    let end = clamp_to_boundary(text, end);
                    push_interval(&mut intervals, text, start, end, request);
                }
            }
        }
    }

    intervals
}

/// All case-insensitive, non-overlapping occurrences of `keyword` in
/// `text`, as byte spans. Each scan resumes after the previous match's end.
///
/// Matching folds one character at a time, so spans are always byte
/// offsets into the original text even when case folding changes a
/// character's encoded length (e.g. 'İ' lowercases to two codepoints).
pub fn keyword_spans(text: &str, keyword: &str) -> Vec<(usize, usize)> {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return Vec::new();
    }

    let needle: Vec<char> = keyword.chars().flat_map(char::to_lowercase).collect();
    let chars: Vec<(usize, char)> = text.char_indices().collect();

    let mut spans = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        match fold_match_len(&chars[i..], &needle) {
            Some(consumed) => {
                let start = chars[i].0;
                let end = chars
                    .get(i + consumed)
                    .map(|(offset, _)| *offset)
                    .unwrap_or(text.len());
                spans.push((start, end));
                i += consumed;
            }
            None => i += 1,
        }
    }
    spans
}

/// How many of `chars` the case-folded `needle` consumes when matched at
/// the front, or `None` when it does not match there. A needle ending in
/// the middle of one character's folding is not a match.
fn fold_match_len(chars: &[(usize, char)], needle: &[char]) -> Option<usize> {
    let mut n = 0;
    let mut consumed = 0;
    while n < needle.len() {
        let (_, c) = *chars.get(consumed)?;
        for folded in c.to_lowercase() {
            if needle.get(n) != Some(&folded) {
                return None;
            }
            n += 1;
        }
        consumed += 1;
    }
    Some(consumed)
}

/// Merge sorted-by-start intervals into a non-overlapping sequence.
///
/// On overlap or adjacency the accumulator grows to the union span and
/// takes the styling of whichever interval has the higher
/// [`HighlightKind`]; `content` is recomputed from `text` so every output
/// interval satisfies `content == text[start..end]`.
pub fn merge_intervals(
    text: &str,
    mut intervals: Vec<HighlightInterval>,
) -> Vec<HighlightInterval> {
    intervals.retain(|iv| iv.start < iv.end && iv.end <= text.len());
    intervals.sort_by(|a, b| a.start.cmp(&b.start).then(a.end.cmp(&b.end)));

    let mut merged: Vec<HighlightInterval> = Vec::new();
    let mut acc: Option<HighlightInterval> = None;

    for iv in intervals {
        match acc.take() {
            None => acc = Some(iv),
            Some(mut current) => {
                if iv.start <= current.end {
                    if iv.kind > current.kind {
                        current.kind = iv.kind;
                        current.owner_id = iv.owner_id;
                        current.color = iv.color;
                    }
                    if iv.end > current.end {
                        current.end = iv.end;
                    }
                    current.content = text[current.start..current.end].to_string();
                    acc = Some(current);
                } else {
                    merged.push(current);
                    acc = Some(iv);
                }
            }
        }
    }
    if let Some(current) = acc {
        merged.push(current);
    }

    merged
}

/// Walk merged intervals and emit the full text as alternating plain and
/// highlighted segments. Concatenating the segments reconstructs `text`
/// exactly.
pub fn render(text: &str, intervals: &[HighlightInterval]) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last_end = 0;

    for interval in intervals {
        if interval.start > last_end {
            segments.push(Segment::Plain(text[last_end..interval.start].to_string()));
        }
        segments.push(Segment::Highlighted(interval.clone()));
        last_end = interval.end;
    }
    if last_end < text.len() {
        segments.push(Segment::Plain(text[last_end..].to_string()));
    }
    if segments.is_empty() {
        segments.push(Segment::Plain(text.to_string()));
    }

    segments
}

/// Memoizing wrapper around [`composite`].
///
/// Highlight requests are rebuilt on every render; the cache keys on a
/// SHA-256 fingerprint of `(text, requests)` so unchanged renders skip the
/// locate/merge work. Results are identical to calling [`composite`]
/// directly.
#[derive(Default)]
pub struct HighlightCache {
    key: Option<[u8; 32]>,
    intervals: Vec<HighlightInterval>,
}

impl HighlightCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Composite `requests` over `text` with `probe_len`, reusing the
    /// previous result when the inputs are unchanged.
    pub fn composite(
        &mut self,
        text: &str,
        requests: &[HighlightRequest],
        probe_len: usize,
    ) -> Vec<HighlightInterval> {
        let key = fingerprint(text, requests, probe_len);
        if self.key != Some(key) {
            self.intervals = composite_with_probe(text, requests, probe_len);
            self.key = Some(key);
        }
        self.intervals.clone()
    }
}

fn fingerprint(text: &str, requests: &[HighlightRequest], probe_len: usize) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update((probe_len as u64).to_le_bytes());
    hasher.update((text.len() as u64).to_le_bytes());
    hasher.update(text.as_bytes());
    for request in requests {
        hasher.update([request.kind as u8]);
        hasher.update((request.source_text.len() as u64).to_le_bytes());
        hasher.update(request.source_text.as_bytes());
        if let Some(owner) = &request.owner_id {
            hasher.update((owner.len() as u64).to_le_bytes());
            hasher.update(owner.as_bytes());
        }
        if let Some(color) = &request.color {
            hasher.update((color.len() as u64).to_le_bytes());
            hasher.update(color.as_bytes());
        }
        if let Some((start, end)) = request.span {
            hasher.update((start as u64).to_le_bytes());
            hasher.update((end as u64).to_le_bytes());
        }
    }
    hasher.finalize().into()
}

fn push_interval(
    intervals: &mut Vec<HighlightInterval>,
    text: &str,
    start: usize,
    end: usize,
    request: &HighlightRequest,
) {
    if start >= end || end > text.len() {
        return;
    }
    intervals.push(HighlightInterval {
        start,
        end,
        content: text[start..end].to_string(),
        kind: request.kind,
        owner_id: request.owner_id.clone(),
        color: request.color.clone(),
    });
}

fn clamp_to_boundary(text: &str, offset: usize) -> usize {
    let mut offset = offset.min(text.len());
    while offset > 0 && !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Passage;

    fn passage(text: &str) -> Passage {
        Passage {
            id: "p1".to_string(),
            text: text.to_string(),
            start: 0,
            end: 0,
            project_id: "proj".to_string(),
        }
    }

    fn assert_invariants(text: &str, intervals: &[HighlightInterval]) {
        for window in intervals.windows(2) {
            assert!(
                window[0].end <= window[1].start,
                "Intervals overlap or are unsorted: {:?}",
                window
            );
        }
        for iv in intervals {
            assert_eq!(iv.content, &text[iv.start..iv.end]);
        }
    }

    #[test]
    fn test_empty_requests_single_plain_segment() {
        let text = "The quick brown fox";
        let intervals = composite(text, &[]);
        assert!(intervals.is_empty());
        let segments = render(text, &intervals);
        assert_eq!(segments, vec![Segment::Plain(text.to_string())]);
    }

    #[test]
    fn test_keyword_all_occurrences() {
        let text = "Tax the land, tax the malt, TAX the cyder";
        let intervals = composite(text, &[HighlightRequest::keyword("tax", None)]);
        assert_eq!(intervals.len(), 3);
        assert_invariants(text, &intervals);
        assert_eq!(intervals[0].content, "Tax");
        assert_eq!(intervals[2].content, "TAX");
    }

    #[test]
    fn test_disjoint_passage_and_keyword() {
        let text = "The quick brown fox";
        let requests = vec![
            HighlightRequest::keyword("fox", None),
            HighlightRequest::passage(&passage("quick brown"), None),
        ];
        let intervals = composite(text, &requests);
        let segments = render(text, &intervals);

        let shape: Vec<(&str, Option<HighlightKind>)> = segments
            .iter()
            .map(|s| match s {
                Segment::Plain(t) => (t.as_str(), None),
                Segment::Highlighted(iv) => (iv.content.as_str(), Some(iv.kind)),
            })
            .collect();
        assert_eq!(
            shape,
            vec![
                ("The ", None),
                ("quick brown", Some(HighlightKind::Passage)),
                (" ", None),
                ("fox", Some(HighlightKind::Keyword)),
            ]
        );
    }

    #[test]
    fn test_passage_outranks_overlapping_keyword() {
        let text = "the committee of supply resolved";
        // Keyword starts before the passage and overlaps it.
        let requests = vec![
            HighlightRequest::keyword("committee of", None),
            HighlightRequest::passage(&passage("of supply"), None),
        ];
        let intervals = composite(text, &requests);
        assert_eq!(intervals.len(), 1);
        assert_eq!(intervals[0].kind, HighlightKind::Passage);
        // The merged interval spans the union of both ranges.
        assert_eq!(intervals[0].content, "committee of supply");
        assert_invariants(text, &intervals);
    }

    #[test]
    fn test_keyword_overlapping_passage_keeps_passage_styling() {
        let text = "the committee of supply resolved";
        // Same overlap, arrival order reversed.
        let requests = vec![
            HighlightRequest::passage(&passage("committee of"), None),
            HighlightRequest::keyword("of supply", None),
        ];
        let intervals = composite(text, &requests);
        assert_eq!(intervals.len(), 1);
        assert_eq!(intervals[0].kind, HighlightKind::Passage);
        assert_eq!(intervals[0].content, "committee of supply");
    }

    #[test]
    fn test_search_lowest_priority() {
        let text = "granting supplies to his Majesty";
        let requests = vec![
            HighlightRequest::search(0, 8, None),
            HighlightRequest::keyword("granting", None),
        ];
        let intervals = composite(text, &requests);
        assert_eq!(intervals.len(), 1);
        assert_eq!(intervals[0].kind, HighlightKind::Keyword);
    }

    #[test]
    fn test_round_trip_reconstructs_text() {
        let text = "An act for granting an aid to his Majesty by a land tax";
        let requests = vec![
            HighlightRequest::keyword("an", None),
            HighlightRequest::keyword("land", None),
            HighlightRequest::passage(&passage("granting an aid"), None),
            HighlightRequest::search(3, 6, None),
        ];
        let intervals = composite(text, &requests);
        assert_invariants(text, &intervals);

        let rebuilt: String = render(text, &intervals)
            .iter()
            .map(|s| s.content())
            .collect();
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_unlocatable_passage_contributes_nothing() {
        let text = "The quick brown fox";
        let requests = vec![HighlightRequest::passage(&passage("zebra stripes"), None)];
        let intervals = composite(text, &requests);
        assert!(intervals.is_empty());
    }

    #[test]
    fn test_malformed_requests_filtered() {
        let text = "The quick brown fox";
        let requests = vec![
            HighlightRequest::keyword("", None),
            HighlightRequest::keyword("   ", None),
            HighlightRequest::search(5, 5, None),
            HighlightRequest::search(500, 600, None),
            HighlightRequest::passage(&passage(""), None),
        ];
        let intervals = composite(text, &requests);
        assert!(intervals.is_empty());
    }

    #[test]
    fn test_empty_text() {
        let intervals = composite("", &[HighlightRequest::keyword("fox", None)]);
        assert!(intervals.is_empty());
        let segments = render("", &intervals);
        assert_eq!(segments, vec![Segment::Plain(String::new())]);
    }

    #[test]
    fn test_adjacent_same_kind_intervals_merge() {
        let text = "abcdef";
        let requests = vec![
            HighlightRequest::search(0, 3, None),
            HighlightRequest::search(3, 6, None),
        ];
        let intervals = composite(text, &requests);
        assert_eq!(intervals.len(), 1);
        assert_eq!(intervals[0].content, "abcdef");
    }

    #[test]
    fn test_whitespace_drifted_passage_still_highlights() {
        let text = "Ordered, that the  committee\ndo meet on Tuesday next";
        let requests = vec![HighlightRequest::passage(
            &passage("committee do meet"),
            None,
        )];
        let intervals = composite(text, &requests);
        assert_eq!(intervals.len(), 1);
        assert!(intervals[0].content.starts_with("committee"));
        assert_invariants(text, &intervals);
    }

    #[test]
    fn test_cache_is_transparent() {
        let text = "Tax the land, tax the malt";
        let requests = vec![HighlightRequest::keyword("tax", None)];

        let mut cache = HighlightCache::new();
        let first = cache.composite(text, &requests, locate::PROBE_LEN);
        let second = cache.composite(text, &requests, locate::PROBE_LEN);
        assert_eq!(first, second);
        assert_eq!(first, composite(text, &requests));

        // Changing the requests invalidates the entry.
        let changed = cache.composite(
            text,
            &[HighlightRequest::keyword("malt", None)],
            locate::PROBE_LEN,
        );
        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].content, "malt");
    }

    #[test]
    fn test_cache_keys_on_probe_len() {
        // 14-character head survives in the text, tail has drifted.
        let text = "An act for granting an aid to his Majesty";
        let requests = vec![HighlightRequest::passage(
            &passage("An act for gra bounties upon the exportation"),
            None,
        )];

        let mut cache = HighlightCache::new();
        assert!(cache.composite(text, &requests, 30).is_empty());
        assert!(!cache.composite(text, &requests, 10).is_empty());
    }

    #[test]
    fn test_probe_len_changes_passage_resolution() {
        let text = "An act for granting an aid to his Majesty";
        // 17 characters; only the first 10 survive in the text.
        let requests = vec![HighlightRequest::passage(&passage("An act foreseeing"), None)];

        // Too short for the default probe threshold, so it stays unlocated.
        assert!(composite(text, &requests).is_empty());

        let intervals = composite_with_probe(text, &requests, 10);
        assert_eq!(intervals.len(), 1);
        assert_eq!(intervals[0].start, 0);
        assert_eq!(intervals[0].content, &text[0..17]);
    }

    #[test]
    fn test_keyword_spans_non_overlapping() {
        let spans = keyword_spans("aaaa", "aa");
        assert_eq!(spans, vec![(0, 2), (2, 4)]);
    }

    #[test]
    fn test_keyword_spans_survive_length_changing_case_fold() {
        // 'İ' lowercases to "i\u{307}", which would shift every later
        // offset if matching ran over a lowered copy of the whole text.
        let text = "İstanbul tax rolls, the TAX on imports";
        let spans = keyword_spans(text, "tax");
        assert_eq!(spans.len(), 2);
        for (start, end) in spans {
            assert!(text[start..end].eq_ignore_ascii_case("tax"));
        }
    }

    #[test]
    fn test_keyword_with_foldable_char_matches() {
        let spans = keyword_spans("the İstanbul rolls", "İstanbul");
        assert_eq!(spans.len(), 1);
        let (start, end) = spans[0];
        assert_eq!(&"the İstanbul rolls"[start..end], "İstanbul");
    }
}

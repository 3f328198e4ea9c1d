//! Range simplification over bracketed set bodies.
//!
//! A set body is a list of possibly overlapping, unsorted ranges. Rather than
//! materialising and sorting it, these functions find one merged run at a
//! time: the least run intersecting a window, grown while some item is
//! contiguous with its end. Walking the window forward yields the ordered
//! disjoint ranges of the set, or of its complement.

use std::cmp::Reverse;
use std::iter;

use crate::syntax::{CodepointRange, MAX_CODEPOINT, SetBody};

/// The least merged run of `body` that intersects `[lo, hi]`, clipped to it.
pub fn simplify(body: SetBody<'_>, lo: u32, hi: u32) -> Option<CodepointRange> {
    let first = body
        .items()
        .filter(|item| item.intersects(lo, hi))
        .min_by_key(|item| (item.lo, Reverse(item.hi)))?;
    let start = first.lo.max(lo);
    let mut end = first.hi;
    while end < hi {
        let reach = end + 1;
        let grown = body
            .items()
            .filter(|item| item.lo <= reach && item.hi > end)
            .map(|item| item.hi)
            .max();
        match grown {
            Some(grown) => end = grown,
            None => break,
        }
    }
    Some(CodepointRange::new(start, end.min(hi)))
}

/// The least gap of `body` inside `[lo, hi]`: the first run of codepoints
/// the body does not cover.
pub fn simplify_inverted(body: SetBody<'_>, lo: u32, hi: u32) -> Option<CodepointRange> {
    if lo > hi {
        return None;
    }
    let start = match simplify(body, lo, hi) {
        Some(run) if run.lo == lo => {
            if run.hi >= hi {
                return None;
            }
            run.hi + 1
        }
        _ => lo,
    };
    let end = simplify(body, start, hi).map_or(hi, |next| next.lo - 1);
    Some(CodepointRange::new(start, end))
}

/// Ordered, disjoint ranges covered by `body` over `[0, MAX_CODEPOINT]`.
pub fn ranges(body: SetBody<'_>) -> impl Iterator<Item = CodepointRange> + '_ {
    walk(body, simplify)
}

/// Ordered, disjoint ranges not covered by `body` over `[0, MAX_CODEPOINT]`.
pub fn inverted_ranges(body: SetBody<'_>) -> impl Iterator<Item = CodepointRange> + '_ {
    walk(body, simplify_inverted)
}

fn walk(
    body: SetBody<'_>,
    step: fn(SetBody<'_>, u32, u32) -> Option<CodepointRange>,
) -> impl Iterator<Item = CodepointRange> + '_ {
    let mut cursor = Some(0);
    iter::from_fn(move || {
        let range = step(body, cursor?, MAX_CODEPOINT)?;
        cursor = (range.hi < MAX_CODEPOINT).then_some(range.hi + 1);
        Some(range)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{Charset, parse_charset};
    use pretty_assertions::assert_eq;

    fn body(set: &str) -> SetBody<'_> {
        match parse_charset(set.as_bytes()) {
            Some((Charset::Set { body, .. }, _)) => body,
            other => panic!("not a set: {other:?}"),
        }
    }

    fn r(lo: u32, hi: u32) -> CodepointRange {
        CodepointRange::new(lo, hi)
    }

    // --- simplify ---

    #[test]
    fn test_simplify_picks_least_run() {
        assert_eq!(simplify(body("[x-za-c]"), 0, MAX_CODEPOINT), Some(r(0x61, 0x63)));
    }

    #[test]
    fn test_simplify_merges_overlap_and_adjacency() {
        // a-c, b-f, g and h-k form one run.
        assert_eq!(
            simplify(body("[h-kgb-fa-c]"), 0, MAX_CODEPOINT),
            Some(r(0x61, 0x6B))
        );
    }

    #[test]
    fn test_simplify_clips_to_window() {
        assert_eq!(simplify(body("[a-z]"), 0x65, 0x70), Some(r(0x65, 0x70)));
        assert_eq!(simplify(body("[a-z]"), 0x7B, MAX_CODEPOINT), None);
    }

    #[test]
    fn test_simplify_prefers_widest_at_same_start() {
        assert_eq!(simplify(body("[aa-d]"), 0, MAX_CODEPOINT), Some(r(0x61, 0x64)));
    }

    #[test]
    fn test_simplify_empty_body() {
        assert_eq!(simplify(body("[]"), 0, MAX_CODEPOINT), None);
    }

    #[test]
    fn test_simplify_expands_classes() {
        assert_eq!(simplify(body(r"[\d]"), 0, MAX_CODEPOINT), Some(r(0x30, 0x39)));
        assert_eq!(simplify(body(r"[\W]"), 0x3A, MAX_CODEPOINT), Some(r(0x3A, 0x40)));
    }

    // --- simplify_inverted ---

    #[test]
    fn test_inverted_gap_before_first_run() {
        assert_eq!(simplify_inverted(body("[b-c]"), 0, MAX_CODEPOINT), Some(r(0, 0x61)));
    }

    #[test]
    fn test_inverted_gap_after_covered_start() {
        assert_eq!(simplify_inverted(body("[a-ce-f]"), 0x61, MAX_CODEPOINT), Some(r(0x64, 0x64)));
    }

    #[test]
    fn test_inverted_fully_covered() {
        assert_eq!(simplify_inverted(body("[a-z]"), 0x62, 0x70), None);
    }

    #[test]
    fn test_inverted_empty_body_is_whole_window() {
        assert_eq!(simplify_inverted(body("[]"), 5, 9), Some(r(5, 9)));
    }

    // --- walks ---

    #[test]
    fn test_ranges_ordered_and_disjoint() {
        let got: Vec<_> = ranges(body(r"[_z\da-cB-Y]")).collect();
        assert_eq!(
            got,
            vec![r(0x30, 0x39), r(0x42, 0x59), r(0x5F, 0x5F), r(0x61, 0x63), r(0x7A, 0x7A)]
        );
    }

    #[test]
    fn test_inverted_ranges_of_word_class() {
        let got: Vec<_> = inverted_ranges(body(r"[\w]")).collect();
        assert_eq!(
            got,
            vec![
                r(0, 0x2F),
                r(0x3A, 0x40),
                r(0x5B, 0x5E),
                r(0x60, 0x60),
                r(0x7B, MAX_CODEPOINT),
            ]
        );
    }

    #[test]
    fn test_ranges_reach_ceiling() {
        let got: Vec<_> = ranges(body(r"[\S]")).collect();
        assert_eq!(got, vec![r(1, 8), r(0x0E, 0x1F), r(0x21, MAX_CODEPOINT)]);
        assert_eq!(inverted_ranges(body(r"[\S\s]")).collect::<Vec<_>>(), vec![r(0, 0)]);
    }

    #[test]
    fn test_complement_law() {
        let sets = [
            "[]",
            "[a]",
            r"[\w]",
            r"[\W\d]",
            r"[\s\S]",
            "[z-za-ab-y]",
            r"[☀-⛿\u0001]",
            r"[\U00FFFFFF]",
            "[☀-⛿é]",
        ];
        for set in sets {
            let mut all: Vec<_> = ranges(body(set)).chain(inverted_ranges(body(set))).collect();
            all.sort();
            assert_eq!(all.first().map(|r| r.lo), Some(0), "{set}");
            assert_eq!(all.last().map(|r| r.hi), Some(MAX_CODEPOINT), "{set}");
            for pair in all.windows(2) {
                assert_eq!(pair[0].hi + 1, pair[1].lo, "{set}: {pair:?}");
            }
        }
    }
}

//! Suggested-estimate heuristic.
//!
//! Maps story text to a default estimate on the estimation scale. The
//! function is pure: the same title and description always yield the same
//! value. It runs exactly once, when the story is created, and the result
//! is never recomputed.

use crate::domain::foundation::snap_to_scale;

/// Terms that push the score up, two points each.
const COMPLEXITY_TERMS: [&str; 7] = [
    "complex",
    "difficult",
    "challenging",
    "integration",
    "refactor",
    "security",
    "performance",
];

/// Terms that pull the score down, two points each, re-floored at one
/// after each subtraction.
const SIMPLICITY_TERMS: [&str; 6] = ["simple", "easy", "quick", "minor", "small", "trivial"];

/// Characters of combined text worth one point of base score.
const CHARS_PER_POINT: usize = 20;

/// Derive a suggested estimate from a story's title and description.
///
/// The base score grows with text length, clamped to 1..=13, is adjusted
/// for each keyword found as a substring, and is snapped to the nearest
/// scale member.
pub fn suggest(title: &str, description: &str) -> u32 {
    let text = format!("{}{}", title, description).to_lowercase();

    let length_score = (text.chars().count() / CHARS_PER_POINT) as u32;
    let mut score = length_score.clamp(1, 13);

    for term in COMPLEXITY_TERMS {
        if text.contains(term) {
            score += 2;
        }
    }

    for term in SIMPLICITY_TERMS {
        if text.contains(term) {
            score = score.saturating_sub(2).max(1);
        }
    }

    snap_to_scale(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ESTIMATION_SCALE;
    use proptest::prelude::*;

    #[test]
    fn short_simple_story_suggests_the_minimum() {
        assert_eq!(suggest("Fix login bug", "simple quick fix"), 1);
    }

    #[test]
    fn empty_text_suggests_the_minimum() {
        assert_eq!(suggest("", ""), 1);
    }

    #[test]
    fn complexity_terms_raise_the_score() {
        // 32 chars of text -> base 1, plus three complexity terms -> 7,
        // snapped to 8
        assert_eq!(suggest("", "security performance integration"), 8);
    }

    #[test]
    fn long_text_is_clamped_to_the_scale_top() {
        let description = "x".repeat(300);
        assert_eq!(suggest("", &description), 13);
    }

    #[test]
    fn keywords_match_across_the_title_description_boundary() {
        // concatenation is separator-free, so matching is on the joined text
        let with_split_term = suggest("needs sec", "urity review");
        let without = suggest("needs sec", " urity review");
        assert!(with_split_term > without);
    }

    proptest! {
        #[test]
        fn suggestion_is_always_on_the_scale(title in ".{0,200}", description in ".{0,200}") {
            let points = suggest(&title, &description);
            prop_assert!(ESTIMATION_SCALE.contains(&points));
        }

        #[test]
        fn suggestion_is_deterministic(title in ".{0,100}", description in ".{0,100}") {
            prop_assert_eq!(suggest(&title, &description), suggest(&title, &description));
        }
    }
}
